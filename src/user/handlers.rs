use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::auth::extract::CurrentUser;
use crate::auth::password::{hash_password, verify_password};
use crate::error::ApiError;
use crate::state::AppState;
use crate::user::dto::{
    parse_profile_update, parse_signup, parse_token_request, parse_user_update, ProfileShape,
    TokenResponse, UserPublic,
};
use crate::user::repo::{NewUser, UserChanges};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_user))
        .route("/token", post(create_token))
        .route("/me", get(me_detail).patch(me_update).delete(me_destroy))
        .route(
            "/me/profile",
            get(profile_detail).put(profile_update).patch(profile_update),
        )
}

#[instrument(skip_all)]
async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<UserPublic>), ApiError> {
    let data = parse_signup(body)?;

    if state.users.find_by_email(&data.email).await?.is_some() {
        warn!(email = %data.email, "email already registered");
        return Err(ApiError::field(
            "email",
            "user with this email already exists.",
        ));
    }

    let password_hash = hash_password(&data.password)?;
    let user = state
        .users
        .insert(NewUser {
            email: data.email,
            password_hash,
            name: data.name,
            fullname: data.fullname.unwrap_or_else(|| "Anonim".to_string()),
            is_staff: false,
        })
        .await?;
    state.profiles.create_for_user(user.id).await?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(UserPublic::from(user))))
}

#[instrument(skip_all)]
async fn create_token(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<TokenResponse>, ApiError> {
    let req = parse_token_request(body)?;

    let user = match state.users.find_by_email(&req.email).await? {
        Some(user) => user,
        None => {
            warn!(email = %req.email, "token request for unknown email");
            return Err(ApiError::non_field(
                "Unable to authenticate with provided credentials",
            ));
        }
    };

    if !user.is_active || !verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = user.id, "token request with bad credentials");
        return Err(ApiError::non_field(
            "Unable to authenticate with provided credentials",
        ));
    }

    let token = state.tokens.get_or_create(user.id).await?;
    info!(user_id = user.id, "token issued");
    Ok(Json(TokenResponse { token: token.key }))
}

#[instrument(skip_all)]
async fn me_detail(CurrentUser(user): CurrentUser) -> Json<UserPublic> {
    Json(UserPublic::from(user))
}

#[instrument(skip_all)]
async fn me_update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<Value>,
) -> Result<Json<UserPublic>, ApiError> {
    let update = parse_user_update(body)?;

    if let Some(email) = &update.email {
        if let Some(existing) = state.users.find_by_email(email).await? {
            if existing.id != user.id {
                return Err(ApiError::field(
                    "email",
                    "user with this email already exists.",
                ));
            }
        }
    }

    let password_hash = match &update.password {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    let updated = state
        .users
        .update_fields(
            user.id,
            UserChanges {
                email: update.email,
                name: update.name,
                password_hash,
            },
        )
        .await?
        .ok_or(ApiError::NotFound)?;

    info!(user_id = updated.id, "user updated");
    Ok(Json(UserPublic::from(updated)))
}

#[instrument(skip_all)]
async fn me_destroy(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<StatusCode, ApiError> {
    if !state.users.delete(user.id).await? {
        return Err(ApiError::NotFound);
    }
    info!(user_id = user.id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip_all)]
async fn profile_detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ProfileShape>, ApiError> {
    let profile = match state.profiles.find_by_user(user.id).await? {
        Some(profile) => profile,
        None => state.profiles.create_for_user(user.id).await?,
    };
    Ok(Json(ProfileShape::from(profile)))
}

#[instrument(skip_all)]
async fn profile_update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<Value>,
) -> Result<Json<ProfileShape>, ApiError> {
    let changes = parse_profile_update(body)?;

    if state.profiles.find_by_user(user.id).await?.is_none() {
        state.profiles.create_for_user(user.id).await?;
    }
    let profile = state
        .profiles
        .update_fields(user.id, changes)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(ProfileShape::from(profile)))
}
