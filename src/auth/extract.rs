use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};

use crate::error::ApiError;
use crate::state::AppState;
use crate::user::repo::User;

/// Resolves the bearer token into the requesting user. Every authenticated
/// handler takes this as an argument, so the principal is always explicit.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(ApiError::Unauthorized(
                "Authentication credentials were not provided.",
            ))?;

        let key = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .ok_or(ApiError::Unauthorized(
                "Authentication credentials were not provided.",
            ))?;

        let token = state
            .tokens
            .find_by_key(key)
            .await?
            .ok_or(ApiError::Unauthorized("Invalid token."))?;

        let user = state
            .users
            .find_by_id(token.user_id)
            .await?
            .ok_or(ApiError::Unauthorized("Invalid token."))?;

        if !user.is_active {
            return Err(ApiError::Unauthorized("User inactive or deleted."));
        }

        Ok(CurrentUser(user))
    }
}
