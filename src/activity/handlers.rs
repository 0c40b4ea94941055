use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use crate::auth::extract::CurrentUser;
use crate::auth::permissions::{check_resource_permission, Action};
use crate::error::ApiError;
use crate::state::AppState;

use super::dto::{parse_changes, parse_create, ActivityShape};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/activities", get(list_activities).post(create_activity))
        .route(
            "/activities/:id",
            get(retrieve_activity)
                .put(update_activity)
                .patch(partial_update_activity)
                .delete(destroy_activity),
        )
}

#[instrument(skip_all)]
async fn list_activities(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<ActivityShape>>, ApiError> {
    check_resource_permission(Action::List, &user)?;
    let rows = state.activities.list_ordered().await?;
    Ok(Json(rows.into_iter().map(ActivityShape::from).collect()))
}

#[instrument(skip_all)]
async fn retrieve_activity(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ActivityShape>, ApiError> {
    check_resource_permission(Action::Retrieve, &user)?;
    let activity = state
        .activities
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(ActivityShape::from(activity)))
}

#[instrument(skip_all)]
async fn create_activity(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<ActivityShape>), ApiError> {
    check_resource_permission(Action::Create, &user)?;
    let new = parse_create(user.id, body)?;
    let activity = state.activities.insert(new).await?;
    info!(activity_id = activity.id, user_id = user.id, "activity created");
    Ok((StatusCode::CREATED, Json(ActivityShape::from(activity))))
}

#[instrument(skip_all)]
async fn update_activity(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<ActivityShape>, ApiError> {
    apply_update(&state, &user, id, body, Action::Update).await
}

#[instrument(skip_all)]
async fn partial_update_activity(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<ActivityShape>, ApiError> {
    apply_update(&state, &user, id, body, Action::PartialUpdate).await
}

async fn apply_update(
    state: &AppState,
    user: &crate::user::repo::User,
    id: i64,
    body: serde_json::Value,
    action: Action,
) -> Result<Json<ActivityShape>, ApiError> {
    check_resource_permission(action, user)?;
    if state.activities.find_by_id(id).await?.is_none() {
        return Err(ApiError::NotFound);
    }
    let changes = parse_changes(body, action == Action::PartialUpdate)?;
    let activity = state
        .activities
        .update_fields(id, changes)
        .await?
        .ok_or(ApiError::NotFound)?;
    info!(activity_id = id, "activity updated");
    Ok(Json(ActivityShape::from(activity)))
}

#[instrument(skip_all)]
async fn destroy_activity(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    check_resource_permission(Action::Destroy, &user)?;
    if !state.activities.delete(id).await? {
        return Err(ApiError::NotFound);
    }
    info!(activity_id = id, "activity deleted");
    Ok(StatusCode::NO_CONTENT)
}
