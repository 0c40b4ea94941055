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

use super::dto::{parse_changes, parse_create, FoodDetail, FoodSummary};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/foods", get(list_foods).post(create_food))
        .route(
            "/foods/:id",
            get(retrieve_food)
                .put(update_food)
                .patch(partial_update_food)
                .delete(destroy_food),
        )
}

#[instrument(skip_all)]
async fn list_foods(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<FoodSummary>>, ApiError> {
    check_resource_permission(Action::List, &user)?;
    let rows = state.foods.list_ordered().await?;
    Ok(Json(rows.into_iter().map(FoodSummary::from).collect()))
}

#[instrument(skip_all)]
async fn retrieve_food(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<FoodDetail>, ApiError> {
    check_resource_permission(Action::Retrieve, &user)?;
    let food = state.foods.find_by_id(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(FoodDetail::from(food)))
}

#[instrument(skip_all)]
async fn create_food(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<FoodDetail>), ApiError> {
    check_resource_permission(Action::Create, &user)?;
    let new = parse_create(user.id, body)?;
    let food = state.foods.insert(new).await?;
    info!(food_id = food.id, user_id = user.id, "food created");
    Ok((StatusCode::CREATED, Json(FoodDetail::from(food))))
}

#[instrument(skip_all)]
async fn update_food(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<FoodDetail>, ApiError> {
    apply_update(&state, &user, id, body, Action::Update).await
}

#[instrument(skip_all)]
async fn partial_update_food(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<FoodDetail>, ApiError> {
    apply_update(&state, &user, id, body, Action::PartialUpdate).await
}

async fn apply_update(
    state: &AppState,
    user: &crate::user::repo::User,
    id: i64,
    body: serde_json::Value,
    action: Action,
) -> Result<Json<FoodDetail>, ApiError> {
    check_resource_permission(action, user)?;
    if state.foods.find_by_id(id).await?.is_none() {
        return Err(ApiError::NotFound);
    }
    let changes = parse_changes(body, action == Action::PartialUpdate)?;
    let food = state
        .foods
        .update_fields(id, changes)
        .await?
        .ok_or(ApiError::NotFound)?;
    info!(food_id = id, "food updated");
    Ok(Json(FoodDetail::from(food)))
}

#[instrument(skip_all)]
async fn destroy_food(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    check_resource_permission(Action::Destroy, &user)?;
    if !state.foods.delete(id).await? {
        return Err(ApiError::NotFound);
    }
    info!(food_id = id, "food deleted");
    Ok(StatusCode::NO_CONTENT)
}
