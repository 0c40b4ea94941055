use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use image::ImageFormat;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::extract::CurrentUser;
use crate::auth::permissions::{check_resource_permission, Action};
use crate::error::ApiError;
use crate::state::AppState;

use super::dto::{parse_changes, parse_create, RecipeDetail, RecipeSummary};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route(
            "/recipes/:id",
            get(retrieve_recipe)
                .put(update_recipe)
                .patch(partial_update_recipe)
                .delete(destroy_recipe),
        )
        .route("/recipes/:id/upload-image", post(upload_image))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

#[instrument(skip_all)]
async fn list_recipes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<RecipeSummary>>, ApiError> {
    check_resource_permission(Action::List, &user)?;
    let rows = state.recipes.list_ordered().await?;
    Ok(Json(rows.into_iter().map(RecipeSummary::from).collect()))
}

#[instrument(skip_all)]
async fn retrieve_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<RecipeDetail>, ApiError> {
    check_resource_permission(Action::Retrieve, &user)?;
    let recipe = state
        .recipes
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(RecipeDetail::from(recipe)))
}

#[instrument(skip_all)]
async fn create_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<RecipeDetail>), ApiError> {
    check_resource_permission(Action::Create, &user)?;
    let new = parse_create(user.id, body)?;
    let recipe = state.recipes.insert(new).await?;
    info!(recipe_id = recipe.id, user_id = user.id, "recipe created");
    Ok((StatusCode::CREATED, Json(RecipeDetail::from(recipe))))
}

#[instrument(skip_all)]
async fn update_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<RecipeDetail>, ApiError> {
    apply_update(&state, &user, id, body, Action::Update).await
}

#[instrument(skip_all)]
async fn partial_update_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<RecipeDetail>, ApiError> {
    apply_update(&state, &user, id, body, Action::PartialUpdate).await
}

async fn apply_update(
    state: &AppState,
    user: &crate::user::repo::User,
    id: i64,
    body: serde_json::Value,
    action: Action,
) -> Result<Json<RecipeDetail>, ApiError> {
    check_resource_permission(action, user)?;
    if state.recipes.find_by_id(id).await?.is_none() {
        return Err(ApiError::NotFound);
    }
    let changes = parse_changes(body, action == Action::PartialUpdate)?;
    let recipe = state
        .recipes
        .update_fields(id, changes)
        .await?
        .ok_or(ApiError::NotFound)?;
    info!(recipe_id = id, "recipe updated");
    Ok(Json(RecipeDetail::from(recipe)))
}

#[instrument(skip_all)]
async fn destroy_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    check_resource_permission(Action::Destroy, &user)?;
    if !state.recipes.delete(id).await? {
        return Err(ApiError::NotFound);
    }
    info!(recipe_id = id, "recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn invalid_image() -> ApiError {
    ApiError::field(
        "image",
        "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
    )
}

fn image_media(format: ImageFormat) -> (&'static str, &'static str) {
    match format {
        ImageFormat::Png => ("png", "image/png"),
        ImageFormat::Jpeg => ("jpg", "image/jpeg"),
        ImageFormat::Gif => ("gif", "image/gif"),
        ImageFormat::WebP => ("webp", "image/webp"),
        ImageFormat::Bmp => ("bmp", "image/bmp"),
        _ => ("bin", "application/octet-stream"),
    }
}

/// Replace the recipe image from a multipart `image` part. Staff is checked
/// only after the payload validates; reordering the two changes which error
/// the caller sees.
#[instrument(skip_all)]
async fn upload_image(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<RecipeDetail>, ApiError> {
    let recipe = state
        .recipes
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let mut data: Option<Bytes> = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("image") {
            data = Some(field.bytes().await.map_err(|_| invalid_image())?);
        }
    }
    let Some(data) = data else {
        return Err(ApiError::field("image", "No file was submitted."));
    };

    let format = image::guess_format(&data).map_err(|_| invalid_image())?;
    if image::load_from_memory(&data).is_err() {
        return Err(invalid_image());
    }

    if !user.is_staff {
        warn!(user_id = user.id, recipe_id = id, "non-staff image upload");
        return Err(ApiError::PermissionDenied);
    }

    let (ext, content_type) = image_media(format);
    let key = format!("uploads/recipe/{}.{}", Uuid::new_v4(), ext);
    state.storage.put_object(&key, data, content_type).await?;

    if let Some(old) = &recipe.image {
        if let Err(e) = state.storage.delete_object(old).await {
            warn!(error = %e, key = %old, "failed to delete replaced image");
        }
    }

    let updated = state
        .recipes
        .set_image(id, &key)
        .await?
        .ok_or(ApiError::NotFound)?;
    info!(recipe_id = id, key = %key, "recipe image replaced");
    Ok(Json(RecipeDetail::from(updated)))
}
