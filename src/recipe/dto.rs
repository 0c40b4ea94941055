use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::recipe::repo::{NewRecipe, Recipe, RecipeChanges};
use crate::validate::FieldMap;

/// List projection: enough for a list view.
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub title: String,
    pub calories: Decimal,
    pub image: Option<String>,
}

impl From<Recipe> for RecipeSummary {
    fn from(r: Recipe) -> Self {
        Self {
            id: r.id,
            title: r.title,
            calories: r.calories,
            image: r.image,
        }
    }
}

/// Detail projection: the full field set.
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    pub id: i64,
    pub title: String,
    pub calories: Decimal,
    pub category: String,
    pub time_minutes: i32,
    pub protein: Decimal,
    pub carbs: Decimal,
    pub fibers: Decimal,
    pub fat: Decimal,
    pub description: String,
    pub ingredients: String,
    pub image: Option<String>,
}

impl From<Recipe> for RecipeDetail {
    fn from(r: Recipe) -> Self {
        Self {
            id: r.id,
            title: r.title,
            calories: r.calories,
            category: r.category,
            time_minutes: r.time_minutes,
            protein: r.protein,
            carbs: r.carbs,
            fibers: r.fibers,
            fat: r.fat,
            description: r.description,
            ingredients: r.ingredients,
            image: r.image,
        }
    }
}

/// Validate a create payload. A payload-supplied owner is ignored, never an
/// error: the new recipe always belongs to `user_id`.
pub fn parse_create(user_id: i64, body: Value) -> Result<NewRecipe, ApiError> {
    let mut fm = FieldMap::new(body)?;
    let title = fm.required_string("title");
    let category = fm.required_string("category");
    let time_minutes = fm.required_int("time_minutes");
    let calories = fm.required_decimal("calories");
    let protein = fm.required_decimal("protein");
    let carbs = fm.required_decimal("carbs");
    let fibers = fm.required_decimal("fibers");
    let fat = fm.required_decimal("fat");
    let description = fm.optional_text("description");
    let ingredients = fm.optional_text("ingredients");
    fm.finish()?;

    Ok(NewRecipe {
        user_id,
        title,
        category,
        time_minutes,
        calories,
        protein,
        carbs,
        fibers,
        fat,
        description: description.unwrap_or_default(),
        ingredients: ingredients.unwrap_or_default(),
    })
}

/// Validate an update payload. With `partial` every field is optional;
/// otherwise the writable field set is required, as on create. The owner
/// field is dropped silently either way.
pub fn parse_changes(body: Value, partial: bool) -> Result<RecipeChanges, ApiError> {
    let mut fm = FieldMap::new(body)?;
    let changes = if partial {
        RecipeChanges {
            title: fm.optional_string("title"),
            category: fm.optional_string("category"),
            time_minutes: fm.optional_int("time_minutes"),
            calories: fm.optional_decimal("calories"),
            protein: fm.optional_decimal("protein"),
            carbs: fm.optional_decimal("carbs"),
            fibers: fm.optional_decimal("fibers"),
            fat: fm.optional_decimal("fat"),
            description: fm.optional_text("description"),
            ingredients: fm.optional_text("ingredients"),
        }
    } else {
        RecipeChanges {
            title: Some(fm.required_string("title")),
            category: Some(fm.required_string("category")),
            time_minutes: Some(fm.required_int("time_minutes")),
            calories: Some(fm.required_decimal("calories")),
            protein: Some(fm.required_decimal("protein")),
            carbs: Some(fm.required_decimal("carbs")),
            fibers: Some(fm.required_decimal("fibers")),
            fat: Some(fm.required_decimal("fat")),
            description: fm.optional_text("description"),
            ingredients: fm.optional_text("ingredients"),
        }
    };
    fm.finish()?;
    Ok(changes)
}
