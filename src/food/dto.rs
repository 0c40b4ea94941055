use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::food::repo::{Food, FoodChanges, NewFood};
use crate::validate::FieldMap;

#[derive(Debug, Serialize)]
pub struct FoodSummary {
    pub id: i64,
    pub title: String,
    pub calories: Decimal,
}

impl From<Food> for FoodSummary {
    fn from(f: Food) -> Self {
        Self {
            id: f.id,
            title: f.title,
            calories: f.calories,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FoodDetail {
    pub id: i64,
    pub title: String,
    pub calories: Decimal,
    pub carbs: Decimal,
    pub fibers: Decimal,
    pub fat: Decimal,
    pub protein: Decimal,
    pub estimates: String,
}

impl From<Food> for FoodDetail {
    fn from(f: Food) -> Self {
        Self {
            id: f.id,
            title: f.title,
            calories: f.calories,
            carbs: f.carbs,
            fibers: f.fibers,
            fat: f.fat,
            protein: f.protein,
            estimates: f.estimates,
        }
    }
}

pub fn parse_create(user_id: i64, body: Value) -> Result<NewFood, ApiError> {
    let mut fm = FieldMap::new(body)?;
    let title = fm.required_string("title");
    let calories = fm.required_decimal("calories");
    let carbs = fm.required_decimal("carbs");
    let fibers = fm.required_decimal("fibers");
    let fat = fm.required_decimal("fat");
    let protein = fm.required_decimal("protein");
    let estimates = fm.optional_string("estimates");
    fm.finish()?;

    Ok(NewFood {
        user_id,
        title,
        calories,
        carbs,
        fibers,
        fat,
        protein,
        estimates: estimates.unwrap_or_default(),
    })
}

pub fn parse_changes(body: Value, partial: bool) -> Result<FoodChanges, ApiError> {
    let mut fm = FieldMap::new(body)?;
    let changes = if partial {
        FoodChanges {
            title: fm.optional_string("title"),
            calories: fm.optional_decimal("calories"),
            carbs: fm.optional_decimal("carbs"),
            fibers: fm.optional_decimal("fibers"),
            fat: fm.optional_decimal("fat"),
            protein: fm.optional_decimal("protein"),
            estimates: fm.optional_string("estimates"),
        }
    } else {
        FoodChanges {
            title: Some(fm.required_string("title")),
            calories: Some(fm.required_decimal("calories")),
            carbs: Some(fm.required_decimal("carbs")),
            fibers: Some(fm.required_decimal("fibers")),
            fat: Some(fm.required_decimal("fat")),
            protein: Some(fm.required_decimal("protein")),
            estimates: fm.optional_string("estimates"),
        }
    };
    fm.finish()?;
    Ok(changes)
}
