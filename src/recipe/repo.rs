use std::sync::Mutex;

use axum::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub category: String,
    pub time_minutes: i32,
    pub calories: Decimal,
    pub protein: Decimal,
    pub carbs: Decimal,
    pub fibers: Decimal,
    pub fat: Decimal,
    pub description: String,
    pub ingredients: String,
    pub image: Option<String>,
}

/// Insert payload; the owner is always the requesting user.
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub user_id: i64,
    pub title: String,
    pub category: String,
    pub time_minutes: i32,
    pub calories: Decimal,
    pub protein: Decimal,
    pub carbs: Decimal,
    pub fibers: Decimal,
    pub fat: Decimal,
    pub description: String,
    pub ingredients: String,
}

/// Field-level update; `None` keeps the stored value. The owner and the
/// image are not updatable through this path.
#[derive(Debug, Default, Clone)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub category: Option<String>,
    pub time_minutes: Option<i32>,
    pub calories: Option<Decimal>,
    pub protein: Option<Decimal>,
    pub carbs: Option<Decimal>,
    pub fibers: Option<Decimal>,
    pub fat: Option<Decimal>,
    pub description: Option<String>,
    pub ingredients: Option<String>,
}

#[async_trait]
pub trait RecipeRepo: Send + Sync {
    /// All recipes, newest id first.
    async fn list_ordered(&self) -> anyhow::Result<Vec<Recipe>>;
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Recipe>>;
    async fn insert(&self, new: NewRecipe) -> anyhow::Result<Recipe>;
    async fn update_fields(&self, id: i64, changes: RecipeChanges)
        -> anyhow::Result<Option<Recipe>>;
    async fn set_image(&self, id: i64, path: &str) -> anyhow::Result<Option<Recipe>>;
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;
}

pub struct PgRecipeRepo {
    pool: PgPool,
}

impl PgRecipeRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecipeRepo for PgRecipeRepo {
    async fn list_ordered(&self) -> anyhow::Result<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, Recipe>(
            r#"
            SELECT id, user_id, title, category, time_minutes, calories, protein,
                   carbs, fibers, fat, description, ingredients, image
            FROM recipes
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Recipe>> {
        let recipe = sqlx::query_as::<_, Recipe>(
            r#"
            SELECT id, user_id, title, category, time_minutes, calories, protein,
                   carbs, fibers, fat, description, ingredients, image
            FROM recipes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(recipe)
    }

    async fn insert(&self, new: NewRecipe) -> anyhow::Result<Recipe> {
        let recipe = sqlx::query_as::<_, Recipe>(
            r#"
            INSERT INTO recipes (user_id, title, category, time_minutes, calories,
                                 protein, carbs, fibers, fat, description, ingredients)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, user_id, title, category, time_minutes, calories, protein,
                      carbs, fibers, fat, description, ingredients, image
            "#,
        )
        .bind(new.user_id)
        .bind(&new.title)
        .bind(&new.category)
        .bind(new.time_minutes)
        .bind(new.calories)
        .bind(new.protein)
        .bind(new.carbs)
        .bind(new.fibers)
        .bind(new.fat)
        .bind(&new.description)
        .bind(&new.ingredients)
        .fetch_one(&self.pool)
        .await?;
        Ok(recipe)
    }

    async fn update_fields(
        &self,
        id: i64,
        changes: RecipeChanges,
    ) -> anyhow::Result<Option<Recipe>> {
        let recipe = sqlx::query_as::<_, Recipe>(
            r#"
            UPDATE recipes
               SET title = COALESCE($2, title),
                   category = COALESCE($3, category),
                   time_minutes = COALESCE($4, time_minutes),
                   calories = COALESCE($5, calories),
                   protein = COALESCE($6, protein),
                   carbs = COALESCE($7, carbs),
                   fibers = COALESCE($8, fibers),
                   fat = COALESCE($9, fat),
                   description = COALESCE($10, description),
                   ingredients = COALESCE($11, ingredients)
             WHERE id = $1
            RETURNING id, user_id, title, category, time_minutes, calories, protein,
                      carbs, fibers, fat, description, ingredients, image
            "#,
        )
        .bind(id)
        .bind(changes.title)
        .bind(changes.category)
        .bind(changes.time_minutes)
        .bind(changes.calories)
        .bind(changes.protein)
        .bind(changes.carbs)
        .bind(changes.fibers)
        .bind(changes.fat)
        .bind(changes.description)
        .bind(changes.ingredients)
        .fetch_optional(&self.pool)
        .await?;
        Ok(recipe)
    }

    async fn set_image(&self, id: i64, path: &str) -> anyhow::Result<Option<Recipe>> {
        let recipe = sqlx::query_as::<_, Recipe>(
            r#"
            UPDATE recipes
               SET image = $2
             WHERE id = $1
            RETURNING id, user_id, title, category, time_minutes, calories, protein,
                      carbs, fibers, fat, description, ingredients, image
            "#,
        )
        .bind(id)
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;
        Ok(recipe)
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query(r#"DELETE FROM recipes WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// In-memory recipe store backing `AppState::fake`.
#[derive(Default)]
pub struct MemoryRecipeRepo {
    inner: Mutex<MemoryRecipes>,
}

#[derive(Default)]
struct MemoryRecipes {
    next_id: i64,
    rows: Vec<Recipe>,
}

#[async_trait]
impl RecipeRepo for MemoryRecipeRepo {
    async fn list_ordered(&self) -> anyhow::Result<Vec<Recipe>> {
        let inner = self.inner.lock().unwrap();
        let mut rows = inner.rows.clone();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows)
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Recipe>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.rows.iter().find(|r| r.id == id).cloned())
    }

    async fn insert(&self, new: NewRecipe) -> anyhow::Result<Recipe> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let recipe = Recipe {
            id: inner.next_id,
            user_id: new.user_id,
            title: new.title,
            category: new.category,
            time_minutes: new.time_minutes,
            calories: new.calories,
            protein: new.protein,
            carbs: new.carbs,
            fibers: new.fibers,
            fat: new.fat,
            description: new.description,
            ingredients: new.ingredients,
            image: None,
        };
        inner.rows.push(recipe.clone());
        Ok(recipe)
    }

    async fn update_fields(
        &self,
        id: i64,
        changes: RecipeChanges,
    ) -> anyhow::Result<Option<Recipe>> {
        let mut inner = self.inner.lock().unwrap();
        let Some(recipe) = inner.rows.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            recipe.title = title;
        }
        if let Some(category) = changes.category {
            recipe.category = category;
        }
        if let Some(time_minutes) = changes.time_minutes {
            recipe.time_minutes = time_minutes;
        }
        if let Some(calories) = changes.calories {
            recipe.calories = calories;
        }
        if let Some(protein) = changes.protein {
            recipe.protein = protein;
        }
        if let Some(carbs) = changes.carbs {
            recipe.carbs = carbs;
        }
        if let Some(fibers) = changes.fibers {
            recipe.fibers = fibers;
        }
        if let Some(fat) = changes.fat {
            recipe.fat = fat;
        }
        if let Some(description) = changes.description {
            recipe.description = description;
        }
        if let Some(ingredients) = changes.ingredients {
            recipe.ingredients = ingredients;
        }
        Ok(Some(recipe.clone()))
    }

    async fn set_image(&self, id: i64, path: &str) -> anyhow::Result<Option<Recipe>> {
        let mut inner = self.inner.lock().unwrap();
        let Some(recipe) = inner.rows.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        recipe.image = Some(path.to_string());
        Ok(Some(recipe.clone()))
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.rows.len();
        inner.rows.retain(|r| r.id != id);
        Ok(inner.rows.len() < before)
    }
}
