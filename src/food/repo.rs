use std::sync::Mutex;

use axum::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Food {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub calories: Decimal,
    pub carbs: Decimal,
    pub fibers: Decimal,
    pub fat: Decimal,
    pub protein: Decimal,
    pub estimates: String,
}

#[derive(Debug, Clone)]
pub struct NewFood {
    pub user_id: i64,
    pub title: String,
    pub calories: Decimal,
    pub carbs: Decimal,
    pub fibers: Decimal,
    pub fat: Decimal,
    pub protein: Decimal,
    pub estimates: String,
}

#[derive(Debug, Default, Clone)]
pub struct FoodChanges {
    pub title: Option<String>,
    pub calories: Option<Decimal>,
    pub carbs: Option<Decimal>,
    pub fibers: Option<Decimal>,
    pub fat: Option<Decimal>,
    pub protein: Option<Decimal>,
    pub estimates: Option<String>,
}

#[async_trait]
pub trait FoodRepo: Send + Sync {
    async fn list_ordered(&self) -> anyhow::Result<Vec<Food>>;
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Food>>;
    async fn insert(&self, new: NewFood) -> anyhow::Result<Food>;
    async fn update_fields(&self, id: i64, changes: FoodChanges) -> anyhow::Result<Option<Food>>;
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;
}

pub struct PgFoodRepo {
    pool: PgPool,
}

impl PgFoodRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FoodRepo for PgFoodRepo {
    async fn list_ordered(&self) -> anyhow::Result<Vec<Food>> {
        let rows = sqlx::query_as::<_, Food>(
            r#"
            SELECT id, user_id, title, calories, carbs, fibers, fat, protein, estimates
            FROM foods
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Food>> {
        let food = sqlx::query_as::<_, Food>(
            r#"
            SELECT id, user_id, title, calories, carbs, fibers, fat, protein, estimates
            FROM foods
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(food)
    }

    async fn insert(&self, new: NewFood) -> anyhow::Result<Food> {
        let food = sqlx::query_as::<_, Food>(
            r#"
            INSERT INTO foods (user_id, title, calories, carbs, fibers, fat, protein, estimates)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, title, calories, carbs, fibers, fat, protein, estimates
            "#,
        )
        .bind(new.user_id)
        .bind(&new.title)
        .bind(new.calories)
        .bind(new.carbs)
        .bind(new.fibers)
        .bind(new.fat)
        .bind(new.protein)
        .bind(&new.estimates)
        .fetch_one(&self.pool)
        .await?;
        Ok(food)
    }

    async fn update_fields(&self, id: i64, changes: FoodChanges) -> anyhow::Result<Option<Food>> {
        let food = sqlx::query_as::<_, Food>(
            r#"
            UPDATE foods
               SET title = COALESCE($2, title),
                   calories = COALESCE($3, calories),
                   carbs = COALESCE($4, carbs),
                   fibers = COALESCE($5, fibers),
                   fat = COALESCE($6, fat),
                   protein = COALESCE($7, protein),
                   estimates = COALESCE($8, estimates)
             WHERE id = $1
            RETURNING id, user_id, title, calories, carbs, fibers, fat, protein, estimates
            "#,
        )
        .bind(id)
        .bind(changes.title)
        .bind(changes.calories)
        .bind(changes.carbs)
        .bind(changes.fibers)
        .bind(changes.fat)
        .bind(changes.protein)
        .bind(changes.estimates)
        .fetch_optional(&self.pool)
        .await?;
        Ok(food)
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query(r#"DELETE FROM foods WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// In-memory food store backing `AppState::fake`.
#[derive(Default)]
pub struct MemoryFoodRepo {
    inner: Mutex<MemoryFoods>,
}

#[derive(Default)]
struct MemoryFoods {
    next_id: i64,
    rows: Vec<Food>,
}

#[async_trait]
impl FoodRepo for MemoryFoodRepo {
    async fn list_ordered(&self) -> anyhow::Result<Vec<Food>> {
        let inner = self.inner.lock().unwrap();
        let mut rows = inner.rows.clone();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows)
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Food>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.rows.iter().find(|f| f.id == id).cloned())
    }

    async fn insert(&self, new: NewFood) -> anyhow::Result<Food> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let food = Food {
            id: inner.next_id,
            user_id: new.user_id,
            title: new.title,
            calories: new.calories,
            carbs: new.carbs,
            fibers: new.fibers,
            fat: new.fat,
            protein: new.protein,
            estimates: new.estimates,
        };
        inner.rows.push(food.clone());
        Ok(food)
    }

    async fn update_fields(&self, id: i64, changes: FoodChanges) -> anyhow::Result<Option<Food>> {
        let mut inner = self.inner.lock().unwrap();
        let Some(food) = inner.rows.iter_mut().find(|f| f.id == id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            food.title = title;
        }
        if let Some(calories) = changes.calories {
            food.calories = calories;
        }
        if let Some(carbs) = changes.carbs {
            food.carbs = carbs;
        }
        if let Some(fibers) = changes.fibers {
            food.fibers = fibers;
        }
        if let Some(fat) = changes.fat {
            food.fat = fat;
        }
        if let Some(protein) = changes.protein {
            food.protein = protein;
        }
        if let Some(estimates) = changes.estimates {
            food.estimates = estimates;
        }
        Ok(Some(food.clone()))
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.rows.len();
        inner.rows.retain(|f| f.id != id);
        Ok(inner.rows.len() < before)
    }
}
