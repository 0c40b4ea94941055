use std::sync::Mutex;

use axum::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// One-to-one extension of the user: goals and body measurements.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: i64,
    pub user_id: i64,
    pub calorie_goal: Option<Decimal>,
    pub weight: Option<Decimal>,
    pub height: Option<Decimal>,
    pub gender: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ProfileChanges {
    pub calorie_goal: Option<Decimal>,
    pub weight: Option<Decimal>,
    pub height: Option<Decimal>,
    pub gender: Option<String>,
}

#[async_trait]
pub trait ProfileRepo: Send + Sync {
    async fn find_by_user(&self, user_id: i64) -> anyhow::Result<Option<Profile>>;
    /// Empty profile row, created at signup.
    async fn create_for_user(&self, user_id: i64) -> anyhow::Result<Profile>;
    async fn update_fields(
        &self,
        user_id: i64,
        changes: ProfileChanges,
    ) -> anyhow::Result<Option<Profile>>;
}

pub struct PgProfileRepo {
    pool: PgPool,
}

impl PgProfileRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepo for PgProfileRepo {
    async fn find_by_user(&self, user_id: i64) -> anyhow::Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, user_id, calorie_goal, weight, height, gender
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn create_for_user(&self, user_id: i64) -> anyhow::Result<Profile> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (user_id)
            VALUES ($1)
            RETURNING id, user_id, calorie_goal, weight, height, gender
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn update_fields(
        &self,
        user_id: i64,
        changes: ProfileChanges,
    ) -> anyhow::Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles
               SET calorie_goal = COALESCE($2, calorie_goal),
                   weight = COALESCE($3, weight),
                   height = COALESCE($4, height),
                   gender = COALESCE($5, gender)
             WHERE user_id = $1
            RETURNING id, user_id, calorie_goal, weight, height, gender
            "#,
        )
        .bind(user_id)
        .bind(changes.calorie_goal)
        .bind(changes.weight)
        .bind(changes.height)
        .bind(changes.gender)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }
}

/// In-memory profile store backing `AppState::fake`.
#[derive(Default)]
pub struct MemoryProfileRepo {
    inner: Mutex<MemoryProfiles>,
}

#[derive(Default)]
struct MemoryProfiles {
    next_id: i64,
    rows: Vec<Profile>,
}

#[async_trait]
impl ProfileRepo for MemoryProfileRepo {
    async fn find_by_user(&self, user_id: i64) -> anyhow::Result<Option<Profile>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.rows.iter().find(|p| p.user_id == user_id).cloned())
    }

    async fn create_for_user(&self, user_id: i64) -> anyhow::Result<Profile> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let profile = Profile {
            id: inner.next_id,
            user_id,
            calorie_goal: None,
            weight: None,
            height: None,
            gender: None,
        };
        inner.rows.push(profile.clone());
        Ok(profile)
    }

    async fn update_fields(
        &self,
        user_id: i64,
        changes: ProfileChanges,
    ) -> anyhow::Result<Option<Profile>> {
        let mut inner = self.inner.lock().unwrap();
        let Some(profile) = inner.rows.iter_mut().find(|p| p.user_id == user_id) else {
            return Ok(None);
        };
        if let Some(calorie_goal) = changes.calorie_goal {
            profile.calorie_goal = Some(calorie_goal);
        }
        if let Some(weight) = changes.weight {
            profile.weight = Some(weight);
        }
        if let Some(height) = changes.height {
            profile.height = Some(height);
        }
        if let Some(gender) = changes.gender {
            profile.gender = Some(gender);
        }
        Ok(Some(profile.clone()))
    }
}
