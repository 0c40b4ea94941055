use std::sync::Mutex;

use axum::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// A loggable physical activity and its metabolic equivalent.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Activity {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub met: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewActivity {
    pub user_id: i64,
    pub title: String,
    pub met: Decimal,
}

#[derive(Debug, Default, Clone)]
pub struct ActivityChanges {
    pub title: Option<String>,
    pub met: Option<Decimal>,
}

#[async_trait]
pub trait ActivityRepo: Send + Sync {
    async fn list_ordered(&self) -> anyhow::Result<Vec<Activity>>;
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Activity>>;
    async fn insert(&self, new: NewActivity) -> anyhow::Result<Activity>;
    async fn update_fields(
        &self,
        id: i64,
        changes: ActivityChanges,
    ) -> anyhow::Result<Option<Activity>>;
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;
}

pub struct PgActivityRepo {
    pool: PgPool,
}

impl PgActivityRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityRepo for PgActivityRepo {
    async fn list_ordered(&self) -> anyhow::Result<Vec<Activity>> {
        let rows = sqlx::query_as::<_, Activity>(
            r#"
            SELECT id, user_id, title, met
            FROM activities
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Activity>> {
        let activity = sqlx::query_as::<_, Activity>(
            r#"
            SELECT id, user_id, title, met
            FROM activities
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(activity)
    }

    async fn insert(&self, new: NewActivity) -> anyhow::Result<Activity> {
        let activity = sqlx::query_as::<_, Activity>(
            r#"
            INSERT INTO activities (user_id, title, met)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, title, met
            "#,
        )
        .bind(new.user_id)
        .bind(&new.title)
        .bind(new.met)
        .fetch_one(&self.pool)
        .await?;
        Ok(activity)
    }

    async fn update_fields(
        &self,
        id: i64,
        changes: ActivityChanges,
    ) -> anyhow::Result<Option<Activity>> {
        let activity = sqlx::query_as::<_, Activity>(
            r#"
            UPDATE activities
               SET title = COALESCE($2, title),
                   met = COALESCE($3, met)
             WHERE id = $1
            RETURNING id, user_id, title, met
            "#,
        )
        .bind(id)
        .bind(changes.title)
        .bind(changes.met)
        .fetch_optional(&self.pool)
        .await?;
        Ok(activity)
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query(r#"DELETE FROM activities WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// In-memory activity store backing `AppState::fake`.
#[derive(Default)]
pub struct MemoryActivityRepo {
    inner: Mutex<MemoryActivities>,
}

#[derive(Default)]
struct MemoryActivities {
    next_id: i64,
    rows: Vec<Activity>,
}

#[async_trait]
impl ActivityRepo for MemoryActivityRepo {
    async fn list_ordered(&self) -> anyhow::Result<Vec<Activity>> {
        let inner = self.inner.lock().unwrap();
        let mut rows = inner.rows.clone();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows)
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Activity>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.rows.iter().find(|a| a.id == id).cloned())
    }

    async fn insert(&self, new: NewActivity) -> anyhow::Result<Activity> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let activity = Activity {
            id: inner.next_id,
            user_id: new.user_id,
            title: new.title,
            met: new.met,
        };
        inner.rows.push(activity.clone());
        Ok(activity)
    }

    async fn update_fields(
        &self,
        id: i64,
        changes: ActivityChanges,
    ) -> anyhow::Result<Option<Activity>> {
        let mut inner = self.inner.lock().unwrap();
        let Some(activity) = inner.rows.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            activity.title = title;
        }
        if let Some(met) = changes.met {
            activity.met = met;
        }
        Ok(Some(activity.clone()))
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.rows.len();
        inner.rows.retain(|a| a.id != id);
        Ok(inner.rows.len() < before)
    }
}
