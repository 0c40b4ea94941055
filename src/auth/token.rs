use std::sync::Mutex;

use axum::async_trait;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

/// Persistent bearer token. One row per user; the key is the credential.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuthToken {
    pub key: String,
    pub user_id: i64,
    pub created: OffsetDateTime,
}

/// 20 random bytes, hex encoded: a 40 character opaque key.
pub fn generate_key() -> String {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[async_trait]
pub trait TokenRepo: Send + Sync {
    /// Return the user's token, issuing one on first use.
    async fn get_or_create(&self, user_id: i64) -> anyhow::Result<AuthToken>;
    async fn find_by_key(&self, key: &str) -> anyhow::Result<Option<AuthToken>>;
}

pub struct PgTokenRepo {
    pool: PgPool,
}

impl PgTokenRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepo for PgTokenRepo {
    async fn get_or_create(&self, user_id: i64) -> anyhow::Result<AuthToken> {
        let existing = sqlx::query_as::<_, AuthToken>(
            r#"
            SELECT key, user_id, created
            FROM auth_tokens
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(token) = existing {
            return Ok(token);
        }

        let token = sqlx::query_as::<_, AuthToken>(
            r#"
            INSERT INTO auth_tokens (key, user_id)
            VALUES ($1, $2)
            RETURNING key, user_id, created
            "#,
        )
        .bind(generate_key())
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(token)
    }

    async fn find_by_key(&self, key: &str) -> anyhow::Result<Option<AuthToken>> {
        let token = sqlx::query_as::<_, AuthToken>(
            r#"
            SELECT key, user_id, created
            FROM auth_tokens
            WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(token)
    }
}

/// In-memory token store backing `AppState::fake`.
#[derive(Default)]
pub struct MemoryTokenRepo {
    rows: Mutex<Vec<AuthToken>>,
}

#[async_trait]
impl TokenRepo for MemoryTokenRepo {
    async fn get_or_create(&self, user_id: i64) -> anyhow::Result<AuthToken> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(token) = rows.iter().find(|t| t.user_id == user_id) {
            return Ok(token.clone());
        }
        let token = AuthToken {
            key: generate_key(),
            user_id,
            created: OffsetDateTime::now_utc(),
        };
        rows.push(token.clone());
        Ok(token)
    }

    async fn find_by_key(&self, key: &str) -> anyhow::Result<Option<AuthToken>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|t| t.key == key).cloned())
    }
}
