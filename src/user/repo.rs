use std::sync::Mutex;

use axum::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub fullname: String,
    pub is_active: bool,
    pub is_staff: bool,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub fullname: String,
    pub is_staff: bool,
}

/// Self-service edits; `None` keeps the stored value.
#[derive(Debug, Default, Clone)]
pub struct UserChanges {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password_hash: Option<String>,
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn insert(&self, new: NewUser) -> anyhow::Result<User>;
    async fn update_fields(&self, id: i64, changes: UserChanges) -> anyhow::Result<Option<User>>;
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;
}

pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, fullname, is_active, is_staff
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, fullname, is_active, is_staff
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert(&self, new: NewUser) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, name, fullname, is_staff)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, password_hash, name, fullname, is_active, is_staff
            "#,
        )
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.name)
        .bind(&new.fullname)
        .bind(new.is_staff)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_fields(&self, id: i64, changes: UserChanges) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET email = COALESCE($2, email),
                   name = COALESCE($3, name),
                   password_hash = COALESCE($4, password_hash)
             WHERE id = $1
            RETURNING id, email, password_hash, name, fullname, is_active, is_staff
            "#,
        )
        .bind(id)
        .bind(changes.email)
        .bind(changes.name)
        .bind(changes.password_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// In-memory user store backing `AppState::fake`.
#[derive(Default)]
pub struct MemoryUserRepo {
    inner: Mutex<MemoryUsers>,
}

#[derive(Default)]
struct MemoryUsers {
    next_id: i64,
    rows: Vec<User>,
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.rows.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.rows.iter().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, new: NewUser) -> anyhow::Result<User> {
        let mut inner = self.inner.lock().unwrap();
        anyhow::ensure!(
            !inner.rows.iter().any(|u| u.email == new.email),
            "duplicate email"
        );
        inner.next_id += 1;
        let user = User {
            id: inner.next_id,
            email: new.email,
            password_hash: new.password_hash,
            name: new.name,
            fullname: new.fullname,
            is_active: true,
            is_staff: new.is_staff,
        };
        inner.rows.push(user.clone());
        Ok(user)
    }

    async fn update_fields(&self, id: i64, changes: UserChanges) -> anyhow::Result<Option<User>> {
        let mut inner = self.inner.lock().unwrap();
        let Some(user) = inner.rows.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.rows.len();
        inner.rows.retain(|u| u.id != id);
        Ok(inner.rows.len() < before)
    }
}
