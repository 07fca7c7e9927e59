//! User account repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::info;
use uuid::Uuid;

use vault_core::{Error, NewUser, Result, User, UserCredentials, UserRepository};

/// PostgreSQL implementation of UserRepository.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    /// Create a new PgUserRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        username: row.get("username"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    }
}

/// Map a unique violation on `app_user` to a conflict naming the field.
fn conflict_message(constraint: Option<&str>) -> String {
    match constraint {
        Some(c) if c.contains("username") => "Username already taken".to_string(),
        _ => "Email already registered".to_string(),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, req: NewUser) -> Result<User> {
        let row = sqlx::query(
            "INSERT INTO app_user (id, email, username, password_hash, is_active, created_at)
             VALUES ($1, $2, $3, $4, TRUE, $5)
             RETURNING id, email, username, is_active, created_at",
        )
        .bind(Uuid::now_v7())
        .bind(&req.email)
        .bind(&req.username)
        .bind(&req.password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Error::Conflict(conflict_message(db_err.constraint()))
            }
            other => Error::Database(other),
        })?;

        let user = user_from_row(&row);
        info!(
            subsystem = "db",
            component = "users",
            op = "create",
            user_id = %user.id,
            "User registered"
        );
        Ok(user)
    }

    async fn find_credentials(&self, login: &str) -> Result<Option<UserCredentials>> {
        let row = sqlx::query(
            "SELECT id, email, username, password_hash, is_active, created_at
             FROM app_user
             WHERE lower(email) = lower($1) OR username = $1
             LIMIT 1",
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|row| UserCredentials {
            user: user_from_row(&row),
            password_hash: row.get("password_hash"),
        }))
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, username, is_active, created_at FROM app_user WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(user_from_row))
    }
}
