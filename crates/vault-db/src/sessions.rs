//! Bearer-token session repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use vault_core::{Error, Result, SessionRepository};

/// PostgreSQL implementation of SessionRepository.
#[derive(Clone)]
pub struct PgSessionRepository {
    pool: Pool<Postgres>,
}

impl PgSessionRepository {
    /// Create a new PgSessionRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn create(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO auth_session (id, user_id, token_hash, expires_at, revoked, created_at)
             VALUES ($1, $2, $3, $4, false, $5)",
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn validate(&self, token_hash: &str) -> Result<Option<Uuid>> {
        let row = sqlx::query(
            "SELECT s.user_id
             FROM auth_session s
             JOIN app_user u ON u.id = s.user_id
             WHERE s.token_hash = $1
               AND s.revoked = false
               AND s.expires_at > $2
               AND u.is_active = true",
        )
        .bind(token_hash)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| r.get("user_id")))
    }

    async fn revoke(&self, token_hash: &str) -> Result<()> {
        let result = sqlx::query("UPDATE auth_session SET revoked = true WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "sessions",
            op = "revoke",
            revoked = result.rows_affected(),
            "Session revoked"
        );
        Ok(())
    }

    async fn purge_stale(&self) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM auth_session WHERE revoked = true OR expires_at <= $1")
                .bind(Utc::now())
                .execute(&self.pool)
                .await
                .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }
}
