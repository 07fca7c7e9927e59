//! Tag repository implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use vault_core::{Error, Result, Tag, TagRepository};

/// PostgreSQL implementation of TagRepository.
#[derive(Clone)]
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    /// Create a new PgTagRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn resolve(&self, names: &[String]) -> Result<Vec<Tag>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        // Concurrent writers may race on the same name; the unique
        // constraint plus DO NOTHING makes creation idempotent.
        for name in names {
            sqlx::query(
                "INSERT INTO tag (id, name, created_at) VALUES ($1, $2, $3)
                 ON CONFLICT (name) DO NOTHING",
            )
            .bind(Uuid::now_v7())
            .bind(name)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        }

        let rows = sqlx::query("SELECT id, name FROM tag WHERE name = ANY($1)")
            .bind(names)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let mut by_name: HashMap<String, Uuid> = rows
            .into_iter()
            .map(|row| (row.get("name"), row.get("id")))
            .collect();

        let tags = names
            .iter()
            .map(|name| {
                by_name
                    .remove(name)
                    .map(|id| Tag {
                        id,
                        name: name.clone(),
                    })
                    .ok_or_else(|| Error::Internal(format!("Tag '{}' missing after upsert", name)))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            subsystem = "db",
            component = "tags",
            op = "resolve",
            tag_count = tags.len(),
            "Resolved tags"
        );
        Ok(tags)
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            "SELECT DISTINCT t.id, t.name
             FROM tag t
             JOIN note_tag nt ON nt.tag_id = t.id
             JOIN note n ON n.id = nt.note_id
             WHERE n.owner_id = $1
             ORDER BY t.name",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| Tag {
                id: row.get("id"),
                name: row.get("name"),
            })
            .collect())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let row = sqlx::query("SELECT id, name FROM tag WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(|row| Tag {
            id: row.get("id"),
            name: row.get("name"),
        }))
    }
}
