//! Embedding repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use pgvector::Vector;
use sqlx::{Pool, Postgres, Row, Transaction};
use tracing::{debug, trace};
use uuid::Uuid;

use vault_core::{EmbeddingRepository, Error, NewEmbedding, NoteEmbedding, NoteMatch, Result};

/// PostgreSQL implementation of EmbeddingRepository.
#[derive(Clone)]
pub struct PgEmbeddingRepository {
    pool: Pool<Postgres>,
}

impl PgEmbeddingRepository {
    /// Create a new PgEmbeddingRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert or overwrite the embedding of a note within a transaction.
    ///
    /// An existing row keeps its id, so a note's `vectorId` is stable across
    /// regenerations.
    pub async fn upsert_tx(
        tx: &mut Transaction<'_, Postgres>,
        note_id: Uuid,
        embedding: &NewEmbedding,
    ) -> Result<Uuid> {
        let row = sqlx::query(
            "INSERT INTO note_embedding (id, note_id, embedding, model, created_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (note_id) DO UPDATE
             SET embedding = EXCLUDED.embedding,
                 model = EXCLUDED.model,
                 created_at = EXCLUDED.created_at
             RETURNING id",
        )
        .bind(Uuid::now_v7())
        .bind(note_id)
        .bind(&embedding.vector)
        .bind(&embedding.model)
        .bind(Utc::now())
        .fetch_one(&mut **tx)
        .await
        .map_err(Error::Database)?;

        Ok(row.get("id"))
    }

    /// Delete the embedding of a note within a transaction.
    pub async fn delete_tx(tx: &mut Transaction<'_, Postgres>, note_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM note_embedding WHERE note_id = $1")
            .bind(note_id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}

#[async_trait]
impl EmbeddingRepository for PgEmbeddingRepository {
    async fn get_for_note(&self, note_id: Uuid) -> Result<Option<NoteEmbedding>> {
        let row = sqlx::query(
            "SELECT id, note_id, embedding, model, created_at
             FROM note_embedding WHERE note_id = $1",
        )
        .bind(note_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|row| NoteEmbedding {
            id: row.get("id"),
            note_id: row.get("note_id"),
            vector: row.get::<Vector, _>("embedding"),
            model: row.get("model"),
            created_at: row.get("created_at"),
        }))
    }

    async fn match_notes(
        &self,
        query: &Vector,
        threshold: f64,
        count: i64,
        owner_id: Uuid,
    ) -> Result<Vec<NoteMatch>> {
        let rows = sqlx::query("SELECT id, similarity FROM match_notes($1, $2, $3, $4)")
            .bind(query)
            .bind(threshold)
            .bind(count.clamp(0, i32::MAX as i64) as i32)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let matches: Vec<NoteMatch> = rows
            .into_iter()
            .map(|row| NoteMatch {
                note_id: row.get("id"),
                similarity: row.get("similarity"),
            })
            .collect();

        for m in &matches {
            trace!(note_id = %m.note_id, similarity = m.similarity, "Similarity match");
        }
        debug!(
            subsystem = "db",
            component = "embeddings",
            op = "match_notes",
            user_id = %owner_id,
            threshold,
            result_count = matches.len(),
            "Similarity search complete"
        );
        Ok(matches)
    }
}
