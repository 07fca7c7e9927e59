//! Note repository implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, Pool, Postgres, Row, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use vault_core::{
    ApplyNoteUpdate, EmbeddingChange, Error, InsertNote, Note, NoteRepository, NoteType, Result,
    Tag,
};

use crate::embeddings::PgEmbeddingRepository;

/// Columns of a note row, joined with its embedding id.
const NOTE_SELECT: &str = "SELECT n.id, n.title, n.content, n.note_type, n.created_at, \
     n.updated_at, e.id AS vector_id \
     FROM note n LEFT JOIN note_embedding e ON e.note_id = n.id";

/// PostgreSQL implementation of NoteRepository.
#[derive(Clone)]
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Fetch a note within an existing transaction.
    pub async fn fetch_tx(
        tx: &mut Transaction<'_, Postgres>,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Note> {
        let row = sqlx::query(&format!("{NOTE_SELECT} WHERE n.id = $1 AND n.owner_id = $2"))
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::NoteNotFound(id))?;

        let mut notes = hydrate(&mut **tx, vec![row]).await?;
        notes.pop().ok_or(Error::NoteNotFound(id))
    }

    /// Replace the tag links of a note, keeping the given order.
    async fn link_tags_tx(
        tx: &mut Transaction<'_, Postgres>,
        note_id: Uuid,
        tag_ids: &[Uuid],
    ) -> Result<()> {
        sqlx::query("DELETE FROM note_tag WHERE note_id = $1")
            .bind(note_id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;

        for (position, tag_id) in tag_ids.iter().enumerate() {
            sqlx::query(
                "INSERT INTO note_tag (note_id, tag_id, position) VALUES ($1, $2, $3)
                 ON CONFLICT DO NOTHING",
            )
            .bind(note_id)
            .bind(tag_id)
            .bind(position as i32)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;
        }
        Ok(())
    }
}

/// Turn note rows into notes, loading all their tags in one query.
async fn hydrate<'e, E: PgExecutor<'e>>(executor: E, rows: Vec<PgRow>) -> Result<Vec<Note>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = rows.iter().map(|r| r.get("id")).collect();
    let tag_rows = sqlx::query(
        "SELECT nt.note_id, t.id, t.name
         FROM note_tag nt
         JOIN tag t ON t.id = nt.tag_id
         WHERE nt.note_id = ANY($1)
         ORDER BY nt.note_id, nt.position",
    )
    .bind(&ids)
    .fetch_all(executor)
    .await
    .map_err(Error::Database)?;

    let mut tags_by_note: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    for row in tag_rows {
        tags_by_note
            .entry(row.get("note_id"))
            .or_default()
            .push(Tag {
                id: row.get("id"),
                name: row.get("name"),
            });
    }

    rows.into_iter()
        .map(|row| {
            let id: Uuid = row.get("id");
            let note_type: String = row.get("note_type");
            Ok(Note {
                id,
                title: row.get("title"),
                content: row.get("content"),
                note_type: note_type.parse::<NoteType>().map_err(Error::Serialization)?,
                tags: tags_by_note.remove(&id).unwrap_or_default(),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
                vector_id: row.get("vector_id"),
            })
        })
        .collect()
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn insert(&self, req: InsertNote) -> Result<Note> {
        let note_id = Uuid::now_v7();
        let now = Utc::now();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query(
            "INSERT INTO note (id, owner_id, title, content, note_type, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)",
        )
        .bind(note_id)
        .bind(req.owner_id)
        .bind(&req.title)
        .bind(&req.content)
        .bind(req.note_type.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        Self::link_tags_tx(&mut tx, note_id, &req.tag_ids).await?;

        if let Some(embedding) = &req.embedding {
            PgEmbeddingRepository::upsert_tx(&mut tx, note_id, embedding).await?;
        }

        let note = Self::fetch_tx(&mut tx, req.owner_id, note_id).await?;
        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "notes",
            op = "insert",
            note_id = %note_id,
            tag_count = req.tag_ids.len(),
            has_embedding = note.has_embedding(),
            "Note inserted"
        );
        Ok(note)
    }

    async fn fetch(&self, owner_id: Uuid, id: Uuid) -> Result<Note> {
        let row = sqlx::query(&format!("{NOTE_SELECT} WHERE n.id = $1 AND n.owner_id = $2"))
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::NoteNotFound(id))?;

        let mut notes = hydrate(&self.pool, vec![row]).await?;
        notes.pop().ok_or(Error::NoteNotFound(id))
    }

    async fn fetch_many(&self, owner_id: Uuid, ids: &[Uuid]) -> Result<Vec<Note>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(&format!(
            "{NOTE_SELECT} WHERE n.owner_id = $1 AND n.id = ANY($2)"
        ))
        .bind(owner_id)
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        hydrate(&self.pool, rows).await
    }

    async fn list(&self, owner_id: Uuid) -> Result<Vec<Note>> {
        let rows = sqlx::query(&format!(
            "{NOTE_SELECT} WHERE n.owner_id = $1 ORDER BY n.created_at DESC, n.id DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "notes",
            op = "list",
            user_id = %owner_id,
            result_count = rows.len(),
            "Listed notes"
        );
        hydrate(&self.pool, rows).await
    }

    async fn update(&self, owner_id: Uuid, id: Uuid, req: ApplyNoteUpdate) -> Result<Note> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let exists = sqlx::query("SELECT 1 FROM note WHERE id = $1 AND owner_id = $2 FOR UPDATE")
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?;
        if exists.is_none() {
            return Err(Error::NoteNotFound(id));
        }

        // Build dynamic UPDATE; updated_at always moves.
        let mut sets = vec!["updated_at = $1".to_string()];
        let mut param_idx = 2;
        if req.title.is_some() {
            sets.push(format!("title = ${}", param_idx));
            param_idx += 1;
        }
        if req.content.is_some() {
            sets.push(format!("content = ${}", param_idx));
            param_idx += 1;
        }
        if req.note_type.is_some() {
            sets.push(format!("note_type = ${}", param_idx));
            param_idx += 1;
        }
        let sql = format!(
            "UPDATE note SET {} WHERE id = ${}",
            sets.join(", "),
            param_idx
        );

        let mut query = sqlx::query(&sql).bind(Utc::now());
        if let Some(title) = &req.title {
            query = query.bind(title);
        }
        if let Some(content) = &req.content {
            query = query.bind(content);
        }
        if let Some(note_type) = req.note_type {
            query = query.bind(note_type.as_str());
        }
        query
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        if let Some(tag_ids) = &req.tag_ids {
            Self::link_tags_tx(&mut tx, id, tag_ids).await?;
        }

        match &req.embedding {
            EmbeddingChange::Keep => {}
            EmbeddingChange::Replace(embedding) => {
                PgEmbeddingRepository::upsert_tx(&mut tx, id, embedding).await?;
            }
            EmbeddingChange::Remove => {
                PgEmbeddingRepository::delete_tx(&mut tx, id).await?;
            }
        }

        let note = Self::fetch_tx(&mut tx, owner_id, id).await?;
        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "notes",
            op = "update",
            note_id = %id,
            has_embedding = note.has_embedding(),
            "Note updated"
        );
        Ok(note)
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<()> {
        // note_tag and note_embedding rows cascade; tag rows stay.
        let result = sqlx::query("DELETE FROM note WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NoteNotFound(id));
        }

        info!(
            subsystem = "db",
            component = "notes",
            op = "delete",
            note_id = %id,
            "Note deleted"
        );
        Ok(())
    }
}
