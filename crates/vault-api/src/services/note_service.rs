//! Note writes and reads with embedding orchestration.
//!
//! A write runs in a fixed order: validate the request, compute the
//! embedding (if the note keeps one), resolve tags, then hand the fully
//! resolved write to the repository, which commits note, tag links and
//! embedding in one transaction. An embedding failure therefore aborts the
//! write before anything is stored.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use vault_core::{
    compose_embedding_text, ApplyNoteUpdate, CreateNoteRequest, EmbeddingBackend,
    EmbeddingChange, InsertNote, NewEmbedding, Note, NoteRepository, Result, UpdateNoteRequest,
};

use super::TagResolver;

/// Owner-scoped note operations.
#[derive(Clone)]
pub struct NoteService {
    notes: Arc<dyn NoteRepository>,
    tags: TagResolver,
    embedder: Arc<dyn EmbeddingBackend>,
}

impl NoteService {
    pub fn new(
        notes: Arc<dyn NoteRepository>,
        tags: TagResolver,
        embedder: Arc<dyn EmbeddingBackend>,
    ) -> Self {
        Self {
            notes,
            tags,
            embedder,
        }
    }

    async fn embed(&self, title: &str, content: &str, tags: &[String]) -> Result<NewEmbedding> {
        let text = compose_embedding_text(title, content, tags);
        let vector = self.embedder.embed_text(&text).await?;
        Ok(NewEmbedding {
            vector,
            model: self.embedder.model_name().to_string(),
        })
    }

    /// Create a note for `owner_id`.
    #[instrument(skip(self, req), fields(subsystem = "api", component = "note_service", op = "create", user_id = %owner_id))]
    pub async fn create(&self, owner_id: Uuid, req: CreateNoteRequest) -> Result<Note> {
        let start = Instant::now();
        let tag_names = req.validate()?;

        let embedding = if req.store_vector {
            Some(self.embed(&req.title, &req.content, &tag_names).await?)
        } else {
            None
        };

        let tag_ids = self.tags.resolve_ids(&tag_names).await?;

        let note = self
            .notes
            .insert(InsertNote {
                owner_id,
                title: req.title,
                content: req.content,
                note_type: req.note_type,
                tag_ids,
                embedding,
            })
            .await?;

        info!(
            note_id = %note.id,
            tag_count = note.tags.len(),
            has_embedding = note.has_embedding(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Note created"
        );
        Ok(note)
    }

    /// All notes of `owner_id`, newest first.
    pub async fn list(&self, owner_id: Uuid) -> Result<Vec<Note>> {
        let notes = self.notes.list(owner_id).await?;
        debug!(result_count = notes.len(), "Listed notes");
        Ok(notes)
    }

    /// One note of `owner_id`.
    pub async fn get(&self, owner_id: Uuid, id: Uuid) -> Result<Note> {
        self.notes.fetch(owner_id, id).await
    }

    /// Apply a partial update.
    ///
    /// `store_vector: Some(true)` makes sure an embedding exists,
    /// `Some(false)` drops it, `None` keeps the current state. A kept
    /// embedding is recomputed when title, content or tags change.
    #[instrument(skip(self, req), fields(subsystem = "api", component = "note_service", op = "update", user_id = %owner_id, note_id = %id))]
    pub async fn update(&self, owner_id: Uuid, id: Uuid, req: UpdateNoteRequest) -> Result<Note> {
        let tag_names = req.validate()?;
        let current = self.notes.fetch(owner_id, id).await?;
        if req.is_empty() {
            return Ok(current);
        }

        if req.note_type.is_some() || req.content.is_some() {
            let note_type = req.note_type.unwrap_or(current.note_type);
            let content = req.content.as_deref().unwrap_or(&current.content);
            note_type.validate_content(content)?;
        }

        let keep_embedding = req.store_vector.unwrap_or(current.has_embedding());
        let embedding = if keep_embedding {
            if !current.has_embedding() || req.affects_embedding() {
                let title = req.title.as_deref().unwrap_or(&current.title);
                let content = req.content.as_deref().unwrap_or(&current.content);
                let tags = tag_names.clone().unwrap_or_else(|| current.tag_names());
                EmbeddingChange::Replace(self.embed(title, content, &tags).await?)
            } else {
                EmbeddingChange::Keep
            }
        } else if current.has_embedding() {
            EmbeddingChange::Remove
        } else {
            EmbeddingChange::Keep
        };

        let tag_ids = match &tag_names {
            Some(names) => Some(self.tags.resolve_ids(names).await?),
            None => None,
        };

        let note = self
            .notes
            .update(
                owner_id,
                id,
                ApplyNoteUpdate {
                    title: req.title,
                    content: req.content,
                    note_type: req.note_type,
                    tag_ids,
                    embedding,
                },
            )
            .await?;

        info!(has_embedding = note.has_embedding(), "Note updated");
        Ok(note)
    }

    /// Delete a note with its embedding. Tags survive.
    #[instrument(skip(self), fields(subsystem = "api", component = "note_service", op = "delete", user_id = %owner_id, note_id = %id))]
    pub async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<()> {
        self.notes.delete(owner_id, id).await?;
        info!("Note deleted");
        Ok(())
    }
}
