//! Notes façade with a cached note list.
//!
//! The list is cached per token and dropped after every successful write,
//! so the next `list` call refetches. Every drop bumps a generation counter;
//! a fetch that was in flight across a write is returned to its caller but
//! never cached.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use vault_core::{CreateNoteRequest, Note, Result, Tag, UpdateNoteRequest};

use crate::api::ApiClient;
use crate::notice::Notice;

struct CachedList {
    token: String,
    notes: Vec<Note>,
}

#[derive(Default)]
struct ListCache {
    /// Bumped on every invalidation.
    generation: u64,
    entry: Option<CachedList>,
}

/// Note operations for the signed-in user.
#[derive(Clone)]
pub struct NotesClient {
    api: ApiClient,
    cache: Arc<Mutex<ListCache>>,
}

impl NotesClient {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            cache: Arc::new(Mutex::new(ListCache::default())),
        }
    }

    /// All notes, newest first. Served from cache when possible.
    pub async fn list(&self) -> Result<Vec<Note>> {
        let token = self.api.token();
        let generation = {
            let cache = self.cache.lock().await;
            if let (Some(cached), Some(token)) = (cache.entry.as_ref(), token.as_deref()) {
                if cached.token == token {
                    debug!(result_count = cached.notes.len(), "Note list served from cache");
                    return Ok(cached.notes.clone());
                }
            }
            cache.generation
        };

        let notes: Vec<Note> = self.api.get("/notes").await?;

        if let Some(token) = token {
            let mut cache = self.cache.lock().await;
            if cache.generation == generation {
                cache.entry = Some(CachedList {
                    token,
                    notes: notes.clone(),
                });
            } else {
                debug!("Note list changed while fetching, not caching");
            }
        }
        Ok(notes)
    }

    /// Drop the cached list.
    pub async fn invalidate(&self) {
        let mut cache = self.cache.lock().await;
        cache.generation = cache.generation.wrapping_add(1);
        cache.entry = None;
    }

    pub async fn get(&self, id: Uuid) -> Result<Note> {
        self.api.get(&format!("/notes/{}", id)).await
    }

    /// Create a note. The draft is validated before any request is sent.
    #[instrument(skip(self, draft), fields(subsystem = "client", component = "notes", op = "create"))]
    pub async fn create(&self, draft: CreateNoteRequest) -> Result<Note> {
        draft.validate()?;

        match self.api.post::<_, Note>("/notes", &draft).await {
            Ok(note) => {
                self.invalidate().await;
                self.api.notices().emit(Notice::note_created(&note));
                Ok(note)
            }
            Err(e) => {
                warn!(error = %e, "Failed to create note");
                self.api.notices().emit(Notice::note_create_failed());
                Err(e)
            }
        }
    }

    /// Apply a partial update.
    #[instrument(skip(self, changes), fields(subsystem = "client", component = "notes", op = "update", note_id = %id))]
    pub async fn update(&self, id: Uuid, changes: UpdateNoteRequest) -> Result<Note> {
        changes.validate()?;

        match self.api.put::<_, Note>(&format!("/notes/{}", id), &changes).await {
            Ok(note) => {
                self.invalidate().await;
                self.api.notices().emit(Notice::note_updated());
                Ok(note)
            }
            Err(e) => {
                warn!(error = %e, "Failed to update note");
                self.api.notices().emit(Notice::note_update_failed());
                Err(e)
            }
        }
    }

    #[instrument(skip(self), fields(subsystem = "client", component = "notes", op = "delete", note_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        match self.api.delete(&format!("/notes/{}", id)).await {
            Ok(()) => {
                self.invalidate().await;
                self.api.notices().emit(Notice::note_deleted());
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to delete note");
                self.api.notices().emit(Notice::note_delete_failed());
                Err(e)
            }
        }
    }

    /// Tags attached to the user's notes.
    pub async fn tags(&self) -> Result<Vec<Tag>> {
        self.api.get("/tags").await
    }
}
