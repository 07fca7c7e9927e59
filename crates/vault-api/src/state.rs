//! Application state shared across handlers.

use std::sync::Arc;

use vault_core::EmbeddingBackend;
use vault_db::Repositories;

use crate::config::ApiConfig;
use crate::services::{AuthService, NoteService, SearchService, TagResolver};

/// Services wired to one set of storage and embedding collaborators.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub notes: NoteService,
    pub search: SearchService,
    pub tags: TagResolver,
}

impl AppState {
    pub fn new(
        repos: Repositories,
        embedder: Arc<dyn EmbeddingBackend>,
        config: &ApiConfig,
    ) -> Self {
        let tags = TagResolver::new(repos.tags.clone());
        Self {
            auth: AuthService::new(repos.users, repos.sessions, config.token_ttl_minutes),
            notes: NoteService::new(repos.notes.clone(), tags.clone(), embedder.clone()),
            search: SearchService::new(
                repos.notes,
                repos.embeddings,
                embedder,
                config.match_threshold,
            ),
            tags,
        }
    }
}
