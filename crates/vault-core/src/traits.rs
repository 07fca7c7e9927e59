//! Core traits for thoughtvault abstractions.
//!
//! These traits define the storage and embedding collaborators. The
//! PostgreSQL repositories and the in-memory store in `vault-db`, and the
//! HTTP embedding backend in `vault-inference`, implement them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// NOTE REPOSITORY TRAITS
// =============================================================================

/// Embedding to persist alongside a note.
#[derive(Debug, Clone)]
pub struct NewEmbedding {
    pub vector: Vector,
    pub model: String,
}

/// Fully resolved note write: tags are already records, the embedding is
/// already computed. The repository writes note, links and embedding
/// in one transaction.
#[derive(Debug, Clone)]
pub struct InsertNote {
    pub owner_id: Uuid,
    pub title: String,
    pub content: String,
    pub note_type: NoteType,
    pub tag_ids: Vec<Uuid>,
    pub embedding: Option<NewEmbedding>,
}

/// What to do with a note's embedding during an update.
#[derive(Debug, Clone, Default)]
pub enum EmbeddingChange {
    /// Leave the stored embedding (or its absence) untouched.
    #[default]
    Keep,
    /// Insert or overwrite the embedding.
    Replace(NewEmbedding),
    /// Delete the embedding if one exists.
    Remove,
}

/// Resolved partial update of a note.
#[derive(Debug, Clone, Default)]
pub struct ApplyNoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub note_type: Option<NoteType>,
    /// Replaces all tag links when present.
    pub tag_ids: Option<Vec<Uuid>>,
    pub embedding: EmbeddingChange,
}

/// Repository for note CRUD operations. Every call is scoped to an owner.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Insert a note with its tag links and optional embedding.
    async fn insert(&self, req: InsertNote) -> Result<Note>;

    /// Fetch one note. Errors with `NoteNotFound` if missing or not owned.
    async fn fetch(&self, owner_id: Uuid, id: Uuid) -> Result<Note>;

    /// Fetch several notes owned by `owner_id`, skipping unknown ids.
    async fn fetch_many(&self, owner_id: Uuid, ids: &[Uuid]) -> Result<Vec<Note>>;

    /// List all notes of an owner, newest first.
    async fn list(&self, owner_id: Uuid) -> Result<Vec<Note>>;

    /// Apply a partial update and return the updated note.
    async fn update(&self, owner_id: Uuid, id: Uuid, req: ApplyNoteUpdate) -> Result<Note>;

    /// Delete a note, its tag links and its embedding. Tags are kept.
    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<()>;
}

// =============================================================================
// TAG REPOSITORY TRAITS
// =============================================================================

/// Repository for shared tags.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Return tag records for `names`, creating the missing ones.
    ///
    /// Idempotent; output follows input order. Names must already be
    /// normalized.
    async fn resolve(&self, names: &[String]) -> Result<Vec<Tag>>;

    /// Tags attached to at least one note of `owner_id`, sorted by name.
    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Tag>>;

    /// Look up a tag by exact name.
    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>>;
}

// =============================================================================
// EMBEDDING REPOSITORY TRAITS
// =============================================================================

/// Repository for note embeddings and similarity search.
#[async_trait]
pub trait EmbeddingRepository: Send + Sync {
    /// Get the embedding of a note, if any.
    async fn get_for_note(&self, note_id: Uuid) -> Result<Option<NoteEmbedding>>;

    /// Similarity search scoped to one user.
    ///
    /// Returns matches with cosine similarity `>= threshold`, ordered by
    /// descending similarity, at most `count` rows.
    async fn match_notes(
        &self,
        query: &Vector,
        threshold: f64,
        count: i64,
        owner_id: Uuid,
    ) -> Result<Vec<NoteMatch>>;
}

// =============================================================================
// USER / SESSION REPOSITORY TRAITS
// =============================================================================

/// Data needed to create an account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
}

/// Repository for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a user. Errors with `Conflict` on duplicate email or username.
    async fn create(&self, req: NewUser) -> Result<User>;

    /// Find credentials by email or username.
    async fn find_credentials(&self, login: &str) -> Result<Option<UserCredentials>>;

    /// Get a user by id.
    async fn get(&self, id: Uuid) -> Result<Option<User>>;
}

/// Repository for bearer-token sessions.
///
/// Only token hashes are stored; the plaintext token is never persisted.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Store a session for `user_id` identified by `token_hash`.
    async fn create(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Return the user id of a live (unexpired, unrevoked) session.
    async fn validate(&self, token_hash: &str) -> Result<Option<Uuid>>;

    /// Revoke a session. Unknown hashes are ignored.
    async fn revoke(&self, token_hash: &str) -> Result<()>;

    /// Delete expired and revoked sessions. Returns the number removed.
    async fn purge_stale(&self) -> Result<u64>;
}

// =============================================================================
// INFERENCE TRAITS
// =============================================================================

/// Backend for generating text embeddings.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for the given texts.
    ///
    /// Returns a vector of embedding vectors, one per input text.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>>;

    /// Get the expected dimension of embedding vectors.
    fn dimension(&self) -> usize;

    /// Get the model name being used.
    fn model_name(&self) -> &str;

    /// Embed a single text.
    async fn embed_text(&self, text: &str) -> Result<Vector> {
        let mut vectors = self.embed_texts(&[text.to_string()]).await?;
        vectors.pop().ok_or_else(|| {
            crate::Error::Embedding("Backend returned no embedding".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedBackend(Vec<Vector>);

    #[async_trait]
    impl EmbeddingBackend for FixedBackend {
        async fn embed_texts(&self, _texts: &[String]) -> Result<Vec<Vector>> {
            Ok(self.0.clone())
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_embed_text_returns_single_vector() {
        let backend = FixedBackend(vec![Vector::from(vec![0.5, 0.5])]);
        let v = backend.embed_text("hello").await.unwrap();
        assert_eq!(v.as_slice(), &[0.5, 0.5]);
    }

    #[tokio::test]
    async fn test_embed_text_empty_response_is_error() {
        let backend = FixedBackend(vec![]);
        let err = backend.embed_text("hello").await.unwrap_err();
        assert!(matches!(err, crate::Error::Embedding(_)));
    }

    #[test]
    fn test_embedding_change_default_is_keep() {
        assert!(matches!(EmbeddingChange::default(), EmbeddingChange::Keep));
        let update = ApplyNoteUpdate::default();
        assert!(update.title.is_none());
        assert!(update.tag_ids.is_none());
    }
}
