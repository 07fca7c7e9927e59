//! # vault-db
//!
//! Storage layer for thoughtvault.
//!
//! This crate provides:
//! - Connection pool management
//! - PostgreSQL repositories for users, sessions, notes, tags and embeddings
//! - Owner-scoped vector search through the `match_notes` SQL function (pgvector)
//! - An in-memory store implementing the same traits
//!
//! ## Example
//!
//! ```rust,ignore
//! use vault_db::{Database, NoteRepository, InsertNote, NoteType};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/thoughtvault").await?;
//!
//!     let note = db.notes.insert(InsertNote {
//!         owner_id,
//!         title: "Hello".to_string(),
//!         content: "world".to_string(),
//!         note_type: NoteType::Note,
//!         tag_ids: vec![],
//!         embedding: None,
//!     }).await?;
//!
//!     println!("Created note: {}", note.id);
//!     Ok(())
//! }
//! ```
use std::sync::Arc;

pub mod embeddings;
pub mod memory;
pub mod notes;
pub mod pool;
pub mod sessions;
pub mod tags;
pub mod users;

// Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use vault_core::*;

pub use embeddings::PgEmbeddingRepository;
pub use memory::{cosine_similarity, MemoryStore};
pub use notes::PgNoteRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use sessions::PgSessionRepository;
pub use tags::PgTagRepository;
pub use users::PgUserRepository;

/// Combined database context with all PostgreSQL repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    pub notes: PgNoteRepository,
    pub tags: PgTagRepository,
    pub embeddings: PgEmbeddingRepository,
    pub users: PgUserRepository,
    pub sessions: PgSessionRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            notes: PgNoteRepository::new(pool.clone()),
            tags: PgTagRepository::new(pool.clone()),
            embeddings: PgEmbeddingRepository::new(pool.clone()),
            users: PgUserRepository::new(pool.clone()),
            sessions: PgSessionRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

/// Storage collaborators as trait objects, independent of the backend.
#[derive(Clone)]
pub struct Repositories {
    pub notes: Arc<dyn NoteRepository>,
    pub tags: Arc<dyn TagRepository>,
    pub embeddings: Arc<dyn EmbeddingRepository>,
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionRepository>,
}

impl Repositories {
    /// Repositories backed by PostgreSQL.
    pub fn postgres(db: &Database) -> Self {
        Self {
            notes: Arc::new(db.notes.clone()),
            tags: Arc::new(db.tags.clone()),
            embeddings: Arc::new(db.embeddings.clone()),
            users: Arc::new(db.users.clone()),
            sessions: Arc::new(db.sessions.clone()),
        }
    }

    /// Repositories sharing one in-memory store.
    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            notes: store.clone(),
            tags: store.clone(),
            embeddings: store.clone(),
            users: store.clone(),
            sessions: store,
        }
    }
}
