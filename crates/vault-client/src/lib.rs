//! # vault-client
//!
//! Client-side façades for the thoughtvault API.
//!
//! - [`ApiClient`]: typed HTTP calls with bearer auth. Owns the observable
//!   [`AuthState`] and signs out on any `401`.
//! - [`AuthSession`]: login, logout, registration and token restore.
//! - [`NotesClient`]: note CRUD with a cached, write-invalidated list.
//! - [`SearchDebouncer`]: debounced semantic search over [`SemanticSearch`].
//! - [`NoticeBus`]: user-facing notices (toasts) for the outcomes above.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vault_client::{ApiClient, AuthSession, ClientConfig, FileTokenStore, NotesClient};
//!
//! let config = ClientConfig::from_env();
//! let tokens = Arc::new(FileTokenStore::new(config.token_path.clone()));
//! let api = ApiClient::new(&config, tokens)?;
//!
//! let session = AuthSession::new(api.clone());
//! if !session.restore().await? {
//!     session.login("ada", "correct horse battery").await?;
//! }
//! let notes = NotesClient::new(api).list().await?;
//! ```

pub mod api;
pub mod config;
pub mod notes;
pub mod notice;
pub mod search;
pub mod session;
pub mod token_store;

pub use api::ApiClient;
pub use config::ClientConfig;
pub use notes::NotesClient;
pub use notice::{Notice, NoticeBus};
pub use search::{is_searchable, SearchDebouncer, SearchState, SemanticSearch};
pub use session::{AuthSession, AuthState};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};

// Re-export core types for convenience
pub use vault_core::*;
