//! # vault-core
//!
//! Core types, traits, and abstractions for the thoughtvault notes service.
//!
//! This crate provides the domain model (notes, tags, embeddings, users),
//! the error type, and the repository/backend traits that the storage,
//! inference, API and client crates build on.
//!
//! ## Logging conventions
//!
//! Every crate logs through `tracing` with the same structured field names:
//! `subsystem` (`api`, `db`, `inference`, `client`), `component`, `op`,
//! `note_id`, `user_id`, `duration_ms` and `result_count`.
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | 5xx responses, embedding collaborator failures |
//! | WARN  | Client-visible failures (4xx), rejected sessions |
//! | INFO  | Startup, shutdown, completed writes |
//! | DEBUG | Decision points and config choices |

pub mod defaults;
pub mod error;
pub mod models;
pub mod tags;
pub mod text;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use tags::{normalize_tag_names, validate_tag_name};
pub use text::compose_embedding_text;
pub use traits::*;
