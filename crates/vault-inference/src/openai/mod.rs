//! OpenAI-compatible embedding backend.
//!
//! Works with any endpoint exposing `POST /embeddings` in the OpenAI shape:
//! the OpenAI cloud API, Azure OpenAI, Ollama in compatibility mode, vLLM,
//! LocalAI.
//!
//! # Example
//!
//! ```rust,no_run
//! use vault_inference::openai::OpenAIBackend;
//! use vault_core::EmbeddingBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = OpenAIBackend::from_env().unwrap();
//!     let vector = backend.embed_text("Hello, world!").await.unwrap();
//!     assert_eq!(vector.as_slice().len(), backend.dimension());
//! }
//! ```

mod backend;
mod error;
mod types;

pub use backend::{OpenAIBackend, OpenAIConfig, SLOW_EMBED_MS};
pub use error::{to_vault_error, OpenAIErrorCode};
pub use types::*;
