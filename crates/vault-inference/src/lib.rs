//! # vault-inference
//!
//! Embedding backends for thoughtvault.
//!
//! This crate provides:
//! - An OpenAI-compatible HTTP embedding backend (`POST {base}/embeddings`)
//! - A deterministic mock backend for tests (feature `mock`)
//!
//! # Example
//!
//! ```rust,no_run
//! use vault_inference::OpenAIBackend;
//! use vault_core::EmbeddingBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = OpenAIBackend::from_env().unwrap();
//!     let texts = vec!["Hello".to_string()];
//!     let embeddings = backend.embed_texts(&texts).await.unwrap();
//! }
//! ```

pub mod openai;

// Mock embedding backend for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use vault_core::*;

pub use openai::{OpenAIBackend, OpenAIConfig};
