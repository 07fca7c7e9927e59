//! Mock embedding backend for deterministic testing.
//!
//! Generates embeddings from the text content so the same text always maps
//! to the same vector, records every call, and can be switched into a
//! failing state to exercise error paths.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vault_inference::mock::MockEmbeddingBackend;
//!
//! let backend = MockEmbeddingBackend::new()
//!     .with_dimension(8)
//!     .with_vector_for("cats", vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
//!
//! let v = backend.embed_text("cats").await?;
//! assert_eq!(backend.embed_call_count(), 1);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use vault_core::{EmbeddingBackend, Error, Result, Vector};

/// Model name reported by the mock backend.
pub const MOCK_MODEL: &str = "mock-embedding";

/// Mock embedding backend for testing.
#[derive(Clone)]
pub struct MockEmbeddingBackend {
    config: Arc<MockConfig>,
    failing: Arc<AtomicBool>,
    call_log: Arc<Mutex<Vec<Vec<String>>>>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    dimension: usize,
    fixed_vectors: HashMap<String, Vec<f32>>,
    latency_ms: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            dimension: 16,
            fixed_vectors: HashMap::new(),
            latency_ms: 0,
        }
    }
}

impl MockEmbeddingBackend {
    /// Create a new mock backend with default configuration.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            failing: Arc::new(AtomicBool::new(false)),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        Arc::make_mut(&mut self.config).dimension = dimension;
        self
    }

    /// Return `vector` whenever exactly `text` is embedded.
    pub fn with_vector_for(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        Arc::make_mut(&mut self.config)
            .fixed_vectors
            .insert(text.into(), vector);
        self
    }

    /// Set simulated latency for every call.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    /// Make subsequent calls fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `embed_texts` calls made so far.
    pub fn embed_call_count(&self) -> usize {
        self.call_log.lock().map(|log| log.len()).unwrap_or(0)
    }

    /// Every text sent, in call order.
    pub fn embedded_texts(&self) -> Vec<String> {
        self.call_log
            .lock()
            .map(|log| log.iter().flatten().cloned().collect())
            .unwrap_or_default()
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        self.config
            .fixed_vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| generate(text, self.config.dimension))
    }
}

impl Default for MockEmbeddingBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Deterministic unit vector derived from the characters of `text`.
pub fn generate(text: &str, dimension: usize) -> Vec<f32> {
    let mut vec = vec![0.0; dimension.max(1)];
    let len = vec.len();
    for (i, c) in text.chars().enumerate() {
        let idx = (c as usize + i) % len;
        vec[idx] += 0.1;
    }

    let magnitude: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        vec.iter_mut().for_each(|x| *x /= magnitude);
    }
    vec
}

#[async_trait]
impl EmbeddingBackend for MockEmbeddingBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        if let Ok(mut log) = self.call_log.lock() {
            log.push(texts.to_vec());
        }
        if self.config.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.config.latency_ms)).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Embedding(
                "Simulated embedding failure".to_string(),
            ));
        }

        Ok(texts
            .iter()
            .map(|t| Vector::from(self.vector_for(t)))
            .collect())
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_name(&self) -> &str {
        MOCK_MODEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_backend_dimension_and_determinism() {
        let backend = MockEmbeddingBackend::new().with_dimension(32);

        let e1 = backend.embed_text("quantum computing").await.unwrap();
        let e2 = backend.embed_text("quantum computing").await.unwrap();

        assert_eq!(e1.as_slice().len(), 32);
        assert_eq!(e1.as_slice(), e2.as_slice());
        assert_eq!(backend.embed_call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_backend_fixed_vector() {
        let backend = MockEmbeddingBackend::new().with_vector_for("cats", vec![1.0, 0.0]);
        let v = backend.embed_text("cats").await.unwrap();
        assert_eq!(v.as_slice(), &[1.0, 0.0]);
    }

    #[tokio::test]
    async fn test_mock_backend_failure_toggle() {
        let backend = MockEmbeddingBackend::new();
        backend.set_failing(true);
        assert!(matches!(
            backend.embed_text("x").await.unwrap_err(),
            Error::Embedding(_)
        ));

        backend.set_failing(false);
        assert!(backend.embed_text("x").await.is_ok());
        assert_eq!(backend.embedded_texts(), vec!["x", "x"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_backend_latency_simulation() {
        let backend = MockEmbeddingBackend::new().with_latency_ms(50);

        let start = tokio::time::Instant::now();
        backend.embed_text("test").await.unwrap();

        assert!(start.elapsed().as_millis() >= 50);
    }

    #[test]
    fn test_generate_is_normalized() {
        let embedding = generate("test", 128);
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 0.01);
    }
}
