//! Semantic search over a user's embedded notes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument, trace};
use uuid::Uuid;

use vault_core::{
    EmbeddingBackend, EmbeddingRepository, Error, NoteRepository, Result, SearchHit,
    SearchRequest, Vector,
};

/// Embeds queries and ranks the caller's notes by cosine similarity.
#[derive(Clone)]
pub struct SearchService {
    notes: Arc<dyn NoteRepository>,
    embeddings: Arc<dyn EmbeddingRepository>,
    embedder: Arc<dyn EmbeddingBackend>,
    match_threshold: f64,
}

impl SearchService {
    pub fn new(
        notes: Arc<dyn NoteRepository>,
        embeddings: Arc<dyn EmbeddingRepository>,
        embedder: Arc<dyn EmbeddingBackend>,
        match_threshold: f64,
    ) -> Self {
        Self {
            notes,
            embeddings,
            embedder,
            match_threshold,
        }
    }

    /// Up to `limit` of the owner's notes with similarity at or above the
    /// threshold, most similar first.
    #[instrument(skip(self, req), fields(subsystem = "api", component = "search_service", op = "search", user_id = %owner_id, query = %req.query, limit = req.limit))]
    pub async fn search(&self, owner_id: Uuid, req: SearchRequest) -> Result<Vec<SearchHit>> {
        req.validate()?;
        let start = Instant::now();

        let query_vector = self.embedder.embed_text(req.query.trim()).await?;
        let matches = self
            .embeddings
            .match_notes(&query_vector, self.match_threshold, req.limit, owner_id)
            .await?;
        if matches.is_empty() {
            info!(
                result_count = 0,
                duration_ms = start.elapsed().as_millis() as u64,
                "Search complete"
            );
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = matches.iter().map(|m| m.note_id).collect();
        let mut notes: HashMap<Uuid, _> = self
            .notes
            .fetch_many(owner_id, &ids)
            .await?
            .into_iter()
            .map(|n| (n.id, n))
            .collect();

        // Match order is the ranking; notes deleted in between are skipped.
        let hits: Vec<SearchHit> = matches
            .into_iter()
            .filter_map(|m| {
                let note = notes.remove(&m.note_id)?;
                trace!(note_id = %m.note_id, similarity = m.similarity, "Search hit");
                Some(SearchHit {
                    note,
                    similarity: m.similarity,
                })
            })
            .collect();

        info!(
            result_count = hits.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Search complete"
        );
        Ok(hits)
    }

    /// Embed arbitrary text with the configured backend.
    pub async fn embed(&self, text: &str) -> Result<Vector> {
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("Text is required".to_string()));
        }
        let vector = self.embedder.embed_text(text).await?;
        debug!(dimension = vector.as_slice().len(), "Embedded text");
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{NoteService, TagResolver};
    use vault_core::{CreateNoteRequest, NoteType};
    use vault_db::MemoryStore;
    use vault_inference::mock::MockEmbeddingBackend;

    async fn seeded() -> (SearchService, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let embedder = Arc::new(
            MockEmbeddingBackend::new()
                .with_dimension(3)
                .with_vector_for("vector databases", vec![1.0, 0.0, 0.0])
                .with_vector_for("Rust ownership ", vec![1.0, 0.0, 0.0])
                .with_vector_for("Pgvector ann ", vec![0.8, 0.6, 0.0])
                .with_vector_for("Cooking pasta ", vec![0.0, 0.0, 1.0]),
        );
        let notes = NoteService::new(
            store.clone(),
            TagResolver::new(store.clone()),
            embedder.clone(),
        );
        let owner = Uuid::now_v7();
        for (title, content) in [
            ("Rust", "ownership"),
            ("Pgvector", "ann"),
            ("Cooking", "pasta"),
        ] {
            notes
                .create(
                    owner,
                    CreateNoteRequest {
                        title: title.to_string(),
                        content: content.to_string(),
                        note_type: NoteType::Note,
                        tags: vec![],
                        store_vector: true,
                    },
                )
                .await
                .unwrap();
        }

        (SearchService::new(store.clone(), store, embedder, 0.5), owner)
    }

    #[tokio::test]
    async fn test_search_ranks_and_thresholds() {
        let (search, owner) = seeded().await;
        let hits = search
            .search(owner, SearchRequest::new("vector databases"))
            .await
            .unwrap();

        let titles: Vec<_> = hits.iter().map(|h| h.note.title.as_str()).collect();
        assert_eq!(titles, vec!["Rust", "Pgvector"]);
        assert!(hits.windows(2).all(|w| w[0].similarity >= w[1].similarity));
        assert!(hits.iter().all(|h| h.similarity >= 0.5));
    }

    #[tokio::test]
    async fn test_search_respects_limit_and_owner() {
        let (search, owner) = seeded().await;
        let mut req = SearchRequest::new("vector databases");
        req.limit = 1;
        assert_eq!(search.search(owner, req).await.unwrap().len(), 1);

        let other = search
            .search(Uuid::now_v7(), SearchRequest::new("vector databases"))
            .await
            .unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn test_search_rejects_blank_query() {
        let (search, owner) = seeded().await;
        let err = search
            .search(owner, SearchRequest::new("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_embed_returns_backend_dimension() {
        let (search, _) = seeded().await;
        assert_eq!(search.embed("hello").await.unwrap().as_slice().len(), 3);
        assert!(search.embed("").await.is_err());
    }
}
