//! Debounced semantic search.
//!
//! Typed queries go through [`SearchDebouncer::set_query`]. A query is sent
//! once input has been quiet for 500 ms, so a burst of keystrokes produces
//! one request for the last value. Queries of two characters or fewer clear
//! the results without a request. In-flight requests are not cancelled.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use vault_core::{defaults, Result, SearchHit, SearchRequest};

use crate::api::ApiClient;
use crate::notice::{Notice, NoticeBus};

/// Anything that can run a semantic search.
#[async_trait]
pub trait SemanticSearch: Send + Sync {
    async fn search(&self, request: SearchRequest) -> Result<Vec<SearchHit>>;
}

#[async_trait]
impl SemanticSearch for ApiClient {
    async fn search(&self, request: SearchRequest) -> Result<Vec<SearchHit>> {
        request.validate()?;
        self.post("/search", &request).await
    }
}

/// Observable search state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    /// Last query typed.
    pub query: String,
    /// Results of the last completed search.
    pub results: Vec<SearchHit>,
    pub is_searching: bool,
    /// Message of the last failure, cleared by the next search.
    pub error: Option<String>,
}

/// Whether `query` is long enough to be sent.
pub fn is_searchable(query: &str) -> bool {
    query.trim().chars().count() > defaults::SEARCH_MIN_QUERY_CHARS
}

/// Debounces typed queries into search requests.
///
/// The worker task stops when the debouncer is dropped.
pub struct SearchDebouncer {
    input: watch::Sender<String>,
    state: watch::Receiver<SearchState>,
    worker: JoinHandle<()>,
}

impl SearchDebouncer {
    /// Spawn a debouncer with the default quiet period and limit.
    pub fn spawn(backend: Arc<dyn SemanticSearch>, notices: NoticeBus) -> Self {
        Self::spawn_with(
            backend,
            notices,
            Duration::from_millis(defaults::SEARCH_DEBOUNCE_MS),
            defaults::SEARCH_LIMIT,
        )
    }

    pub fn spawn_with(
        backend: Arc<dyn SemanticSearch>,
        notices: NoticeBus,
        quiet_period: Duration,
        limit: i64,
    ) -> Self {
        let (input, input_rx) = watch::channel(String::new());
        let (state_tx, state) = watch::channel(SearchState::default());
        let worker = tokio::spawn(run(
            backend,
            notices,
            input_rx,
            state_tx,
            quiet_period,
            limit,
        ));
        Self {
            input,
            state,
            worker,
        }
    }

    /// Record the latest typed query.
    pub fn set_query(&self, query: impl Into<String>) {
        self.input.send_replace(query.into());
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.clone()
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn run(
    backend: Arc<dyn SemanticSearch>,
    notices: NoticeBus,
    mut input: watch::Receiver<String>,
    state: watch::Sender<SearchState>,
    quiet_period: Duration,
    limit: i64,
) {
    while input.changed().await.is_ok() {
        // Wait for a quiet period, restarting on every new keystroke.
        let query = loop {
            let query = input.borrow_and_update().clone();
            state.send_modify(|s| s.query = query.clone());

            if !is_searchable(&query) {
                state.send_modify(|s| {
                    s.results.clear();
                    s.is_searching = false;
                    s.error = None;
                });
                break None;
            }

            tokio::select! {
                _ = tokio::time::sleep(quiet_period) => break Some(query),
                changed = input.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        };
        let Some(query) = query else { continue };

        state.send_modify(|s| s.is_searching = true);
        debug!(subsystem = "client", component = "search", query = %query, "Sending search");

        let request = SearchRequest {
            query: query.clone(),
            limit,
        };
        match backend.search(request).await {
            Ok(results) => {
                if results.is_empty() {
                    notices.emit(Notice::no_search_results());
                }
                state.send_modify(|s| {
                    s.results = results;
                    s.is_searching = false;
                    s.error = None;
                });
            }
            Err(e) => {
                warn!(error = %e, query = %query, "Search failed");
                notices.emit(Notice::search_failed());
                state.send_modify(|s| {
                    s.results.clear();
                    s.is_searching = false;
                    s.error = Some(e.to_string());
                });
            }
        }
    }
}
