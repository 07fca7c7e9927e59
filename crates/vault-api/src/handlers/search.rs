//! Semantic search and raw embedding endpoints.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use vault_core::{SearchHit, SearchRequest};

use crate::auth::RequireAuth;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

/// `POST /search`
pub async fn search_notes(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiJson(body): ApiJson<SearchRequest>,
) -> Result<Json<Vec<SearchHit>>, ApiError> {
    Ok(Json(state.search.search(auth.user_id, body).await?))
}

#[derive(Debug, Deserialize)]
pub struct EmbedRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct EmbedResponse {
    pub embedding: Vec<f32>,
}

/// `POST /embeddings`
pub async fn embed_text(
    State(state): State<AppState>,
    _auth: RequireAuth,
    ApiJson(body): ApiJson<EmbedRequest>,
) -> Result<Json<EmbedResponse>, ApiError> {
    let vector = state.search.embed(&body.text).await?;
    Ok(Json(EmbedResponse {
        embedding: vector.to_vec(),
    }))
}
