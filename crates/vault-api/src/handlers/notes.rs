//! Note and tag endpoints. Every route is scoped to the caller.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use vault_core::{CreateNoteRequest, Note, Tag, UpdateNoteRequest};

use crate::auth::RequireAuth;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

/// `POST /notes`
pub async fn create_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiJson(body): ApiJson<CreateNoteRequest>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let note = state.notes.create(auth.user_id, body).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// `GET /notes`
pub async fn list_notes(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<Vec<Note>>, ApiError> {
    Ok(Json(state.notes.list(auth.user_id).await?))
}

/// `GET /notes/:id`
pub async fn get_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Note>, ApiError> {
    Ok(Json(state.notes.get(auth.user_id, id).await?))
}

/// `PUT /notes/:id`
pub async fn update_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateNoteRequest>,
) -> Result<Json<Note>, ApiError> {
    Ok(Json(state.notes.update(auth.user_id, id, body).await?))
}

/// `DELETE /notes/:id`
pub async fn delete_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.notes.delete(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /tags`
pub async fn list_tags(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(state.tags.list_for_owner(auth.user_id).await?))
}
