//! Account and session endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use vault_core::{LoginRequest, RegisterRequest, TokenResponse, User};

use crate::auth::RequireAuth;
use crate::error::ApiError;
use crate::extract::{ApiForm, ApiJson};
use crate::state::AppState;

/// `POST /register`
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state.auth.register(body).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// `POST /token` (OAuth2 password form).
pub async fn login(
    State(state): State<AppState>,
    ApiForm(form): ApiForm<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state.auth.login(&form.username, &form.password).await?;
    Ok(Json(token.into()))
}

/// `POST /logout`
pub async fn logout(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<StatusCode, ApiError> {
    state.auth.logout(&auth.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /users/me`
pub async fn current_user(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.auth.current_user(auth.user_id).await?))
}
