//! Typed HTTP client for the thoughtvault API.
//!
//! The client owns the observable authentication state. Every request reads
//! the current token from it, and any `401` on an authenticated request
//! signs the session out and forgets the stored token.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use vault_core::{Error, Result};

use crate::config::ClientConfig;
use crate::notice::{Notice, NoticeBus};
use crate::session::AuthState;
use crate::token_store::TokenStore;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Shared HTTP client with bearer-token handling.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    state: Arc<watch::Sender<AuthState>>,
    tokens: Arc<dyn TokenStore>,
    notices: NoticeBus,
}

impl ApiClient {
    /// Create a signed-out client.
    pub fn new(config: &ClientConfig, tokens: Arc<dyn TokenStore>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;
        let (state, _) = watch::channel(AuthState::SignedOut);

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            state: Arc::new(state),
            tokens,
            notices: NoticeBus::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Watch the authentication state.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Snapshot of the authentication state.
    pub fn auth_state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Current bearer token, if signed in.
    pub fn token(&self) -> Option<String> {
        self.state.borrow().token().map(str::to_string)
    }

    pub fn notices(&self) -> &NoticeBus {
        &self.notices
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    pub(crate) fn set_state(&self, state: AuthState) {
        self.state.send_replace(state);
    }

    /// Apply `f` to the state; observers are notified when it returns true.
    pub(crate) fn update_state(&self, f: impl FnOnce(&mut AuthState) -> bool) {
        self.state.send_if_modified(f);
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET` with bearer auth.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.execute(self.http.get(self.url(path)), true).await?;
        decode(response).await
    }

    /// `POST` a JSON body with bearer auth.
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .execute(self.http.post(self.url(path)).json(body), true)
            .await?;
        decode(response).await
    }

    /// `POST` a JSON body without credentials.
    pub async fn post_anonymous<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .execute(self.http.post(self.url(path)).json(body), false)
            .await?;
        decode(response).await
    }

    /// `POST` a form without credentials.
    pub async fn post_form<F: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        form: &F,
    ) -> Result<T> {
        let response = self
            .execute(self.http.post(self.url(path)).form(form), false)
            .await?;
        decode(response).await
    }

    /// `POST` without a body, ignoring the response body.
    pub async fn post_empty(&self, path: &str) -> Result<()> {
        self.execute(self.http.post(self.url(path)), true).await?;
        Ok(())
    }

    /// `PUT` a JSON body with bearer auth.
    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .execute(self.http.put(self.url(path)).json(body), true)
            .await?;
        decode(response).await
    }

    /// `DELETE` with bearer auth.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute(self.http.delete(self.url(path)), true).await?;
        Ok(())
    }

    async fn execute(&self, request: RequestBuilder, authenticated: bool) -> Result<Response> {
        let (request, token) = if authenticated {
            let token = self
                .token()
                .ok_or_else(|| Error::Unauthorized("Not signed in".to_string()))?;
            (request.bearer_auth(&token), Some(token))
        } else {
            (request, None)
        };

        let response = request
            .send()
            .await
            .map_err(|e| Error::Request(format!("Request failed: {}", e)))?;

        let status = response.status();
        debug!(subsystem = "client", status = status.as_u16(), "API response");
        if status.is_success() {
            return Ok(response);
        }

        let message = error_message(response).await;
        if status == StatusCode::UNAUTHORIZED {
            if let Some(token) = token {
                self.expire(&token).await;
            }
        }
        Err(classify(status, message))
    }

    /// Sign out after the service rejected `token`.
    async fn expire(&self, token: &str) {
        let expired = self.state.send_if_modified(|state| {
            if state.token() == Some(token) {
                *state = AuthState::SignedOut;
                true
            } else {
                false
            }
        });
        if !expired {
            return;
        }

        warn!(
            subsystem = "client",
            component = "api",
            "Session rejected by server, signing out"
        );
        if let Err(e) = self.tokens.clear().await {
            warn!(error = %e, "Failed to clear stored token");
        }
        self.notices.emit(Notice::session_expired());
    }
}

async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => parsed.error,
        Err(_) if body.is_empty() => status.to_string(),
        Err(_) => body,
    }
}

fn classify(status: StatusCode, message: String) -> Error {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Error::InvalidInput(message),
        StatusCode::UNAUTHORIZED => Error::Unauthorized(message),
        StatusCode::NOT_FOUND => Error::NotFound(message),
        StatusCode::CONFLICT => Error::Conflict(message),
        StatusCode::BAD_GATEWAY => Error::Embedding(message),
        _ => Error::Request(format!("{}: {}", status, message)),
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    response
        .json()
        .await
        .map_err(|e| Error::Serialization(format!("Failed to parse response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify(StatusCode::BAD_REQUEST, "x".into()),
            Error::InvalidInput(_)
        ));
        assert!(classify(StatusCode::UNAUTHORIZED, "x".into()).is_unauthorized());
        assert!(classify(StatusCode::NOT_FOUND, "x".into()).is_not_found());
        assert!(matches!(
            classify(StatusCode::CONFLICT, "x".into()),
            Error::Conflict(_)
        ));
        assert!(matches!(
            classify(StatusCode::BAD_GATEWAY, "x".into()),
            Error::Embedding(_)
        ));
        assert!(matches!(
            classify(StatusCode::INTERNAL_SERVER_ERROR, "boom".into()),
            Error::Request(ref m) if m.contains("boom")
        ));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new(
            &ClientConfig::new("http://localhost:8000/"),
            Arc::new(crate::token_store::MemoryTokenStore::new()),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/notes"), "http://localhost:8000/notes");
        assert_eq!(client.auth_state(), AuthState::SignedOut);
    }
}
