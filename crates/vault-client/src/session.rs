//! Authentication session state machine.
//!
//! ```text
//! SignedOut ──login──▶ Authenticating ──ok──▶ SignedIn
//!     ▲                      │                   │
//!     └──────── error ───────┘                   │
//!     └──────────── logout / any 401 ────────────┘
//! ```
//!
//! A token restored from the [`TokenStore`](crate::TokenStore) puts the
//! session straight into `SignedIn` with an unknown user until
//! [`AuthSession::refresh_user`] runs. Registration never signs in.

use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use vault_core::{RegisterRequest, Result, TokenResponse, User};

use crate::api::ApiClient;
use crate::notice::Notice;

/// Observable authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    SignedOut,
    /// A credential exchange is in flight.
    Authenticating,
    SignedIn {
        token: String,
        /// `None` until the account has been fetched.
        user: Option<User>,
    },
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::SignedIn { .. })
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            AuthState::SignedIn { token, .. } => Some(token),
            _ => None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            AuthState::SignedIn { user, .. } => user.as_ref(),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct PasswordForm<'a> {
    username: &'a str,
    password: &'a str,
}

/// Login, logout and registration on top of an [`ApiClient`].
#[derive(Clone)]
pub struct AuthSession {
    api: ApiClient,
}

impl AuthSession {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn state(&self) -> AuthState {
        self.api.auth_state()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.api.subscribe()
    }

    /// Sign in with a persisted token, if there is one.
    ///
    /// Returns whether a token was found. The token is not checked against
    /// the service; the first rejected request signs the session out.
    pub async fn restore(&self) -> Result<bool> {
        match self.api.token_store().load().await? {
            Some(token) => {
                self.api.set_state(AuthState::SignedIn { token, user: None });
                info!(subsystem = "client", component = "auth_session", "Session restored");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Exchange username (or email) and password for a token.
    ///
    /// Any previous session is revoked and forgotten first, so a failed
    /// login never leaves an old token behind for [`restore`](Self::restore).
    #[instrument(skip(self, password), fields(subsystem = "client", component = "auth_session", op = "login"))]
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        if self.api.token().is_some() {
            if let Err(e) = self.api.post_empty("/logout").await {
                warn!(error = %e, "Could not revoke previous session");
            }
        }
        self.api.set_state(AuthState::Authenticating);
        if let Err(e) = self.api.token_store().clear().await {
            warn!(error = %e, "Failed to clear stored token");
        }

        let result: Result<TokenResponse> = self
            .api
            .post_form("/token", &PasswordForm { username, password })
            .await;
        let token = match result {
            Ok(response) => response.access_token,
            Err(e) => {
                warn!(error = %e, "Login failed");
                self.api.set_state(AuthState::SignedOut);
                self.api.notices().emit(Notice::login_failed());
                return Err(e);
            }
        };

        if let Err(e) = self.api.token_store().save(&token).await {
            warn!(error = %e, "Failed to persist token");
        }
        self.api.set_state(AuthState::SignedIn { token, user: None });
        self.api.notices().emit(Notice::login_succeeded());
        info!("Signed in");

        if let Err(e) = self.refresh_user().await {
            warn!(error = %e, "Could not load account after login");
        }
        Ok(())
    }

    /// Revoke the token on the service, then forget it locally.
    ///
    /// Always ends signed out, even when the service is unreachable.
    #[instrument(skip(self), fields(subsystem = "client", component = "auth_session", op = "logout"))]
    pub async fn logout(&self) -> Result<()> {
        if self.api.token().is_some() {
            if let Err(e) = self.api.post_empty("/logout").await {
                warn!(error = %e, "Server-side logout failed");
            }
        }
        self.api.set_state(AuthState::SignedOut);
        self.api.token_store().clear().await?;
        self.api.notices().emit(Notice::logged_out());
        info!("Signed out");
        Ok(())
    }

    /// Create an account. Does not sign in.
    #[instrument(skip(self, req), fields(subsystem = "client", component = "auth_session", op = "register"))]
    pub async fn register(&self, req: RegisterRequest) -> Result<User> {
        req.validate()?;
        match self.api.post_anonymous::<_, User>("/register", &req).await {
            Ok(user) => {
                self.api.notices().emit(Notice::registered());
                Ok(user)
            }
            Err(e) => {
                self.api.notices().emit(Notice::registration_failed());
                Err(e)
            }
        }
    }

    /// Fetch the signed-in account and publish it in the state.
    pub async fn refresh_user(&self) -> Result<User> {
        let token = self.api.token();
        let user: User = self.api.get("/users/me").await?;

        let fetched = user.clone();
        self.api.update_state(move |state| match state {
            AuthState::SignedIn {
                token: current,
                user,
            } if Some(current.as_str()) == token.as_deref() => {
                *user = Some(fetched);
                true
            }
            _ => false,
        });
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_auth_state_accessors() {
        assert!(!AuthState::SignedOut.is_authenticated());
        assert!(AuthState::Authenticating.token().is_none());

        let user = User {
            id: Uuid::nil(),
            email: "a@b.c".to_string(),
            username: "a".to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        let state = AuthState::SignedIn {
            token: "tv_at_x".to_string(),
            user: Some(user.clone()),
        };
        assert!(state.is_authenticated());
        assert_eq!(state.token(), Some("tv_at_x"));
        assert_eq!(state.user(), Some(&user));
    }
}
