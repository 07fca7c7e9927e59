//! Account registration, password login and bearer-token sessions.
//!
//! Passwords are stored as Argon2id PHC strings. Access tokens are random
//! `tv_at_`-prefixed strings; only their SHA-256 hex digest is persisted.

use std::sync::Arc;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use chrono::{Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use vault_core::{
    defaults, Error, IssuedToken, NewUser, RegisterRequest, Result, SessionRepository, User,
    UserRepository,
};

const INVALID_CREDENTIALS: &str = "Incorrect username or password";
const INVALID_TOKEN: &str = "Could not validate credentials";

/// Generate a new plaintext access token.
pub fn generate_access_token() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    let secret: String = (0..defaults::ACCESS_TOKEN_SECRET_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect();
    format!("{}{}", defaults::ACCESS_TOKEN_PREFIX, secret)
}

/// SHA-256 hex digest under which a token is stored.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Argon2id cost parameters for password hashing.
#[derive(Debug, Clone, Copy)]
pub struct PasswordParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordParams {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl PasswordParams {
    fn hasher(&self) -> Result<Argon2<'static>> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| Error::Config(format!("Invalid Argon2 parameters: {}", e)))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Hash a password into a PHC string.
pub fn hash_password(password: &str, params: PasswordParams) -> Result<String> {
    let salt_bytes: [u8; 16] = rand::thread_rng().gen();
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| Error::Internal(format!("Salt encoding failed: {}", e)))?;
    let hash = params
        .hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::Internal(format!("Password hashing failed: {}", e)))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC string.
///
/// Cost parameters are read from the stored hash.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Registration, login and session management.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
    token_ttl: Duration,
    password_params: PasswordParams,
}

impl AuthService {
    /// `token_ttl_minutes` is clamped to `1..=TOKEN_TTL_MINUTES_MAX`.
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
        token_ttl_minutes: i64,
    ) -> Self {
        Self {
            users,
            sessions,
            token_ttl: Duration::minutes(
                token_ttl_minutes.clamp(1, defaults::TOKEN_TTL_MINUTES_MAX),
            ),
            password_params: PasswordParams::default(),
        }
    }

    /// Override the Argon2 cost parameters.
    pub fn with_password_params(mut self, params: PasswordParams) -> Self {
        self.password_params = params;
        self
    }

    /// Create an account. Email is stored trimmed and lowercased.
    #[instrument(skip(self, req), fields(subsystem = "api", component = "auth_service", op = "register"))]
    pub async fn register(&self, req: RegisterRequest) -> Result<User> {
        req.validate()?;

        let params = self.password_params;
        let password = req.password;
        let password_hash =
            tokio::task::spawn_blocking(move || hash_password(&password, params))
                .await
                .map_err(|e| Error::Internal(format!("Password hashing task failed: {}", e)))??;

        let user = self
            .users
            .create(NewUser {
                email: req.email.trim().to_lowercase(),
                username: req.username.trim().to_string(),
                password_hash,
            })
            .await?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Exchange a username (or email) and password for a fresh access token.
    #[instrument(skip(self, password), fields(subsystem = "api", component = "auth_service", op = "login"))]
    pub async fn login(&self, login: &str, password: &str) -> Result<IssuedToken> {
        let credentials = self
            .users
            .find_credentials(login.trim())
            .await?
            .ok_or_else(|| Error::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        let stored = credentials.password_hash;
        let candidate = password.to_string();
        let valid = tokio::task::spawn_blocking(move || verify_password(&candidate, &stored))
            .await
            .map_err(|e| Error::Internal(format!("Password check task failed: {}", e)))?;
        if !valid {
            warn!(user_id = %credentials.user.id, "Password mismatch");
            return Err(Error::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
        if !credentials.user.is_active {
            return Err(Error::Unauthorized("Inactive user".to_string()));
        }

        let access_token = generate_access_token();
        let expires_at = Utc::now() + self.token_ttl;
        self.sessions
            .create(credentials.user.id, &hash_token(&access_token), expires_at)
            .await?;

        info!(user_id = %credentials.user.id, %expires_at, "Access token issued");
        Ok(IssuedToken {
            access_token,
            expires_at,
        })
    }

    /// Resolve a bearer token to the id of its user.
    pub async fn authenticate(&self, token: &str) -> Result<Uuid> {
        if !token.starts_with(defaults::ACCESS_TOKEN_PREFIX) {
            return Err(Error::Unauthorized(INVALID_TOKEN.to_string()));
        }
        match self.sessions.validate(&hash_token(token)).await? {
            Some(user_id) => {
                debug!(%user_id, "Token validated");
                Ok(user_id)
            }
            None => Err(Error::Unauthorized(INVALID_TOKEN.to_string())),
        }
    }

    /// Revoke the session behind `token`.
    pub async fn logout(&self, token: &str) -> Result<()> {
        self.sessions.revoke(&hash_token(token)).await?;
        info!("Session revoked");
        Ok(())
    }

    /// The authenticated user's account.
    pub async fn current_user(&self, user_id: Uuid) -> Result<User> {
        self.users
            .get(user_id)
            .await?
            .ok_or_else(|| Error::Unauthorized(INVALID_TOKEN.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vault_db::MemoryStore;

    fn cheap_params() -> PasswordParams {
        PasswordParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }

    fn service() -> AuthService {
        let store = Arc::new(MemoryStore::new());
        AuthService::new(store.clone(), store, 60).with_password_params(cheap_params())
    }

    fn registration(email: &str, username: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            username: username.to_string(),
            password: "correct horse battery".to_string(),
        }
    }

    #[test]
    fn test_access_token_shape() {
        let token = generate_access_token();
        assert!(token.starts_with("tv_at_"));
        assert_eq!(token.len(), 6 + 48);
        assert!(token[6..].chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, generate_access_token());
    }

    #[test]
    fn test_hash_token_is_sha256_hex() {
        let hash = hash_token("tv_at_abc");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_token("tv_at_abc"));
        assert_ne!(hash, hash_token("tv_at_abd"));
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("hunter22", cheap_params()).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
        assert!(!verify_password("hunter22", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn test_register_lowercases_email() {
        let auth = service();
        let user = auth
            .register(registration("  Ada@Example.COM ", "ada"))
            .await
            .unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert!(user.is_active);
    }

    #[tokio::test]
    async fn test_login_by_username_or_email() {
        let auth = service();
        let user = auth
            .register(registration("ada@example.com", "ada"))
            .await
            .unwrap();

        let by_name = auth.login("ada", "correct horse battery").await.unwrap();
        assert_eq!(auth.authenticate(&by_name.access_token).await.unwrap(), user.id);

        let by_email = auth
            .login("ada@example.com", "correct horse battery")
            .await
            .unwrap();
        assert_ne!(by_name.access_token, by_email.access_token);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_password_and_unknown_user() {
        let auth = service();
        auth.register(registration("ada@example.com", "ada"))
            .await
            .unwrap();

        let err = auth.login("ada", "wrong password").await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized(ref m) if m == INVALID_CREDENTIALS));

        let err = auth.login("grace", "whatever1").await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_logout_invalidates_token() {
        let auth = service();
        auth.register(registration("ada@example.com", "ada"))
            .await
            .unwrap();
        let token = auth.login("ada", "correct horse battery").await.unwrap();

        auth.logout(&token.access_token).await.unwrap();
        let err = auth.authenticate(&token.access_token).await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_oversized_token_ttl_is_clamped() {
        let store = Arc::new(MemoryStore::new());
        let auth = AuthService::new(store.clone(), store, i64::MAX)
            .with_password_params(cheap_params());
        auth.register(registration("ada@example.com", "ada"))
            .await
            .unwrap();

        let token = auth.login("ada", "correct horse battery").await.unwrap();
        let max_expiry =
            Utc::now() + Duration::minutes(defaults::TOKEN_TTL_MINUTES_MAX) + Duration::minutes(1);
        assert!(token.expires_at <= max_expiry);
        assert!(auth.authenticate(&token.access_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_authenticate_rejects_foreign_tokens() {
        let auth = service();
        assert!(auth.authenticate("not-a-token").await.is_err());
        assert!(auth.authenticate("tv_at_unknown").await.is_err());
    }
}
