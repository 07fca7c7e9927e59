//! Core data models for thoughtvault.
//!
//! These types are shared by the server, the storage layer and the client,
//! and double as the JSON wire shapes of the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults;
use crate::error::{Error, Result};
use crate::tags::normalize_tag_names;

/// Embedding vector type (re-exported from pgvector).
pub use pgvector::Vector;

// =============================================================================
// NOTE TYPES
// =============================================================================

/// Kind of content a note carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    /// Free text
    #[default]
    Note,
    /// Content is an http(s) URL
    Link,
    /// Content references an image (URL or data URI)
    Image,
}

impl NoteType {
    /// All variants, in display order.
    pub const ALL: [NoteType; 3] = [NoteType::Note, NoteType::Link, NoteType::Image];

    /// Storage/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteType::Note => "note",
            NoteType::Link => "link",
            NoteType::Image => "image",
        }
    }

    /// Check content against the rules of this note type.
    pub fn validate_content(&self, content: &str) -> Result<()> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::InvalidInput("Content is required".to_string()));
        }
        match self {
            NoteType::Note | NoteType::Image => Ok(()),
            NoteType::Link => match url::Url::parse(content) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
                _ => Err(Error::InvalidInput(format!(
                    "Link notes must contain an http(s) URL, got: {}",
                    content
                ))),
            },
        }
    }
}

impl std::fmt::Display for NoteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NoteType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "note" => Ok(NoteType::Note),
            "link" => Ok(NoteType::Link),
            "image" => Ok(NoteType::Image),
            _ => Err(format!("Invalid note type: {}", s)),
        }
    }
}

/// A shared label. Names are unique across the whole system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

/// A note as returned by every read path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub note_type: NoteType,
    pub tags: Vec<Tag>,
    /// Creation timestamp
    #[serde(rename = "date")]
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Id of the stored embedding, if the note opted into vector storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_id: Option<Uuid>,
}

impl Note {
    /// Tag names in stored order.
    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.name.clone()).collect()
    }

    /// Whether an embedding is stored for this note.
    pub fn has_embedding(&self) -> bool {
        self.vector_id.is_some()
    }
}

/// Stored embedding for a note. At most one per note.
#[derive(Debug, Clone)]
pub struct NoteEmbedding {
    pub id: Uuid,
    pub note_id: Uuid,
    pub vector: Vector,
    pub model: String,
    pub created_at: DateTime<Utc>,
}

/// A semantic search result: the note plus its cosine similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub note: Note,
    pub similarity: f64,
}

/// Raw row returned by the similarity-search function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteMatch {
    pub note_id: Uuid,
    pub similarity: f64,
}

// =============================================================================
// NOTE REQUESTS (wire)
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_search_limit() -> i64 {
    defaults::SEARCH_LIMIT
}

/// Body of `POST /notes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
    pub title: String,
    pub content: String,
    #[serde(rename = "type", default)]
    pub note_type: NoteType,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Compute and store an embedding for the note.
    #[serde(default = "default_true")]
    pub store_vector: bool,
}

impl CreateNoteRequest {
    /// Validate the draft and return its normalized tag names.
    ///
    /// Runs before any network or storage call.
    pub fn validate(&self) -> Result<Vec<String>> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidInput("Title is required".to_string()));
        }
        self.note_type.validate_content(&self.content)?;
        normalize_tag_names(&self.tags)
    }
}

/// Body of `PUT /notes/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoteRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub note_type: Option<NoteType>,
    /// Replaces the whole tag set when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// `true` ensures an embedding, `false` drops it, absent keeps the current state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_vector: Option<bool>,
}

impl UpdateNoteRequest {
    /// Validate the partial fields and return normalized tag names if tags were given.
    pub fn validate(&self) -> Result<Option<Vec<String>>> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(Error::InvalidInput("Title cannot be empty".to_string()));
            }
        }
        if let Some(content) = &self.content {
            if content.trim().is_empty() {
                return Err(Error::InvalidInput("Content cannot be empty".to_string()));
            }
        }
        self.tags.as_deref().map(normalize_tag_names).transpose()
    }

    /// Whether the update touches any field that feeds the embedding text.
    pub fn affects_embedding(&self) -> bool {
        self.title.is_some() || self.content.is_some() || self.tags.is_some()
    }

    /// True when nothing would change.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.note_type.is_none()
            && self.tags.is_none()
            && self.store_vector.is_none()
    }
}

/// Body of `POST /search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

impl SearchRequest {
    /// Build a request with the default limit.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: defaults::SEARCH_LIMIT,
        }
    }

    /// Validate query text and limit bounds.
    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(Error::InvalidInput("Search query is required".to_string()));
        }
        if !(1..=defaults::SEARCH_LIMIT_MAX).contains(&self.limit) {
            return Err(Error::InvalidInput(format!(
                "limit must be between 1 and {}",
                defaults::SEARCH_LIMIT_MAX
            )));
        }
        Ok(())
    }
}

// =============================================================================
// USERS & AUTH
// =============================================================================

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A user together with the stored password hash. Never serialized.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Body of `POST /register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

impl RegisterRequest {
    /// Validate the registration fields.
    pub fn validate(&self) -> Result<()> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(Error::InvalidInput("A valid email is required".to_string()));
        }
        if self.username.trim().is_empty() {
            return Err(Error::InvalidInput("Username is required".to_string()));
        }
        if self.password.chars().count() < defaults::PASSWORD_MIN_LEN {
            return Err(Error::InvalidInput(format!(
                "Password must be at least {} characters",
                defaults::PASSWORD_MIN_LEN
            )));
        }
        Ok(())
    }
}

/// OAuth2 password-grant form of `POST /token`.
///
/// `username` accepts either the account's username or its email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response of `POST /token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// A freshly issued access token. The plaintext is only available here.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl From<IssuedToken> for TokenResponse {
    fn from(token: IssuedToken) -> Self {
        Self {
            access_token: token.access_token,
            token_type: "bearer".to_string(),
        }
    }
}
