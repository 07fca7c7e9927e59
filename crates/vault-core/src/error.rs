//! Error types for thoughtvault.

use thiserror::Error;

/// Shorthand used across the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure a thoughtvault crate can report.
///
/// The HTTP layer maps variants onto status codes; the client maps status
/// codes back onto variants.
#[derive(Error, Debug)]
pub enum Error {
    /// Rejected before touching storage or the network (400).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing, expired or revoked credential (401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// No note with this id belongs to the caller (404).
    #[error("Note not found: {0}")]
    NoteNotFound(uuid::Uuid),

    /// Duplicate email or username (409).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The embedding collaborator failed or returned garbage (502).
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Similarity search could not run, e.g. a dimension mismatch.
    #[error("Search error: {0}")]
    Search(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Bad or missing environment configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failure talking to another service.
    #[error("Request error: {0}")]
    Request(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors caused by a missing or rejected credential.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Unauthorized(_))
    }

    /// True for errors that mean the addressed resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::NoteNotFound(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("test resource".to_string());
        assert_eq!(err.to_string(), "Not found: test resource");
    }

    #[test]
    fn test_error_display_note_not_found() {
        let id = Uuid::nil();
        let err = Error::NoteNotFound(id);
        assert_eq!(err.to_string(), format!("Note not found: {}", id));
    }

    #[test]
    fn test_error_display_embedding() {
        let err = Error::Embedding("failed to generate".to_string());
        assert_eq!(err.to_string(), "Embedding error: failed to generate");
    }

    #[test]
    fn test_error_display_conflict() {
        let err = Error::Conflict("email already registered".to_string());
        assert_eq!(err.to_string(), "Conflict: email already registered");
    }

    #[test]
    fn test_error_display_unauthorized() {
        let err = Error::Unauthorized("invalid token".to_string());
        assert_eq!(err.to_string(), "Unauthorized: invalid token");
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("title is required".to_string());
        assert_eq!(err.to_string(), "Invalid input: title is required");
    }

    #[test]
    fn test_error_display_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.to_string().contains("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_classification_helpers() {
        assert!(Error::Unauthorized("x".into()).is_unauthorized());
        assert!(!Error::Internal("x".into()).is_unauthorized());
        assert!(Error::NoteNotFound(Uuid::nil()).is_not_found());
        assert!(Error::NotFound("tag".into()).is_not_found());
        assert!(!Error::Conflict("x".into()).is_not_found());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
