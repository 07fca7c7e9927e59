//! User-facing notifications emitted by the client façades.
//!
//! A view layer subscribes to the [`NoticeBus`] and renders each
//! [`Notice`] as a toast.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use vault_core::Note;

const NOTICE_CAPACITY: usize = 32;

/// A short message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
    /// Rendered as an error.
    pub destructive: bool,
}

impl Notice {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            destructive: false,
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            destructive: true,
        }
    }

    pub fn note_created(note: &Note) -> Self {
        let description = if note.has_embedding() {
            "Your note has been created and stored as a vector embedding."
        } else {
            "Your note has been created (without vector embedding)."
        };
        Self::info("Note created", description)
    }

    pub fn note_create_failed() -> Self {
        Self::error(
            "Failed to create note",
            "There was an error creating your note. Please try again.",
        )
    }

    pub fn note_updated() -> Self {
        Self::info("Note updated", "Your changes have been saved.")
    }

    pub fn note_update_failed() -> Self {
        Self::error(
            "Failed to update note",
            "There was an error saving your changes. Please try again.",
        )
    }

    pub fn note_deleted() -> Self {
        Self::info("Note deleted", "The note has been removed.")
    }

    pub fn note_delete_failed() -> Self {
        Self::error(
            "Failed to delete note",
            "There was an error deleting your note. Please try again.",
        )
    }

    pub fn login_succeeded() -> Self {
        Self::info("Login successful", "You are now logged in.")
    }

    pub fn login_failed() -> Self {
        Self::error(
            "Login failed",
            "Please check your credentials and try again.",
        )
    }

    pub fn registered() -> Self {
        Self::info(
            "Registration successful",
            "Please log in with your new credentials.",
        )
    }

    pub fn registration_failed() -> Self {
        Self::error(
            "Registration failed",
            "This email might already be in use or there was a connection problem.",
        )
    }

    pub fn logged_out() -> Self {
        Self::info("Logged out", "You have been logged out successfully.")
    }

    pub fn session_expired() -> Self {
        Self::error("Session expired", "Please log in again.")
    }

    pub fn no_search_results() -> Self {
        Self::info(
            "No results found",
            "Try a different search query or create new notes.",
        )
    }

    pub fn search_failed() -> Self {
        Self::error(
            "Search failed",
            "There was an error performing your search. Please try again.",
        )
    }
}

/// Fan-out channel for notices. Emitting with no subscribers is a no-op.
#[derive(Debug, Clone)]
pub struct NoticeBus {
    tx: broadcast::Sender<Notice>,
}

impl NoticeBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTICE_CAPACITY);
        Self { tx }
    }

    pub fn emit(&self, notice: Notice) {
        let _ = self.tx.send(notice);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }
}

impl Default for NoticeBus {
    fn default() -> Self {
        Self::new()
    }
}
