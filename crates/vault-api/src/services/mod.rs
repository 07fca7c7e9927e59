//! Service layer for business logic.

pub mod auth_service;
pub mod note_service;
pub mod search_service;
pub mod tag_resolver;

pub use auth_service::{AuthService, PasswordParams};
pub use note_service::NoteService;
pub use search_service::SearchService;
pub use tag_resolver::TagResolver;
