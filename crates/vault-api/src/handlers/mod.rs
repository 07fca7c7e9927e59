//! HTTP handlers, grouped by resource.

pub mod auth;
pub mod notes;
pub mod search;
pub mod system;
