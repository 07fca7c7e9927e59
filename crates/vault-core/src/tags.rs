//! Tag name validation and normalization.
//!
//! Tag names are free-form labels shared by every user. They are compared
//! exactly (case-sensitive) after trimming surrounding whitespace.

use std::collections::HashSet;

use crate::defaults::TAG_NAME_MAX_LEN;
use crate::error::{Error, Result};

/// Validate a single, already trimmed tag name.
///
/// Rules:
/// - Length between 1 and 100 characters
/// - No control characters (newlines, tabs, NUL, ...)
pub fn validate_tag_name(tag: &str) -> std::result::Result<(), String> {
    if tag.is_empty() {
        return Err("Tag name cannot be empty".to_string());
    }
    if tag.chars().count() > TAG_NAME_MAX_LEN {
        return Err(format!(
            "Tag name must be {} characters or less",
            TAG_NAME_MAX_LEN
        ));
    }
    if tag.chars().any(char::is_control) {
        return Err(format!("Tag '{}' contains control characters", tag.escape_debug()));
    }
    Ok(())
}

/// Trim, drop empty entries, validate and de-duplicate tag names.
///
/// The first occurrence of each name wins, so the output keeps input order.
pub fn normalize_tag_names<S: AsRef<str>>(names: &[S]) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(names.len());

    for raw in names {
        let name = raw.as_ref().trim();
        if name.is_empty() {
            continue;
        }
        validate_tag_name(name).map_err(Error::InvalidInput)?;
        if seen.insert(name.to_string()) {
            out.push(name.to_string());
        }
    }

    Ok(out)
}
