//! Centralized default constants for thoughtvault.
//!
//! Every crate and binary references these instead of defining its own
//! magic numbers. Organized by domain area.

// =============================================================================
// SEARCH
// =============================================================================

/// Default number of semantic search results.
pub const SEARCH_LIMIT: i64 = 10;

/// Upper bound accepted for the search `limit` parameter.
pub const SEARCH_LIMIT_MAX: i64 = 100;

/// Minimum cosine similarity a note needs to be returned by semantic search.
pub const MATCH_THRESHOLD: f64 = 0.5;

/// Queries with this many characters or fewer (after trimming) are not sent.
pub const SEARCH_MIN_QUERY_CHARS: usize = 2;

/// Quiet period before a typed search query is sent (milliseconds).
pub const SEARCH_DEBOUNCE_MS: u64 = 500;

// =============================================================================
// EMBEDDING
// =============================================================================

/// Default OpenAI-compatible embedding endpoint.
pub const EMBED_BASE_URL: &str = "https://api.openai.com/v1";

/// Default embedding model name.
pub const EMBED_MODEL: &str = "text-embedding-ada-002";

/// Default embedding vector dimension for text-embedding-ada-002.
pub const EMBED_DIMENSION: usize = 1536;

/// Timeout for embedding requests (seconds).
pub const EMBED_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// TAGS
// =============================================================================

/// Maximum tag name length in characters.
pub const TAG_NAME_MAX_LEN: usize = 100;

// =============================================================================
// AUTH
// =============================================================================

/// Minimum password length at registration.
pub const PASSWORD_MIN_LEN: usize = 8;

/// Access token lifetime (minutes).
pub const TOKEN_TTL_MINUTES: i64 = 1440;

/// Longest accepted access token lifetime (minutes), one year.
pub const TOKEN_TTL_MINUTES_MAX: i64 = 525_600;

/// Prefix of every issued access token.
pub const ACCESS_TOKEN_PREFIX: &str = "tv_at_";

/// Number of random characters after the access token prefix.
pub const ACCESS_TOKEN_SECRET_LEN: usize = 48;

// =============================================================================
// SERVER / CLIENT
// =============================================================================

/// Default API listen port.
pub const PORT: u16 = 8000;

/// Default API base URL used by the client.
pub const API_URL: &str = "http://localhost:8000";

/// Default maximum database connections.
pub const DB_MAX_CONNECTIONS: u32 = 10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_defaults_consistent() {
        assert!(SEARCH_LIMIT >= 1 && SEARCH_LIMIT <= SEARCH_LIMIT_MAX);
        assert!((0.0..=1.0).contains(&MATCH_THRESHOLD));
    }

    #[test]
    fn test_api_url_matches_port() {
        assert!(API_URL.ends_with(&PORT.to_string()));
    }
}
