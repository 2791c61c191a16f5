//! Centralized default constants for entigraph.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// RESOLUTION
// =============================================================================

/// Maximum cosine distance (exclusive) for an existing entity to count as a
/// duplicate candidate. Scale is [0, 2] for normalized cosine distance.
///
/// Deliberately tight: false negatives are acceptable because the arbiter
/// mitigates false positives, not the threshold alone.
pub const SIMILARITY_THRESHOLD: f64 = 0.15;

/// Maximum number of candidates returned by a single match.
pub const CANDIDATE_LIMIT: i64 = 5;

// =============================================================================
// EMBEDDING
// =============================================================================

/// Embedding vector dimension (nomic-embed-text).
pub const EMBED_DIMENSION: usize = 768;

// =============================================================================
// DATABASE POOL
// =============================================================================

/// Default maximum number of pooled connections.
pub const DB_MAX_CONNECTIONS: u32 = 10;

/// Default connection acquire timeout (seconds).
pub const DB_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default idle connection timeout (seconds).
pub const DB_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default maximum connection lifetime (seconds).
pub const DB_MAX_LIFETIME_SECS: u64 = 1800;

// =============================================================================
// SEMANTIC SERVICE
// =============================================================================

/// Default base URL of the semantic service.
pub const SEMANTIC_BASE_URL: &str = "http://localhost:11434";

/// Default model slug used for extraction and arbitration requests.
pub const SEMANTIC_MODEL: &str = "qwen3:8b";

/// Default request timeout for semantic service calls (seconds).
pub const SEMANTIC_TIMEOUT_SECS: u64 = 120;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_within_cosine_distance_scale() {
        assert!(SIMILARITY_THRESHOLD > 0.0);
        assert!(SIMILARITY_THRESHOLD < 2.0);
    }

    #[test]
    fn test_candidate_limit() {
        assert_eq!(CANDIDATE_LIMIT, 5);
    }
}
