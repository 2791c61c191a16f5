//! Structured logging schema and field name constants for entigraph.
//!
//! This module is the schema of record for structured log fields, so log
//! aggregation tools can query by standardized names across every
//! subsystem. `tracing` field names must be literals at the call site, so
//! emitting code writes e.g. `subsystem = "db"` directly; the constants
//! here exist for log consumers (dashboards, alerts) and keep the
//! vocabulary in one reviewable place.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, explicit fallback applied |
//! | INFO  | Lifecycle events, operation completions |
//! | DEBUG | Decision points, intermediate values |
//! | TRACE | Per-item iteration (drafts, candidates) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "engine", "db", "semantic"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "matcher", "upsert", "merge", "pool", "pipeline"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "find_candidates", "extract_and_save", "merge"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// User scope being operated on.
pub const USER_ID: &str = "user_id";

/// Entity UUID being operated on.
pub const ENTITY_ID: &str = "entity_id";

/// Document UUID being operated on.
pub const DOCUMENT_ID: &str = "document_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of candidates returned by a match.
pub const CANDIDATE_COUNT: &str = "candidate_count";

/// Number of drafts extracted from a chunk.
pub const DRAFT_COUNT: &str = "draft_count";

/// Number of chunks processed for a document.
pub const CHUNK_COUNT: &str = "chunk_count";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
