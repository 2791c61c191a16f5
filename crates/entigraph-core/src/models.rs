//! Core data model for entigraph.
//!
//! An [`Entity`] is a named thing recognized within one user's corpus. It is
//! created on first unresolved mention, mutated on every later resolved
//! mention, and destroyed only by being absorbed into another entity via
//! merge. Entities are never visible across users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Embedding vector type (re-exported from pgvector).
pub use pgvector::Vector;

/// A persisted entity owned by a single user.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Free-text name; the de facto natural key within a user scope.
    pub name: String,
    /// Overwritten on every re-resolution.
    pub description: String,
    /// Free-text category ("person", "place", "concept", ...).
    pub entity_type: String,
    /// Canonical semantic vector. Written on insert, never by an update.
    pub embedding: Vector,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An unresolved entity candidate freshly produced by extraction.
///
/// Drafts have no identity; resolution decides whether one refers to an
/// existing [`Entity`] or becomes a new row.
#[derive(Debug, Clone)]
pub struct DraftEntity {
    pub name: String,
    pub description: String,
    pub entity_type: String,
    pub embedding: Vector,
}

/// An existing entity returned by candidate matching as a plausible
/// duplicate of a draft, with its semantic distance to the draft.
///
/// Candidates are ephemeral and never persisted. The embedding is not
/// carried; arbitration works on names and descriptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub entity_type: String,
    /// Cosine distance to the draft embedding, in [0, 2].
    pub distance: f64,
}

/// Outcome of arbitration for one draft.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The draft restates an existing entity. The carried description and
    /// type reconcile the draft with what is already stored and replace the
    /// entity's current values.
    Existing {
        entity_id: Uuid,
        description: String,
        entity_type: String,
    },
    /// The draft is genuinely new; persist it as-is.
    New,
}

/// A record that an entity was mentioned within a specific source document.
///
/// The pair (entity_id, document_id) is unique; repeat mentions refresh
/// `updated_at` instead of duplicating the row.
#[derive(Debug, Clone)]
pub struct EntityDocumentLink {
    pub user_id: Uuid,
    pub entity_id: Uuid,
    pub document_id: Uuid,
    pub updated_at: DateTime<Utc>,
}

/// Entity listing row with the number of distinct documents linking to it.
#[derive(Debug, Clone, Serialize)]
pub struct EntityWithDocumentCount {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: String,
    pub entity_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub document_count: i64,
}
