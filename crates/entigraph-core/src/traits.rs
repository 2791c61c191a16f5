//! Core traits for entigraph abstractions.
//!
//! These traits define the seams between the resolution engine and its
//! collaborators: storage on one side, the external semantic services on the
//! other. Concrete implementations live in `entigraph-db` and
//! `entigraph-semantic`; tests substitute in-memory fakes.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Candidate, DraftEntity, Entity, EntityWithDocumentCount, Resolution, Vector};

// =============================================================================
// COLLABORATOR SERVICES (external, possibly slow, possibly failing)
// =============================================================================

/// Source of pre-chunked document text. Chunking itself is upstream.
#[async_trait]
pub trait ChunkSource: Send + Sync {
    /// Return the text chunks of a document, in document order.
    async fn chunks(&self, user_id: Uuid, document_id: Uuid) -> Result<Vec<String>>;
}

/// Extracts draft entities from a text chunk.
///
/// Backed by an external semantic service; callers must treat failure as a
/// normal outcome and apply their own timeout policy.
#[async_trait]
pub trait EntityExtractor: Send + Sync {
    async fn find_entities(&self, chunk: &str) -> Result<Vec<DraftEntity>>;
}

/// Decides whether a draft restates one of the given candidates.
///
/// The judgment is delegated to an external semantic service and must not be
/// assumed deterministic: identical inputs may arbitrate differently across
/// calls. Purely a decision function; no side effects.
#[async_trait]
pub trait ResolutionArbiter: Send + Sync {
    async fn resolve(&self, candidates: &[Candidate], draft: &DraftEntity) -> Result<Resolution>;
}

// =============================================================================
// REPOSITORIES
// =============================================================================

/// Repository for entity rows.
///
/// The upsert methods and [`merge`](EntityRepository::merge) are the only
/// writers of entity rows anywhere in the system.
#[async_trait]
pub trait EntityRepository: Send + Sync {
    /// Return up to the configured number of entities owned by `user_id`
    /// whose embedding lies strictly within the distance threshold of
    /// `embedding`, ordered by ascending distance.
    ///
    /// An empty list is a normal outcome, not an error.
    async fn find_candidates(&self, user_id: Uuid, embedding: &Vector) -> Result<Vec<Candidate>>;

    /// Atomically insert the draft or, if an entity with the same
    /// (user, name) already exists, update its description, type, and
    /// updated_at in place. Returns the entity id either way.
    ///
    /// Id and embedding of an existing row are preserved.
    async fn upsert_by_name(&self, user_id: Uuid, draft: &DraftEntity) -> Result<Uuid>;

    /// Update description, type, and updated_at of an entity the arbiter
    /// resolved to. Fails with `EntityNotOwned` if the id does not resolve
    /// within the user scope.
    async fn update_resolved(
        &self,
        user_id: Uuid,
        entity_id: Uuid,
        description: &str,
        entity_type: &str,
    ) -> Result<()>;

    /// Fetch one entity within the user scope.
    async fn fetch(&self, user_id: Uuid, entity_id: Uuid) -> Result<Entity>;

    /// List all entities for a user ordered by name, each with its distinct
    /// linked-document count.
    async fn list(&self, user_id: Uuid) -> Result<Vec<EntityWithDocumentCount>>;

    /// Entities mentioned in the given document.
    async fn for_document(&self, user_id: Uuid, document_id: Uuid) -> Result<Vec<Entity>>;

    /// Transactionally absorb `source_id` into `target_id`: migrate all
    /// document links (skipping duplicates), then delete the source entity.
    /// All-or-nothing; on any failure the source and its links are untouched.
    async fn merge(&self, user_id: Uuid, target_id: Uuid, source_id: Uuid) -> Result<()>;

    /// Number of entities owned by a user.
    async fn count_for_user(&self, user_id: Uuid) -> Result<i64>;
}

/// Repository for entity↔document links. The only writer of link rows
/// outside the merge transaction.
#[async_trait]
pub trait EntityLinkRepository: Send + Sync {
    /// Record that `entity_id` was mentioned in `document_id`. Idempotent:
    /// an existing pair gets its updated_at refreshed.
    async fn link(&self, user_id: Uuid, entity_id: Uuid, document_id: Uuid) -> Result<()>;

    /// Distinct documents linked to an entity.
    async fn documents_for_entity(&self, user_id: Uuid, entity_id: Uuid) -> Result<Vec<Uuid>>;
}
