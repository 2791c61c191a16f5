//! Per-draft resolution pipeline: matcher → arbiter → upsert → link.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, instrument, warn};
use uuid::Uuid;

use entigraph_core::{
    DraftEntity, EntityLinkRepository, EntityRepository, Error, Resolution, ResolutionArbiter,
    Result,
};

/// What to do when the external arbiter fails.
///
/// The arbiter is non-deterministic and may error or time out; the policy
/// makes the engine's reaction explicit instead of silently continuing on
/// whatever half-result came back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArbitrationPolicy {
    /// Persist the draft as a new entity and log the failure at WARN.
    ///
    /// The default: a lost arbitration degrades to a possible duplicate,
    /// which a later merge can repair, whereas aborting loses the extracted
    /// entity entirely.
    #[default]
    TreatAsNew,
    /// Abort resolution of the current draft with `Error::Arbitration`.
    Propagate,
}

/// Tunables for the resolution pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolutionConfig {
    pub arbitration_policy: ArbitrationPolicy,
}

/// Drives one chunk's drafts through resolution and persistence.
///
/// Failure handling follows the partial-progress policy: a retrieval
/// failure (storage unavailable) aborts the chunk; a persistence failure
/// for one draft is logged and the remaining drafts still run; an
/// arbitration failure follows the configured [`ArbitrationPolicy`].
pub struct ResolutionPipeline {
    entities: Arc<dyn EntityRepository>,
    links: Arc<dyn EntityLinkRepository>,
    arbiter: Arc<dyn ResolutionArbiter>,
    config: ResolutionConfig,
}

impl ResolutionPipeline {
    pub fn new(
        entities: Arc<dyn EntityRepository>,
        links: Arc<dyn EntityLinkRepository>,
        arbiter: Arc<dyn ResolutionArbiter>,
    ) -> Self {
        Self {
            entities,
            links,
            arbiter,
            config: ResolutionConfig::default(),
        }
    }

    /// Override the pipeline configuration.
    pub fn with_config(mut self, config: ResolutionConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolve and persist every draft extracted from one chunk of
    /// `document_id`, linking each persisted entity to the document.
    #[instrument(skip(self, drafts), fields(subsystem = "engine", component = "pipeline", op = "upsert", user_id = %user_id, document_id = %document_id, draft_count = drafts.len()))]
    pub async fn upsert(
        &self,
        user_id: Uuid,
        document_id: Uuid,
        drafts: Vec<DraftEntity>,
    ) -> Result<()> {
        let start = Instant::now();
        let mut persisted = 0usize;

        for draft in drafts {
            let entity_id = match self.resolve_one(user_id, &draft).await {
                Ok(id) => id,
                Err(e @ Error::Retrieval(_)) => return Err(e),
                Err(e @ Error::Arbitration(_)) => return Err(e),
                Err(e) => {
                    // Partial progress: one draft's write failure must not
                    // sink its siblings.
                    warn!(
                        draft_name = %draft.name,
                        error = %e,
                        "Skipping draft after persistence failure"
                    );
                    continue;
                }
            };

            if let Err(e) = self.links.link(user_id, entity_id, document_id).await {
                warn!(
                    entity_id = %entity_id,
                    document_id = %document_id,
                    error = %e,
                    "Failed to link entity to document"
                );
                continue;
            }
            persisted += 1;
        }

        debug!(
            persisted,
            duration_ms = start.elapsed().as_millis() as u64,
            "Chunk resolution complete"
        );
        Ok(())
    }

    /// Resolve a single draft to an entity id, creating or updating a row.
    async fn resolve_one(&self, user_id: Uuid, draft: &DraftEntity) -> Result<Uuid> {
        let candidates = self
            .entities
            .find_candidates(user_id, &draft.embedding)
            .await?;

        let resolution = if candidates.is_empty() {
            // No plausible duplicate; nothing to arbitrate.
            Resolution::New
        } else {
            match self.arbiter.resolve(&candidates, draft).await {
                Ok(resolution) => resolution,
                Err(e) => match self.config.arbitration_policy {
                    ArbitrationPolicy::Propagate => return Err(e),
                    ArbitrationPolicy::TreatAsNew => {
                        warn!(
                            draft_name = %draft.name,
                            error = %e,
                            "Arbitration failed; treating draft as new"
                        );
                        Resolution::New
                    }
                },
            }
        };

        match resolution {
            Resolution::Existing {
                entity_id,
                description,
                entity_type,
            } => {
                self.entities
                    .update_resolved(user_id, entity_id, &description, &entity_type)
                    .await?;
                Ok(entity_id)
            }
            Resolution::New => self.entities.upsert_by_name(user_id, draft).await,
        }
    }
}
