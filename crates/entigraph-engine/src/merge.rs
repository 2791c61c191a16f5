//! Merge request validation and service boundary.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use entigraph_core::{EntityRepository, Error, Result};

/// A request to absorb one entity into another.
///
/// Both ids are optional at the wire level so a missing field produces a
/// validation message instead of a deserialization failure.
#[derive(Debug, Clone, Deserialize)]
pub struct MergeRequest {
    pub target_id: Option<Uuid>,
    pub source_id: Option<Uuid>,
}

impl MergeRequest {
    /// Reject requests that cannot name two distinct entities.
    pub fn validate(&self) -> Result<(Uuid, Uuid)> {
        let target = self
            .target_id
            .filter(|id| !id.is_nil())
            .ok_or_else(|| Error::InvalidInput("target_id is required".to_string()))?;
        let source = self
            .source_id
            .filter(|id| !id.is_nil())
            .ok_or_else(|| Error::InvalidInput("source_id is required".to_string()))?;
        if target == source {
            return Err(Error::InvalidInput(
                "cannot merge an entity into itself".to_string(),
            ));
        }
        Ok((target, source))
    }
}

/// Outcome of a completed merge, shaped for the API boundary.
#[derive(Debug, Clone, Serialize)]
pub struct MergeResponse {
    pub target_id: Uuid,
    pub absorbed_id: Uuid,
    pub message: String,
}

/// Executes validated merges against the entity store.
pub struct MergeService {
    entities: Arc<dyn EntityRepository>,
}

impl MergeService {
    pub fn new(entities: Arc<dyn EntityRepository>) -> Self {
        Self { entities }
    }

    /// Validate and run a merge on behalf of `user_id`.
    #[instrument(skip(self, request), fields(subsystem = "engine", component = "merge", op = "merge", user_id = %user_id))]
    pub async fn merge(&self, user_id: Uuid, request: &MergeRequest) -> Result<MergeResponse> {
        let (target_id, source_id) = request.validate()?;
        self.entities.merge(user_id, target_id, source_id).await?;
        info!(target_id = %target_id, source_id = %source_id, "Entities merged");
        Ok(MergeResponse {
            target_id,
            absorbed_id: source_id,
            message: "Entities merged successfully".to_string(),
        })
    }
}

/// Map a merge failure to the message a client should see.
///
/// Validation errors carry their own text; internal failures are collapsed
/// so storage details never leak past the boundary.
pub fn client_message(error: &Error) -> String {
    if error.is_validation() {
        error.to_string()
    } else {
        "Failed to merge entities".to_string()
    }
}
