//! HTTP semantic service backend.
//!
//! Implements [`EntityExtractor`] and [`ResolutionArbiter`] against the
//! semantic service's JSON API. The service is treated as an opaque,
//! possibly slow, possibly failing collaborator; both trait impls surface
//! every failure as an explicit error and never retry.

use std::time::Instant;

use async_trait::async_trait;
use pgvector::Vector;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use entigraph_core::{
    Candidate, DraftEntity, EntityExtractor, Error, Resolution, ResolutionArbiter, Result,
};

use crate::config::SemanticConfig;

/// Semantic service backend over HTTP.
pub struct HttpSemanticBackend {
    client: Client,
    config: SemanticConfig,
}

impl HttpSemanticBackend {
    /// Create a new backend with the given configuration.
    pub fn new(config: SemanticConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self { client, config }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        Self::new(SemanticConfig::from_env())
    }

    /// The active configuration.
    pub fn config(&self) -> &SemanticConfig {
        &self.config
    }
}

#[derive(Serialize)]
struct ExtractRequest<'a> {
    model: &'a str,
    chunk: &'a str,
}

#[derive(Deserialize)]
struct ExtractResponse {
    entities: Vec<WireDraft>,
}

#[derive(Serialize, Deserialize)]
struct WireDraft {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    entity_type: String,
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ResolveRequest<'a> {
    model: &'a str,
    draft: ResolveDraft<'a>,
    candidates: &'a [Candidate],
}

#[derive(Serialize)]
struct ResolveDraft<'a> {
    name: &'a str,
    description: &'a str,
    entity_type: &'a str,
}

/// Arbitration verdict: `match_id` names the candidate the draft restates,
/// or is null when the draft is genuinely new. `description`/`entity_type`
/// carry the reconciled values for a match.
#[derive(Deserialize)]
struct ResolveResponse {
    match_id: Option<Uuid>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    entity_type: String,
}

#[async_trait]
impl EntityExtractor for HttpSemanticBackend {
    #[instrument(skip(self, chunk), fields(subsystem = "semantic", component = "extractor", op = "find_entities", model = %self.config.model, chunk_len = chunk.len()))]
    async fn find_entities(&self, chunk: &str) -> Result<Vec<DraftEntity>> {
        let start = Instant::now();

        let request = ExtractRequest {
            model: &self.config.model,
            chunk,
        };

        let response = self
            .client
            .post(format!("{}/v1/extract", self.config.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Extraction(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Extraction(format!(
                "semantic service returned {}: {}",
                status, body
            )));
        }

        let result: ExtractResponse = response
            .json()
            .await
            .map_err(|e| Error::Extraction(format!("failed to parse response: {}", e)))?;

        let mut drafts = Vec::with_capacity(result.entities.len());
        for wire in result.entities {
            if wire.embedding.len() != self.config.dimension {
                return Err(Error::Extraction(format!(
                    "draft '{}' has embedding dimension {} (expected {})",
                    wire.name,
                    wire.embedding.len(),
                    self.config.dimension
                )));
            }
            drafts.push(DraftEntity {
                name: wire.name,
                description: wire.description,
                entity_type: wire.entity_type,
                embedding: Vector::from(wire.embedding),
            });
        }

        debug!(
            draft_count = drafts.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Extraction complete"
        );
        Ok(drafts)
    }
}

#[async_trait]
impl ResolutionArbiter for HttpSemanticBackend {
    #[instrument(skip(self, candidates, draft), fields(subsystem = "semantic", component = "arbiter", op = "resolve", model = %self.config.model, candidate_count = candidates.len()))]
    async fn resolve(&self, candidates: &[Candidate], draft: &DraftEntity) -> Result<Resolution> {
        // Nothing to arbitrate against.
        if candidates.is_empty() {
            return Ok(Resolution::New);
        }

        let start = Instant::now();

        let request = ResolveRequest {
            model: &self.config.model,
            draft: ResolveDraft {
                name: &draft.name,
                description: &draft.description,
                entity_type: &draft.entity_type,
            },
            candidates,
        };

        let response = self
            .client
            .post(format!("{}/v1/resolve", self.config.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Arbitration(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Arbitration(format!(
                "semantic service returned {}: {}",
                status, body
            )));
        }

        let result: ResolveResponse = response
            .json()
            .await
            .map_err(|e| Error::Arbitration(format!("failed to parse response: {}", e)))?;

        let resolution = match result.match_id {
            Some(entity_id) => {
                // Accept only ids that were actually offered; anything else
                // is a hallucinated match.
                if !candidates.iter().any(|c| c.id == entity_id) {
                    warn!(
                        entity_id = %entity_id,
                        "Arbiter returned an id outside the candidate set; treating draft as new"
                    );
                    Resolution::New
                } else {
                    Resolution::Existing {
                        entity_id,
                        description: if result.description.is_empty() {
                            draft.description.clone()
                        } else {
                            result.description
                        },
                        entity_type: if result.entity_type.is_empty() {
                            draft.entity_type.clone()
                        } else {
                            result.entity_type
                        },
                    }
                }
            }
            None => Resolution::New,
        };

        debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            matched = matches!(resolution, Resolution::Existing { .. }),
            "Arbitration complete"
        );
        Ok(resolution)
    }
}
