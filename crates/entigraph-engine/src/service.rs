//! Composition root wiring storage and semantic backends into the engine.

use std::sync::Arc;

use entigraph_core::ChunkSource;
use entigraph_db::Database;
use entigraph_semantic::HttpSemanticBackend;

use crate::extract::ExtractionOrchestrator;
use crate::merge::MergeService;
use crate::resolution::{ResolutionConfig, ResolutionPipeline};

/// Fully wired engine services over Postgres and the HTTP semantic backend.
///
/// The chunk source stays caller-supplied: document storage and chunking
/// live upstream of this engine.
pub struct EngineServices {
    pub orchestrator: ExtractionOrchestrator,
    pub merge: MergeService,
}

impl EngineServices {
    pub fn new(
        db: &Database,
        semantic: HttpSemanticBackend,
        chunks: Arc<dyn ChunkSource>,
        config: ResolutionConfig,
    ) -> Self {
        let entities = Arc::new(db.entities.clone());
        let links = Arc::new(db.links.clone());
        let semantic = Arc::new(semantic);

        let pipeline = ResolutionPipeline::new(entities.clone(), links, semantic.clone())
            .with_config(config);

        Self {
            orchestrator: ExtractionOrchestrator::new(chunks, semantic, pipeline),
            merge: MergeService::new(entities),
        }
    }
}
