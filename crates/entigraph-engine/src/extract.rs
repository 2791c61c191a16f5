//! Extraction orchestration: document chunks → drafts → resolution.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use entigraph_core::{ChunkSource, EntityExtractor, Result};

use crate::resolution::ResolutionPipeline;

/// Summary of one extraction run over a document.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    pub chunks_processed: usize,
    pub drafts_extracted: usize,
}

/// Runs entity extraction and resolution for whole documents.
///
/// Chunks are processed sequentially, in document order. Each chunk's
/// resolution commits independently: a later failure never rolls back
/// entities persisted from earlier chunks.
pub struct ExtractionOrchestrator {
    chunks: Arc<dyn ChunkSource>,
    extractor: Arc<dyn EntityExtractor>,
    pipeline: ResolutionPipeline,
}

impl ExtractionOrchestrator {
    pub fn new(
        chunks: Arc<dyn ChunkSource>,
        extractor: Arc<dyn EntityExtractor>,
        pipeline: ResolutionPipeline,
    ) -> Self {
        Self {
            chunks,
            extractor,
            pipeline,
        }
    }

    /// Extract entities from every chunk of `document_id` and resolve them
    /// into the user's entity set.
    ///
    /// An extraction or resolution failure aborts the remaining chunks and
    /// surfaces the error; work already committed for earlier chunks stands.
    #[instrument(skip(self), fields(subsystem = "engine", component = "orchestrator", op = "extract_and_save", user_id = %user_id, document_id = %document_id))]
    pub async fn extract_and_save(
        &self,
        user_id: Uuid,
        document_id: Uuid,
    ) -> Result<ExtractionReport> {
        let start = Instant::now();
        let chunks = self.chunks.chunks(user_id, document_id).await?;
        let mut report = ExtractionReport::default();

        for (index, chunk) in chunks.iter().enumerate() {
            let drafts = match self.extractor.find_entities(chunk).await {
                Ok(drafts) => drafts,
                Err(e) => {
                    warn!(
                        chunk_index = index,
                        error = %e,
                        "Extraction failed; aborting remaining chunks"
                    );
                    return Err(e);
                }
            };

            report.drafts_extracted += drafts.len();
            if !drafts.is_empty() {
                self.pipeline.upsert(user_id, document_id, drafts).await?;
            }
            report.chunks_processed += 1;
        }

        info!(
            chunks = report.chunks_processed,
            drafts = report.drafts_extracted,
            duration_ms = start.elapsed().as_millis() as u64,
            "Document extraction complete"
        );
        Ok(report)
    }
}
