//! Mock semantic backend for deterministic testing.
//!
//! Implements [`EntityExtractor`] and [`ResolutionArbiter`] with scripted
//! outcomes and a call log, so engine tests can exercise every arbitration
//! path without a live service.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let backend = MockSemanticBackend::new()
//!     .with_extraction("chunk text", vec![draft])
//!     .with_resolution("Einstein", Resolution::Existing { .. });
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use entigraph_core::{
    Candidate, DraftEntity, EntityExtractor, Error, Resolution, ResolutionArbiter, Result,
};

/// A logged call against the mock.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
}

#[derive(Default)]
struct MockState {
    extractions: HashMap<String, Vec<DraftEntity>>,
    resolutions: HashMap<String, Resolution>,
    fail_extraction: bool,
    fail_arbitration: bool,
    calls: Vec<MockCall>,
}

/// Scripted semantic backend.
///
/// Extraction returns the drafts registered for a chunk (empty when none
/// registered). Arbitration returns the resolution registered for the
/// draft's name, defaulting to [`Resolution::New`].
#[derive(Clone, Default)]
pub struct MockSemanticBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockSemanticBackend {
    /// Create a new mock with no scripted outcomes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the drafts extracted from a chunk.
    pub fn with_extraction(self, chunk: impl Into<String>, drafts: Vec<DraftEntity>) -> Self {
        self.state
            .lock()
            .unwrap()
            .extractions
            .insert(chunk.into(), drafts);
        self
    }

    /// Script the arbitration outcome for a draft name.
    pub fn with_resolution(self, draft_name: impl Into<String>, resolution: Resolution) -> Self {
        self.state
            .lock()
            .unwrap()
            .resolutions
            .insert(draft_name.into(), resolution);
        self
    }

    /// Make every extraction call fail.
    pub fn with_failing_extraction(self) -> Self {
        self.state.lock().unwrap().fail_extraction = true;
        self
    }

    /// Make every arbitration call fail.
    pub fn with_failing_arbitration(self) -> Self {
        self.state.lock().unwrap().fail_arbitration = true;
        self
    }

    /// All logged calls, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of arbitration calls made.
    pub fn arbitration_call_count(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.operation == "resolve")
            .count()
    }
}

#[async_trait]
impl EntityExtractor for MockSemanticBackend {
    async fn find_entities(&self, chunk: &str) -> Result<Vec<DraftEntity>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(MockCall {
            operation: "find_entities".to_string(),
            input: chunk.to_string(),
        });
        if state.fail_extraction {
            return Err(Error::Extraction("mock extraction failure".to_string()));
        }
        Ok(state.extractions.get(chunk).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl ResolutionArbiter for MockSemanticBackend {
    async fn resolve(&self, _candidates: &[Candidate], draft: &DraftEntity) -> Result<Resolution> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(MockCall {
            operation: "resolve".to_string(),
            input: draft.name.clone(),
        });
        if state.fail_arbitration {
            return Err(Error::Arbitration("mock arbitration failure".to_string()));
        }
        Ok(state
            .resolutions
            .get(&draft.name)
            .cloned()
            .unwrap_or(Resolution::New))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgvector::Vector;

    fn draft(name: &str) -> DraftEntity {
        DraftEntity {
            name: name.to_string(),
            description: String::new(),
            entity_type: String::new(),
            embedding: Vector::from(vec![1.0, 0.0]),
        }
    }

    #[tokio::test]
    async fn test_unscripted_chunk_extracts_nothing() {
        let backend = MockSemanticBackend::new();
        let drafts = backend.find_entities("unknown chunk").await.unwrap();
        assert!(drafts.is_empty());
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_scripted_resolution_is_returned() {
        let id = uuid::Uuid::new_v4();
        let backend = MockSemanticBackend::new().with_resolution(
            "Einstein",
            Resolution::Existing {
                entity_id: id,
                description: "merged".into(),
                entity_type: "person".into(),
            },
        );

        let resolution = backend.resolve(&[], &draft("Einstein")).await.unwrap();
        match resolution {
            Resolution::Existing { entity_id, .. } => assert_eq!(entity_id, id),
            _ => panic!("expected Existing"),
        }

        let fallback = backend.resolve(&[], &draft("Unknown")).await.unwrap();
        assert!(matches!(fallback, Resolution::New));
        assert_eq!(backend.arbitration_call_count(), 2);
    }

    #[tokio::test]
    async fn test_failure_flags() {
        let backend = MockSemanticBackend::new()
            .with_failing_extraction()
            .with_failing_arbitration();
        assert!(matches!(
            backend.find_entities("x").await,
            Err(Error::Extraction(_))
        ));
        assert!(matches!(
            backend.resolve(&[], &draft("x")).await,
            Err(Error::Arbitration(_))
        ));
    }
}
