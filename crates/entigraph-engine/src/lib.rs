//! # entigraph-engine
//!
//! Orchestration layer for entity resolution: drives extraction over
//! document chunks, resolves each draft against the user's existing
//! entities, persists the outcome, and exposes the merge service for
//! repairing duplicates.
//!
//! The engine owns policy, not mechanism. Storage lives in `entigraph-db`,
//! the external semantic calls in `entigraph-semantic`; this crate decides
//! what happens when each of them fails.

pub mod extract;
pub mod memory;
pub mod merge;
pub mod resolution;
pub mod service;

pub use extract::{ExtractionOrchestrator, ExtractionReport};
pub use service::EngineServices;
pub use memory::{InMemoryStore, StaticChunkSource};
pub use merge::{client_message, MergeRequest, MergeResponse, MergeService};
pub use resolution::{ArbitrationPolicy, ResolutionConfig, ResolutionPipeline};
