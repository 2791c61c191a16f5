//! # entigraph-core
//!
//! Core types, traits, and abstractions for the entigraph entity-resolution
//! engine.
//!
//! This crate provides:
//! - The entity/draft/candidate data model
//! - Capability traits for storage and the external semantic services
//! - The shared error taxonomy
//! - Centralized defaults and the structured-logging field schema

pub mod defaults;
pub mod distance;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;
pub mod uuid_utils;

pub use distance::{CosineDistance, DistanceMetric};
pub use error::{Error, Result};
pub use models::{
    Candidate, DraftEntity, Entity, EntityDocumentLink, EntityWithDocumentCount, Resolution,
    Vector,
};
pub use traits::{
    ChunkSource, EntityExtractor, EntityLinkRepository, EntityRepository, ResolutionArbiter,
};
pub use uuid_utils::new_v7;
