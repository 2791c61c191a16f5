//! # entigraph-semantic
//!
//! Clients for the external semantic services entigraph delegates to:
//! entity extraction from text chunks and resolution arbitration. Both are
//! opaque collaborators — possibly slow, possibly failing, and for
//! arbitration explicitly non-deterministic — so every implementation here
//! surfaces failure as an explicit error for the caller's policy to handle.

pub mod config;
pub mod http;
pub mod mock;

pub use config::SemanticConfig;
pub use http::HttpSemanticBackend;
pub use mock::MockSemanticBackend;
