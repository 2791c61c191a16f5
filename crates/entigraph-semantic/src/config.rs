//! Semantic service configuration.

use std::time::Duration;

use entigraph_core::defaults;

/// Configuration for the semantic service backend.
#[derive(Debug, Clone)]
pub struct SemanticConfig {
    /// Base URL of the semantic service API.
    pub base_url: String,
    /// Model slug sent with every request.
    pub model: String,
    /// Embedding dimension expected on extracted drafts.
    pub dimension: usize,
    /// Request timeout. Transport hygiene only; the engine defines no
    /// timeout policy of its own.
    pub timeout: Duration,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::SEMANTIC_BASE_URL.to_string(),
            model: defaults::SEMANTIC_MODEL.to_string(),
            dimension: defaults::EMBED_DIMENSION,
            timeout: Duration::from_secs(defaults::SEMANTIC_TIMEOUT_SECS),
        }
    }
}

impl SemanticConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model slug.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the expected embedding dimension.
    pub fn dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create from environment variables, falling back to defaults.
    ///
    /// Reads `ENTIGRAPH_SEMANTIC_URL`, `ENTIGRAPH_SEMANTIC_MODEL`,
    /// `ENTIGRAPH_EMBED_DIM`, and `ENTIGRAPH_SEMANTIC_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("ENTIGRAPH_SEMANTIC_URL") {
            config.base_url = url;
        }
        if let Ok(model) = std::env::var("ENTIGRAPH_SEMANTIC_MODEL") {
            config.model = model;
        }
        if let Some(dim) = std::env::var("ENTIGRAPH_EMBED_DIM")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.dimension = dim;
        }
        if let Some(secs) = std::env::var("ENTIGRAPH_SEMANTIC_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SemanticConfig::default();
        assert_eq!(config.base_url, defaults::SEMANTIC_BASE_URL);
        assert_eq!(config.dimension, defaults::EMBED_DIMENSION);
    }

    #[test]
    fn test_builder() {
        let config = SemanticConfig::new()
            .base_url("http://semantic:9000")
            .model("gemma3:4b")
            .dimension(384)
            .timeout(Duration::from_secs(10));
        assert_eq!(config.base_url, "http://semantic:9000");
        assert_eq!(config.model, "gemma3:4b");
        assert_eq!(config.dimension, 384);
        assert_eq!(config.timeout, Duration::from_secs(10));
    }
}
