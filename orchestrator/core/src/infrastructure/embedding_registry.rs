// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Embedding Provider Registry
//
// Builds the configured embedding provider. Supported types:
// - "gemini": Generative Language API embedContent (default)
// - "openai": OpenAI-compatible /embeddings (OpenAI, Ollama, vLLM, LM Studio)
// - "hash": deterministic offline vectors for development

use frontdesk_cortex::domain::EmbeddingProvider;
use frontdesk_cortex::infrastructure::embedding::{
    GeminiEmbeddingProvider, HashEmbeddingProvider, OpenAIEmbeddingProvider,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::domain::config::{resolve_api_key, EmbeddingConfig};

/// Create the embedding provider described by configuration
pub fn create_embedding_provider(config: &EmbeddingConfig) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    let timeout = Duration::from_secs(config.timeout_seconds);

    let provider: Arc<dyn EmbeddingProvider> = match config.provider_type.as_str() {
        "gemini" => {
            let api_key = config
                .api_key
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("The gemini embedding provider requires an api_key"))
                .and_then(resolve_api_key)?;
            Arc::new(GeminiEmbeddingProvider::with_timeout(
                config.endpoint.clone(),
                api_key,
                config.model.clone(),
                timeout,
            )?)
        }
        "openai" => {
            let api_key = config.api_key.as_deref().map(resolve_api_key).transpose()?;
            Arc::new(OpenAIEmbeddingProvider::with_timeout(
                config.endpoint.clone(),
                api_key,
                config.model.clone(),
                timeout,
            )?)
        }
        "hash" => Arc::new(HashEmbeddingProvider::new(config.dimensions)),
        other => anyhow::bail!("Unsupported embedding provider type: {}", other),
    };

    info!(
        provider = provider.name(),
        model = %config.model,
        "Initialized embedding provider"
    );
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_provider() {
        let config = EmbeddingConfig {
            provider_type: "hash".to_string(),
            api_key: None,
            dimensions: 16,
            ..Default::default()
        };
        let provider = create_embedding_provider(&config).unwrap();
        assert_eq!(provider.name(), "hash");
    }

    #[test]
    fn test_openai_without_key() {
        let config = EmbeddingConfig {
            provider_type: "openai".to_string(),
            endpoint: "http://localhost:11434/v1".to_string(),
            model: "nomic-embed-text".to_string(),
            api_key: None,
            ..Default::default()
        };
        assert_eq!(create_embedding_provider(&config).unwrap().name(), "openai");
    }

    #[test]
    fn test_gemini_requires_key() {
        let config = EmbeddingConfig {
            api_key: None,
            ..Default::default()
        };
        assert!(create_embedding_provider(&config).is_err());

        let config = EmbeddingConfig {
            api_key: Some("literal-key".to_string()),
            ..Default::default()
        };
        assert_eq!(create_embedding_provider(&config).unwrap().name(), "gemini");
    }

    #[test]
    fn test_unknown_type() {
        let config = EmbeddingConfig {
            provider_type: "word2vec".to_string(),
            ..Default::default()
        };
        assert!(create_embedding_provider(&config).is_err());
    }
}
