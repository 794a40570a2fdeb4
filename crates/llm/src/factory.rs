//! LLM provider factory.
//!
//! Builds a client for the configured provider, resolving the endpoint and
//! checking that hosted providers received an API key.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenAiCompatClient};
use crate::types::ProviderType;
use docqa_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Default request timeout for language-model calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Connection options passed to [`create_client`].
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Custom endpoint URL (provider default when `None`)
    pub endpoint: Option<String>,

    /// API key for hosted providers
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama", "openai", "groq")
/// * `options` - Endpoint, API key and timeout
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown, a required API key
/// is missing, or the HTTP client cannot be built.
pub fn create_client(provider: &str, options: &ClientOptions) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    let base_url = options
        .endpoint
        .as_deref()
        .unwrap_or(provider_type.default_endpoint());
    let timeout = Duration::from_secs(options.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));

    tracing::debug!(
        "Creating {} client (endpoint: {}, timeout: {:?})",
        provider_type.as_str(),
        base_url,
        timeout
    );

    let api_key = match options.api_key.as_deref() {
        None if provider_type.requires_api_key() => {
            return Err(AppError::Config(format!(
                "{} provider requires API key",
                provider_type.as_str()
            )));
        }
        key => key.unwrap_or_default(),
    };

    match provider_type {
        ProviderType::Ollama => Ok(Arc::new(OllamaClient::with_options(base_url, timeout)?)),
        ProviderType::OpenAI | ProviderType::Groq => Ok(Arc::new(OpenAiCompatClient::new(
            provider_type.as_str(),
            base_url,
            api_key,
            timeout,
        )?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", &ClientOptions::default()).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_create_ollama_with_custom_endpoint() {
        let options = ClientOptions {
            endpoint: Some("http://localhost:8080".to_string()),
            ..Default::default()
        };
        assert!(create_client("ollama", &options).is_ok());
    }

    #[test]
    fn test_groq_requires_api_key() {
        match create_client("groq", &ClientOptions::default()) {
            Err(err) => assert!(err.to_string().contains("requires API key")),
            Ok(_) => panic!("Expected error for Groq without API key"),
        }
    }

    #[test]
    fn test_groq_with_key() {
        let options = ClientOptions {
            api_key: Some("test-key".to_string()),
            ..Default::default()
        };
        let client = create_client("groq", &options).unwrap();
        assert_eq!(client.provider_name(), "groq");
    }

    #[test]
    fn test_key_requirement_follows_provider_type() {
        for name in ["openai", "groq"] {
            let err = create_client(name, &ClientOptions::default()).err();
            assert_eq!(err.map(|e| e.kind()), Some("config"), "{}", name);
        }

        let options = ClientOptions {
            api_key: Some("ignored".to_string()),
            ..Default::default()
        };
        let client = create_client("ollama", &options).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", &ClientOptions::default()) {
            Err(err) => assert!(err.to_string().contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
