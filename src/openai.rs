//! OpenAI-compatible client construction.

use crate::error::Result;
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for API requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create an OpenAI client with the default timeout and environment credentials.
pub fn create_client() -> Result<Client<OpenAIConfig>> {
    create_client_with_config(OpenAIConfig::default(), Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// Create a client for any OpenAI-compatible endpoint (e.g. Groq).
pub fn create_compatible_client(api_base: &str, api_key: &str) -> Result<Client<OpenAIConfig>> {
    let config = OpenAIConfig::new()
        .with_api_base(api_base)
        .with_api_key(api_key);
    create_client_with_config(config, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// Create a client with a custom configuration and timeout.
pub fn create_client_with_config(
    config: OpenAIConfig,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Client::with_config(config).with_http_client(http_client))
}

/// Check whether an API key environment variable is set and non-empty.
pub fn env_key(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|k| !k.trim().is_empty())
}
