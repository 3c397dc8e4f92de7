//! Upstream endpoint configuration.
//!
//! Configuration priority: environment variables > compiled defaults.

use std::env;

/// Default chat-completion endpoint base URL.
pub const DEFAULT_BASE_URL: &str = "https://integrate.api.nvidia.com/v1";

/// Default completion model.
pub const DEFAULT_MODEL: &str = "meta/llama-3.1-8b-instruct";

/// Connection settings for the completion client.
///
/// `api_key` is the shared default credential; callers may override it
/// per request without mutating this configuration.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base URL of the OpenAI-compatible API, without a trailing slash.
    pub base_url: String,
    /// Shared default API key.
    pub api_key: String,
    /// Initial model id.
    pub model: String,
}

impl UpstreamConfig {
    /// Builds a config from `CONFAB_BASE_URL`, `CONFAB_API_KEY` and
    /// `CONFAB_MODEL`, falling back to the compiled defaults. The API key
    /// has no default; an absent variable yields an empty shared key,
    /// which the throttling policy treats as unauthenticated usage.
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("CONFAB_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            api_key: env::var("CONFAB_API_KEY").unwrap_or_default(),
            model: env::var("CONFAB_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_compiled_endpoint() {
        let config = UpstreamConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!(config.api_key.is_empty());
    }
}
