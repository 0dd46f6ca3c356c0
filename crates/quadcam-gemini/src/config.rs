//! Gemini client configuration.

use std::time::Duration;

use crate::error::{GeminiError, GeminiResult};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Configuration shared by the analyzer and merger.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API credential; may be absent until first use
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// REST base URL
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Total analysis attempts, including the first
    pub max_retries: u32,
    /// Fixed delay between analysis attempts
    pub retry_delay: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(300),
            max_retries: 5,
            retry_delay: Duration::from_secs(2),
        }
    }
}

impl GeminiConfig {
    /// Create config from environment variables.
    ///
    /// A missing credential is not an error here; it is reported on the
    /// first model call.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_key = ["GEMINI_API_KEY", "GOOGLE_API_KEY"]
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty());

        Self {
            api_key,
            model: std::env::var("GEMINI_MODEL").unwrap_or(defaults.model),
            base_url: std::env::var("GEMINI_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            timeout: std::env::var("GEMINI_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_retries: std::env::var("GEMINI_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &u32| *n > 0)
                .unwrap_or(defaults.max_retries),
            retry_delay: std::env::var("GEMINI_RETRY_DELAY_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.retry_delay),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    /// Whether a credential is configured.
    pub fn has_credential(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// Pick the credential for a call: the explicit one, else the configured one.
pub fn resolve_credential(explicit: Option<&str>, configured: Option<&str>) -> GeminiResult<String> {
    explicit
        .filter(|k| !k.trim().is_empty())
        .or(configured.filter(|k| !k.trim().is_empty()))
        .map(str::to_string)
        .ok_or(GeminiError::MissingCredential)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeminiConfig::default();
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_delay, Duration::from_secs(2));
        assert!(!config.has_credential());
    }

    #[test]
    fn test_resolve_credential_precedence() {
        assert_eq!(
            resolve_credential(Some("explicit"), Some("configured")).unwrap(),
            "explicit"
        );
        assert_eq!(
            resolve_credential(None, Some("configured")).unwrap(),
            "configured"
        );
        assert_eq!(
            resolve_credential(Some("  "), Some("configured")).unwrap(),
            "configured"
        );
        assert!(matches!(
            resolve_credential(None, None),
            Err(GeminiError::MissingCredential)
        ));
        assert!(matches!(
            resolve_credential(Some(""), Some("")),
            Err(GeminiError::MissingCredential)
        ));
    }
}
