//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `PAWSTORE_API_BASE_URL` - Backend base URL (default: `http://localhost:8000`)
//! - `PAWSTORE_ENVELOPE_KEY` - Shared secret for the response envelope and
//!   credential sealing (default: the backend's well-known development key)

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Default backend address for local development.
const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// The backend's well-known development envelope key.
///
/// The envelope is obfuscation, not encryption (see [`crate::api::envelope`]),
/// so shipping a default here is deliberate; deployments override it to match
/// their backend.
const DEFAULT_ENVELOPE_KEY: &str = "pawstore_secret_key";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// PawStore client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the PawStore REST backend.
    pub api_base_url: Url,
    /// Shared secret for the XOR response envelope.
    pub envelope_key: SecretString,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `PAWSTORE_API_BASE_URL` is not
    /// a valid URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_url = std::env::var("PAWSTORE_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let api_base_url = Url::parse(&raw_url)
            .map_err(|e| ConfigError::InvalidEnvVar("PAWSTORE_API_BASE_URL".into(), e.to_string()))?;

        let envelope_key = std::env::var("PAWSTORE_ENVELOPE_KEY")
            .unwrap_or_else(|_| DEFAULT_ENVELOPE_KEY.to_string());

        Ok(Self {
            api_base_url,
            envelope_key: envelope_key.into(),
        })
    }

    /// Build a configuration directly, bypassing the environment.
    #[must_use]
    pub fn new(api_base_url: Url, envelope_key: impl Into<SecretString>) -> Self {
        Self {
            api_base_url,
            envelope_key: envelope_key.into(),
        }
    }
}
