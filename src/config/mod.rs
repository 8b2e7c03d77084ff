//! Configuration for the SAML service provider.
//!
//! Settings are plain serde structs so host applications can embed them in
//! their own configuration, or load them standalone from a TOML file.
//!
//! # Example
//!
//! ```toml
//! [saml]
//! issuer = "https://sp.example.com/saml"
//! assertion_consumer_service_url = "https://sp.example.com/saml/acs"
//! name_identifier_format = ["urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress"]
//! idp_metadata = "https://idp.example.com/metadata"
//!
//! [saml.metadata_fetch]
//! timeout_secs = 10
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```

mod http;
mod observability;
mod saml;

use std::path::Path;

pub use http::*;
pub use observability::*;
pub use saml::*;
use serde::{Deserialize, Serialize};

/// Root configuration file layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamlConfig {
    /// Service provider and counterparty settings.
    #[serde(default)]
    pub saml: SamlSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SamlConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let config: SamlConfig = toml::from_str(contents).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for consistency and completeness.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.saml.validate()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}
