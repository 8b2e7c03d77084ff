use std::time::Duration;

use serde::{Deserialize, Serialize};

/// HTTP client configuration for fetching IdP metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetadataFetchConfig {
    /// Accept self-signed or otherwise unverifiable TLS certificates.
    ///
    /// Many IdPs serve metadata behind self-signed certificates, so this
    /// defaults to `true`. Deployments that need strict verification should
    /// set it to `false`.
    #[serde(default = "default_true")]
    pub accept_invalid_certs: bool,

    /// Refuse plain `http://` metadata URLs.
    #[serde(default)]
    pub require_https: bool,

    /// Total request timeout. No timeout is applied when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Connection establishment timeout. No timeout is applied when unset.
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,

    /// User-Agent header sent with metadata requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for MetadataFetchConfig {
    fn default() -> Self {
        Self {
            accept_invalid_certs: true,
            require_https: false,
            timeout_secs: None,
            connect_timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

impl MetadataFetchConfig {
    /// Build a reqwest Client from this configuration.
    pub fn build_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .user_agent(&self.user_agent);

        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }

        builder.build()
    }
}

fn default_user_agent() -> String {
    format!("saml-sp/{}", env!("CARGO_PKG_VERSION"))
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_tolerate_self_signed() {
        let config = MetadataFetchConfig::default();
        assert!(config.accept_invalid_certs);
        assert!(!config.require_https);
        assert!(config.timeout_secs.is_none());
        assert!(config.user_agent.starts_with("saml-sp/"));
    }

    #[test]
    fn test_build_client() {
        let config = MetadataFetchConfig {
            accept_invalid_certs: false,
            timeout_secs: Some(5),
            connect_timeout_secs: Some(2),
            ..Default::default()
        };
        assert!(config.build_client().is_ok());
    }
}
