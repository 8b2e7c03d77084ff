use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use super::{ConfigError, MetadataFetchConfig};
use crate::validation::MetadataSource;

/// SAML service provider settings.
///
/// Describes the local service provider (identifiers, endpoints, NameID and
/// authentication context policy) and how to reach the identity provider:
/// either a metadata source or static endpoint URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamlSettings {
    /// SP entity ID. Used as the request `Issuer` and the metadata `entityID`.
    #[serde(default)]
    pub issuer: Option<String>,

    /// Assertion Consumer Service URL (where the IdP sends the response).
    #[serde(default)]
    pub assertion_consumer_service_url: Option<String>,

    /// SP Single Logout service URL advertised in metadata.
    #[serde(default)]
    pub single_logout_service_url: Option<String>,

    /// Value of the `Destination` attribute on outgoing requests.
    #[serde(default)]
    pub destination_service_url: Option<String>,

    /// Supported NameID formats, in order of preference.
    ///
    /// The first entry is requested in the `NameIDPolicy`; all of them are
    /// listed in SP metadata.
    #[serde(default)]
    pub name_identifier_format: Vec<String>,

    /// `SPNameQualifier` for the `NameIDPolicy`.
    #[serde(default)]
    pub sp_name_qualifier: Option<String>,

    /// Authentication context class refs the IdP must match exactly.
    /// When empty the IdP applies its own defaults.
    #[serde(default)]
    pub authn_context: Vec<String>,

    /// Requester IDs added to a `Scoping` element for proxying IdPs.
    #[serde(default)]
    pub requester_identifiers: Vec<String>,

    /// `AttributeConsumingServiceIndex` sent on requests.
    #[serde(default = "default_attribute_consuming_service_index")]
    pub attribute_consuming_service_index: u32,

    /// `WantAssertionsSigned` flag in SP metadata.
    #[serde(default = "default_true")]
    pub want_assertions_signed: bool,

    /// Path to the SP public certificate (PEM) published in metadata.
    #[serde(default)]
    pub signing_certificate_path: Option<PathBuf>,

    /// Inline SP public certificate (PEM). Alternative to `signing_certificate_path`.
    #[serde(default)]
    pub signing_certificate: Option<String>,

    /// Static IdP SSO endpoint, used when `idp_metadata` is not set.
    #[serde(default)]
    pub idp_sso_target_url: Option<String>,

    /// Static IdP SLO endpoint, used when `idp_metadata` is not set.
    #[serde(default)]
    pub idp_slo_target_url: Option<String>,

    /// IdP metadata locator: `http(s)://` URL, `file://` URL, or a local path.
    #[serde(default)]
    pub idp_metadata: Option<String>,

    /// Keep fetched IdP metadata in memory for this many seconds.
    ///
    /// Unset (or zero) means no cache: every resolution re-fetches.
    #[serde(default)]
    pub idp_metadata_ttl_secs: Option<u64>,

    /// Indent generated XML documents. Useful for IdP administrators reading
    /// published metadata; has no effect on protocol semantics.
    #[serde(default)]
    pub pretty_print: bool,

    /// Transport options for fetching IdP metadata.
    #[serde(default)]
    pub metadata_fetch: MetadataFetchConfig,
}

impl Default for SamlSettings {
    fn default() -> Self {
        Self {
            issuer: None,
            assertion_consumer_service_url: None,
            single_logout_service_url: None,
            destination_service_url: None,
            name_identifier_format: Vec::new(),
            sp_name_qualifier: None,
            authn_context: Vec::new(),
            requester_identifiers: Vec::new(),
            attribute_consuming_service_index: default_attribute_consuming_service_index(),
            want_assertions_signed: true,
            signing_certificate_path: None,
            signing_certificate: None,
            idp_sso_target_url: None,
            idp_slo_target_url: None,
            idp_metadata: None,
            idp_metadata_ttl_secs: None,
            pretty_print: false,
            metadata_fetch: MetadataFetchConfig::default(),
        }
    }
}

impl SamlSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signing_certificate.is_some() && self.signing_certificate_path.is_some() {
            return Err(ConfigError::Validation(
                "saml.signing_certificate and saml.signing_certificate_path are mutually exclusive"
                    .into(),
            ));
        }

        let urls = [
            (
                "assertion_consumer_service_url",
                &self.assertion_consumer_service_url,
            ),
            ("single_logout_service_url", &self.single_logout_service_url),
            ("destination_service_url", &self.destination_service_url),
            ("idp_sso_target_url", &self.idp_sso_target_url),
            ("idp_slo_target_url", &self.idp_slo_target_url),
        ];
        for (field, value) in urls {
            if let Some(value) = value
                && let Err(e) = url::Url::parse(value)
            {
                return Err(ConfigError::Validation(format!(
                    "saml.{field} is not a valid URL ({value}): {e}"
                )));
            }
        }

        if let Some(locator) = &self.idp_metadata {
            MetadataSource::parse(locator).map_err(|e| {
                ConfigError::Validation(format!("saml.idp_metadata ({locator}): {e}"))
            })?;
        }

        Ok(())
    }

    /// Metadata cache lifetime, if caching is enabled.
    pub fn idp_metadata_ttl(&self) -> Option<Duration> {
        self.idp_metadata_ttl_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

fn default_attribute_consuming_service_index() -> u32 {
    2
}

fn default_true() -> bool {
    true
}
