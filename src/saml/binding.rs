//! Binding negotiation with the IdP.

use std::fmt;

use super::{
    constants::{BINDING_HTTP_POST, BINDING_HTTP_REDIRECT},
    error::SamlResult,
    retriever::MetadataRetriever,
};
use crate::config::SamlSettings;

/// Transport binding for an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    /// Base64 message in an auto-submitting HTML form.
    HttpPost,
    /// Deflated, base64 message in the query string.
    HttpRedirect,
}

impl Binding {
    /// Bindings the resolver accepts, in order of preference.
    pub const PREFERENCE: [Binding; 2] = [Binding::HttpPost, Binding::HttpRedirect];

    pub fn uri(self) -> &'static str {
        match self {
            Binding::HttpPost => BINDING_HTTP_POST,
            Binding::HttpRedirect => BINDING_HTTP_REDIRECT,
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::HttpPost => write!(f, "HTTP-POST"),
            Binding::HttpRedirect => write!(f, "HTTP-Redirect"),
        }
    }
}

/// IdP service an outbound message is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceType {
    SingleSignOn,
    SingleLogout,
}

impl ServiceType {
    /// Metadata element name for the service.
    pub fn element_name(self) -> &'static str {
        match self {
            ServiceType::SingleSignOn => "SingleSignOnService",
            ServiceType::SingleLogout => "SingleLogoutService",
        }
    }

    fn static_url(self, settings: &SamlSettings) -> Option<&str> {
        match self {
            ServiceType::SingleSignOn => settings.idp_sso_target_url.as_deref(),
            ServiceType::SingleLogout => settings.idp_slo_target_url.as_deref(),
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_name())
    }
}

/// An endpoint URL together with the binding to use for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    pub url: String,
    pub binding: Binding,
}

/// Selects the endpoint and binding for an IdP service.
pub struct BindingResolver<'a> {
    settings: &'a SamlSettings,
    retriever: &'a MetadataRetriever,
}

impl<'a> BindingResolver<'a> {
    pub fn new(settings: &'a SamlSettings, retriever: &'a MetadataRetriever) -> Self {
        Self {
            settings,
            retriever,
        }
    }

    /// Resolve the endpoint for `service`.
    ///
    /// Without a metadata source, the static URL for the service is used with
    /// the redirect binding and no network access happens. With one, the IdP
    /// metadata is retrieved and the first HTTP-POST endpoint wins, then the
    /// first HTTP-Redirect endpoint. SOAP and Artifact endpoints are never
    /// selected. `Ok(None)` means nothing usable was found.
    pub async fn resolve(&self, service: ServiceType) -> SamlResult<Option<ResolvedEndpoint>> {
        let Some(locator) = &self.settings.idp_metadata else {
            let resolved = service.static_url(self.settings).map(|url| ResolvedEndpoint {
                url: url.to_string(),
                binding: Binding::HttpRedirect,
            });
            match &resolved {
                Some(endpoint) => {
                    tracing::debug!(service = %service, url = %endpoint.url, "Using static IdP endpoint");
                }
                None => {
                    tracing::debug!(service = %service, "No IdP metadata or static endpoint configured");
                }
            }
            return Ok(resolved);
        };

        let metadata = self.retriever.retrieve(locator).await?;

        let resolved = Binding::PREFERENCE.into_iter().find_map(|binding| {
            metadata
                .endpoint(service, binding)
                .map(|endpoint| ResolvedEndpoint {
                    url: endpoint.location.clone(),
                    binding,
                })
        });

        match &resolved {
            Some(endpoint) => tracing::debug!(
                service = %service,
                binding = %endpoint.binding,
                url = %endpoint.url,
                "Selected IdP binding"
            ),
            None => tracing::debug!(
                service = %service,
                "IdP metadata has no HTTP-POST or HTTP-Redirect endpoint"
            ),
        }

        Ok(resolved)
    }
}
