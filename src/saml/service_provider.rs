//! Service provider facade tying settings, metadata retrieval and message assembly together.

use std::sync::Arc;

use super::{
    authn_request::AuthnRequest,
    binding::{BindingResolver, ResolvedEndpoint, ServiceType},
    cache::MemoryMetadataCache,
    certificate::IdpCertificate,
    error::SamlResult,
    idp_metadata::IdpMetadata,
    message::{self, MessageKind, MessageOptions, OutboundMessage},
    retriever::MetadataRetriever,
    sp_metadata::SpMetadata,
};
use crate::config::SamlSettings;

/// SAML service provider for SP-initiated single sign-on and logout.
///
/// Owns the settings and the metadata retriever. Every operation is
/// stateless apart from an attached metadata cache, so one instance can be
/// shared across requests.
#[derive(Clone)]
pub struct ServiceProvider {
    settings: SamlSettings,
    retriever: MetadataRetriever,
}

impl ServiceProvider {
    /// Create a service provider.
    ///
    /// The retriever's HTTP client is built from `settings.metadata_fetch`.
    /// IdP metadata is re-fetched on every resolution unless
    /// `idp_metadata_ttl_secs` is set, in which case it is kept in memory for
    /// that long.
    pub fn new(settings: SamlSettings) -> SamlResult<Self> {
        let mut retriever = MetadataRetriever::new(&settings.metadata_fetch)?;
        if let Some(ttl) = settings.idp_metadata_ttl() {
            retriever = retriever.with_cache(Arc::new(MemoryMetadataCache::new(ttl)));
        }

        Ok(Self {
            settings,
            retriever,
        })
    }

    /// Create a service provider with a custom retriever.
    pub fn with_retriever(settings: SamlSettings, retriever: MetadataRetriever) -> Self {
        Self {
            settings,
            retriever,
        }
    }

    pub fn settings(&self) -> &SamlSettings {
        &self.settings
    }

    pub fn retriever(&self) -> &MetadataRetriever {
        &self.retriever
    }

    /// Build a new `AuthnRequest`.
    pub fn authn_request(&self) -> SamlResult<AuthnRequest> {
        AuthnRequest::build(&self.settings)
    }

    /// Generate this SP's metadata document.
    pub fn sp_metadata(&self) -> SamlResult<String> {
        SpMetadata::generate(&self.settings).map(|metadata| metadata.xml)
    }

    /// Resolve the IdP endpoint and binding for a service.
    pub async fn resolve_endpoint(
        &self,
        service: ServiceType,
    ) -> SamlResult<Option<ResolvedEndpoint>> {
        BindingResolver::new(&self.settings, &self.retriever)
            .resolve(service)
            .await
    }

    /// Retrieve the configured IdP metadata. `None` when no source is set.
    pub async fn idp_metadata(&self) -> SamlResult<Option<IdpMetadata>> {
        match &self.settings.idp_metadata {
            Some(locator) => self.retriever.retrieve(locator).await.map(Some),
            None => Ok(None),
        }
    }

    /// Retrieve the IdP metadata and extract its signing certificate.
    ///
    /// The certificate is returned, not stored; persisting it as a trust
    /// anchor is up to the caller.
    pub async fn idp_certificate(&self) -> SamlResult<Option<IdpCertificate>> {
        let Some(metadata) = self.idp_metadata().await? else {
            return Ok(None);
        };
        let certificate = metadata.signing_certificate()?;

        tracing::debug!(
            entity_id = metadata.entity_id.as_deref().unwrap_or_default(),
            "Extracted IdP signing certificate"
        );

        Ok(Some(certificate))
    }

    /// Encode `xml` for the IdP's preferred binding on `service`.
    ///
    /// Returns `None` when no usable endpoint exists.
    pub async fn build_message(
        &self,
        kind: MessageKind,
        service: ServiceType,
        xml: &str,
        options: &MessageOptions,
    ) -> SamlResult<Option<OutboundMessage>> {
        let Some(endpoint) = self.resolve_endpoint(service).await? else {
            return Ok(None);
        };

        let message = message::assemble(&endpoint, kind, xml, options)?;
        tracing::debug!(
            kind = kind.param(),
            service = %service,
            binding = %endpoint.binding,
            "Built outbound SAML message"
        );

        Ok(Some(message))
    }

    pub async fn create_sso_request(
        &self,
        xml: &str,
        options: &MessageOptions,
    ) -> SamlResult<Option<OutboundMessage>> {
        self.build_message(MessageKind::Request, ServiceType::SingleSignOn, xml, options)
            .await
    }

    pub async fn create_sso_response(
        &self,
        xml: &str,
        options: &MessageOptions,
    ) -> SamlResult<Option<OutboundMessage>> {
        self.build_message(MessageKind::Response, ServiceType::SingleSignOn, xml, options)
            .await
    }

    pub async fn create_slo_request(
        &self,
        xml: &str,
        options: &MessageOptions,
    ) -> SamlResult<Option<OutboundMessage>> {
        self.build_message(MessageKind::Request, ServiceType::SingleLogout, xml, options)
            .await
    }

    pub async fn create_slo_response(
        &self,
        xml: &str,
        options: &MessageOptions,
    ) -> SamlResult<Option<OutboundMessage>> {
        self.build_message(MessageKind::Response, ServiceType::SingleLogout, xml, options)
            .await
    }

    /// Start an SP-initiated login.
    ///
    /// Builds an `AuthnRequest` and assembles it for the IdP's SSO service.
    /// The request is returned with the message so the caller can store its
    /// ID for response correlation. `None` when the IdP has no usable SSO
    /// endpoint.
    pub async fn login(
        &self,
        options: &MessageOptions,
    ) -> SamlResult<Option<(AuthnRequest, OutboundMessage)>> {
        let request = self.authn_request()?;
        let message = self.create_sso_request(&request.xml, options).await?;

        Ok(message.map(|message| (request, message)))
    }
}
