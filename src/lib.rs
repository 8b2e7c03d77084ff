//! SAML 2.0 service-provider messaging.
//!
//! This crate implements the SP side of an SP-initiated single sign-on
//! exchange. It handles:
//! - AuthnRequest generation
//! - SP metadata generation for publication to the IdP
//! - IdP metadata retrieval and signing certificate extraction
//! - Binding selection (HTTP-POST preferred over HTTP-Redirect)
//! - Binding-specific message encoding (redirect URL or auto-submitting form)
//!
//! Validating responses, XML signatures, and sessions is left to the host
//! application.
//!
//! # Example
//!
//! ```rust,ignore
//! use saml_sp::{SamlSettings, ServiceProvider, MessageOptions, OutboundMessage};
//!
//! let sp = ServiceProvider::new(settings)?;
//! if let Some((request, message)) = sp.login(&MessageOptions::default()).await? {
//!     remember_request_id(&request.id);
//!     match message {
//!         OutboundMessage::Redirect { url } => redirect_to(url),
//!         OutboundMessage::Post { html } => respond_with(html),
//!     }
//! }
//! ```

pub mod config;
#[cfg(feature = "logging")]
pub mod observability;
pub mod saml;
pub mod validation;

#[cfg(test)]
mod tests;

pub use config::{ConfigError, LoggingConfig, MetadataFetchConfig, SamlConfig, SamlSettings};
pub use saml::{
    AuthnRequest, Binding, IdpCertificate, IdpMetadata, MemoryMetadataCache, MessageKind,
    MessageOptions, MetadataCache, MetadataRetriever, OutboundMessage, ResolvedEndpoint,
    SamlError, SamlResult, ServiceProvider, ServiceType, SpMetadata,
};
