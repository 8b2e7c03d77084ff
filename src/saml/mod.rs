//! SAML 2.0 service provider.
//!
//! [`ServiceProvider`] ties the pieces together; the submodules can also be
//! used on their own.

mod authn_request;
pub mod binding;
pub mod cache;
mod certificate;
pub mod constants;
pub mod encoding;
mod error;
pub mod idp_metadata;
pub mod message;
pub mod retriever;
mod service_provider;
mod sp_metadata;
mod xml;

pub use authn_request::AuthnRequest;
pub use binding::{Binding, BindingResolver, ResolvedEndpoint, ServiceType};
pub use cache::{MemoryMetadataCache, MetadataCache, SharedMetadataCache};
pub use certificate::{IdpCertificate, strip_pem_headers};
pub use error::{SamlError, SamlResult};
pub use idp_metadata::{Endpoint, IdpMetadata, KeyDescriptor};
pub use message::{MessageKind, MessageOptions, OutboundMessage};
pub use retriever::MetadataRetriever;
pub use service_provider::ServiceProvider;
pub use sp_metadata::SpMetadata;
