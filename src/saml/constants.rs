//! SAML 2.0 namespace and binding URIs.

/// SAML 2.0 protocol namespace (`saml2p:` / `samlp:`).
pub const PROTOCOL_NS: &str = "urn:oasis:names:tc:SAML:2.0:protocol";

/// SAML 2.0 assertion namespace (`saml2:` / `saml:`).
pub const ASSERTION_NS: &str = "urn:oasis:names:tc:SAML:2.0:assertion";

/// SAML 2.0 metadata namespace (`md:`).
pub const METADATA_NS: &str = "urn:oasis:names:tc:SAML:2.0:metadata";

/// XML Digital Signature namespace (`ds:`).
pub const XMLDSIG_NS: &str = "http://www.w3.org/2000/09/xmldsig#";

/// HTTP-POST binding URI.
pub const BINDING_HTTP_POST: &str = "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST";

/// HTTP-Redirect binding URI.
pub const BINDING_HTTP_REDIRECT: &str = "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect";

/// Protocol version written on every request.
pub const SAML_VERSION: &str = "2.0";

/// `cacheDuration` advertised on SP metadata.
pub const METADATA_CACHE_DURATION: &str = "P1M";

/// Declaration some IdPs emit on their metadata root. It re-binds the reserved
/// `xml` prefix and trips up namespace-aware parsers, so it is removed before
/// parsing.
pub const XML_NAMESPACE_DECLARATION: &str = r#" xmlns:xml="http://www.w3.org/XML/1998/namespace""#;

/// RelayState used on POST forms when the caller does not provide one.
pub const DEFAULT_RELAY_STATE: &str = "saml-sp";
