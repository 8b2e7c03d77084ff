use crate::validation::UrlValidationError;

/// Result type for SAML operations.
pub type SamlResult<T> = Result<T, SamlError>;

/// Errors surfaced by request building, metadata handling, and message encoding.
///
/// A binding resolution that finds no usable endpoint is not an error; it is
/// reported as `Ok(None)` so callers can fall back.
#[derive(Debug, thiserror::Error)]
pub enum SamlError {
    /// A setting required for the requested document is missing or invalid.
    #[error("SAML configuration error: {0}")]
    Configuration(String),

    /// IdP metadata could not be fetched or read.
    #[error("Failed to retrieve SAML metadata: {0}")]
    Retrieval(String),

    /// IdP metadata is not well-formed or not an EntityDescriptor.
    #[error("Failed to parse SAML metadata: {0}")]
    Parse(String),

    /// Certificate data could not be read or decoded.
    #[error("Invalid certificate: {0}")]
    Certificate(String),

    /// IdP metadata carries no signing certificate.
    #[error("SAML metadata does not contain a signing certificate")]
    MissingCertificate,

    /// An XML document could not be serialized.
    #[error("Failed to serialize SAML XML: {0}")]
    Xml(String),

    /// A message could not be compressed for the redirect binding.
    #[error("Failed to encode SAML message: {0}")]
    Encoding(String),
}

impl From<UrlValidationError> for SamlError {
    fn from(err: UrlValidationError) -> Self {
        SamlError::Retrieval(err.to_string())
    }
}
