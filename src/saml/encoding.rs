//! Binding-specific message encoding.

use std::io::Write;

use base64::{Engine, engine::general_purpose::STANDARD};
use flate2::{Compression, write::DeflateEncoder};

use super::{
    binding::Binding,
    error::{SamlError, SamlResult},
};

/// HTTP-Redirect encoding: raw DEFLATE (no zlib header or checksum) at best
/// compression, then standard base64 without line breaks.
pub fn deflate_encode(xml: &str) -> SamlResult<String> {
    let mut compressed = Vec::new();
    {
        let mut encoder = DeflateEncoder::new(&mut compressed, Compression::best());
        encoder
            .write_all(xml.as_bytes())
            .map_err(|e| SamlError::Encoding(format!("Failed to compress SAML message: {e}")))?;
        encoder
            .finish()
            .map_err(|e| SamlError::Encoding(format!("Failed to compress SAML message: {e}")))?;
    }

    Ok(STANDARD.encode(&compressed))
}

/// HTTP-POST encoding: standard base64 of the raw XML.
pub fn base64_encode(xml: &str) -> String {
    STANDARD.encode(xml.as_bytes())
}

/// Encode a message for `binding`.
pub fn encode(xml: &str, binding: Binding) -> SamlResult<String> {
    let encoded = match binding {
        Binding::HttpRedirect => deflate_encode(xml)?,
        Binding::HttpPost => base64_encode(xml),
    };
    tracing::debug!(binding = %binding, xml_len = xml.len(), encoded_len = encoded.len(), "Encoded SAML message");
    Ok(encoded)
}
