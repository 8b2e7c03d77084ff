//! Certificate text handling for SP and IdP metadata.

use std::{fmt, path::Path};

use super::error::{SamlError, SamlResult};

/// Signing certificate extracted from IdP metadata.
///
/// Holds the base64 body of the `X509Certificate` element with newlines and
/// tabs removed. Nothing about the certificate's validity is checked here;
/// this is the trust anchor handed to whatever validates response signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdpCertificate(String);

impl IdpCertificate {
    /// Normalize raw `X509Certificate` element text.
    pub fn from_element_text(text: &str) -> Self {
        Self(text.chars().filter(|c| *c != '\n' && *c != '\t').collect())
    }

    /// The base64 certificate body.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap the body in PEM armor, 64 characters per line.
    pub fn to_pem(&self) -> String {
        let body: String = self.0.split_whitespace().collect();
        let mut pem = String::from("-----BEGIN CERTIFICATE-----\n");
        for chunk in body.as_bytes().chunks(64) {
            // base64 is ASCII, so byte chunks are valid UTF-8
            pem.push_str(&String::from_utf8_lossy(chunk));
            pem.push('\n');
        }
        pem.push_str("-----END CERTIFICATE-----\n");
        pem
    }

    /// Decode into an OpenSSL X.509 object for signature validation.
    #[cfg(feature = "x509")]
    pub fn to_x509(&self) -> SamlResult<openssl::x509::X509> {
        openssl::x509::X509::from_pem(self.to_pem().as_bytes())
            .map_err(|e| SamlError::Certificate(format!("Failed to decode IdP certificate: {e}")))
    }
}

impl fmt::Display for IdpCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip PEM armor lines and whitespace from a certificate.
pub fn strip_pem_headers(pem: &str) -> String {
    pem.lines()
        .filter(|line| !line.trim_start().starts_with("-----"))
        .flat_map(|line| line.split_whitespace())
        .collect()
}

/// Read a PEM certificate file and return its body for embedding in metadata.
pub fn read_certificate_body(path: &Path) -> SamlResult<String> {
    let pem = std::fs::read_to_string(path).map_err(|e| {
        tracing::error!(error = %e, path = %path.display(), "Failed to read SP certificate");
        SamlError::Certificate(format!("Failed to read {}: {e}", path.display()))
    })?;

    let body = strip_pem_headers(&pem);
    if body.is_empty() {
        return Err(SamlError::Certificate(format!(
            "{} contains no certificate data",
            path.display()
        )));
    }
    Ok(body)
}
