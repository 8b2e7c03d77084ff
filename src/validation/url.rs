//! Metadata locator validation.
//!
//! Classifies a configured IdP metadata locator into the transport used to
//! dereference it before any request is made.

use std::path::PathBuf;

/// Errors from URL validation.
#[derive(Debug, thiserror::Error)]
pub enum UrlValidationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("URL scheme must be http, https, or file")]
    InvalidScheme,

    #[error("URL must use https")]
    HttpsRequired,

    #[error("URL must include a hostname")]
    MissingHost,
}

/// Where IdP metadata is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataSource {
    /// Plain HTTP URL.
    Http(url::Url),
    /// HTTPS URL.
    Https(url::Url),
    /// Local file, given either as a `file://` URL or a bare path.
    File(PathBuf),
}

impl MetadataSource {
    /// Classify a metadata locator.
    ///
    /// Absolute URLs are dispatched on their scheme. Anything that does not
    /// parse as an absolute URL is treated as a filesystem path.
    pub fn parse(locator: &str) -> Result<Self, UrlValidationError> {
        let parsed = match url::Url::parse(locator) {
            Ok(parsed) => parsed,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                if locator.trim().is_empty() {
                    return Err(UrlValidationError::InvalidUrl("empty locator".into()));
                }
                return Ok(Self::File(PathBuf::from(locator)));
            }
            Err(e) => return Err(UrlValidationError::InvalidUrl(e.to_string())),
        };

        match parsed.scheme() {
            "http" | "https" => {
                if parsed.host_str().is_none() {
                    return Err(UrlValidationError::MissingHost);
                }
                if parsed.scheme() == "https" {
                    Ok(Self::Https(parsed))
                } else {
                    Ok(Self::Http(parsed))
                }
            }
            "file" => parsed.to_file_path().map(Self::File).map_err(|()| {
                UrlValidationError::InvalidUrl(format!("not a local file URL: {locator}"))
            }),
            _ => Err(UrlValidationError::InvalidScheme),
        }
    }
}

/// Validate that a URL uses HTTPS scheme.
pub fn require_https(url: &str) -> Result<(), UrlValidationError> {
    let parsed = url::Url::parse(url).map_err(|e| UrlValidationError::InvalidUrl(e.to_string()))?;
    if parsed.scheme() != "https" {
        return Err(UrlValidationError::HttpsRequired);
    }
    Ok(())
}
