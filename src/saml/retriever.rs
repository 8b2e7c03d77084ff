//! IdP metadata retrieval.

use std::path::Path;

use super::{
    cache::SharedMetadataCache,
    constants::XML_NAMESPACE_DECLARATION,
    error::{SamlError, SamlResult},
    idp_metadata::IdpMetadata,
};
use crate::{
    config::MetadataFetchConfig,
    validation::{MetadataSource, require_https},
};

/// Fetches and parses IdP metadata from a URL or a local file.
///
/// Each call to [`retrieve`](Self::retrieve) performs one network round trip
/// (or file read) unless a cache is attached and holds a fresh copy. There is
/// no retry; timeouts apply only when configured on the HTTP client.
#[derive(Clone)]
pub struct MetadataRetriever {
    http_client: reqwest::Client,
    cache: Option<SharedMetadataCache>,
    require_https: bool,
}

impl MetadataRetriever {
    /// Create a retriever with an HTTP client built from `config`.
    pub fn new(config: &MetadataFetchConfig) -> SamlResult<Self> {
        let http_client = config.build_client().map_err(|e| {
            SamlError::Configuration(format!("Failed to build metadata HTTP client: {e}"))
        })?;

        Ok(Self {
            http_client,
            cache: None,
            require_https: config.require_https,
        })
    }

    /// Create a retriever with a custom HTTP client.
    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            cache: None,
            require_https: false,
        }
    }

    /// Attach a metadata cache.
    pub fn with_cache(mut self, cache: SharedMetadataCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Refuse plain `http://` locators.
    pub fn with_https_required(mut self, require_https: bool) -> Self {
        self.require_https = require_https;
        self
    }

    pub fn cache(&self) -> Option<&SharedMetadataCache> {
        self.cache.as_ref()
    }

    /// Retrieve and parse the metadata document at `locator`.
    pub async fn retrieve(&self, locator: &str) -> SamlResult<IdpMetadata> {
        if let Some(cache) = &self.cache
            && let Some(text) = cache.get(locator).await
        {
            match parse_metadata_text(&text) {
                Ok(metadata) => {
                    tracing::debug!(source = %locator, "Using cached SAML IdP metadata");
                    return Ok(metadata);
                }
                Err(e) => {
                    tracing::warn!(error = %e, source = %locator, "Cached SAML metadata is invalid, refetching");
                }
            }
        }

        let text = self.load(locator).await?;
        let metadata = parse_metadata_text(&text)?;

        if let Some(cache) = &self.cache {
            cache.put(locator, text).await;
        }

        Ok(metadata)
    }

    async fn load(&self, locator: &str) -> SamlResult<String> {
        let source = MetadataSource::parse(locator).inspect_err(|e| {
            tracing::error!(error = %e, source = %locator, "Unsupported SAML metadata source");
        })?;

        match source {
            MetadataSource::Http(url) | MetadataSource::Https(url) => {
                if self.require_https {
                    require_https(url.as_str()).map_err(|e| {
                        SamlError::Retrieval(format!("SAML metadata URL must use HTTPS: {e}"))
                    })?;
                }
                self.fetch(url).await
            }
            MetadataSource::File(path) => read_file(&path).await,
        }
    }

    async fn fetch(&self, url: url::Url) -> SamlResult<String> {
        tracing::debug!(url = %url, "Fetching SAML IdP metadata");

        let response = self.http_client.get(url.clone()).send().await.map_err(|e| {
            tracing::error!(error = %e, url = %url, "Failed to fetch SAML metadata");
            SamlError::Retrieval(format!("Failed to fetch {url}: {e}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!(status = %status, url = %url, "SAML metadata endpoint returned error");
            return Err(SamlError::Retrieval(format!(
                "SAML metadata endpoint {url} returned {status}"
            )));
        }

        response.text().await.map_err(|e| {
            tracing::error!(error = %e, url = %url, "Failed to read SAML metadata response");
            SamlError::Retrieval(format!("Failed to read SAML metadata from {url}: {e}"))
        })
    }
}

async fn read_file(path: &Path) -> SamlResult<String> {
    tracing::debug!(path = %path.display(), "Reading SAML IdP metadata file");

    tokio::fs::read_to_string(path).await.map_err(|e| {
        tracing::error!(error = %e, path = %path.display(), "Failed to read SAML metadata file");
        SamlError::Retrieval(format!("Failed to read {}: {e}", path.display()))
    })
}

/// Parse metadata text after removing a redundant `xmlns:xml` declaration.
pub(crate) fn parse_metadata_text(text: &str) -> SamlResult<IdpMetadata> {
    let text = text.replacen(XML_NAMESPACE_DECLARATION, "", 1);
    IdpMetadata::parse(&text).inspect_err(|e| {
        tracing::error!(error = %e, "Failed to parse SAML metadata");
    })
}
