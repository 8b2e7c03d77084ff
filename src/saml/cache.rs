//! Storage seam for fetched IdP metadata.
//!
//! The retriever stores raw metadata text keyed by its locator. Host
//! applications can provide a shared store; `MemoryMetadataCache` covers the
//! single-process case.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use tokio::sync::RwLock;

/// Metadata text storage.
///
/// Implementations must be thread-safe. A store that cannot reach its backend
/// should log and return `None` from `get`, so the retriever fetches instead.
#[async_trait]
pub trait MetadataCache: Send + Sync {
    /// Cached metadata text for a locator, if present and fresh.
    async fn get(&self, source: &str) -> Option<String>;

    /// Store metadata text fetched from a locator.
    async fn put(&self, source: &str, text: String);
}

pub type SharedMetadataCache = Arc<dyn MetadataCache>;

struct CachedMetadata {
    text: String,
    fetched_at: Instant,
}

/// In-memory metadata cache with a fixed TTL.
///
/// Entries are not shared across processes and are lost on restart. Expired
/// entries are replaced on the next `put`.
pub struct MemoryMetadataCache {
    entries: RwLock<HashMap<String, CachedMetadata>>,
    ttl: Duration,
}

impl MemoryMetadataCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }
}

#[async_trait]
impl MetadataCache for MemoryMetadataCache {
    async fn get(&self, source: &str) -> Option<String> {
        let entries = self.entries.read().await;
        entries
            .get(source)
            .filter(|cached| cached.fetched_at.elapsed() < self.ttl)
            .map(|cached| cached.text.clone())
    }

    async fn put(&self, source: &str, text: String) {
        let mut entries = self.entries.write().await;
        entries.insert(
            source.to_string(),
            CachedMetadata {
                text,
                fetched_at: Instant::now(),
            },
        );
    }
}
