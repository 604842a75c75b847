//! The index cache contract (spec §4.2): a set of `(source, external_id)`
//! pairs already seen, consulted once per poll cycle before a producer
//! fetches content and updated once after. The concrete storage-backed
//! implementation lives in `infobserver_store::PostgresIndexCache`; this
//! crate only defines the seam so `infobserver_sources` can depend on it
//! without depending on diesel or a database.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::IndexCacheError;
use crate::event::SourceTag;

/// Tracks which external ids have already been observed for a given source,
/// so a producer never re-fetches or re-matches the same upstream item
/// twice.
#[async_trait]
pub trait IndexCache: Send + Sync {
    /// Returns every external id already recorded for `source`.
    async fn known(&self, source: SourceTag) -> Result<HashSet<String>, IndexCacheError>;

    /// Records `external_ids` as seen for `source`. Idempotent: recording an
    /// id already present is a no-op.
    async fn remember(&self, source: SourceTag, external_ids: &[String]) -> Result<(), IndexCacheError>;
}

/// An in-memory [`IndexCache`], used by source unit tests and by
/// [`infobserver_app`] when no Postgres pool is configured for a dry run.
#[derive(Default)]
pub struct InMemoryIndexCache {
    seen: tokio::sync::Mutex<std::collections::HashMap<SourceTag, HashSet<String>>>,
}

impl InMemoryIndexCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IndexCache for InMemoryIndexCache {
    async fn known(&self, source: SourceTag) -> Result<HashSet<String>, IndexCacheError> {
        let guard = self.seen.lock().await;
        Ok(guard.get(&source).cloned().unwrap_or_default())
    }

    async fn remember(&self, source: SourceTag, external_ids: &[String]) -> Result<(), IndexCacheError> {
        let mut guard = self.seen.lock().await;
        guard
            .entry(source)
            .or_default()
            .extend(external_ids.iter().cloned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn remembers_across_calls() {
        let cache = InMemoryIndexCache::new();
        assert!(cache.known(SourceTag::Gist).await.unwrap().is_empty());

        cache
            .remember(SourceTag::Gist, &["a".to_string(), "b".to_string()])
            .await
            .unwrap();

        let known = cache.known(SourceTag::Gist).await.unwrap();
        assert!(known.contains("a"));
        assert!(known.contains("b"));
        assert!(cache.known(SourceTag::Pastebin).await.unwrap().is_empty());
    }
}
