//! A per-pass memoizing wrapper around another provider.

use crate::collection::{CollectionProvider, ProviderError, SharedRows};
use bindery_types::FieldSchema;
use std::collections::HashMap;
use std::sync::RwLock;

/// Memoizes `query` results so one render pass sees one consistent view of
/// each table and hits the underlying provider at most once per name.
///
/// Build one per render pass and drop it afterwards; it never invalidates.
#[derive(Debug)]
pub struct SnapshotProvider<'a> {
    inner: &'a dyn CollectionProvider,
    cache: RwLock<HashMap<String, Result<SharedRows, ProviderError>>>,
}

impl<'a> SnapshotProvider<'a> {
    pub fn new(inner: &'a dyn CollectionProvider) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Number of distinct collections queried so far.
    pub fn cached_len(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }
}

impl CollectionProvider for SnapshotProvider<'_> {
    fn query(&self, name: &str) -> Result<SharedRows, ProviderError> {
        if let Ok(cache) = self.cache.read()
            && let Some(hit) = cache.get(name)
        {
            return hit.clone();
        }

        let result = self.inner.query(name);
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(name.to_string(), result.clone());
        }
        result
    }

    fn exists(&self, name: &str) -> bool {
        self.query(name).is_ok()
    }

    fn schema(&self, name: &str) -> Result<Vec<FieldSchema>, ProviderError> {
        self.inner.schema(name)
    }

    fn name(&self) -> &'static str {
        "SnapshotProvider"
    }
}
