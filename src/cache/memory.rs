//! In-process backend on top of Moka.

use std::sync::Arc;

use moka::sync::Cache;
use tracing::debug;

use super::{CacheBackend, MemoryConfig};
use crate::config::Settings;
use crate::error::BackendError;

/// A [`CacheBackend`] held in process memory.
///
/// Cloning is cheap and shares the same underlying cache. Useful for a single
/// node, for tests, and as a near cache in front of nothing at all.
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<Cache<String, String>>,
}

impl MemoryBackend {
    pub fn new(config: MemoryConfig) -> Self {
        let mut builder = Cache::builder().max_capacity(config.max_capacity);

        if let Some(ttl) = config.ttl {
            builder = builder.time_to_live(ttl);
        }

        if let Some(tti) = config.tti {
            builder = builder.time_to_idle(tti);
        }

        debug!(
            "Memory backend created (capacity {}, ttl {:?}, tti {:?})",
            config.max_capacity, config.ttl, config.tti
        );

        Self {
            inner: Arc::new(builder.build()),
        }
    }

    /// Backend sized by the `memory` part of `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.memory.clone())
    }

    /// Check if a key exists.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Remove all entries.
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Number of entries.
    ///
    /// Note: This may not be perfectly accurate due to concurrent operations.
    pub fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}

impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        Ok(self.inner.get(key))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), BackendError> {
        self.inner.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), BackendError> {
        self.inner.invalidate(key);
        Ok(())
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("entry_count", &self.inner.entry_count())
            .finish()
    }
}
