//! Backend doubles for tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use super::{CacheBackend, MemoryBackend};
use crate::error::BackendError;

/// Fails every call.
#[derive(Debug, Default)]
pub struct FaultyBackend;

impl CacheBackend for FaultyBackend {
    async fn get(&self, _key: &str) -> Result<Option<String>, BackendError> {
        Err(BackendError::Unavailable("connection refused".into()))
    }

    async fn set(&self, _key: &str, _value: String) -> Result<(), BackendError> {
        Err(BackendError::Timeout { millis: 50 })
    }

    async fn delete(&self, _key: &str) -> Result<(), BackendError> {
        Err(BackendError::Unavailable("connection reset".into()))
    }
}

/// Memory backend that counts calls.
#[derive(Debug, Default)]
pub struct CountingBackend {
    pub inner: MemoryBackend,
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl CountingBackend {
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::Relaxed)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::Relaxed)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::Relaxed)
    }
}

impl CacheBackend for CountingBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        self.gets.fetch_add(1, Ordering::Relaxed);
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), BackendError> {
        self.sets.fetch_add(1, Ordering::Relaxed);
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), BackendError> {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        self.inner.delete(key).await
    }
}
