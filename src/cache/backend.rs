//! Cache backend contract.

use std::future::Future;
use std::sync::Arc;

use crate::error::BackendError;

/// A key-value store reachable by string key.
///
/// Values are plain strings: primary entries hold a JSON-encoded row, pointer
/// entries hold a primary key verbatim. Single-key atomicity is all the
/// strategy relies on. Expiry and connection handling are the backend's own
/// business.
pub trait CacheBackend: Send + Sync {
    /// Read a value. `Ok(None)` means absent.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, BackendError>> + Send;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Remove a value. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), BackendError>> + Send;
}

// Shared client handles: the owner keeps an `Arc` and hands a clone to the strategy.
impl<B: CacheBackend> CacheBackend for Arc<B> {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, BackendError>> + Send {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<(), BackendError>> + Send {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> impl Future<Output = Result<(), BackendError>> + Send {
        (**self).delete(key)
    }
}
