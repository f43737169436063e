//! Query pipeline that wraps store calls with the strategy hooks.

use std::future::Future;

use anyhow::Result;
use serde_json::Value;
use tracing::debug;

use super::{EntityAccessor, Row};
use crate::cache::CacheBackend;
use crate::strategy::RowStrategy;

/// Runs the queries of one entity through a [`RowStrategy`].
///
/// Store calls are supplied as closures. Their errors pass through untouched;
/// the cache never adds errors of its own. Mutations invalidate only after
/// the store reported success.
pub struct CachedDao<'a, B, A: ?Sized> {
    strategy: &'a RowStrategy<B>,
    entity: &'a A,
}

impl<'a, B, A> CachedDao<'a, B, A>
where
    B: CacheBackend,
    A: EntityAccessor + ?Sized,
{
    pub fn new(strategy: &'a RowStrategy<B>, entity: &'a A) -> Self {
        Self { strategy, entity }
    }

    pub fn entity_type(&self) -> &str {
        self.entity.entity_type()
    }

    /// Single-row read: cache first, then `fetch` on a miss.
    pub async fn get<F, Fut>(&self, method: &str, args: &[Value], fetch: F) -> Result<Option<Row>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<Row>>>,
    {
        if let Some(row) = self.strategy.before_query(self.entity, method, args).await {
            return Ok(Some(row));
        }

        let row = fetch().await?;
        debug!(
            "Store get {}.{}: {:?}",
            self.entity_type(),
            method,
            row.is_some()
        );

        self.strategy
            .after_query(self.entity, method, args, row.as_ref())
            .await;

        Ok(row)
    }

    /// Delete the row with identity `id`.
    pub async fn delete<F, Fut>(&self, id: Value, exec: F) -> Result<u64>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<u64>>,
    {
        let deleted = exec().await?;
        self.strategy
            .after_delete(self.entity, "delete", std::slice::from_ref(&id))
            .await;
        Ok(deleted)
    }

    /// Update the row with identity `id`.
    pub async fn update<F, Fut, T>(&self, id: Value, exec: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let updated = exec().await?;
        self.strategy
            .after_update(self.entity, "update", std::slice::from_ref(&id))
            .await;
        Ok(updated)
    }

    /// Batch mutation over `ids`. `exec` returns the affected row count.
    pub async fn wave<F, Fut>(&self, ids: Vec<Value>, exec: F) -> Result<u64>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<u64>>,
    {
        let affected = exec().await?;
        self.strategy
            .after_wave(self.entity, "wave", &[Value::Array(ids)], affected)
            .await;
        Ok(affected)
    }
}
