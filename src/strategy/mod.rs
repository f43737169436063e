//! Row cache strategy.
//!
//! Single-row lookups are cached in two shapes that share the backend's value
//! space:
//! - a primary entry, `ns:entity:get:<id>`, holding the row as JSON
//! - a pointer entry, `ns:entity:<method>:<args>`, holding only the key of a
//!   primary entry
//!
//! A pointer never answers a read by itself. Resolving one always reads the
//! primary entry it names, so deleting a primary entry is enough to make every
//! pointer to it miss; pointers are never tracked or deleted. Once the primary
//! entry is refilled, a pointer only hits if the row still carries the values
//! the lookup was called with.
//!
//! No hook ever fails. Backend faults read as misses and failed writes are
//! dropped, so the caller always falls through to the store.

mod stats;

pub use stats::{StatsSnapshot, StrategyStats};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::CacheBackend;
use crate::config::Settings;
use crate::dao::{EntityAccessor, Row};
use crate::directive::{Directive, DirectiveRegistry, DirectiveResolver};
use crate::error::BackendError;
use crate::key::{self, KeyBuilder};

/// Caches single-row lookups around the queries of a data-access layer.
///
/// The backend is passed in by whoever owns it; hand over an `Arc` to share
/// one client between several strategies.
pub struct RowStrategy<B> {
    backend: B,
    resolver: DirectiveResolver,
    keys: KeyBuilder,
    stats: StrategyStats,
}

impl<B: CacheBackend> RowStrategy<B> {
    pub fn new(backend: B, resolver: DirectiveResolver, keys: KeyBuilder) -> Self {
        info!(
            "Row cache strategy initialized (namespace {}, enabled {})",
            keys.namespace(),
            resolver.is_enabled()
        );
        Self {
            backend,
            resolver,
            keys,
            stats: StrategyStats::default(),
        }
    }

    /// Build a strategy with the namespace and kill switch from `settings`.
    pub fn from_settings(backend: B, registry: DirectiveRegistry, settings: &Settings) -> Self {
        let resolver = if settings.enabled {
            DirectiveResolver::new(registry)
        } else {
            DirectiveResolver::disabled(registry)
        };
        Self::new(backend, resolver, KeyBuilder::new(settings.namespace.clone()))
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn resolver(&self) -> &DirectiveResolver {
        &self.resolver
    }

    pub fn keys(&self) -> &KeyBuilder {
        &self.keys
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Look the call up in the cache before the query runs.
    ///
    /// `Some(row)` is a hit and the query can be skipped; `None` is a miss.
    pub async fn before_query<A>(&self, entity: &A, method: &str, args: &[Value]) -> Option<Row>
    where
        A: EntityAccessor + ?Sized,
    {
        let entity_type = entity.entity_type();
        let directive = self.resolver.resolve(entity_type, method);

        let row = match &*directive {
            Directive::Uncached => return None,

            Directive::PrimaryGet { identity_arg, .. } => match args.get(*identity_arg) {
                Some(identity) => {
                    let key = self.keys.primary_key(entity_type, identity);
                    self.read_row(&key).await
                }
                None => {
                    warn!(
                        "{}.{} called with {} args, identity expected at {}",
                        entity_type,
                        method,
                        args.len(),
                        identity_arg
                    );
                    self.stats.metadata_fault();
                    None
                }
            },

            Directive::ReferenceGet { reference_fields, .. } => {
                let pointer_key = self.keys.call_key(entity_type, method, args);
                match self.read(&pointer_key).await {
                    Some(primary_key) if primary_key.starts_with(&self.keys.primary_prefix(entity_type)) => {
                        match self.read_row(&primary_key).await {
                            // A refilled primary entry may no longer carry the referenced values.
                            Some(row) if references_match(&row, reference_fields, args) => Some(row),
                            Some(_) => {
                                debug!("Pointer {} -> {} no longer matches its row", pointer_key, primary_key);
                                None
                            }
                            None => {
                                debug!("Dangling pointer {} -> {}", pointer_key, primary_key);
                                None
                            }
                        }
                    }
                    Some(other) => {
                        warn!("Pointer {} holds foreign key {}, ignoring", pointer_key, other);
                        None
                    }
                    None => None,
                }
            }
        };

        if row.is_some() {
            debug!("Cache hit for {}.{}", entity_type, method);
            self.stats.hit();
        } else {
            debug!("Cache miss for {}.{}", entity_type, method);
            self.stats.miss();
        }

        row
    }

    /// Populate the cache with the result of a query that missed.
    ///
    /// Empty results are never cached: a row created later must not be
    /// hidden behind a cached absence.
    pub async fn after_query<A>(&self, entity: &A, method: &str, args: &[Value], result: Option<&Row>)
    where
        A: EntityAccessor + ?Sized,
    {
        let entity_type = entity.entity_type();
        let directive = self.resolver.resolve(entity_type, method);

        let identity_field = match &*directive {
            Directive::Uncached => return,
            Directive::PrimaryGet { identity_field, .. } => identity_field,
            Directive::ReferenceGet { identity_field, .. } => identity_field,
        };

        let Some(row) = result.filter(|row| !row.is_empty()) else {
            return;
        };

        let Some(identity) = row.get(identity_field).filter(|v| !v.is_null()) else {
            warn!(
                "{}.{} result has no {} field, not caching",
                entity_type, method, identity_field
            );
            self.stats.metadata_fault();
            return;
        };

        let primary_key = self.keys.primary_key(entity_type, identity);
        let encoded = match serde_json::to_string(row) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!("Failed to encode {} row: {}", entity_type, e);
                return;
            }
        };

        if !self.write(&primary_key, encoded).await {
            return;
        }

        if let Directive::ReferenceGet { .. } = &*directive {
            let pointer_key = self.keys.call_key(entity_type, method, args);
            self.write(&pointer_key, primary_key).await;
        }
    }

    /// Invalidate the primary entry of a deleted row.
    ///
    /// Mutation hooks always receive the identity first: `args[0]`, whatever
    /// position the identity takes in the lookup methods' arguments.
    pub async fn after_delete<A>(&self, entity: &A, method: &str, args: &[Value])
    where
        A: EntityAccessor + ?Sized,
    {
        self.invalidate_identity(entity.entity_type(), method, args).await;
    }

    /// Invalidate the primary entry of an updated row.
    ///
    /// As with [`after_delete`](Self::after_delete), `args[0]` is the identity.
    pub async fn after_update<A>(&self, entity: &A, method: &str, args: &[Value])
    where
        A: EntityAccessor + ?Sized,
    {
        self.invalidate_identity(entity.entity_type(), method, args).await;
    }

    /// Invalidate every row touched by a batch mutation.
    ///
    /// `args[0]` lists the affected identities. `affected` is the store's
    /// reported row count and is only logged.
    pub async fn after_wave<A>(&self, entity: &A, method: &str, args: &[Value], affected: u64)
    where
        A: EntityAccessor + ?Sized,
    {
        let entity_type = entity.entity_type();

        let ids: &[Value] = match args.first() {
            Some(Value::Array(ids)) => ids.as_slice(),
            // A bare identity still names exactly one row.
            Some(id) if !id.is_null() => std::slice::from_ref(id),
            _ => {
                warn!("{}.{} wave without identities, nothing invalidated", entity_type, method);
                self.stats.metadata_fault();
                return;
            }
        };

        debug!(
            "{}.{} wave: invalidating {} ids ({} rows affected)",
            entity_type,
            method,
            ids.len(),
            affected
        );

        for id in ids {
            let key = self.keys.primary_key(entity_type, id);
            self.remove(&key).await;
        }
    }

    async fn invalidate_identity(&self, entity_type: &str, method: &str, args: &[Value]) {
        match args.first() {
            Some(id) if !id.is_null() => {
                let key = self.keys.primary_key(entity_type, id);
                self.remove(&key).await;
            }
            _ => {
                warn!("{}.{} without identity, nothing invalidated", entity_type, method);
                self.stats.metadata_fault();
            }
        }
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.backend.get(key).await {
            Ok(value) => value,
            Err(e) => {
                self.backend_fault("get", key, &e);
                None
            }
        }
    }

    async fn read_row(&self, key: &str) -> Option<Row> {
        let raw = self.read(key).await?;
        match serde_json::from_str::<Row>(&raw) {
            Ok(row) => Some(row),
            Err(source) => {
                let e = BackendError::Codec {
                    key: key.to_string(),
                    source,
                };
                self.backend_fault("decode", key, &e);
                None
            }
        }
    }

    async fn write(&self, key: &str, value: String) -> bool {
        match self.backend.set(key, value).await {
            Ok(()) => true,
            Err(e) => {
                self.backend_fault("set", key, &e);
                false
            }
        }
    }

    async fn remove(&self, key: &str) {
        match self.backend.delete(key).await {
            Ok(()) => self.stats.invalidated(),
            Err(e) => self.backend_fault("delete", key, &e),
        }
    }

    fn backend_fault(&self, op: &str, key: &str, e: &BackendError) {
        warn!("Cache {} failed for {}: {}", op, key, e);
        self.stats.backend_fault();
    }
}

/// Whether `row` still holds the values a reference lookup was called with.
fn references_match(row: &Row, reference_fields: &[String], args: &[Value]) -> bool {
    reference_fields.iter().enumerate().all(|(i, field)| match (row.get(field), args.get(i)) {
        (Some(value), Some(arg)) => key::segment(value) == key::segment(arg),
        _ => false,
    })
}

impl<B> std::fmt::Debug for RowStrategy<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowStrategy")
            .field("namespace", &self.keys.namespace())
            .field("resolver", &self.resolver)
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

#[cfg(test)]
mod tests;
