//! Data-access side of the hook contract.
//!
//! A data-access object names its entity type through [`EntityAccessor`] and
//! runs every query and mutation through a [`CachedDao`], which calls the
//! strategy hooks at the documented points:
//! - before a read query executes, and after it returns
//! - after a single-row delete or update
//! - after a batch mutation naming the affected identities

mod cached;

pub use cached::CachedDao;

use serde_json::{Map, Value};

/// A row as returned by the persistent store: field name to scalar value.
pub type Row = Map<String, Value>;

/// Anything that stands for one entity type (a table, a collection).
pub trait EntityAccessor {
    /// Stable type identifier, used as the entity segment of cache keys.
    fn entity_type(&self) -> &str;
}

impl EntityAccessor for str {
    fn entity_type(&self) -> &str {
        self
    }
}

impl EntityAccessor for String {
    fn entity_type(&self) -> &str {
        self
    }
}
