//! rowcache - Row-level cache strategy for data-access layers
//!
//! Caches single-row lookups between a data-access layer and its persistent
//! store, and invalidates them on delete, update and batch mutation.
//!
//! ## Architecture
//!
//! - `cache` - Backend contract and the in-process Moka backend
//! - `directive` - Per-method caching directives, declared up front
//! - `key` - Namespaced cache key construction
//! - `strategy` - The before/after query hooks
//! - `dao` - Data-access pipeline that drives the hooks
//! - `config` - Environment configuration
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use rowcache::cache::MemoryBackend;
//! use rowcache::directive::{DirectiveRegistry, DirectiveResolver};
//! use rowcache::key::KeyBuilder;
//! use rowcache::strategy::RowStrategy;
//!
//! let registry = DirectiveRegistry::builder()
//!     .entity("user", |e| {
//!         e.primary_get("get", "id")
//!             .reference_get("getByName", ["name"], "get")
//!     })
//!     .build();
//!
//! let backend = Arc::new(MemoryBackend::default());
//! let strategy = RowStrategy::new(backend, DirectiveResolver::new(registry), KeyBuilder::default());
//! ```

pub mod cache;
pub mod config;
pub mod dao;
pub mod directive;
pub mod error;
pub mod key;
pub mod strategy;

pub use cache::{CacheBackend, MemoryBackend, MemoryConfig};
pub use config::Settings;
pub use dao::{CachedDao, EntityAccessor, Row};
pub use directive::{Directive, DirectiveDecl, DirectiveRegistry, DirectiveResolver};
pub use error::{BackendError, ConfigError, DirectiveError};
pub use key::KeyBuilder;
pub use strategy::{RowStrategy, StatsSnapshot};
