//! Cache backends.
//!
//! The strategy talks to its backend only through [`CacheBackend`]: get, set
//! and delete by string key. Any networked store with single-key atomicity
//! fits behind it. [`MemoryBackend`] is the in-process implementation on top
//! of Moka.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use rowcache::cache::{MemoryBackend, MemoryConfig};
//!
//! // The owner keeps the handle; the strategy gets a clone.
//! let backend = Arc::new(MemoryBackend::new(MemoryConfig::with_capacity(50_000)));
//! ```

mod backend;
mod config;
mod memory;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::CacheBackend;
pub use config::MemoryConfig;
pub use memory::MemoryBackend;
