//! In-process backend sizing.

use std::time::Duration;

/// Capacity and expiry of a [`MemoryBackend`](super::MemoryBackend).
///
/// Expiry only bounds how long a row may sit unread or unchanged in memory;
/// correctness after a write comes from the invalidation hooks, not from it.
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Entry count past which Moka starts evicting.
    pub max_capacity: u64,

    /// Age at which an entry is dropped, counted from its last write.
    pub ttl: Option<Duration>,

    /// Age at which an entry is dropped, counted from its last read.
    pub tti: Option<Duration>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            ttl: Some(Duration::from_secs(300)),
            tti: None,
        }
    }
}

impl MemoryConfig {
    /// Default expiry, `max_capacity` entries.
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self {
            max_capacity,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn ttl(mut self, duration: Duration) -> Self {
        self.ttl = Some(duration);
        self
    }

    #[must_use]
    pub fn tti(mut self, duration: Duration) -> Self {
        self.tti = Some(duration);
        self
    }

    /// Keep rows until capacity pushes them out.
    #[must_use]
    pub fn no_ttl(mut self) -> Self {
        self.ttl = None;
        self
    }
}
