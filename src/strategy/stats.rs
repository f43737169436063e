//! Strategy counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Running counters of a [`RowStrategy`](super::RowStrategy).
#[derive(Debug, Default)]
pub struct StrategyStats {
    hits: AtomicU64,
    misses: AtomicU64,
    backend_faults: AtomicU64,
    metadata_faults: AtomicU64,
    invalidations: AtomicU64,
}

impl StrategyStats {
    pub(crate) fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn backend_fault(&self) {
        self.backend_faults.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn metadata_fault(&self) {
        self.metadata_faults.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn invalidated(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            backend_faults: self.backend_faults.load(Ordering::Relaxed),
            metadata_faults: self.metadata_faults.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`StrategyStats`].
///
/// Only lookups on cached methods count as hits or misses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub backend_faults: u64,
    pub metadata_faults: u64,
    /// Primary entries deleted by delete, update and wave hooks.
    pub invalidations: u64,
}

impl StatsSnapshot {
    /// Hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
