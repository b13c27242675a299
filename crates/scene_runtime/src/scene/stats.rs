//! Publication counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Tick and publication counters shared between the simulation thread and
/// consumers
#[derive(Debug, Default)]
pub struct PublicationStats {
    ticks: AtomicU64,
    published: AtomicU64,
    skipped: AtomicU64,
}

/// Point-in-time copy of [`PublicationStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublicationSnapshot {
    /// Steps taken
    pub ticks: u64,
    /// Steps that published a new snapshot
    pub published: u64,
    /// Steps that found the lock taken and skipped publishing
    pub skipped: u64,
}

impl PublicationStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters
    pub fn snapshot(&self) -> PublicationSnapshot {
        PublicationSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}
