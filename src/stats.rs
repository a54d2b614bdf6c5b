//! Per-stage counters
//!
//! Each Filter or Handler instance owns its counters. A single instance may
//! serve many concurrent processing attempts, so updates go through a mutex;
//! `reset` is idempotent and never fails, even if a previous holder panicked.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Named counters owned by one stage instance.
#[derive(Debug, Default)]
pub struct Stats {
    counters: Mutex<BTreeMap<String, u64>>,
}

impl Stats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(&self, name: &str) {
        self.incr_by(name, 1);
    }

    pub fn incr_by(&self, name: &str, n: u64) {
        let mut counters = self.lock();
        let slot = counters.entry(name.to_string()).or_insert(0);
        *slot = slot.saturating_add(n);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> u64 {
        self.lock().get(name).copied().unwrap_or(0)
    }

    /// Consistent view of all counters at one instant.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.lock().clone()
    }

    /// Zero every counter. Has no side effect beyond that and may be called
    /// any number of times.
    pub fn reset(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, u64>> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
