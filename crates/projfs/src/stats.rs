//! Provider statistics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Running counters for a provider instance. All counters are plain atomics
/// so callbacks can bump them without locking.
#[derive(Debug, Default)]
pub struct ProviderStats {
    pub placeholder_requests: AtomicU64,
    pub file_data_requests: AtomicU64,
    pub directory_enumerations: AtomicU64,
    pub enumeration_callbacks: AtomicU64,
    pub active_enumerations: AtomicU64,
    pub bytes_read: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
}

impl ProviderStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a point-in-time snapshot.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            placeholder_requests: self.placeholder_requests.load(Ordering::Relaxed),
            file_data_requests: self.file_data_requests.load(Ordering::Relaxed),
            directory_enumerations: self.directory_enumerations.load(Ordering::Relaxed),
            enumeration_callbacks: self.enumeration_callbacks.load(Ordering::Relaxed),
            active_enumerations: self.active_enumerations.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of provider counters, shaped for host consumption.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub placeholder_requests: u64,
    pub file_data_requests: u64,
    pub directory_enumerations: u64,
    pub enumeration_callbacks: u64,
    pub active_enumerations: u64,
    pub bytes_read: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}
