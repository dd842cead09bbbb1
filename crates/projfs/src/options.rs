//! Configuration options for the provider.

use std::time::Duration;

/// Configuration for a provider instance.
#[derive(Debug, Clone)]
pub struct ProviderOptions {
    /// ProjFS pool thread count (0 = let ProjFS decide).
    pub pool_thread_count: u32,

    /// ProjFS concurrent thread count (0 = let ProjFS decide).
    pub concurrent_thread_count: u32,

    /// Worker threads for the host-call dispatcher runtime.
    pub worker_threads: usize,

    /// Time-to-live for cache entries.
    pub cache_ttl: Duration,

    /// How long an enumeration waits for the host to deliver a listing.
    pub directory_fetch_timeout: Duration,

    /// Cache poll interval while waiting for a listing.
    pub directory_poll_interval: Duration,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            pool_thread_count: 0,
            concurrent_thread_count: 0,
            worker_threads: 4,
            cache_ttl: Duration::from_secs(3600),
            directory_fetch_timeout: Duration::from_secs(5),
            directory_poll_interval: Duration::from_millis(100),
        }
    }
}

impl ProviderOptions {
    /// Set the cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the dispatcher worker thread count.
    pub fn with_worker_threads(mut self, count: usize) -> Self {
        self.worker_threads = count;
        self
    }

    /// Set the directory fetch timeout.
    pub fn with_directory_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.directory_fetch_timeout = timeout;
        self
    }

    /// Set the directory poll interval.
    pub fn with_directory_poll_interval(mut self, interval: Duration) -> Self {
        self.directory_poll_interval = interval;
        self
    }
}
