//! TTL cache for file metadata, directory listings, and small contents.
//!
//! Three independent path-keyed stores behind a single readers-writer lock.
//! Reads treat expired entries as absent; expired entries are physically
//! dropped by opportunistic pruning on the write path, so the stores may
//! temporarily exceed their size thresholds.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::types::{DirectoryListing, FileContent, FileInfo};

/// Contents above this size are never cached.
pub const MAX_CACHED_CONTENT_BYTES: usize = 1024 * 1024;

/// Every this many file-info inserts, expired file-info entries are pruned.
const FILE_INFO_PRUNE_INTERVAL: u64 = 100;

/// Listing-store size that triggers a prune.
const MAX_DIRECTORY_ENTRIES: usize = 1000;

/// Content-store size that triggers a prune.
const MAX_CONTENT_ENTRIES: usize = 100;

/// A cached payload with its insertion timestamp.
struct CacheEntry<T> {
    data: T,
    stored_at: Instant,
}

impl<T> CacheEntry<T> {
    fn new(data: T) -> Self {
        Self {
            data,
            stored_at: Instant::now(),
        }
    }

    fn is_valid(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

struct CacheInner {
    ttl: Duration,
    file_info: HashMap<String, CacheEntry<FileInfo>>,
    directories: HashMap<String, CacheEntry<DirectoryListing>>,
    contents: HashMap<String, CacheEntry<FileContent>>,
}

/// Cache statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Total entries across all three stores, including expired ones not
    /// yet pruned.
    pub entries: usize,
    /// Approximate memory usage of keys and payloads, in bytes.
    pub memory_usage: usize,
}

/// Thread-safe TTL cache shared by the engine and the host bridge.
pub struct ContentCache {
    inner: RwLock<CacheInner>,
    hits: AtomicU64,
    misses: AtomicU64,
    info_inserts: AtomicU64,
}

impl ContentCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(CacheInner {
                ttl,
                file_info: HashMap::new(),
                directories: HashMap::new(),
                contents: HashMap::new(),
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            info_inserts: AtomicU64::new(0),
        }
    }

    /// Change the TTL applied to all subsequent validity checks.
    pub fn set_ttl(&self, ttl: Duration) {
        self.inner.write().ttl = ttl;
    }

    pub fn set_file_info(&self, path: &str, info: FileInfo) {
        let mut inner = self.inner.write();
        inner.file_info.insert(path.to_string(), CacheEntry::new(info));

        let inserts: u64 = self.info_inserts.fetch_add(1, Ordering::Relaxed) + 1;
        if inserts % FILE_INFO_PRUNE_INTERVAL == 0 {
            let ttl: Duration = inner.ttl;
            prune_expired(&mut inner.file_info, ttl);
        }
    }

    pub fn get_file_info(&self, path: &str) -> Option<FileInfo> {
        let inner = self.inner.read();
        match inner.file_info.get(path) {
            Some(entry) if entry.is_valid(inner.ttl) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.data.clone())
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn set_directory_listing(&self, path: &str, listing: DirectoryListing) {
        let mut inner = self.inner.write();
        tracing::debug!(
            "cached directory listing for {} ({} entries)",
            path,
            listing.entries.len()
        );
        inner
            .directories
            .insert(path.to_string(), CacheEntry::new(listing));

        if inner.directories.len() > MAX_DIRECTORY_ENTRIES {
            let ttl: Duration = inner.ttl;
            prune_expired(&mut inner.directories, ttl);
        }
    }

    pub fn get_directory_listing(&self, path: &str) -> Option<DirectoryListing> {
        let inner = self.inner.read();
        match inner.directories.get(path) {
            Some(entry) if entry.is_valid(inner.ttl) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.data.clone())
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn set_file_content(&self, path: &str, content: FileContent) {
        if content.data.len() > MAX_CACHED_CONTENT_BYTES {
            tracing::debug!(
                "not caching {} byte content for {}",
                content.data.len(),
                path
            );
            return;
        }

        let mut inner = self.inner.write();
        inner.contents.insert(path.to_string(), CacheEntry::new(content));

        if inner.contents.len() > MAX_CONTENT_ENTRIES {
            let ttl: Duration = inner.ttl;
            prune_expired(&mut inner.contents, ttl);
        }
    }

    pub fn get_file_content(&self, path: &str) -> Option<FileContent> {
        let inner = self.inner.read();
        match inner.contents.get(path) {
            Some(entry) if entry.is_valid(inner.ttl) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.data.clone())
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Drop a path from all three stores, plus its parent's directory
    /// listing so a stale parent cannot outlive a child invalidation.
    pub fn invalidate_path(&self, path: &str) {
        let mut inner = self.inner.write();
        inner.file_info.remove(path);
        inner.directories.remove(path);
        inner.contents.remove(path);

        if let Some(idx) = path.rfind('/') {
            let parent: &str = if idx == 0 { "/" } else { &path[..idx] };
            inner.directories.remove(parent);
        }
    }

    /// Drop everything.
    pub fn invalidate_all(&self) {
        let mut inner = self.inner.write();
        inner.file_info.clear();
        inner.directories.clear();
        inner.contents.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.read();

        let mut memory_usage: usize = 0;
        for (path, entry) in &inner.file_info {
            memory_usage += path.len()
                + std::mem::size_of::<FileInfo>()
                + entry.data.name.len()
                + entry.data.hash.len();
        }
        for (path, entry) in &inner.directories {
            memory_usage += path.len() + std::mem::size_of::<DirectoryListing>();
            for info in &entry.data.entries {
                memory_usage += std::mem::size_of::<FileInfo>() + info.name.len() + info.hash.len();
            }
        }
        for (path, entry) in &inner.contents {
            memory_usage += path.len() + entry.data.data.len();
        }

        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: inner.file_info.len() + inner.directories.len() + inner.contents.len(),
            memory_usage,
        }
    }
}

fn prune_expired<T>(store: &mut HashMap<String, CacheEntry<T>>, ttl: Duration) {
    store.retain(|_, entry| entry.is_valid(ttl));
}
