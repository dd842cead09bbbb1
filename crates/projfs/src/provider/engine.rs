//! Engine state machines behind the ProjFS callbacks.
//!
//! Everything here is platform-neutral: callbacks convert kernel arguments
//! to canonical virtual paths and delegate, and the host-facing surface
//! calls in from arbitrary threads. Answers come from the content cache,
//! from the object store for the `/objects` subtree, or asynchronously from
//! the host via the bridge.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use casfs_store::{ObjectKind, ObjectMetadata, ObjectStore};

use crate::bridge::{HostBridge, HostCallbacks};
use crate::cache::{CacheStats, ContentCache};
use crate::enumeration::{EnumerationId, EnumerationState, EnumerationTable, MAX_CALLS_PER_ENUM};
use crate::error::ProviderError;
use crate::options::ProviderOptions;
use crate::path::{canonical_virtual_path, is_single_segment, split_parent_leaf};
use crate::pending::{
    completion_outcome, slice_range, CommandId, Completion, PendingFileRequest,
    PendingRequestTable,
};
use crate::stats::{ProviderStats, StatsSnapshot};
use crate::types::{DirectoryListing, FileContent, FileInfo};
use crate::util::pattern::file_name_match;

/// Result of pushing one entry into the kernel's enumeration buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillResult {
    /// Entry accepted; advance the cursor.
    Filled,
    /// Buffer is full; keep the cursor so the entry is retried.
    BufferFull,
    /// Entry rejected for another reason; skip it and continue.
    Failed,
}

/// Receiver for enumeration batches. The Windows callback wraps the ProjFS
/// dir-entry buffer; tests substitute an in-memory sink.
pub trait DirEntrySink {
    fn fill(&mut self, name: &str, metadata: &ObjectMetadata) -> FillResult;
}

/// Outcome of a file-data read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Serve these bytes (possibly empty for reads at or past the end).
    Content(Vec<u8>),
    /// Nothing cached or on disk; the request parks and completes later.
    Pending,
}

/// Placeholder metadata for a host-described entry. The advisory
/// `is_blob_or_clob` flag never routes dispatch, so host entries all
/// surface with the generic file kind.
pub fn metadata_from_info(info: &FileInfo) -> ObjectMetadata {
    if info.is_directory {
        ObjectMetadata::directory()
    } else {
        ObjectMetadata::file(info.size, ObjectKind::File)
    }
}

/// The ProjFS provider engine.
///
/// Owns the object store, the shared cache, the host bridge, enumeration
/// sessions, and parked file requests. One instance serves one
/// virtualization root.
pub struct ProjfsProvider {
    pub(crate) store: ObjectStore,
    pub(crate) cache: Arc<ContentCache>,
    pub(crate) bridge: Arc<HostBridge>,
    pub(crate) enumerations: Arc<EnumerationTable>,
    pub(crate) pending: PendingRequestTable,
    /// Full bytes for oversized parked completions, staged by
    /// `set_cached_content` when the cache ceiling refuses them.
    pub(crate) staged: Mutex<HashMap<String, Vec<u8>>>,
    pub(crate) stats: ProviderStats,
    pub(crate) options: ProviderOptions,
    pub(crate) running: AtomicBool,
    /// Namespace virtualization context, set while started.
    #[cfg(windows)]
    pub(crate) context: parking_lot::RwLock<Option<super::sendable::SendableContext>>,
}

impl ProjfsProvider {
    /// Create a provider over the given store instance directory.
    ///
    /// Fails only when the store layout cannot be created.
    pub fn new(
        instance_path: impl AsRef<Path>,
        options: ProviderOptions,
    ) -> Result<Self, ProviderError> {
        let store: ObjectStore = ObjectStore::new(instance_path)?;
        let cache: Arc<ContentCache> = Arc::new(ContentCache::new(options.cache_ttl));
        let bridge: Arc<HostBridge> = Arc::new(HostBridge::new(cache.clone(), options.worker_threads));
        let enumerations: Arc<EnumerationTable> = Arc::new(EnumerationTable::new());

        // Listing updates wake enumeration waiters. The subscription
        // captures the table, not the provider, so no ownership cycle
        // forms through the bridge.
        let table: Arc<EnumerationTable> = enumerations.clone();
        bridge.set_listing_updated(move |path| table.mark_listing_ready(path));

        Ok(Self {
            store,
            cache,
            bridge,
            enumerations,
            pending: PendingRequestTable::new(),
            staged: Mutex::new(HashMap::new()),
            stats: ProviderStats::new(),
            options,
            running: AtomicBool::new(false),
            #[cfg(windows)]
            context: parking_lot::RwLock::new(None),
        })
    }

    /// Replace the registered host operations.
    pub fn register_callbacks(&self, callbacks: HostCallbacks) {
        self.bridge.register_callbacks(callbacks);
    }

    /// Whether virtualization is active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Point-in-time provider counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Point-in-time cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    // ------------------------------------------------------------------
    // Host-facing cache surface
    // ------------------------------------------------------------------

    /// Store a host-supplied directory listing and wake any enumeration
    /// callbacks waiting for it. Duplicate names are dropped, first
    /// occurrence wins; order is otherwise the host's.
    pub fn set_cached_directory(&self, path: &str, entries: Vec<FileInfo>) {
        let canonical: String = canonical_virtual_path(path);
        self.cache
            .set_directory_listing(&canonical, DirectoryListing::new(entries));
        self.enumerations.mark_listing_ready(&canonical);
    }

    /// Store host-supplied file metadata.
    pub fn set_cached_file_info(&self, path: &str, info: FileInfo) {
        let canonical: String = canonical_virtual_path(path);
        self.cache.set_file_info(&canonical, info);
    }

    /// Store host-supplied file content.
    ///
    /// Contents above the cache ceiling are additionally staged for any
    /// parked request on the same path, so oversized reads still complete.
    pub fn set_cached_content(&self, path: &str, data: Vec<u8>) {
        let canonical: String = canonical_virtual_path(path);

        if self.pending.has_path(&canonical) {
            self.staged.lock().insert(canonical.clone(), data.clone());
        }
        self.cache.set_file_content(&canonical, FileContent::new(data));
    }

    /// Drop a path (and its parent listing) from the cache.
    pub fn invalidate_cached_path(&self, path: &str) {
        let canonical: String = canonical_virtual_path(path);
        self.cache.invalidate_path(&canonical);
    }

    // ------------------------------------------------------------------
    // Placeholder resolution
    // ------------------------------------------------------------------

    /// Resolve placeholder metadata for a canonical virtual path.
    ///
    /// `None` means file-not-found was answered; when the path was unknown
    /// everywhere, a host fetch has been fired so the next request can hit
    /// the cache. Answering "pending" here hangs Explorer, so a first-touch
    /// miss always reads as not-found.
    pub fn resolve_placeholder(&self, virtual_path: &str) -> Option<ObjectMetadata> {
        self.stats.placeholder_requests.fetch_add(1, Ordering::Relaxed);

        // Root-level mountpoints answer from the cached root listing even
        // when their individual file-info entries were never cached.
        if is_single_segment(virtual_path) {
            if let Some(root) = self.cache.get_directory_listing("/") {
                let name: &str = &virtual_path[1..];
                if root.find(name).map(|e| e.is_directory).unwrap_or(false) {
                    tracing::debug!("root mountpoint placeholder for {}", virtual_path);
                    self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
                    return Some(ObjectMetadata::directory());
                }
            }
        }

        if let Some(info) = self.cache.get_file_info(virtual_path) {
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Some(metadata_from_info(&info));
        }

        if let Some((parent, leaf)) = split_parent_leaf(virtual_path) {
            if let Some(listing) = self.cache.get_directory_listing(parent) {
                if let Some(entry) = listing.find(leaf) {
                    self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
                    return Some(metadata_from_info(entry));
                }
            }
        }

        self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);

        if ObjectStore::is_object_path(virtual_path) {
            let metadata: ObjectMetadata = self.store.virtual_path_metadata(virtual_path);
            if metadata.exists {
                return Some(metadata);
            }
        }

        self.bridge.fetch_file_info(virtual_path);
        None
    }

    // ------------------------------------------------------------------
    // Directory enumeration
    // ------------------------------------------------------------------

    /// Begin an enumeration session.
    pub fn start_enumeration(&self, id: EnumerationId) {
        self.stats.active_enumerations.fetch_add(1, Ordering::Relaxed);

        if self.enumerations.insert_fresh(id) {
            tracing::warn!("enumeration identifier reused; state reset");
            self.bridge.emit_debug("enumeration identifier reused; state reset");
        }
    }

    /// Tear down an enumeration session.
    pub fn end_enumeration(&self, id: EnumerationId) {
        if self.enumerations.remove(id) {
            let _ = self
                .stats
                .active_enumerations
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
                    Some(v.saturating_sub(1))
                });
        }
    }

    /// Serve one `Get` callback of an enumeration session.
    ///
    /// Populates the session's entry snapshot on first use (cache, then
    /// object store for `/objects*`, then host fetch with a bounded cache
    /// poll) and fills the sink from the cursor. The call always reads as
    /// success to the kernel; an exhausted or aborted session simply
    /// produces an empty batch.
    pub fn enumeration_batch(
        &self,
        id: EnumerationId,
        virtual_path: &str,
        restart: bool,
        search_expression: Option<&str>,
        sink: &mut dyn DirEntrySink,
    ) {
        self.stats.directory_enumerations.fetch_add(1, Ordering::Relaxed);
        self.stats.enumeration_callbacks.fetch_add(1, Ordering::Relaxed);

        let mut states = self.enumerations.lock();

        if !states.contains_key(&id) {
            tracing::warn!(
                "get callback for unknown enumeration on {}; creating state",
                virtual_path
            );
            states.insert(id, EnumerationState::default());
        }

        let overrun: bool = {
            let state: &mut EnumerationState = states.get_mut(&id).expect("state ensured above");

            if restart {
                tracing::debug!("restart scan for {}", virtual_path);
                state.reset();
            }

            state.call_count += 1;
            if state.call_count > MAX_CALLS_PER_ENUM {
                state.is_complete = true;
                true
            } else {
                false
            }
        };
        if overrun {
            drop(states);
            tracing::warn!("enumeration loop suspected for {}; aborting", virtual_path);
            self.bridge
                .emit_debug(&format!("enumeration loop suspected for {}", virtual_path));
            return;
        }

        let needs_populate: bool = {
            let state: &EnumerationState = states.get(&id).expect("state ensured above");
            state.entries.is_empty() && !state.is_complete
        };

        if needs_populate {
            let already_loading: bool =
                states.get(&id).map(|s| s.is_loading).unwrap_or(false);

            if already_loading {
                // Another callback is fetching this directory; wait for it
                // and serve from whatever it produced.
                self.enumerations.wait_until_loaded(&mut states, id);
                match states.get(&id) {
                    None => return,
                    Some(state) if state.entries.is_empty() && !state.is_complete => return,
                    Some(_) => {}
                }
            } else {
                states.get_mut(&id).expect("state ensured above").is_loading = true;
                drop(states);

                let entries: Vec<FileInfo> = self.load_directory_entries(virtual_path);

                states = self.enumerations.lock();
                let state: &mut EnumerationState = states.entry(id).or_default();
                state.entries = entries;
                state.is_loading = false;
                state.is_complete = true;
                self.enumerations.notify_all();
            }
        }

        let Some(state) = states.get_mut(&id) else {
            return;
        };

        while state.next_index < state.entries.len() {
            let entry: &FileInfo = &state.entries[state.next_index];

            // Defensive: never hand the kernel a nameless entry.
            if entry.name.is_empty() {
                state.next_index += 1;
                continue;
            }

            if !file_name_match(&entry.name, search_expression) {
                state.next_index += 1;
                continue;
            }

            match sink.fill(&entry.name, &metadata_from_info(entry)) {
                FillResult::Filled => state.next_index += 1,
                // Keep the cursor; the kernel retries this entry with a
                // fresh buffer.
                FillResult::BufferFull => return,
                FillResult::Failed => {
                    tracing::warn!(
                        "dir entry fill failed for {} in {}; skipping",
                        entry.name,
                        virtual_path
                    );
                    state.next_index += 1;
                }
            }
        }

        state.is_complete = true;
    }

    /// Fetch the entry snapshot for a directory.
    fn load_directory_entries(&self, virtual_path: &str) -> Vec<FileInfo> {
        if let Some(listing) = self.cache.get_directory_listing(virtual_path) {
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            return listing.entries;
        }
        self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);

        if virtual_path == "/objects" || ObjectStore::is_object_path(virtual_path) {
            return self
                .store
                .list_directory(virtual_path)
                .into_iter()
                .map(|name| FileInfo {
                    name,
                    is_blob_or_clob: true,
                    ..Default::default()
                })
                .collect();
        }

        self.bridge.fetch_directory_listing(virtual_path);

        // The host call is fire-and-forget; poll the cache until the
        // listing lands or the window closes.
        let deadline: Instant = Instant::now() + self.options.directory_fetch_timeout;
        while Instant::now() < deadline {
            if let Some(listing) = self.cache.get_directory_listing(virtual_path) {
                self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
                return listing.entries;
            }
            std::thread::sleep(self.options.directory_poll_interval);
        }

        tracing::warn!("timed out waiting for directory listing of {}", virtual_path);
        self.bridge.emit_debug(&format!(
            "timed out waiting for directory listing of {}",
            virtual_path
        ));
        Vec::new()
    }

    // ------------------------------------------------------------------
    // File data
    // ------------------------------------------------------------------

    /// Serve a file-data request from the cache or the object store.
    ///
    /// Reads at or past the end succeed with zero bytes. A miss parks: the
    /// caller records a pending request and answers io-pending.
    pub fn read_file_data(&self, virtual_path: &str, byte_offset: u64, length: u32) -> ReadOutcome {
        self.stats.file_data_requests.fetch_add(1, Ordering::Relaxed);

        if let Some(content) = self.cache.get_file_content(virtual_path) {
            if !content.data.is_empty() {
                self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
                if byte_offset >= content.data.len() as u64 {
                    return ReadOutcome::Content(Vec::new());
                }
                let data: Vec<u8> = slice_range(&content.data, byte_offset, length);
                self.stats.bytes_read.fetch_add(data.len() as u64, Ordering::Relaxed);
                return ReadOutcome::Content(data);
            }
        }
        self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);

        if ObjectStore::is_object_path(virtual_path) {
            if let Some(rendered) = self.store.read_virtual_path(virtual_path) {
                if byte_offset >= rendered.len() as u64 {
                    return ReadOutcome::Content(Vec::new());
                }
                let data: Vec<u8> = slice_range(&rendered, byte_offset, length);
                self.stats.bytes_read.fetch_add(data.len() as u64, Ordering::Relaxed);
                return ReadOutcome::Content(data);
            }
        }

        ReadOutcome::Pending
    }

    /// Park a missed file-data request and fire the host fetch.
    pub fn park_file_request(&self, command_id: CommandId, request: PendingFileRequest) {
        let path: String = request.virtual_path.clone();
        self.pending.insert(command_id, request);
        self.bridge.fetch_file_content(&path);
    }

    /// Complete every parked request for a path from the now-available
    /// content. Returns the number of commands completed.
    pub fn complete_pending_file_requests(&self, virtual_path: &str) -> usize {
        let canonical: String = canonical_virtual_path(virtual_path);

        let staged: Option<Vec<u8>> = self.staged.lock().remove(&canonical);
        let matched: Vec<(CommandId, PendingFileRequest)> = self.pending.drain_matching(&canonical);
        if matched.is_empty() {
            return 0;
        }

        let content: Option<Vec<u8>> = self
            .cache
            .get_file_content(&canonical)
            .map(|c| c.data)
            .filter(|data| !data.is_empty())
            .or(staged);

        let mut completed: usize = 0;
        for (command_id, request) in matched {
            match completion_outcome(content.as_deref(), &request) {
                Completion::Data(data) => {
                    self.stats.bytes_read.fetch_add(data.len() as u64, Ordering::Relaxed);
                    self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
                    self.finish_command(&request, command_id, Some(data));
                }
                Completion::EmptyRange => {
                    self.finish_command(&request, command_id, None);
                }
                Completion::Missing => {
                    tracing::warn!(
                        "completing parked request {} for {} as not-found",
                        command_id,
                        canonical
                    );
                    self.fail_command(&request, command_id);
                }
            }
            completed += 1;
        }

        tracing::debug!("completed {} parked requests for {}", completed, canonical);
        completed
    }

    /// Kernel-side completion is a no-op off Windows; the bookkeeping
    /// above is everything the engine owns.
    #[cfg(not(windows))]
    pub(crate) fn finish_command(
        &self,
        _request: &PendingFileRequest,
        _command_id: CommandId,
        _data: Option<Vec<u8>>,
    ) {
    }

    #[cfg(not(windows))]
    pub(crate) fn fail_command(&self, _request: &PendingFileRequest, _command_id: CommandId) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    struct VecSink {
        filled: Vec<String>,
        capacity: usize,
    }

    impl VecSink {
        fn unbounded() -> Self {
            Self {
                filled: Vec::new(),
                capacity: usize::MAX,
            }
        }
    }

    impl DirEntrySink for VecSink {
        fn fill(&mut self, name: &str, _metadata: &ObjectMetadata) -> FillResult {
            if self.filled.len() >= self.capacity {
                return FillResult::BufferFull;
            }
            self.filled.push(name.to_string());
            FillResult::Filled
        }
    }

    fn provider() -> (TempDir, ProjfsProvider) {
        let dir: TempDir = TempDir::new().unwrap();
        let options: ProviderOptions = ProviderOptions::default()
            .with_directory_fetch_timeout(Duration::from_millis(300))
            .with_directory_poll_interval(Duration::from_millis(20));
        let provider: ProjfsProvider = ProjfsProvider::new(dir.path(), options).unwrap();
        (dir, provider)
    }

    #[test]
    fn test_placeholder_from_file_info_cache() {
        let (_dir, provider) = provider();
        provider.set_cached_file_info("/chats/msg1", FileInfo::file("msg1", "h", 42));

        let metadata: ObjectMetadata = provider.resolve_placeholder("/chats/msg1").unwrap();
        assert!(!metadata.is_directory);
        assert_eq!(metadata.size, 42);
        assert_eq!(provider.stats().cache_hits, 1);
    }

    #[test]
    fn test_placeholder_from_parent_listing() {
        let (_dir, provider) = provider();
        provider.set_cached_directory("/chats", vec![FileInfo::file("msg1", "h", 7)]);

        let before: u64 = provider.stats().cache_hits;
        let metadata: ObjectMetadata = provider.resolve_placeholder("/chats/msg1").unwrap();
        assert_eq!(metadata.size, 7);
        assert_eq!(provider.stats().cache_hits, before + 1);
    }

    #[test]
    fn test_placeholder_root_mountpoint_shortcut() {
        let (_dir, provider) = provider();
        provider.set_cached_directory(
            "/",
            vec![FileInfo::directory("chats"), FileInfo::file("notes.txt", "", 9)],
        );

        let metadata: ObjectMetadata = provider.resolve_placeholder("/chats").unwrap();
        assert!(metadata.is_directory);
        assert_eq!(metadata.size, 0);

        // Non-directory root entries take the ordinary parent-listing path.
        let file_meta: ObjectMetadata = provider.resolve_placeholder("/notes.txt").unwrap();
        assert!(!file_meta.is_directory);
        assert_eq!(file_meta.size, 9);
    }

    #[test]
    fn test_placeholder_miss_answers_not_found() {
        let (_dir, provider) = provider();
        assert!(provider.resolve_placeholder("/nowhere").is_none());
        assert_eq!(provider.stats().cache_misses, 1);
    }

    #[test]
    fn test_enumeration_from_cached_listing() {
        let (_dir, provider) = provider();
        provider.set_cached_directory(
            "/chats",
            vec![FileInfo::file("b.txt", "", 1), FileInfo::file("a.txt", "", 2)],
        );

        let id: EnumerationId = EnumerationId(1);
        provider.start_enumeration(id);

        let mut sink: VecSink = VecSink::unbounded();
        provider.enumeration_batch(id, "/chats", false, None, &mut sink);
        // Host order is preserved.
        assert_eq!(sink.filled, vec!["b.txt", "a.txt"]);

        provider.end_enumeration(id);
        assert!(provider.enumerations.is_empty());
    }

    #[test]
    fn test_enumeration_buffer_full_keeps_cursor() {
        let (_dir, provider) = provider();
        provider.set_cached_directory(
            "/d",
            vec![
                FileInfo::file("1", "", 0),
                FileInfo::file("2", "", 0),
                FileInfo::file("3", "", 0),
            ],
        );

        let id: EnumerationId = EnumerationId(2);
        provider.start_enumeration(id);

        let mut first: VecSink = VecSink {
            filled: Vec::new(),
            capacity: 2,
        };
        provider.enumeration_batch(id, "/d", false, None, &mut first);
        assert_eq!(first.filled, vec!["1", "2"]);

        let mut second: VecSink = VecSink::unbounded();
        provider.enumeration_batch(id, "/d", false, None, &mut second);
        assert_eq!(second.filled, vec!["3"]);
    }

    #[test]
    fn test_enumeration_filters_by_pattern() {
        let (_dir, provider) = provider();
        provider.set_cached_directory(
            "/d",
            vec![FileInfo::file("a.txt", "", 0), FileInfo::file("b.html", "", 0)],
        );

        let id: EnumerationId = EnumerationId(3);
        provider.start_enumeration(id);

        let mut sink: VecSink = VecSink::unbounded();
        provider.enumeration_batch(id, "/d", false, Some("*.txt"), &mut sink);
        assert_eq!(sink.filled, vec!["a.txt"]);
    }

    #[test]
    fn test_enumeration_skips_nameless_entries() {
        let (_dir, provider) = provider();
        provider.set_cached_directory(
            "/d",
            vec![FileInfo::default(), FileInfo::file("ok", "", 0)],
        );

        let id: EnumerationId = EnumerationId(4);
        provider.start_enumeration(id);

        let mut sink: VecSink = VecSink::unbounded();
        provider.enumeration_batch(id, "/d", false, None, &mut sink);
        assert_eq!(sink.filled, vec!["ok"]);
    }

    #[test]
    fn test_enumeration_unknown_id_created_defensively() {
        let (_dir, provider) = provider();
        provider.set_cached_directory("/d", vec![FileInfo::file("x", "", 0)]);

        let mut sink: VecSink = VecSink::unbounded();
        provider.enumeration_batch(EnumerationId(99), "/d", false, None, &mut sink);
        assert_eq!(sink.filled, vec!["x"]);
    }

    #[test]
    fn test_read_file_data_slices_cached_content() {
        let (_dir, provider) = provider();
        provider.set_cached_content("/f", b"hello world".to_vec());

        assert_eq!(
            provider.read_file_data("/f", 6, 5),
            ReadOutcome::Content(b"world".to_vec())
        );
        assert_eq!(provider.stats().bytes_read, 5);
    }

    #[test]
    fn test_read_file_data_past_end_is_empty_success() {
        let (_dir, provider) = provider();
        provider.set_cached_content("/f", b"short".to_vec());

        assert_eq!(provider.read_file_data("/f", 5, 10), ReadOutcome::Content(Vec::new()));
        assert_eq!(provider.read_file_data("/f", 100, 10), ReadOutcome::Content(Vec::new()));
    }

    #[test]
    fn test_read_file_data_miss_parks() {
        let (_dir, provider) = provider();
        assert_eq!(provider.read_file_data("/chats/msg1", 0, 4096), ReadOutcome::Pending);
    }
}
