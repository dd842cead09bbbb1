//! Boundary to the asynchronous host.
//!
//! The host registers up to five operations (all optional): async metadata,
//! listing, and content fetchers, an async file writer, and a synchronous
//! debug-message sink. Fetches are dispatched fire-and-forget; completions
//! populate the shared cache. Directory listings are the exception: the
//! host populates those itself through `set_cached_directory`, so the
//! bridge only notifies the listing-updated subscriber.
//!
//! Write operations queue for a background drain worker. The notification
//! policy denies every mutating operation at the ProjFS boundary, so the
//! queue is forward-compatibility scaffolding that stays empty in normal
//! operation.

mod dispatch;

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};

use crate::cache::ContentCache;
use crate::types::{FileContent, FileInfo};

pub use dispatch::Dispatcher;

/// How often the write queue is drained.
const WRITE_DRAIN_INTERVAL: Duration = Duration::from_millis(100);

type GetFileInfoFn = Arc<dyn Fn(String) -> BoxFuture<'static, Option<FileInfo>> + Send + Sync>;
type ReadFileFn = Arc<dyn Fn(String) -> BoxFuture<'static, Option<Vec<u8>>> + Send + Sync>;
type ReadDirectoryFn =
    Arc<dyn Fn(String) -> BoxFuture<'static, Option<Vec<FileInfo>>> + Send + Sync>;
type CreateFileFn = Arc<dyn Fn(String, Vec<u8>) -> BoxFuture<'static, bool> + Send + Sync>;
type DebugSinkFn = Arc<dyn Fn(&str) + Send + Sync>;
type ListingUpdatedFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Host operations. Only the callbacks actually provided are registered;
/// fetches for unregistered operations are silently dropped.
#[derive(Clone, Default)]
pub struct HostCallbacks {
    get_file_info: Option<GetFileInfoFn>,
    read_file: Option<ReadFileFn>,
    read_directory: Option<ReadDirectoryFn>,
    create_file: Option<CreateFileFn>,
    on_debug_message: Option<DebugSinkFn>,
}

impl HostCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the metadata fetcher. `None` results mean the host could
    /// not resolve the path; nothing is cached.
    pub fn with_get_file_info<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<FileInfo>> + Send + 'static,
    {
        self.get_file_info = Some(Arc::new(move |path| f(path).boxed()));
        self
    }

    /// Register the content fetcher.
    pub fn with_read_file<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<Vec<u8>>> + Send + 'static,
    {
        self.read_file = Some(Arc::new(move |path| f(path).boxed()));
        self
    }

    /// Register the listing fetcher.
    pub fn with_read_directory<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<Vec<FileInfo>>> + Send + 'static,
    {
        self.read_directory = Some(Arc::new(move |path| f(path).boxed()));
        self
    }

    /// Register the file writer used by the write queue.
    pub fn with_create_file<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(String, Vec<u8>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.create_file = Some(Arc::new(move |path, content| f(path, content).boxed()));
        self
    }

    /// Register the debug-message sink.
    pub fn with_on_debug_message<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_debug_message = Some(Arc::new(f));
        self
    }
}

/// A queued write operation.
#[derive(Clone, Debug)]
enum WriteOperation {
    Create { path: String, content: Vec<u8> },
    Update { path: String },
    Delete { path: String },
}

/// Boundary between the synchronous engine and the asynchronous host.
pub struct HostBridge {
    cache: Arc<ContentCache>,
    callbacks: Arc<RwLock<HostCallbacks>>,
    dispatcher: Arc<Dispatcher>,
    write_queue: Arc<Mutex<VecDeque<WriteOperation>>>,
    running: Arc<AtomicBool>,
    drain_worker: Mutex<Option<JoinHandle<()>>>,
    listing_updated: RwLock<Option<ListingUpdatedFn>>,
}

impl HostBridge {
    pub fn new(cache: Arc<ContentCache>, worker_threads: usize) -> Self {
        Self {
            cache,
            callbacks: Arc::new(RwLock::new(HostCallbacks::default())),
            dispatcher: Arc::new(Dispatcher::new(worker_threads)),
            write_queue: Arc::new(Mutex::new(VecDeque::new())),
            running: Arc::new(AtomicBool::new(false)),
            drain_worker: Mutex::new(None),
            listing_updated: RwLock::new(None),
        }
    }

    /// Replace the registered host operations.
    pub fn register_callbacks(&self, callbacks: HostCallbacks) {
        *self.callbacks.write() = callbacks;
    }

    /// Subscribe to directory-listing-updated notifications. The engine
    /// wires this to the enumeration table, not to itself.
    pub fn set_listing_updated<F>(&self, f: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        *self.listing_updated.write() = Some(Arc::new(f));
    }

    /// Request file metadata. On success the result lands in the cache
    /// under the same path; failures leave the cache untouched.
    pub fn fetch_file_info(&self, path: &str) {
        let Some(callback) = self.callbacks.read().get_file_info.clone() else {
            return;
        };

        let cache: Arc<ContentCache> = self.cache.clone();
        let path: String = path.to_string();
        self.dispatcher.dispatch(async move {
            if let Some(info) = callback(path.clone()).await {
                cache.set_file_info(&path, info);
            }
        });
    }

    /// Request a directory listing. The host populates the listing cache
    /// itself via `set_cached_directory`; on success only the subscriber
    /// is notified, avoiding a double insertion race.
    pub fn fetch_directory_listing(&self, path: &str) {
        let Some(callback) = self.callbacks.read().read_directory.clone() else {
            self.emit_debug(&format!(
                "readDirectory requested for {} but no callback registered",
                path
            ));
            return;
        };

        let notify: Option<ListingUpdatedFn> = self.listing_updated.read().clone();
        let path: String = path.to_string();
        self.dispatcher.dispatch(async move {
            if callback(path.clone()).await.is_some() {
                if let Some(notify) = notify {
                    notify(&path);
                }
            }
        });
    }

    /// Request file content. Successful results are cached subject to the
    /// content size ceiling.
    pub fn fetch_file_content(&self, path: &str) {
        let Some(callback) = self.callbacks.read().read_file.clone() else {
            return;
        };

        let cache: Arc<ContentCache> = self.cache.clone();
        let path: String = path.to_string();
        self.dispatcher.dispatch(async move {
            if let Some(data) = callback(path.clone()).await {
                cache.set_file_content(&path, FileContent::new(data));
            }
        });
    }

    /// Forward a diagnostic message to the host sink, if registered.
    pub fn emit_debug(&self, message: &str) {
        tracing::debug!("{}", message);
        if let Some(sink) = self.callbacks.read().on_debug_message.clone() {
            sink(message);
        }
    }

    /// Queue a file creation for the drain worker.
    pub fn queue_create_file(&self, path: &str, content: Vec<u8>) {
        self.write_queue.lock().push_back(WriteOperation::Create {
            path: path.to_string(),
            content,
        });
    }

    /// Queue a file update. Forward-compatibility stub; drains without a
    /// host dispatch.
    pub fn queue_update_file(&self, path: &str, _content: Vec<u8>) {
        self.write_queue.lock().push_back(WriteOperation::Update {
            path: path.to_string(),
        });
    }

    /// Queue a file deletion. Forward-compatibility stub; drains without a
    /// host dispatch.
    pub fn queue_delete_file(&self, path: &str) {
        self.write_queue.lock().push_back(WriteOperation::Delete {
            path: path.to_string(),
        });
    }

    /// Spawn the write-drain worker.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let running: Arc<AtomicBool> = self.running.clone();
        let queue: Arc<Mutex<VecDeque<WriteOperation>>> = self.write_queue.clone();
        let callbacks: Arc<RwLock<HostCallbacks>> = self.callbacks.clone();
        let dispatcher: Arc<Dispatcher> = self.dispatcher.clone();

        let worker: JoinHandle<()> = std::thread::Builder::new()
            .name("casfs-write-drain".to_string())
            .spawn(move || {
                while running.load(Ordering::SeqCst) {
                    drain_write_queue(&queue, &callbacks, &dispatcher);
                    std::thread::sleep(WRITE_DRAIN_INTERVAL);
                }
            })
            .expect("failed to spawn write-drain worker");

        *self.drain_worker.lock() = Some(worker);
    }

    /// Stop the drain worker and release all registered host operations.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);

        if let Some(worker) = self.drain_worker.lock().take() {
            let _ = worker.join();
        }

        *self.callbacks.write() = HostCallbacks::default();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

fn drain_write_queue(
    queue: &Mutex<VecDeque<WriteOperation>>,
    callbacks: &RwLock<HostCallbacks>,
    dispatcher: &Dispatcher,
) {
    let drained: VecDeque<WriteOperation> = std::mem::take(&mut *queue.lock());

    for operation in drained {
        match operation {
            WriteOperation::Create { path, content } => {
                let Some(callback) = callbacks.read().create_file.clone() else {
                    continue;
                };
                dispatcher.dispatch(async move {
                    if !callback(path.clone(), content).await {
                        tracing::warn!("host createFile failed for {}", path);
                    }
                });
            }
            WriteOperation::Update { path } => {
                tracing::debug!("queued update for {} has no host operation", path);
            }
            WriteOperation::Delete { path } => {
                tracing::debug!("queued delete for {} has no host operation", path);
            }
        }
    }
}

impl Drop for HostBridge {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.drain_worker.lock().take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn wait_until(check: impl Fn() -> bool) -> bool {
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while std::time::Instant::now() < deadline {
            if check() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        false
    }

    fn bridge() -> (Arc<ContentCache>, Arc<HostBridge>) {
        let cache: Arc<ContentCache> = Arc::new(ContentCache::new(Duration::from_secs(3600)));
        let bridge: Arc<HostBridge> = Arc::new(HostBridge::new(cache.clone(), 2));
        (cache, bridge)
    }

    #[test]
    fn test_fetch_file_info_populates_cache() {
        let (cache, bridge) = bridge();
        bridge.register_callbacks(HostCallbacks::new().with_get_file_info(|path: String| async move {
            assert_eq!(path, "/chats/msg1");
            Some(FileInfo::file("msg1", "abc", 42))
        }));

        bridge.fetch_file_info("/chats/msg1");
        assert!(wait_until(|| cache.get_file_info("/chats/msg1").is_some()));
        assert_eq!(cache.get_file_info("/chats/msg1").unwrap().size, 42);
    }

    #[test]
    fn test_failed_fetch_leaves_cache_empty() {
        let (cache, bridge) = bridge();
        bridge.register_callbacks(
            HostCallbacks::new().with_get_file_info(|_path: String| async move { None }),
        );

        bridge.fetch_file_info("/missing");
        std::thread::sleep(Duration::from_millis(100));
        assert!(cache.get_file_info("/missing").is_none());
    }

    #[test]
    fn test_fetch_directory_listing_notifies_without_caching() {
        let (cache, bridge) = bridge();
        let notified: Arc<AtomicUsize> = Arc::new(AtomicUsize::new(0));

        let notified_clone: Arc<AtomicUsize> = notified.clone();
        bridge.set_listing_updated(move |path| {
            assert_eq!(path, "/chats");
            notified_clone.fetch_add(1, Ordering::SeqCst);
        });
        bridge.register_callbacks(HostCallbacks::new().with_read_directory(
            |_path: String| async move { Some(vec![FileInfo::file("msg1", "", 1)]) },
        ));

        bridge.fetch_directory_listing("/chats");
        assert!(wait_until(|| notified.load(Ordering::SeqCst) == 1));
        // The bridge never writes listings itself.
        assert!(cache.get_directory_listing("/chats").is_none());
    }

    #[test]
    fn test_fetch_file_content_respects_size_ceiling() {
        let (cache, bridge) = bridge();
        bridge.register_callbacks(HostCallbacks::new().with_read_file(|path: String| async move {
            if path == "/small" {
                Some(vec![7u8; 16])
            } else {
                Some(vec![0u8; crate::cache::MAX_CACHED_CONTENT_BYTES + 1])
            }
        }));

        bridge.fetch_file_content("/small");
        assert!(wait_until(|| cache.get_file_content("/small").is_some()));

        bridge.fetch_file_content("/huge");
        std::thread::sleep(Duration::from_millis(200));
        assert!(cache.get_file_content("/huge").is_none());
    }

    #[test]
    fn test_fetch_without_callbacks_is_noop() {
        let (_cache, bridge) = bridge();
        bridge.fetch_file_info("/a");
        bridge.fetch_directory_listing("/a");
        bridge.fetch_file_content("/a");
    }

    #[test]
    fn test_write_queue_drains_create() {
        let (_cache, bridge) = bridge();
        let created: Arc<AtomicUsize> = Arc::new(AtomicUsize::new(0));

        let created_clone: Arc<AtomicUsize> = created.clone();
        bridge.register_callbacks(HostCallbacks::new().with_create_file(
            move |path: String, content: Vec<u8>| {
                let created = created_clone.clone();
                async move {
                    assert_eq!(path, "/new.txt");
                    assert_eq!(content, b"data");
                    created.fetch_add(1, Ordering::SeqCst);
                    true
                }
            },
        ));

        bridge.start();
        bridge.queue_create_file("/new.txt", b"data".to_vec());
        // Stubs drain silently alongside.
        bridge.queue_update_file("/new.txt", b"x".to_vec());
        bridge.queue_delete_file("/new.txt");

        assert!(wait_until(|| created.load(Ordering::SeqCst) == 1));
        assert!(wait_until(|| bridge.write_queue.lock().is_empty()));
        bridge.stop();
        assert!(!bridge.is_running());
    }

    #[test]
    fn test_stop_releases_callbacks() {
        let (_cache, bridge) = bridge();
        bridge.register_callbacks(
            HostCallbacks::new().with_get_file_info(|_p: String| async move { None }),
        );
        bridge.start();
        bridge.stop();

        assert!(bridge.callbacks.read().get_file_info.is_none());
    }

    #[test]
    fn test_emit_debug_reaches_sink() {
        let (_cache, bridge) = bridge();
        let messages: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        let messages_clone: Arc<Mutex<Vec<String>>> = messages.clone();
        bridge.register_callbacks(HostCallbacks::new().with_on_debug_message(move |msg| {
            messages_clone.lock().push(msg.to_string());
        }));

        bridge.emit_debug("enumeration timeout for /chats");
        assert_eq!(messages.lock().len(), 1);
        assert!(messages.lock()[0].contains("/chats"));
    }
}
