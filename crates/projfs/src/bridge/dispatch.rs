//! Fire-and-forget dispatcher for host calls.
//!
//! Kernel callbacks must never block on host I/O, so host calls are handed
//! to a dedicated runtime thread and forgotten; completions write into the
//! shared cache. The runtime is created fresh on its own thread rather than
//! borrowed from any ambient context, which keeps callback threads free of
//! runtime entanglement.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Submission queue depth. Host calls beyond this are dropped with a
/// warning; the next kernel request retries the fetch.
const QUEUE_SIZE: usize = 1024;

/// Dispatcher that runs submitted futures on a dedicated runtime thread.
pub struct Dispatcher {
    tx: mpsc::Sender<BoxFuture<'static, ()>>,
    cancel_token: CancellationToken,
    thread: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl Dispatcher {
    /// Spawn the runtime thread with the given worker count.
    pub fn new(worker_threads: usize) -> Self {
        let (tx, rx) = mpsc::channel::<BoxFuture<'static, ()>>(QUEUE_SIZE);
        let cancel_token = CancellationToken::new();
        let token_clone: CancellationToken = cancel_token.clone();
        let running = Arc::new(AtomicBool::new(true));
        let running_clone: Arc<AtomicBool> = running.clone();

        let thread: JoinHandle<()> = std::thread::Builder::new()
            .name("casfs-host-dispatch".to_string())
            .spawn(move || {
                let rt: tokio::runtime::Runtime = tokio::runtime::Builder::new_multi_thread()
                    .worker_threads(worker_threads)
                    .thread_name("casfs-host-worker")
                    .enable_all()
                    .build()
                    .expect("failed to create dispatcher runtime");

                rt.block_on(async move {
                    let mut rx: mpsc::Receiver<BoxFuture<'static, ()>> = rx;

                    loop {
                        tokio::select! {
                            biased;

                            _ = token_clone.cancelled() => break,
                            work = rx.recv() => {
                                match work {
                                    Some(future) => {
                                        tokio::spawn(future);
                                    }
                                    None => break,
                                }
                            }
                        }
                    }
                });

                running_clone.store(false, Ordering::Release);
            })
            .expect("failed to spawn dispatcher thread");

        Self {
            tx,
            cancel_token,
            thread: Some(thread),
            running,
        }
    }

    /// Submit a future without waiting for it. Returns false when the
    /// dispatcher is shut down or the queue is full.
    pub fn dispatch<F>(&self, future: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if !self.running.load(Ordering::Acquire) {
            return false;
        }

        match self.tx.try_send(future.boxed()) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("host call dropped: dispatch queue unavailable ({})", e);
                false
            }
        }
    }

    /// Whether the runtime thread is alive.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.cancel_token.cancel();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
