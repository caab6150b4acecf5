//! Detached cache writes through a bounded queue and a fixed worker pool.
//!
//! Writes are fire-and-forget: they outlive the request that produced them,
//! are never retried, and a full queue drops the write instead of growing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::FileCache;

struct StoreJob {
    key: String,
    value: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterConfig {
    pub workers: usize,
    pub queue: usize,
    pub timeout: Duration,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue: 256,
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct CacheWriter {
    tx: mpsc::Sender<StoreJob>,
    workers: Vec<JoinHandle<()>>,
    dropped: Arc<AtomicU64>,
}

impl CacheWriter {
    /// Spawns the worker pool on the current tokio runtime.
    pub fn spawn(cache: Arc<dyn FileCache>, config: WriterConfig) -> Self {
        let (tx, rx) = mpsc::channel::<StoreJob>(config.queue.max(1));
        let rx = Arc::new(Mutex::new(rx));
        // a zero timeout would fail every write
        let timeout = if config.timeout.is_zero() {
            WriterConfig::default().timeout
        } else {
            config.timeout
        };

        let workers = (0..config.workers.max(1))
            .map(|id| {
                tokio::spawn(store_worker(
                    id,
                    Arc::clone(&cache),
                    Arc::clone(&rx),
                    timeout,
                ))
            })
            .collect();

        Self {
            tx,
            workers,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Queues a write without waiting. Returns `false` if it was dropped.
    pub fn submit(&self, key: String, value: Vec<u8>) -> bool {
        match self.tx.try_send(StoreJob { key, value }) {
            Ok(()) => true,
            Err(TrySendError::Full(job)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(key = %job.key, "preview cache queue full, dropping write");
                false
            }
            Err(TrySendError::Closed(job)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(key = %job.key, "preview cache writer stopped, dropping write");
                false
            }
        }
    }

    /// Writes discarded because the queue was full or closed.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Closes the queue and waits until queued writes have been attempted.
    pub async fn shutdown(self) {
        drop(self.tx);
        for worker in self.workers {
            if let Err(e) = worker.await {
                warn!(error = %e, "preview cache worker panicked");
            }
        }
    }
}

async fn store_worker(
    id: usize,
    cache: Arc<dyn FileCache>,
    jobs: Arc<Mutex<mpsc::Receiver<StoreJob>>>,
    timeout: Duration,
) {
    loop {
        let job = jobs.lock().await.recv().await;
        let Some(job) = job else {
            break;
        };

        match tokio::time::timeout(timeout, cache.store(&job.key, &job.value)).await {
            Ok(Ok(())) => debug!(worker = id, key = %job.key, bytes = job.value.len(), "cached preview"),
            Ok(Err(e)) => warn!(worker = id, key = %job.key, error = %e, "failed to cache preview"),
            Err(_) => warn!(worker = id, key = %job.key, ?timeout, "timed out caching preview"),
        }
    }
    debug!(worker = id, "preview cache worker stopped");
}
