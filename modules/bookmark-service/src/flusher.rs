//! Background flusher for the bookmark store.
//!
//! Wakes every `interval`, writes a snapshot only if something changed, and
//! sleeps again. Batching writes this way keeps disk wear low at the cost of
//! losing up to one interval of bookmarks on a crash.

use crate::persist::SnapshotSink;
use crate::store::BookmarkStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing changed since the last snapshot; no write attempted
    Clean,
    /// Snapshot with this many entries written
    Written(usize),
    Failed,
}

pub struct Flusher {
    store: Arc<BookmarkStore>,
    sink: Arc<dyn SnapshotSink>,
    interval: Duration,
    last_flush_at: Arc<Mutex<Option<String>>>,
}

impl Flusher {
    pub fn new(
        store: Arc<BookmarkStore>,
        sink: Arc<dyn SnapshotSink>,
        interval: Duration,
        last_flush_at: Arc<Mutex<Option<String>>>,
    ) -> Self {
        Self {
            store,
            sink,
            interval,
            last_flush_at,
        }
    }

    /// One flush cycle.
    ///
    /// The dirty flag is cleared when the snapshot is taken. A failed write
    /// flags the store dirty again so the next cycle retries it.
    pub async fn flush_once(&self) -> FlushOutcome {
        let Some(snapshot) = self.store.snapshot() else {
            log::debug!("[BOOKMARKS] No changes since last flush, skipping write");
            return FlushOutcome::Clean;
        };

        match self.sink.write(&snapshot).await {
            Ok(()) => {
                *self.last_flush_at.lock().await = Some(chrono::Utc::now().to_rfc3339());
                FlushOutcome::Written(snapshot.len())
            }
            Err(e) => {
                log::error!("[BOOKMARKS] Flush failed: {}", e);
                self.store.mark_dirty();
                FlushOutcome::Failed
            }
        }
    }

    /// Flush every interval until `shutdown` fires, then flush one last time.
    pub async fn run(self, shutdown: CancellationToken) {
        log::info!(
            "[BOOKMARKS] Flusher started (interval: {}s)",
            self.interval.as_secs()
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {
                    report(self.flush_once().await);
                }
                _ = shutdown.cancelled() => {
                    log::info!("[BOOKMARKS] Flusher stopping, writing pending changes");
                    report(self.flush_once().await);
                    break;
                }
            }
        }
    }
}

fn report(outcome: FlushOutcome) {
    if let FlushOutcome::Written(count) = outcome {
        log::info!("[BOOKMARKS] Flushed {} bookmarks", count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::PersistError;
    use async_trait::async_trait;
    use bookmark_types::Bookmarks;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Records every snapshot it is handed.
    #[derive(Default)]
    struct RecordingSink {
        writes: parking_lot::Mutex<Vec<Bookmarks>>,
        fail: AtomicBool,
    }

    impl RecordingSink {
        fn writes(&self) -> Vec<Bookmarks> {
            self.writes.lock().clone()
        }
    }

    #[async_trait]
    impl SnapshotSink for RecordingSink {
        async fn write(&self, snapshot: &Bookmarks) -> Result<(), PersistError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(PersistError::Io {
                    path: "unwritable.json".into(),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                });
            }
            self.writes.lock().push(snapshot.clone());
            Ok(())
        }
    }

    fn flusher(interval: Duration) -> (Arc<BookmarkStore>, Arc<RecordingSink>, Flusher) {
        let store = Arc::new(BookmarkStore::new());
        let sink = Arc::new(RecordingSink::default());
        let flusher = Flusher::new(
            store.clone(),
            sink.clone(),
            interval,
            Arc::new(Mutex::new(None)),
        );
        (store, sink, flusher)
    }

    #[tokio::test]
    async fn coalesces_many_sets_into_one_write() {
        let (store, sink, flusher) = flusher(Duration::from_secs(3600));
        for i in 0..10 {
            store.set("movie", i);
        }
        store.set("other", 42);

        assert_eq!(flusher.flush_once().await, FlushOutcome::Written(2));

        let writes = sink.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].get("movie"), Some(&9));
        assert_eq!(writes[0].get("other"), Some(&42));
    }

    #[tokio::test]
    async fn clean_store_writes_nothing() {
        let (store, sink, flusher) = flusher(Duration::from_secs(3600));
        assert_eq!(flusher.flush_once().await, FlushOutcome::Clean);

        store.set("a", 1);
        flusher.flush_once().await;
        assert_eq!(flusher.flush_once().await, FlushOutcome::Clean);
        assert_eq!(sink.writes().len(), 1);
    }

    #[tokio::test]
    async fn failed_write_is_retried_next_cycle() {
        let (store, sink, flusher) = flusher(Duration::from_secs(3600));
        store.set("a", 1);

        sink.fail.store(true, Ordering::SeqCst);
        assert_eq!(flusher.flush_once().await, FlushOutcome::Failed);
        assert!(store.is_dirty());
        assert!(flusher.last_flush_at.lock().await.is_none());

        sink.fail.store(false, Ordering::SeqCst);
        assert_eq!(flusher.flush_once().await, FlushOutcome::Written(1));
        assert!(flusher.last_flush_at.lock().await.is_some());
        assert_eq!(sink.writes()[0].get("a"), Some(&1));
    }

    #[tokio::test]
    async fn concurrent_sets_all_reach_the_snapshot() {
        let (store, sink, flusher) = flusher(Duration::from_secs(3600));
        let tasks: Vec<_> = (0..64)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.set(&format!("ep{}", i), i) })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(flusher.flush_once().await, FlushOutcome::Written(64));
        let written = &sink.writes()[0];
        assert!((0..64).all(|i| written.get(&format!("ep{}", i)) == Some(&i)));
    }

    #[tokio::test(start_paused = true)]
    async fn run_flushes_on_interval_and_on_shutdown() {
        let (store, sink, flusher) = flusher(Duration::from_secs(60));
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(flusher.run(shutdown.clone()));
        settle().await;

        store.set("a", 1);
        tokio::time::advance(Duration::from_secs(61)).await;
        settle().await;
        assert_eq!(sink.writes().len(), 1);

        // Nothing changed, so later ticks stay off the disk
        tokio::time::advance(Duration::from_secs(120)).await;
        settle().await;
        assert_eq!(sink.writes().len(), 1);

        store.set("b", 2);
        shutdown.cancel();
        handle.await.unwrap();

        let writes = sink.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[1].get("b"), Some(&2));
    }

    /// Let the spawned flusher run whatever the clock just woke.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }
}
