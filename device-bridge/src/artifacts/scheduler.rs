use std::collections::HashMap;
use std::future::poll_fn;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::time::DelayQueue;

/// Deferred file deletion, independent of request handling.
///
/// A single background task owns a delay queue of pending deletions. On
/// shutdown (or when the scheduler is dropped) everything still pending is
/// deleted immediately instead of being lost.
pub struct CleanupScheduler {
    tx: mpsc::UnboundedSender<(PathBuf, Duration)>,
    shutdown: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

enum Event {
    Schedule(Option<(PathBuf, Duration)>),
    Expired(Option<u64>),
    Shutdown,
}

impl CleanupScheduler {
    /// Spawn the cleanup task on the current runtime
    pub fn start() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(run(rx, shutdown.clone()));

        Self {
            tx,
            shutdown,
            task: Mutex::new(Some(task)),
        }
    }

    /// Delete `path` once `delay` has elapsed
    pub fn schedule(&self, path: PathBuf, delay: Duration) {
        if let Err(mpsc::error::SendError((path, _))) = self.tx.send((path, delay)) {
            // queue already flushed; nothing will come back for this file
            tracing::debug!("Cleanup queue stopped, deleting {} now", path.display());
            tokio::spawn(async move { remove_artifact(&path).await });
        }
    }

    /// Stop the queue and delete everything still pending
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.lock().await.take() {
            if let Err(e) = task.await {
                tracing::error!("Cleanup task failed: {}", e);
            }
        }
    }
}

impl Drop for CleanupScheduler {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn run(mut rx: mpsc::UnboundedReceiver<(PathBuf, Duration)>, shutdown: CancellationToken) {
    let mut queue: DelayQueue<u64> = DelayQueue::new();
    let mut pending: HashMap<u64, PathBuf> = HashMap::new();
    let mut next_id: u64 = 0;

    loop {
        let event = tokio::select! {
            _ = shutdown.cancelled() => Event::Shutdown,
            message = rx.recv() => Event::Schedule(message),
            expired = poll_fn(|cx| queue.poll_expired(cx)), if !queue.is_empty() => {
                Event::Expired(expired.map(|e| e.into_inner()))
            }
        };

        match event {
            Event::Schedule(Some((path, delay))) => {
                tracing::debug!("Deleting {} in {:?}", path.display(), delay);
                queue.insert(next_id, delay);
                pending.insert(next_id, path);
                next_id += 1;
            }
            Event::Expired(Some(id)) => {
                if let Some(path) = pending.remove(&id) {
                    remove_artifact(&path).await;
                }
            }
            Event::Expired(None) => {}
            Event::Schedule(None) | Event::Shutdown => break,
        }
    }

    rx.close();
    while let Ok((path, _)) = rx.try_recv() {
        pending.insert(next_id, path);
        next_id += 1;
    }

    if !pending.is_empty() {
        tracing::info!("Flushing {} pending artifact deletion(s)", pending.len());
    }
    for (_, path) in pending.drain() {
        remove_artifact(&path).await;
    }
}

/// Delete an artifact file. Failures are logged, never propagated.
pub async fn remove_artifact(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!("Removed artifact {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("Artifact {} was already removed", path.display())
        }
        Err(e) => tracing::warn!("Artifact {} couldn't be deleted: {}", path.display(), e),
    }
}
