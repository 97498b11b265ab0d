//! Background worker draining a task channel.
//!
//! Provides a generic `BackgroundWorker<R>` that feeds tasks from an mpsc
//! channel to a `BackgroundRunnable`, one at a time and in arrival order.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

/// Capacity of the task channel.
pub const WORKER_CHANNEL_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// BackgroundRunnable trait
// ---------------------------------------------------------------------------

/// Task handler executed by `BackgroundWorker`.
#[async_trait]
pub trait BackgroundRunnable: Send + 'static {
    type Task: Send + 'static;

    /// Process a single task.
    async fn run(&mut self, task: Self::Task);

    /// Called once when the worker is shutting down. Default is a no-op.
    async fn shutdown(&mut self) {}
}

// ---------------------------------------------------------------------------
// BackgroundWorker
// ---------------------------------------------------------------------------

/// Spawned tokio task processing tasks sequentially until stopped or until
/// every sender is dropped.
pub struct BackgroundWorker<R: BackgroundRunnable> {
    tx: Option<mpsc::Sender<R::Task>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl<R: BackgroundRunnable> BackgroundWorker<R> {
    /// Spawns the worker. Must be called inside a tokio runtime.
    pub fn start(mut runnable: R) -> Self {
        let (tx, mut rx) = mpsc::channel::<R::Task>(WORKER_CHANNEL_CAPACITY);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    task = rx.recv() => match task {
                        Some(task) => runnable.run(task).await,
                        None => break,
                    },
                }
            }
            runnable.shutdown().await;
        });

        Self {
            tx: Some(tx),
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Submit a task to the worker.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker has been stopped.
    pub async fn submit(&self, task: R::Task) -> anyhow::Result<()> {
        match &self.tx {
            Some(tx) => tx
                .send(task)
                .await
                .map_err(|_| anyhow::anyhow!("worker channel closed")),
            None => Err(anyhow::anyhow!("worker not running")),
        }
    }

    /// A sender for producers living outside the worker's owner.
    #[must_use]
    pub fn sender(&self) -> Option<mpsc::Sender<R::Task>> {
        self.tx.clone()
    }

    /// Stop the worker, waiting for the task in progress and the shutdown hook.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    struct CountingRunnable {
        run_count: Arc<AtomicU32>,
        shutdown_called: Arc<AtomicU32>,
    }

    #[async_trait]
    impl BackgroundRunnable for CountingRunnable {
        type Task = String;

        async fn run(&mut self, _task: String) {
            self.run_count.fetch_add(1, Ordering::SeqCst);
        }

        async fn shutdown(&mut self) {
            self.shutdown_called.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counting() -> (CountingRunnable, Arc<AtomicU32>, Arc<AtomicU32>) {
        let run_count = Arc::new(AtomicU32::new(0));
        let shutdown_called = Arc::new(AtomicU32::new(0));
        let runnable = CountingRunnable {
            run_count: Arc::clone(&run_count),
            shutdown_called: Arc::clone(&shutdown_called),
        };
        (runnable, run_count, shutdown_called)
    }

    #[tokio::test]
    async fn start_submit_and_stop() {
        let (runnable, run_count, shutdown_called) = counting();
        let mut worker = BackgroundWorker::start(runnable);

        worker.submit("task-1".to_string()).await.unwrap();
        worker.submit("task-2".to_string()).await.unwrap();
        worker.submit("task-3".to_string()).await.unwrap();

        // Give the worker time to process tasks.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(run_count.load(Ordering::SeqCst), 3);

        worker.stop().await;
        assert_eq!(shutdown_called.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn external_sender_feeds_worker() {
        let (runnable, run_count, _) = counting();
        let mut worker = BackgroundWorker::start(runnable);

        let sender = worker.sender().unwrap();
        sender.send("from-outside".to_string()).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(run_count.load(Ordering::SeqCst), 1);
        worker.stop().await;
    }

    #[tokio::test]
    async fn submit_after_stop_returns_error() {
        let (runnable, _, _) = counting();
        let mut worker = BackgroundWorker::start(runnable);
        worker.stop().await;

        assert!(worker.submit("late-task".to_string()).await.is_err());
        assert!(worker.sender().is_none());
    }
}
