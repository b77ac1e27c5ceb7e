//! The bounded worker pool.

use crate::{errors::WorkError, progress::ProgressLogger};
use std::{
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};
use tokio::sync::mpsc;
use tracing::{error, warn};

/// Executes batch work across a bounded pool of workers.
///
/// Items are sliced into batches of `batch_size` and fed through a channel
/// to `max_workers` concurrent workers. A batch that fails retriably is
/// split in half and both halves are processed before the worker takes new
/// channel work; a single-item batch that fails retriably is retried once
/// more and then surfaced as fatal. The first fatal error aborts the run.
#[derive(Debug)]
pub struct BatchWorkExecutor {
    batch_size: usize,
    max_workers: usize,
    shutdown: Arc<AtomicBool>,
}

impl BatchWorkExecutor {
    /// Creates an executor with the given initial batch size and worker
    /// count.
    pub fn new(batch_size: usize, max_workers: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            max_workers: max_workers.max(1),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Signals workers to drain and exit. In-flight batches finish; queued
    /// batches are dropped.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Runs `work_fn` over every batch of `items`, reporting progress
    /// through `progress`. Returns the first fatal error, if any.
    ///
    /// `work_fn` must be idempotent over its batch: a batch may run more
    /// than once when it is split and retried.
    pub async fn execute<T, F, Fut>(
        &self,
        items: impl IntoIterator<Item = T>,
        work_fn: F,
        progress: Arc<ProgressLogger>,
    ) -> Result<(), WorkError>
    where
        T: Clone + Send + 'static,
        F: Fn(Vec<T>) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<u64, WorkError>> + Send + 'static,
    {
        let (batch_tx, batch_rx) = mpsc::channel::<Vec<T>>(self.max_workers * 2);
        let batch_rx = Arc::new(tokio::sync::Mutex::new(batch_rx));
        let first_error: Arc<Mutex<Option<WorkError>>> = Arc::new(Mutex::new(None));

        let mut workers = Vec::with_capacity(self.max_workers);
        for _ in 0..self.max_workers {
            let batch_rx = Arc::clone(&batch_rx);
            let first_error = Arc::clone(&first_error);
            let shutdown = Arc::clone(&self.shutdown);
            let progress = Arc::clone(&progress);
            let work_fn = work_fn.clone();
            workers.push(tokio::spawn(async move {
                loop {
                    if shutdown.load(Ordering::Relaxed) {
                        break;
                    }
                    let batch = { batch_rx.lock().await.recv().await };
                    let Some(batch) = batch else {
                        break;
                    };
                    if let Err(err) = process_batch(batch, &work_fn, &progress).await {
                        error!(target: "executor", %err, "batch failed fatally");
                        first_error.lock().expect("poisoned").get_or_insert(err);
                        shutdown.store(true, Ordering::Relaxed);
                        break;
                    }
                }
            }));
        }

        // feed batches until the input is exhausted or a worker aborted
        let mut batch = Vec::with_capacity(self.batch_size);
        'feed: for item in items {
            batch.push(item);
            if batch.len() >= self.batch_size {
                if self.shutdown.load(Ordering::Relaxed) {
                    break 'feed;
                }
                if batch_tx.send(std::mem::take(&mut batch)).await.is_err() {
                    break 'feed;
                }
            }
        }
        if !batch.is_empty() && !self.shutdown.load(Ordering::Relaxed) {
            let _ = batch_tx.send(batch).await;
        }
        drop(batch_tx);

        for worker in workers {
            let _ = worker.await;
        }

        let mut first_error = first_error.lock().expect("poisoned");
        match first_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Runs one batch, splitting in half on retriable failure. Halves are
/// processed depth-first so shrunken work retries before new work starts.
async fn process_batch<T, F, Fut>(
    batch: Vec<T>,
    work_fn: &F,
    progress: &ProgressLogger,
) -> Result<(), WorkError>
where
    T: Clone + Send + 'static,
    F: Fn(Vec<T>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<u64, WorkError>> + Send,
{
    // local LIFO: halves of a failed batch take priority over channel work
    let mut pending = vec![batch];
    while let Some(batch) = pending.pop() {
        let batch_len = batch.len() as u64;
        match work_fn(batch.clone()).await {
            Ok(produced) => progress.track(batch_len, produced),
            Err(err) if err.is_retriable() => {
                if batch.len() > 1 {
                    let middle = batch.len() / 2;
                    warn!(
                        target: "executor",
                        %err,
                        batch_len,
                        "retriable failure, splitting batch in half"
                    );
                    let mut left = batch;
                    let right = left.split_off(middle);
                    pending.push(right);
                    pending.push(left);
                } else {
                    warn!(target: "executor", %err, "retriable failure on single item, retrying once");
                    match work_fn(batch).await {
                        Ok(produced) => progress.track(batch_len, produced),
                        Err(err) if err.is_retriable() => {
                            return Err(WorkError::Fatal(format!("retries exhausted: {err}")))
                        }
                        Err(err) => return Err(err),
                    }
                }
            }
            Err(err) => return Err(err),
        }
    }
    Ok(())
}
