//! Bounded-concurrency worker pool
//!
//! Runs a fixed number of workers over arbitrarily many units of work while
//! preserving the caller's submission order in the returned results. The
//! remote catalog caps concurrent connections, so unconditional fan-out would
//! be rejected; a fixed-width pool gives bounded, predictable load and
//! deterministic result ordering regardless of which request finishes first.

use crate::error::{Error, Result};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

type WorkFn<T, R> =
    Arc<dyn Fn(T) -> Pin<Box<dyn Future<Output = Result<R>> + Send>> + Send + Sync>;

/// One unit of work with its submission index
struct WorkUnit<T> {
    index: usize,
    payload: T,
}

/// One completed unit with its submission index
struct WorkResult<R> {
    index: usize,
    outcome: Result<R>,
}

/// Fixed-width worker pool with order-preserving results
///
/// Lifecycle: [`new`](Self::new) → [`register`](Self::register) (exactly once)
/// → any number of [`submit`](Self::submit) calls → [`await_all`](Self::await_all).
/// Submission is backpressured by a bounded queue; results are re-sorted to
/// submission order before being returned. A failing unit does not abort its
/// siblings: every in-flight unit drains first, then the first failure in
/// submission order is surfaced (fail-together, not fail-fast).
pub struct WorkerPool<T, R> {
    width: usize,
    work_tx: Option<mpsc::Sender<WorkUnit<T>>>,
    work_rx: Option<mpsc::Receiver<WorkUnit<T>>>,
    // Results are unbounded: their count is capped by what the caller has
    // submitted, and a bounded channel would stall workers between
    // submission and the await_all drain.
    result_tx: Option<mpsc::UnboundedSender<WorkResult<R>>>,
    result_rx: mpsc::UnboundedReceiver<WorkResult<R>>,
    workers: Vec<JoinHandle<()>>,
    next_index: usize,
}

impl<T, R> WorkerPool<T, R>
where
    T: Send + 'static,
    R: Send + 'static,
{
    /// Create a pool that runs at most `width` units concurrently
    pub fn new(width: usize) -> Self {
        let width = width.max(1);
        let (work_tx, work_rx) = mpsc::channel(width * 2);
        let (result_tx, result_rx) = mpsc::unbounded_channel();

        Self {
            width,
            work_tx: Some(work_tx),
            work_rx: Some(work_rx),
            result_tx: Some(result_tx),
            result_rx,
            workers: Vec::new(),
            next_index: 0,
        }
    }

    /// Register the unit-of-work function and start the workers
    ///
    /// Must be called exactly once before the first submission.
    pub fn register<F, Fut>(&mut self, work: F) -> Result<()>
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R>> + Send + 'static,
    {
        let work_rx = self
            .work_rx
            .take()
            .ok_or_else(|| Error::Pool("unit of work already registered".to_string()))?;
        let result_tx = self
            .result_tx
            .take()
            .ok_or_else(|| Error::Pool("unit of work already registered".to_string()))?;

        let work: WorkFn<T, R> = Arc::new(move |payload| Box::pin(work(payload)));
        let shared_rx = Arc::new(Mutex::new(work_rx));

        for worker_id in 0..self.width {
            let work = Arc::clone(&work);
            let shared_rx = Arc::clone(&shared_rx);
            let result_tx = result_tx.clone();

            self.workers.push(tokio::spawn(async move {
                debug!(worker_id, "Pool worker started");
                loop {
                    // Hold the queue lock only while pulling the next unit so
                    // siblings can run concurrently.
                    let unit = { shared_rx.lock().await.recv().await };
                    let Some(unit) = unit else { break };

                    let outcome = (work)(unit.payload).await;
                    if result_tx
                        .send(WorkResult { index: unit.index, outcome })
                        .is_err()
                    {
                        break;
                    }
                }
                debug!(worker_id, "Pool worker finished");
            }));
        }

        // The workers hold the only result senders now; the channel closes
        // when the last of them exits.
        drop(result_tx);
        Ok(())
    }

    /// Submit one payload; blocks (backpressure) when the queue is full
    pub async fn submit(&mut self, payload: T) -> Result<()> {
        if self.workers.is_empty() {
            return Err(Error::Pool("submit before register".to_string()));
        }
        let tx = self
            .work_tx
            .as_ref()
            .ok_or_else(|| Error::Pool("submit after close".to_string()))?;

        let unit = WorkUnit {
            index: self.next_index,
            payload,
        };
        tx.send(unit)
            .await
            .map_err(|_| Error::Pool("workers stopped before submission".to_string()))?;
        self.next_index += 1;
        Ok(())
    }

    /// Signal that no further submissions will arrive
    pub fn close(&mut self) {
        self.work_tx = None;
    }

    /// Drain every submitted unit and return results in submission order
    ///
    /// Implicitly closes the pool. If any unit failed, the first failure in
    /// submission order is returned after every sibling has drained.
    pub async fn await_all(mut self) -> Result<Vec<R>> {
        self.close();

        // Without workers the master sender would keep the result channel
        // open and the drain below would never finish.
        if self.result_tx.take().is_some() {
            return Err(Error::Pool("await_all before register".to_string()));
        }

        let mut completed: Vec<WorkResult<R>> = Vec::with_capacity(self.next_index);
        while let Some(result) = self.result_rx.recv().await {
            completed.push(result);
        }

        for handle in self.workers.drain(..) {
            handle
                .await
                .map_err(|e| Error::Pool(format!("worker task failed: {e}")))?;
        }

        debug_assert_eq!(completed.len(), self.next_index);
        completed.sort_by_key(|r| r.index);
        completed.into_iter().map(|r| r.outcome).collect()
    }
}
