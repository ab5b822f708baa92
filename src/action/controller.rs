//! Concurrent actions controller

use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};

use crate::error::Result;

use super::outcome::{ActionError, Outcome};

type Action<I, O> = dyn Fn(I) -> std::result::Result<O, ActionError> + Send + Sync;

/// Number of hardware threads, at least 1
pub fn available_parallelism() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Shared cancellation flag
///
/// Items dispatched after `cancel()` are reported as [`ActionError::Cancelled`]
/// instead of being processed. Items already running are not interrupted.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Fixed-size worker pool driving one action over a growable queue
///
/// Workers are spawned lazily, one per `add`, until `max_workers` is
/// reached: the pool never has more workers than queued items and has none
/// at all when nothing was added.
///
/// `add` may be called while workers are already consuming. `iter` consumes
/// the controller and closes the queue; no item can be added afterwards.
pub struct ConcurrentActionsController<I, O> {
    max_workers: usize,
    action: Arc<Action<I, O>>,

    /// Taken when the queue closes (`iter` or drop)
    queue_tx: Option<Sender<I>>,
    queue_rx: Receiver<I>,

    results_tx: Sender<Outcome<I, O>>,
    results_rx: Receiver<Outcome<I, O>>,

    workers: Vec<JoinHandle<()>>,
    queued: usize,
    cancel: CancelHandle,
}

impl<I, O> ConcurrentActionsController<I, O>
where
    I: Clone + Send + 'static,
    O: Send + 'static,
{
    /// Create a controller with at most `max_workers` threads (minimum 1)
    pub fn new<F, E>(max_workers: usize, action: F) -> Self
    where
        F: Fn(I) -> std::result::Result<O, E> + Send + Sync + 'static,
        E: Display,
    {
        let (queue_tx, queue_rx) = channel::unbounded();
        let (results_tx, results_rx) = channel::unbounded();

        let action: Arc<Action<I, O>> =
            Arc::new(move |item| action(item).map_err(|e| ActionError::Failed(e.to_string())));

        Self {
            max_workers: max_workers.max(1),
            action,
            queue_tx: Some(queue_tx),
            queue_rx,
            results_tx,
            results_rx,
            workers: Vec::new(),
            queued: 0,
            cancel: CancelHandle::default(),
        }
    }

    /// Create a controller sized for the machine, `min(parallelism, cap)`
    pub fn with_parallelism<F, E>(cap: Option<usize>, action: F) -> Self
    where
        F: Fn(I) -> std::result::Result<O, E> + Send + Sync + 'static,
        E: Display,
    {
        let workers = match cap {
            Some(cap) => available_parallelism().min(cap),
            None => available_parallelism(),
        };
        Self::new(workers, action)
    }

    /// Enqueue one item, spawning a worker if the pool is below its cap
    pub fn add(&mut self, item: I) -> Result<()> {
        if self.workers.len() < self.max_workers {
            match self.spawn_worker() {
                Ok(handle) => self.workers.push(handle),
                Err(e) if !self.workers.is_empty() => {
                    tracing::warn!("Failed to spawn worker, continuing with {}: {}", self.workers.len(), e);
                }
                Err(e) => return Err(e.into()),
            }
        }

        // Cannot fail: the controller holds a receiver until `iter`
        if let Some(queue) = &self.queue_tx {
            let _ = queue.send(item);
        }
        self.queued += 1;
        Ok(())
    }

    /// Close the queue and stream results in completion order
    ///
    /// The returned iterator blocks while no result is ready and ends once
    /// every queued item has been reported.
    pub fn iter(mut self) -> Results<I, O> {
        tracing::debug!(
            "Draining {} items on {} workers",
            self.queued,
            self.workers.len()
        );

        self.queue_tx.take();
        // `self` drops its result sender on return: the stream disconnects
        // when the last worker exits. Workers move out, so drop won't join.
        Results {
            rx: self.results_rx.clone(),
            workers: std::mem::take(&mut self.workers),
            cancel: self.cancel.clone(),
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Workers spawned so far
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Items added so far
    pub fn queued(&self) -> usize {
        self.queued
    }

    fn spawn_worker(&self) -> std::io::Result<JoinHandle<()>> {
        let id = self.workers.len();
        let queue = self.queue_rx.clone();
        let results = self.results_tx.clone();
        let action = Arc::clone(&self.action);
        let cancel = self.cancel.clone();

        thread::Builder::new()
            .name(format!("action-worker-{}", id))
            .spawn(move || run_worker(id, queue, results, action, cancel))
    }
}

impl<I, O> Drop for ConcurrentActionsController<I, O> {
    fn drop(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        // Never iterated: skip what is left, close the queue, wait for workers
        self.cancel.cancel();
        self.queue_tx.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("Worker thread terminated abnormally");
            }
        }
    }
}

fn run_worker<I, O>(
    id: usize,
    queue: Receiver<I>,
    results: Sender<Outcome<I, O>>,
    action: Arc<Action<I, O>>,
    cancel: CancelHandle,
) where
    I: Clone,
{
    tracing::trace!("Worker {} started", id);
    let mut processed = 0usize;

    // Ends once the queue is closed and empty
    for item in queue.iter() {
        let result = if cancel.is_cancelled() {
            Err(ActionError::Cancelled)
        } else {
            let input = item.clone();
            match panic::catch_unwind(AssertUnwindSafe(|| action(input))) {
                Ok(result) => result,
                Err(payload) => Err(ActionError::Panicked(panic_message(payload))),
            }
        };

        if let Err(e) = &result {
            tracing::warn!("Worker {} item failed: {}", id, e);
        }
        processed += 1;

        if results.send(Outcome { item, result }).is_err() {
            // Consumer went away; nobody will read further results
            break;
        }
    }

    tracing::trace!("Worker {} exiting after {} items", id, processed);
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Lazy stream of completed items
pub struct Results<I, O> {
    rx: Receiver<Outcome<I, O>>,
    workers: Vec<JoinHandle<()>>,
    cancel: CancelHandle,
}

impl<I, O> Results<I, O> {
    /// Skip every item not yet dispatched
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    fn join_workers(&mut self) {
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("Worker thread terminated abnormally");
            }
        }
    }
}

impl<I, O> Iterator for Results<I, O> {
    type Item = Outcome<I, O>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.rx.recv() {
            Ok(outcome) => Some(outcome),
            Err(_) => {
                self.join_workers();
                None
            }
        }
    }
}

impl<I, O> Drop for Results<I, O> {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            // Abandoned early: skip what is left, then wait for workers
            self.cancel.cancel();
            while self.rx.recv().is_ok() {}
            self.join_workers();
        }
    }
}
