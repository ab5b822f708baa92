//! Per-item outcomes and batch summaries

use thiserror::Error;

/// Why a single item did not produce a result
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// The action returned an error
    #[error("action failed: {0}")]
    Failed(String),

    /// The action panicked; the worker survived
    #[error("action panicked: {0}")]
    Panicked(String),

    /// Skipped because the controller was cancelled
    #[error("cancelled before dispatch")]
    Cancelled,
}

/// One completed item
#[derive(Debug)]
pub struct Outcome<I, O> {
    /// The originating input
    pub item: I,

    /// Output or captured failure
    pub result: Result<O, ActionError>,
}

impl<I, O> Outcome<I, O> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Summary of a batch: how many succeeded, and which items failed
#[derive(Debug)]
pub struct BatchReport<I> {
    pub succeeded: usize,
    pub failed: Vec<(I, ActionError)>,
}

impl<I> Default for BatchReport<I> {
    fn default() -> Self {
        Self {
            succeeded: 0,
            failed: Vec::new(),
        }
    }
}

impl<I> BatchReport<I> {
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, item: I, error: ActionError) {
        self.failed.push((item, error));
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed.len()
    }

    /// True when no item failed
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
