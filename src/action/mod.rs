//! Action Module
//!
//! Bounded worker pool over a growable work queue, with results streamed
//! back in completion order.
//!
//! ## Lifecycle
//! ```text
//!   new()           add()*              iter()                 exhausted
//! ┌─────────┐    ┌───────────┐      ┌────────────┐         ┌──────────┐
//! │ Created │───▶│ Accepting │─────▶│  Draining  │────────▶│   Done   │
//! └─────────┘    └───────────┘      └────────────┘         └──────────┘
//!  no workers     one worker per     queue closed,          all workers
//!                 add, up to cap     workers finish queue   exited, joined
//! ```
//!
//! ## Concurrency
//! - Work queue: crossbeam MPMC channel shared by all workers
//! - Results: crossbeam channel; every worker owns one sender, so the stream
//!   ends exactly when the last worker exits (no shared "done" flag)
//! - Per-item failures and panics are captured and paired with their item
//! - Cancellation: shared atomic flag checked before each dispatch

mod controller;
mod outcome;

pub use controller::{available_parallelism, CancelHandle, ConcurrentActionsController, Results};
pub use outcome::{ActionError, BatchReport, Outcome};
