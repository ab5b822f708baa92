//! # NovelStore
//!
//! Local persistence for scraped novels plus a bounded worker pool for
//! network-bound fetches:
//! - Directory-backed record store with atomic, checksummed commits
//! - Typed tables over named store regions (single, set, external, decoupled, key-value)
//! - Chapter payloads stored one file per chapter, loaded lazily on request
//! - Concurrent actions controller streaming results in completion order
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      NovelService                            │
//! │         (create / update / download pending)                 │
//! └───────────┬───────────────────────────────────┬─────────────┘
//!             │                                   │
//!             ▼                                   ▼
//!   ┌───────────────────┐               ┌───────────────────┐
//!   │     NovelData     │               │    Controller     │
//!   │  (tables, close)  │◀── results ───│ (worker threads)  │
//!   └─────────┬─────────┘               └───────────────────┘
//!             │
//!    ┌────────┴─────────────┬─────────────────────┐
//!    ▼                      ▼                     ▼
//! ┌──────────┐       ┌─────────────┐       ┌─────────────┐
//! │ data.db  │       │ pending.db  │       │ chapters/   │
//! │ (shared) │       │ (decoupled) │       │ (payloads)  │
//! └──────────┘       └─────────────┘       └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod value;
pub mod models;
pub mod store;
pub mod table;
pub mod database;
pub mod action;
pub mod source;
pub mod service;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{NovelError, Result};
pub use config::Config;
pub use database::NovelData;
pub use action::{ActionError, BatchReport, ConcurrentActionsController, Outcome};
pub use models::{Chapter, MetaData, Novel};
pub use service::NovelService;
pub use source::{NovelListing, NovelSource};
pub use table::Table;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of NovelStore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
