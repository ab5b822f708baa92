//! Store Module
//!
//! Directory-backed record store shared by all key-value shaped tables.
//!
//! ## Responsibilities
//! - Directory lifecycle (create on request, reject missing/read-only paths)
//! - Named regions mapping string keys to serialized values
//! - Atomic whole-file commits (write temp, fsync, rename)
//! - Explicit close; every operation after close fails fast
//!
//! ## File Format (V1)
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Header                                 │
//! │ ┌──────────┬──────────┬──────────────┐ │
//! │ │Magic (4) │Version(2)│ Body Len (4) │ │
//! │ └──────────┴──────────┴──────────────┘ │
//! ├────────────────────────────────────────┤
//! │ Body (bincode)                         │
//! │   region → (key → value bytes)         │
//! ├────────────────────────────────────────┤
//! │ Footer                                 │
//! │ ┌──────────────────┐                   │
//! │ │   CRC32 (4)      │                   │
//! │ └──────────────────┘                   │
//! └────────────────────────────────────────┘
//! ```

mod format;
mod handle;

pub use format::{decode, encode, read_file, write_atomic, write_file, Regions, HEADER_SIZE, MAGIC};
pub use handle::{prepare_dir, Store};
