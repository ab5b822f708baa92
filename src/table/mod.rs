//! Table Module
//!
//! Typed load/mutate/save round-trips over one named region of a store.
//!
//! ## Shapes
//! - [`SingleRecordTable`] - zero or one record, one key per declared field
//! - [`SetTable`]          - unique `(field1, field2)` pairs
//! - [`ExternalTable`]     - index in the store, payload in one file per record
//! - [`DecoupledTable`]    - external table whose index lives in a private store
//! - [`KeyValueTable`]     - unconstrained string map
//!
//! Tables stage state in memory. Nothing reaches disk until `save()` (or one
//! of the single-record helpers such as `put`) is called. Tables perform no
//! internal locking: one writer per table.

mod decoupled;
mod external;
mod kv;
mod set;
mod single;

pub use decoupled::DecoupledTable;
pub use external::{ExternalTable, NamingScheme};
pub use kv::KeyValueTable;
pub use set::SetTable;
pub use single::SingleRecordTable;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Contract shared by every table shape
pub trait Table {
    /// What `set` stages
    type Input;

    /// What `parse` reconstructs
    type Output;

    /// Region name inside the backing store
    fn name(&self) -> &str;

    /// Populate staged state from the store; a missing region is empty
    fn load(&mut self) -> Result<()>;

    /// Replace staged content
    fn set(&mut self, input: Self::Input) -> Result<()>;

    /// Persist staged content in one atomic commit
    fn save(&mut self) -> Result<()>;

    /// Rebuild typed data from staged content, keeping only declared fields
    fn parse(&self) -> Result<Self::Output>;
}

pub(crate) fn encode_value<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(bincode::serialize(value)?)
}

pub(crate) fn decode_value<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(bincode::deserialize(bytes)?)
}
