//! Status store for processing records.
//!
//! The store is the only writer of [`ProcessingRecord`] state. Every write goes
//! through [`StatusStore::mutate`], which applies the change to a copy and
//! commits it only when the mutation succeeds, so readers never observe a
//! half-applied update.

pub mod memory;

use serde::Serialize;

use crate::error::ProcessingError;
use crate::model::ProcessingRecord;

pub use memory::MemoryStatusStore;

/// Mutation applied by [`StatusStore::mutate`]. Returning an error discards the change.
pub type Mutation<'a> = &'a mut dyn FnMut(&mut ProcessingRecord) -> Result<(), ProcessingError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
}

pub trait StatusStore: Send + Sync {
    /// Inserts a new record. Fails with `AlreadyExists` if the id is taken.
    fn create(&self, record: ProcessingRecord) -> Result<(), ProcessingError>;

    fn get(&self, process_id: &str) -> Option<ProcessingRecord>;

    /// Applies `mutation` atomically and returns the committed record.
    fn mutate(
        &self,
        process_id: &str,
        mutation: Mutation<'_>,
    ) -> Result<ProcessingRecord, ProcessingError>;

    fn list(&self) -> Vec<ProcessingRecord>;

    fn counts(&self) -> StatusCounts;
}
