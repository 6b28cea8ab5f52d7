use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::ProcessingError;
use crate::model::{ProcessingRecord, ProcessingStatus};

use super::{Mutation, StatusCounts, StatusStore};

/// In-memory [`StatusStore`]. Records live for the lifetime of the process.
#[derive(Default)]
pub struct MemoryStatusStore {
    records: RwLock<HashMap<String, ProcessingRecord>>,
}

impl MemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, ProcessingRecord>> {
        match self.records.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Status store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, ProcessingRecord>> {
        match self.records.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Status store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl StatusStore for MemoryStatusStore {
    fn create(&self, record: ProcessingRecord) -> Result<(), ProcessingError> {
        let mut records = self.write();
        if records.contains_key(&record.process_id) {
            return Err(ProcessingError::AlreadyExists(record.process_id));
        }
        records.insert(record.process_id.clone(), record);
        Ok(())
    }

    fn get(&self, process_id: &str) -> Option<ProcessingRecord> {
        self.read().get(process_id).cloned()
    }

    fn mutate(
        &self,
        process_id: &str,
        mutation: Mutation<'_>,
    ) -> Result<ProcessingRecord, ProcessingError> {
        let mut records = self.write();
        let current = records
            .get_mut(process_id)
            .ok_or_else(|| ProcessingError::process_not_found(process_id))?;

        let mut draft = current.clone();
        mutation(&mut draft)?;
        *current = draft.clone();
        Ok(draft)
    }

    fn list(&self) -> Vec<ProcessingRecord> {
        let mut records: Vec<ProcessingRecord> = self.read().values().cloned().collect();
        records.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        records
    }

    fn counts(&self) -> StatusCounts {
        self.read()
            .values()
            .fold(StatusCounts::default(), |mut counts, record| {
                match record.status {
                    ProcessingStatus::Processing => counts.processing += 1,
                    ProcessingStatus::Completed => counts.completed += 1,
                    ProcessingStatus::Failed => counts.failed += 1,
                }
                counts
            })
    }
}
