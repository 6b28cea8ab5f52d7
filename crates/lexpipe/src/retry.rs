use std::sync::Arc;

use tracing::info;

use crate::error::ProcessingError;
use crate::model::{ProcessingRecord, ProcessingStatus};
use crate::store::StatusStore;
use crate::worker::WorkerPool;

/// Re-arms failed records and hands them back to the worker pool.
pub struct RetryController {
    store: Arc<dyn StatusStore>,
    pool: Arc<WorkerPool>,
}

impl RetryController {
    pub fn new(store: Arc<dyn StatusStore>, pool: Arc<WorkerPool>) -> Self {
        Self { store, pool }
    }

    /// Retries a `Failed` record with its original file and options.
    ///
    /// Any other status is rejected with `RetryNotAllowed` and the record is
    /// left as it was.
    pub fn retry(&self, process_id: &str) -> Result<ProcessingRecord, ProcessingError> {
        let record = self
            .store
            .mutate(process_id, &mut |record: &mut ProcessingRecord| {
                if record.status != ProcessingStatus::Failed {
                    return Err(ProcessingError::RetryNotAllowed {
                        process_id: record.process_id.clone(),
                        status: record.status,
                    });
                }
                record.rearm_for_retry();
                Ok(())
            })?;

        info!(
            process_id,
            attempt = record.retry_count,
            "Retrying processing"
        );
        self.pool.dispatch(&record)?;
        Ok(record)
    }
}
