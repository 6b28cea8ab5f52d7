use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ProcessingError;
use crate::model::{Batch, BatchStatus, ProcessingOptions, ProcessingRecord, UploadStatus};
use crate::store::StatusStore;
use crate::worker::WorkerPool;

/// Batches created from uploaded archives, keyed by batch id.
pub struct BatchRegistry {
    batches: RwLock<HashMap<String, Batch>>,
    store: Arc<dyn StatusStore>,
    pool: Arc<WorkerPool>,
}

impl BatchRegistry {
    pub fn new(store: Arc<dyn StatusStore>, pool: Arc<WorkerPool>) -> Self {
        Self {
            batches: RwLock::new(HashMap::new()),
            store,
            pool,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Batch>> {
        match self.batches.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Batch registry lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Batch>> {
        match self.batches.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Batch registry lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    pub fn register(&self, batch: Batch) {
        self.write().insert(batch.batch_id.clone(), batch);
    }

    pub fn get(&self, batch_id: &str) -> Option<Batch> {
        self.read().get(batch_id).cloned()
    }

    /// Starts processing every `Pending` member of a batch and returns how
    /// many were submitted.
    ///
    /// Members are claimed under the registry lock, so calling this twice
    /// never submits the same member twice. A member whose record cannot be
    /// created or queued is marked `Failed` and not counted. The batch only
    /// moves to `Processing` once at least one member was submitted.
    pub fn start_batch(
        &self,
        batch_id: &str,
        options: ProcessingOptions,
    ) -> Result<usize, ProcessingError> {
        let claimed = {
            let mut batches = self.write();
            let batch = batches
                .get_mut(batch_id)
                .ok_or_else(|| ProcessingError::batch_not_found(batch_id))?;

            let mut claimed = Vec::new();
            for file in batch
                .files
                .iter_mut()
                .filter(|f| f.status == UploadStatus::Pending)
            {
                let process_id = Uuid::new_v4().to_string();
                file.status = UploadStatus::Processing;
                file.process_id = Some(process_id.clone());
                claimed.push(ProcessingRecord::new(process_id, file.clone(), options));
            }
            claimed
        };

        let mut submitted = 0;
        let mut rejected = Vec::new();
        for record in &claimed {
            if let Err(e) = self.store.create(record.clone()) {
                warn!("Could not create record for {}: {}", record.file_name, e);
                rejected.push((record.process_id.as_str(), e.to_string()));
                continue;
            }
            match self.pool.dispatch(record) {
                Ok(()) => submitted += 1,
                Err(e) => {
                    warn!("Could not queue {}: {}", record.file_name, e);
                    rejected.push((
                        record.process_id.as_str(),
                        format!("Failed to queue processing: {}", e),
                    ));
                }
            }
        }

        if let Some(batch) = self.write().get_mut(batch_id) {
            for (process_id, message) in rejected {
                if let Some(file) = batch
                    .files
                    .iter_mut()
                    .find(|f| f.process_id.as_deref() == Some(process_id))
                {
                    file.mark_failed(message);
                }
            }
            if submitted > 0 {
                batch.overall_status = BatchStatus::Processing;
            }
        }

        info!(
            batch_id,
            submitted,
            claimed = claimed.len(),
            "Batch processing started"
        );
        Ok(submitted)
    }
}
