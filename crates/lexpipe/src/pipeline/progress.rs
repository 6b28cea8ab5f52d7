use std::sync::{Arc, Mutex};

use crate::error::ProcessingError;
use crate::model::{ProcessingRecord, ProcessingResult, ProcessingStatus};
use crate::store::StatusStore;

use super::stage::Stage;

/// Events emitted by the pipeline during a run.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Stage(Stage),
    Completed { result: Box<ProcessingResult> },
    Failed { error: String },
}

pub trait ProgressReporter: Send + Sync {
    /// Returns false if the event was dropped.
    fn report(&self, event: ProgressEvent) -> bool;
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) -> bool {
        true
    }
}

/// Collects events in order. Used by tests that assert on the event sequence.
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ProgressReporter for RecordingProgress {
    fn report(&self, event: ProgressEvent) -> bool {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
        true
    }
}

/// Writes pipeline events into the status store for one attempt of one record.
///
/// Updates are dropped once the record has left `Processing` or has been
/// re-armed for a later attempt, so a slow or cancelled run can never clobber
/// newer state.
pub struct StoreProgress {
    store: Arc<dyn StatusStore>,
    process_id: String,
    attempt: u32,
}

impl StoreProgress {
    pub fn new(store: Arc<dyn StatusStore>, process_id: impl Into<String>, attempt: u32) -> Self {
        Self {
            store,
            process_id: process_id.into(),
            attempt,
        }
    }

    fn apply(&self, event: ProgressEvent) -> Result<(), ProcessingError> {
        let attempt = self.attempt;
        let process_id = self.process_id.clone();
        let mut event = Some(event);

        self.store.mutate(&self.process_id, &mut |record: &mut ProcessingRecord| {
            if record.retry_count != attempt || record.status != ProcessingStatus::Processing {
                return Err(ProcessingError::Superseded {
                    process_id: process_id.clone(),
                    attempt,
                });
            }
            match event.take() {
                Some(ProgressEvent::Stage(stage)) => record.enter_stage(stage),
                Some(ProgressEvent::Completed { result }) => record.complete(*result),
                Some(ProgressEvent::Failed { error }) => record.fail(error),
                None => {}
            }
            Ok(())
        })?;
        Ok(())
    }
}

impl ProgressReporter for StoreProgress {
    fn report(&self, event: ProgressEvent) -> bool {
        match self.apply(event) {
            Ok(()) => true,
            Err(ProcessingError::Superseded { .. }) => {
                tracing::debug!(
                    process_id = %self.process_id,
                    attempt = self.attempt,
                    "Dropping update for superseded attempt"
                );
                false
            }
            Err(e) => {
                tracing::warn!(process_id = %self.process_id, "Failed to record progress: {}", e);
                false
            }
        }
    }
}
