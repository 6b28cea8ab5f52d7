//! Facade over intake, batches, the status store and the worker pool.
//!
//! The HTTP layer talks only to [`ProcessingService`]. Everything it needs is
//! passed in at construction time.

use std::path::Path;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::analysis::DocumentAnalyzer;
use crate::batch::BatchRegistry;
use crate::config::Config;
use crate::error::{self, ProcessingError, UploadError, WorkerError};
use crate::extract::TextExtractor;
use crate::intake::UploadIntake;
use crate::model::{
    Batch, OptionsRequest, ProcessingOptions, ProcessingRecord, ProcessingResult,
    ProcessingStatus, UploadedFile,
};
use crate::pipeline::{Pipeline, PipelineConfig};
use crate::retry::RetryController;
use crate::sanitize;
use crate::storage::ResultArchive;
use crate::store::{MemoryStatusStore, StatusCounts, StatusStore};
use crate::worker::WorkerPool;

pub const CANCELLED_MESSAGE: &str = "Processing cancelled";

pub struct ProcessingService {
    store: Arc<dyn StatusStore>,
    pool: Arc<WorkerPool>,
    intake: UploadIntake,
    batches: BatchRegistry,
    retries: RetryController,
    defaults: ProcessingOptions,
}

impl ProcessingService {
    /// Builds the service with an in-memory status store.
    ///
    /// Must be called from within a tokio runtime since it starts the workers.
    pub fn new(
        config: &Config,
        extractor: Arc<dyn TextExtractor>,
        analyzer: Arc<dyn DocumentAnalyzer>,
    ) -> error::Result<Self> {
        Self::with_store(
            config,
            Arc::new(MemoryStatusStore::new()),
            extractor,
            analyzer,
        )
    }

    pub fn with_store(
        config: &Config,
        store: Arc<dyn StatusStore>,
        extractor: Arc<dyn TextExtractor>,
        analyzer: Arc<dyn DocumentAnalyzer>,
    ) -> error::Result<Self> {
        let pipeline_config = PipelineConfig::from_config(config);
        let archive = ResultArchive::open(&pipeline_config.output_directory)?;
        let pipeline = Arc::new(Pipeline::new(
            Arc::new(pipeline_config),
            extractor,
            analyzer,
            Arc::new(archive),
        ));
        let pool = Arc::new(WorkerPool::new(
            pipeline,
            Arc::clone(&store),
            config.worker_count,
        ));

        Ok(Self {
            intake: UploadIntake::new(&config.upload_directory, &config.temp_directory)
                .with_max_member_bytes(config.max_file_size_bytes() as u64),
            batches: BatchRegistry::new(Arc::clone(&store), Arc::clone(&pool)),
            retries: RetryController::new(Arc::clone(&store), Arc::clone(&pool)),
            defaults: config.defaults,
            store,
            pool,
        })
    }

    pub fn intake(&self) -> &UploadIntake {
        &self.intake
    }

    /// Fills missing option fields from the configured defaults.
    pub fn resolve_options(
        &self,
        request: Option<&OptionsRequest>,
    ) -> Result<ProcessingOptions, ProcessingError> {
        match request {
            Some(request) => request.resolve(&self.defaults),
            None => Ok(self.defaults),
        }
    }

    pub async fn upload_single(
        &self,
        file_name: &str,
        content: &[u8],
    ) -> Result<UploadedFile, UploadError> {
        self.intake.ingest_single(file_name, content).await
    }

    /// Extracts an archive and registers the resulting batch.
    pub async fn upload_archive(
        &self,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<Batch, UploadError> {
        let batch = self.intake.ingest_archive(file_name, content).await?;
        self.batches.register(batch.clone());
        Ok(batch)
    }

    /// Starts processing one stored document and returns its process id
    /// without waiting for the run.
    pub async fn process_document(
        &self,
        file: UploadedFile,
        options: ProcessingOptions,
    ) -> Result<String, ProcessingError> {
        self.verify_source(&file).await?;

        let process_id = Uuid::new_v4().to_string();
        let record = ProcessingRecord::new(&process_id, file, options);
        self.store.create(record.clone())?;
        self.pool.dispatch(&record)?;

        info!(
            process_id = %process_id,
            file = %record.file_name,
            "Processing started"
        );
        Ok(process_id)
    }

    /// Rejects files that are missing or live outside the upload and temp directories.
    async fn verify_source(&self, file: &UploadedFile) -> Result<(), ProcessingError> {
        let not_found = || ProcessingError::NotFound {
            kind: "File",
            id: file.id.clone(),
        };
        let path = file.stored_path.as_deref().ok_or_else(not_found)?;
        let resolved = tokio::fs::canonicalize(path)
            .await
            .map_err(|_| not_found())?;

        for root in [self.intake.upload_directory(), self.intake.temp_directory()] {
            if is_within(&resolved, root).await {
                return Ok(());
            }
        }

        tracing::warn!(
            "Rejected source outside storage: {}",
            sanitize::redact_path(path)
        );
        Err(ProcessingError::InvalidRequest(
            "File is outside the upload directories".to_string(),
        ))
    }

    pub fn process_batch(
        &self,
        batch_id: &str,
        options: ProcessingOptions,
    ) -> Result<usize, ProcessingError> {
        self.batches.start_batch(batch_id, options)
    }

    pub fn batch(&self, batch_id: &str) -> Result<Batch, ProcessingError> {
        self.batches
            .get(batch_id)
            .ok_or_else(|| ProcessingError::batch_not_found(batch_id))
    }

    /// Current record without its result payload.
    pub fn status(&self, process_id: &str) -> Result<ProcessingRecord, ProcessingError> {
        self.store
            .get(process_id)
            .map(|record| record.without_result())
            .ok_or_else(|| ProcessingError::process_not_found(process_id))
    }

    pub fn result(&self, process_id: &str) -> Result<ProcessingResult, ProcessingError> {
        let record = self
            .store
            .get(process_id)
            .ok_or_else(|| ProcessingError::process_not_found(process_id))?;

        let not_ready = ProcessingError::ResultNotReady {
            status: record.status,
            progress: record.progress,
        };
        match (record.status, record.result) {
            (ProcessingStatus::Completed, Some(result)) => Ok(result),
            _ => Err(not_ready),
        }
    }

    pub fn retry(&self, process_id: &str) -> Result<ProcessingRecord, ProcessingError> {
        self.retries.retry(process_id)
    }

    /// Fails a running record and signals its run to stop.
    ///
    /// The record is failed first, so whatever the run reports afterwards is
    /// dropped as superseded.
    pub fn cancel(&self, process_id: &str) -> Result<ProcessingRecord, ProcessingError> {
        let record = self
            .store
            .mutate(process_id, &mut |record: &mut ProcessingRecord| {
                if record.status != ProcessingStatus::Processing {
                    return Err(ProcessingError::CancelNotAllowed {
                        process_id: record.process_id.clone(),
                        status: record.status,
                    });
                }
                record.fail(CANCELLED_MESSAGE);
                Ok(())
            })?;

        let signalled = self.pool.cancel(process_id);
        info!(process_id, signalled, "Processing cancelled");
        Ok(record)
    }

    pub fn counts(&self) -> StatusCounts {
        self.store.counts()
    }

    /// Stops the workers. Queued and running documents are cancelled and
    /// their records failed.
    pub async fn shutdown(&self) -> Result<(), WorkerError> {
        self.pool.shutdown();
        self.pool.wait().await
    }
}

async fn is_within(path: &Path, root: &Path) -> bool {
    match tokio::fs::canonicalize(root).await {
        Ok(root) => path.starts_with(root),
        Err(_) => false,
    }
}
