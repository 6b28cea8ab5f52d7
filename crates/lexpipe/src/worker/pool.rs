use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, Instrument};

use crate::error::{ProcessingError, WorkerError};
use crate::model::{ProcessingRecord, ProcessingStatus};
use crate::pipeline::{Pipeline, PipelineContext, StoreProgress};
use crate::store::StatusStore;
use crate::worker::job::{Job, JobOutcome};

type SharedReceiver = Arc<Mutex<mpsc::UnboundedReceiver<Job>>>;

pub const SHUTDOWN_MESSAGE: &str = "Processing interrupted by shutdown";

/// Cancellation handles of queued and running jobs, keyed by process id.
#[derive(Default)]
struct ActiveJobs {
    tokens: RwLock<HashMap<String, (u32, CancellationToken)>>,
}

impl ActiveJobs {
    fn insert(&self, job: &Job) {
        let mut tokens = match self.tokens.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Active job lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        tokens.insert(job.process_id.clone(), (job.attempt, job.cancel.clone()));
    }

    /// Removes the entry only if it still belongs to `attempt`.
    fn remove(&self, process_id: &str, attempt: u32) {
        let mut tokens = match self.tokens.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Active job lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        if matches!(tokens.get(process_id), Some((a, _)) if *a == attempt) {
            tokens.remove(process_id);
        }
    }

    fn cancel(&self, process_id: &str) -> bool {
        let tokens = match self.tokens.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Active job lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        match tokens.get(process_id) {
            Some((_, token)) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancels and forgets every entry, returning what was queued or running.
    fn cancel_all(&self) -> Vec<(String, u32)> {
        let mut tokens = match self.tokens.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Active job lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        tokens
            .drain()
            .map(|(process_id, (attempt, token))| {
                token.cancel();
                (process_id, attempt)
            })
            .collect()
    }

    fn len(&self) -> usize {
        match self.tokens.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

/// Fixed set of async workers fed by an unbounded job queue.
///
/// At most `worker_count` pipeline runs execute at once; the rest wait in the
/// queue. Must be created from within a tokio runtime.
pub struct WorkerPool {
    job_sender: mpsc::UnboundedSender<Job>,
    workers: std::sync::Mutex<Vec<JoinHandle<()>>>,
    shutdown: CancellationToken,
    active: Arc<ActiveJobs>,
    store: Arc<dyn StatusStore>,
}

impl WorkerPool {
    /// # Panics
    /// Panics if `worker_count` is 0.
    pub fn new(pipeline: Arc<Pipeline>, store: Arc<dyn StatusStore>, worker_count: usize) -> Self {
        assert!(worker_count > 0, "worker_count must be > 0");
        let (job_sender, job_receiver) = mpsc::unbounded_channel::<Job>();
        let job_receiver: SharedReceiver = Arc::new(Mutex::new(job_receiver));
        let shutdown = CancellationToken::new();
        let active = Arc::new(ActiveJobs::default());

        let workers: Vec<JoinHandle<()>> = (0..worker_count)
            .map(|worker_id| {
                tokio::spawn(run_worker(
                    worker_id,
                    Arc::clone(&job_receiver),
                    shutdown.clone(),
                    Arc::clone(&pipeline),
                    Arc::clone(&store),
                    Arc::clone(&active),
                ))
            })
            .collect();

        info!("Started {} workers", worker_count);

        Self {
            job_sender,
            workers: std::sync::Mutex::new(workers),
            shutdown,
            active,
            store,
        }
    }

    /// Queues a job without waiting for it to run.
    pub fn submit(&self, job: Job) -> Result<(), WorkerError> {
        if self.shutdown.is_cancelled() {
            return Err(WorkerError::ChannelClosed);
        }

        self.active.insert(&job);
        let (process_id, attempt) = (job.process_id.clone(), job.attempt);
        // A shutdown that drained the active set before the insert above
        // would never see this job.
        if self.shutdown.is_cancelled() {
            self.active.remove(&process_id, attempt);
            return Err(WorkerError::ChannelClosed);
        }
        self.job_sender.send(job).map_err(|_| {
            self.active.remove(&process_id, attempt);
            WorkerError::ChannelClosed
        })
    }

    /// Submits the current attempt of `record`. If the job cannot be queued
    /// the record is marked failed so it does not stay `Processing` forever.
    pub fn dispatch(&self, record: &ProcessingRecord) -> Result<(), WorkerError> {
        let job = Job::new(
            &record.process_id,
            record.file.clone(),
            record.options,
            record.retry_count,
        );
        if let Err(e) = self.submit(job) {
            let message = format!("Failed to queue processing: {}", e);
            let marked = self
                .store
                .mutate(&record.process_id, &mut |r: &mut ProcessingRecord| {
                    r.fail(message.clone());
                    Ok(())
                });
            if let Err(store_err) = marked {
                error!("Could not mark {} failed: {}", record.process_id, store_err);
            }
            return Err(e);
        }
        Ok(())
    }

    /// Signals the job's cancellation token. Returns false if the job is not
    /// queued or running.
    pub fn cancel(&self, process_id: &str) -> bool {
        self.active.cancel(process_id)
    }

    /// Number of queued or running jobs.
    pub fn in_flight(&self) -> usize {
        self.active.len()
    }

    /// Stops taking jobs and cancels every queued or running one.
    ///
    /// Their records are failed with [`SHUTDOWN_MESSAGE`] unless they already
    /// moved on, so nothing is left `Processing` once the pool is gone.
    pub fn shutdown(&self) {
        info!("Shutting down worker pool...");
        self.shutdown.cancel();

        let interrupted = self.active.cancel_all();
        for (process_id, attempt) in &interrupted {
            let attempt = *attempt;
            let failed = self
                .store
                .mutate(process_id, &mut |r: &mut ProcessingRecord| {
                    if r.retry_count != attempt || r.status != ProcessingStatus::Processing {
                        return Err(ProcessingError::Superseded {
                            process_id: r.process_id.clone(),
                            attempt,
                        });
                    }
                    r.fail(SHUTDOWN_MESSAGE);
                    Ok(())
                });
            match failed {
                Ok(_) | Err(ProcessingError::Superseded { .. }) => {}
                Err(e) => error!("Could not mark {} interrupted: {}", process_id, e),
            }
        }
        if !interrupted.is_empty() {
            info!("Interrupted {} queued or running jobs", interrupted.len());
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Waits for every worker to stop. Call [`WorkerPool::shutdown`] first.
    /// Cancelled runs stop at their next stage boundary or collaborator call.
    pub async fn wait(&self) -> Result<(), WorkerError> {
        let workers = match self.workers.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };

        let mut first_error = None;
        for (worker_id, worker) in workers.into_iter().enumerate() {
            match worker.await {
                Ok(()) => debug!("Worker {} finished", worker_id),
                Err(e) => {
                    error!("Worker {} panicked: {:?}", worker_id, e);
                    first_error.get_or_insert(WorkerError::Panicked {
                        worker_id,
                        message: e.to_string(),
                    });
                }
            }
        }

        info!("All workers have stopped");
        first_error.map_or(Ok(()), Err)
    }
}

async fn run_worker(
    worker_id: usize,
    job_receiver: SharedReceiver,
    shutdown: CancellationToken,
    pipeline: Arc<Pipeline>,
    store: Arc<dyn StatusStore>,
    active: Arc<ActiveJobs>,
) {
    debug!("Worker {} started", worker_id);

    loop {
        let next = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                debug!("Worker {} received shutdown signal", worker_id);
                break;
            }
            job = async { job_receiver.lock().await.recv().await } => job,
        };

        let Some(job) = next else {
            debug!("Worker {} job channel disconnected", worker_id);
            break;
        };

        debug!("Worker {} processing {}", worker_id, job.process_id);
        let (process_id, attempt) = (job.process_id.clone(), job.attempt);
        let progress = StoreProgress::new(Arc::clone(&store), process_id.clone(), attempt);

        let (outcome, _ctx) = pipeline
            .run(PipelineContext::new(job), &progress)
            .instrument(tracing::debug_span!("worker", worker_id))
            .await;
        active.remove(&process_id, attempt);
        log_outcome(worker_id, &outcome);
    }

    debug!("Worker {} stopped", worker_id);
}

fn log_outcome(worker_id: usize, outcome: &JobOutcome) {
    if outcome.success {
        debug!(
            "Worker {} finished {} as {}",
            worker_id,
            outcome.process_id,
            outcome.result_id.as_deref().unwrap_or("-")
        );
    } else {
        debug!(
            "Worker {} failed {} (attempt {}): {}",
            worker_id,
            outcome.process_id,
            outcome.attempt,
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::HeuristicAnalyzer;
    use crate::extract::LocalExtractor;
    use crate::error::ExtractionError;
    use crate::extract::TextExtractor;
    use crate::model::{DocumentFormat, ProcessingOptions, UploadStatus, UploadedFile};
    use crate::pipeline::{PipelineConfig, StagePolicies};
    use crate::storage::ResultArchive;
    use crate::store::MemoryStatusStore;
    use async_trait::async_trait;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Never finishes reading the document.
    struct StuckExtractor;

    #[async_trait]
    impl TextExtractor for StuckExtractor {
        async fn extract_text(
            &self,
            _path: &Path,
            _format: DocumentFormat,
        ) -> Result<String, ExtractionError> {
            std::future::pending().await
        }
    }

    fn create_pool(output_dir: &Path, store: Arc<MemoryStatusStore>, workers: usize) -> WorkerPool {
        create_pool_with(output_dir, store, workers, Arc::new(LocalExtractor::new()))
    }

    fn create_pool_with(
        output_dir: &Path,
        store: Arc<MemoryStatusStore>,
        workers: usize,
        extractor: Arc<dyn TextExtractor>,
    ) -> WorkerPool {
        let config = Arc::new(PipelineConfig {
            output_directory: output_dir.to_path_buf(),
            stage_timeout: None,
            run_deadline: None,
            policies: StagePolicies::default(),
        });
        let pipeline = Arc::new(Pipeline::new(
            config,
            extractor,
            Arc::new(HeuristicAnalyzer::new()),
            Arc::new(ResultArchive::open(output_dir).unwrap()),
        ));
        WorkerPool::new(pipeline, store, workers)
    }

    async fn wait_terminal(store: &MemoryStatusStore, process_id: &str) -> ProcessingRecord {
        for _ in 0..200 {
            if let Some(record) = store.get(process_id) {
                if record.is_terminal() {
                    return record;
                }
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        panic!("record {} never reached a terminal state", process_id);
    }

    #[tokio::test]
    async fn test_worker_pool_creation() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStatusStore::new());
        let pool = create_pool(temp_dir.path(), store, 2);

        assert!(!pool.is_shutdown());
        pool.shutdown();
        assert!(pool.is_shutdown());
        pool.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_submit_and_process_text_job() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("lease.txt");
        std::fs::write(
            &input,
            "LEASE DEED between Asha Rao and Vikram Shah. Monthly rent Rs. 25,000. Tenant shall pay rent.",
        )
        .unwrap();

        let store = Arc::new(MemoryStatusStore::new());
        let pool = create_pool(&temp_dir.path().join("outputs"), store.clone(), 2);

        let file = UploadedFile::new("f1", "lease.txt", UploadStatus::Uploaded)
            .with_stored_path(input, 90);
        store
            .create(ProcessingRecord::new(
                "p1",
                file.clone(),
                ProcessingOptions::default(),
            ))
            .unwrap();
        pool.submit(Job::new("p1", file, ProcessingOptions::default(), 0))
            .unwrap();

        let record = wait_terminal(&store, "p1").await;
        assert_eq!(record.status, ProcessingStatus::Completed, "{:?}", record.error);
        assert_eq!(record.progress, 100);
        assert!(record.result.is_some());
        assert_eq!(pool.in_flight(), 0);

        pool.shutdown();
        pool.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_fails() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStatusStore::new());
        let pool = create_pool(temp_dir.path(), store, 1);
        pool.shutdown();

        let file = UploadedFile::new("f1", "a.txt", UploadStatus::Uploaded);
        let result = pool.submit(Job::new("p1", file, ProcessingOptions::default(), 0));
        assert!(matches!(result, Err(WorkerError::ChannelClosed)));
        pool.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_dispatch_after_shutdown_fails_record() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStatusStore::new());
        let pool = create_pool(temp_dir.path(), store.clone(), 1);
        pool.shutdown();

        let file = UploadedFile::new("f1", "a.txt", UploadStatus::Uploaded);
        let record = ProcessingRecord::new("p1", file, ProcessingOptions::default());
        store.create(record.clone()).unwrap();

        assert!(pool.dispatch(&record).is_err());
        let stored = store.get("p1").unwrap();
        assert_eq!(stored.status, ProcessingStatus::Failed);
        assert!(stored.error.unwrap().starts_with("Failed to queue processing"));
        pool.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_running_and_queued_jobs() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStatusStore::new());
        let pool = create_pool_with(temp_dir.path(), store.clone(), 1, Arc::new(StuckExtractor));

        for id in ["p1", "p2"] {
            let file = UploadedFile::new(format!("f-{}", id), "deed.txt", UploadStatus::Uploaded)
                .with_stored_path(temp_dir.path().join("deed.txt"), 9);
            let record = ProcessingRecord::new(id, file, ProcessingOptions::default());
            store.create(record.clone()).unwrap();
            pool.dispatch(&record).unwrap();
        }

        // p1 is stuck in text extraction, p2 is still queued behind it.
        for _ in 0..200 {
            if store.get("p1").unwrap().progress == 10 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(store.get("p1").unwrap().progress, 10);

        pool.shutdown();
        tokio::time::timeout(Duration::from_secs(5), pool.wait())
            .await
            .expect("workers did not stop after shutdown")
            .unwrap();

        for id in ["p1", "p2"] {
            let record = store.get(id).unwrap();
            assert_eq!(record.status, ProcessingStatus::Failed);
            assert_eq!(record.error.as_deref(), Some(SHUTDOWN_MESSAGE));
        }
        assert_eq!(pool.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_cancel_unknown_job() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStatusStore::new());
        let pool = create_pool(temp_dir.path(), store, 1);
        assert!(!pool.cancel("nope"));
        pool.shutdown();
        pool.wait().await.unwrap();
    }
}
