use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use crate::model::{ProcessingOptions, UploadedFile};

/// One attempt at processing one document.
#[derive(Debug, Clone)]
pub struct Job {
    pub process_id: String,
    pub file: UploadedFile,
    pub options: ProcessingOptions,
    /// Matches the record's `retry_count` at submission time.
    pub attempt: u32,
    pub cancel: CancellationToken,
}

impl Job {
    pub fn new(
        process_id: impl Into<String>,
        file: UploadedFile,
        options: ProcessingOptions,
        attempt: u32,
    ) -> Self {
        Self {
            process_id: process_id.into(),
            file,
            options,
            attempt,
            cancel: CancellationToken::new(),
        }
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.file.stored_path.as_deref()
    }
}

/// Summary of a finished run, logged by the worker that executed it.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub process_id: String,
    pub attempt: u32,
    pub success: bool,
    pub result_id: Option<String>,
    pub artifact_path: Option<PathBuf>,
    pub error: Option<String>,
}

impl JobOutcome {
    pub fn success(job: &Job, result_id: String, artifact_path: PathBuf) -> Self {
        Self {
            process_id: job.process_id.clone(),
            attempt: job.attempt,
            success: true,
            result_id: Some(result_id),
            artifact_path: Some(artifact_path),
            error: None,
        }
    }

    pub fn failure(job: &Job, error: String) -> Self {
        Self {
            process_id: job.process_id.clone(),
            attempt: job.attempt,
            success: false,
            result_id: None,
            artifact_path: None,
            error: Some(error),
        }
    }
}
