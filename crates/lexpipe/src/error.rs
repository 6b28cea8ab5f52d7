use std::path::PathBuf;
use thiserror::Error;

use crate::model::ProcessingStatus;

#[derive(Error, Debug)]
pub enum LexpipeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("Processing error: {0}")]
    Processing(#[from] ProcessingError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid stage policy for '{stage}': {reason}")]
    InvalidStagePolicy { stage: String, reason: String },
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Failed to read archive: {0}")]
    InvalidArchive(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Upload storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Upload task failed: {0}")]
    Task(String),
}

/// Failures raised by a text extraction collaborator.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("No text could be extracted from the document")]
    EmptyText,

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to read document '{path}': {source}")]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to process PDF: {0}")]
    PdfProcessing(String),

    #[error("Failed to process DOCX: {0}")]
    DocxProcessing(String),

    #[error("Extraction task failed: {0}")]
    Task(String),
}

/// Failures raised by an analysis collaborator.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Analysis backend unavailable: {0}")]
    Unavailable(String),

    #[error("Analysis response could not be parsed: {0}")]
    InvalidResponse(String),

    #[error("Analysis failed: {0}")]
    Failed(String),
}

/// Errors surfaced by the processing facade, the status store and the retry controller.
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Can only retry failed processing (current status: {status})")]
    RetryNotAllowed {
        process_id: String,
        status: ProcessingStatus,
    },

    #[error("Can only cancel processing in progress (current status: {status})")]
    CancelNotAllowed {
        process_id: String,
        status: ProcessingStatus,
    },

    #[error("Processing not yet completed")]
    ResultNotReady {
        status: ProcessingStatus,
        progress: u8,
    },

    #[error("Processing record already exists: {0}")]
    AlreadyExists(String),

    #[error("Stale update for '{process_id}' (attempt {attempt} superseded)")]
    Superseded { process_id: String, attempt: u32 },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Dispatch failed: {0}")]
    Dispatch(#[from] WorkerError),
}

impl ProcessingError {
    pub fn process_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Processing",
            id: id.into(),
        }
    }

    pub fn batch_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Batch",
            id: id.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to scan directory '{path}': {source}")]
    ScanDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize result: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("File already exists: {0}")]
    FileExists(PathBuf),

    #[error("Failed to remove file '{path}': {source}")]
    RemoveFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,

    #[error("Worker {worker_id} panicked: {message}")]
    Panicked { worker_id: usize, message: String },
}

pub type Result<T> = std::result::Result<T, LexpipeError>;
