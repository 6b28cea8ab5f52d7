pub mod analysis;
pub mod batch;
pub mod confidence;
pub mod config;
pub mod error;
pub mod extract;
pub mod intake;
pub mod model;
pub mod pipeline;
pub mod retry;
pub mod sanitize;
pub mod service;
pub mod storage;
pub mod store;
pub mod telemetry;
pub mod worker;

pub use analysis::{DocumentAnalyzer, HeuristicAnalyzer};
pub use batch::BatchRegistry;
pub use config::{load_config, load_or_default, resolve_config_path, Config, LogFormat};
pub use error::{
    AnalysisError, ConfigError, ExtractionError, LexpipeError, ProcessingError, Result,
    StorageError, UploadError, WorkerError,
};
pub use extract::{LocalExtractor, TextExtractor};
pub use intake::UploadIntake;
pub use pipeline::{Pipeline, PipelineConfig, PipelineContext, PipelineError};
pub use retry::RetryController;
pub use service::ProcessingService;
pub use store::{MemoryStatusStore, StatusCounts, StatusStore};
pub use worker::WorkerPool;
