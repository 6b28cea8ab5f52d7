pub mod file;
pub mod options;
pub mod record;

pub use file::{
    extension_of, format_file_size, Batch, BatchStatus, DocumentFormat, UploadStatus,
    UploadedFile,
};
pub use options::{DetailLevel, InsightMode, OptionsRequest, OutputLanguage, ProcessingOptions};
pub use record::{
    ProcessingRecord, ProcessingResult, ProcessingStatus, StageFailure, INITIAL_STEP, RETRY_STEP,
};
