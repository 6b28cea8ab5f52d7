use thiserror::Error;

use crate::error::{AnalysisError, ExtractionError, StorageError};

use super::stage::Stage;

/// Run-fatal failures. The message is what ends up in the record's `error`.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("File '{0}' has no stored content")]
    MissingSource(String),

    #[error("{stage} failed: {source}")]
    Analysis {
        stage: Stage,
        #[source]
        source: AnalysisError,
    },

    #[error("{stage} timed out after {secs}s")]
    StageTimeout { stage: Stage, secs: u64 },

    #[error("Processing exceeded deadline of {secs}s")]
    DeadlineExceeded { secs: u64 },

    #[error("Processing cancelled")]
    Cancelled,

    #[error("Result of attempt {attempt} was not recorded")]
    Superseded { attempt: u32 },

    #[error("Failed to persist result: {0}")]
    Persist(#[from] StorageError),
}
