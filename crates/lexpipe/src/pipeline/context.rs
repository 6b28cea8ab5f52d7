use std::path::PathBuf;

use crate::model::{ProcessingResult, StageFailure};
use crate::worker::job::Job;

pub struct PipelineContext {
    // Input
    pub job: Job,

    // Step 1 result
    pub text_chars: usize,

    // Absorbed analysis failures, in stage order
    pub stage_failures: Vec<StageFailure>,

    // Final step results
    pub result: Option<ProcessingResult>,
    pub artifact_path: Option<PathBuf>,
}

impl PipelineContext {
    pub fn new(job: Job) -> Self {
        Self {
            job,
            text_chars: 0,
            stage_failures: Vec::new(),
            result: None,
            artifact_path: None,
        }
    }
}
