use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::{Classification, ExtractedData, Insights, Summary, TranslatedContent};
use crate::confidence::ConfidenceReport;
use crate::pipeline::Stage;

use super::file::UploadedFile;
use super::options::ProcessingOptions;

pub const INITIAL_STEP: &str = "Initializing";
pub const RETRY_STEP: &str = "Queued for retry";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessingStatus {
    Processing,
    Completed,
    Failed,
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Processing => "Processing",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        };
        f.write_str(s)
    }
}

/// An analysis stage failure that was replaced by the stage's fallback output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageFailure {
    pub stage: Stage,
    pub message: String,
}

/// Immutable output of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult {
    pub id: String,
    pub file_name: String,
    pub file_type: String,
    pub file_size: String,
    pub processing_status: ProcessingStatus,
    pub processing_progress: u8,
    /// Seconds from run start to completion.
    pub processing_duration: u64,
    pub processing_options: ProcessingOptions,
    pub document_classification: Classification,
    pub extracted_data: ExtractedData,
    pub translated_content: TranslatedContent,
    pub summary: Summary,
    pub insights: Insights,
    pub confidence: ConfidenceReport,
    #[serde(default)]
    pub processing_errors: Vec<StageFailure>,
    pub created_date: DateTime<Utc>,
}

/// Mutable status row for one document's processing, keyed by process id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingRecord {
    pub process_id: String,
    pub file_id: String,
    pub file_name: String,
    pub file: UploadedFile,
    pub options: ProcessingOptions,
    pub status: ProcessingStatus,
    pub progress: u8,
    pub current_step: String,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub retry_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ProcessingResult>,
}

impl ProcessingRecord {
    pub fn new(process_id: impl Into<String>, file: UploadedFile, options: ProcessingOptions) -> Self {
        Self {
            process_id: process_id.into(),
            file_id: file.id.clone(),
            file_name: file.file_name.clone(),
            file,
            options,
            status: ProcessingStatus::Processing,
            progress: 0,
            current_step: INITIAL_STEP.to_string(),
            start_time: Utc::now(),
            end_time: None,
            retry_count: 0,
            retry_time: None,
            error: None,
            result: None,
        }
    }

    /// Moves the record to `stage`. Never lowers progress.
    pub fn enter_stage(&mut self, stage: Stage) {
        if stage.progress() >= self.progress {
            self.progress = stage.progress();
            self.current_step = stage.label().to_string();
        }
    }

    pub fn complete(&mut self, result: ProcessingResult) {
        self.status = ProcessingStatus::Completed;
        self.progress = Stage::Completed.progress();
        self.current_step = Stage::Completed.label().to_string();
        self.end_time = Some(Utc::now());
        self.result = Some(result);
    }

    /// Marks the run failed; progress stays at the last stage reached.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = ProcessingStatus::Failed;
        self.error = Some(error.into());
        self.end_time = Some(Utc::now());
    }

    /// Resets a failed record for another attempt.
    pub fn rearm_for_retry(&mut self) {
        self.status = ProcessingStatus::Processing;
        self.progress = 0;
        self.current_step = RETRY_STEP.to_string();
        self.error = None;
        self.end_time = None;
        self.retry_count += 1;
        self.retry_time = Some(Utc::now());
    }

    /// Copy of the record without the (potentially large) result payload.
    pub fn without_result(&self) -> Self {
        Self {
            result: None,
            ..self.clone()
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status != ProcessingStatus::Processing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UploadStatus;

    fn record() -> ProcessingRecord {
        let file = UploadedFile::new("file-1", "lease.txt", UploadStatus::Uploaded);
        ProcessingRecord::new("proc-1", file, ProcessingOptions::default())
    }

    #[test]
    fn test_new_record_is_processing_at_zero() {
        let record = record();
        assert_eq!(record.status, ProcessingStatus::Processing);
        assert_eq!(record.progress, 0);
        assert_eq!(record.current_step, INITIAL_STEP);
        assert_eq!(record.file_id, "file-1");
        assert_eq!(record.file_name, "lease.txt");
    }

    #[test]
    fn test_enter_stage_never_lowers_progress() {
        let mut record = record();
        record.enter_stage(Stage::Translating);
        record.enter_stage(Stage::Classifying);
        assert_eq!(record.progress, 70);
        assert_eq!(record.current_step, "Translating content");
    }

    #[test]
    fn test_fail_keeps_progress() {
        let mut record = record();
        record.enter_stage(Stage::ExtractingText);
        record.fail("No text could be extracted from the document");
        assert_eq!(record.status, ProcessingStatus::Failed);
        assert_eq!(record.progress, 10);
        assert!(record.end_time.is_some());
        assert!(record.is_terminal());
    }

    #[test]
    fn test_rearm_for_retry() {
        let mut record = record();
        record.enter_stage(Stage::ExtractingText);
        record.fail("boom");
        record.rearm_for_retry();

        assert_eq!(record.status, ProcessingStatus::Processing);
        assert_eq!(record.progress, 0);
        assert_eq!(record.current_step, RETRY_STEP);
        assert!(record.error.is_none());
        assert!(record.end_time.is_none());
        assert_eq!(record.retry_count, 1);
        assert!(record.retry_time.is_some());
    }

    #[test]
    fn test_status_json_omits_empty_fields() {
        let json = serde_json::to_value(record()).unwrap();
        assert_eq!(json["status"], "Processing");
        assert_eq!(json["currentStep"], "Initializing");
        assert!(json.get("result").is_none());
        assert!(json.get("error").is_none());
    }
}
