use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::ProcessingOptions;
use crate::pipeline::{FailurePolicy, Stage, StagePolicies};

pub const CONFIG_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_upload_directory")]
    pub upload_directory: String,
    #[serde(default = "default_temp_directory")]
    pub temp_directory: String,
    #[serde(default = "default_output_directory")]
    pub output_directory: String,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Upper bound for a single collaborator call.
    #[serde(default)]
    pub stage_timeout_secs: Option<u64>,
    /// Upper bound for a whole run.
    #[serde(default)]
    pub run_deadline_secs: Option<u64>,
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
    #[serde(default = "default_max_zip_size_mb")]
    pub max_zip_size_mb: u64,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Options applied when a request leaves a field out.
    #[serde(default)]
    pub defaults: ProcessingOptions,
    #[serde(default)]
    pub stage_policies: HashMap<Stage, FailurePolicy>,
}

fn default_bind_address() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_upload_directory() -> String {
    "./uploads".to_string()
}

fn default_temp_directory() -> String {
    "./temp".to_string()
}

fn default_output_directory() -> String {
    "./outputs".to_string()
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

fn default_max_file_size_mb() -> u64 {
    50
}

fn default_max_zip_size_mb() -> u64 {
    200
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            bind_address: default_bind_address(),
            upload_directory: default_upload_directory(),
            temp_directory: default_temp_directory(),
            output_directory: default_output_directory(),
            worker_count: default_worker_count(),
            stage_timeout_secs: None,
            run_deadline_secs: None,
            max_file_size_mb: default_max_file_size_mb(),
            max_zip_size_mb: default_max_zip_size_mb(),
            log_format: LogFormat::default(),
            defaults: ProcessingOptions::default(),
            stage_policies: HashMap::new(),
        }
    }
}

impl Config {
    pub fn stage_timeout(&self) -> Option<Duration> {
        self.stage_timeout_secs.map(Duration::from_secs)
    }

    pub fn run_deadline(&self) -> Option<Duration> {
        self.run_deadline_secs.map(Duration::from_secs)
    }

    pub fn policies(&self) -> StagePolicies {
        StagePolicies::new(self.stage_policies.clone())
    }

    pub fn max_file_size_bytes(&self) -> usize {
        mb_to_bytes(self.max_file_size_mb)
    }

    pub fn max_zip_size_bytes(&self) -> usize {
        mb_to_bytes(self.max_zip_size_mb)
    }
}

fn mb_to_bytes(mb: u64) -> usize {
    usize::try_from(mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}
