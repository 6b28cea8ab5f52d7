//! Test harness for isolated service instances.
//!
//! The `TestHarness` struct owns a temporary directory holding the upload,
//! temp, output and config directories of one `ProcessingService`.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use lexpipe::analysis::{DocumentAnalyzer, HeuristicAnalyzer};
use lexpipe::config::Config;
use lexpipe::extract::{LocalExtractor, TextExtractor};
use lexpipe::model::ProcessingRecord;
use lexpipe::ProcessingService;

use super::builders::ConfigBuilder;

pub const LEASE_TEXT: &str = "LEASE DEED\n\
This Lease Deed is executed on 01/03/2024 between Asha Rao (Lessor) and Vikram Shah (Lessee).\n\
The monthly rent shall be Rs. 25,000 payable on or before the 5th of every month.\n\
The Lessee shall pay a security deposit of Rs. 1,00,000.\n\
This lease shall expire on 28/02/2025.";

pub struct TestHarness {
    temp_dir: TempDir,
    pub upload_dir: PathBuf,
    pub scratch_dir: PathBuf,
    pub output_dir: PathBuf,
    pub config_dir: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();

        let upload_dir = base.join("uploads");
        let scratch_dir = base.join("temp");
        let output_dir = base.join("outputs");
        let config_dir = base.join("config");

        for dir in [&upload_dir, &scratch_dir, &output_dir, &config_dir] {
            std::fs::create_dir_all(dir).expect("Failed to create harness dir");
        }

        Self {
            temp_dir,
            upload_dir,
            scratch_dir,
            output_dir,
            config_dir,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Config builder with directories already pointing into the harness.
    pub fn config_builder(&self) -> ConfigBuilder {
        ConfigBuilder::new().directories(self.temp_path())
    }

    pub fn config(&self) -> Config {
        self.config_builder().build()
    }

    /// Write a config file to the config directory.
    pub fn write_config(&self, filename: &str, config: &Config) -> PathBuf {
        let path = self.config_dir.join(filename);
        let json = serde_json::to_string_pretty(config).expect("Failed to serialize config");
        std::fs::write(&path, json).expect("Failed to write config file");
        path
    }

    /// Service with the local extractor and the heuristic analyzer.
    pub fn default_service(&self) -> ProcessingService {
        self.service(
            &self.config(),
            Arc::new(LocalExtractor::new()),
            Arc::new(HeuristicAnalyzer::new()),
        )
    }

    pub fn service(
        &self,
        config: &Config,
        extractor: Arc<dyn TextExtractor>,
        analyzer: Arc<dyn DocumentAnalyzer>,
    ) -> ProcessingService {
        ProcessingService::new(config, extractor, analyzer).expect("Failed to build service")
    }

    /// Result artifacts written so far, sorted by name.
    pub fn list_outputs(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.output_dir)
            .expect("Failed to read output dir")
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Build an in-memory ZIP archive. Names ending in `/` become directories.
pub fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, content) in entries {
        if let Some(dir) = name.strip_suffix('/') {
            writer.add_directory(dir, options).expect("Failed to add dir");
        } else {
            writer.start_file(*name, options).expect("Failed to start file");
            writer.write_all(content).expect("Failed to write entry");
        }
    }
    writer.finish().expect("Failed to finish zip").into_inner()
}

/// Poll until the record leaves `Processing`.
pub async fn wait_for_terminal(service: &ProcessingService, process_id: &str) -> ProcessingRecord {
    wait_until(service, process_id, |r| r.is_terminal()).await
}

/// Poll until the record has reached at least `progress`.
pub async fn wait_for_progress(
    service: &ProcessingService,
    process_id: &str,
    progress: u8,
) -> ProcessingRecord {
    wait_until(service, process_id, |r| r.progress >= progress).await
}

async fn wait_until(
    service: &ProcessingService,
    process_id: &str,
    done: impl Fn(&ProcessingRecord) -> bool,
) -> ProcessingRecord {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(15);
    loop {
        let record = service.status(process_id).expect("Unknown process id");
        if done(&record) {
            return record;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "Timed out waiting on {}: {:?}",
            process_id,
            record
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harness_creates_directories() {
        let harness = TestHarness::new();

        assert!(harness.upload_dir.exists());
        assert!(harness.scratch_dir.exists());
        assert!(harness.output_dir.exists());
        assert!(harness.config_dir.exists());
    }

    #[test]
    fn test_config_points_into_harness() {
        let harness = TestHarness::new();
        let config = harness.config();

        assert_eq!(PathBuf::from(&config.upload_directory), harness.upload_dir);
        assert_eq!(PathBuf::from(&config.output_directory), harness.output_dir);
        assert_eq!(config.worker_count, 1);
    }
}
