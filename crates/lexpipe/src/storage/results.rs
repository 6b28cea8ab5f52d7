use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;

use chrono::{Datelike, Utc};
use regex::Regex;

use crate::error::StorageError;
use crate::model::ProcessingResult;

use super::filesystem::{ensure_directory, write_new};

static RE_RESULT_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^PDOC-\d{4}-(\d+)\.json$").unwrap());

const MAX_ATTEMPTS: u32 = 1000;

/// Persists completed results as `<dir>/PDOC-<year>-<seq>.json`.
///
/// The sequence is process-wide and seeded from the highest id already on
/// disk, so restarts never reuse an id. Artifacts are created exclusively; if
/// a file with the next id appears anyway, the counter moves on.
#[derive(Debug)]
pub struct ResultArchive {
    directory: PathBuf,
    last_seq: AtomicU64,
}

impl ResultArchive {
    pub fn open<P: AsRef<Path>>(directory: P) -> Result<Self, StorageError> {
        let directory = directory.as_ref().to_path_buf();
        std::fs::create_dir_all(&directory).map_err(|e| StorageError::CreateDirectory {
            path: directory.clone(),
            source: e,
        })?;

        let last_seq = highest_sequence(&directory)?;
        log::debug!(
            "Result archive at {} starts after sequence {}",
            directory.display(),
            last_seq
        );

        Ok(Self {
            directory,
            last_seq: AtomicU64::new(last_seq),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn next_id(&self) -> String {
        let seq = self.last_seq.fetch_add(1, Ordering::SeqCst) + 1;
        format!("PDOC-{}-{:04}", Utc::now().year(), seq)
    }

    /// Assigns `result.id` and writes the artifact. Returns the artifact path.
    pub async fn persist(&self, result: &mut ProcessingResult) -> Result<PathBuf, StorageError> {
        ensure_directory(&self.directory).await?;

        for _ in 0..MAX_ATTEMPTS {
            result.id = self.next_id();
            let path = self.directory.join(format!("{}.json", result.id));
            let json = serde_json::to_vec_pretty(result)?;

            match write_new(&path, &json).await {
                Ok(()) => return Ok(path),
                Err(StorageError::FileExists(existing)) => {
                    log::debug!("Result id taken, advancing: {}", existing.display());
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        Err(StorageError::FileExists(
            self.directory.join(format!("{}.json", result.id)),
        ))
    }

    /// Removes an artifact whose result was never recorded.
    pub async fn discard(&self, path: &Path) -> Result<(), StorageError> {
        tokio::fs::remove_file(path)
            .await
            .map_err(|e| StorageError::RemoveFile {
                path: path.to_path_buf(),
                source: e,
            })
    }
}

fn highest_sequence(directory: &Path) -> Result<u64, StorageError> {
    let entries = std::fs::read_dir(directory).map_err(|e| StorageError::ScanDirectory {
        path: directory.to_path_buf(),
        source: e,
    })?;

    let highest = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name();
            let name = name.to_str()?;
            RE_RESULT_FILE
                .captures(name)
                .and_then(|caps| caps.get(1))
                .and_then(|seq| seq.as_str().parse::<u64>().ok())
        })
        .max()
        .unwrap_or(0);

    Ok(highest)
}
