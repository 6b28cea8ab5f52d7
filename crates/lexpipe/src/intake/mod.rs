//! Accepts uploaded documents and ZIP archives and places their content in storage.

pub mod archive;

use std::path::{Path, PathBuf};

use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::UploadError;
use crate::model::{extension_of, Batch, DocumentFormat, UploadStatus, UploadedFile};
use crate::sanitize;
use crate::storage::{ensure_directory, FileStorage};

use archive::{read_archive, MemberContent};

pub const UNSUPPORTED_FORMAT: &str = "Unsupported file format";
pub const FILE_TOO_LARGE: &str = "File too large";

const DEFAULT_MAX_MEMBER_BYTES: u64 = 50 * 1024 * 1024;

pub struct UploadIntake {
    uploads: FileStorage,
    temp_directory: PathBuf,
    max_member_bytes: u64,
}

impl UploadIntake {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(upload_directory: P, temp_directory: Q) -> Self {
        Self {
            uploads: FileStorage::new(upload_directory),
            temp_directory: temp_directory.as_ref().to_path_buf(),
            max_member_bytes: DEFAULT_MAX_MEMBER_BYTES,
        }
    }

    /// Caps the size of a single extracted archive member.
    pub fn with_max_member_bytes(mut self, limit: u64) -> Self {
        self.max_member_bytes = limit;
        self
    }

    pub fn upload_directory(&self) -> &Path {
        self.uploads.root()
    }

    pub fn temp_directory(&self) -> &Path {
        &self.temp_directory
    }

    /// Stores a single accepted document and returns it with status `Uploaded`.
    pub async fn ingest_single(
        &self,
        file_name: &str,
        content: &[u8],
    ) -> Result<UploadedFile, UploadError> {
        let display_name = sanitize::base_file_name(file_name);
        if DocumentFormat::from_extension(&extension_of(display_name)).is_none() {
            return Err(UploadError::UnsupportedFormat(display_name.to_string()));
        }

        let stored_path = self.uploads.store_upload(display_name, content).await?;
        debug!("Stored upload {}", sanitize::redact_path(&stored_path));

        Ok(
            UploadedFile::new(Uuid::new_v4().to_string(), display_name, UploadStatus::Uploaded)
                .with_stored_path(stored_path, content.len() as u64),
        )
    }

    /// Extracts a ZIP archive into `<temp>/<batch id>/` and returns the batch.
    ///
    /// Supported members are written concurrently and become `Pending`.
    /// Unsupported members are listed but never written. A member that is too
    /// large, or cannot be read or written, is marked `Failed` without
    /// affecting the others.
    pub async fn ingest_archive(
        &self,
        zip_file_name: &str,
        archive: Vec<u8>,
    ) -> Result<Batch, UploadError> {
        let batch_id = Uuid::new_v4().to_string();
        let extraction_directory = self.temp_directory.join(&batch_id);

        let max_member_bytes = self.max_member_bytes;
        let members = tokio::task::spawn_blocking(move || read_archive(archive, max_member_bytes))
            .await
            .map_err(|e| UploadError::Task(e.to_string()))??;

        ensure_directory(&extraction_directory).await?;
        let batch_storage = FileStorage::new(&extraction_directory);

        let mut files = Vec::with_capacity(members.len());
        let mut writes = JoinSet::new();

        for (index, member) in members.into_iter().enumerate() {
            let file_id = Uuid::new_v4().to_string();
            let mut file = UploadedFile::new(&file_id, &member.name, UploadStatus::Pending);
            file.relative_path = Some(member.relative_path);

            match member.content {
                MemberContent::Unsupported => {
                    file.status = UploadStatus::Unsupported;
                    file.error = Some(UNSUPPORTED_FORMAT.to_string());
                }
                MemberContent::TooLarge => {
                    warn!("Archive member {} exceeds the size limit", member.name);
                    file.mark_failed(FILE_TOO_LARGE);
                }
                MemberContent::Unreadable(reason) => {
                    warn!("Could not read archive member {}: {}", member.name, reason);
                    file.mark_failed(reason);
                }
                MemberContent::Bytes(bytes) => {
                    let storage = batch_storage.clone();
                    let name = member.name;
                    writes.spawn(async move {
                        let stored = storage.store_member(&file_id, &name, &bytes).await;
                        (index, stored, bytes.len() as u64)
                    });
                }
            }
            files.push(file);
        }

        while let Some(joined) = writes.join_next().await {
            let (index, stored, size) = joined.map_err(|e| UploadError::Task(e.to_string()))?;
            let file = &mut files[index];
            match stored {
                Ok(path) => {
                    file.stored_path = Some(path);
                    file.set_size(size);
                }
                Err(e) => {
                    warn!("Failed to extract {}: {}", file.file_name, e);
                    file.mark_failed(e.to_string());
                }
            }
        }

        let batch = Batch::new(
            batch_id,
            sanitize::base_file_name(zip_file_name),
            extraction_directory,
            files,
        );
        info!(
            batch_id = %batch.batch_id,
            total = batch.total_files,
            supported = batch.supported_files,
            unsupported = batch.unsupported_files,
            "Archive extracted"
        );
        Ok(batch)
    }
}
