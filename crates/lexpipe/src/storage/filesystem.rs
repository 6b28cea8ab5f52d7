use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::StorageError;
use crate::model::extension_of;
use crate::sanitize;

/// Writes uploaded and archive-extracted documents below a root directory.
/// Files are always created exclusively; nothing is ever overwritten.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stores a single upload as `<safe stem>_<uuid><.ext>`.
    pub async fn store_upload(
        &self,
        original_name: &str,
        content: &[u8],
    ) -> Result<PathBuf, StorageError> {
        ensure_directory(&self.root).await?;

        let stem = sanitize::safe_stem(original_name);
        let extension = match extension_of(original_name) {
            ext if ext.is_empty() => String::new(),
            ext => format!(".{}", ext),
        };
        let path = self
            .root
            .join(format!("{}_{}{}", stem, Uuid::new_v4(), extension));

        write_new(&path, content).await?;
        Ok(path)
    }

    /// Stores an archive member as `<root>/<file_id>_<name>`.
    pub async fn store_member(
        &self,
        file_id: &str,
        name: &str,
        content: &[u8],
    ) -> Result<PathBuf, StorageError> {
        let path = self
            .root
            .join(format!("{}_{}", file_id, sanitize::base_file_name(name)));
        write_new(&path, content).await?;
        Ok(path)
    }
}

pub async fn ensure_directory(path: &Path) -> Result<(), StorageError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Creates `path` with O_CREAT | O_EXCL and writes `content`.
/// Fails with `FileExists` if something is already there.
pub(crate) async fn write_new(path: &Path, content: &[u8]) -> Result<(), StorageError> {
    let mut file = match tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
    {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(StorageError::FileExists(path.to_path_buf()));
        }
        Err(e) => {
            return Err(StorageError::WriteFile {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    file.write_all(content)
        .await
        .map_err(|e| StorageError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })?;
    file.flush().await.map_err(|e| StorageError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}
