use std::io::{Cursor, Read};

use crate::error::UploadError;
use crate::model::{extension_of, DocumentFormat};
use crate::sanitize;

pub enum MemberContent {
    Bytes(Vec<u8>),
    Unsupported,
    /// Larger than the per-file limit. Nothing past the limit is read.
    TooLarge,
    Unreadable(String),
}

/// A file entry of an uploaded archive.
pub struct ArchiveMember {
    /// Basename, used as the file name of the upload.
    pub name: String,
    /// Full path inside the archive.
    pub relative_path: String,
    pub content: MemberContent,
}

/// Reads every file entry of an in-memory ZIP archive. Blocking.
///
/// Directory entries are skipped. Only members with a supported extension
/// have their bytes read, and never more than `max_member_bytes + 1` of them,
/// whatever size the entry header declares.
pub fn read_archive(
    bytes: Vec<u8>,
    max_member_bytes: u64,
) -> Result<Vec<ArchiveMember>, UploadError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| UploadError::InvalidArchive(e.to_string()))?;

    let mut members = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(e) => {
                members.push(ArchiveMember {
                    name: format!("entry-{}", index),
                    relative_path: format!("entry-{}", index),
                    content: MemberContent::Unreadable(e.to_string()),
                });
                continue;
            }
        };

        if entry.is_dir() {
            continue;
        }

        let relative_path = entry.name().to_string();
        let name = sanitize::base_file_name(&relative_path).to_string();
        if name.is_empty() {
            continue;
        }

        let content = if DocumentFormat::from_extension(&extension_of(&name)).is_none() {
            MemberContent::Unsupported
        } else if entry.size() > max_member_bytes {
            MemberContent::TooLarge
        } else {
            read_capped(&mut entry, max_member_bytes)
        };

        members.push(ArchiveMember {
            name,
            relative_path,
            content,
        });
    }

    Ok(members)
}

fn read_capped(entry: &mut impl Read, max_member_bytes: u64) -> MemberContent {
    let mut buf = Vec::new();
    match entry.take(max_member_bytes.saturating_add(1)).read_to_end(&mut buf) {
        Ok(read) if read as u64 > max_member_bytes => MemberContent::TooLarge,
        Ok(_) => MemberContent::Bytes(buf),
        Err(e) => MemberContent::Unreadable(format!("Failed to read entry: {}", e)),
    }
}
