use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Document formats accepted for analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Doc,
    Text,
}

impl DocumentFormat {
    pub const SUPPORTED_EXTENSIONS: &'static [&'static str] = &["pdf", "docx", "doc", "txt"];

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "doc" => Some(Self::Doc),
            "txt" => Some(Self::Text),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Doc => "doc",
            Self::Text => "txt",
        }
    }

    /// Upper-case label stored as the file type of an upload.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "DOCX",
            Self::Doc => "DOC",
            Self::Text => "TXT",
        }
    }

    pub fn mime_type(&self) -> String {
        mime_guess::from_ext(self.extension())
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }

    /// Whether a client-declared content type is plausible for this format.
    /// Generic binary uploads are accepted since many clients send them for any file.
    pub fn accepts_mime(&self, content_type: &str) -> bool {
        let declared = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_lowercase();
        declared == "application/octet-stream"
            || mime_guess::from_ext(self.extension())
                .iter()
                .any(|m| m.essence_str() == declared)
    }
}

/// Returns the lower-cased extension of a file name, or an empty string.
pub fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// Formats a byte count with 1024-based units, at most two decimals.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut exponent = 0usize;
    let mut scaled = bytes as f64;
    while scaled >= 1024.0 && exponent < UNITS.len() - 1 {
        scaled /= 1024.0;
        exponent += 1;
    }

    let rounded = (scaled * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[exponent])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum UploadStatus {
    #[default]
    Uploaded,
    Pending,
    Unsupported,
    Processing,
    Failed,
}

/// A file accepted by the service, either directly or as an archive member.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub id: String,
    pub file_name: String,
    /// Where the content lives on disk. Absent for unsupported archive members.
    #[serde(
        default,
        alias = "filePath",
        alias = "extractedPath",
        skip_serializing_if = "Option::is_none"
    )]
    pub stored_path: Option<PathBuf>,
    /// Path of the member inside its archive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_path: Option<String>,
    pub file_type: String,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub size_label: String,
    #[serde(default)]
    pub status: UploadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub uploaded_at: DateTime<Utc>,
}

impl UploadedFile {
    pub fn new(id: impl Into<String>, file_name: impl Into<String>, status: UploadStatus) -> Self {
        let file_name = file_name.into();
        let file_type = extension_of(&file_name).to_uppercase();
        Self {
            id: id.into(),
            file_name,
            stored_path: None,
            relative_path: None,
            file_type,
            file_size: 0,
            size_label: format_file_size(0),
            status,
            error: None,
            process_id: None,
            uploaded_at: Utc::now(),
        }
    }

    pub fn with_stored_path(mut self, path: PathBuf, size: u64) -> Self {
        self.stored_path = Some(path);
        self.set_size(size);
        self
    }

    pub fn set_size(&mut self, size: u64) {
        self.file_size = size;
        self.size_label = format_file_size(size);
    }

    pub fn format(&self) -> Option<DocumentFormat> {
        DocumentFormat::from_extension(&self.file_type)
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = UploadStatus::Failed;
        self.error = Some(error.into());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStatus {
    Extracted,
    Processing,
}

/// The set of files extracted from one uploaded archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub batch_id: String,
    pub zip_file_name: String,
    pub extraction_directory: PathBuf,
    pub total_files: usize,
    pub supported_files: usize,
    pub unsupported_files: usize,
    pub files: Vec<UploadedFile>,
    pub overall_status: BatchStatus,
    pub extracted_at: DateTime<Utc>,
}

impl Batch {
    pub fn new(
        batch_id: impl Into<String>,
        zip_file_name: impl Into<String>,
        extraction_directory: PathBuf,
        files: Vec<UploadedFile>,
    ) -> Self {
        let unsupported_files = files
            .iter()
            .filter(|f| f.status == UploadStatus::Unsupported)
            .count();
        Self {
            batch_id: batch_id.into(),
            zip_file_name: zip_file_name.into(),
            extraction_directory,
            total_files: files.len(),
            supported_files: files.len() - unsupported_files,
            unsupported_files,
            files,
            overall_status: BatchStatus::Extracted,
            extracted_at: Utc::now(),
        }
    }

    pub fn pending(&self) -> impl Iterator<Item = &UploadedFile> {
        self.files
            .iter()
            .filter(|f| f.status == UploadStatus::Pending)
    }
}
