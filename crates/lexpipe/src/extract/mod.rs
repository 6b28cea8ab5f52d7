pub mod docx;
pub mod pdf;
pub mod text;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ExtractionError;
use crate::model::DocumentFormat;

/// Turns a stored document into plain text for analysis.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(
        &self,
        path: &Path,
        format: DocumentFormat,
    ) -> Result<String, ExtractionError>;
}

/// Synchronous reader for one family of formats.
pub trait DocumentReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<String, ExtractionError>;
    fn supports(&self, format: DocumentFormat) -> bool;
}

pub struct ReaderRegistry {
    readers: Vec<Box<dyn DocumentReader>>,
}

impl ReaderRegistry {
    pub fn new() -> Self {
        Self {
            readers: vec![
                Box::new(text::TextReader::new()),
                Box::new(pdf::PdfReader::new()),
                Box::new(docx::DocxReader::new()),
            ],
        }
    }

    pub fn read(&self, path: &Path, format: DocumentFormat) -> Result<String, ExtractionError> {
        self.readers
            .iter()
            .find(|r| r.supports(format))
            .ok_or_else(|| ExtractionError::UnsupportedFormat(format.extension().to_string()))?
            .read(path)
    }
}

impl Default for ReaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Extracts text from local files on the blocking thread pool. No OCR.
#[derive(Clone)]
pub struct LocalExtractor {
    registry: Arc<ReaderRegistry>,
}

impl LocalExtractor {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ReaderRegistry::new()),
        }
    }
}

impl Default for LocalExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextExtractor for LocalExtractor {
    async fn extract_text(
        &self,
        path: &Path,
        format: DocumentFormat,
    ) -> Result<String, ExtractionError> {
        let registry = Arc::clone(&self.registry);
        let path: PathBuf = path.to_path_buf();
        tokio::task::spawn_blocking(move || registry.read(&path, format))
            .await
            .map_err(|e| ExtractionError::Task(e.to_string()))?
    }
}
