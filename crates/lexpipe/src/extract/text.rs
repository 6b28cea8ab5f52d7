use std::path::Path;

use crate::error::ExtractionError;
use crate::extract::DocumentReader;
use crate::model::DocumentFormat;

pub struct TextReader;

impl TextReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextReader {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentReader for TextReader {
    fn read(&self, path: &Path) -> Result<String, ExtractionError> {
        let bytes = std::fs::read(path).map_err(|e| ExtractionError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;

        // Tolerate stray non-UTF-8 bytes from legacy editors.
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Text)
    }
}
