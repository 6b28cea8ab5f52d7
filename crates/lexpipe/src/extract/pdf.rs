use std::path::Path;

use crate::error::ExtractionError;
use crate::extract::DocumentReader;
use crate::model::DocumentFormat;

/// Reads the embedded text layer of a PDF. Scanned PDFs yield little or no
/// text, which the pipeline reports as an empty extraction.
pub struct PdfReader;

impl PdfReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfReader {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentReader for PdfReader {
    fn read(&self, path: &Path) -> Result<String, ExtractionError> {
        let pdf_bytes = std::fs::read(path).map_err(|e| ExtractionError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;

        let doc = lopdf::Document::load_mem(&pdf_bytes)
            .map_err(|e| ExtractionError::PdfProcessing(format!("Failed to load PDF: {}", e)))?;

        Ok(extract_text_from_pdf(&doc))
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Pdf)
    }
}

fn extract_text_from_pdf(doc: &lopdf::Document) -> String {
    let mut text = String::new();

    for (page_num, _) in doc.get_pages() {
        match doc.extract_text(&[page_num]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Err(e) => log::debug!("Skipping unreadable PDF page {}: {}", page_num, e),
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Document, Object, Stream};
    use tempfile::NamedTempFile;

    fn build_pdf(content: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.new_object_id();
        let resources_id = doc.new_object_id();
        let content_id = doc.new_object_id();
        let page_id = doc.new_object_id();

        doc.objects.insert(
            font_id,
            Object::Dictionary(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Courier",
                "Encoding" => "WinAnsiEncoding",
            }),
        );
        doc.objects.insert(
            resources_id,
            Object::Dictionary(dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            }),
        );
        let stream = Stream::new(dictionary! {}, content.as_bytes().to_vec());
        doc.objects.insert(content_id, Object::Stream(stream));
        doc.objects.insert(
            page_id,
            Object::Dictionary(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Resources" => resources_id,
                "Contents" => content_id,
            }),
        );
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_reads_embedded_text() {
        let temp_file = NamedTempFile::with_suffix(".pdf").unwrap();
        std::fs::write(
            temp_file.path(),
            build_pdf("BT /F1 12 Tf 50 700 Td (Sale Deed executed at Pune) Tj ET"),
        )
        .unwrap();

        let text = PdfReader::new().read(temp_file.path()).unwrap();
        assert!(text.contains("Sale Deed executed at Pune"), "got: {:?}", text);
    }

    #[test]
    fn test_corrupted_pdf_error() {
        let temp_file = NamedTempFile::with_suffix(".pdf").unwrap();
        std::fs::write(temp_file.path(), b"not a valid pdf content").unwrap();

        match PdfReader::new().read(temp_file.path()) {
            Err(ExtractionError::PdfProcessing(msg)) => {
                assert!(msg.contains("Failed to load PDF"), "unexpected: {}", msg)
            }
            other => panic!("Expected PdfProcessing error, got {:?}", other),
        }
    }

    #[test]
    fn test_file_not_found_error() {
        match PdfReader::new().read(Path::new("/nonexistent/file.pdf")) {
            Err(ExtractionError::ReadDocument { path, .. }) => {
                assert_eq!(path, Path::new("/nonexistent/file.pdf"))
            }
            other => panic!("Expected ReadDocument error, got {:?}", other),
        }
    }
}
