use std::io::{Read, Seek};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ExtractionError;
use crate::extract::DocumentReader;
use crate::model::DocumentFormat;

/// Reads Word documents. Legacy `.doc` files are attempted too and fail unless
/// they are OOXML packages with the old extension.
pub struct DocxReader;

impl DocxReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocxReader {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentReader for DocxReader {
    fn read(&self, path: &Path) -> Result<String, ExtractionError> {
        let file = std::fs::File::open(path).map_err(|e| ExtractionError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut archive = zip::ZipArchive::new(file).map_err(|e| {
            ExtractionError::DocxProcessing(format!("Failed to open Word document: {}", e))
        })?;

        extract_docx_text(&mut archive)
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Docx | DocumentFormat::Doc)
    }
}

fn extract_docx_text<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> Result<String, ExtractionError> {
    let mut document_xml = archive.by_name("word/document.xml").map_err(|e| {
        ExtractionError::DocxProcessing(format!("Failed to find document.xml: {}", e))
    })?;

    let mut xml_content = String::new();
    document_xml.read_to_string(&mut xml_content).map_err(|e| {
        ExtractionError::DocxProcessing(format!("Failed to read document.xml: {}", e))
    })?;

    parse_document_xml(&xml_content)
}

/// Collects `w:t` runs, one line per `w:p` paragraph.
fn parse_document_xml(xml: &str) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_str(xml);

    let mut text = String::new();
    let mut in_run_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"t" => in_run_text = true,
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_run_text = false,
                b"p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"tab" => text.push('\t'),
                b"br" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) if in_run_text => {
                let decoded = e.unescape().unwrap_or_default();
                text.push_str(&decoded);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractionError::DocxProcessing(format!(
                    "XML parsing error: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(text)
}
