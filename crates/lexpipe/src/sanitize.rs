//! Helpers for sanitizing data before it reaches logs, spans or the filesystem.
//!
//! Uploaded file names are user input: they are reduced to a safe basename
//! before being used in storage paths, and only file names (never full paths)
//! enter tracing spans.

use std::path::Path;

const MAX_BASENAME_CHARS: usize = 50;

/// Returns only the filename component of a path (no directory).
///
/// Safe for span fields: reveals the file name without exposing the full path.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Last path component of a client-supplied name, with either separator style.
pub fn base_file_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Storage-safe stem of an uploaded file name: non-alphanumerics become `_`,
/// truncated to 50 characters.
pub fn safe_stem(file_name: &str) -> String {
    let base = base_file_name(file_name);
    let stem = match base.rfind('.') {
        Some(pos) if pos > 0 => &base[..pos],
        _ => base,
    };

    let cleaned: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .take(MAX_BASENAME_CHARS)
        .collect();

    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_path_returns_filename() {
        assert_eq!(
            redact_path(Path::new("/srv/uploads/batch-1/loan_agreement.pdf")),
            "loan_agreement.pdf"
        );
    }

    #[test]
    fn test_redact_path_no_filename() {
        assert_eq!(redact_path(Path::new("/")), "<unknown>");
    }

    #[test]
    fn test_base_file_name_strips_directories() {
        assert_eq!(base_file_name("contracts/2024/lease.pdf"), "lease.pdf");
        assert_eq!(base_file_name("C:\\docs\\deed.docx"), "deed.docx");
        assert_eq!(base_file_name("notes.txt"), "notes.txt");
    }

    #[test]
    fn test_safe_stem_replaces_symbols() {
        assert_eq!(safe_stem("Loan Agreement (final).pdf"), "Loan_Agreement__final_");
        assert_eq!(safe_stem("../../etc/passwd"), "passwd");
    }

    #[test]
    fn test_safe_stem_truncates() {
        let long = format!("{}.txt", "a".repeat(80));
        assert_eq!(safe_stem(&long).len(), 50);
    }

    #[test]
    fn test_safe_stem_empty_falls_back() {
        assert_eq!(safe_stem(".pdf"), "_pdf");
        assert_eq!(safe_stem(""), "document");
    }
}
