//! Document structures

use crate::error::{Result, ScreenerError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    PlainText,
    Markdown,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" => Some(DocumentFormat::Docx),
            "txt" | "text" => Some(DocumentFormat::PlainText),
            "md" | "markdown" => Some(DocumentFormat::Markdown),
            _ => None,
        }
    }

    pub fn from_filename(filename: &str) -> Result<Self> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| ScreenerError::InvalidInput(format!("File has no extension: {}", filename)))?;

        Self::from_extension(extension).ok_or_else(|| {
            ScreenerError::UnsupportedFormat(format!("Unsupported file type .{} for: {}", extension, filename))
        })
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentFormat::Pdf => "PDF",
            DocumentFormat::Docx => "DOCX",
            DocumentFormat::PlainText => "TXT",
            DocumentFormat::Markdown => "Markdown",
        };
        f.write_str(name)
    }
}

/// An uploaded file held in memory for the duration of one request
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub bytes: Vec<u8>,
    pub format: DocumentFormat,
    pub filename: String,
}

impl Document {
    pub fn new(bytes: Vec<u8>, format: DocumentFormat, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            format,
            filename: filename.into(),
        }
    }

    /// Build a document whose format is taken from the filename's extension
    pub fn from_bytes(bytes: Vec<u8>, filename: impl Into<String>) -> Result<Self> {
        let filename = filename.into();
        let format = DocumentFormat::from_filename(&filename)?;
        Ok(Self::new(bytes, format, filename))
    }

    /// Candidate identity: the file name without directory or extension
    pub fn candidate_name(&self) -> String {
        let path = Path::new(&self.filename);
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.filename.clone())
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_filename() {
        assert_eq!(DocumentFormat::from_filename("jane.PDF").unwrap(), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::from_filename("cv.final.docx").unwrap(), DocumentFormat::Docx);
        assert_eq!(DocumentFormat::from_filename("notes.md").unwrap(), DocumentFormat::Markdown);
        assert!(matches!(
            DocumentFormat::from_filename("archive.zip"),
            Err(ScreenerError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            DocumentFormat::from_filename("README"),
            Err(ScreenerError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_candidate_name_strips_extension_and_directory() {
        let doc = Document::from_bytes(b"%PDF".to_vec(), "uploads/Jane Doe.pdf").unwrap();
        assert_eq!(doc.candidate_name(), "Jane Doe");
        assert_eq!(doc.format, DocumentFormat::Pdf);
        assert_eq!(doc.size(), 4);

        let doc = Document::new(Vec::new(), DocumentFormat::Docx, "john.smith.docx");
        assert_eq!(doc.candidate_name(), "john.smith");
        assert!(doc.is_empty());
    }
}
