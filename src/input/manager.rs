//! Input manager for loading and validating uploaded documents

use crate::config::{normalize_extension, UploadConfig};
use crate::error::{Result, ScreenerError};
use crate::input::text_extractor::extract_in_background;
use crate::processing::document::Document;
use crate::processing::results::SkippedDocument;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use tokio::fs;

pub struct InputManager {
    upload: UploadConfig,
}

impl InputManager {
    pub fn new(upload: UploadConfig) -> Self {
        Self { upload }
    }

    /// Read a resume into memory and check it against the upload rules
    pub async fn load_document(&self, path: &Path) -> Result<Document> {
        let document = read_document(path, self.upload.max_file_size).await?;
        self.validate_document(&document)?;
        Ok(document)
    }

    pub fn validate_document(&self, document: &Document) -> Result<()> {
        validate_upload(document, &self.upload)
    }

    /// Read every resume that can be identified. Unreadable, oversized and
    /// unknown-format files are reported back instead of failing the batch;
    /// the remaining upload rules are checked later by the screener.
    pub async fn read_resumes(&self, paths: &[PathBuf]) -> (Vec<Document>, Vec<SkippedDocument>) {
        let mut documents = Vec::with_capacity(paths.len());
        let mut skipped = Vec::new();

        for path in paths {
            match read_document(path, self.upload.max_file_size).await {
                Ok(document) => documents.push(document),
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    skipped.push(SkippedDocument::new(path.display().to_string(), &e));
                }
            }
        }

        (documents, skipped)
    }

    /// Read the job description from any supported format. Not subject to the
    /// resume extension whitelist.
    pub async fn read_job_description(&self, path: &Path) -> Result<String> {
        let document = read_document(path, self.upload.max_file_size).await?;
        info!("Extracting {} job description: {}", document.format, path.display());
        extract_in_background(document).await
    }
}

/// Extension must be allowed, size must be non-zero and within the limit
pub fn validate_upload(document: &Document, upload: &UploadConfig) -> Result<()> {
    let extension = Path::new(&document.filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default();

    let allowed = upload
        .allowed_extensions
        .iter()
        .any(|allowed| normalize_extension(allowed) == extension);
    if !allowed {
        return Err(ScreenerError::UnsupportedFormat(format!(
            "File type .{} not allowed for {}. Use one of: {}",
            extension,
            document.filename,
            upload.allowed_extensions.join(", ")
        )));
    }

    if document.is_empty() {
        return Err(ScreenerError::InvalidInput(format!("File is empty: {}", document.filename)));
    }

    if document.size() > upload.max_file_size {
        return Err(ScreenerError::InvalidInput(format!(
            "File size {} of {} exceeds maximum {}",
            document.size(),
            document.filename,
            upload.max_file_size
        )));
    }

    Ok(())
}

/// Files larger than `max_file_size` are rejected from their metadata,
/// before any bytes are read
async fn read_document(path: &Path, max_file_size: u64) -> Result<Document> {
    if !path.exists() {
        return Err(ScreenerError::InvalidInput(format!("File does not exist: {}", path.display())));
    }

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| ScreenerError::InvalidInput(format!("Not a file: {}", path.display())))?;

    let size = fs::metadata(path).await?.len();
    if size > max_file_size {
        return Err(ScreenerError::InvalidInput(format!(
            "File size {} of {} exceeds maximum {}",
            size, filename, max_file_size
        )));
    }

    let bytes = fs::read(path).await?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());

    Document::from_bytes(bytes, filename)
}

/// Job description must be non-blank and within the configured length bounds
pub fn validate_job_description(text: &str, upload: &UploadConfig) -> Result<()> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ScreenerError::EmptyInput("Job description cannot be empty".to_string()));
    }

    let length = trimmed.chars().count();
    if length < upload.min_job_description_chars {
        return Err(ScreenerError::InvalidInput(format!(
            "Job description too short ({} characters, minimum {})",
            length, upload.min_job_description_chars
        )));
    }
    if length > upload.max_job_description_chars {
        return Err(ScreenerError::InvalidInput(format!(
            "Job description too long ({} characters, maximum {})",
            length, upload.max_job_description_chars
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::processing::document::DocumentFormat;

    fn manager() -> InputManager {
        InputManager::new(Config::default().upload)
    }

    #[test]
    fn test_validate_document_accepts_pdf_and_docx() {
        let manager = manager();
        let pdf = Document::new(b"%PDF-1.4".to_vec(), DocumentFormat::Pdf, "a.pdf");
        let docx = Document::new(b"PK".to_vec(), DocumentFormat::Docx, "b.DOCX");

        assert!(manager.validate_document(&pdf).is_ok());
        assert!(manager.validate_document(&docx).is_ok());
    }

    #[test]
    fn test_validate_document_rejects_bad_uploads() {
        let mut upload = Config::default().upload;
        upload.max_file_size = 4;
        let manager = InputManager::new(upload);

        let txt = Document::new(b"hi".to_vec(), DocumentFormat::PlainText, "notes.txt");
        assert!(matches!(manager.validate_document(&txt), Err(ScreenerError::UnsupportedFormat(_))));

        let empty = Document::new(Vec::new(), DocumentFormat::Pdf, "empty.pdf");
        assert!(matches!(manager.validate_document(&empty), Err(ScreenerError::InvalidInput(_))));

        let big = Document::new(vec![0u8; 5], DocumentFormat::Pdf, "big.pdf");
        assert!(matches!(manager.validate_document(&big), Err(ScreenerError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_read_resumes_reports_unreadable_files() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let good = temp_dir.path().join("Jane Doe.pdf");
        let odd = temp_dir.path().join("notes.xyz");
        std::fs::write(&good, b"%PDF-1.4").unwrap();
        std::fs::write(&odd, b"hello").unwrap();
        let missing = temp_dir.path().join("ghost.pdf");

        let (documents, skipped) = manager().read_resumes(&[good, odd, missing]).await;

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].candidate_name(), "Jane Doe");
        assert_eq!(skipped.len(), 2);
        assert!(skipped[0].filename.ends_with("notes.xyz"));
    }

    #[tokio::test]
    async fn test_read_job_description_strips_markup() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("job.md");
        std::fs::write(&path, "# Rust Engineer\n\nBuild **async** services").unwrap();

        let text = manager().read_job_description(&path).await.unwrap();
        assert_eq!(text, "Rust Engineer\nBuild async services");

        std::fs::remove_file(&path).unwrap();
        assert!(manager().read_job_description(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_oversized_file_rejected_before_reading() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("huge.pdf");
        std::fs::write(&path, vec![b'x'; 64]).unwrap();

        let mut upload = Config::default().upload;
        upload.max_file_size = 16;
        let manager = InputManager::new(upload);

        match manager.load_document(&path).await {
            Err(ScreenerError::InvalidInput(message)) => assert!(message.contains("exceeds maximum 16")),
            other => panic!("expected size rejection, got {:?}", other.map(|d| d.filename)),
        }

        let (documents, skipped) = manager.read_resumes(&[path]).await;
        assert!(documents.is_empty());
        assert!(skipped[0].reason.contains("exceeds maximum"));
    }

    #[test]
    fn test_validate_upload_normalizes_configured_extensions() {
        let mut upload = Config::default().upload;
        upload.allowed_extensions = vec![".PDF".to_string(), " Docx ".to_string()];

        let pdf = Document::new(b"%PDF-1.4".to_vec(), DocumentFormat::Pdf, "cv.pdf");
        let docx = Document::new(b"PK".to_vec(), DocumentFormat::Docx, "cv.docx");
        assert!(validate_upload(&pdf, &upload).is_ok());
        assert!(validate_upload(&docx, &upload).is_ok());
    }

    #[test]
    fn test_validate_job_description() {
        let upload = Config::default().upload;

        assert!(matches!(validate_job_description("   ", &upload), Err(ScreenerError::EmptyInput(_))));
        assert!(matches!(
            validate_job_description("Rust developer", &upload),
            Err(ScreenerError::InvalidInput(_))
        ));

        let long_enough = "Senior Rust developer with async networking, tokio and PostgreSQL experience";
        assert!(validate_job_description(long_enough, &upload).is_ok());

        let too_long = "x".repeat(upload.max_job_description_chars + 1);
        assert!(validate_job_description(&too_long, &upload).is_err());
    }
}
