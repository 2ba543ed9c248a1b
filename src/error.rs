//! Error handling for the resume screener

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScreenerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document extraction error: {0}")]
    DocumentExtraction(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Nothing left to compare: empty job description, empty batch, or every
    /// candidate dropped before ranking.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Two vectors of different length were compared. Always a caller bug,
    /// typically embeddings from two different models.
    #[error("Embedding dimensions don't match: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding generation error: {0}")]
    Embedding(String),

    #[error("Model error: {0}")]
    ModelError(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

pub type Result<T> = std::result::Result<T, ScreenerError>;

/// model2vec-rs reports failures through anyhow
impl From<anyhow::Error> for ScreenerError {
    fn from(err: anyhow::Error) -> Self {
        ScreenerError::Embedding(err.to_string())
    }
}

impl From<reqwest::Error> for ScreenerError {
    fn from(err: reqwest::Error) -> Self {
        ScreenerError::Network(err.to_string())
    }
}

impl ScreenerError {
    /// Hard errors abort the whole screening request instead of dropping a
    /// single candidate.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScreenerError::DimensionMismatch { .. }
                | ScreenerError::Timeout(_)
                | ScreenerError::Configuration(_)
        )
    }
}
