//! Configuration management for the resume screener

use crate::error::{Result, ScreenerError};
use crate::processing::normalizer::DEFAULT_STOPWORDS;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_EMBEDDING_MODEL: &str = "RESUME_SCREENER_EMBEDDING_MODEL";
pub const ENV_PROVIDER: &str = "RESUME_SCREENER_PROVIDER";
pub const ENV_MAX_FILE_SIZE: &str = "RESUME_SCREENER_MAX_FILE_SIZE";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub models: ModelConfig,
    pub processing: ProcessingConfig,
    pub upload: UploadConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub models_dir: PathBuf,
    pub embedding_model: String,
    pub provider: ProviderKind,
    pub hosted: HostedConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local static Model2Vec model
    Model2Vec,
    /// OpenAI-compatible embeddings endpoint
    Hosted,
}

/// Settings for an OpenAI-compatible `/embeddings` endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostedConfig {
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub dimension: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub stopwords: Vec<String>,
    pub max_concurrent_embeddings: usize,
    pub request_timeout_secs: u64,
    pub score_precision: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub max_file_size: u64,
    pub allowed_extensions: Vec<String>,
    pub min_job_description_chars: usize,
    pub max_job_description_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
    Csv,
}

impl Default for Config {
    fn default() -> Self {
        let models_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".resume-screener")
            .join("models");

        Self {
            models: ModelConfig {
                models_dir,
                embedding_model: "potion-base-8M".to_string(),
                provider: ProviderKind::Model2Vec,
                hosted: HostedConfig {
                    endpoint: "https://api.openai.com/v1".to_string(),
                    model: "text-embedding-3-small".to_string(),
                    api_key_env: "OPENAI_API_KEY".to_string(),
                    dimension: 1536,
                    timeout_secs: 30,
                },
            },
            processing: ProcessingConfig {
                stopwords: DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect(),
                max_concurrent_embeddings: 4,
                request_timeout_secs: 300,
                score_precision: 4,
            },
            upload: UploadConfig {
                max_file_size: 10 * 1024 * 1024,
                allowed_extensions: vec!["pdf".to_string(), "docx".to_string()],
                min_job_description_chars: 50,
                max_job_description_chars: 100_000,
            },
            output: OutputConfig {
                format: OutputFormat::Console,
                detailed: false,
                color_output: true,
            },
        }
    }
}

impl Config {
    /// Load from the default location, creating it with defaults on first run
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            Self::from_file(&config_path)?
        } else {
            let config = Self::default();
            config.save()?;
            config
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load an explicit config file; a missing file is an error here
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)
            .map_err(|e| ScreenerError::Configuration(format!("Failed to parse config: {}", e)))?;
        config.upload.allowed_extensions = config
            .upload
            .allowed_extensions
            .iter()
            .map(|ext| normalize_extension(ext))
            .filter(|ext| !ext.is_empty())
            .collect();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ScreenerError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("resume-screener")
            .join("config.toml")
    }

    pub fn models_dir(&self) -> &PathBuf {
        &self.models.models_dir
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(model) = std::env::var(ENV_EMBEDDING_MODEL) {
            debug!("{} overrides embedding model: {}", ENV_EMBEDDING_MODEL, model);
            self.models.embedding_model = model;
        }
        if let Ok(provider) = std::env::var(ENV_PROVIDER) {
            self.models.provider = parse_provider(&provider)?;
        }
        if let Ok(size) = std::env::var(ENV_MAX_FILE_SIZE) {
            self.upload.max_file_size = size.parse().map_err(|_| {
                ScreenerError::Configuration(format!("{} must be a byte count, got '{}'", ENV_MAX_FILE_SIZE, size))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.processing.max_concurrent_embeddings == 0 {
            return Err(ScreenerError::Configuration(
                "processing.max_concurrent_embeddings must be at least 1".to_string(),
            ));
        }
        if self.processing.request_timeout_secs == 0 {
            return Err(ScreenerError::Configuration(
                "processing.request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.upload.allowed_extensions.is_empty() {
            return Err(ScreenerError::Configuration(
                "upload.allowed_extensions must not be empty".to_string(),
            ));
        }
        if self.upload.min_job_description_chars > self.upload.max_job_description_chars {
            return Err(ScreenerError::Configuration(format!(
                "upload.min_job_description_chars ({}) exceeds upload.max_job_description_chars ({})",
                self.upload.min_job_description_chars, self.upload.max_job_description_chars
            )));
        }
        if self.models.provider == ProviderKind::Hosted && self.models.hosted.dimension == 0 {
            return Err(ScreenerError::Configuration(
                "models.hosted.dimension must be declared for the hosted provider".to_string(),
            ));
        }
        Ok(())
    }

    /// Set a single value by dotted key, e.g. `processing.max_concurrent_embeddings`
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "models.models_dir" => self.models.models_dir = PathBuf::from(value),
            "models.embedding_model" => self.models.embedding_model = value.to_string(),
            "models.provider" => self.models.provider = parse_provider(value)?,
            "models.hosted.endpoint" => self.models.hosted.endpoint = value.to_string(),
            "models.hosted.model" => self.models.hosted.model = value.to_string(),
            "models.hosted.api_key_env" => self.models.hosted.api_key_env = value.to_string(),
            "models.hosted.dimension" => self.models.hosted.dimension = parse_value(key, value)?,
            "models.hosted.timeout_secs" => self.models.hosted.timeout_secs = parse_value(key, value)?,
            "processing.stopwords" => {
                self.processing.stopwords = split_list(value);
            }
            "processing.max_concurrent_embeddings" => {
                self.processing.max_concurrent_embeddings = parse_value(key, value)?
            }
            "processing.request_timeout_secs" => {
                self.processing.request_timeout_secs = parse_value(key, value)?
            }
            "processing.score_precision" => self.processing.score_precision = parse_value(key, value)?,
            "upload.max_file_size" => self.upload.max_file_size = parse_value(key, value)?,
            "upload.allowed_extensions" => {
                self.upload.allowed_extensions = split_list(value)
                    .iter()
                    .map(|ext| normalize_extension(ext))
                    .filter(|ext| !ext.is_empty())
                    .collect();
            }
            "upload.min_job_description_chars" => {
                self.upload.min_job_description_chars = parse_value(key, value)?
            }
            "upload.max_job_description_chars" => {
                self.upload.max_job_description_chars = parse_value(key, value)?
            }
            "output.format" => {
                self.output.format = crate::cli::parse_output_format(value)
                    .map_err(ScreenerError::Configuration)?
            }
            "output.detailed" => self.output.detailed = parse_value(key, value)?,
            "output.color_output" => self.output.color_output = parse_value(key, value)?,
            _ => {
                return Err(ScreenerError::Configuration(format!("Unknown configuration key: {}", key)));
            }
        }

        self.validate()
    }
}

fn parse_provider(value: &str) -> Result<ProviderKind> {
    match value.to_lowercase().as_str() {
        "model2vec" | "local" => Ok(ProviderKind::Model2Vec),
        "hosted" | "openai" => Ok(ProviderKind::Hosted),
        other => Err(ScreenerError::Configuration(format!(
            "Unknown embedding provider: {}. Supported: model2vec, hosted",
            other
        ))),
    }
}

/// `" .PDF"` becomes `"pdf"`
pub fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_lowercase()
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| ScreenerError::Configuration(format!("Invalid value for {}: {}", key, value)))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
