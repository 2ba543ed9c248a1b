//! CLI interface for the resume screener

use crate::config::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "resume-screener")]
#[command(about = "Rank resumes against a job description by semantic similarity")]
#[command(long_about = "Extract text from resumes, embed it with a local Model2Vec model or a hosted embeddings API, and rank candidates by cosine similarity to the job description")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rank resumes against a job description
    Screen {
        /// Path to job description file (PDF, DOCX, TXT, MD)
        #[arg(short, long)]
        job: PathBuf,

        /// Resume files to rank
        #[arg(required = true)]
        resumes: Vec<PathBuf>,

        /// Output format: console, json, markdown, csv
        #[arg(short, long)]
        output: Option<String>,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Show file names and skip reasons
        #[arg(short, long)]
        detailed: bool,

        /// Embedding model to use instead of the configured one
        #[arg(short, long)]
        embedding: Option<String>,
    },

    /// Score a single resume against a job description
    Compare {
        /// Path to job description file
        #[arg(short, long)]
        job: PathBuf,

        /// Path to resume file
        #[arg(short, long)]
        resume: PathBuf,

        /// Output format: console, json, markdown, csv
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Embedding model management commands
    Models {
        #[command(subcommand)]
        action: ModelAction,
    },

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ModelAction {
    /// List available embedding models
    List,

    /// Download a model
    Download {
        /// Model id, display name or HuggingFace repo ID
        model: String,

        /// Force re-download if model exists
        #[arg(short, long)]
        force: bool,
    },

    /// Remove a downloaded model
    Remove {
        /// Model name to remove
        model: String,
    },

    /// Show model information
    Info {
        /// Model name
        model: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "processing.max_concurrent_embeddings")
        key: String,

        /// Configuration value
        value: String,
    },

    /// Print the configuration file location
    Path,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(OutputFormat::Console),
        "json" => Ok(OutputFormat::Json),
        "markdown" | "md" => Ok(OutputFormat::Markdown),
        "csv" => Ok(OutputFormat::Csv),
        _ => Err(format!("Invalid output format: {}. Supported: console, json, markdown, csv", format)),
    }
}

/// Formats a job description may be supplied in
pub const JOB_EXTENSIONS: &[&str] = &["pdf", "docx", "txt", "md"];

/// Validate file extension
pub fn validate_file_extension<S: AsRef<str>>(path: &Path, allowed_extensions: &[S]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.iter().any(|allowed| allowed.as_ref().eq_ignore_ascii_case(ext)) {
                Ok(())
            } else {
                let allowed: Vec<&str> = allowed_extensions.iter().map(|a| a.as_ref()).collect();
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}
