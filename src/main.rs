//! Resume screener: rank resumes against a job description by semantic similarity

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use resume_screener::cli::{self, Cli, Commands, ConfigAction, ModelAction};
use resume_screener::config::{Config, OutputFormat, ProviderKind};
use resume_screener::input::text_extractor::extract_in_background;
use resume_screener::input::InputManager;
use resume_screener::output::{save_report_to_file, ReportGenerator};
use resume_screener::processing::embedding_manager::EmbeddingModelManager;
use resume_screener::processing::embeddings::build_provider;
use resume_screener::processing::Screener;
use resume_screener::{Result, ScreenerError};
use std::path::Path;
use std::process;
use std::time::Duration;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let loaded = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config, &config_path).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, mut config: Config, config_path: &Path) -> Result<()> {
    match command {
        Commands::Screen {
            job,
            resumes,
            output,
            save,
            detailed,
            embedding,
        } => {
            if let Some(model) = embedding {
                config.models.embedding_model = model;
            }
            let output_format = resolve_output_format(output.as_deref(), &config)?;
            let detailed = detailed || config.output.detailed;

            cli::validate_file_extension(&job, cli::JOB_EXTENSIONS)
                .map_err(|e| ScreenerError::InvalidInput(format!("Job description file: {}", e)))?;

            info!("Screening {} resumes against {}", resumes.len(), job.display());

            let input_manager = InputManager::new(config.upload.clone());
            let job_text = input_manager.read_job_description(&job).await?;
            let (documents, unreadable) = input_manager.read_resumes(&resumes).await;

            let spinner = spinner("Loading embedding model...");
            let outcome = async {
                let provider = build_provider(&config).await?;
                spinner.set_message(format!("Ranking {} resumes...", documents.len()));
                Screener::new(provider, &config).screen(&job_text, documents).await
            }
            .await;
            spinner.finish_and_clear();

            let mut result = outcome?;
            result.record_skipped(unreadable);

            let generator = ReportGenerator::with_options(config.output.color_output, detailed, true, true);
            let report = generator.generate_report(&result, &output_format)?;
            println!("{}", report);

            if let Some(path) = save {
                // Saved files never carry ANSI escapes
                let plain = ReportGenerator::with_options(false, detailed, true, true);
                save_report_to_file(&plain.generate_report(&result, &output_format)?, &path)?;
                println!("💾 Report saved to {}", path.display());
            }
        }

        Commands::Compare { job, resume, output } => {
            let output_format = resolve_output_format(output.as_deref(), &config)?;
            cli::validate_file_extension(&job, cli::JOB_EXTENSIONS)
                .map_err(|e| ScreenerError::InvalidInput(format!("Job description file: {}", e)))?;

            let input_manager = InputManager::new(config.upload.clone());
            let job_text = input_manager.read_job_description(&job).await?;
            let resume_document = input_manager.load_document(&resume).await?;
            let resume_text = extract_in_background(resume_document).await?;

            let spinner = spinner("Computing similarity...");
            let outcome = async {
                let provider = build_provider(&config).await?;
                Screener::new(provider, &config).compare(&job_text, &resume_text).await
            }
            .await;
            spinner.finish_and_clear();

            let generator = ReportGenerator::with_options(config.output.color_output, config.output.detailed, true, true);
            println!("{}", generator.generate_comparison(&outcome?, &output_format)?);
        }

        Commands::Models { action } => {
            let mut manager = EmbeddingModelManager::new(config.models_dir().clone()).await?;

            match action {
                ModelAction::List => {
                    println!("📚 Available Embedding Models\n");
                    for (model_id, model) in manager.list_available_models() {
                        let status = if manager.is_model_downloaded(model_id) {
                            "✅ Downloaded"
                        } else {
                            "⬇️  Available"
                        };
                        println!(
                            "  • {} [{}] ({}) - {} MB, {} dims [{}]",
                            model.name, model_id, model.repo_id, model.size_mb, model.dimensions, status
                        );
                        println!("    {}", model.description);
                    }

                    if manager.list_downloaded_models().is_empty() {
                        println!("\n💡 No models downloaded yet. Get started with:");
                        println!("   resume-screener models download potion-base-8M");
                    }
                }

                ModelAction::Download { model, force } => {
                    let model_id = resolve_catalogue_id(&manager, &model)?;

                    if !force && manager.is_model_downloaded(&model_id) {
                        println!("✅ Model '{}' is already downloaded!", model_id);
                        println!("💡 Use --force to re-download");
                        return Ok(());
                    }

                    let spinner = spinner(&format!("Downloading {}...", model_id));
                    let downloaded = manager.download_model(&model_id, force).await;
                    spinner.finish_and_clear();

                    let model_path = downloaded?;
                    println!("✅ Model '{}' downloaded successfully!", model_id);
                    println!("📁 Location: {}", model_path.display());
                }

                ModelAction::Remove { model } => {
                    let model_id = resolve_catalogue_id(&manager, &model)?;
                    let removed = manager.remove_model(&model_id).await?;
                    println!("✅ Model '{}' removed successfully!", model_id);
                    println!("📁 Removed directory: {}", removed.display());
                }

                ModelAction::Info { model } => {
                    let model_id = resolve_catalogue_id(&manager, &model)?;
                    let model_info = manager
                        .get_model_info(&model_id)
                        .ok_or_else(|| ScreenerError::ModelNotFound(model.clone()))?;

                    println!("📋 Model Information for '{}'\n", model_id);
                    println!("Name: {}", model_info.name);
                    println!("Repository: {}", model_info.repo_id);
                    println!("Dimensions: {}", model_info.dimensions);
                    println!("Size: {} MB", model_info.size_mb);
                    println!("Description: {}", model_info.description);

                    match manager.get_model_path(&model_id) {
                        Some(path) => println!("Status: ✅ Downloaded ({})", path.display()),
                        None => {
                            println!("Status: ⬇️  Available for download");
                            println!("\n💡 To download this model, run:");
                            println!("   resume-screener models download {}", model_id);
                        }
                    }
                }
            }
        }

        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => show_config(&config, config_path),

            Some(ConfigAction::Reset) => {
                Config::default().save_to(config_path)?;
                println!("✅ Configuration reset to defaults at {}", config_path.display());
            }

            Some(ConfigAction::Set { key, value }) => {
                config.set(&key, &value)?;
                config.save_to(config_path)?;
                println!("✅ {} = {}", key, value);
            }

            Some(ConfigAction::Path) => println!("{}", config_path.display()),
        },
    }

    Ok(())
}

fn resolve_output_format(requested: Option<&str>, config: &Config) -> Result<OutputFormat> {
    match requested {
        Some(format) => cli::parse_output_format(format).map_err(ScreenerError::InvalidInput),
        None => Ok(config.output.format),
    }
}

fn resolve_catalogue_id(manager: &EmbeddingModelManager, requested: &str) -> Result<String> {
    manager
        .resolve_model_id(requested)
        .ok_or_else(|| ScreenerError::ModelNotFound(requested.to_string()))
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn show_config(config: &Config, config_path: &Path) {
    println!("⚙️  Current Configuration ({})\n", config_path.display());

    println!("Models:");
    println!("  Directory: {}", config.models_dir().display());
    match config.models.provider {
        ProviderKind::Model2Vec => {
            println!("  Provider: model2vec");
            println!("  Embedding Model: {}", config.models.embedding_model);
        }
        ProviderKind::Hosted => {
            let hosted = &config.models.hosted;
            println!("  Provider: hosted ({})", hosted.endpoint);
            println!("  Embedding Model: {} ({} dims)", hosted.model, hosted.dimension);
            if std::env::var(&hosted.api_key_env).is_err() {
                warn!("{} is not set", hosted.api_key_env);
            }
        }
    }

    println!("\nProcessing:");
    println!("  Stopwords: {}", config.processing.stopwords.len());
    println!("  Max Concurrent Embeddings: {}", config.processing.max_concurrent_embeddings);
    println!("  Request Timeout: {}s", config.processing.request_timeout_secs);
    println!("  Score Precision: {} decimals", config.processing.score_precision);

    println!("\nUploads:");
    println!("  Max File Size: {} bytes", config.upload.max_file_size);
    println!("  Allowed Extensions: {}", config.upload.allowed_extensions.join(", "));
    println!(
        "  Job Description Length: {}-{} characters",
        config.upload.min_job_description_chars, config.upload.max_job_description_chars
    );

    println!("\nOutput:");
    println!("  Format: {:?}", config.output.format);
    println!("  Detailed: {}", config.output.detailed);
    println!("  Colors: {}", config.output.color_output);
}
