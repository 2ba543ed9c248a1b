//! Embedding providers: local Model2Vec and hosted OpenAI-compatible APIs

use crate::config::{Config, HostedConfig, ProviderKind};
use crate::error::{Result, ScreenerError};
use crate::processing::embedding_manager::EmbeddingModelManager;
use async_trait::async_trait;
use log::{info, warn};
use model2vec_rs::model::StaticModel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Maps text to a fixed-dimension vector.
///
/// Implementations must return vectors of exactly `dimension()` elements for
/// every input; callers rely on it to compare vectors from one ranking.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Identifier reported alongside results
    fn model_name(&self) -> &str;

    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, one vector per text in input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }
}

/// Embed `text` and verify the vector has the provider's declared dimension
pub async fn embed_checked(provider: &dyn EmbeddingProvider, text: &str) -> Result<Vec<f32>> {
    let embedding = provider.embed(text).await?;
    if embedding.len() != provider.dimension() {
        return Err(ScreenerError::DimensionMismatch {
            expected: provider.dimension(),
            actual: embedding.len(),
        });
    }
    Ok(embedding)
}

/// Batch version of [`embed_checked`]; also checks one vector came back per text
pub async fn embed_batch_checked(provider: &dyn EmbeddingProvider, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    let embeddings = provider.embed_batch(texts).await?;
    if embeddings.len() != texts.len() {
        return Err(ScreenerError::Embedding(format!(
            "Provider returned {} embeddings for {} texts",
            embeddings.len(),
            texts.len()
        )));
    }
    if let Some(bad) = embeddings.iter().find(|e| e.len() != provider.dimension()) {
        return Err(ScreenerError::DimensionMismatch {
            expected: provider.dimension(),
            actual: bad.len(),
        });
    }
    Ok(embeddings)
}

fn zero_embedding(dimension: usize) -> Vec<f32> {
    warn!("Empty text provided for embedding");
    vec![0.0; dimension]
}

pub struct Model2VecProvider {
    model: Arc<StaticModel>,
    model_name: String,
    dimension: usize,
}

impl Model2VecProvider {
    /// Load a Model2Vec model from a local folder or a Hugging Face repo id
    pub fn load(model_path: &Path, model_name: impl Into<String>) -> Result<Self> {
        let start_time = Instant::now();
        info!("Loading Model2Vec embedding model from: {}", model_path.display());

        let model = StaticModel::from_pretrained(model_path, None, None, None)
            .map_err(|e| ScreenerError::ModelError(format!("Failed to load model: {}", e)))?;

        // The model does not expose its width directly
        let dimension = model.encode_single("dimension probe").len();
        if dimension == 0 {
            return Err(ScreenerError::ModelError(format!(
                "Model at {} produced empty embeddings",
                model_path.display()
            )));
        }

        info!(
            "Model loaded in {:.2?} ({} dimensions)",
            start_time.elapsed(),
            dimension
        );

        Ok(Self {
            model: Arc::new(model),
            model_name: model_name.into(),
            dimension,
        })
    }

    /// Resolve the configured model through the model manager, downloading it
    /// on first use, then load it.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let requested = &config.models.embedding_model;
        let mut manager = EmbeddingModelManager::new(config.models_dir().clone()).await?;

        let model_path = match manager.resolve_model_id(requested) {
            Some(model_id) => manager.ensure_model_available(&model_id).await?,
            // Not a catalogue entry: a local folder or a raw Hub repo id
            None => PathBuf::from(requested),
        };

        let model_name = requested.clone();
        tokio::task::spawn_blocking(move || Self::load(&model_path, model_name))
            .await
            .map_err(|e| ScreenerError::ModelError(format!("Model loading task failed: {}", e)))?
    }
}

#[async_trait]
impl EmbeddingProvider for Model2VecProvider {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Ok(zero_embedding(self.dimension));
        }

        let model = Arc::clone(&self.model);
        let text = text.to_string();
        tokio::task::spawn_blocking(move || model.encode_single(&text))
            .await
            .map_err(|e| ScreenerError::Embedding(format!("Embedding task failed: {}", e)))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let non_blank: Vec<String> = texts.iter().filter(|t| !t.trim().is_empty()).cloned().collect();

        let model = Arc::clone(&self.model);
        let mut encoded = tokio::task::spawn_blocking(move || model.encode(&non_blank))
            .await
            .map_err(|e| ScreenerError::Embedding(format!("Batch embedding task failed: {}", e)))?
            .into_iter();

        texts
            .iter()
            .map(|text| {
                if text.trim().is_empty() {
                    Ok(zero_embedding(self.dimension))
                } else {
                    encoded
                        .next()
                        .ok_or_else(|| ScreenerError::Embedding("Model returned too few embeddings".to_string()))
                }
            })
            .collect()
    }
}

/// `input` is a single string or an array of strings
#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a, I: Serialize> {
    input: I,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingObject>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingObject {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

/// Client for an OpenAI-compatible `POST {endpoint}/embeddings` API
pub struct HostedEmbeddingProvider {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
    dimension: usize,
}

impl HostedEmbeddingProvider {
    pub fn new(config: &HostedConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let api_key = std::env::var(&config.api_key_env).ok();
        if api_key.is_none() {
            warn!(
                "{} is not set; calling {} without credentials",
                config.api_key_env, config.endpoint
            );
        }

        Ok(Self {
            client,
            url: format!("{}/embeddings", config.endpoint.trim_end_matches('/')),
            model: config.model.clone(),
            api_key,
            dimension: config.dimension,
        })
    }

    async fn request<I: Serialize + Send + Sync>(&self, input: I) -> Result<Vec<EmbeddingObject>> {
        let mut request = self.client.post(&self.url).json(&EmbeddingsRequest {
            input,
            model: &self.model,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response: EmbeddingsResponse = request.send().await?.error_for_status()?.json().await?;
        Ok(response.data)
    }
}

/// Order by the `index` the API reports, which may differ from response order
fn into_input_order(mut data: Vec<EmbeddingObject>) -> Vec<Vec<f32>> {
    data.sort_by_key(|object| object.index);
    data.into_iter().map(|object| object.embedding).collect()
}

#[async_trait]
impl EmbeddingProvider for HostedEmbeddingProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Ok(zero_embedding(self.dimension));
        }

        self.request(text)
            .await?
            .into_iter()
            .next()
            .map(|object| object.embedding)
            .ok_or_else(|| ScreenerError::Embedding("Embedding API returned no vectors".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let inputs: Vec<&str> = texts.iter().map(String::as_str).filter(|t| !t.trim().is_empty()).collect();
        let mut remote = if inputs.is_empty() {
            Vec::new().into_iter()
        } else {
            into_input_order(self.request(&inputs).await?).into_iter()
        };

        texts
            .iter()
            .map(|text| {
                if text.trim().is_empty() {
                    Ok(zero_embedding(self.dimension))
                } else {
                    remote
                        .next()
                        .ok_or_else(|| ScreenerError::Embedding("Embedding API returned too few vectors".to_string()))
                }
            })
            .collect()
    }
}

/// Build the provider selected by `models.provider`
pub async fn build_provider(config: &Config) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.models.provider {
        ProviderKind::Model2Vec => Ok(Arc::new(Model2VecProvider::from_config(config).await?)),
        ProviderKind::Hosted => Ok(Arc::new(HostedEmbeddingProvider::new(&config.models.hosted)?)),
    }
}
