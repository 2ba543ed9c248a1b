//! Screening pipeline: extract, normalize, embed and rank a batch of resumes
//! against one job description.

use crate::config::{Config, UploadConfig};
use crate::error::{Result, ScreenerError};
use crate::input::manager::{validate_job_description, validate_upload};
use crate::input::text_extractor::extract_in_background;
use crate::processing::document::Document;
use crate::processing::embeddings::{embed_batch_checked, embed_checked, EmbeddingProvider};
use crate::processing::normalizer::TextNormalizer;
use crate::processing::results::{
    RankedResume, RankingResult, SimilarityResponse, SkippedDocument, STATUS_SUCCESS,
};
use crate::processing::similarity::{cosine_similarity, ranking_order, relevance_label, round_score};
use chrono::Utc;
use log::{debug, info, warn};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub struct Screener {
    provider: Arc<dyn EmbeddingProvider>,
    normalizer: Arc<TextNormalizer>,
    upload: UploadConfig,
    max_concurrent: usize,
    timeout: Duration,
    precision: u32,
}

/// A resume that made it through extraction and embedding
struct ScoredCandidate {
    candidate_name: String,
    filename: String,
    score: f32,
}

impl Screener {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: &Config) -> Self {
        Self {
            provider,
            normalizer: Arc::new(TextNormalizer::from_config(&config.processing)),
            upload: config.upload.clone(),
            max_concurrent: config.processing.max_concurrent_embeddings.max(1),
            timeout: Duration::from_secs(config.processing.request_timeout_secs),
            precision: config.processing.score_precision,
        }
    }

    /// Rank `documents` by semantic similarity to `job_description`.
    ///
    /// Resumes that cannot be used are listed in `skipped`. A dimension
    /// mismatch or the request timeout aborts the whole request and cancels
    /// any scoring still in flight.
    pub async fn screen(&self, job_description: &str, documents: Vec<Document>) -> Result<RankingResult> {
        let start_time = Instant::now();

        validate_job_description(job_description, &self.upload)?;
        if documents.is_empty() {
            return Err(ScreenerError::EmptyInput("No resumes provided".to_string()));
        }

        info!(
            "Screening {} resumes with {} ({} dimensions)",
            documents.len(),
            self.provider.model_name(),
            self.provider.dimension()
        );

        let outcomes = self
            .within_deadline(async {
                let job_embedding = Arc::new(self.embed_job(job_description).await?);
                self.score_all(job_embedding, documents).await
            })
            .await?;

        let mut scored = Vec::new();
        let mut skipped = Vec::new();
        for (filename, outcome) in outcomes {
            match outcome {
                Ok(candidate) => scored.push(candidate),
                Err(e) => {
                    warn!("Skipping {}: {}", filename, e);
                    skipped.push(SkippedDocument::new(filename, &e));
                }
            }
        }

        if scored.is_empty() {
            return Err(ScreenerError::EmptyInput("No valid resumes provided".to_string()));
        }

        let ranked_resumes = self.rank(scored);
        let processing_time_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "Ranked {} resumes ({} skipped) in {}ms",
            ranked_resumes.len(),
            skipped.len(),
            processing_time_ms
        );

        Ok(RankingResult {
            total_resumes: ranked_resumes.len(),
            ranked_resumes,
            skipped,
            status: STATUS_SUCCESS.to_string(),
            embedding_model: self.provider.model_name().to_string(),
            embedding_dimension: self.provider.dimension(),
            processing_time_ms,
            generated_at: Utc::now(),
        })
    }

    /// Similarity of one resume text to one job description. Both texts are
    /// embedded in a single batch under the request timeout.
    pub async fn compare(&self, job_text: &str, resume_text: &str) -> Result<SimilarityResponse> {
        let job_normalized = self.normalize_job(job_text)?;
        let resume_normalized = self.normalizer.normalize(resume_text);
        if resume_normalized.is_empty() {
            return Err(ScreenerError::EmptyInput(
                "Resume has no usable text after normalization".to_string(),
            ));
        }

        let texts = [job_normalized, resume_normalized];
        let embeddings = self
            .within_deadline(embed_batch_checked(self.provider.as_ref(), &texts))
            .await?;

        let score = round_score(cosine_similarity(&embeddings[0], &embeddings[1])?, self.precision);

        Ok(SimilarityResponse {
            similarity_score: score,
            relevance: relevance_label(score),
            status: STATUS_SUCCESS.to_string(),
        })
    }

    /// Fails with `Timeout` once the configured deadline passes. Dropping
    /// `work` at that point cancels whatever it still had running.
    async fn within_deadline<T>(&self, work: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.timeout, work)
            .await
            .map_err(|_| ScreenerError::Timeout(self.timeout.as_secs()))?
    }

    fn normalize_job(&self, job_text: &str) -> Result<String> {
        let normalized = self.normalizer.normalize(job_text);
        if normalized.is_empty() {
            return Err(ScreenerError::EmptyInput(
                "Job description has no usable text after normalization".to_string(),
            ));
        }
        debug!("Normalized job description: {} characters", normalized.len());
        Ok(normalized)
    }

    async fn embed_job(&self, job_text: &str) -> Result<Vec<f32>> {
        let normalized = self.normalize_job(job_text)?;
        embed_checked(self.provider.as_ref(), &normalized).await
    }

    /// One task per document, at most `max_concurrent` running at once.
    /// Outcomes come back in input order. The first fatal error is returned
    /// straight away; dropping the `JoinSet` aborts the remaining tasks.
    async fn score_all(
        &self,
        job_embedding: Arc<Vec<f32>>,
        documents: Vec<Document>,
    ) -> Result<Vec<(String, Result<ScoredCandidate>)>> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();
        let total = documents.len();

        for (index, document) in documents.into_iter().enumerate() {
            let semaphore = semaphore.clone();
            let provider = self.provider.clone();
            let normalizer = self.normalizer.clone();
            let job_embedding = job_embedding.clone();
            let upload = self.upload.clone();

            tasks.spawn(async move {
                let filename = document.filename.clone();
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => score_document(provider, normalizer, &job_embedding, &upload, document).await,
                    Err(e) => Err(ScreenerError::Embedding(format!("Worker pool closed: {}", e))),
                };
                (index, filename, outcome)
            });
        }

        let mut outcomes: Vec<Option<(String, Result<ScoredCandidate>)>> = (0..total).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let (index, filename, outcome) =
                joined.map_err(|e| ScreenerError::Embedding(format!("Scoring task failed: {}", e)))?;
            let outcome = match outcome {
                Err(e) if e.is_fatal() => {
                    warn!("Aborting screening: {} failed with {}", filename, e);
                    return Err(e);
                }
                other => other,
            };
            outcomes[index] = Some((filename, outcome));
        }

        Ok(outcomes.into_iter().flatten().collect())
    }

    /// Round, then stable-sort so ties after rounding keep input order
    fn rank(&self, scored: Vec<ScoredCandidate>) -> Vec<RankedResume> {
        let scores: Vec<f32> = scored
            .iter()
            .map(|candidate| round_score(candidate.score, self.precision))
            .collect();

        ranking_order(&scores)
            .into_iter()
            .enumerate()
            .map(|(position, index)| RankedResume {
                rank: position + 1,
                candidate_name: scored[index].candidate_name.clone(),
                similarity_score: scores[index],
                filename: scored[index].filename.clone(),
                relevance: relevance_label(scores[index]),
            })
            .collect()
    }
}

async fn score_document(
    provider: Arc<dyn EmbeddingProvider>,
    normalizer: Arc<TextNormalizer>,
    job_embedding: &[f32],
    upload: &UploadConfig,
    document: Document,
) -> Result<ScoredCandidate> {
    validate_upload(&document, upload)?;

    let candidate_name = document.candidate_name();
    let filename = document.filename.clone();

    let text = extract_in_background(document).await?;
    let normalized = normalizer.normalize(&text);
    if normalized.is_empty() {
        return Err(ScreenerError::EmptyInput(format!(
            "{} has no usable text after normalization",
            filename
        )));
    }

    let embedding = embed_checked(provider.as_ref(), &normalized).await?;
    let score = cosine_similarity(job_embedding, &embedding)?;
    debug!("{}: similarity {:.4}", candidate_name, score);

    Ok(ScoredCandidate {
        candidate_name,
        filename,
        score,
    })
}
