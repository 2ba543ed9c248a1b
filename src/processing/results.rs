//! Result types surfaced by a screening run

use crate::error::ScreenerError;
use crate::processing::similarity::RelevanceLabel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const STATUS_SUCCESS: &str = "success";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResume {
    pub rank: usize,
    pub candidate_name: String,
    pub similarity_score: f32,
    pub filename: String,
    pub relevance: RelevanceLabel,
}

/// A resume left out of the ranking and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDocument {
    pub filename: String,
    pub reason: String,
}

impl SkippedDocument {
    pub fn new(filename: impl Into<String>, error: &ScreenerError) -> Self {
        Self {
            filename: filename.into(),
            reason: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingResult {
    /// Number of ranked resumes; skipped ones are not counted
    pub total_resumes: usize,
    pub ranked_resumes: Vec<RankedResume>,
    pub skipped: Vec<SkippedDocument>,
    pub status: String,
    pub embedding_model: String,
    pub embedding_dimension: usize,
    pub processing_time_ms: u64,
    pub generated_at: DateTime<Utc>,
}

/// Highest, average and lowest score of a ranking
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub highest: f32,
    pub average: f32,
    pub lowest: f32,
}

impl RankingResult {
    pub fn top(&self) -> Option<&RankedResume> {
        self.ranked_resumes.first()
    }

    /// `None` when nothing was ranked
    pub fn summary(&self) -> Option<ScoreSummary> {
        let first = self.ranked_resumes.first()?;
        let last = self.ranked_resumes.last()?;
        let total: f32 = self.ranked_resumes.iter().map(|r| r.similarity_score).sum();

        Some(ScoreSummary {
            highest: first.similarity_score,
            average: total / self.ranked_resumes.len() as f32,
            lowest: last.similarity_score,
        })
    }

    /// Merge documents that never reached the screener
    pub fn record_skipped(&mut self, skipped: impl IntoIterator<Item = SkippedDocument>) {
        self.skipped.extend(skipped);
    }
}

/// Outcome of comparing one resume text against one job description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResponse {
    pub similarity_score: f32,
    pub relevance: RelevanceLabel,
    pub status: String,
}
