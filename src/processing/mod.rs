//! Text processing, embedding and ranking

pub mod document;
pub mod normalizer;
pub mod embeddings;
pub mod embedding_manager;
pub mod similarity;
pub mod results;
pub mod screener;

pub use results::{RankedResume, RankingResult, ScoreSummary, SimilarityResponse, SkippedDocument};
pub use screener::Screener;
