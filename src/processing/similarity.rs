//! Vector similarity, ranking and relevance bucketing
//!
//! Every function here is pure: no shared state, safe to call from any number
//! of workers at once.

use crate::error::{Result, ScreenerError};
use log::warn;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// One entry of a ranking: 1-based position, candidate identity and score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub name: String,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RelevanceLabel {
    #[serde(rename = "Low Relevance")]
    LowRelevance,
    #[serde(rename = "Moderately Relevant")]
    ModeratelyRelevant,
    #[serde(rename = "Relevant")]
    Relevant,
    #[serde(rename = "Highly Relevant")]
    HighlyRelevant,
}

impl RelevanceLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelevanceLabel::HighlyRelevant => "Highly Relevant",
            RelevanceLabel::Relevant => "Relevant",
            RelevanceLabel::ModeratelyRelevant => "Moderately Relevant",
            RelevanceLabel::LowRelevance => "Low Relevance",
        }
    }
}

impl fmt::Display for RelevanceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn ensure_same_dimension(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() != b.len() {
        return Err(ScreenerError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(())
}

/// Cosine similarity clamped to [-1, 1].
///
/// A zero-norm input yields 0.0 rather than an error.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    ensure_same_dimension(a, b)?;

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        warn!("One or both embedding vectors have zero norm");
        return Ok(0.0);
    }

    let similarity = dot_product / (norm_a * norm_b);
    if !similarity.is_finite() {
        warn!("Cosine similarity is not finite ({}); treating as 0.0", similarity);
        return Ok(0.0);
    }

    Ok(similarity.clamp(-1.0, 1.0))
}

/// L2 norm of the difference. Lower means more similar.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> Result<f32> {
    ensure_same_dimension(a, b)?;

    let distance = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt();

    if distance.is_nan() {
        warn!("Euclidean distance is undefined for the given vectors");
        return Ok(f32::INFINITY);
    }

    Ok(distance)
}

/// Sum of absolute differences. Lower means more similar.
pub fn manhattan_distance(a: &[f32], b: &[f32]) -> Result<f32> {
    ensure_same_dimension(a, b)?;

    let distance: f32 = a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum();

    if distance.is_nan() {
        warn!("Manhattan distance is undefined for the given vectors");
        return Ok(f32::INFINITY);
    }

    Ok(distance)
}

/// Cosine similarity of one job vector against every resume vector, in input order
pub fn batch_similarity<V: AsRef<[f32]>>(job: &[f32], resumes: &[V]) -> Result<Vec<f32>> {
    resumes
        .iter()
        .map(|resume| cosine_similarity(job, resume.as_ref()))
        .collect()
}

/// Scale a vector to unit length in place. Zero vectors are left untouched.
pub fn normalize_l2(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 && norm.is_finite() {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

/// Descending order with NaN treated as the lowest possible score
fn descending(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Indices of `scores` from highest to lowest. Stable: equal scores keep
/// their input order.
pub fn ranking_order(scores: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| descending(scores[a], scores[b]));
    order
}

/// Rank candidates by score, highest first.
///
/// The sort is stable, so equal scores keep their input order. Ranks are the
/// 1-based positions after sorting.
pub fn rank_by_similarity<S: AsRef<str>>(scores: &[f32], names: &[S]) -> Result<Vec<RankedEntry>> {
    if scores.len() != names.len() {
        return Err(ScreenerError::InvalidInput(format!(
            "Got {} scores for {} candidates",
            scores.len(),
            names.len()
        )));
    }

    Ok(ranking_order(scores)
        .into_iter()
        .enumerate()
        .map(|(position, index)| RankedEntry {
            rank: position + 1,
            name: names[index].as_ref().to_string(),
            score: scores[index],
        })
        .collect())
}

/// Bucket a score by its percentage. Lower bounds are inclusive.
pub fn relevance_label(score: f32) -> RelevanceLabel {
    let percentage = score * 100.0;

    if percentage >= 80.0 {
        RelevanceLabel::HighlyRelevant
    } else if percentage >= 60.0 {
        RelevanceLabel::Relevant
    } else if percentage >= 40.0 {
        RelevanceLabel::ModeratelyRelevant
    } else {
        RelevanceLabel::LowRelevance
    }
}

/// e.g. `"85.00% (Highly Relevant)"`
pub fn similarity_percentile(score: f32) -> String {
    format!("{:.2}% ({})", score * 100.0, relevance_label(score))
}

/// Round to a fixed number of decimal places for presentation and ranking
pub fn round_score(score: f32, precision: u32) -> f32 {
    let factor = 10f64.powi(precision.min(9) as i32);
    ((score as f64 * factor).round() / factor) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, tolerance: f32) -> bool {
        (a - b).abs() <= tolerance
    }

    #[test]
    fn test_identical_vectors() {
        let v = [1.0, 0.0, 0.0];
        assert!(approx(cosine_similarity(&v, &v).unwrap(), 1.0, 1e-2));

        let w = [0.3, -2.5, 7.25, 0.001];
        assert!(approx(cosine_similarity(&w, &w).unwrap(), 1.0, 1e-2));
    }

    #[test]
    fn test_orthogonal_vectors() {
        let similarity = cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]).unwrap();
        assert!(approx(similarity, 0.0, 1e-2));
    }

    #[test]
    fn test_opposite_vectors() {
        let v = [0.5, 0.3, 0.8];
        let neg: Vec<f32> = v.iter().map(|x| -x).collect();

        let similarity = cosine_similarity(&v, &neg).unwrap();
        assert!(approx(similarity, -1.0, 1e-2));
        assert!(similarity >= -1.0);
    }

    #[test]
    fn test_symmetry_and_bounds() {
        let vectors: Vec<Vec<f32>> = vec![
            vec![0.1, 0.2, 0.3, 0.4],
            vec![-1.0, 4.0, 0.5, 2.0],
            vec![1e-3, -1e-3, 1e3, -1e3],
            vec![3.0, 3.0, 3.0, 3.0],
            vec![-0.7, 0.0, 0.2, -9.1],
        ];

        for a in &vectors {
            for b in &vectors {
                let ab = cosine_similarity(a, b).unwrap();
                let ba = cosine_similarity(b, a).unwrap();
                assert_eq!(ab, ba);
                assert!((-1.0..=1.0).contains(&ab));
            }
        }
    }

    #[test]
    fn test_zero_vector_handling() {
        for dim in [1usize, 3, 384] {
            let zero = vec![0.0f32; dim];
            let one = vec![1.0f32; dim];
            assert_eq!(cosine_similarity(&zero, &one).unwrap(), 0.0);
            assert_eq!(cosine_similarity(&one, &zero).unwrap(), 0.0);
            assert_eq!(cosine_similarity(&zero, &zero).unwrap(), 0.0);
        }
    }

    #[test]
    fn test_dimension_mismatch_is_an_error() {
        let result = cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0]);
        match result {
            Err(ScreenerError::DimensionMismatch { expected, actual }) => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
            }
            other => panic!("expected dimension mismatch, got {:?}", other),
        }

        assert!(euclidean_distance(&[1.0], &[1.0, 2.0]).is_err());
        assert!(manhattan_distance(&[1.0], &[]).is_err());
    }

    #[test]
    fn test_euclidean_distance() {
        let distance = euclidean_distance(&[0.0, 0.0, 0.0], &[3.0, 4.0, 0.0]).unwrap();
        assert!(approx(distance, 5.0, 1e-2));
        assert_eq!(euclidean_distance(&[1.5, 2.5], &[1.5, 2.5]).unwrap(), 0.0);
    }

    #[test]
    fn test_undefined_distance_is_infinite() {
        let a = [f32::INFINITY, 1.0];
        let b = [f32::INFINITY, 2.0];
        assert_eq!(euclidean_distance(&a, &b).unwrap(), f32::INFINITY);
        assert_eq!(manhattan_distance(&a, &b).unwrap(), f32::INFINITY);
        assert_eq!(manhattan_distance(&[f32::NAN], &[0.0]).unwrap(), f32::INFINITY);
    }

    #[test]
    fn test_relevance_label_serializes_display_text() {
        let json = serde_json::to_string(&RelevanceLabel::HighlyRelevant).unwrap();
        assert_eq!(json, "\"Highly Relevant\"");
        let parsed: RelevanceLabel = serde_json::from_str("\"Low Relevance\"").unwrap();
        assert_eq!(parsed, RelevanceLabel::LowRelevance);
    }

    #[test]
    fn test_manhattan_distance() {
        let distance = manhattan_distance(&[1.0, -2.0, 3.0], &[4.0, 2.0, 3.0]).unwrap();
        assert!(approx(distance, 7.0, 1e-6));
    }

    #[test]
    fn test_batch_similarity_ordering() {
        let job = [0.5, 0.3, 0.8];
        let resumes = vec![vec![0.5, 0.3, 0.8], vec![0.4, 0.2, 0.7], vec![0.1, 0.1, 0.1]];

        let similarities = batch_similarity(&job, &resumes).unwrap();
        assert_eq!(similarities.len(), 3);
        assert!(similarities[0] > similarities[2]);

        let names = ["identical", "close", "flat"];
        let ranked = rank_by_similarity(&similarities, &names).unwrap();
        assert_eq!(ranked.first().unwrap().name, "identical");
        assert_eq!(ranked.last().unwrap().name, "flat");
    }

    #[test]
    fn test_rank_by_similarity() {
        let ranked = rank_by_similarity(&[0.2, 0.9, 0.5], &["C", "A", "B"]).unwrap();
        let expected = vec![
            RankedEntry { rank: 1, name: "A".to_string(), score: 0.9 },
            RankedEntry { rank: 2, name: "B".to_string(), score: 0.5 },
            RankedEntry { rank: 3, name: "C".to_string(), score: 0.2 },
        ];
        assert_eq!(ranked, expected);

        let ranked = rank_by_similarity(&[0.9, 0.5, 0.2], &["A", "B", "C"]).unwrap();
        let tuples: Vec<(usize, &str, f32)> = ranked.iter().map(|e| (e.rank, e.name.as_str(), e.score)).collect();
        assert_eq!(tuples, vec![(1, "A", 0.9), (2, "B", 0.5), (3, "C", 0.2)]);
    }

    #[test]
    fn test_rank_ties_keep_input_order() {
        let ranked = rank_by_similarity(&[0.5, 0.5], &["A", "B"]).unwrap();
        assert_eq!(ranked[0], RankedEntry { rank: 1, name: "A".to_string(), score: 0.5 });
        assert_eq!(ranked[1], RankedEntry { rank: 2, name: "B".to_string(), score: 0.5 });

        let ranked = rank_by_similarity(&[0.1, 0.7, 0.7, 0.7], &["w", "x", "y", "z"]).unwrap();
        let names: Vec<&str> = ranked.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y", "z", "w"]);
    }

    #[test]
    fn test_rank_nan_sorts_last() {
        let ranked = rank_by_similarity(&[f32::NAN, 0.1, 0.3], &["nan", "low", "high"]).unwrap();
        let names: Vec<&str> = ranked.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["high", "low", "nan"]);
    }

    #[test]
    fn test_ranking_order() {
        assert_eq!(ranking_order(&[0.3, 0.9, 0.3, 0.1]), vec![1, 0, 2, 3]);
        assert!(ranking_order(&[]).is_empty());
    }

    #[test]
    fn test_rank_length_mismatch() {
        assert!(rank_by_similarity(&[0.1, 0.2], &["only-one"]).is_err());
        assert!(rank_by_similarity::<&str>(&[], &[]).unwrap().is_empty());
    }

    #[test]
    fn test_relevance_labels() {
        assert_eq!(relevance_label(80.0 / 100.0), RelevanceLabel::HighlyRelevant);
        assert_eq!(relevance_label(0.95), RelevanceLabel::HighlyRelevant);
        assert_eq!(relevance_label(0.79), RelevanceLabel::Relevant);
        assert_eq!(relevance_label(0.6), RelevanceLabel::Relevant);
        assert_eq!(relevance_label(0.45), RelevanceLabel::ModeratelyRelevant);
        assert_eq!(relevance_label(0.40), RelevanceLabel::ModeratelyRelevant);
        assert_eq!(relevance_label(0.3999), RelevanceLabel::LowRelevance);
        assert_eq!(relevance_label(0.39), RelevanceLabel::LowRelevance);
        assert_eq!(relevance_label(-0.5), RelevanceLabel::LowRelevance);

        assert_eq!(relevance_label(0.79).to_string(), "Relevant");
        assert!(RelevanceLabel::HighlyRelevant > RelevanceLabel::Relevant);
    }

    #[test]
    fn test_similarity_percentile() {
        assert_eq!(similarity_percentile(0.85), "85.00% (Highly Relevant)");
        assert_eq!(similarity_percentile(0.1234), "12.34% (Low Relevance)");
    }

    #[test]
    fn test_normalize_l2() {
        let mut v = vec![3.0, 4.0];
        normalize_l2(&mut v);
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!(approx(norm, 1.0, 1e-2));

        let mut zero = vec![0.0, 0.0];
        normalize_l2(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0]);
    }

    #[test]
    fn test_round_score() {
        assert_eq!(round_score(0.123456, 4), 0.1235);
        assert_eq!(round_score(0.99999, 2), 1.0);
    }
}
