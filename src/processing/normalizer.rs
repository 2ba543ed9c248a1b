//! Text normalization applied before embedding

use crate::config::ProcessingConfig;
use regex::Regex;
use std::collections::HashSet;

/// Common English function words dropped from every document
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from",
    "has", "he", "in", "is", "it", "its", "of", "on", "or", "that",
    "the", "to", "was", "will", "with", "i", "me", "my", "we", "you",
    "your", "this", "but", "not", "can", "could", "would", "should",
];

/// One step of the cleaning pipeline. Applied in order; every step is total.
enum CleaningRule {
    Lowercase,
    Replace {
        pattern: Regex,
        replacement: &'static str,
    },
    CollapseWhitespace,
    DropNumericTokens,
}

impl CleaningRule {
    fn apply(&self, text: &str) -> String {
        match self {
            CleaningRule::Lowercase => text.to_lowercase(),
            CleaningRule::Replace { pattern, replacement } => {
                pattern.replace_all(text, *replacement).into_owned()
            }
            CleaningRule::CollapseWhitespace => text.split_whitespace().collect::<Vec<_>>().join(" "),
            CleaningRule::DropNumericTokens => text
                .split_whitespace()
                .filter(|token| !token.chars().all(|c| c.is_ascii_digit()))
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

pub struct TextNormalizer {
    stopwords: HashSet<String>,
    rules: Vec<CleaningRule>,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_STOPWORDS.iter().copied())
    }
}

impl TextNormalizer {
    pub fn new<I, S>(stopwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let stopwords = stopwords
            .into_iter()
            .map(|word| word.as_ref().trim().to_lowercase())
            .filter(|word| !word.is_empty())
            .collect();

        // Everything except lowercase ascii letters, digits, whitespace and periods
        let disallowed = Regex::new(r"[^a-z0-9\s.]").expect("Invalid cleaning regex");

        let rules = vec![
            CleaningRule::Lowercase,
            CleaningRule::Replace {
                pattern: disallowed,
                replacement: " ",
            },
            CleaningRule::CollapseWhitespace,
            CleaningRule::DropNumericTokens,
            CleaningRule::CollapseWhitespace,
        ];

        Self { stopwords, rules }
    }

    pub fn from_config(config: &ProcessingConfig) -> Self {
        Self::new(&config.stopwords)
    }

    /// Full pipeline: cleaning followed by stopword removal
    pub fn normalize(&self, raw: &str) -> String {
        let cleaned = self.clean_text(raw);
        self.remove_stopwords(&cleaned)
    }

    /// Lowercase, strip special characters, collapse whitespace, drop numeric tokens
    pub fn clean_text(&self, text: &str) -> String {
        self.rules
            .iter()
            .fold(text.to_string(), |acc, rule| rule.apply(&acc))
    }

    pub fn remove_stopwords(&self, text: &str) -> String {
        text.split_whitespace()
            .filter(|word| !self.is_stopword(word))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(&word.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_lowercases() {
        let normalizer = TextNormalizer::default();
        let cleaned = normalizer.clean_text("Hello World");

        assert_eq!(cleaned, "hello world");
    }

    #[test]
    fn test_special_characters_removed() {
        let normalizer = TextNormalizer::default();
        let cleaned = normalizer.clean_text("Test@#$%email.com");

        assert!(!cleaned.contains('@'));
        assert!(!cleaned.contains('#'));
        assert_eq!(cleaned, "test email.com");
    }

    #[test]
    fn test_numeric_tokens_removed() {
        let normalizer = TextNormalizer::default();

        let cleaned = normalizer.clean_text("5 years of experience with 3+ projects");
        assert_eq!(cleaned, "years of experience with projects");

        let normalized = normalizer.normalize("5 years of experience");
        assert!(!normalized.split_whitespace().any(|t| t == "5"));
        assert_eq!(normalized, "years experience");
    }

    #[test]
    fn test_mixed_alphanumeric_tokens_kept() {
        let normalizer = TextNormalizer::default();
        let normalized = normalizer.normalize("Python3 and S3, 2019 release v2.1");

        assert_eq!(normalized, "python3 s3 release v2.1");
    }

    #[test]
    fn test_stopword_removal() {
        let normalizer = TextNormalizer::default();
        let cleaned = normalizer.remove_stopwords("the quick brown fox jumps over the lazy dog");

        assert!(!cleaned.split_whitespace().any(|w| w == "the"));
        assert!(cleaned.contains("quick"));
        assert!(cleaned.contains("brown"));
    }

    #[test]
    fn test_empty_and_all_stopword_input() {
        let normalizer = TextNormalizer::default();

        assert_eq!(normalizer.normalize(""), "");
        assert_eq!(normalizer.normalize("   \n\t "), "");
        assert_eq!(normalizer.normalize("The and IS with"), "");
        assert_eq!(normalizer.normalize("1 22 333"), "");
    }

    #[test]
    fn test_whitespace_collapsed() {
        let normalizer = TextNormalizer::default();
        let normalized = normalizer.normalize("  Rust\t\tdeveloper \n\n  Tokio  ");

        assert_eq!(normalized, "rust developer tokio");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let normalizer = TextNormalizer::default();
        let samples = [
            "",
            "Senior Python Developer with FastAPI experience and PostgreSQL knowledge",
            "Contact: jane.doe@example.com | +1 (555) 123-4567",
            "5 years of experience with 3+ projects",
            "Ünïcödé İstanbul résumé — naïve café",
            "C++ / C# / .NET 4.8 ... v1.2.3",
            "the the the",
        ];

        for sample in samples {
            let once = normalizer.normalize(sample);
            let twice = normalizer.normalize(&once);
            assert_eq!(once, twice, "normalize not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_custom_stopwords() {
        let normalizer = TextNormalizer::new(["Rust", " senior "]);

        assert!(normalizer.is_stopword("RUST"));
        assert!(!normalizer.is_stopword("the"));
        assert_eq!(normalizer.normalize("Senior Rust engineer and mentor"), "engineer and mentor");
    }
}
