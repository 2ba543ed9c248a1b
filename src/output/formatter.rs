//! Output formatters for screening results: console, JSON, Markdown and CSV

use crate::config::OutputFormat;
use crate::error::{Result, ScreenerError};
use crate::processing::results::{RankedResume, RankingResult, ScoreSummary, SimilarityResponse};
use crate::processing::similarity::RelevanceLabel;
use colored::{Color, Colorize};
use std::path::Path;

/// Renders a ranking or a single comparison in one output format
pub trait OutputFormatter {
    fn format_ranking(&self, result: &RankingResult) -> Result<String>;
    fn format_comparison(&self, response: &SimilarityResponse) -> Result<String>;
}

/// Console formatter with colors and medals for the top three
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

/// JSON formatter for scripting and API consumers
pub struct JsonFormatter {
    pretty: bool,
}

pub struct MarkdownFormatter {
    include_metadata: bool,
}

/// One row per ranked resume, for spreadsheets
pub struct CsvFormatter;

/// Picks the formatter matching an `OutputFormat`
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
    csv_formatter: CsvFormatter,
}

fn relevance_color(relevance: RelevanceLabel) -> Color {
    match relevance {
        RelevanceLabel::HighlyRelevant => Color::Green,
        RelevanceLabel::Relevant => Color::BrightGreen,
        RelevanceLabel::ModeratelyRelevant => Color::Yellow,
        RelevanceLabel::LowRelevance => Color::Red,
    }
}

fn percentage(score: f32) -> String {
    format!("{:.2}%", score * 100.0)
}

fn format_summary_line(label: &str, score: f32) -> String {
    format!("  {:<8} {:.4} ({})\n", label, score, percentage(score))
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let (prefix, color) = match level {
            1 => ("█", Color::Blue),
            2 => ("▓", Color::Green),
            _ => ("▒", Color::Yellow),
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_rank(&self, rank: usize) -> String {
        if self.use_colors {
            match rank {
                1 => return "🥇".to_string(),
                2 => return "🥈".to_string(),
                3 => return "🥉".to_string(),
                _ => {}
            }
        }
        format!("#{}", rank)
    }

    fn format_entry(&self, resume: &RankedResume) -> String {
        let score = self.colorize(&percentage(resume.similarity_score), relevance_color(resume.relevance));
        let mut line = format!(
            "{:>4}  {:<32} {:>9}  {}\n",
            self.format_rank(resume.rank),
            resume.candidate_name,
            score,
            resume.relevance
        );
        if self.detailed {
            line.push_str(&format!(
                "      file: {} | raw score: {:.4}\n",
                resume.filename, resume.similarity_score
            ));
        }
        line
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_ranking(&self, result: &RankingResult) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header("📊 RESUME SCREENING RESULTS", 1));
        output.push_str(&format!(
            "Generated: {} | Processing time: {}ms\n",
            result.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            result.processing_time_ms
        ));
        output.push_str(&format!(
            "Model: {} ({} dimensions)\n",
            result.embedding_model, result.embedding_dimension
        ));

        output.push_str(&self.format_header(&format!("Ranking ({} resumes)", result.total_resumes), 2));
        for resume in &result.ranked_resumes {
            output.push_str(&self.format_entry(resume));
        }

        if let Some(top) = result.top() {
            output.push_str(&format!(
                "\nTop candidate: {} at {}\n",
                self.colorize(&top.candidate_name, Color::Cyan),
                percentage(top.similarity_score)
            ));
        }

        if let Some(summary) = result.summary() {
            output.push_str(&self.format_header("📈 Score Summary", 2));
            output.push_str(&format_summary_line("Highest", summary.highest));
            output.push_str(&format_summary_line("Average", summary.average));
            output.push_str(&format_summary_line("Lowest", summary.lowest));
        }

        if !result.skipped.is_empty() {
            output.push_str(&self.format_header(&format!("Skipped ({})", result.skipped.len()), 3));
            for skipped in &result.skipped {
                if self.detailed {
                    output.push_str(&format!("  • {}: {}\n", skipped.filename, skipped.reason));
                } else {
                    output.push_str(&format!("  • {}\n", skipped.filename));
                }
            }
        }

        Ok(output)
    }

    fn format_comparison(&self, response: &SimilarityResponse) -> Result<String> {
        let mut output = self.format_header("📈 SIMILARITY", 1);
        output.push_str(&format!(
            "Score: {} ({})\n",
            self.colorize(&percentage(response.similarity_score), relevance_color(response.relevance)),
            response.relevance
        ));
        if self.detailed {
            output.push_str(&format!("Raw cosine similarity: {:.4}\n", response.similarity_score));
        }
        Ok(output)
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render<T: serde::Serialize>(&self, value: &T) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_ranking(&self, result: &RankingResult) -> Result<String> {
        self.render(result)
    }

    fn format_comparison(&self, response: &SimilarityResponse) -> Result<String> {
        self.render(response)
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }

    /// Pipes would break the table
    fn cell(text: &str) -> String {
        text.replace('|', "\\|")
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_ranking(&self, result: &RankingResult) -> Result<String> {
        let mut output = String::from("# Resume Screening Results\n\n");

        if self.include_metadata {
            output.push_str(&format!(
                "**Generated:** {} | **Processing Time:** {}ms\n\n",
                result.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
                result.processing_time_ms
            ));
            output.push_str(&format!(
                "**Model:** `{}` ({} dimensions) | **Resumes ranked:** {}\n\n",
                result.embedding_model, result.embedding_dimension, result.total_resumes
            ));
        }

        output.push_str("| Rank | Candidate | Score | Relevance | File |\n");
        output.push_str("|------|-----------|-------|-----------|------|\n");
        for resume in &result.ranked_resumes {
            output.push_str(&format!(
                "| {} | {} | {} | {} | `{}` |\n",
                resume.rank,
                Self::cell(&resume.candidate_name),
                percentage(resume.similarity_score),
                resume.relevance,
                Self::cell(&resume.filename)
            ));
        }

        if let Some(ScoreSummary { highest, average, lowest }) = result.summary() {
            output.push_str("\n## Score Summary\n\n");
            output.push_str("| Highest | Average | Lowest |\n");
            output.push_str("|---------|---------|--------|\n");
            output.push_str(&format!("| {:.4} | {:.4} | {:.4} |\n", highest, average, lowest));
        }

        if !result.skipped.is_empty() {
            output.push_str("\n## Skipped\n\n");
            for skipped in &result.skipped {
                output.push_str(&format!("- `{}`: {}\n", skipped.filename, skipped.reason));
            }
        }

        Ok(output)
    }

    fn format_comparison(&self, response: &SimilarityResponse) -> Result<String> {
        Ok(format!(
            "# Similarity\n\n**Score:** {} ({})\n",
            percentage(response.similarity_score),
            response.relevance
        ))
    }
}

impl CsvFormatter {
    fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
        let bytes = writer
            .into_inner()
            .map_err(|e| ScreenerError::OutputFormatting(format!("Failed to flush CSV: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| ScreenerError::OutputFormatting(format!("CSV is not UTF-8: {}", e)))
    }
}

fn csv_error(e: csv::Error) -> ScreenerError {
    ScreenerError::OutputFormatting(format!("Failed to write CSV: {}", e))
}

impl OutputFormatter for CsvFormatter {
    fn format_ranking(&self, result: &RankingResult) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(["Rank", "Candidate Name", "Similarity Score", "Match %", "Relevance", "File"])
            .map_err(csv_error)?;

        for resume in &result.ranked_resumes {
            writer
                .write_record([
                    format!("#{}", resume.rank),
                    resume.candidate_name.clone(),
                    format!("{:.4}", resume.similarity_score),
                    percentage(resume.similarity_score),
                    resume.relevance.to_string(),
                    resume.filename.clone(),
                ])
                .map_err(csv_error)?;
        }

        Self::finish(writer)
    }

    fn format_comparison(&self, response: &SimilarityResponse) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(["Similarity Score", "Match %", "Relevance", "Status"])
            .map_err(csv_error)?;
        writer
            .write_record([
                format!("{:.4}", response.similarity_score),
                percentage(response.similarity_score),
                response.relevance.to_string(),
                response.status.clone(),
            ])
            .map_err(csv_error)?;

        Self::finish(writer)
    }
}

impl ReportGenerator {
    pub fn with_options(use_colors: bool, detailed: bool, pretty_json: bool, include_metadata: bool) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors, detailed),
            json_formatter: JsonFormatter::new(pretty_json),
            markdown_formatter: MarkdownFormatter::new(include_metadata),
            csv_formatter: CsvFormatter,
        }
    }

    fn formatter(&self, format: &OutputFormat) -> &dyn OutputFormatter {
        match format {
            OutputFormat::Console => &self.console_formatter,
            OutputFormat::Json => &self.json_formatter,
            OutputFormat::Markdown => &self.markdown_formatter,
            OutputFormat::Csv => &self.csv_formatter,
        }
    }

    pub fn generate_report(&self, result: &RankingResult, format: &OutputFormat) -> Result<String> {
        self.formatter(format).format_ranking(result)
    }

    pub fn generate_comparison(&self, response: &SimilarityResponse, format: &OutputFormat) -> Result<String> {
        self.formatter(format).format_comparison(response)
    }
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    use std::fs;
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            ScreenerError::OutputFormatting(format!("Cannot create {}: {}", parent.display(), e))
        })?;
    }
    fs::write(file_path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::results::SkippedDocument;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn sample_result() -> RankingResult {
        RankingResult {
            total_resumes: 2,
            ranked_resumes: vec![
                RankedResume {
                    rank: 1,
                    candidate_name: "jane_doe".to_string(),
                    similarity_score: 0.8312,
                    filename: "jane_doe.pdf".to_string(),
                    relevance: RelevanceLabel::HighlyRelevant,
                },
                RankedResume {
                    rank: 2,
                    candidate_name: "john|smith".to_string(),
                    similarity_score: 0.41,
                    filename: "john|smith.docx".to_string(),
                    relevance: RelevanceLabel::ModeratelyRelevant,
                },
            ],
            skipped: vec![SkippedDocument {
                filename: "scan.pdf".to_string(),
                reason: "Empty input: no text".to_string(),
            }],
            status: "success".to_string(),
            embedding_model: "potion-base-8M".to_string(),
            embedding_dimension: 256,
            processing_time_ms: 42,
            generated_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_console_plain_output() {
        let output = ConsoleFormatter::new(false, true).format_ranking(&sample_result()).unwrap();

        assert!(output.contains("2024-05-01 12:00:00 UTC"));
        assert!(output.contains("#1"));
        assert!(output.contains("83.12%"));
        assert!(output.contains("Moderately Relevant"));
        assert!(output.contains("Top candidate: jane_doe"));
        assert!(output.contains("scan.pdf: Empty input: no text"));
        assert!(output.contains("Highest  0.8312 (83.12%)"));
        assert!(output.contains("Average  0.6206 (62.06%)"));
        assert!(output.contains("Lowest   0.4100 (41.00%)"));
        assert!(!output.contains("🥇"));
    }

    #[test]
    fn test_console_medals_with_colors() {
        let output = ConsoleFormatter::new(true, false).format_ranking(&sample_result()).unwrap();
        assert!(output.contains("🥇"));
        assert!(output.contains("🥈"));
    }

    #[test]
    fn test_json_output_parses_back() {
        let output = JsonFormatter::new(false).format_ranking(&sample_result()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["total_resumes"], 2);
        assert_eq!(value["ranked_resumes"][0]["candidate_name"], "jane_doe");
        assert_eq!(value["ranked_resumes"][0]["relevance"], "Highly Relevant");
        assert_eq!(value["ranked_resumes"][1]["relevance"], "Moderately Relevant");
        assert_eq!(value["skipped"][0]["filename"], "scan.pdf");
    }

    #[test]
    fn test_markdown_table_escapes_pipes() {
        let output = MarkdownFormatter::new(true).format_ranking(&sample_result()).unwrap();

        assert!(output.contains("| 1 | jane_doe | 83.12% | Highly Relevant | `jane_doe.pdf` |"));
        assert!(output.contains("john\\|smith"));
        assert!(output.contains("## Skipped"));
        assert!(output.contains("| 0.8312 | 0.6206 | 0.4100 |"));
    }

    #[test]
    fn test_csv_ranking_quotes_fields() {
        let output = CsvFormatter.format_ranking(&sample_result()).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[0], "Rank,Candidate Name,Similarity Score,Match %,Relevance,File");
        assert_eq!(lines[1], "#1,jane_doe,0.8312,83.12%,Highly Relevant,jane_doe.pdf");
        assert_eq!(lines[2], "#2,john|smith,0.4100,41.00%,Moderately Relevant,john|smith.docx");
        assert_eq!(lines.len(), 3);

        let mut result = sample_result();
        result.ranked_resumes[0].candidate_name = "Doe, Jane".to_string();
        let output = CsvFormatter.format_ranking(&result).unwrap();
        assert!(output.contains("#1,\"Doe, Jane\",0.8312"));
    }

    #[test]
    fn test_report_generator_comparison() {
        let response = SimilarityResponse {
            similarity_score: 0.6,
            relevance: RelevanceLabel::Relevant,
            status: "success".to_string(),
        };
        let generator = ReportGenerator::with_options(false, false, true, false);

        let markdown = generator.generate_comparison(&response, &OutputFormat::Markdown).unwrap();
        assert!(markdown.contains("60.00% (Relevant)"));

        let json = generator.generate_comparison(&response, &OutputFormat::Json).unwrap();
        assert!(json.contains("\"status\": \"success\""));
        assert!(json.contains("\"relevance\": \"Relevant\""));

        let csv = generator.generate_comparison(&response, &OutputFormat::Csv).unwrap();
        assert_eq!(csv, "Similarity Score,Match %,Relevance,Status\n0.6000,60.00%,Relevant,success\n");
    }

    #[test]
    fn test_save_report_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("reports").join("screening.json");

        save_report_to_file("{}", &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }
}
