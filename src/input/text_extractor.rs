//! Text extraction from various file formats

use crate::error::{Result, ScreenerError};
use crate::processing::document::{Document, DocumentFormat};
use pulldown_cmark::{Event, Parser, Tag};
use quick_xml::events::Event as XmlEvent;
use quick_xml::Reader;
use std::io::{Cursor, Read};

pub trait TextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String>;
}

pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
            ScreenerError::DocumentExtraction(format!("Failed to extract text from PDF: {}", e))
        })
    }
}

/// Reads `word/document.xml` out of the DOCX archive. Body paragraphs come
/// first, one per line, followed by the text of every table cell.
pub struct DocxExtractor;

impl TextExtractor for DocxExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
            ScreenerError::DocumentExtraction(format!("Not a valid DOCX archive: {}", e))
        })?;

        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .map_err(|e| ScreenerError::DocumentExtraction(format!("DOCX has no document body: {}", e)))?
            .read_to_string(&mut xml)?;

        Self::document_text(&xml)
    }
}

impl DocxExtractor {
    fn document_text(xml: &str) -> Result<String> {
        let mut reader = Reader::from_str(xml);

        let mut paragraphs = String::new();
        let mut cells = String::new();
        let mut current = String::new();
        let mut table_depth = 0usize;
        let mut in_text_run = false;

        loop {
            match reader.read_event() {
                Ok(XmlEvent::Start(e)) => match e.name().as_ref() {
                    b"w:tbl" => table_depth += 1,
                    b"w:t" => in_text_run = true,
                    _ => {}
                },
                Ok(XmlEvent::End(e)) => match e.name().as_ref() {
                    b"w:tbl" => table_depth = table_depth.saturating_sub(1),
                    b"w:t" => in_text_run = false,
                    b"w:p" if table_depth == 0 => {
                        paragraphs.push_str(&current);
                        paragraphs.push('\n');
                        current.clear();
                    }
                    b"w:p" => current.push('\n'),
                    b"w:tc" => {
                        cells.push_str(current.trim_end());
                        cells.push(' ');
                        current.clear();
                    }
                    _ => {}
                },
                Ok(XmlEvent::Empty(e)) => match e.name().as_ref() {
                    b"w:tab" => current.push('\t'),
                    b"w:br" | b"w:cr" => current.push('\n'),
                    _ => {}
                },
                Ok(XmlEvent::Text(t)) if in_text_run => {
                    let text = t.unescape().map_err(|e| {
                        ScreenerError::DocumentExtraction(format!("Malformed DOCX text: {}", e))
                    })?;
                    current.push_str(&text);
                }
                Ok(XmlEvent::Eof) => break,
                Err(e) => {
                    return Err(ScreenerError::DocumentExtraction(format!(
                        "Malformed DOCX XML at position {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
                _ => {}
            }
        }

        paragraphs.push_str(&current);
        paragraphs.push_str(&cells);
        Ok(paragraphs)
    }
}

pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        let text = String::from_utf8_lossy(bytes);
        Ok(text.trim_start_matches('\u{feff}').to_string())
    }
}

pub struct MarkdownExtractor;

impl TextExtractor for MarkdownExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        let markdown_content = PlainTextExtractor.extract(bytes)?;
        let mut text = String::new();

        for event in Parser::new(&markdown_content) {
            match event {
                Event::Text(t) | Event::Code(t) => text.push_str(&t),
                Event::SoftBreak | Event::HardBreak | Event::Rule => text.push('\n'),
                Event::End(Tag::Paragraph | Tag::Heading(..) | Tag::Item | Tag::CodeBlock(_)) => {
                    text.push('\n')
                }
                Event::End(Tag::TableCell) => text.push(' '),
                _ => {}
            }
        }

        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        Ok(lines.join("\n"))
    }
}

/// Route a document to the extractor for its declared format
pub fn extract_document(document: &Document) -> Result<String> {
    match document.format {
        DocumentFormat::Pdf => PdfExtractor.extract(&document.bytes),
        DocumentFormat::Docx => DocxExtractor.extract(&document.bytes),
        DocumentFormat::PlainText => PlainTextExtractor.extract(&document.bytes),
        DocumentFormat::Markdown => MarkdownExtractor.extract(&document.bytes),
    }
}

/// Extraction is CPU-bound; run it off the async executor
pub async fn extract_in_background(document: Document) -> Result<String> {
    tokio::task::spawn_blocking(move || extract_document(&document))
        .await
        .map_err(|e| ScreenerError::DocumentExtraction(format!("Extraction task failed: {}", e)))?
}
