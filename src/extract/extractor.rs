//! Text extraction from PDFs using pdftotext.

use std::path::Path;
use std::process::Command;

use thiserror::Error;
use tracing::debug;

const PDFTOTEXT_HINT: &str = "pdftotext (install poppler-utils)";

/// Handle command output, extracting stdout on success or returning appropriate error.
fn handle_cmd_output(
    result: std::io::Result<std::process::Output>,
    tool_name: &str,
    error_prefix: &str,
) -> Result<String, ExtractionError> {
    match result {
        Ok(output) => {
            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ExtractionError::ExtractionFailed(format!(
                    "{}: {}",
                    error_prefix, stderr
                )))
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractionError::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(ExtractionError::Io(e)),
    }
}

/// Errors that can occur during text extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Text extractor backed by poppler's command line tools.
#[derive(Debug, Default, Clone)]
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the text of every page, concatenated.
    ///
    /// Pages without text contribute nothing; a PDF with no text at all
    /// yields an empty string.
    pub fn extract_pdf(&self, file_path: &Path) -> Result<String, ExtractionError> {
        if !file_path.is_file() {
            return Err(ExtractionError::NotFound(file_path.display().to_string()));
        }

        match self.get_pdf_page_count(file_path) {
            Some(count) => {
                let mut pages = Vec::with_capacity(count as usize);
                for page in 1..=count {
                    pages.push(self.extract_pdf_page_text(file_path, page)?);
                }
                Ok(join_pages(pages))
            }
            None => {
                debug!(
                    "Page count unavailable for {}, extracting whole document",
                    file_path.display()
                );
                let text = self.run_pdftotext(file_path)?;
                Ok(join_pages(text.split('\u{c}').map(str::to_string)))
            }
        }
    }

    /// Run pdftotext on a whole PDF file.
    fn run_pdftotext(&self, file_path: &Path) -> Result<String, ExtractionError> {
        let output = Command::new("pdftotext")
            .args(["-layout", "-enc", "UTF-8"])
            .arg(file_path)
            .arg("-") // Output to stdout
            .output();

        handle_cmd_output(output, PDFTOTEXT_HINT, "pdftotext failed")
    }

    /// Run pdftotext on a single page of a PDF file.
    pub fn extract_pdf_page_text(
        &self,
        file_path: &Path,
        page: u32,
    ) -> Result<String, ExtractionError> {
        let page_str = page.to_string();
        let output = Command::new("pdftotext")
            .args(["-layout", "-enc", "UTF-8", "-f", &page_str, "-l", &page_str])
            .arg(file_path)
            .arg("-") // Output to stdout
            .output();

        handle_cmd_output(
            output,
            PDFTOTEXT_HINT,
            &format!("pdftotext failed on page {}", page),
        )
    }

    /// Get the page count of a PDF.
    pub fn get_pdf_page_count(&self, file_path: &Path) -> Option<u32> {
        let output = Command::new("pdfinfo").arg(file_path).output().ok()?;

        if !output.status.success() {
            return None;
        }

        parse_page_count(&String::from_utf8_lossy(&output.stdout))
    }

    /// Check if required tools are available.
    pub fn check_tools() -> Vec<(String, bool)> {
        ["pdftotext", "pdfinfo"]
            .iter()
            .map(|tool| (tool.to_string(), check_binary(tool)))
            .collect()
    }
}

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn parse_page_count(pdfinfo: &str) -> Option<u32> {
    pdfinfo
        .lines()
        .find(|line| line.starts_with("Pages:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse().ok())
}

/// Concatenate page texts, dropping pages with no text.
fn join_pages<I>(pages: I) -> String
where
    I: IntoIterator<Item = String>,
{
    pages
        .into_iter()
        .map(|p| p.trim_end_matches('\u{c}').to_string())
        .filter(|p| !p.trim().is_empty())
        .collect()
}
