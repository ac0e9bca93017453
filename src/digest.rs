//! Paper digests: extract a downloaded PDF's text and summarize it.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::extract::{ExtractionError, TextExtractor};
use crate::llm::{LlmClient, LlmError};

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("No text could be extracted from {0}")]
    NoText(PathBuf),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Extraction task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A summarized paper, kept around for follow-up questions.
#[derive(Debug, Clone)]
pub struct PaperDigest {
    pub path: PathBuf,
    pub summary: String,
    /// Paper text as sent to the model (truncated).
    pub content: String,
}

pub struct DigestService {
    extractor: TextExtractor,
    llm: LlmClient,
}

impl DigestService {
    pub fn new(extractor: TextExtractor, llm: LlmClient) -> Self {
        Self { extractor, llm }
    }

    /// Extract and summarize the PDF at `path`.
    pub async fn digest(&self, path: &Path) -> Result<PaperDigest, DigestError> {
        let extractor = self.extractor.clone();
        let pdf = path.to_path_buf();
        let text = tokio::task::spawn_blocking(move || extractor.extract_pdf(&pdf)).await??;

        if text.trim().is_empty() {
            return Err(DigestError::NoText(path.to_path_buf()));
        }
        info!("Extracted {} characters from {}", text.len(), path.display());

        let content = self.llm.truncate_content(&text).to_string();
        let summary = self.llm.summarize(&content).await?;

        Ok(PaperDigest {
            path: path.to_path_buf(),
            summary,
            content,
        })
    }

    /// Answer a question about a digested paper.
    pub async fn ask(&self, digest: &PaperDigest, question: &str) -> Result<String, DigestError> {
        Ok(self
            .llm
            .answer(&digest.summary, &digest.content, question)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmConfig;

    fn service(endpoint: &str) -> DigestService {
        let llm = LlmClient::new(
            LlmConfig::default()
                .with_endpoint(endpoint)
                .with_api_key("test-key"),
        )
        .unwrap();
        DigestService::new(TextExtractor::new(), llm)
    }

    #[tokio::test]
    async fn test_missing_pdf_is_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = service("http://127.0.0.1:1")
            .digest(&dir.path().join("gone.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DigestError::Extraction(ExtractionError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_ask_uses_summary_and_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-1.5-pro:generateContent")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::Regex("Summary: short summary".to_string()),
                mockito::Matcher::Regex("Original Content: body text".to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"Yes."}]}}]}"#)
            .create_async()
            .await;

        let digest = PaperDigest {
            path: PathBuf::from("paper.pdf"),
            summary: "short summary".to_string(),
            content: "body text".to_string(),
        };
        let answer = service(&server.url())
            .ask(&digest, "Is it new?")
            .await
            .unwrap();
        assert_eq!(answer, "Yes.");
        mock.assert_async().await;
    }
}
