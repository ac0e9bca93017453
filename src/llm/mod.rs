//! LLM client for paper summaries and follow-up questions.
//!
//! Talks to Google Gemini by default, or to a local Ollama server.
//! Requests are not retried; a failed call fails that request only.

mod config;
mod prompts;

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use config::{LlmConfig, LlmProvider};
pub use prompts::{question_prompt, DEFAULT_SUMMARY_PROMPT};

/// Gemini harm categories, all unblocked.
const HARM_CATEGORIES: &[&str] = &[
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// LLM client for paper processing.
pub struct LlmClient {
    config: LlmConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "safetySettings")]
    safety_settings: Vec<GeminiSafetySetting>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiSafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

impl LlmClient {
    /// Create a new LLM client with the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Get the config.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Structured summary of a paper's text.
    pub async fn summarize(&self, text: &str) -> Result<String, LlmError> {
        let prompt = self
            .config
            .get_summary_prompt()
            .replace("{text}", self.truncate_content(text));

        info!("Generating summary with {}", self.config.model());
        self.generate(&prompt).await
    }

    /// Answer a question about a paper from its summary and text.
    pub async fn answer(
        &self,
        summary: &str,
        content: &str,
        question: &str,
    ) -> Result<String, LlmError> {
        let prompt = question_prompt(question, summary, self.truncate_content(content));
        debug!("Answering question: {}", question);
        self.generate(&prompt).await
    }

    /// First `max_content_chars` characters of `text`.
    pub fn truncate_content<'a>(&self, text: &'a str) -> &'a str {
        match text.char_indices().nth(self.config.max_content_chars) {
            Some((idx, _)) => &text[..idx],
            None => text,
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let response = match self.config.provider {
            LlmProvider::Gemini => self.call_gemini(prompt).await?,
            LlmProvider::Ollama => self.call_ollama(prompt).await?,
        };

        let text = response.trim().to_string();
        if text.is_empty() {
            return Err(LlmError::Parse("Empty response".to_string()));
        }
        Ok(text)
    }

    /// Call the Gemini generateContent API.
    async fn call_gemini(&self, prompt: &str) -> Result<String, LlmError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(LlmError::MissingApiKey)?;

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            safety_settings: HARM_CATEGORIES
                .iter()
                .map(|category| GeminiSafetySetting {
                    category,
                    threshold: "BLOCK_NONE",
                })
                .collect(),
            generation_config: GeminiGenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_tokens,
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint(),
            self.config.model()
        );
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }

        let gemini_resp: GeminiResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        if let Some(error) = gemini_resp.error {
            return Err(LlmError::Api(error.message));
        }

        let text: String = gemini_resp
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect()
            })
            .ok_or_else(|| LlmError::Parse("No candidates in response".to_string()))?;

        Ok(text)
    }

    /// Call Ollama API with a prompt.
    async fn call_ollama(&self, prompt: &str) -> Result<String, LlmError> {
        let request = OllamaRequest {
            model: self.config.model().to_string(),
            prompt: prompt.to_string(),
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        };

        let url = format!("{}/api/generate", self.config.endpoint());
        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }

        let ollama_resp: OllamaResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        Ok(ollama_resp.response)
    }
}

/// Errors that can occur during LLM operations.
#[derive(Debug)]
pub enum LlmError {
    /// Failed to connect to LLM service
    Connection(String),
    /// API returned an error
    Api(String),
    /// Failed to parse response
    Parse(String),
    /// No API key configured for a provider that needs one
    MissingApiKey,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmError::Connection(msg) => write!(f, "Connection error: {}", msg),
            LlmError::Api(msg) => write!(f, "API error: {}", msg),
            LlmError::Parse(msg) => write!(f, "Parse error: {}", msg),
            LlmError::MissingApiKey => {
                write!(f, "GEMINI_API_KEY not set. Get an API key from https://ai.google.dev/")
            }
        }
    }
}

impl std::error::Error for LlmError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn gemini_client(endpoint: &str) -> LlmClient {
        LlmClient::new(
            LlmConfig::default()
                .with_endpoint(endpoint)
                .with_api_key("test-key"),
        )
        .unwrap()
    }

    #[test]
    fn test_client_exposes_config() {
        let client = gemini_client("http://127.0.0.1:9000");
        assert_eq!(client.config().model(), "gemini-1.5-pro");
        assert_eq!(client.config().endpoint(), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_truncate_content_counts_characters() {
        let client = LlmClient::new(LlmConfig {
            max_content_chars: 3,
            ..LlmConfig::default()
        })
        .unwrap();
        assert_eq!(client.truncate_content("ñandú!"), "ñan");
        assert_eq!(client.truncate_content("ab"), "ab");
    }

    #[tokio::test]
    async fn test_gemini_summary() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-1.5-pro:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .match_body(mockito::Matcher::Regex("BLOCK_NONE".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"candidates":[{"content":{"parts":[{"text":"1. Title and Authors\n"},{"text":"Attention"}]}}]}"#,
            )
            .create_async()
            .await;

        let summary = gemini_client(&server.url())
            .summarize("paper text")
            .await
            .unwrap();
        assert_eq!(summary, "1. Title and Authors\nAttention");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_gemini_http_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-1.5-pro:generateContent")
            .with_status(403)
            .with_body("forbidden")
            .create_async()
            .await;

        let err = gemini_client(&server.url())
            .answer("s", "c", "q")
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Api(msg) if msg.contains("403")));
    }

    #[tokio::test]
    async fn test_gemini_without_key() {
        let client = LlmClient::new(LlmConfig::default()).unwrap();
        assert!(matches!(
            client.summarize("x").await,
            Err(LlmError::MissingApiKey)
        ));
    }

    #[tokio::test]
    async fn test_ollama_answer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/generate")
            .match_body(mockito::Matcher::Regex("What dataset".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"response":"  ImageNet.  ","done":true}"#)
            .create_async()
            .await;

        let client = LlmClient::new(LlmConfig {
            provider: LlmProvider::Ollama,
            ..LlmConfig::default().with_endpoint(&server.url())
        })
        .unwrap();
        let answer = client
            .answer("summary", "content", "What dataset?")
            .await
            .unwrap();
        assert_eq!(answer, "ImageNet.");
        mock.assert_async().await;
    }
}
