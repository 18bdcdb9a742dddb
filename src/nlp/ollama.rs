//! Ollama-backed text capabilities.
//!
//! One chat client serves summarization, sentiment classification,
//! keyphrase extraction and translation, each with its own system prompt.
//! Transient failures are retried with exponential backoff and jitter.

use crate::models::{Sentiment, SentimentLabel};
use crate::nlp::{KeyphraseExtractor, NlpError, SentimentClassifier, Summarizer, Translator};
use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the Ollama client.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub ollama_url: String,
    pub model_name: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
    /// Retries after the first attempt for transient failures.
    pub retries: usize,
    /// Number of keyphrases requested per article.
    pub max_topics: usize,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            model_name: "llama3.2:latest".to_string(),
            temperature: 0.1,
            timeout_seconds: 120,
            retries: 3,
            max_topics: 3,
        }
    }
}

/// Message in a chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

/// Sentiment verdict as the model is asked to emit it.
#[derive(Debug, Deserialize)]
struct SentimentReply {
    label: String,
    #[serde(default)]
    score: f64,
}

const BASE_RETRY_DELAY: Duration = Duration::from_millis(500);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Chat client for a local or remote Ollama server.
pub struct OllamaClient {
    config: OllamaConfig,
    http_client: reqwest::Client,
}

impl OllamaClient {
    /// Create a client; fails only if the HTTP client cannot be built.
    pub fn new(config: OllamaConfig) -> Result<Self, NlpError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| NlpError::Request(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.config.model_name
    }

    /// Send a system + user prompt, retrying transient failures.
    async fn chat(&self, system: &str, prompt: &str) -> Result<String, NlpError> {
        let mut attempt = 0usize;

        loop {
            match self.chat_once(system, prompt).await {
                Ok(content) => return Ok(content),
                Err(e) if e.is_transient() && attempt < self.config.retries => {
                    attempt += 1;
                    let delay = backoff_delay(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Ollama request failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn chat_once(&self, system: &str, prompt: &str) -> Result<String, NlpError> {
        let url = format!("{}/api/chat", self.config.ollama_url.trim_end_matches('/'));

        let request = OllamaChatRequest {
            model: self.config.model_name.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(prompt)],
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
            },
        };

        debug!(model = %self.config.model_name, "Sending chat request");

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NlpError::Timeout(self.config.timeout_seconds)
                } else if e.is_connect() {
                    NlpError::Connect(self.config.ollama_url.clone())
                } else {
                    NlpError::Request(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(NlpError::Api { status, body });
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| NlpError::Parse(format!("failed to parse Ollama response: {}", e)))?;

        let content = chat_response.message.content.trim().to_string();
        if content.is_empty() {
            return Err(NlpError::Empty);
        }
        Ok(content)
    }
}

/// Exponential backoff capped at `MAX_RETRY_DELAY`, plus up to 250ms jitter.
fn backoff_delay(attempt: usize) -> Duration {
    let exp = BASE_RETRY_DELAY.saturating_mul(1u32 << (attempt.saturating_sub(1)).min(16));
    let jitter = Duration::from_millis(rand::rng().random_range(0..250));
    exp.min(MAX_RETRY_DELAY) + jitter
}

#[async_trait]
impl Summarizer for OllamaClient {
    async fn summarize(&self, text: &str) -> Result<String, NlpError> {
        self.chat(SUMMARY_SYSTEM_PROMPT, text).await
    }
}

#[async_trait]
impl SentimentClassifier for OllamaClient {
    async fn classify(&self, text: &str) -> Result<Sentiment, NlpError> {
        let response = self.chat(SENTIMENT_SYSTEM_PROMPT, text).await?;
        parse_sentiment(&response)
    }
}

#[async_trait]
impl KeyphraseExtractor for OllamaClient {
    async fn extract_topics(&self, text: &str) -> Result<Vec<String>, NlpError> {
        let system = format!(
            "{}\nReturn at most {} keyphrases.",
            KEYPHRASE_SYSTEM_PROMPT, self.config.max_topics
        );
        let response = self.chat(&system, text).await?;
        Ok(parse_keyphrases(&response))
    }
}

#[async_trait]
impl Translator for OllamaClient {
    async fn translate(&self, text: &str, language: &str) -> Result<String, NlpError> {
        let system = format!(
            "{} Target language (ISO 639-1 code): {}.",
            TRANSLATION_SYSTEM_PROMPT, language
        );
        self.chat(&system, text).await
    }
}

/// Parse `{"label": ..., "score": ...}` from a model reply.
pub fn parse_sentiment(response: &str) -> Result<Sentiment, NlpError> {
    let json = extract_delimited(response, '{', '}')
        .ok_or_else(|| NlpError::Parse(format!("no JSON object in: {}", response)))?;

    let reply: SentimentReply =
        serde_json::from_str(json).map_err(|e| NlpError::Parse(e.to_string()))?;

    Ok(Sentiment::new(SentimentLabel::from(reply.label.as_str()), reply.score))
}

/// Parse keyphrases from a JSON array reply, falling back to one per line.
pub fn parse_keyphrases(response: &str) -> Vec<String> {
    if let Some(json) = extract_delimited(response, '[', ']') {
        if let Ok(phrases) = serde_json::from_str::<Vec<String>>(json) {
            return phrases;
        }
    }

    response
        .lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| c.is_ascii_digit() || matches!(c, '-' | '*' | '.' | ')'))
                .trim()
                .trim_matches('"')
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .collect()
}

/// Slice from the first `open` to the last `close`, inclusive.
fn extract_delimited(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

const SUMMARY_SYSTEM_PROMPT: &str = r#"You are a news editor.
Summarize the article text you are given in one or two plain sentences of 25 to 50 words.
Output only the summary, no preamble."#;

const SENTIMENT_SYSTEM_PROMPT: &str = r#"You are a financial news sentiment classifier.
Classify the overall sentiment of the text as Positive, Negative or Neutral.
Respond with exactly one JSON object: {"label": "Positive|Negative|Neutral", "score": <confidence between 0 and 1>}.
Only output JSON."#;

const KEYPHRASE_SYSTEM_PROMPT: &str = r#"You extract topic keyphrases from news text.
Each keyphrase is one or two lowercase words, most important first, no stop words.
Respond with a JSON array of strings only."#;

const TRANSLATION_SYSTEM_PROMPT: &str =
    "Translate the user's text. Output only the translation, without quotes or notes.";
