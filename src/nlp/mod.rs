//! NLP capabilities consumed by the report engine.
//!
//! Each capability is an injected trait object, so the engine never
//! depends on a concrete model. The Ollama backend implements the text
//! capabilities; the speech module renders the spoken digest.

pub mod ollama;
pub mod speech;

pub use ollama::{OllamaClient, OllamaConfig};
pub use speech::{GoogleTts, TranslatedSpeech};

use crate::models::Sentiment;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Failure of a single capability call.
#[derive(Debug, Error)]
pub enum NlpError {
    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("cannot connect to {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("unparseable model output: {0}")]
    Parse(String),

    #[error("model returned an empty response")]
    Empty,

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl NlpError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            NlpError::Timeout(_) | NlpError::Connect(_) | NlpError::Request(_) => true,
            NlpError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Abstractive summarization of article content.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String, NlpError>;
}

/// Three-way sentiment classification with a confidence score.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Sentiment, NlpError>;
}

/// Ordered topic keyphrases for a text.
#[async_trait]
pub trait KeyphraseExtractor: Send + Sync {
    async fn extract_topics(&self, text: &str) -> Result<Vec<String>, NlpError>;
}

/// Translation of short texts into a target language.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, language: &str) -> Result<String, NlpError>;
}

/// Renders a digest string to audio bytes.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize_speech(&self, text: &str) -> Result<Vec<u8>, NlpError>;
}

/// The three annotation capabilities, injected into the collector.
#[derive(Clone)]
pub struct Capabilities {
    pub summarizer: Arc<dyn Summarizer>,
    pub classifier: Arc<dyn SentimentClassifier>,
    pub extractor: Arc<dyn KeyphraseExtractor>,
}

impl Capabilities {
    /// Uses one backend for all three capabilities.
    pub fn from_backend<T>(backend: Arc<T>) -> Self
    where
        T: Summarizer + SentimentClassifier + KeyphraseExtractor + 'static,
    {
        Self {
            summarizer: backend.clone(),
            classifier: backend.clone(),
            extractor: backend,
        }
    }
}
