//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.newslens.toml` files.

use crate::analysis::AnnotationPolicy;
use crate::models::MAX_TOPICS;
use crate::news::NewsApiConfig;
use crate::nlp::OllamaConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".newslens.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// News retrieval settings.
    #[serde(default)]
    pub news: NewsConfig,

    /// Annotation thresholds.
    #[serde(default)]
    pub annotation: AnnotationConfig,

    /// Audio digest settings.
    #[serde(default)]
    pub speech: SpeechConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Number of articles annotated concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
            concurrency: default_concurrency(),
        }
    }
}

fn default_output() -> String {
    "newslens_report.md".to_string()
}

fn default_concurrency() -> usize {
    4
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Default model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Ollama API URL.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Number of retries on transient failure.
    #[serde(default = "default_retries")]
    pub retries: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            ollama_url: default_ollama_url(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout(),
            retries: default_retries(),
        }
    }
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_timeout() -> u64 {
    120
}

fn default_retries() -> usize {
    3
}

/// News retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    /// NewsAPI key. Usually supplied through `NEWS_API_KEY` instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Search endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Maximum articles per report.
    #[serde(default = "default_max_articles")]
    pub max_articles: usize,

    /// Provider sort order.
    #[serde(default = "default_sort_by")]
    pub sort_by: String,

    /// Only consider articles from the last N days.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookback_days: Option<i64>,

    /// Re-fetch each article page for fuller text.
    #[serde(default = "default_true")]
    pub scrape_pages: bool,

    /// Timeout per page re-fetch.
    #[serde(default = "default_scrape_timeout")]
    pub scrape_timeout_seconds: u64,

    /// Characters kept from a re-fetched page.
    #[serde(default = "default_max_page_chars")]
    pub max_page_chars: usize,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_endpoint(),
            max_articles: default_max_articles(),
            sort_by: default_sort_by(),
            lookback_days: None,
            scrape_pages: true,
            scrape_timeout_seconds: default_scrape_timeout(),
            max_page_chars: default_max_page_chars(),
        }
    }
}

fn default_endpoint() -> String {
    "https://newsapi.org/v2/everything".to_string()
}

fn default_max_articles() -> usize {
    10
}

fn default_sort_by() -> String {
    "publishedAt".to_string()
}

fn default_scrape_timeout() -> u64 {
    10
}

fn default_max_page_chars() -> usize {
    1000
}

/// Annotation thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationConfig {
    /// Shorter content gets placeholder annotations.
    #[serde(default = "default_min_content_chars")]
    pub min_content_chars: usize,

    /// Topics kept per article.
    #[serde(default = "default_max_topics")]
    pub max_topics: usize,

    /// Content prefix used as summary when summarization fails.
    #[serde(default = "default_fallback_summary_chars")]
    pub fallback_summary_chars: usize,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            min_content_chars: default_min_content_chars(),
            max_topics: default_max_topics(),
            fallback_summary_chars: default_fallback_summary_chars(),
        }
    }
}

fn default_min_content_chars() -> usize {
    50
}

fn default_max_topics() -> usize {
    3
}

fn default_fallback_summary_chars() -> usize {
    50
}

/// Audio digest settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Generate the audio digest.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Target language of the digest (ISO 639-1).
    #[serde(default = "default_language")]
    pub language: String,

    /// Where the MP3 digest is written.
    #[serde(default = "default_audio_output")]
    pub audio_output: String,

    /// Text-to-speech endpoint.
    #[serde(default = "default_tts_url")]
    pub tts_url: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            language: default_language(),
            audio_output: default_audio_output(),
            tts_url: default_tts_url(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "hi".to_string()
}

fn default_audio_output() -> String {
    "newslens_digest.mp3".to_string()
}

fn default_tts_url() -> String {
    "https://translate.google.com/translate_tts".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref url) = args.ollama_url {
            self.model.ollama_url = url.clone();
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = temperature;
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }

        if let Some(ref api_key) = args.api_key {
            self.news.api_key = Some(api_key.clone());
        }
        if let Some(max_articles) = args.max_articles {
            self.news.max_articles = max_articles;
        }
        if args.no_scrape {
            self.news.scrape_pages = false;
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(concurrency) = args.concurrency {
            self.general.concurrency = concurrency;
        }
        if args.verbose {
            self.general.verbose = true;
        }

        if args.no_audio {
            self.speech.enabled = false;
        }
        if let Some(ref language) = args.language {
            self.speech.language = language.clone();
        }
        if let Some(ref audio_output) = args.audio_output {
            self.speech.audio_output = audio_output.display().to_string();
        }
    }

    /// Topics per article, held within `1..=MAX_TOPICS`.
    pub fn topic_limit(&self) -> usize {
        self.annotation.max_topics.clamp(1, MAX_TOPICS)
    }

    /// Settings for the Ollama client.
    pub fn ollama_config(&self) -> OllamaConfig {
        OllamaConfig {
            ollama_url: self.model.ollama_url.clone(),
            model_name: self.model.name.clone(),
            temperature: self.model.temperature,
            timeout_seconds: self.model.timeout_seconds,
            retries: self.model.retries,
            max_topics: self.topic_limit(),
        }
    }

    /// Settings for the NewsAPI source.
    pub fn news_api_config(&self) -> NewsApiConfig {
        NewsApiConfig {
            endpoint: self.news.endpoint.clone(),
            api_key: self.news.api_key.clone(),
            max_articles: self.news.max_articles,
            sort_by: self.news.sort_by.clone(),
            lookback_days: self.news.lookback_days,
            scrape_pages: self.news.scrape_pages,
            scrape_timeout_seconds: self.news.scrape_timeout_seconds,
            max_page_chars: self.news.max_page_chars,
            timeout_seconds: self.model.timeout_seconds.min(60),
        }
    }

    /// Thresholds for the annotation collector.
    pub fn annotation_policy(&self) -> AnnotationPolicy {
        AnnotationPolicy {
            min_content_chars: self.annotation.min_content_chars,
            max_topics: self.topic_limit(),
            fallback_summary_chars: self.annotation.fallback_summary_chars,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
