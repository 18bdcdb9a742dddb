//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// NewsLens - sentiment and topic report for a company's news coverage
///
/// Fetches recent articles about a company, annotates each one with a
/// summary, a sentiment and key topics using a local LLM, and compares
/// the coverage across articles. Markdown/JSON reports with an optional
/// spoken digest.
///
/// Examples:
///   newslens Tesla
///   newslens "Acme Corp" --model qwen2.5:7b --format json
///   newslens Acme --articles fixtures/articles.json --no-audio
///   newslens --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Company to report on
    #[arg(value_name = "COMPANY", required_unless_present = "init_config")]
    pub company: Option<String>,

    /// Ollama model used for summaries, sentiment and topics
    ///
    /// Can also be set via NEWSLENS_MODEL env var or .newslens.toml config.
    #[arg(short, long, env = "NEWSLENS_MODEL")]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .newslens.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Read articles from a JSON file instead of querying NewsAPI
    ///
    /// The file holds an array of {"title", "content"} objects.
    #[arg(long, value_name = "FILE")]
    pub articles: Option<PathBuf>,

    /// NewsAPI key
    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Maximum number of articles to analyze (1 - 100)
    #[arg(long, value_name = "COUNT")]
    pub max_articles: Option<usize>,

    /// Number of articles annotated concurrently
    #[arg(long, value_name = "NUM")]
    pub concurrency: Option<usize>,

    /// Temperature for LLM responses (0.0 - 1.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Request timeout in seconds for each LLM call
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Use the article text returned by the provider without re-fetching pages
    #[arg(long)]
    pub no_scrape: bool,

    /// Skip the spoken digest
    #[arg(long)]
    pub no_audio: bool,

    /// Where to write the MP3 digest
    #[arg(long, value_name = "FILE")]
    pub audio_output: Option<PathBuf>,

    /// Language of the spoken digest (ISO 639-1, e.g. hi, en, fr)
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// Generate a default .newslens.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The company name, trimmed. Empty if unset (validate first).
    pub fn company_name(&self) -> &str {
        self.company.as_deref().map(str::trim).unwrap_or("")
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.company_name().is_empty() {
            return Err("Company name must not be empty".to_string());
        }

        if let Some(ref url) = self.ollama_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 1.0".to_string());
            }
        }

        if self.concurrency == Some(0) {
            return Err("Concurrency must be at least 1".to_string());
        }

        if let Some(max_articles) = self.max_articles {
            if !(1..=100).contains(&max_articles) {
                return Err("Max articles must be between 1 and 100".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if let Some(ref path) = self.articles {
            if !path.is_file() {
                return Err(format!("Articles file does not exist: {}", path.display()));
            }
        }

        if let Some(ref language) = self.language {
            if language.trim().is_empty() {
                return Err("Language must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            company: Some("Acme".to_string()),
            model: None,
            ollama_url: None,
            output: None,
            format: OutputFormat::Markdown,
            config: None,
            verbose: false,
            quiet: false,
            articles: None,
            api_key: None,
            max_articles: None,
            concurrency: None,
            temperature: None,
            timeout: None,
            no_scrape: false,
            no_audio: false,
            audio_output: None,
            language: None,
            init_config: false,
        }
    }

    #[test]
    fn test_valid_args() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_blank_company() {
        let mut args = make_args();
        args.company = Some("   ".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_init_config_skips_validation() {
        let mut args = make_args();
        args.company = None;
        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.ollama_url = Some("localhost:11434".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_ranges() {
        let mut args = make_args();
        args.temperature = Some(1.5);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.concurrency = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.max_articles = Some(101);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.max_articles = Some(100);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_missing_articles_file() {
        let mut args = make_args();
        args.articles = Some(PathBuf::from("does/not/exist.json"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_parse_positional_company() {
        let args = Args::parse_from(["newslens", "Acme Corp", "--format", "json", "--no-audio"]);
        assert_eq!(args.company_name(), "Acme Corp");
        assert_eq!(args.format, OutputFormat::Json);
        assert!(args.no_audio);
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
