//! NewsLens - news sentiment and topic reports for a company
//!
//! A CLI tool that fetches recent articles about a company, annotates
//! each with a local LLM served by Ollama, and writes a comparative
//! report with an optional spoken digest.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (invalid arguments, config, article retrieval, write failure)

mod analysis;
mod cli;
mod config;
mod models;
mod news;
mod nlp;
mod report;

use analysis::{Collector, ReportEngine};
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use models::RunMetadata;
use news::{ArticleSource, FileSource, NewsApiSource};
use nlp::{Capabilities, GoogleTts, OllamaClient, SpeechSynthesizer, TranslatedSpeech};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&args, &config);

    info!("NewsLens v{}", env!("CARGO_PKG_VERSION"));
    debug!(
        company = %args.company_name(),
        format = ?args.format,
        articles_file = ?args.articles,
        "Arguments parsed"
    );

    if let Err(e) = run(args, config).await {
        error!("Report failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .newslens.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize the model, news source, and audio digest.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` takes over when set.
fn init_logging(args: &Args, config: &Config) {
    let level = if !args.quiet && config.general.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let builder = FmtSubscriber::builder()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    let result = match std::env::var("RUST_LOG") {
        Ok(filter) if !filter.is_empty() => tracing::subscriber::set_global_default(
            builder
                .with_env_filter(EnvFilter::new(filter))
                .compact()
                .finish(),
        ),
        _ => tracing::subscriber::set_global_default(
            builder.with_max_level(level).compact().finish(),
        ),
    };

    if let Err(e) = result {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load configuration from file or use defaults, then apply CLI overrides.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = if let Some(ref config_path) = args.config {
        Config::load(config_path)?
    } else {
        Config::load_default()?.unwrap_or_default()
    };

    config.merge_with_args(args);
    Ok(config)
}

/// Pick the article source: a local file when given, NewsAPI otherwise.
fn build_source(args: &Args, config: &Config) -> Result<Box<dyn ArticleSource>> {
    if let Some(ref path) = args.articles {
        return Ok(Box::new(FileSource::new(path, config.news.max_articles)));
    }

    let source = NewsApiSource::new(config.news_api_config())
        .context("Article retrieval failed")?;
    Ok(Box::new(source))
}

/// Build the spoken digest pipeline, or `None` when audio is disabled.
fn build_speech(
    config: &Config,
    backend: &Arc<OllamaClient>,
) -> Result<Option<Arc<dyn SpeechSynthesizer>>> {
    if !config.speech.enabled {
        debug!("Audio digest disabled");
        return Ok(None);
    }

    let tts = GoogleTts::new(
        &config.speech.tts_url,
        &config.speech.language,
        config.model.timeout_seconds,
    )
    .context("Failed to initialize text-to-speech client")?;

    let speech: Arc<dyn SpeechSynthesizer> = Arc::new(TranslatedSpeech::new(backend.clone(), tts));
    Ok(Some(speech))
}

/// Write the audio digest. A failed write only loses the audio file;
/// the report is still produced.
fn save_audio(path: &Path, audio: &[u8]) -> Option<String> {
    match std::fs::write(path, audio) {
        Ok(()) => {
            info!(path = %path.display(), bytes = audio.len(), "Audio digest written");
            Some(path.display().to_string())
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to write audio digest");
            None
        }
    }
}

/// Run the complete report workflow.
async fn run(args: Args, config: Config) -> Result<()> {
    let start_time = Instant::now();
    let company = args.company_name().to_string();

    // Step 1: Fetch the articles
    let source = build_source(&args, &config)?;
    println!("📰 Fetching news about {} ({})", company, source.describe());

    let articles = source
        .fetch_articles(&company)
        .await
        .context("Article retrieval failed")?;

    if articles.is_empty() {
        warn!(company = %company, "No articles found");
    }
    println!("   Found {} articles", articles.len());

    // Step 2: Initialize the LLM backend
    println!("🤖 Initializing language model...");
    println!("   Model: {}", config.model.name);
    println!("   Ollama: {}", config.model.ollama_url);

    let backend = Arc::new(
        OllamaClient::new(config.ollama_config()).context("Failed to initialize Ollama client")?,
    );
    let capabilities = Capabilities::from_backend(backend.clone());
    let collector = Collector::new(capabilities, config.annotation_policy())
        .with_concurrency(config.general.concurrency)
        .with_progress(!args.quiet);

    let speech = build_speech(&config, &backend)?;
    let engine = ReportEngine::new(collector, speech);

    // Step 3: Annotate and aggregate
    println!("\n🔬 Analyzing coverage...");
    let output = engine.generate(&company, &articles).await;

    // Step 4: Write the audio digest
    let audio_file = match output.report.audio {
        Some(ref audio) => save_audio(Path::new(&config.speech.audio_output), audio),
        None => {
            if config.speech.enabled {
                warn!("Audio digest unavailable");
            }
            None
        }
    };

    // Step 5: Generate and save the report
    println!("\n📝 Generating report...");

    let duration = start_time.elapsed().as_secs_f64();
    let metadata = RunMetadata {
        generated_at: Utc::now(),
        model_used: backend.model_name().to_string(),
        source: source.describe(),
        articles: output.report.articles.len(),
        degraded_annotations: output.degraded_annotations(),
        duration_seconds: duration,
        audio_file: audio_file.clone(),
    };

    let rendered = match args.format {
        OutputFormat::Json => report::generate_json_report(&output.report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&output.report, &metadata),
    };

    let output_path = PathBuf::from(&config.general.output);
    std::fs::write(&output_path, &rendered)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    // Print summary
    let distribution = &output.report.comparative.sentiment_distribution;
    println!("\n📊 Coverage Summary:");
    println!("   Articles: {}", metadata.articles);
    println!(
        "   - 🟢 Positive: {} | 🔴 Negative: {} | ⚪ Neutral: {}",
        distribution.positive, distribution.negative, distribution.neutral
    );
    if metadata.degraded_annotations > 0 {
        println!(
            "   ⚠️  {} annotations used fallback values",
            metadata.degraded_annotations
        );
    }
    println!("   {}", output.report.final_verdict);
    println!("   Duration: {:.1}s", duration);
    if let Some(ref path) = audio_file {
        println!("\n🔊 Audio digest saved to: {}", path);
    }
    println!(
        "\n✅ Report complete! Saved to: {}",
        output_path.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_audio_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("digest.mp3");

        let saved = save_audio(&path, b"ID3");

        assert_eq!(saved, Some(path.display().to_string()));
        assert_eq!(std::fs::read(&path).unwrap(), b"ID3");
    }

    #[test]
    fn test_save_audio_unwritable_path_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("digest.mp3");

        assert_eq!(save_audio(&path, b"ID3"), None);
        assert!(!path.exists());
    }
}
