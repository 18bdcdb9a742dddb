//! Spoken digest synthesis.
//!
//! The digest is translated into the target language, split into short
//! chunks and rendered chunk by chunk through the Google Translate TTS
//! endpoint. The MP3 responses are concatenated into one stream.

use crate::nlp::{NlpError, SpeechSynthesizer, Translator};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Longest text the TTS endpoint accepts per request.
const MAX_CHUNK_CHARS: usize = 100;

/// Client for the Google Translate text-to-speech endpoint.
pub struct GoogleTts {
    url: String,
    language: String,
    http_client: reqwest::Client,
}

impl GoogleTts {
    pub fn new(url: &str, language: &str, timeout_seconds: u64) -> Result<Self, NlpError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| NlpError::Request(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            url: url.to_string(),
            language: language.to_string(),
            http_client,
        })
    }

    /// Render already-translated text to MP3 bytes.
    pub async fn render(&self, text: &str) -> Result<Vec<u8>, NlpError> {
        let chunks = split_into_chunks(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(NlpError::InvalidInput("nothing to speak".to_string()));
        }

        let total = chunks.len().to_string();
        let mut audio = Vec::new();

        for (idx, chunk) in chunks.iter().enumerate() {
            debug!(idx, chars = chunk.chars().count(), "Requesting TTS chunk");

            let idx = idx.to_string();
            let textlen = chunk.chars().count().to_string();
            let response = self
                .http_client
                .get(&self.url)
                .query(&[
                    ("ie", "UTF-8"),
                    ("client", "tw-ob"),
                    ("tl", self.language.as_str()),
                    ("q", chunk.as_str()),
                    ("total", total.as_str()),
                    ("idx", idx.as_str()),
                    ("textlen", textlen.as_str()),
                ])
                .send()
                .await
                .map_err(|e| NlpError::Request(e.to_string()))?;

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                return Err(NlpError::Api { status, body });
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| NlpError::Request(e.to_string()))?;
            audio.extend_from_slice(&bytes);
        }

        if audio.is_empty() {
            return Err(NlpError::Empty);
        }
        Ok(audio)
    }
}

/// Translate-then-speak synthesizer for the report digest.
pub struct TranslatedSpeech {
    translator: Arc<dyn Translator>,
    tts: GoogleTts,
}

impl TranslatedSpeech {
    pub fn new(translator: Arc<dyn Translator>, tts: GoogleTts) -> Self {
        Self { translator, tts }
    }
}

#[async_trait]
impl SpeechSynthesizer for TranslatedSpeech {
    async fn synthesize_speech(&self, text: &str) -> Result<Vec<u8>, NlpError> {
        if text.trim().is_empty() {
            return Err(NlpError::InvalidInput("empty digest".to_string()));
        }

        let translated = self.translator.translate(text, &self.tts.language).await?;
        info!(language = %self.tts.language, "Digest translated");

        self.tts.render(&translated).await
    }
}

/// Split text into chunks of at most `max_chars` characters on word
/// boundaries. Words longer than `max_chars` are split mid-word.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_chars: Vec<char> = word.chars().collect();

        if word_chars.len() > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            for piece in word_chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() {
            word_chars.len()
        } else {
            current_len + 1 + word_chars.len()
        };

        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_chars.len();
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            current_len = needed;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingTranslator;

    #[async_trait]
    impl Translator for FailingTranslator {
        async fn translate(&self, _text: &str, _language: &str) -> Result<String, NlpError> {
            Err(NlpError::Connect("translator".to_string()))
        }
    }

    #[test]
    fn test_split_short_text() {
        assert_eq!(split_into_chunks("  hello   world ", 100), vec!["hello world"]);
        assert!(split_into_chunks("   ", 100).is_empty());
    }

    #[test]
    fn test_split_respects_limit() {
        let text = "Analysis of 10 articles gives 6 positive, 3 negative, and 1 neutral sentiments. ".repeat(4);
        let chunks = split_into_chunks(&text, 100);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100);
        }
        assert_eq!(chunks.join(" "), text.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    #[test]
    fn test_split_long_word() {
        let word = "x".repeat(250);
        let chunks = split_into_chunks(&format!("a {} b", word), 100);
        assert_eq!(chunks, vec!["a".to_string(), "x".repeat(100), "x".repeat(100), "x".repeat(50), "b".to_string()]);
    }

    #[test]
    fn test_split_counts_characters_not_bytes() {
        let text = "विश्लेषण ".repeat(20);
        for chunk in split_into_chunks(&text, 100) {
            assert!(chunk.chars().count() <= 100);
        }
    }

    #[tokio::test]
    async fn test_translation_failure_propagates() {
        let tts = GoogleTts::new("http://127.0.0.1:9/translate_tts", "hi", 2).unwrap();
        let speech = TranslatedSpeech::new(Arc::new(FailingTranslator), tts);

        let err = speech.synthesize_speech("Analysis of 2 articles").await.unwrap_err();
        assert!(matches!(err, NlpError::Connect(_)));
    }

    #[tokio::test]
    async fn test_empty_digest_rejected() {
        let tts = GoogleTts::new("http://127.0.0.1:9/translate_tts", "hi", 2).unwrap();
        let speech = TranslatedSpeech::new(Arc::new(FailingTranslator), tts);

        let err = speech.synthesize_speech("  ").await.unwrap_err();
        assert!(matches!(err, NlpError::InvalidInput(_)));
    }
}
