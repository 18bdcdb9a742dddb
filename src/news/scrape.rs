//! Full-text re-fetch of article pages.
//!
//! Provider content is often truncated, so the page itself is fetched and
//! its visible text extracted. Pages rendered by client-side scripts yield
//! almost no text; for those the provider content is kept.

use scraper::{Html, Node, Selector};
use std::time::Duration;
use tracing::debug;

/// Below this many characters a page may be script-rendered.
const MIN_PAGE_CHARS: usize = 200;
/// Pages with fewer paragraphs than this (and little text) are script-rendered.
const MIN_PARAGRAPHS: usize = 2;

/// Visible text of a page and how many paragraphs it has.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub text: String,
    pub paragraph_count: usize,
}

impl PageText {
    /// Heuristic for pages whose content is produced by JavaScript.
    pub fn looks_script_rendered(&self) -> bool {
        self.text.chars().count() < MIN_PAGE_CHARS && self.paragraph_count < MIN_PARAGRAPHS
    }
}

/// Extract the visible text of an HTML document, truncated to `max_chars`.
pub fn extract_page_text(html: &str, max_chars: usize) -> PageText {
    let document = Html::parse_document(html);

    let mut pieces: Vec<&str> = Vec::new();
    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|e| matches!(e.name(), "script" | "style" | "noscript" | "template"))
        });
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            pieces.push(trimmed);
        }
    }

    let text: String = pieces.join(" ").chars().take(max_chars).collect();

    let paragraph_count = Selector::parse("p")
        .map(|selector| document.select(&selector).count())
        .unwrap_or(0);

    PageText {
        text,
        paragraph_count,
    }
}

/// Fetch a page and extract its text.
pub async fn fetch_page_text(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
    max_chars: usize,
) -> Result<PageText, reqwest::Error> {
    let html = client
        .get(url)
        .timeout(timeout)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let page = extract_page_text(&html, max_chars);
    debug!(
        %url,
        chars = page.text.chars().count(),
        paragraphs = page.paragraph_count,
        "Extracted page text"
    );
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_visible_text() {
        let html = r#"<html><head><title>Deal</title><style>p { color: red; }</style></head>
            <body><script>var x = "hidden";</script>
            <p>Acme agreed to buy Widgets Inc.</p>
            <p>  Shares rose 4%.  </p></body></html>"#;

        let page = extract_page_text(html, 1000);

        assert_eq!(page.paragraph_count, 2);
        assert!(page.text.contains("Acme agreed to buy Widgets Inc."));
        assert!(page.text.contains("Shares rose 4%."));
        assert!(!page.text.contains("hidden"));
        assert!(!page.text.contains("color"));
    }

    #[test]
    fn test_truncates_to_max_chars() {
        let html = format!("<html><body><p>{}</p></body></html>", "word ".repeat(500));
        let page = extract_page_text(&html, 1000);
        assert_eq!(page.text.chars().count(), 1000);
    }

    #[test]
    fn test_script_rendered_heuristic() {
        let shell = extract_page_text(
            r#"<html><body><div id="root"></div><script>render()</script><p>Loading</p></body></html>"#,
            1000,
        );
        assert!(shell.looks_script_rendered());

        let short_but_structured = PageText {
            text: "Short.".to_string(),
            paragraph_count: 3,
        };
        assert!(!short_but_structured.looks_script_rendered());

        let long_text = PageText {
            text: "a".repeat(250),
            paragraph_count: 0,
        };
        assert!(!long_text.looks_script_rendered());
    }
}
