//! HTTP article fetcher with `scraper`-based text extraction.

use super::ArticleFetcher;
use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::Url;
use scraper::{Html, Node, Selector};
use std::time::Duration;
use tracing::debug;

/// Paragraph selectors tried in order; the first one that yields text wins.
const PARAGRAPH_SELECTORS: [&str; 3] = ["article p", "main p", "p"];

/// Downloads pages over HTTP and extracts their article text.
#[derive(Debug, Clone)]
pub struct HttpArticleFetcher {
    client: reqwest::Client,
}

impl HttpArticleFetcher {
    pub fn new(timeout_seconds: u64) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("sprsynth/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ArticleFetcher for HttpArticleFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let html = response
            .text()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let text = extract_article_text(&html);
        debug!("Extracted {} chars from {}", text.len(), url);

        if text.is_empty() {
            return Err(FetchError::EmptyBody(url.to_string()));
        }

        Ok(text)
    }
}

/// Extract readable text from an HTML document.
///
/// Paragraphs are joined with blank lines. Pages without any paragraph
/// text fall back to all visible text in `<body>`.
pub fn extract_article_text(html: &str) -> String {
    let document = Html::parse_document(html);

    for selector_str in PARAGRAPH_SELECTORS {
        if let Ok(selector) = Selector::parse(selector_str) {
            let paragraphs: Vec<String> = document
                .select(&selector)
                .map(|element| collapse_whitespace(&element.text().collect::<Vec<_>>().join(" ")))
                .filter(|text| !text.is_empty())
                .collect();

            if !paragraphs.is_empty() {
                return paragraphs.join("\n\n");
            }
        }
    }

    body_text(&document)
}

fn body_text(document: &Html) -> String {
    let Ok(selector) = Selector::parse("body") else {
        return String::new();
    };
    let Some(body) = document.select(&selector).next() else {
        return String::new();
    };

    let mut parts = Vec::new();
    for node in body.descendants() {
        if let Node::Text(text) = node.value() {
            let hidden = node
                .parent()
                .and_then(|parent| parent.value().as_element().map(|e| e.name()))
                .is_some_and(|name| matches!(name, "script" | "style" | "noscript"));
            if !hidden {
                parts.push(text.trim().to_string());
            }
        }
    }

    collapse_whitespace(&parts.join(" "))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
