//! Data models for the summarization pipeline.
//!
//! This module contains the URL list, prompt templates, the two
//! aggregate document kinds and the stale-record policy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder in decomposition prompts that is replaced with the topic.
pub const TOPIC_PLACEHOLDER: &str = "{{ABOUT}}";

/// Ordered list of article URLs. Order determines summary numbering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlList {
    urls: Vec<String>,
}

impl UrlList {
    /// Build a list from raw lines, dropping blank lines and surrounding
    /// whitespace. Duplicates are kept.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let urls = lines
            .into_iter()
            .map(|line| line.as_ref().trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();
        Self { urls }
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }
}

/// A system prompt template with an optional `{{ABOUT}}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Returns true if the template contains the topic placeholder.
    pub fn has_placeholder(&self) -> bool {
        self.text.contains(TOPIC_PLACEHOLDER)
    }

    /// Substitute `topic` for every placeholder occurrence.
    ///
    /// A template without a placeholder is returned unchanged.
    pub fn render(&self, topic: &str) -> String {
        self.text.replace(TOPIC_PLACEHOLDER, topic)
    }
}

/// Kind of long-form document produced by the aggregate stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Long-form research paper.
    ResearchPaper,
    /// Wiki-style article.
    Wiki,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::ResearchPaper => write!(f, "research paper"),
            DocumentKind::Wiki => write!(f, "wiki article"),
        }
    }
}

impl DocumentKind {
    /// Capitalized name for the start of a sentence.
    pub fn title(&self) -> &'static str {
        match self {
            DocumentKind::ResearchPaper => "Research paper",
            DocumentKind::Wiki => "Wiki article",
        }
    }

    /// Question shown when asking the user for the document topic.
    pub fn topic_question(&self) -> &'static str {
        match self {
            DocumentKind::ResearchPaper => "What is the research topic? ie. 'climate change', 'deforestation', 'the effect of animal agriculture on climate change'",
            DocumentKind::Wiki => "What is the wiki topic? ie. 'vegan fitness', 'nutrition', 'essential nutrients'",
        }
    }
}

/// Everything that distinguishes one aggregate variant from the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateTarget {
    pub kind: DocumentKind,
    /// Name of the decomposition prompt template file.
    pub template: String,
    /// Name of the output file written with the LLM reply.
    pub output: String,
    /// Question used to request the topic.
    pub topic_question: String,
}

impl AggregateTarget {
    pub fn new(kind: DocumentKind, template: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            kind,
            template: template.into(),
            output: output.into(),
            topic_question: kind.topic_question().to_string(),
        }
    }
}

/// What to do with summary records left over from a previous, longer run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum StalePolicy {
    /// Delete records at indices past the new URL count (default)
    #[default]
    Prune,
    /// Leave them in place; later aggregation will still read them
    Keep,
}

impl fmt::Display for StalePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StalePolicy::Prune => write!(f, "prune"),
            StalePolicy::Keep => write!(f, "keep"),
        }
    }
}
