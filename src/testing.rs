//! In-memory doubles for the fetcher, LLM client and user prompts.

use crate::error::{FetchError, LlmError};
use crate::fetch::ArticleFetcher;
use crate::llm::LlmClient;
use crate::pipeline::{OverwriteGate, TopicSource};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Returns canned article text per URL. Unknown URLs fail with an HTTP 404.
#[derive(Default)]
pub struct ScriptedFetcher {
    articles: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    requested: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new<I>(articles: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, &'static str)>,
    {
        Self {
            articles: articles
                .into_iter()
                .map(|(url, text)| (url.to_string(), text.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    /// URLs fetched so far, in request order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArticleFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());

        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }

        self.articles.get(url).cloned().ok_or(FetchError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}

/// Replies with `prefix + user_content` and records every call.
pub struct EchoLlm {
    prefix: String,
    fail_when_contains: Option<String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl EchoLlm {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            fail_when_contains: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail any request whose user content contains `needle`.
    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_when_contains = Some(needle.to_string());
        self
    }

    /// `(system_prompt, user_content)` pairs of successful calls.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for EchoLlm {
    async fn complete(&self, system_prompt: &str, user_content: &str) -> Result<String, LlmError> {
        if let Some(ref needle) = self.fail_when_contains {
            if user_content.contains(needle.as_str()) {
                return Err(LlmError::Api {
                    status: 500,
                    body: "scripted failure".to_string(),
                });
            }
        }

        self.calls
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), user_content.to_string()));
        Ok(format!("{}{}", self.prefix, user_content))
    }

    fn model_name(&self) -> &str {
        "echo"
    }
}

/// Always gives the same overwrite answer.
pub struct FixedGate {
    answer: bool,
    asked: AtomicUsize,
}

impl FixedGate {
    pub fn allow() -> Self {
        Self {
            answer: true,
            asked: AtomicUsize::new(0),
        }
    }

    pub fn deny() -> Self {
        Self {
            answer: false,
            asked: AtomicUsize::new(0),
        }
    }

    pub fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

impl OverwriteGate for FixedGate {
    fn approve(&self, _question: &str) -> Result<bool> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        Ok(self.answer)
    }
}

/// Always answers with the same topic.
pub struct FixedTopic {
    topic: String,
    asked: AtomicUsize,
}

impl FixedTopic {
    pub fn new(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            asked: AtomicUsize::new(0),
        }
    }

    pub fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

impl TopicSource for FixedTopic {
    fn topic(&self, _question: &str) -> Result<String> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        Ok(self.topic.clone())
    }
}
