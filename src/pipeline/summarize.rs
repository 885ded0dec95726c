//! Summary stage: fetch each URL and store the LLM's SPR for it.

use super::{OverwriteGate, StageOutcome};
use crate::error::ConfigurationError;
use crate::fetch::ArticleFetcher;
use crate::llm::LlmClient;
use crate::models::{StalePolicy, UrlList};
use crate::storage::SummaryStore;
use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::pin::pin;
use tracing::{debug, error, info, warn};

/// Tuning for the summary stage.
#[derive(Debug, Clone)]
pub struct SummarizeOptions {
    /// Maximum URLs in flight at once. Records are still written in order.
    pub concurrency: usize,
    /// What to do with records past the new URL count.
    pub stale_policy: StalePolicy,
    /// Show a progress bar on stderr.
    pub show_progress: bool,
}

impl Default for SummarizeOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            stale_policy: StalePolicy::Prune,
            show_progress: false,
        }
    }
}

/// Fail with guidance when there is nothing to summarize.
pub fn ensure_urls(urls: &UrlList) -> Result<(), ConfigurationError> {
    if urls.is_empty() {
        return Err(ConfigurationError::new("The URL list is empty.")
            .with_guidance("Please include at least 1 url in your URL list, one url per line."));
    }
    Ok(())
}

/// Produces one summary record per URL.
pub struct SummarizeStage<'a> {
    fetcher: &'a dyn ArticleFetcher,
    llm: &'a dyn LlmClient,
    store: &'a SummaryStore,
    options: SummarizeOptions,
}

impl<'a> SummarizeStage<'a> {
    pub fn new(
        fetcher: &'a dyn ArticleFetcher,
        llm: &'a dyn LlmClient,
        store: &'a SummaryStore,
        options: SummarizeOptions,
    ) -> Self {
        Self {
            fetcher,
            llm,
            store,
            options,
        }
    }

    /// Summarize every URL into records `0..urls.len()`.
    ///
    /// The first fetch or LLM failure aborts the stage. Records written
    /// before the failure are kept.
    pub async fn run(
        &self,
        urls: &UrlList,
        system_prompt: &str,
        gate: &dyn OverwriteGate,
    ) -> Result<StageOutcome> {
        ensure_urls(urls)?;

        let overwriting = self.store.exists(0);
        if overwriting && !gate.approve("Would you like to overwrite your existing summaries?")? {
            info!("Existing summaries kept; summary stage skipped");
            return Ok(StageOutcome::Skipped);
        }

        let prune = self.prune_approved(urls.len(), overwriting, gate)?;

        info!(
            "Summarizing {} URL(s) with {} (concurrency {})",
            urls.len(),
            self.llm.model_name(),
            self.options.concurrency
        );

        let progress = self.progress_bar(urls.len());

        let mut results = pin!(stream::iter(urls.iter().enumerate())
            .map(|(index, url)| self.summarize_one(index, url, system_prompt))
            .buffered(self.options.concurrency.max(1)));

        while let Some(result) = results.next().await {
            let (index, summary) = match result {
                Ok(item) => item,
                Err(e) => {
                    progress.abandon();
                    return Err(e);
                }
            };

            self.store
                .write(index, &summary)
                .with_context(|| format!("Failed to save summary #{}", index))?;
            debug!("Saved {}", self.store.record_name(index));
            progress.inc(1);
        }

        progress.finish_and_clear();

        let pruned = self.handle_stale_records(urls.len(), prune)?;

        Ok(StageOutcome::Summarized {
            count: urls.len(),
            pruned,
        })
    }

    async fn summarize_one(
        &self,
        index: usize,
        url: &str,
        system_prompt: &str,
    ) -> Result<(usize, String)> {
        debug!("Fetching article #{}: {}", index, url);

        let article = self.fetcher.fetch(url).await.map_err(|e| {
            error!("Fetch failed for URL #{} ({}): {}", index, url, e);
            e
        });
        let article =
            article.with_context(|| format!("Failed to fetch article #{} ({})", index, url))?;

        let summary = self.llm.complete(system_prompt, &article).await.map_err(|e| {
            error!("Summarization failed for URL #{} ({}): {}", index, url, e);
            e
        });
        let summary = summary.with_context(|| format!("Failed to summarize URL #{} ({})", index, url))?;

        Ok((index, summary))
    }

    /// Decide up front whether leftover records at `count` and above may
    /// be deleted once the run succeeds. Leftovers the overwrite question
    /// did not cover get their own question.
    fn prune_approved(
        &self,
        count: usize,
        overwrite_approved: bool,
        gate: &dyn OverwriteGate,
    ) -> Result<bool> {
        if self.options.stale_policy == StalePolicy::Keep {
            return Ok(false);
        }
        if overwrite_approved {
            return Ok(true);
        }

        let leftover = self
            .store
            .count_from(count)
            .context("Failed to list stored summaries")?;
        if leftover == 0 {
            return Ok(false);
        }

        gate.approve(&format!(
            "Delete {} leftover summaries from a previous run?",
            leftover
        ))
    }

    fn handle_stale_records(&self, count: usize, prune: bool) -> Result<usize> {
        if prune {
            return self
                .store
                .truncate(count)
                .context("Failed to remove stale summaries");
        }

        if self.store.exists(count) {
            warn!(
                "Summaries from a previous run remain at {} and above; they will be included in aggregation",
                self.store.record_name(count)
            );
        }
        Ok(0)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.options.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} summaries")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }
}
