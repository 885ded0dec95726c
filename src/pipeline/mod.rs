//! The three-stage pipeline: fetch, summarize each article, then expand
//! all summaries into one long-form document.
//!
//! Stages checkpoint through the [`SummaryStore`](crate::storage::SummaryStore):
//! the summarize stage writes one record per URL and the aggregate stage
//! reads them back in index order.

pub mod aggregate;
pub mod prompt;
pub mod summarize;

pub use aggregate::AggregateStage;
pub use prompt::{ConsolePrompter, OverwriteGate, TopicSource};
pub use summarize::{ensure_urls, SummarizeOptions, SummarizeStage};

use crate::error::ConfigurationError;
use crate::storage::Workspace;
use anyhow::Result;
use std::path::PathBuf;

/// What a stage did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// Summary records were written at indices `0..count`.
    Summarized { count: usize, pruned: usize },
    /// An aggregate document was written.
    Generated { output: PathBuf, summaries: usize },
    /// The user declined to overwrite existing output. Nothing was written.
    Skipped,
}

/// Read a required input file, turning a missing file into a
/// [`ConfigurationError`] that tells the user what to create.
pub fn read_required(workspace: &Workspace, name: &str, what: &str) -> Result<String> {
    match workspace.read_all(name) {
        Ok(content) => Ok(content),
        Err(e) if e.is_not_found() => Err(ConfigurationError::new(format!(
            "Missing {}: {}",
            what,
            workspace.path(name).display()
        ))
        .with_guidance(format!(
            "Please create a text file called '{}' containing {}.",
            name, what
        ))
        .into()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AggregateTarget, DocumentKind, StalePolicy, UrlList};
    use crate::storage::SummaryStore;
    use crate::testing::{EchoLlm, FixedGate, FixedTopic, ScriptedFetcher};
    use tempfile::TempDir;

    #[test]
    fn test_read_required_missing_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());

        let err = read_required(&ws, "token.txt", "your OpenAI API key").unwrap_err();
        let config_err = err.downcast_ref::<ConfigurationError>().unwrap();
        assert_eq!(
            config_err.guidance,
            vec!["Please create a text file called 'token.txt' containing your OpenAI API key."]
        );
    }

    #[tokio::test]
    async fn test_summarize_then_wiki_end_to_end() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        let store = SummaryStore::new(ws.clone(), "summary_", ".txt");
        ws.write("spr_decomp_wiki.txt", "Write a wiki about {{ABOUT}}.").unwrap();

        let fetcher = ScriptedFetcher::new([("http://a", "TEXT_A"), ("http://b", "TEXT_B")]);
        let summarizer = EchoLlm::new("SUMMARY:");
        let urls = UrlList::from_lines(["http://a", "http://b"]);

        let stage = SummarizeStage::new(
            &fetcher,
            &summarizer,
            &store,
            SummarizeOptions {
                stale_policy: StalePolicy::Keep,
                ..SummarizeOptions::default()
            },
        );
        let outcome = stage
            .run(&urls, "make an SPR", &FixedGate::deny())
            .await
            .unwrap();
        assert_eq!(outcome, StageOutcome::Summarized { count: 2, pruned: 0 });
        assert_eq!(store.read(0).unwrap(), "SUMMARY:TEXT_A");
        assert_eq!(store.read(1).unwrap(), "SUMMARY:TEXT_B");

        let writer = EchoLlm::new("WIKI:");
        let target = AggregateTarget::new(DocumentKind::Wiki, "spr_decomp_wiki.txt", "final_wiki.txt");
        let aggregate = AggregateStage::new(&writer, &ws, &store);
        let outcome = aggregate
            .run(&target, &FixedGate::deny(), &FixedTopic::new("x"))
            .await
            .unwrap();

        assert!(matches!(outcome, StageOutcome::Generated { summaries: 2, .. }));
        assert_eq!(
            ws.read_all("final_wiki.txt").unwrap(),
            "WIKI:SUMMARY:TEXT_A\nSUMMARY:TEXT_B"
        );
        assert_eq!(writer.calls()[0].0, "Write a wiki about x.");
    }
}
