//! Aggregate stage: expand every stored summary into one long-form
//! document (research paper or wiki article) with a single LLM call.

use super::{read_required, OverwriteGate, StageOutcome, TopicSource};
use crate::error::ConfigurationError;
use crate::llm::LlmClient;
use crate::models::{AggregateTarget, PromptTemplate};
use crate::storage::{SummaryStore, Workspace};
use anyhow::{Context, Result};
use tracing::{info, warn};

/// Join summaries, already in index order, into the user content of the
/// synthesis request.
pub fn join_summaries(summaries: &[String]) -> String {
    summaries.join("\n")
}

/// Generates one aggregate document from all summary records.
pub struct AggregateStage<'a> {
    llm: &'a dyn LlmClient,
    workspace: &'a Workspace,
    store: &'a SummaryStore,
}

impl<'a> AggregateStage<'a> {
    pub fn new(llm: &'a dyn LlmClient, workspace: &'a Workspace, store: &'a SummaryStore) -> Self {
        Self {
            llm,
            workspace,
            store,
        }
    }

    /// Generate the document described by `target`.
    ///
    /// Callers are expected to check that at least one summary exists.
    pub async fn run(
        &self,
        target: &AggregateTarget,
        gate: &dyn OverwriteGate,
        topics: &dyn TopicSource,
    ) -> Result<StageOutcome> {
        if self.workspace.exists(&target.output)
            && !gate.approve(&format!(
                "Would you like to overwrite your existing {}?",
                target.kind
            ))?
        {
            info!("Existing {} kept; generation skipped", target.kind);
            return Ok(StageOutcome::Skipped);
        }

        let template = PromptTemplate::new(read_required(
            self.workspace,
            &target.template,
            &format!("the {} decomposition prompt", target.kind),
        )?);
        if !template.has_placeholder() {
            warn!(
                "{} has no {{{{ABOUT}}}} placeholder; the topic will not appear in the prompt",
                target.template
            );
        }

        let topic = topics.topic(&target.topic_question)?;
        let system_prompt = template.render(&topic);

        let summaries = self
            .store
            .read_all()
            .context("Failed to read stored summaries")?;
        if summaries.is_empty() {
            return Err(ConfigurationError::new(format!(
                "No summaries available to build a {}.",
                target.kind
            ))
            .with_guidance("Run this program with the '--summarize' flag first.")
            .into());
        }

        info!(
            "Generating {} on '{}' from {} summaries",
            target.kind,
            topic,
            summaries.len()
        );

        let document = self
            .llm
            .complete(&system_prompt, &join_summaries(&summaries))
            .await
            .with_context(|| format!("Failed to generate {}", target.kind))?;

        self.workspace
            .write(&target.output, &document)
            .with_context(|| format!("Failed to save {}", target.output))?;

        Ok(StageOutcome::Generated {
            output: self.workspace.path(&target.output),
            summaries: summaries.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentKind;
    use crate::testing::{EchoLlm, FixedGate, FixedTopic};
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        workspace: Workspace,
        store: SummaryStore,
        target: AggregateTarget,
    }

    fn fixture(template: &str) -> Fixture {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::new(dir.path());
        let store = SummaryStore::new(workspace.clone(), "summary_", ".txt");
        workspace.write("spr_decomp_research.txt", template).unwrap();
        let target = AggregateTarget::new(
            DocumentKind::ResearchPaper,
            "spr_decomp_research.txt",
            "final_research_paper.txt",
        );
        Fixture {
            _dir: dir,
            workspace,
            store,
            target,
        }
    }

    #[test]
    fn test_join_summaries() {
        let summaries = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        assert_eq!(join_summaries(&summaries), "A\nB\nC");
    }

    #[tokio::test]
    async fn test_joins_records_in_index_order() {
        let fx = fixture("Paper on {{ABOUT}}");
        fx.store.write(2, "C").unwrap();
        fx.store.write(0, "A").unwrap();
        fx.store.write(1, "B").unwrap();
        let llm = EchoLlm::new("");
        let stage = AggregateStage::new(&llm, &fx.workspace, &fx.store);

        stage
            .run(&fx.target, &FixedGate::deny(), &FixedTopic::new("bees"))
            .await
            .unwrap();

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "Paper on bees");
        assert_eq!(calls[0].1, "A\nB\nC");
    }

    #[tokio::test]
    async fn test_template_without_placeholder_is_used_as_is() {
        let fx = fixture("Write a paper.");
        fx.store.write(0, "A").unwrap();
        let llm = EchoLlm::new("PAPER:");
        let stage = AggregateStage::new(&llm, &fx.workspace, &fx.store);

        let outcome = stage
            .run(&fx.target, &FixedGate::deny(), &FixedTopic::new("bees"))
            .await
            .unwrap();

        assert_eq!(llm.calls()[0].0, "Write a paper.");
        assert_eq!(
            fx.workspace.read_all("final_research_paper.txt").unwrap(),
            "PAPER:A"
        );
        assert_eq!(
            outcome,
            StageOutcome::Generated {
                output: fx.workspace.path("final_research_paper.txt"),
                summaries: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_declined_overwrite_leaves_output_untouched() {
        let fx = fixture("Paper on {{ABOUT}}");
        fx.store.write(0, "A").unwrap();
        fx.workspace
            .write("final_research_paper.txt", "previous paper\n")
            .unwrap();
        let llm = EchoLlm::new("PAPER:");
        let gate = FixedGate::deny();
        let topics = FixedTopic::new("bees");
        let stage = AggregateStage::new(&llm, &fx.workspace, &fx.store);

        let outcome = stage.run(&fx.target, &gate, &topics).await.unwrap();

        assert_eq!(outcome, StageOutcome::Skipped);
        assert_eq!(gate.asked(), 1);
        assert_eq!(topics.asked(), 0);
        assert!(llm.calls().is_empty());
        assert_eq!(
            std::fs::read(fx.workspace.path("final_research_paper.txt")).unwrap(),
            b"previous paper\n"
        );
    }

    #[tokio::test]
    async fn test_approved_overwrite_replaces_output() {
        let fx = fixture("Paper on {{ABOUT}}");
        fx.store.write(0, "A").unwrap();
        fx.workspace
            .write("final_research_paper.txt", "previous paper")
            .unwrap();
        let llm = EchoLlm::new("PAPER:");
        let stage = AggregateStage::new(&llm, &fx.workspace, &fx.store);

        stage
            .run(&fx.target, &FixedGate::allow(), &FixedTopic::new("bees"))
            .await
            .unwrap();

        assert_eq!(
            fx.workspace.read_all("final_research_paper.txt").unwrap(),
            "PAPER:A"
        );
    }

    #[tokio::test]
    async fn test_missing_template_is_configuration_error() {
        let fx = fixture("unused");
        std::fs::remove_file(fx.workspace.path("spr_decomp_research.txt")).unwrap();
        fx.store.write(0, "A").unwrap();
        let llm = EchoLlm::new("PAPER:");
        let stage = AggregateStage::new(&llm, &fx.workspace, &fx.store);

        let err = stage
            .run(&fx.target, &FixedGate::deny(), &FixedTopic::new("bees"))
            .await
            .unwrap_err();

        assert!(err.downcast_ref::<ConfigurationError>().is_some());
        assert!(llm.calls().is_empty());
    }

    #[tokio::test]
    async fn test_no_summaries_makes_no_llm_call() {
        let fx = fixture("Paper on {{ABOUT}}");
        let llm = EchoLlm::new("PAPER:");
        let stage = AggregateStage::new(&llm, &fx.workspace, &fx.store);

        let err = stage
            .run(&fx.target, &FixedGate::deny(), &FixedTopic::new("bees"))
            .await
            .unwrap_err();

        assert!(err.downcast_ref::<ConfigurationError>().is_some());
        assert!(llm.calls().is_empty());
        assert!(!fx.workspace.exists("final_research_paper.txt"));
    }

    #[tokio::test]
    async fn test_llm_failure_writes_nothing() {
        let fx = fixture("Paper on {{ABOUT}}");
        fx.store.write(0, "A").unwrap();
        let llm = EchoLlm::new("PAPER:").failing_on("A");
        let stage = AggregateStage::new(&llm, &fx.workspace, &fx.store);

        let err = stage
            .run(&fx.target, &FixedGate::deny(), &FixedTopic::new("bees"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Failed to generate research paper"));
        assert!(!fx.workspace.exists("final_research_paper.txt"));
    }
}
