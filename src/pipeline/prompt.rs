//! User decisions the stages need: overwrite approval and the topic for
//! an aggregate document.
//!
//! Stages take these as trait objects so they never touch the terminal
//! directly.

use anyhow::{Context, Result};
use dialoguer::{Confirm, Input};
use tracing::info;

/// Approves or denies overwriting existing outputs.
pub trait OverwriteGate {
    fn approve(&self, question: &str) -> Result<bool>;
}

/// Supplies the topic substituted into a decomposition prompt.
pub trait TopicSource {
    fn topic(&self, question: &str) -> Result<String>;
}

/// Terminal-backed implementation, with optional answers preset from the
/// command line.
#[derive(Debug, Clone, Default)]
pub struct ConsolePrompter {
    /// Approve every overwrite without asking (`--yes`).
    pub assume_yes: bool,
    /// Topic to use instead of asking (`--topic`).
    pub topic: Option<String>,
}

impl ConsolePrompter {
    pub fn new(assume_yes: bool, topic: Option<String>) -> Self {
        Self { assume_yes, topic }
    }
}

impl OverwriteGate for ConsolePrompter {
    fn approve(&self, question: &str) -> Result<bool> {
        if self.assume_yes {
            info!("Overwrite approved by --yes: {}", question);
            return Ok(true);
        }

        Confirm::new()
            .with_prompt(question)
            .default(false)
            .interact()
            .context("Cannot ask for confirmation; pass --yes to approve overwrites")
    }
}

impl TopicSource for ConsolePrompter {
    fn topic(&self, question: &str) -> Result<String> {
        if let Some(ref topic) = self.topic {
            return Ok(topic.clone());
        }

        Input::<String>::new()
            .with_prompt(question)
            .allow_empty(true)
            .interact_text()
            .context("Cannot ask for a topic; pass --topic to set one")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assume_yes_approves_without_terminal() {
        let prompter = ConsolePrompter::new(true, None);
        assert!(prompter.approve("Overwrite?").unwrap());
    }

    #[test]
    fn test_preset_topic() {
        let prompter = ConsolePrompter::new(false, Some("bees".to_string()));
        assert_eq!(prompter.topic("Topic?").unwrap(), "bees");
    }

    #[test]
    fn test_preset_empty_topic_is_kept() {
        let prompter = ConsolePrompter::new(false, Some(String::new()));
        assert_eq!(prompter.topic("Topic?").unwrap(), "");
    }
}
