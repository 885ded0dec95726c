//! Configuration file handling.
//!
//! This module handles loading `.sprsynth.toml` and merging it with
//! command-line arguments. Every field has a default, so the file is
//! optional and may be partial.

use crate::error::ConfigurationError;
use crate::models::{AggregateTarget, DocumentKind, StalePolicy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".sprsynth.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Input and output file names.
    #[serde(default)]
    pub files: FilesConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory all file names are resolved against.
    #[serde(default = "default_workdir")]
    pub workdir: PathBuf,

    /// URLs summarized at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Records left over from a previous longer run.
    #[serde(default)]
    pub stale_records: StalePolicy,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            workdir: default_workdir(),
            concurrency: default_concurrency(),
            stale_records: StalePolicy::default(),
        }
    }
}

fn default_workdir() -> PathBuf {
    PathBuf::from(".")
}

fn default_concurrency() -> usize {
    1
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Chat model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Sampling temperature. Unset leaves it to the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Request timeout in seconds, for both article downloads and LLM calls.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// File containing the API key.
    #[serde(default = "default_token_file")]
    pub token_file: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            api_base: default_api_base(),
            temperature: None,
            timeout_seconds: default_timeout(),
            token_file: default_token_file(),
        }
    }
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout() -> u64 {
    600 // long documents from a single call can take minutes
}

fn default_token_file() -> String {
    "token.txt".to_string()
}

/// Names of the pipeline's input and output files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    #[serde(default = "default_urls")]
    pub urls: String,

    /// System prompt used to produce each SPR summary.
    #[serde(default = "default_spr_prompt")]
    pub spr_prompt: String,

    #[serde(default = "default_research_prompt")]
    pub research_prompt: String,

    #[serde(default = "default_wiki_prompt")]
    pub wiki_prompt: String,

    /// Summary record `i` is stored as `{summary_prefix}{i}{summary_suffix}`.
    #[serde(default = "default_summary_prefix")]
    pub summary_prefix: String,

    #[serde(default = "default_summary_suffix")]
    pub summary_suffix: String,

    #[serde(default = "default_research_output")]
    pub research_output: String,

    #[serde(default = "default_wiki_output")]
    pub wiki_output: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            urls: default_urls(),
            spr_prompt: default_spr_prompt(),
            research_prompt: default_research_prompt(),
            wiki_prompt: default_wiki_prompt(),
            summary_prefix: default_summary_prefix(),
            summary_suffix: default_summary_suffix(),
            research_output: default_research_output(),
            wiki_output: default_wiki_output(),
        }
    }
}

fn default_urls() -> String {
    "urls.txt".to_string()
}

fn default_spr_prompt() -> String {
    "spr_gen.txt".to_string()
}

fn default_research_prompt() -> String {
    "spr_decomp_research.txt".to_string()
}

fn default_wiki_prompt() -> String {
    "spr_decomp_wiki.txt".to_string()
}

fn default_summary_prefix() -> String {
    "summary_".to_string()
}

fn default_summary_suffix() -> String {
    ".txt".to_string()
}

fn default_research_output() -> String {
    "final_research_paper.txt".to_string()
}

fn default_wiki_output() -> String {
    "final_wiki.txt".to_string()
}

impl FilesConfig {
    /// Template and output names for an aggregate document kind.
    pub fn target(&self, kind: DocumentKind) -> AggregateTarget {
        match kind {
            DocumentKind::ResearchPaper => {
                AggregateTarget::new(kind, &self.research_prompt, &self.research_output)
            }
            DocumentKind::Wiki => AggregateTarget::new(kind, &self.wiki_prompt, &self.wiki_output),
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from `dir/.sprsynth.toml`.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(CONFIG_FILE_NAME);

        if path.exists() {
            Ok(Some(Self::load(&path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence, but only when given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref workdir) = args.workdir {
            self.general.workdir = workdir.clone();
        }
        if let Some(concurrency) = args.concurrency {
            self.general.concurrency = concurrency;
        }
        if let Some(policy) = args.stale {
            self.general.stale_records = policy;
        }

        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref api_base) = args.api_base {
            self.model.api_base = api_base.clone();
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = Some(temperature);
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }
    }

    /// Check the merged settings, whichever source they came from.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let problem = if self.general.concurrency == 0 {
            Some("general.concurrency must be at least 1".to_string())
        } else if self.model.timeout_seconds == 0 {
            Some("model.timeout_seconds must be at least 1".to_string())
        } else if self
            .model
            .temperature
            .is_some_and(|t| !(0.0..=2.0).contains(&t))
        {
            Some("model.temperature must be between 0.0 and 2.0".to_string())
        } else if !self.model.api_base.starts_with("http://")
            && !self.model.api_base.starts_with("https://")
        {
            Some(format!(
                "model.api_base must start with 'http://' or 'https://', got '{}'",
                self.model.api_base
            ))
        } else {
            None
        };

        match problem {
            Some(message) => Err(ConfigurationError::new(format!(
                "Invalid configuration: {}",
                message
            ))
            .with_guidance(format!(
                "Fix the value in {} or override it on the command line.",
                CONFIG_FILE_NAME
            ))),
            None => Ok(()),
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
