//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation of flag combinations and ranges.

use crate::models::StalePolicy;
use clap::Parser;
use std::path::PathBuf;

/// SprSynth - summarize articles into SPRs and expand them into documents
///
/// Reads URLs from urls.txt, stores a sparse priming representation (SPR)
/// of each article as summary_N.txt, then turns all summaries into a
/// research paper or a wiki article.
///
/// Examples:
///   sprsynth --summarize
///   sprsynth --summarize --wiki --research
///   sprsynth --wiki --topic "vegan fitness" --yes
///   sprsynth --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Generate summaries from every URL in the URL list
    #[arg(long)]
    pub summarize: bool,

    /// Generate a wiki article from the stored summaries
    #[arg(long)]
    pub wiki: bool,

    /// Generate a research paper from the stored summaries
    #[arg(long)]
    pub research: bool,

    /// Delete all stored summaries before running any other stage
    #[arg(long)]
    pub clean: bool,

    /// Directory containing the input files and receiving the outputs
    #[arg(short, long, value_name = "DIR")]
    pub workdir: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .sprsynth.toml in the working directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Chat model to use
    #[arg(short, long, env = "SPRSYNTH_MODEL")]
    pub model: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, value_name = "URL", env = "OPENAI_BASE_URL")]
    pub api_base: Option<String>,

    /// API key; takes precedence over the token file
    #[arg(long, value_name = "KEY", env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Sampling temperature (0.0 - 2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Request timeout in seconds for downloads and LLM calls
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Number of URLs summarized at once
    #[arg(long, value_name = "NUM")]
    pub concurrency: Option<usize>,

    /// What to do with summaries left over from a previous, longer URL list
    #[arg(long, value_name = "POLICY")]
    pub stale: Option<StalePolicy>,

    /// Approve overwriting existing summaries and documents without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Topic for the wiki article or research paper, instead of asking
    #[arg(short, long, value_name = "TEXT")]
    pub topic: Option<String>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .sprsynth.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// True if at least one pipeline stage was requested.
    pub fn has_action(&self) -> bool {
        self.clean || self.needs_llm()
    }

    /// True if a requested stage talks to the LLM service.
    pub fn needs_llm(&self) -> bool {
        self.summarize || self.wiki || self.research
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if !self.has_action() {
            return Err("Please specify an action: --summarize or --wiki or --research (or --clean)\n\
                 Example: sprsynth --summarize\n\
                 Example: sprsynth --summarize --wiki --research\n\
                 Example: sprsynth --wiki"
                .to_string());
        }

        if self.clean && !self.summarize && (self.wiki || self.research) {
            return Err("--clean deletes the summaries that --wiki and --research read; \
                 add --summarize to rebuild them in the same run"
                .to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref api_base) = self.api_base {
            if !api_base.starts_with("http://") && !api_base.starts_with("https://") {
                return Err("API base URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 2.0".to_string());
            }
        }

        if self.concurrency == Some(0) {
            return Err("Concurrency must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
