//! SprSynth - article summarizer and long-form document synthesizer
//!
//! A CLI tool that fetches articles from a list of URLs, stores an SPR
//! (sparse priming representation) of each one, and expands all stored
//! SPRs into a research paper or a wiki article with an LLM.
//!
//! Exit codes:
//!   0 - Success (including stages skipped at the overwrite prompt)
//!   1 - Configuration problem or runtime failure (fetch, LLM, I/O)

mod cli;
mod config;
mod error;
mod fetch;
mod llm;
mod models;
mod pipeline;
mod storage;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use error::ConfigurationError;
use fetch::HttpArticleFetcher;
use llm::{LlmClient, OpenAiClient, OpenAiConfig};
use models::{DocumentKind, UrlList};
use pipeline::{
    ensure_urls, read_required, AggregateStage, ConsolePrompter, OverwriteGate, StageOutcome,
    SummarizeOptions, SummarizeStage,
};
use std::path::{Path, PathBuf};
use storage::{SummaryStore, Workspace};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config(&args);
    }

    init_logging(&args)?;

    info!("SprSynth v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        if let Some(config_err) = e.downcast_ref::<ConfigurationError>() {
            error!("Configuration error: {}", config_err);
            eprintln!("\n⚠️  {}", config_err.message);
            for line in &config_err.guidance {
                eprintln!("   {}", line);
            }
        } else {
            error!("Pipeline failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
        }
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .sprsynth.toml.
fn handle_init_config(args: &Args) -> Result<()> {
    let dir = args.workdir.clone().unwrap_or_else(|| PathBuf::from("."));
    let path = dir.join(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            path.display()
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(&path, &content)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("✅ Created {} with default settings.", path.display());
    println!("   Edit it to customize the model, file names, and stale-summary policy.");
    Ok(())
}

/// Initialize logging based on verbosity settings. `RUST_LOG` wins if set.
fn init_logging(args: &Args) -> Result<()> {
    let level = args.log_level().to_string().to_lowercase();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,sprsynth={}", level)));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Inputs of the summary stage, read before anything is deleted.
#[derive(Debug)]
struct SummarizeInputs {
    urls: UrlList,
    system_prompt: String,
}

/// Run every requested stage in order: clean, summarize, wiki, research.
///
/// Everything the LLM stages need up front (credential, URL list, SPR
/// prompt) is checked before `--clean` touches the stored summaries.
async fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    let workspace = Workspace::new(&config.general.workdir);
    let store = SummaryStore::new(
        workspace.clone(),
        &config.files.summary_prefix,
        &config.files.summary_suffix,
    );
    info!("Working directory: {}", workspace.root().display());

    let prompter = ConsolePrompter::new(args.yes, args.topic.clone());

    let api_key = if args.needs_llm() {
        Some(load_api_key(&args, &config, &workspace)?)
    } else {
        None
    };
    let summarize_inputs = if args.summarize {
        Some(load_summarize_inputs(&config, &workspace)?)
    } else {
        None
    };

    if args.clean {
        run_clean(&store, &prompter)?;
    }

    let Some(api_key) = api_key else {
        return Ok(());
    };

    let llm = OpenAiClient::new(OpenAiConfig {
        api_base: config.model.api_base.clone(),
        api_key,
        model: config.model.name.clone(),
        temperature: config.model.temperature,
        timeout_seconds: config.model.timeout_seconds,
    })?;

    println!("🤖 Model: {} ({})", llm.model_name(), config.model.api_base);

    if let Some(inputs) = summarize_inputs {
        run_summarize(&args, &config, &store, &llm, &prompter, inputs).await?;
    }

    if args.wiki {
        run_aggregate(DocumentKind::Wiki, &config, &workspace, &store, &llm, &prompter).await?;
    }

    if args.research {
        run_aggregate(
            DocumentKind::ResearchPaper,
            &config,
            &workspace,
            &store,
            &llm,
            &prompter,
        )
        .await?;
    }

    Ok(())
}

/// Delete every stored summary after confirmation.
fn run_clean(store: &SummaryStore, gate: &dyn OverwriteGate) -> Result<()> {
    if !gate.approve("Delete all stored summaries?")? {
        println!("⏭️  Summaries kept.");
        return Ok(());
    }

    let removed = store.clear().context("Failed to delete summaries")?;
    println!("🗑️  Deleted {} summaries.", removed);
    Ok(())
}

/// Read the URL list and the SPR prompt, with guidance when either is missing.
fn load_summarize_inputs(config: &Config, workspace: &Workspace) -> Result<SummarizeInputs> {
    let files = &config.files;

    if !workspace.exists(&files.urls) {
        return Err(ConfigurationError::new(format!(
            "No URL list found at {}",
            workspace.path(&files.urls).display()
        ))
        .with_guidance(format!(
            "Please create a text file called '{}', with at least 1 url. Each url should be on its own line.",
            files.urls
        ))
        .with_guidance("This program will pull content from each url and summarize it.")
        .into());
    }

    let urls = UrlList::from_lines(workspace.read_lines(&files.urls)?);
    ensure_urls(&urls)?;
    let system_prompt = read_required(workspace, &files.spr_prompt, "the SPR generation prompt")?;

    Ok(SummarizeInputs {
        urls,
        system_prompt,
    })
}

/// Fetch and summarize every URL in the URL list.
async fn run_summarize(
    args: &Args,
    config: &Config,
    store: &SummaryStore,
    llm: &dyn LlmClient,
    prompter: &ConsolePrompter,
    inputs: SummarizeInputs,
) -> Result<()> {
    let files = &config.files;
    let fetcher = HttpArticleFetcher::new(config.model.timeout_seconds)
        .context("Failed to create HTTP client")?;

    println!("\n📝 Generating summaries for {} URL(s)...", inputs.urls.len());

    let stage = SummarizeStage::new(
        &fetcher,
        llm,
        store,
        SummarizeOptions {
            concurrency: config.general.concurrency,
            stale_policy: config.general.stale_records,
            show_progress: !args.quiet,
        },
    );

    match stage
        .run(&inputs.urls, &inputs.system_prompt, prompter)
        .await?
    {
        StageOutcome::Summarized { count, pruned } => {
            println!(
                "✅ {} summaries generated. They are saved as '{}X{}'",
                count, files.summary_prefix, files.summary_suffix
            );
            if pruned > 0 {
                println!("   Removed {} stale summaries from a previous run.", pruned);
            }
        }
        StageOutcome::Skipped => println!("⏭️  Summaries not generated. Skipped."),
        other => warn!("Unexpected summary stage outcome: {:?}", other),
    }

    Ok(())
}

/// Expand all stored summaries into one document of the given kind.
async fn run_aggregate(
    kind: DocumentKind,
    config: &Config,
    workspace: &Workspace,
    store: &SummaryStore,
    llm: &dyn LlmClient,
    prompter: &ConsolePrompter,
) -> Result<()> {
    if store.is_empty() {
        return Err(ConfigurationError::new(format!(
            "No summaries have been generated yet, please do that before generating a {}.",
            kind
        ))
        .with_guidance("Run this program with the '--summarize' flag.")
        .with_guidance("Example: sprsynth --summarize")
        .into());
    }

    let target = config.files.target(kind);
    println!(
        "\n📝 Generating {} from {} summaries...",
        kind,
        store.count()
    );

    let stage = AggregateStage::new(llm, workspace, store);
    match stage.run(&target, prompter, prompter).await? {
        StageOutcome::Generated { output, summaries } => {
            println!(
                "✅ Your {} has been generated from {} summaries. It is saved under '{}'",
                kind,
                summaries,
                output.display()
            );
        }
        StageOutcome::Skipped => println!("⏭️  {} not generated. Skipped.", kind.title()),
        other => warn!("Unexpected {} stage outcome: {:?}", kind, other),
    }

    Ok(())
}

/// Load configuration from file or use defaults, then apply CLI overrides.
///
/// A config file that exists but does not parse is an error, never a
/// silent fallback to defaults.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        Config::load(config_path)?
    } else {
        let dir = args.workdir.as_deref().unwrap_or(Path::new("."));
        match Config::load_from_dir(dir)? {
            Some(config) => {
                info!("Loaded config from {}", dir.join(CONFIG_FILE_NAME).display());
                config
            }
            None => {
                debug!("No config file found, using defaults");
                Config::default()
            }
        }
    };

    config.merge_with_args(args);
    config.validate()?;
    Ok(config)
}

/// The API key comes from --api-key / OPENAI_API_KEY, else the token file.
fn load_api_key(args: &Args, config: &Config, workspace: &Workspace) -> Result<String> {
    if let Some(key) = args.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        debug!("Using API key from command line or environment");
        return Ok(key.to_string());
    }

    let token_file = &config.model.token_file;
    let key = read_required(workspace, token_file, "your OpenAI API key")?;
    let key = key.trim();

    if key.is_empty() {
        return Err(ConfigurationError::new(format!("{} is empty", token_file))
            .with_guidance(format!(
                "Please put your OpenAI API key in '{}'.",
                token_file
            ))
            .into());
    }

    Ok(key.to_string())
}
