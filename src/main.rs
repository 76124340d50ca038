use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use mobrev_core::{MobrevConfig, DEFAULT_CONFIG_FILE};
use mobrev_review::pipeline::{ReviewOutcome, ReviewPipeline};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "mobrev",
    version,
    about = "AI review bot for mobile pull requests",
    long_about = "Reviews the pull request named by a CI event payload.\n\n\
                  Fetches the changed files, drops build output, binaries and lockfiles,\n\
                  asks an OpenAI-compatible model for a rubric-grounded mobile review,\n\
                  and posts it as a PR comment. High-risk reviews can also be sent to Slack.\n\n\
                  Examples:\n  \
                    mobrev                               Review using GITHUB_* env vars\n  \
                    mobrev --event-path event.json -v    Review a saved event with debug logs\n  \
                    mobrev init                          Write a default .mobrev.toml"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .mobrev.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Event payload to review (overrides GITHUB_EVENT_PATH)
    #[arg(long, global = true)]
    event_path: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Review the pull request from the event payload (default)
    Review,
    /// Create a default .mobrev.toml in the current directory
    Init,
}

const DEFAULT_CONFIG: &str = r##"# mobrev configuration
# Environment variables override every value here.
# Secrets (GITHUB_TOKEN, OPENAI_API_KEY) belong in the environment.

[github]
# api_url = "https://api.github.com"

[llm]
# model = "gpt-4o-mini"
# base_url = "https://api.openai.com"

[review]
# max_patch_chars = 12000
# max_files = 25
# file_globs = "*.kt,*.kts,*.java,*.xml,*.swift,*.m,*.mm,*.gradle,*.gradle.kts,*.pro,*.plist,*.md"
# Empty string disables the remote rubric.
# rubric_url = ""

[alert]
# webhook_url = "https://hooks.slack.com/services/..."
# channel = "#mobile-reviews"
"##;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_review(cli: &Cli) -> Result<()> {
    let mut config = MobrevConfig::load(cli.config.as_deref())?;
    if let Some(path) = &cli.event_path {
        config.github.event_path = Some(path.clone());
    }
    let credentials = config.credentials()?;

    let pipeline = ReviewPipeline::from_config(&config, &credentials)?;
    let outcome = pipeline.run(&credentials.event_path).await?;

    match &outcome {
        ReviewOutcome::Failed { .. } => warn!(%outcome, "run finished"),
        _ => info!(%outcome, "run finished"),
    }
    Ok(())
}

fn run_init() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);
    if path.exists() {
        miette::bail!("{} already exists", DEFAULT_CONFIG_FILE);
    }
    std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
    println!("Created {DEFAULT_CONFIG_FILE} with default configuration");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        None | Some(Command::Review) => run_review(&cli).await,
        Some(Command::Init) => run_init(),
    }
}
