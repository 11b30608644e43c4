use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use nlp_endpoint::artifacts::{self, params::ModelParams};
use nlp_endpoint::config::Config;
use nlp_endpoint::output::terminal;
use nlp_endpoint::{Context, ModelHandler, ModelKind, RequestEntry};

/// nlp-endpoint: keyphrase extraction and document similarity behind a
/// model-serving handler.
///
/// This binary is a local driver for the handler. It reads a model directory
/// the way a serving host would and runs request payloads through it.
#[derive(Parser)]
#[command(name = "nlp-endpoint", version, about)]
struct Cli {
    /// Model directory (overrides NLP_ENDPOINT_MODEL_DIR)
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the model type, parameters and artifact found in the model directory
    Inspect,

    /// Run request payloads through the handler
    Handle {
        /// Payload files, one request each (reads a single request from stdin if none)
        files: Vec<PathBuf>,

        /// Print the raw JSON output instead of a colored summary
        #[arg(long)]
        json: bool,

        /// Pretty-print JSON output (implies --json)
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("nlp_endpoint=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load()?.with_model_dir(cli.model_dir);
    config.require_model_dir()?;

    match cli.command {
        Commands::Inspect => inspect(&config)?,
        Commands::Handle {
            files,
            json,
            pretty,
        } => handle(&config, &files, json || pretty, pretty)?,
    }

    Ok(())
}

fn inspect(config: &Config) -> Result<()> {
    let dir = &config.model_dir;
    let prefix = artifacts::resolve_prefix(dir)
        .with_context(|| format!("Failed to resolve model prefix in {}", dir.display()))?;
    let params = ModelParams::load(&artifacts::params_path(dir, &prefix))?;
    let kind = prefix.parse::<ModelKind>().ok();

    terminal::display_model_summary(kind, &prefix, &params);

    let model_path = artifacts::model_path(dir, &prefix);
    let status = if model_path.is_file() {
        "present".green()
    } else {
        "missing".red().bold()
    };
    println!("  Artifact: {} ({status})", model_path.display());
    println!();
    Ok(())
}

fn handle(config: &Config, files: &[PathBuf], json: bool, pretty: bool) -> Result<()> {
    let (labels, entries) = read_requests(files)?;
    info!(requests = entries.len(), "Read request payloads");

    let context = Context::with_model_dir(&config.model_dir);
    let mut handler = ModelHandler::new();
    let output = handler
        .handle(Some(entries.as_slice()), &context)
        .context("Handler failed")?;

    let Some(output) = output else {
        println!("{}", "No requests to handle.".dimmed());
        return Ok(());
    };

    if json {
        let rendered = if pretty {
            serde_json::to_string_pretty(&output)?
        } else {
            serde_json::to_string(&output)?
        };
        println!("{rendered}");
    } else {
        terminal::display_output(&labels, &output);
    }
    Ok(())
}

/// Read each file as one request, or stdin when no files are given.
fn read_requests(files: &[PathBuf]) -> Result<(Vec<String>, Vec<RequestEntry>)> {
    if files.is_empty() {
        let mut body = Vec::new();
        std::io::stdin()
            .read_to_end(&mut body)
            .context("Failed to read request from stdin")?;
        return Ok((vec!["stdin".to_string()], vec![RequestEntry::new(body)]));
    }

    let mut labels = Vec::with_capacity(files.len());
    let mut entries = Vec::with_capacity(files.len());
    for path in files {
        let body = std::fs::read(path)
            .with_context(|| format!("Failed to read request file {}", path.display()))?;
        labels.push(path.display().to_string());
        entries.push(RequestEntry::new(body));
    }
    Ok((labels, entries))
}
