//! Standalone fetch step: write the model data snapshot and print its path.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use modelcard::{fetch_card_to_file, FetchConfig};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: fetch-card <url_or_repo_id>
Example URLs:
  https://huggingface.co/org/model
  https://huggingface.co/models/org/model
  org/model";

/// Fetch a model card from the hub and save it as JSON.
#[derive(Parser, Debug)]
#[command(name = "fetch-card", version)]
struct Cli {
    /// Model page URL or `author/model` id.
    input: String,

    /// Snapshot path.
    #[arg(short, long, env = "MODELCARD_SNAPSHOT", default_value = "model_data.json")]
    output: PathBuf,

    /// Hub base URL.
    #[arg(long, env = "MODELCARD_ENDPOINT")]
    endpoint: Option<String>,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(_) => {
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut builder = FetchConfig::builder();
    if let Some(endpoint) = cli.endpoint {
        builder = builder.endpoint(endpoint);
    }
    let config = builder.build().context("Invalid configuration")?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    runtime
        .block_on(fetch_card_to_file(&cli.input, &cli.output, &config))
        .with_context(|| format!("Failed to fetch model card for '{}'", cli.input))?;

    println!("Saved model data to {}", cli.output.display());
    Ok(())
}
