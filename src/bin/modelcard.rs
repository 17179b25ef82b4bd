//! CLI binary for modelcard.
//!
//! A thin shim over the library crate: fetch a model card (or read a
//! snapshot), then render the PDF.

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use modelcard::{
    build_card, download_card_images, fetch_card, save_snapshot, CardConfig, CardSource, Degradation,
    FetchProgressCallback, FetchStrategy, FontSource, ProgressCallback, RenderOptions,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner with one log line per finished request.
struct CliProgressCallback {
    bar: ProgressBar,
    requests: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Fetching");
        bar.set_message("Connecting…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            requests: AtomicUsize::new(0),
        })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl FetchProgressCallback for CliProgressCallback {
    fn on_request_start(&self, url: &str) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.bar.set_message(url.to_string());
    }

    fn on_request_complete(&self, url: &str, status: u16, bytes: usize) {
        self.bar.println(format!(
            "  {} {}  {}",
            green("✓"),
            url,
            dim(&format!("{status}  {bytes} bytes"))
        ));
    }

    fn on_request_error(&self, url: &str, error: &str) {
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!("  {} {}  {}", red("✗"), url, red(&msg)));
    }

    fn on_image_saved(&self, name: &str, path: &Path) {
        self.bar.println(format!(
            "  {} {}  {}",
            green("✓"),
            name,
            dim(&path.display().to_string())
        ));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Fetch from the hub and render
  modelcard --url https://huggingface.co/akridge/yolo11-fish-detector-grayscale

  # Render an existing snapshot with custom assets
  modelcard --data model_data.json --assets ./assets -o card.pdf

  # Scrape the rendered page instead of the API, download repo images
  modelcard -u akridge/yolo11-fish-detector-grayscale --strategy html --download-images

  # Hand-authored card content
  modelcard --presentation model_card_data.json

CONFIG FILE (--config):
  hub:      endpoint, strategy, revision, timeout_secs
  sections: [{name, pattern, required}]
  metrics:  [{name, pattern, description}]
  images:   [{name, path, width_mm, height_mm}]
  style:    title_style, body_style, primary_color, text_color, ...

ASSETS:
  The assets directory holds NOAA_FISHERIES_logoH_web.png,
  example_detection.png and example_PR_curve.png. Missing files are
  drawn as blank boxes and reported as warnings.

ENVIRONMENT VARIABLES:
  MODELCARD_ENDPOINT   Hub base URL (default https://huggingface.co)
  MODELCARD_FONTS      Directory with <family>-Regular.ttf etc.
  RUST_LOG             Override log filter
"#;

/// Build a one-page model card PDF from a model hub entry.
#[derive(Parser, Debug)]
#[command(
    name = "modelcard",
    version,
    about = "Build a one-page model card PDF from a Hugging Face model",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP,
    group(ArgGroup::new("source").required(true).args(["url", "data", "presentation"]))
)]
struct Cli {
    /// Model page URL or `author/model` id to fetch.
    #[arg(short, long)]
    url: Option<String>,

    /// Existing model data snapshot to render.
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Hand-authored presentation JSON to render.
    #[arg(long)]
    presentation: Option<PathBuf>,

    /// Output path for the PDF file.
    #[arg(short, long, env = "MODELCARD_OUTPUT", default_value = "Model_Card.pdf")]
    output: PathBuf,

    /// Directory containing asset files (images).
    #[arg(short, long, env = "MODELCARD_ASSETS", default_value = "assets")]
    assets: PathBuf,

    /// YAML config with hub, extraction and style settings.
    #[arg(short, long, env = "MODELCARD_CONFIG")]
    config: Option<PathBuf>,

    /// How to read the model card.
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Where the fetched snapshot is written.
    #[arg(long, default_value = "model_data.json")]
    snapshot: PathBuf,

    /// Hub base URL.
    #[arg(long, env = "MODELCARD_ENDPOINT")]
    endpoint: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, env = "MODELCARD_TIMEOUT")]
    timeout: Option<u64>,

    /// Download the configured images from the model repository into the assets directory.
    #[arg(long)]
    download_images: bool,

    /// Font directory for PDF rendering.
    #[arg(long, env = "MODELCARD_FONTS")]
    fonts: Option<PathBuf>,

    /// Font family file prefix inside the font directory.
    #[arg(long, default_value = "LiberationSans")]
    font_family: String,

    /// Disable the spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum StrategyArg {
    Api,
    Html,
    Markdown,
}

impl From<StrategyArg> for FetchStrategy {
    fn from(v: StrategyArg) -> Self {
        match v {
            StrategyArg::Api => FetchStrategy::Api,
            StrategyArg::Html => FetchStrategy::Html,
            StrategyArg::Markdown => FetchStrategy::Markdown,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO logs unless --verbose is set.
    let show_progress = !cli.quiet && !cli.no_progress && cli.url.is_some();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    let card_config = match cli.config {
        Some(ref path) => CardConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => CardConfig::default(),
    };

    let mut warnings: Vec<Degradation> = Vec::new();

    // ── Resolve the card source ──────────────────────────────────────────
    let source = if let Some(ref url) = cli.url {
        let progress = show_progress.then(CliProgressCallback::new);
        let config = build_fetch_config(&cli, &card_config, progress.clone().map(|p| p as ProgressCallback))?;

        let fetched = fetch_card(url, &config).await;
        let mut fetched = match fetched {
            Ok(f) => f,
            Err(e) => {
                if let Some(ref p) = progress {
                    p.finish();
                }
                return Err(e).context("Error fetching model card data");
            }
        };
        warnings.extend(fetched.degradations.iter().cloned());

        if cli.download_images {
            let report = download_card_images(&mut fetched.record, &config, &cli.assets)
                .await
                .context("Failed to download images")?;
            warnings.extend(report.degradations);
        }
        if let Some(ref p) = progress {
            p.finish();
        }

        save_snapshot(&fetched.record, &cli.snapshot).context("Failed to save model data")?;
        if !cli.quiet {
            eprintln!(
                "{} Saved model data to {}  {}",
                green("✔"),
                bold(&cli.snapshot.display().to_string()),
                dim(&format!("{}ms", fetched.duration_ms))
            );
        }
        CardSource::Snapshot(cli.snapshot.clone())
    } else if let Some(ref data) = cli.data {
        CardSource::Snapshot(data.clone())
    } else if let Some(ref presentation) = cli.presentation {
        CardSource::Presentation(presentation.clone())
    } else {
        anyhow::bail!("one of --url, --data or --presentation is required");
    };

    // ── Render ───────────────────────────────────────────────────────────
    let options = RenderOptions {
        output: cli.output.clone(),
        assets_dir: cli.assets.clone(),
        images: card_config.extraction.images.clone(),
        style: card_config.style.clone(),
        fonts: FontSource {
            dir: cli.fonts.clone(),
            family: cli.font_family.clone(),
        },
    };
    let report = build_card(source, &options)
        .await
        .context("Failed to build model card")?;
    warnings.extend(report.degradations);

    if !cli.quiet {
        for w in &warnings {
            eprintln!("{} {}", yellow("⚠"), w);
        }
        eprintln!(
            "{} Model card PDF created at: {}  {}",
            green("✔"),
            bold(&report.output.display().to_string()),
            dim(&format!("{} bytes", report.bytes))
        );
    }

    Ok(())
}

/// Merge config file and CLI flags; flags win.
fn build_fetch_config(
    cli: &Cli,
    card_config: &CardConfig,
    progress: Option<ProgressCallback>,
) -> Result<modelcard::FetchConfig> {
    let mut builder = card_config.fetch_builder();
    if let Some(ref endpoint) = cli.endpoint {
        builder = builder.endpoint(endpoint.clone());
    }
    if let Some(strategy) = cli.strategy {
        builder = builder.strategy(strategy.into());
    }
    if let Some(secs) = cli.timeout {
        builder = builder.timeout_secs(secs);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder.build().context("Invalid configuration")
}
