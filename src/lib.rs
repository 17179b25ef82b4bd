//! # modelcard
//!
//! Fetch a machine-learning model's card from a Hugging Face–style hub and
//! render it as a one-page PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! model id / page URL
//!  │
//!  ├─ 1. Resolve   canonical `author/model` id
//!  ├─ 2. Fetch     metadata API | raw README | rendered page
//!  ├─ 3. Extract   front matter, sections, metrics, dates
//!  ├─ 4. Persist   JSON snapshot (model_data.json)
//!  └─ 5. Render    Letter-size PDF with logo, metrics table and images
//! ```
//!
//! Steps 1–4 are the fetch side ([`fetch_card`], [`save_snapshot`]); step 5
//! reads a snapshot or a hand-authored presentation JSON ([`build_card`]).
//! Lost optional data (a missing image, unparsable front matter) never fails
//! a run: it is reported as a [`Degradation`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use modelcard::{build_card, fetch_card, save_snapshot, CardSource, FetchConfig, RenderOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = FetchConfig::default();
//!     let fetched = fetch_card("akridge/yolo11-fish-detector-grayscale", &config).await?;
//!     save_snapshot(&fetched.record, "model_data.json")?;
//!
//!     let report = build_card(CardSource::Snapshot("model_data.json".into()), &RenderOptions::default()).await?;
//!     eprintln!("wrote {} ({} warnings)", report.output.display(), report.degradations.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `modelcard` and `fetch-card` binaries (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! modelcard = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod card;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod record;
pub mod render;
pub mod snapshot;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use card::{download_card_images, fetch_card, fetch_card_sync, fetch_card_to_file, FetchOutput};
pub use config::{
    CardConfig, ExtractionConfig, FetchConfig, FetchConfigBuilder, FetchStrategy, ImageSpec, MetricSpec,
    SectionSpec,
};
pub use error::{Degradation, ModelCardError};
pub use pipeline::identifier::resolve_repo_id;
pub use progress::{FetchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use record::{Metric, ModelCardRecord, ModelInfo, LATEST_REVISION, NOT_AVAILABLE};
pub use render::{
    build_card, build_card_sync, plan_layout, render_pdf, Block, CardAssets, CardLayout, CardPresentation,
    CardSource, CardStyle, FontSource, RenderOptions, RenderReport,
};
pub use snapshot::{load_snapshot, save_snapshot};
