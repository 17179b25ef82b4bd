//! Fetch entry points: identifier in, [`ModelCardRecord`] out.
//!
//! [`fetch_card`] runs the whole extraction pipeline for one model with the
//! configured [`FetchStrategy`]. Everything is sequential; each request is
//! awaited before the next is sent.

use crate::config::{FetchConfig, FetchStrategy};
use crate::error::{Degradation, ModelCardError};
use crate::pipeline::fetch::{DownloadReport, HubClient};
use crate::pipeline::{identifier, normalize};
use crate::record::ModelCardRecord;
use crate::snapshot;
use chrono::Utc;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// A fetched record plus what was lost on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutput {
    pub record: ModelCardRecord,
    pub degradations: Vec<Degradation>,
    pub strategy: FetchStrategy,
    pub duration_ms: u64,
}

/// Fetch and normalise the model card for a page URL or `author/model` id.
///
/// # Errors
/// - [`ModelCardError::InvalidIdentifier`] when `input` does not resolve
/// - [`ModelCardError::FetchError`] / [`ModelCardError::FetchTimeout`] when
///   the strategy's primary request fails (the README in `Api` mode is
///   optional and never fails the call)
pub async fn fetch_card(input: impl AsRef<str>, config: &FetchConfig) -> Result<FetchOutput, ModelCardError> {
    let start = Instant::now();
    let input = input.as_ref();
    let repo_id = identifier::resolve_repo_id(input)?;
    // Reject malformed ids before any network traffic.
    identifier::split_repo_id(&repo_id)?;
    info!("Fetching model card for {} ({} strategy)", repo_id, config.strategy);

    let client = HubClient::new(config)?;
    let today = Utc::now().date_naive();
    let extraction = &config.extraction;

    let extracted = match config.strategy {
        FetchStrategy::Api => {
            let api = client.fetch_api_metadata(&repo_id).await?;
            let readme = if config.include_readme {
                client.fetch_readme_text(&repo_id).await
            } else {
                None
            };
            normalize::record_from_api(&repo_id, &api, readme.as_deref(), extraction, today)?
        }
        FetchStrategy::Markdown => {
            let readme = client.fetch_readme_text(&repo_id).await.ok_or_else(|| {
                ModelCardError::FetchError {
                    url: client.readme_url(&repo_id),
                    reason: "README not available".into(),
                }
            })?;
            normalize::record_from_markdown(&repo_id, &readme, extraction, today)?
        }
        FetchStrategy::Html => {
            let page = client.fetch_rendered_page(&repo_id).await?;
            normalize::record_from_html(&repo_id, &page, extraction, today)?
        }
    };

    for d in &extracted.degradations {
        warn!("{}", d);
    }
    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Fetched {}: {} sections, {} metrics in {}ms",
        repo_id,
        extracted.record.sections.len(),
        extracted.record.metrics.len(),
        duration_ms
    );

    Ok(FetchOutput {
        record: extracted.record,
        degradations: extracted.degradations,
        strategy: config.strategy,
        duration_ms,
    })
}

/// Fetch a card and write its JSON snapshot to `output_path`.
pub async fn fetch_card_to_file(
    input: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &FetchConfig,
) -> Result<FetchOutput, ModelCardError> {
    let output = fetch_card(input, config).await?;
    snapshot::save_snapshot(&output.record, output_path)?;
    Ok(output)
}

/// Synchronous wrapper around [`fetch_card`].
///
/// Creates a temporary tokio runtime internally.
pub fn fetch_card_sync(input: impl AsRef<str>, config: &FetchConfig) -> Result<FetchOutput, ModelCardError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ModelCardError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(fetch_card(input, config))
}

/// Download the configured image resources of `record`'s repository into
/// `out_dir` and point `record.images` at the saved files.
///
/// Images that cannot be fetched keep their configured path and are
/// reported as degradations.
pub async fn download_card_images(
    record: &mut ModelCardRecord,
    config: &FetchConfig,
    out_dir: impl AsRef<Path>,
) -> Result<DownloadReport, ModelCardError> {
    let client = HubClient::new(config)?;
    let report = client
        .download_images(&record.model_info.repo_id, &config.extraction.images, out_dir.as_ref())
        .await?;
    for (name, path) in &report.saved {
        record.images.insert(name.clone(), path.display().to_string());
    }
    for d in &report.degradations {
        warn!("{}", d);
    }
    Ok(report)
}
