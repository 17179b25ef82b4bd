//! Error types for the modelcard library.
//!
//! Two distinct types reflect two distinct failure modes:
//!
//! * [`ModelCardError`] (**fatal**): the card cannot be produced at all
//!   (empty identifier, hub unreachable, snapshot missing). Returned as
//!   `Err(ModelCardError)` from the top-level `fetch_*` / `build_*` functions.
//!
//! * [`Degradation`] (**non-fatal**): an optional piece of data was lost
//!   (image missing on disk, front matter unparsable) but the card can still
//!   be built. Collected into reports and logged at `warn` level.
//!
//! Everything downstream of the fetch layer degrades instead of failing: a
//! one-page card with a blank image box is more useful than no card.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the modelcard library.
#[derive(Debug, Error)]
pub enum ModelCardError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The model identifier resolved to an empty string, or does not have
    /// the `<author>/<model>` shape.
    #[error("Invalid model identifier '{input}'\nExpected <author>/<model> or a model page URL.")]
    InvalidIdentifier { input: String },

    // ── Fetch errors ──────────────────────────────────────────────────────
    /// The hub returned a non-success status, or the response lacked the
    /// structure the chosen strategy needs.
    #[error("Failed to fetch '{url}': {reason}")]
    FetchError { url: String, reason: String },

    /// The request exceeded the configured timeout.
    #[error("Request timed out after {secs}s for '{url}'\nIncrease --timeout.")]
    FetchTimeout { url: String, secs: u64 },

    // ── Snapshot errors ───────────────────────────────────────────────────
    /// The JSON snapshot to render from does not exist.
    #[error("Model data file not found at '{path}'")]
    SnapshotNotFound { path: PathBuf },

    /// The snapshot exists but is not a model card document.
    #[error("Model data file '{path}' is not valid: {detail}")]
    SnapshotInvalid { path: PathBuf, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file (snapshot, PDF, image).
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed or the YAML config could not be read.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Render errors ─────────────────────────────────────────────────────
    /// genpdf could not lay out or write the document (usually a missing font).
    #[error("PDF rendering failed: {0}")]
    RenderFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ModelCardError {
    pub(crate) fn invalid_identifier(input: impl Into<String>) -> Self {
        ModelCardError::InvalidIdentifier {
            input: input.into(),
        }
    }
}

/// A non-fatal loss of optional data.
///
/// Never aborts the pipeline. The renderer substitutes a visible default
/// for each degradation (blank box for an image, "N/A" for a field).
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum Degradation {
    /// A referenced local file (image, logo) does not exist, or a remote
    /// image could not be downloaded.
    #[error("Asset '{name}' not found: {path}")]
    MissingAsset { name: String, path: String },

    /// Front matter, a metric pattern, or a required section could not be
    /// parsed; the data was dropped.
    #[error("Could not parse {what}: {detail}")]
    ParseDegradation { what: String, detail: String },
}
