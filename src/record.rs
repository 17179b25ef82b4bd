//! The normalized model-card record and its parts.
//!
//! A [`ModelCardRecord`] is built once per invocation (from a live fetch or a
//! snapshot), never mutated after the extractor hands it over, and persisted
//! only as JSON. Every field has a literal sentinel default so nothing
//! null-like reaches the rendered page.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder for any free-text field the source did not provide.
pub const NOT_AVAILABLE: &str = "N/A";

/// Revision label shown when a record carries no revision hash.
pub const LATEST_REVISION: &str = "latest";

/// Section that holds text appearing before the first heading.
pub const OVERVIEW_SECTION: &str = "Overview";

/// Identifying and technical fields of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// `<author>/<model_name>`.
    pub repo_id: String,
    /// Display name. The last path component of `repo_id`, or the hub's
    /// `modelId` when fetched through the metadata API.
    pub model_name: String,
    pub author: String,
    /// Revision hash, or [`NOT_AVAILABLE`].
    pub version: String,
    /// `YYYY-MM-DD`.
    pub release_date: String,
    pub architecture: String,
    pub input_size: String,
    pub training_data: String,
}

/// A named performance number discovered in the card text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    pub description: String,
}

/// The canonical normalized output of the extraction pipeline.
///
/// Serialised field order is fixed by the struct layout and every map is a
/// `BTreeMap`, so two snapshots of the same model diff cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCardRecord {
    pub model_info: ModelInfo,
    /// Section name → section text.
    pub sections: BTreeMap<String, String>,
    /// At most one entry per metric name, in configuration order.
    #[serde(default)]
    pub metrics: Vec<Metric>,
    /// Structured front-matter / page metadata (license, tags, likes, …).
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Logical image name → remote path template or local file path.
    #[serde(default)]
    pub images: BTreeMap<String, String>,
}

impl ModelCardRecord {
    /// Create a record with every optional field set to its sentinel.
    pub fn new(repo_id: &str, author: &str, model_name: &str, release_date: String) -> Self {
        Self {
            model_info: ModelInfo {
                repo_id: repo_id.to_string(),
                model_name: model_name.to_string(),
                author: author.to_string(),
                version: NOT_AVAILABLE.to_string(),
                release_date,
                architecture: NOT_AVAILABLE.to_string(),
                input_size: NOT_AVAILABLE.to_string(),
                training_data: NOT_AVAILABLE.to_string(),
            },
            sections: BTreeMap::new(),
            metrics: Vec::new(),
            metadata: BTreeMap::new(),
            images: BTreeMap::new(),
        }
    }

    /// Look up a metric by name.
    pub fn metric(&self, name: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.name == name)
    }

    /// Look up a section by name.
    pub fn section(&self, name: &str) -> Option<&str> {
        self.sections.get(name).map(String::as_str)
    }
}

/// Replace an empty or whitespace-only value with [`NOT_AVAILABLE`].
pub(crate) fn or_sentinel(value: Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}
