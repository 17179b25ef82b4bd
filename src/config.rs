//! Configuration types for fetching, extracting and rendering a model card.
//!
//! Network behaviour is controlled through [`FetchConfig`], built via its
//! [`FetchConfigBuilder`]. What gets extracted (sections, metric patterns,
//! images) is described by [`ExtractionConfig`], and the optional YAML file
//! passed with `--config` deserialises into [`CardConfig`], which carries
//! both plus the page [`CardStyle`].
//!
//! # Example YAML
//! ```yaml
//! hub:
//!   endpoint: https://huggingface.co
//!   strategy: markdown
//! sections:
//!   - name: Training Data
//!     pattern: "(?s)## Training Data\\n(.*?)(?:\\n## |\\z)"
//!     required: true
//! metrics:
//!   - name: F1
//!     pattern: "(?i)f1[\\s:]+([0-9.]+)"
//!     description: Harmonic mean of precision and recall
//! images:
//!   - name: pr_curve
//!     path: results/PR_curve.png
//!     width_mm: 76.2
//!     height_mm: 50.8
//! ```

use crate::error::ModelCardError;
use crate::progress::ProgressCallback;
use crate::render::CardStyle;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Default model hub.
pub const DEFAULT_ENDPOINT: &str = "https://huggingface.co";

/// How the descriptive text of a model is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStrategy {
    /// Metadata API (`/api/models/{id}`), enriched with the README when available. (default)
    #[default]
    Api,
    /// Scrape the rendered model page.
    Html,
    /// Raw README Markdown only.
    Markdown,
}

impl fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FetchStrategy::Api => "api",
            FetchStrategy::Html => "html",
            FetchStrategy::Markdown => "markdown",
        };
        f.write_str(s)
    }
}

/// Configuration for talking to the model hub.
///
/// Built via [`FetchConfig::builder()`] or using [`FetchConfig::default()`].
///
/// # Example
/// ```rust
/// use modelcard::{FetchConfig, FetchStrategy};
///
/// let config = FetchConfig::builder()
///     .strategy(FetchStrategy::Markdown)
///     .timeout_secs(20)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct FetchConfig {
    /// Base URL of the hub, without trailing slash. Default: `https://huggingface.co`.
    pub endpoint: String,

    /// Which endpoint family to read. Default: [`FetchStrategy::Api`].
    pub strategy: FetchStrategy,

    /// Branch or revision used for raw README and resource downloads. Default: `main`.
    pub revision: String,

    /// Per-request timeout in seconds. Default: 60.
    pub timeout_secs: u64,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,

    /// With [`FetchStrategy::Api`], also read the README for sections and
    /// front matter. Default: true.
    pub include_readme: bool,

    /// What to pull out of the fetched text.
    pub extraction: ExtractionConfig,

    /// Optional observer for request events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            strategy: FetchStrategy::default(),
            revision: "main".to_string(),
            timeout_secs: 60,
            user_agent: format!("modelcard/{}", env!("CARGO_PKG_VERSION")),
            include_readme: true,
            extraction: ExtractionConfig::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for FetchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchConfig")
            .field("endpoint", &self.endpoint)
            .field("strategy", &self.strategy)
            .field("revision", &self.revision)
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("include_readme", &self.include_readme)
            .field("extraction", &self.extraction)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn FetchProgressCallback>"),
            )
            .finish()
    }
}

impl FetchConfig {
    /// Create a new builder for `FetchConfig`.
    pub fn builder() -> FetchConfigBuilder {
        FetchConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`FetchConfig`].
pub struct FetchConfigBuilder {
    config: FetchConfig,
}

impl FetchConfigBuilder {
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn strategy(mut self, strategy: FetchStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    pub fn revision(mut self, revision: impl Into<String>) -> Self {
        self.config.revision = revision.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs.max(1);
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn include_readme(mut self, v: bool) -> Self {
        self.config.include_readme = v;
        self
    }

    pub fn extraction(mut self, extraction: ExtractionConfig) -> Self {
        self.config.extraction = extraction;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<FetchConfig, ModelCardError> {
        let c = &self.config;
        if !(c.endpoint.starts_with("http://") || c.endpoint.starts_with("https://")) {
            return Err(ModelCardError::InvalidConfig(format!(
                "endpoint must be an http(s) URL, got '{}'",
                c.endpoint
            )));
        }
        if c.revision.trim().is_empty() {
            return Err(ModelCardError::InvalidConfig(
                "revision must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Extraction ───────────────────────────────────────────────────────────

/// A section to pull out of the card text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSpec {
    /// Key in [`crate::ModelCardRecord::sections`].
    pub name: String,
    /// Regex applied to the full card text; capture group 1 (or the whole
    /// match) becomes the section text. Without a pattern the section is
    /// looked up by heading name.
    #[serde(default)]
    pub pattern: Option<String>,
    /// Keep the section with a sentinel value when it cannot be found.
    #[serde(default)]
    pub required: bool,
}

/// A named number to find in the card text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub name: String,
    /// Regex whose first capture group is the decimal value.
    pub pattern: String,
    #[serde(default)]
    pub description: String,
}

/// An image shown on the card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSpec {
    /// Logical name, e.g. `detection_example`.
    pub name: String,
    /// Path inside the model repository (download) or assets directory (render).
    pub path: String,
    pub width_mm: f64,
    pub height_mm: f64,
}

/// What the extractor pulls out of the fetched text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Empty means "keep every section found in the document".
    pub sections: Vec<SectionSpec>,
    pub metrics: Vec<MetricSpec>,
    pub images: Vec<ImageSpec>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            sections: Vec::new(),
            metrics: default_metrics(),
            images: default_images(),
        }
    }
}

/// mAP, Precision and Recall, matched case-insensitively.
pub fn default_metrics() -> Vec<MetricSpec> {
    vec![
        MetricSpec {
            name: "mAP".into(),
            pattern: r"(?i)\bmAP(?:[@\s]*0?\.5)?[\s:=]+([0-9]*\.?[0-9]+)".into(),
            description: "Mean Average Precision at 0.5 IOU".into(),
        },
        MetricSpec {
            name: "Precision".into(),
            pattern: r"(?i)\bprecision[\s:]+([0-9]*\.?[0-9]+)".into(),
            description: "Share of detections that are real fish".into(),
        },
        MetricSpec {
            name: "Recall".into(),
            pattern: r"(?i)\brecall[\s:]+([0-9]*\.?[0-9]+)".into(),
            description: "Share of all fish that are found".into(),
        },
    ]
}

/// Example detection (4 × 2.5 in) and precision-recall curve (3 × 2 in).
pub fn default_images() -> Vec<ImageSpec> {
    vec![
        ImageSpec {
            name: "detection_example".into(),
            path: "example_detection.png".into(),
            width_mm: 101.6,
            height_mm: 63.5,
        },
        ImageSpec {
            name: "pr_curve".into(),
            path: "example_PR_curve.png".into(),
            width_mm: 76.2,
            height_mm: 50.8,
        },
    ]
}

// ── Config file ──────────────────────────────────────────────────────────

/// Hub overrides from the config file. Unset fields keep builder defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubSettings {
    pub endpoint: Option<String>,
    pub strategy: Option<FetchStrategy>,
    pub revision: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Contents of the YAML file passed with `--config`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardConfig {
    pub hub: HubSettings,
    #[serde(flatten)]
    pub extraction: ExtractionConfig,
    pub style: CardStyle,
}

impl CardConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ModelCardError> {
        serde_yaml::from_str(yaml).map_err(|e| ModelCardError::InvalidConfig(e.to_string()))
    }

    /// Read and parse a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ModelCardError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ModelCardError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&text)
    }

    /// Start a [`FetchConfigBuilder`] with this file's hub and extraction settings applied.
    pub fn fetch_builder(&self) -> FetchConfigBuilder {
        let mut builder = FetchConfig::builder().extraction(self.extraction.clone());
        if let Some(ref endpoint) = self.hub.endpoint {
            builder = builder.endpoint(endpoint.clone());
        }
        if let Some(strategy) = self.hub.strategy {
            builder = builder.strategy(strategy);
        }
        if let Some(ref revision) = self.hub.revision {
            builder = builder.revision(revision.clone());
        }
        if let Some(secs) = self.hub.timeout_secs {
            builder = builder.timeout_secs(secs);
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = FetchConfig::default();
        assert_eq!(c.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(c.strategy, FetchStrategy::Api);
        assert_eq!(c.timeout_secs, 60);
        assert_eq!(c.extraction.metrics.len(), 3);
        assert_eq!(c.extraction.images.len(), 2);
    }

    #[test]
    fn builder_trims_endpoint_and_clamps_timeout() {
        let c = FetchConfig::builder()
            .endpoint("http://127.0.0.1:8080/")
            .timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(c.endpoint, "http://127.0.0.1:8080");
        assert_eq!(c.timeout_secs, 1);
    }

    #[test]
    fn builder_rejects_bad_endpoint() {
        let err = FetchConfig::builder().endpoint("ftp://x").build().unwrap_err();
        assert!(matches!(err, ModelCardError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_empty_revision() {
        assert!(FetchConfig::builder().revision(" ").build().is_err());
    }

    #[test]
    fn yaml_config_overrides() {
        let yaml = r##"
hub:
  endpoint: http://localhost:9000/
  strategy: html
  timeout_secs: 5
sections:
  - name: Training Data
    required: true
metrics:
  - name: F1
    pattern: "(?i)f1[\\s:]+([0-9.]+)"
style:
  primary_color: "#112233"
"##;
        let cfg = CardConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(cfg.extraction.sections.len(), 1);
        assert!(cfg.extraction.sections[0].required);
        assert_eq!(cfg.extraction.metrics.len(), 1);
        assert_eq!(cfg.extraction.metrics[0].name, "F1");
        // images not given -> defaults kept
        assert_eq!(cfg.extraction.images.len(), 2);
        assert_eq!(cfg.style.primary_color, "#112233");

        let fetch = cfg.fetch_builder().build().unwrap();
        assert_eq!(fetch.endpoint, "http://localhost:9000");
        assert_eq!(fetch.strategy, FetchStrategy::Html);
        assert_eq!(fetch.timeout_secs, 5);
    }

    #[test]
    fn yaml_config_garbage_is_invalid_config() {
        let err = CardConfig::from_yaml_str("hub: [1, 2").unwrap_err();
        assert!(matches!(err, ModelCardError::InvalidConfig(_)));
    }

    #[test]
    fn empty_yaml_gives_defaults() {
        let cfg = CardConfig::from_yaml_str("{}").unwrap();
        assert_eq!(cfg, CardConfig::default());
    }

    #[test]
    fn strategy_display() {
        assert_eq!(FetchStrategy::Markdown.to_string(), "markdown");
    }
}
