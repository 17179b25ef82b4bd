//! What the page says, separated from how it looks.
//!
//! A [`CardPresentation`] is either derived from a [`ModelCardRecord`] with
//! fixed defaults for the parts a hub never provides (threshold guide,
//! footer), or loaded from a hand-authored JSON file with the same shape.

use crate::error::ModelCardError;
use crate::pipeline::html;
use crate::record::{ModelCardRecord, LATEST_REVISION, NOT_AVAILABLE, OVERVIEW_SECTION};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

const UNNAMED_MODEL: &str = "Unnamed Model";
const NO_OVERVIEW: &str = "No overview available";
const DETECTION_CAPTION: &str = "Example detection on underwater footage";

/// Keeps a long README intro from pushing the card onto a second page.
const MAX_SUMMARY_CHARS: usize = 700;

/// Cap for one technical-details bullet; a whole README section can land here.
const MAX_DETAIL_CHARS: usize = 200;

/// Unset fields read as [`NOT_AVAILABLE`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelDetails {
    pub version: String,
    pub release_date: String,
    pub architecture: String,
    pub input_size: String,
    pub training_data: String,
}

impl Default for ModelDetails {
    fn default() -> Self {
        Self {
            version: NOT_AVAILABLE.into(),
            release_date: NOT_AVAILABLE.into(),
            architecture: NOT_AVAILABLE.into(),
            input_size: NOT_AVAILABLE.into(),
            training_data: NOT_AVAILABLE.into(),
        }
    }
}

/// One row of the performance table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyNumber {
    pub metric: String,
    pub value: String,
    pub meaning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceThreshold {
    pub threshold: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FooterInfo {
    pub organization: String,
    pub contact_email: String,
    pub version: String,
    pub year: String,
}

impl Default for FooterInfo {
    fn default() -> Self {
        Self {
            organization: "NOAA / CIMAR".into(),
            contact_email: "michael.akridge@noaa.gov".into(),
            version: "1.0".into(),
            year: Utc::now().year().to_string(),
        }
    }
}

/// Everything printed on the card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardPresentation {
    #[serde(default = "unnamed_model")]
    pub model_name: String,
    #[serde(default)]
    pub model_details: ModelDetails,
    /// Summary paragraphs. A single string is accepted on input.
    #[serde(default = "no_overview", deserialize_with = "one_or_many")]
    pub plain_language_summary: Vec<String>,
    #[serde(default)]
    pub key_numbers: Vec<KeyNumber>,
    #[serde(default = "default_thresholds")]
    pub confidence_thresholds: Vec<ConfidenceThreshold>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disclaimer: Option<String>,
    #[serde(default = "default_caption", skip_serializing_if = "Option::is_none")]
    pub detection_caption: Option<String>,
    #[serde(default)]
    pub footer_info: FooterInfo,
}

impl CardPresentation {
    /// Derive the page content from an extracted record.
    pub fn from_record(record: &ModelCardRecord) -> Self {
        let info = &record.model_info;
        let version = if info.version == NOT_AVAILABLE {
            LATEST_REVISION.to_string()
        } else {
            info.version.clone()
        };

        let key_numbers = record
            .metrics
            .iter()
            .map(|m| KeyNumber {
                metric: m.name.clone(),
                value: m.value.to_string(),
                meaning: m.description.clone(),
            })
            .collect();

        let mut footer_info = FooterInfo::default();
        if let Some(year) = info.release_date.get(..4).filter(|y| y.bytes().all(|b| b.is_ascii_digit())) {
            footer_info.year = year.to_string();
        }

        Self {
            model_name: non_sentinel(&info.model_name).unwrap_or(UNNAMED_MODEL).to_string(),
            model_details: ModelDetails {
                version,
                release_date: info.release_date.clone(),
                architecture: detail_text(&info.architecture),
                input_size: detail_text(&info.input_size),
                training_data: detail_text(&info.training_data),
            },
            plain_language_summary: summary_paragraphs(record.section(OVERVIEW_SECTION)),
            key_numbers,
            confidence_thresholds: default_thresholds(),
            quote: None,
            disclaimer: None,
            detection_caption: default_caption(),
            footer_info,
        }
    }

    /// Load a hand-authored presentation file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ModelCardError> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ModelCardError::SnapshotNotFound {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => {
                return Err(ModelCardError::SnapshotInvalid {
                    path: path.to_path_buf(),
                    detail: e.to_string(),
                })
            }
        };
        serde_json::from_str(&text).map_err(|e| ModelCardError::SnapshotInvalid {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }
}

/// Detection thresholds and what each trades off.
pub fn default_thresholds() -> Vec<ConfidenceThreshold> {
    [
        ("0.20", "Maximum recall, more false positives"),
        ("0.50", "Balanced detection (default)"),
        ("0.80", "High precision, fewer false positives"),
    ]
    .into_iter()
    .map(|(threshold, description)| ConfidenceThreshold {
        threshold: threshold.into(),
        description: description.into(),
    })
    .collect()
}

fn unnamed_model() -> String {
    UNNAMED_MODEL.to_string()
}

fn no_overview() -> Vec<String> {
    vec![NO_OVERVIEW.to_string()]
}

fn default_caption() -> Option<String> {
    Some(DETECTION_CAPTION.to_string())
}

fn non_sentinel(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty() && s != NOT_AVAILABLE).then_some(s)
}

/// Overview text as plain paragraphs: markup stripped, `**` emphasis
/// removed, capped at [`MAX_SUMMARY_CHARS`].
fn summary_paragraphs(overview: Option<&str>) -> Vec<String> {
    let Some(overview) = overview.and_then(non_sentinel) else {
        return vec![NO_OVERVIEW.to_string()];
    };

    let mut budget = MAX_SUMMARY_CHARS;
    let mut paragraphs = Vec::new();
    for block in overview.split("\n\n") {
        let text = html::text_content(block).replace("**", "");
        if text.is_empty() {
            continue;
        }
        let len = text.chars().count();
        if len <= budget {
            budget -= len;
            paragraphs.push(text);
            continue;
        }
        paragraphs.push(truncate_words(&text, budget));
        break;
    }

    if paragraphs.is_empty() {
        paragraphs.push(NO_OVERVIEW.to_string());
    }
    paragraphs
}

/// One line of plain text, capped at [`MAX_DETAIL_CHARS`].
fn detail_text(value: &str) -> String {
    let text = html::text_content(value).replace("**", "");
    if text.is_empty() {
        return NOT_AVAILABLE.to_string();
    }
    if text.chars().count() > MAX_DETAIL_CHARS {
        return truncate_words(&text, MAX_DETAIL_CHARS);
    }
    text
}

/// Cut at the last space before `max` chars and append an ellipsis.
fn truncate_words(text: &str, max: usize) -> String {
    let cut = text.char_indices().nth(max).map_or(text.len(), |(i, _)| i);
    let head = &text[..cut];
    let head = head.rfind(' ').map_or(head, |i| &head[..i]);
    format!("{}…", head.trim_end())
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Metric;

    fn record() -> ModelCardRecord {
        let mut r = ModelCardRecord::new("akridge/fish", "akridge", "fish", "2024-11-20".into());
        r.sections.insert(
            "Overview".into(),
            "<p>Detects **fish** in grayscale video.</p>\n\nRuns on CPU.".into(),
        );
        r.metrics.push(Metric {
            name: "mAP".into(),
            value: 0.83,
            description: "Mean Average Precision at 0.5 IOU".into(),
        });
        r
    }

    #[test]
    fn derived_from_record() {
        let p = CardPresentation::from_record(&record());
        assert_eq!(p.model_name, "fish");
        assert_eq!(p.model_details.version, LATEST_REVISION);
        assert_eq!(
            p.plain_language_summary,
            vec!["Detects fish in grayscale video.", "Runs on CPU."]
        );
        assert_eq!(p.key_numbers[0].value, "0.83");
        assert_eq!(p.confidence_thresholds.len(), 3);
        assert_eq!(p.confidence_thresholds[1].threshold, "0.50");
        assert_eq!(p.footer_info.organization, "NOAA / CIMAR");
        assert_eq!(p.footer_info.year, "2024");
    }

    #[test]
    fn missing_overview_and_name() {
        let mut r = ModelCardRecord::new("a/b", "a", NOT_AVAILABLE, "N/A".into());
        r.sections.insert("Overview".into(), "   ".into());
        let p = CardPresentation::from_record(&r);
        assert_eq!(p.model_name, UNNAMED_MODEL);
        assert_eq!(p.plain_language_summary, vec![NO_OVERVIEW]);
    }

    #[test]
    fn long_overview_is_truncated() {
        let mut r = record();
        r.sections.insert("Overview".into(), "word ".repeat(400));
        let p = CardPresentation::from_record(&r);
        let text = &p.plain_language_summary[0];
        assert!(text.ends_with('…'));
        assert!(text.chars().count() <= MAX_SUMMARY_CHARS + 1);
    }

    #[test]
    fn long_training_data_is_one_capped_line() {
        let mut r = record();
        r.model_info.training_data = format!("- <b>Cruise</b> frames\n{}", "more frames ".repeat(60));
        let p = CardPresentation::from_record(&r);
        let data = &p.model_details.training_data;
        assert!(data.starts_with("- Cruise frames more"));
        assert!(!data.contains('\n'));
        assert!(data.chars().count() <= MAX_DETAIL_CHARS + 1);
    }

    #[test]
    fn hand_authored_json() {
        let json = r#"{
            "model_name": "Fish Detector",
            "model_details": {"version": "1.2", "release_date": "2025-02-01",
                "architecture": "YOLO11", "input_size": "640", "training_data": "FathomNet"},
            "plain_language_summary": "Finds fish.",
            "key_numbers": [{"metric": "mAP", "value": "0.83", "meaning": "m"}],
            "quote": "See what lives below."
        }"#;
        let p: CardPresentation = serde_json::from_str(json).unwrap();
        assert_eq!(p.plain_language_summary, vec!["Finds fish."]);
        assert_eq!(p.confidence_thresholds, default_thresholds());
        assert_eq!(p.quote.as_deref(), Some("See what lives below."));
        assert_eq!(p.detection_caption.as_deref(), Some(DETECTION_CAPTION));
    }

    #[test]
    fn sparse_json_gets_defaults() {
        let p: CardPresentation =
            serde_json::from_str(r#"{"model_details": {"version": "2.0"}}"#).unwrap();
        assert_eq!(p.model_name, UNNAMED_MODEL);
        assert_eq!(p.model_details.version, "2.0");
        assert_eq!(p.model_details.architecture, NOT_AVAILABLE);
        assert_eq!(p.plain_language_summary, vec![NO_OVERVIEW]);
        assert!(p.key_numbers.is_empty());
    }

    #[test]
    fn missing_json_file() {
        let err = CardPresentation::from_json_file("/nope/card.json").unwrap_err();
        assert!(matches!(err, ModelCardError::SnapshotNotFound { .. }));
    }
}
