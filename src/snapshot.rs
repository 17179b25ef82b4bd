//! JSON snapshot persistence for [`ModelCardRecord`].
//!
//! A snapshot is the hand-off point between the fetch step and the render
//! step: `modelcard --url` writes one, `modelcard --data` reads one back.
//!
//! ## Format
//!
//! Pretty-printed JSON with two-space indentation. Non-ASCII text is written
//! as-is (no `\u` escapes). Map keys are sorted and struct fields keep their
//! declaration order, so re-fetching an unchanged model yields a byte-identical
//! file.
//!
//! ## Legacy snapshots
//!
//! Older fetch scripts wrote a looser shape: `metrics` nested inside
//! `model_info` as a name → number map, numeric section values, and counters
//! such as `likes` mixed into `model_info`. [`load_snapshot`] accepts both.

use crate::config::default_metrics;
use crate::error::ModelCardError;
use crate::pipeline::dates;
use crate::record::{ModelCardRecord, Metric, ModelInfo, NOT_AVAILABLE};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Write `record` to `path` atomically (temp file in the same directory, then
/// rename). Parent directories are created as needed.
pub fn save_snapshot(record: &ModelCardRecord, path: impl AsRef<Path>) -> Result<(), ModelCardError> {
    let path = path.as_ref();
    let write_err = |source: std::io::Error| ModelCardError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let json = serde_json::to_string_pretty(record)
        .map_err(|e| ModelCardError::Internal(format!("snapshot serialisation: {e}")))?;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(json.as_bytes()).map_err(write_err)?;
    tmp.write_all(b"\n").map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    info!("Saved model data to {}", path.display());
    Ok(())
}

/// Read a snapshot back.
///
/// # Errors
/// - [`ModelCardError::SnapshotNotFound`] when `path` does not exist
/// - [`ModelCardError::SnapshotInvalid`] when it is not JSON or lacks
///   `model_info` / `sections`
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<ModelCardRecord, ModelCardError> {
    let path = path.as_ref();
    let invalid = |detail: String| ModelCardError::SnapshotInvalid {
        path: path.to_path_buf(),
        detail,
    };

    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ModelCardError::SnapshotNotFound {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(invalid(e.to_string())),
    };

    let value: Value = serde_json::from_str(&text).map_err(|e| invalid(e.to_string()))?;
    let root = value
        .as_object()
        .ok_or_else(|| invalid("top level is not an object".into()))?;
    if !root.get("model_info").is_some_and(Value::is_object) {
        return Err(invalid("missing 'model_info' object".into()));
    }
    if !root.get("sections").is_some_and(Value::is_object) {
        return Err(invalid("missing 'sections' object".into()));
    }

    match serde_json::from_value::<ModelCardRecord>(value.clone()) {
        Ok(record) => Ok(record),
        Err(e) => {
            debug!("Not a current snapshot ({e}); reading legacy layout");
            Ok(from_legacy(root))
        }
    }
}

// ── Legacy layout ────────────────────────────────────────────────────────

fn from_legacy(root: &Map<String, Value>) -> ModelCardRecord {
    let empty = Map::new();
    let mut mi = root
        .get("model_info")
        .and_then(Value::as_object)
        .unwrap_or(&empty)
        .clone();

    let legacy_metrics = mi.remove("metrics");
    let mut take = |key: &str| mi.remove(key).as_ref().and_then(scalar_text);

    let model_name = take("model_name");
    let author = take("author");
    let repo_id = take("repo_id")
        .or_else(|| {
            // The API fetcher stored the full `author/model` id as the name.
            model_name.as_ref().filter(|n| n.contains('/')).cloned()
        })
        .or_else(|| match (&author, &model_name) {
            (Some(a), Some(m)) => Some(format!("{a}/{m}")),
            _ => None,
        })
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let author = author
        .or_else(|| repo_id.split_once('/').map(|(a, _)| a.to_string()))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let release_date = take("release_date")
        .map(|raw| match dates::parse_timestamp(&raw) {
            Some(d) => d.format("%Y-%m-%d").to_string(),
            None => raw,
        })
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let model_info = ModelInfo {
        model_name: model_name.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        author,
        version: take("version").unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        release_date,
        architecture: take("architecture").unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        input_size: take("input_size").unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        training_data: take("training_data").unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        repo_id,
    };

    // Whatever is left (likes, downloads, ...) is page metadata.
    let mut metadata: BTreeMap<String, Value> = mi.into_iter().collect();
    if let Some(Value::Object(extra)) = root.get("metadata") {
        metadata.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    let sections = root
        .get("sections")
        .and_then(Value::as_object)
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| scalar_text(v).map(|t| (k.clone(), t)))
                .collect()
        })
        .unwrap_or_default();

    let metrics = root
        .get("metrics")
        .or(legacy_metrics.as_ref())
        .map(legacy_metric_list)
        .unwrap_or_default();

    let images = root
        .get("images")
        .and_then(Value::as_object)
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default();

    ModelCardRecord {
        model_info,
        sections,
        metrics,
        metadata,
        images,
    }
}

/// Non-empty string or stringified number/bool; `null`, `""` and containers
/// yield `None`.
fn scalar_text(v: &Value) -> Option<String> {
    let s = match v {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

/// `{"mAP": 0.83, "Recall": null}` or `[{"name": .., "value": ..}]`.
fn legacy_metric_list(v: &Value) -> Vec<Metric> {
    let describe = |name: &str| {
        default_metrics()
            .into_iter()
            .find(|m| m.name == name)
            .map(|m| m.description)
            .unwrap_or_default()
    };
    let numeric = |v: &Value| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };

    let mut out: Vec<Metric> = Vec::new();
    let mut push = |name: &str, value: f64, description: Option<&str>| {
        if out.iter().any(|m| m.name == name) {
            return;
        }
        out.push(Metric {
            name: name.to_string(),
            value,
            description: description.map(str::to_string).unwrap_or_else(|| describe(name)),
        });
    };

    match v {
        Value::Object(map) => {
            for (name, raw) in map {
                if let Some(value) = numeric(raw) {
                    push(name, value, None);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                let name = item.get("name").and_then(Value::as_str);
                let value = item.get("value").and_then(numeric);
                if let (Some(name), Some(value)) = (name, value) {
                    push(name, value, item.get("description").and_then(Value::as_str));
                }
            }
        }
        _ => {}
    }
    out
}
