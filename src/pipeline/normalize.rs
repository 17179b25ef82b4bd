//! Record assembly: turn API JSON, Markdown or page HTML into a
//! [`ModelCardRecord`].
//!
//! All three paths share the same tail ([`finish`]): apply the configured
//! section list, run metric extraction over the card text, and attach the
//! configured image paths. Missing data never fails here; it becomes a
//! sentinel plus, where useful, a [`Degradation`].

use crate::config::{ExtractionConfig, SectionSpec};
use crate::error::{Degradation, ModelCardError};
use crate::pipeline::{dates, html, identifier, markdown, metrics};
use crate::record::{or_sentinel, ModelCardRecord, NOT_AVAILABLE, OVERVIEW_SECTION};
use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// A built record plus everything that was dropped on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub record: ModelCardRecord,
    pub degradations: Vec<Degradation>,
}

/// Build a record from the metadata API response, optionally enriched with
/// the README text.
///
/// Fixed sections: `Overview` (the `cardData` text, else the README intro),
/// `Model Type`, `Task`, `License`, `Downloads`. The last four are always
/// present, as [`NOT_AVAILABLE`] when the API omits them. README sections are
/// added under their own headings.
pub fn record_from_api(
    repo_id: &str,
    api: &Value,
    readme: Option<&str>,
    extraction: &ExtractionConfig,
    today: NaiveDate,
) -> Result<Extraction, ModelCardError> {
    let (author, name) = identifier::split_repo_id(repo_id)?;
    let mut degradations = Vec::new();

    let release = str_field(api, "lastModified").or_else(|| str_field(api, "createdAt"));
    let mut record = ModelCardRecord::new(repo_id, author, name, dates::normalize_date_at(release.as_deref(), today));

    if let Some(model_id) = str_field(api, "modelId").or_else(|| str_field(api, "id")) {
        record.model_info.model_name = model_id;
    }
    record.model_info.version = or_sentinel(str_field(api, "sha"));

    // README first so the API's own fields win on conflicts.
    let mut found: Vec<(String, String)> = Vec::new();
    if let Some(readme) = readme {
        let fm = markdown::parse_front_matter(readme);
        degradations.extend(fm.degradation);
        record.metadata.extend(fm.metadata);
        found.extend(markdown::split_markdown_sections(fm.body, OVERVIEW_SECTION));
    }

    let card_text = match api.get("cardData") {
        Some(Value::String(text)) => Some(text.clone()),
        Some(Value::Object(map)) => {
            for (k, v) in map {
                record.metadata.entry(k.clone()).or_insert_with(|| v.clone());
            }
            None
        }
        _ => None,
    };

    let pipeline_tag = str_field(api, "pipeline_tag")
        .or_else(|| meta_str(&record.metadata, "pipeline_tag"));
    let license = str_field(api, "license")
        .or_else(|| meta_str(&record.metadata, "license"))
        .or_else(|| license_from_tags(api));

    let mut fixed: Vec<(String, String)> = Vec::new();
    if let Some(ref text) = card_text {
        fixed.push((OVERVIEW_SECTION.to_string(), text.clone()));
    }
    fixed.push(("Model Type".to_string(), or_sentinel(pipeline_tag.clone())));
    fixed.push(("Task".to_string(), or_sentinel(str_field(api, "task"))));
    fixed.push(("License".to_string(), or_sentinel(license)));
    fixed.push((
        "Downloads".to_string(),
        or_sentinel(api.get("downloads").and_then(scalar_to_string)),
    ));

    // The cardData text leads; README sections follow in document order.
    let text = document_text(fixed.iter().chain(found.iter()));
    let mut sections = merge_sections(found);
    for (name, text) in fixed {
        sections.insert(name, text);
    }

    record.model_info.architecture = or_sentinel(pipeline_tag.or_else(|| architecture_from_config(api)));
    record.model_info.input_size = or_sentinel(
        api.pointer("/config/image_size")
            .and_then(scalar_to_string)
            .or_else(|| meta_str(&record.metadata, "image_size")),
    );

    Ok(finish(record, sections, &text, extraction, degradations))
}

/// Build a record from a raw README.
pub fn record_from_markdown(
    repo_id: &str,
    readme: &str,
    extraction: &ExtractionConfig,
    today: NaiveDate,
) -> Result<Extraction, ModelCardError> {
    let (author, name) = identifier::split_repo_id(repo_id)?;
    let mut degradations = Vec::new();

    let fm = markdown::parse_front_matter(readme);
    degradations.extend(fm.degradation.clone());

    let release = meta_str(&fm.metadata, "last_modified").or_else(|| meta_str(&fm.metadata, "date"));
    let mut record = ModelCardRecord::new(repo_id, author, name, dates::normalize_date_at(release.as_deref(), today));
    record.metadata = fm.metadata.clone();

    let mut found = markdown::split_markdown_sections(fm.body, OVERVIEW_SECTION);
    if let Some(license) = meta_str(&record.metadata, "license") {
        if !found.iter().any(|(name, _)| name == "License") {
            found.push(("License".to_string(), license));
        }
    }
    let text = document_text(found.iter());
    let sections = merge_sections(found);

    record.model_info.version = or_sentinel(meta_str(&record.metadata, "revision"));
    record.model_info.architecture = or_sentinel(meta_str(&record.metadata, "pipeline_tag"));
    record.model_info.input_size = or_sentinel(meta_str(&record.metadata, "image_size"));

    Ok(finish(record, sections, &text, extraction, degradations))
}

/// Build a record from the rendered model page.
///
/// Section values keep their markup; metrics are matched against the
/// visible text. Like/download counters land in `metadata`.
pub fn record_from_html(
    repo_id: &str,
    page: &str,
    extraction: &ExtractionConfig,
    today: NaiveDate,
) -> Result<Extraction, ModelCardError> {
    let (author, name) = identifier::split_repo_id(repo_id)?;
    let mut record = ModelCardRecord::new(repo_id, author, name, dates::normalize_date_at(None, today));

    for (key, value) in html::extract_counters(page) {
        record.metadata.insert(key, Value::String(value));
    }

    let found = html::extract_html_sections(page, OVERVIEW_SECTION).unwrap_or_default();
    let text = found
        .iter()
        .map(|(_, markup)| html::text_content(markup))
        .collect::<Vec<_>>()
        .join("\n\n");
    let sections = merge_sections(found);

    Ok(finish(record, sections, &text, extraction, Vec::new()))
}

// ── Shared tail ──────────────────────────────────────────────────────────

/// Card text in document order; metric patterns take the first match.
///
/// Sentinel values and text already present are skipped.
fn document_text<'a>(pairs: impl Iterator<Item = &'a (String, String)>) -> String {
    let mut text = String::new();
    for (_, value) in pairs {
        if value == NOT_AVAILABLE || text.contains(value.as_str()) {
            continue;
        }
        if !text.is_empty() {
            text.push_str("\n\n");
        }
        text.push_str(value);
    }
    text
}

fn finish(
    mut record: ModelCardRecord,
    found: BTreeMap<String, String>,
    text: &str,
    extraction: &ExtractionConfig,
    mut degradations: Vec<Degradation>,
) -> Extraction {
    record.sections = select_sections(found, text, &extraction.sections, &mut degradations);

    if record.model_info.training_data == NOT_AVAILABLE {
        record.model_info.training_data = or_sentinel(
            find_section(&record.sections, &["Training Data", "Dataset", "Datasets", "Training"])
                .or_else(|| datasets_from_metadata(&record.metadata)),
        );
    }

    let (found_metrics, metric_degradations) = metrics::extract_metrics(text, &extraction.metrics);
    record.metrics = found_metrics;
    degradations.extend(metric_degradations);

    for image in &extraction.images {
        record.images.insert(image.name.clone(), image.path.clone());
    }

    for d in &degradations {
        debug!("Extraction degraded: {}", d);
    }
    debug!(
        "Extracted {} sections, {} metrics for {}",
        record.sections.len(),
        record.metrics.len(),
        record.model_info.repo_id
    );

    Extraction { record, degradations }
}

/// Apply the configured section list. An empty list keeps everything found.
fn select_sections(
    found: BTreeMap<String, String>,
    text: &str,
    specs: &[SectionSpec],
    degradations: &mut Vec<Degradation>,
) -> BTreeMap<String, String> {
    if specs.is_empty() {
        return found;
    }

    let mut selected = BTreeMap::new();
    for spec in specs {
        let value = match spec.pattern {
            Some(ref pattern) => match Regex::new(pattern) {
                Ok(re) => re.captures(text).and_then(|caps| {
                    let m = caps.get(1).or_else(|| caps.get(0))?;
                    let s = m.as_str().trim();
                    (!s.is_empty()).then(|| s.to_string())
                }),
                Err(e) => {
                    degradations.push(Degradation::ParseDegradation {
                        what: format!("section pattern for '{}'", spec.name),
                        detail: e.to_string(),
                    });
                    None
                }
            },
            None => find_section(&found, &[spec.name.as_str()]),
        };

        match value {
            Some(v) => {
                selected.insert(spec.name.clone(), v);
            }
            None if spec.required => {
                warn!("Required section '{}' not found; using '{}'", spec.name, NOT_AVAILABLE);
                degradations.push(Degradation::ParseDegradation {
                    what: format!("section '{}'", spec.name),
                    detail: "not found in card".into(),
                });
                selected.insert(spec.name.clone(), NOT_AVAILABLE.to_string());
            }
            None => {}
        }
    }
    selected
}

/// Case-insensitive lookup of the first matching section name.
fn find_section(sections: &BTreeMap<String, String>, names: &[&str]) -> Option<String> {
    names.iter().find_map(|wanted| {
        sections
            .iter()
            .find(|(k, _)| k.trim().eq_ignore_ascii_case(wanted))
            .map(|(_, v)| v.clone())
    })
}

/// Collect ordered `(name, text)` pairs, joining repeated names.
fn merge_sections(pairs: Vec<(String, String)>) -> BTreeMap<String, String> {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    for (name, text) in pairs {
        map.entry(name)
            .and_modify(|existing| {
                existing.push_str("\n\n");
                existing.push_str(&text);
            })
            .or_insert_with(|| text.clone());
    }
    map
}

fn str_field(v: &Value, key: &str) -> Option<String> {
    v.get(key).and_then(Value::as_str).map(str::to_string)
}

fn meta_str(meta: &BTreeMap<String, Value>, key: &str) -> Option<String> {
    meta.get(key).and_then(scalar_to_string)
}

/// Strings as-is, numbers and booleans formatted; arrays and objects are not scalars.
fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn license_from_tags(api: &Value) -> Option<String> {
    api.get("tags")?
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .find_map(|t| t.strip_prefix("license:").map(str::to_string))
}

fn architecture_from_config(api: &Value) -> Option<String> {
    api.pointer("/config/architectures/0")
        .and_then(Value::as_str)
        .or_else(|| api.pointer("/config/model_type").and_then(Value::as_str))
        .map(str::to_string)
}

fn datasets_from_metadata(meta: &BTreeMap<String, Value>) -> Option<String> {
    match meta.get("datasets")? {
        Value::Array(items) => {
            let names: Vec<String> = items.iter().filter_map(scalar_to_string).collect();
            (!names.is_empty()).then(|| names.join(", "))
        }
        other => scalar_to_string(other),
    }
}
