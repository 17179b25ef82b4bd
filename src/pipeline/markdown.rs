//! Markdown card parsing: YAML front matter and level-2 sections.
//!
//! A hub README looks like:
//!
//! ```text
//! ---
//! license: agpl-3.0
//! pipeline_tag: object-detection
//! ---
//! Intro paragraph…            ← "Overview"
//! ## Training Data            ← section name
//! 4,000 grayscale frames…     ← section text
//! ```

use crate::error::Degradation;
use std::collections::BTreeMap;

const DELIMITER: &str = "---";

/// Result of splitting a document into front matter and body.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter<'a> {
    /// Top-level keys of the YAML block. Empty when absent or unparsable.
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Everything after the closing delimiter (or the whole input).
    pub body: &'a str,
    /// Set when a block was present but could not be used.
    pub degradation: Option<Degradation>,
}

/// Split off and parse a leading `---` YAML block.
///
/// Parse failures yield an empty map plus a [`Degradation`]; they never
/// propagate as errors.
pub fn parse_front_matter(content: &str) -> FrontMatter<'_> {
    let text = content.strip_prefix('\u{FEFF}').unwrap_or(content);
    let no_front_matter = FrontMatter {
        metadata: BTreeMap::new(),
        body: text,
        degradation: None,
    };

    let Some(first_end) = text.find('\n') else {
        return no_front_matter;
    };
    if text[..first_end].trim_end() != DELIMITER {
        return no_front_matter;
    }

    // Find the closing delimiter line.
    let mut offset = first_end + 1;
    let mut close = None;
    while offset <= text.len() {
        let line_end = text[offset..].find('\n').map_or(text.len(), |i| offset + i);
        if text[offset..line_end].trim_end() == DELIMITER {
            close = Some((offset, (line_end + 1).min(text.len())));
            break;
        }
        if line_end >= text.len() {
            break;
        }
        offset = line_end + 1;
    }

    let Some((block_end, body_start)) = close else {
        return FrontMatter {
            degradation: Some(Degradation::ParseDegradation {
                what: "front matter".into(),
                detail: "missing closing '---' line".into(),
            }),
            ..no_front_matter
        };
    };

    let block = &text[first_end + 1..block_end];
    let body = &text[body_start..];
    match parse_yaml_map(block) {
        Ok(metadata) => FrontMatter {
            metadata,
            body,
            degradation: None,
        },
        Err(detail) => FrontMatter {
            metadata: BTreeMap::new(),
            body,
            degradation: Some(Degradation::ParseDegradation {
                what: "front matter".into(),
                detail,
            }),
        },
    }
}

fn parse_yaml_map(block: &str) -> Result<BTreeMap<String, serde_json::Value>, String> {
    if block.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let yaml: serde_yaml::Value = serde_yaml::from_str(block).map_err(|e| e.to_string())?;
    match serde_json::to_value(yaml).map_err(|e| e.to_string())? {
        serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(format!("expected a mapping, got {other}")),
    }
}

/// Split a Markdown body on level-2 headings.
///
/// Text before the first heading becomes `overview_name`. Headings inside
/// fenced code blocks are ignored. Sections whose trimmed text is empty are
/// dropped. Order follows the document.
pub fn split_markdown_sections(body: &str, overview_name: &str) -> Vec<(String, String)> {
    let mut sections = Vec::new();
    let mut current_name = overview_name.to_string();
    let mut current: Vec<&str> = Vec::new();
    let mut in_fence = false;

    for line in body.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
        }
        if !in_fence {
            if let Some(title) = level2_heading(line) {
                push_section(&mut sections, &current_name, &current);
                current_name = title;
                current.clear();
                continue;
            }
        }
        current.push(line);
    }
    push_section(&mut sections, &current_name, &current);
    sections
}

fn level2_heading(line: &str) -> Option<String> {
    let rest = line.strip_prefix("## ")?;
    let title = rest.trim().trim_end_matches('#').trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

fn push_section(sections: &mut Vec<(String, String)>, name: &str, lines: &[&str]) {
    let text = lines.join("\n");
    let text = text.trim();
    if !text.is_empty() {
        sections.push((name.to_string(), text.to_string()));
    }
}
