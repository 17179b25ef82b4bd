//! Rendered model page scraping.
//!
//! The hub renders the card inside `<article class="prose …">`. Sections are
//! recovered by walking the article's top-level children in document order:
//! an `<h2>` starts a new section, every other element child is appended to
//! the current one as markup. Text nodes between children are skipped.
//!
//! This is a small tag scanner, not a full HTML parser. It keeps a stack of
//! open elements fed by a regex tokenizer, treats void elements as
//! self-closing, closes paragraphs implicitly and skips over
//! `<script>`/`<style>` bodies.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static RE_ARTICLE_OPEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<article\b[^>]*\bclass\s*=\s*["'][^"']*\bprose\b[^"']*["'][^>]*>"#).unwrap()
});

static RE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<!--.*?-->|<(/?)([a-zA-Z][a-zA-Z0-9-]*)\b[^>]*?(/?)>").unwrap()
});

static RE_STRIP_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->|<[^>]*>").unwrap());

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static RE_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").unwrap());

static RE_COUNTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)aria-label\s*=\s*["'](like|download)s?\s+([0-9][0-9.,]*[kKmM]?)\s+times["']"#)
        .unwrap()
});

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Start tags that close an open paragraph.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "div", "dl", "fieldset", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "main", "nav",
    "ol", "p", "pre", "section", "table", "ul",
];

/// A top-level element inside the content container.
#[derive(Debug, Clone, PartialEq)]
pub struct Child<'a> {
    /// Lower-cased tag name.
    pub name: String,
    /// Outer markup of the element.
    pub html: &'a str,
}

/// Whether the page has the `article.prose` content container.
pub fn has_content_container(html: &str) -> bool {
    RE_ARTICLE_OPEN.is_match(html)
}

/// Top-level element children of the `article.prose` container, in order.
///
/// The walk ends at the `</article>` matching the container; nested articles
/// are ordinary children. An open `<p>` is closed implicitly by the next
/// block-level start tag or by the end of its parent.
///
/// Returns `None` when the container is missing.
pub fn article_children(html: &str) -> Option<Vec<Child<'_>>> {
    let open = RE_ARTICLE_OPEN.find(html)?;
    let mut children = Vec::new();
    // Open elements below the container; `open_tags[0]` is the current child.
    let mut open_tags: Vec<String> = Vec::new();
    let mut child_start = 0usize;
    let mut pos = open.end();
    let mut container_end = html.len();

    while let Some(caps) = RE_TAG.captures_at(html, pos) {
        let whole = caps.get(0)?;
        pos = whole.end();

        let Some(name) = caps.get(2) else {
            continue; // comment
        };
        let name = name.as_str().to_ascii_lowercase();
        let closing = caps.get(1).is_some_and(|m| m.as_str() == "/");
        let self_closing =
            caps.get(3).is_some_and(|m| m.as_str() == "/") || VOID_ELEMENTS.contains(&name.as_str());

        if closing {
            match open_tags.iter().rposition(|t| *t == name) {
                Some(at) => {
                    if at == 0 {
                        push_child(&mut children, &open_tags[0], html, child_start, whole.end());
                    }
                    open_tags.truncate(at);
                }
                None if name == "article" => {
                    container_end = whole.start();
                    break;
                }
                None => {} // stray close tag
            }
            continue;
        }

        if BLOCK_ELEMENTS.contains(&name.as_str()) {
            if let Some(at) = open_tags.iter().rposition(|t| t == "p") {
                if at == 0 {
                    push_child(&mut children, &open_tags[0], html, child_start, whole.start());
                }
                open_tags.truncate(at);
            }
        }

        if RAW_TEXT_ELEMENTS.contains(&name.as_str()) && !self_closing {
            let close = format!("</{name}");
            let end = html[pos..]
                .to_ascii_lowercase()
                .find(&close)
                .and_then(|i| html[pos + i..].find('>').map(|j| pos + i + j + 1))
                .unwrap_or(html.len());
            if open_tags.is_empty() {
                push_child(&mut children, &name, html, whole.start(), end);
            }
            pos = end;
            continue;
        }

        if self_closing {
            if open_tags.is_empty() {
                push_child(&mut children, &name, html, whole.start(), whole.end());
            }
            continue;
        }

        if open_tags.is_empty() {
            child_start = whole.start();
        }
        open_tags.push(name);
    }

    if let Some(first) = open_tags.first() {
        push_child(&mut children, first, html, child_start, container_end);
    }
    Some(children)
}

fn push_child<'a>(children: &mut Vec<Child<'a>>, name: &str, html: &'a str, start: usize, end: usize) {
    children.push(Child {
        name: name.to_string(),
        html: html[start..end].trim_end(),
    });
}

/// Split the card article into named sections.
///
/// Markup before the first `<h2>` becomes `overview_name`. A section with no
/// element content is dropped. Returns `None` when the container is missing.
pub fn extract_html_sections(html: &str, overview_name: &str) -> Option<Vec<(String, String)>> {
    let children = article_children(html)?;
    let mut sections = Vec::new();
    let mut current_name = overview_name.to_string();
    let mut current: Vec<&str> = Vec::new();

    for child in children {
        if child.name == "h2" {
            if !current.is_empty() {
                sections.push((current_name.clone(), current.join("\n")));
            }
            current_name = text_content(child.html);
            current.clear();
        } else if !RAW_TEXT_ELEMENTS.contains(&child.name.as_str()) {
            current.push(child.html);
        }
    }
    if !current.is_empty() {
        sections.push((current_name, current.join("\n")));
    }
    Some(sections)
}

/// Visible text of a markup fragment with entities decoded and whitespace
/// collapsed.
pub fn text_content(fragment: &str) -> String {
    let stripped = RE_STRIP_TAGS.replace_all(fragment, " ");
    let decoded = decode_entities(&stripped);
    RE_WS.replace_all(decoded.trim(), " ").to_string()
}

/// Decode the handful of entities the hub emits, plus numeric references.
pub fn decode_entities(input: &str) -> String {
    RE_ENTITY
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match body {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{00A0}'),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .to_string()
}

/// Like and download counters from the page's `aria-label` buttons.
///
/// Keys are `likes` and `downloads`; values are kept as displayed (`1.2k`).
pub fn extract_counters(html: &str) -> BTreeMap<String, String> {
    let mut counters = BTreeMap::new();
    for caps in RE_COUNTER.captures_iter(html) {
        let key = match caps[1].to_ascii_lowercase().as_str() {
            "like" => "likes",
            _ => "downloads",
        };
        counters
            .entry(key.to_string())
            .or_insert_with(|| caps[2].to_string());
    }
    counters
}
