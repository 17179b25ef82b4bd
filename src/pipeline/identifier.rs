//! Model identifier resolution: bare `<author>/<model>` ids or hub page URLs.

use crate::error::ModelCardError;
use tracing::debug;

/// Path segment that prefixes model ids in `host/models/org/model` URLs.
const MODELS_SEGMENT: &str = "models";

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Turn a bare identifier or a hub URL into a repository id.
///
/// * `org/model` is returned unchanged.
/// * `https://host/org/model` → `org/model`.
/// * `https://host/models/org/model` → `org/model` (everything up to and
///   including the `models` segment is dropped).
///
/// # Errors
/// [`ModelCardError::InvalidIdentifier`] when the result is empty or the URL
/// cannot be parsed.
pub fn resolve_repo_id(input: &str) -> Result<String, ModelCardError> {
    let trimmed = input.trim();

    let repo_id = if is_url(trimmed) {
        let url = reqwest::Url::parse(trimmed)
            .map_err(|_| ModelCardError::invalid_identifier(input))?;
        let path = url.path().trim_matches('/');
        let parts: Vec<&str> = path.split('/').collect();
        match parts.iter().position(|p| *p == MODELS_SEGMENT) {
            Some(idx) => parts[idx + 1..].join("/"),
            None => path.to_string(),
        }
    } else {
        trimmed.trim_matches('/').to_string()
    };

    if repo_id.is_empty() {
        return Err(ModelCardError::invalid_identifier(input));
    }
    debug!("Resolved '{}' to repo id '{}'", input, repo_id);
    Ok(repo_id)
}

/// Split `<author>/<model>` into its two halves.
///
/// Ids with zero or several separators, or an empty half, are rejected
/// rather than guessed at.
pub fn split_repo_id(repo_id: &str) -> Result<(&str, &str), ModelCardError> {
    match repo_id.split_once('/') {
        Some((author, model)) if !author.is_empty() && !model.is_empty() && !model.contains('/') => {
            Ok((author, model))
        }
        _ => Err(ModelCardError::invalid_identifier(repo_id)),
    }
}
