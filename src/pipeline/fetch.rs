//! Hub access: metadata API, raw README, rendered page and image resources.
//!
//! One [`HubClient`] wraps one `reqwest::Client` and is used sequentially for
//! the whole invocation. No request is retried.
//!
//! Failure policy, applied at every call site:
//!
//! | Call | Non-success status |
//! |------|--------------------|
//! | [`HubClient::fetch_api_metadata`] | `Err(FetchError)` |
//! | [`HubClient::fetch_rendered_page`] | `Err(FetchError)`, also when `article.prose` is missing |
//! | [`HubClient::fetch_readme_text`] | `None` |
//! | [`HubClient::download_images`] | image skipped, `MissingAsset` recorded |

use crate::config::{FetchConfig, ImageSpec};
use crate::error::{Degradation, ModelCardError};
use crate::pipeline::html;
use crate::progress::ProgressCallback;
use futures::StreamExt;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Images written by [`HubClient::download_images`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DownloadReport {
    /// Logical image name → local file.
    pub saved: BTreeMap<String, PathBuf>,
    /// Images that could not be fetched.
    pub degradations: Vec<Degradation>,
}

/// HTTP access to one model hub.
pub struct HubClient {
    client: reqwest::Client,
    endpoint: String,
    revision: String,
    timeout_secs: u64,
    progress: Option<ProgressCallback>,
}

impl HubClient {
    /// Build a client from the fetch configuration.
    pub fn new(config: &FetchConfig) -> Result<Self, ModelCardError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ModelCardError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            revision: config.revision.clone(),
            timeout_secs: config.timeout_secs,
            progress: config.progress_callback.clone(),
        })
    }

    /// `{endpoint}/api/models/{repo_id}`
    pub fn api_url(&self, repo_id: &str) -> String {
        format!("{}/api/models/{}", self.endpoint, repo_id)
    }

    /// `{endpoint}/{repo_id}/raw/{revision}/README.md`
    pub fn readme_url(&self, repo_id: &str) -> String {
        format!("{}/{}/raw/{}/README.md", self.endpoint, repo_id, self.revision)
    }

    /// `{endpoint}/{repo_id}`
    pub fn page_url(&self, repo_id: &str) -> String {
        format!("{}/{}", self.endpoint, repo_id)
    }

    /// `{endpoint}/{repo_id}/resolve/{revision}/{path}`
    pub fn resource_url(&self, repo_id: &str, path: &str) -> String {
        format!(
            "{}/{}/resolve/{}/{}",
            self.endpoint,
            repo_id,
            self.revision,
            path.trim_start_matches('/')
        )
    }

    /// Fetch the model's metadata document from the JSON API.
    ///
    /// # Errors
    /// [`ModelCardError::FetchError`] on a non-success status or a body that
    /// is not JSON; [`ModelCardError::FetchTimeout`] when the request times out.
    pub async fn fetch_api_metadata(&self, repo_id: &str) -> Result<serde_json::Value, ModelCardError> {
        let url = self.api_url(repo_id);
        info!("Fetching model metadata from {}", url);
        let body = self.get_text(&url).await?;
        serde_json::from_str(&body).map_err(|e| {
            self.report_error(&url, &e.to_string());
            ModelCardError::FetchError {
                url,
                reason: format!("response is not JSON: {e}"),
            }
        })
    }

    /// Fetch the raw README. Best-effort: any failure yields `None`.
    pub async fn fetch_readme_text(&self, repo_id: &str) -> Option<String> {
        let url = self.readme_url(repo_id);
        match self.get_text(&url).await {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => None,
            Err(e) => {
                debug!("README unavailable: {}", e);
                None
            }
        }
    }

    /// Fetch the rendered model page and check it has the card container.
    ///
    /// # Errors
    /// [`ModelCardError::FetchError`] on a non-success status or when the
    /// page has no `article.prose` element.
    pub async fn fetch_rendered_page(&self, repo_id: &str) -> Result<String, ModelCardError> {
        let url = self.page_url(repo_id);
        info!("Fetching model page from {}", url);
        let page = self.get_text(&url).await?;
        if !html::has_content_container(&page) {
            let reason = "could not find model card content (no <article class=\"prose\">)";
            self.report_error(&url, reason);
            return Err(ModelCardError::FetchError {
                url,
                reason: reason.to_string(),
            });
        }
        Ok(page)
    }

    /// Download each image resource into `out_dir`, named after the last
    /// component of its repository path.
    ///
    /// Failures are recorded in the report and never abort the run, except
    /// failing to create `out_dir` itself.
    pub async fn download_images(
        &self,
        repo_id: &str,
        images: &[ImageSpec],
        out_dir: &Path,
    ) -> Result<DownloadReport, ModelCardError> {
        tokio::fs::create_dir_all(out_dir)
            .await
            .map_err(|e| ModelCardError::OutputWriteFailed {
                path: out_dir.to_path_buf(),
                source: e,
            })?;

        let mut report = DownloadReport::default();
        for image in images {
            let url = self.resource_url(repo_id, &image.path);
            let file_name = Path::new(&image.path)
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| image.name.clone().into());
            let dest = out_dir.join(file_name);

            match self.download_to(&url, &dest).await {
                Ok(bytes) => {
                    info!("Saved {} ({} bytes) to {}", image.name, bytes, dest.display());
                    if let Some(ref cb) = self.progress {
                        cb.on_image_saved(&image.name, &dest);
                    }
                    report.saved.insert(image.name.clone(), dest);
                }
                Err(e) => {
                    warn!("Could not download image '{}': {}", image.name, e);
                    report.degradations.push(Degradation::MissingAsset {
                        name: image.name.clone(),
                        path: url,
                    });
                }
            }
        }
        Ok(report)
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    async fn send(&self, url: &str) -> Result<reqwest::Response, ModelCardError> {
        if let Some(ref cb) = self.progress {
            cb.on_request_start(url);
        }
        debug!("GET {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            self.report_error(url, &e.to_string());
            if e.is_timeout() {
                ModelCardError::FetchTimeout {
                    url: url.to_string(),
                    secs: self.timeout_secs,
                }
            } else {
                ModelCardError::FetchError {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let reason = format!("HTTP {status}");
            self.report_error(url, &reason);
            return Err(ModelCardError::FetchError {
                url: url.to_string(),
                reason,
            });
        }
        Ok(response)
    }

    async fn get_text(&self, url: &str) -> Result<String, ModelCardError> {
        let response = self.send(url).await?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| {
            self.report_error(url, &e.to_string());
            ModelCardError::FetchError {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;
        if let Some(ref cb) = self.progress {
            cb.on_request_complete(url, status, text.len());
        }
        Ok(text)
    }

    async fn download_to(&self, url: &str, dest: &Path) -> Result<usize, ModelCardError> {
        let response = self.send(url).await?;
        let status = response.status().as_u16();
        let write_err = |e: std::io::Error| ModelCardError::OutputWriteFailed {
            path: dest.to_path_buf(),
            source: e,
        };

        let mut file = tokio::fs::File::create(dest).await.map_err(write_err)?;
        let mut stream = response.bytes_stream();
        let mut written = 0usize;
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => {
                    drop(file);
                    tokio::fs::remove_file(dest).await.ok();
                    self.report_error(url, &e.to_string());
                    return Err(ModelCardError::FetchError {
                        url: url.to_string(),
                        reason: e.to_string(),
                    });
                }
            };
            file.write_all(&chunk).await.map_err(write_err)?;
            written += chunk.len();
        }
        file.flush().await.map_err(write_err)?;

        if let Some(ref cb) = self.progress {
            cb.on_request_complete(url, status, written);
        }
        Ok(written)
    }

    fn report_error(&self, url: &str, error: &str) {
        if let Some(ref cb) = self.progress {
            cb.on_request_error(url, error);
        }
    }
}
