//! Progress-callback trait for hub request events.
//!
//! Inject an [`Arc<dyn FetchProgressCallback>`] via
//! [`crate::config::FetchConfigBuilder::progress_callback`] to be told about
//! each request the fetcher makes. The `modelcard` binary uses this to drive
//! its terminal spinner.
//!
//! # Example
//!
//! ```rust
//! use modelcard::{FetchConfig, FetchProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     requests: AtomicUsize,
//! }
//!
//! impl FetchProgressCallback for CountingCallback {
//!     fn on_request_start(&self, url: &str) {
//!         self.requests.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("GET {url}");
//!     }
//! }
//!
//! let config = FetchConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { requests: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the fetcher around every HTTP request.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait FetchProgressCallback: Send + Sync {
    /// Called just before a request is sent.
    fn on_request_start(&self, url: &str) {
        let _ = url;
    }

    /// Called when a response body has been read.
    ///
    /// # Arguments
    /// * `status`: HTTP status code
    /// * `bytes`: body length
    fn on_request_complete(&self, url: &str, status: u16, bytes: usize) {
        let _ = (url, status, bytes);
    }

    /// Called when a request fails (transport error or non-success status).
    fn on_request_error(&self, url: &str, error: &str) {
        let _ = (url, error);
    }

    /// Called after an image resource has been written to disk.
    fn on_image_saved(&self, name: &str, path: &Path) {
        let _ = (name, path);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl FetchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::FetchConfig`].
pub type ProgressCallback = Arc<dyn FetchProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        events: Mutex<Vec<String>>,
    }

    impl FetchProgressCallback for Recording {
        fn on_request_start(&self, url: &str) {
            self.events.lock().unwrap().push(format!("start {url}"));
        }
        fn on_request_complete(&self, url: &str, status: u16, _bytes: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done {url} {status}"));
        }
    }

    #[test]
    fn noop_callback_accepts_all_events() {
        let cb = NoopProgressCallback;
        cb.on_request_start("u");
        cb.on_request_complete("u", 200, 10);
        cb.on_request_error("u", "boom");
        cb.on_image_saved("logo", Path::new("/tmp/logo.png"));
    }

    #[test]
    fn overridden_methods_are_called() {
        let rec = Arc::new(Recording::default());
        let cb: ProgressCallback = rec.clone();
        cb.on_request_start("http://hub/a/b");
        cb.on_request_complete("http://hub/a/b", 200, 5);
        cb.on_request_error("http://hub/a/b", "ignored by default impl");
        let events = rec.events.lock().unwrap();
        assert_eq!(
            *events,
            vec!["start http://hub/a/b", "done http://hub/a/b 200"]
        );
    }
}
