//! Fetch-side integration tests against a local stub hub.
//!
//! The stub is a plain `tokio::net::TcpListener` that answers one request
//! per connection from a fixed route table, so these tests need no network
//! access.

use modelcard::pipeline::fetch::HubClient;
use modelcard::{
    download_card_images, fetch_card, fetch_card_to_file, load_snapshot, Degradation, FetchConfig,
    FetchProgressCallback, FetchStrategy, ModelCardError, NOT_AVAILABLE,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

// ── Stub hub ─────────────────────────────────────────────────────────────────

const REPO: &str = "akridge/yolo11-fish-detector-grayscale";

const API_JSON: &str = r#"{
  "modelId": "akridge/yolo11-fish-detector-grayscale",
  "sha": "9f1c2ab",
  "lastModified": "2024-11-20T18:02:11.000Z",
  "pipeline_tag": "object-detection",
  "downloads": 321,
  "tags": ["ultralytics", "license:agpl-3.0"],
  "cardData": "mAP@0.5: 0.83 Precision: 0.91 Recall: 0.77"
}"#;

const README: &str = "---
license: agpl-3.0
datasets:
  - noaa/fish-frames
---
YOLO11 detector for fish in grayscale underwater video.

## Training Data
4,000 labelled frames from 12 survey cruises.

## Evaluation
Precision: 0.88
Recall 0.79
";

const PAGE: &str = r#"<html><body>
<button aria-label="Like 7 times">7</button>
<button aria-label="Download 1.2k times">dl</button>
<article class="prose">
<p>YOLO11 detector for fish.</p>
<h2>Results</h2>
<p>mAP@0.5: 0.62</p>
</article>
</body></html>"#;

struct Route {
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
    delay: Option<Duration>,
}

fn route(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Route {
    Route {
        status,
        content_type,
        body: body.into(),
        delay: None,
    }
}

struct StubHub {
    endpoint: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubHub {
    async fn start(routes: HashMap<String, Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        let routes = Arc::new(routes);
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let routes = Arc::clone(&routes);
                let seen = Arc::clone(&seen);
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => buf.extend_from_slice(&chunk[..n]),
                        }
                    }
                    let head = String::from_utf8_lossy(&buf);
                    let path = head
                        .lines()
                        .next()
                        .and_then(|l| l.split_whitespace().nth(1))
                        .unwrap_or("/")
                        .to_string();
                    seen.lock().unwrap().push(path.clone());

                    let not_found = route(404, "text/plain", "Not Found");
                    let r = routes.get(&path).unwrap_or(&not_found);
                    if let Some(delay) = r.delay {
                        tokio::time::sleep(delay).await;
                    }
                    let header = format!(
                        "HTTP/1.1 {} X\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        r.status,
                        r.content_type,
                        r.body.len()
                    );
                    let _ = socket.write_all(header.as_bytes()).await;
                    let _ = socket.write_all(&r.body).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self { endpoint, requests }
    }

    fn requested(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn config(&self, strategy: FetchStrategy) -> FetchConfig {
        FetchConfig::builder()
            .endpoint(self.endpoint.clone())
            .strategy(strategy)
            .timeout_secs(5)
            .build()
            .unwrap()
    }
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(8, 8, image::Rgb([0, 92, 185]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

fn full_routes() -> HashMap<String, Route> {
    let mut routes = HashMap::new();
    routes.insert(format!("/api/models/{REPO}"), route(200, "application/json", API_JSON));
    routes.insert(format!("/{REPO}/raw/main/README.md"), route(200, "text/plain", README));
    routes.insert(format!("/{REPO}"), route(200, "text/html", PAGE));
    routes.insert(
        format!("/{REPO}/resolve/main/example_detection.png"),
        route(200, "image/png", png_bytes()),
    );
    routes
}

// ── API strategy ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn api_strategy_end_to_end() {
    let hub = StubHub::start(full_routes()).await;
    let url = format!("https://huggingface.co/models/{REPO}");
    let out = fetch_card(&url, &hub.config(FetchStrategy::Api)).await.unwrap();
    let r = &out.record;

    assert_eq!(r.model_info.repo_id, REPO);
    assert_eq!(r.model_info.model_name, REPO);
    assert_eq!(r.model_info.author, "akridge");
    assert_eq!(r.model_info.version, "9f1c2ab");
    assert_eq!(r.model_info.release_date, "2024-11-20");
    assert_eq!(r.model_info.architecture, "object-detection");
    assert_eq!(r.model_info.input_size, NOT_AVAILABLE);
    assert_eq!(
        r.model_info.training_data,
        "4,000 labelled frames from 12 survey cruises."
    );

    // cardData text wins over the README for the overview.
    assert_eq!(r.section("Overview"), Some("mAP@0.5: 0.83 Precision: 0.91 Recall: 0.77"));
    assert_eq!(r.section("Model Type"), Some("object-detection"));
    assert_eq!(r.section("License"), Some("agpl-3.0"));
    assert_eq!(r.section("Downloads"), Some("321"));
    assert!(r.section("Evaluation").is_some());

    // cardData is matched before the README's own Evaluation numbers.
    assert_eq!(r.metric("mAP").map(|m| m.value), Some(0.83));
    assert_eq!(r.metric("Precision").map(|m| m.value), Some(0.91));
    assert_eq!(r.metric("Recall").map(|m| m.value), Some(0.77));
    assert_eq!(r.metadata["datasets"], serde_json::json!(["noaa/fish-frames"]));

    assert_eq!(
        hub.requested(),
        vec![format!("/api/models/{REPO}"), format!("/{REPO}/raw/main/README.md")]
    );
}

#[tokio::test]
async fn api_scenario_without_readme() {
    let hub = StubHub::start(full_routes()).await;
    let config = FetchConfig::builder()
        .endpoint(hub.endpoint.clone())
        .include_readme(false)
        .build()
        .unwrap();
    let out = fetch_card(REPO, &config).await.unwrap();
    let values: Vec<(&str, f64)> = out
        .record
        .metrics
        .iter()
        .map(|m| (m.name.as_str(), m.value))
        .collect();
    assert_eq!(values, vec![("mAP", 0.83), ("Precision", 0.91), ("Recall", 0.77)]);
    assert_eq!(hub.requested().len(), 1);
}

#[tokio::test]
async fn api_404_is_fetch_error() {
    let hub = StubHub::start(HashMap::new()).await;
    let err = fetch_card("nobody/nothing", &hub.config(FetchStrategy::Api))
        .await
        .unwrap_err();
    match err {
        ModelCardError::FetchError { url, reason } => {
            assert!(url.ends_with("/api/models/nobody/nothing"), "got {url}");
            assert!(reason.contains("404"), "got {reason}");
        }
        other => panic!("expected FetchError, got {other:?}"),
    }
}

#[tokio::test]
async fn api_non_json_is_fetch_error() {
    let mut routes = HashMap::new();
    routes.insert("/api/models/a/b".to_string(), route(200, "text/html", "<html>"));
    let hub = StubHub::start(routes).await;
    let err = fetch_card("a/b", &hub.config(FetchStrategy::Api)).await.unwrap_err();
    assert!(matches!(err, ModelCardError::FetchError { .. }));
}

#[tokio::test]
async fn slow_hub_times_out() {
    let mut routes = HashMap::new();
    routes.insert(
        "/api/models/slow/model".to_string(),
        Route {
            delay: Some(Duration::from_secs(3)),
            ..route(200, "application/json", "{}")
        },
    );
    let hub = StubHub::start(routes).await;
    let config = FetchConfig::builder()
        .endpoint(hub.endpoint.clone())
        .timeout_secs(1)
        .build()
        .unwrap();
    let err = fetch_card("slow/model", &config).await.unwrap_err();
    assert!(
        matches!(err, ModelCardError::FetchTimeout { secs: 1, .. }),
        "got {err:?}"
    );
}

// ── Markdown strategy ────────────────────────────────────────────────────────

#[tokio::test]
async fn markdown_strategy() {
    let hub = StubHub::start(full_routes()).await;
    let out = fetch_card(REPO, &hub.config(FetchStrategy::Markdown)).await.unwrap();
    let r = &out.record;

    assert_eq!(r.model_info.model_name, "yolo11-fish-detector-grayscale");
    assert_eq!(
        r.section("Overview"),
        Some("YOLO11 detector for fish in grayscale underwater video.")
    );
    assert_eq!(r.section("License"), Some("agpl-3.0"));
    assert_eq!(r.metric("Precision").map(|m| m.value), Some(0.88));
    assert_eq!(r.metric("Recall").map(|m| m.value), Some(0.79));
    assert!(r.metric("mAP").is_none());
    assert!(out.degradations.is_empty());
}

#[tokio::test]
async fn readme_absent_is_none() {
    let hub = StubHub::start(HashMap::new()).await;
    let client = HubClient::new(&hub.config(FetchStrategy::Markdown)).unwrap();
    assert!(client.fetch_readme_text("a/b").await.is_none());

    let err = fetch_card("a/b", &hub.config(FetchStrategy::Markdown))
        .await
        .unwrap_err();
    assert!(matches!(err, ModelCardError::FetchError { .. }));
}

// ── HTML strategy ────────────────────────────────────────────────────────────

#[tokio::test]
async fn html_strategy() {
    let hub = StubHub::start(full_routes()).await;
    let out = fetch_card(REPO, &hub.config(FetchStrategy::Html)).await.unwrap();
    let r = &out.record;

    assert_eq!(r.section("Overview"), Some("<p>YOLO11 detector for fish.</p>"));
    assert_eq!(r.section("Results"), Some("<p>mAP@0.5: 0.62</p>"));
    assert_eq!(r.metric("mAP").map(|m| m.value), Some(0.62));
    assert_eq!(r.metadata["likes"], serde_json::json!("7"));
    assert_eq!(r.metadata["downloads"], serde_json::json!("1.2k"));
}

#[tokio::test]
async fn html_without_container_is_fetch_error() {
    let mut routes = HashMap::new();
    routes.insert("/a/b".to_string(), route(200, "text/html", "<html><body>Sign in</body></html>"));
    let hub = StubHub::start(routes).await;
    let err = fetch_card("a/b", &hub.config(FetchStrategy::Html)).await.unwrap_err();
    assert!(err.to_string().contains("model card content"), "got {err}");
}

// ── Snapshot & images ────────────────────────────────────────────────────────

#[tokio::test]
async fn fetch_to_file_round_trips() {
    let hub = StubHub::start(full_routes()).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model_data.json");
    let out = fetch_card_to_file(REPO, &path, &hub.config(FetchStrategy::Api))
        .await
        .unwrap();
    assert_eq!(load_snapshot(&path).unwrap(), out.record);
}

#[derive(Default)]
struct SavedImages(Mutex<Vec<String>>);

impl FetchProgressCallback for SavedImages {
    fn on_image_saved(&self, name: &str, _path: &std::path::Path) {
        self.0.lock().unwrap().push(name.to_string());
    }
}

#[tokio::test]
async fn image_download_saves_and_degrades() {
    let hub = StubHub::start(full_routes()).await;
    let saved = Arc::new(SavedImages::default());
    let config = FetchConfig::builder()
        .endpoint(hub.endpoint.clone())
        .progress_callback(saved.clone())
        .build()
        .unwrap();
    let mut record = fetch_card(REPO, &config).await.unwrap().record;

    let dir = tempfile::tempdir().unwrap();
    let report = download_card_images(&mut record, &config, dir.path()).await.unwrap();

    let detection = dir.path().join("example_detection.png");
    assert!(detection.is_file());
    assert_eq!(report.saved.get("detection_example"), Some(&detection));
    assert_eq!(record.images["detection_example"], detection.display().to_string());
    // The PR curve is not in the stub repo.
    assert_eq!(record.images["pr_curve"], "example_PR_curve.png");
    assert!(!dir.path().join("example_PR_curve.png").exists());
    assert!(matches!(
        report.degradations.as_slice(),
        [Degradation::MissingAsset { name, .. }] if name == "pr_curve"
    ));
    assert_eq!(*saved.0.lock().unwrap(), vec!["detection_example"]);
}
