use image::{Rgba, RgbaImage};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use snaptext::config::Config;
use snaptext::engine::{OcrEngine, OcrResult, Progress, ProgressFn, ProgressStage};
use snaptext::engines::EngineRegistry;
use snaptext::error::OcrError;
use snaptext::preprocessing::codec;
use snaptext::server::{self, AppState};

#[derive(Debug, Deserialize)]
struct PreprocessingStats {
    applied: bool,
    sensitivity: u8,
    steps: Vec<StepTiming>,
}

#[derive(Debug, Deserialize)]
struct StepTiming {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    text: String,
    engine: String,
    warnings: Vec<String>,
    preprocessing: PreprocessingStats,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    code: String,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
struct InfoResponse {
    default_engine: String,
    default_language: String,
    default_sensitivity: u8,
}

/// Engine stub that records what it was given and reports staged progress
struct StubEngine {
    received: Arc<Mutex<Vec<Vec<u8>>>>,
    delay: Duration,
}

impl StubEngine {
    fn new() -> (Self, Arc<Mutex<Vec<Vec<u8>>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                received: received.clone(),
                delay: Duration::ZERO,
            },
            received,
        )
    }

    fn slow(delay: Duration) -> Self {
        Self {
            received: Arc::new(Mutex::new(Vec::new())),
            delay,
        }
    }
}

impl OcrEngine for StubEngine {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn description(&self) -> &'static str {
        "test stub returning canned text"
    }

    fn recognize(
        &self,
        image: &[u8],
        language: &str,
        progress: ProgressFn,
    ) -> Result<OcrResult, OcrError> {
        self.received.lock().unwrap().push(image.to_vec());
        progress(Progress::new(ProgressStage::RecognizingText, 0.0));
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        progress(Progress::new(ProgressStage::RecognizingText, 1.0));
        Ok(OcrResult {
            text: format!("stub text ({})", language),
            warnings: vec![],
        })
    }

    fn supported_formats(&self) -> Vec<String> {
        vec!["image/png".to_string()]
    }

    fn supported_languages(&self) -> Vec<String> {
        vec!["eng".to_string()]
    }
}

fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        default_language: "eng".to_string(),
        max_file_size: 4 * 1024 * 1024,
        default_sensitivity: 50,
    }
}

async fn spawn_server(engine: Arc<dyn OcrEngine>) -> String {
    let registry = EngineRegistry::from_engines(vec![engine]).unwrap();
    let app = server::router(AppState::new(registry, test_config()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

fn sample_png() -> Vec<u8> {
    let img = RgbaImage::from_pixel(4, 4, Rgba([128, 128, 128, 255]));
    codec::encode_png(&img).unwrap()
}

fn form_with_file(bytes: Vec<u8>) -> Form {
    let part = Part::bytes(bytes)
        .file_name("sample.png")
        .mime_str("image/png")
        .unwrap();
    Form::new().part("file", part)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (engine, _) = StubEngine::new();
    let base_url = spawn_server(Arc::new(engine)).await;

    let response: HealthResponse = reqwest::Client::new()
        .get(format!("{}/health", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(response.status, "ok");
}

#[tokio::test]
async fn test_info_endpoint() {
    let (engine, _) = StubEngine::new();
    let base_url = spawn_server(Arc::new(engine)).await;

    let response: InfoResponse = reqwest::Client::new()
        .get(format!("{}/info", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(response.default_engine, "stub");
    assert_eq!(response.default_language, "eng");
    assert_eq!(response.default_sensitivity, 50);
}

#[tokio::test]
async fn test_extract_runs_enhancement_by_default() {
    let (engine, received) = StubEngine::new();
    let base_url = spawn_server(Arc::new(engine)).await;

    let response: ExtractResponse = reqwest::Client::new()
        .post(format!("{}/extract", base_url))
        .multipart(form_with_file(sample_png()).text("sensitivity", "80"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(response.text, "stub text (eng)");
    assert_eq!(response.engine, "stub");
    assert!(response.warnings.is_empty());
    assert!(response.preprocessing.applied);
    assert_eq!(response.preprocessing.sensitivity, 80);
    let step_names: Vec<&str> = response
        .preprocessing
        .steps
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(step_names, ["grayscale", "contrast", "binarize"]);

    // The engine received a binarized image, not the original
    let received = received.lock().unwrap();
    let out = codec::decode(&received[0]).unwrap();
    for pixel in out.pixels() {
        assert!(pixel.0[0] == 0 || pixel.0[0] == 255);
    }
}

#[tokio::test]
async fn test_extract_pass_through_hands_engine_original_bytes() {
    let (engine, received) = StubEngine::new();
    let base_url = spawn_server(Arc::new(engine)).await;
    let original = sample_png();

    let response: ExtractResponse = reqwest::Client::new()
        .post(format!("{}/extract", base_url))
        .multipart(form_with_file(original.clone()).text("enhance", "false"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(!response.preprocessing.applied);
    assert_eq!(received.lock().unwrap()[0], original);
}

#[tokio::test]
async fn test_extract_with_named_engine() {
    let (engine, _) = StubEngine::new();
    let base_url = spawn_server(Arc::new(engine)).await;

    let response: ExtractResponse = reqwest::Client::new()
        .post(format!("{}/extract/stub", base_url))
        .multipart(form_with_file(sample_png()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(response.engine, "stub");
}

#[tokio::test]
async fn test_extract_with_unknown_engine_is_404() {
    let (engine, _) = StubEngine::new();
    let base_url = spawn_server(Arc::new(engine)).await;

    let response = reqwest::Client::new()
        .post(format!("{}/extract/nonexistent", base_url))
        .multipart(form_with_file(sample_png()))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    let error: ErrorResponse = response.json().await.unwrap();
    assert_eq!(error.code, "UNKNOWN_ENGINE");
}

#[tokio::test]
async fn test_extract_without_file_is_400() {
    let (engine, _) = StubEngine::new();
    let base_url = spawn_server(Arc::new(engine)).await;

    let response = reqwest::Client::new()
        .post(format!("{}/extract", base_url))
        .multipart(Form::new().text("language", "eng"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let error: ErrorResponse = response.json().await.unwrap();
    assert_eq!(error.code, "MISSING_FILE");
}

#[tokio::test]
async fn test_extract_undecodable_image_is_422() {
    let (engine, _) = StubEngine::new();
    let base_url = spawn_server(Arc::new(engine)).await;

    let response = reqwest::Client::new()
        .post(format!("{}/extract", base_url))
        .multipart(form_with_file(b"not an image".to_vec()))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 422);
    let error: ErrorResponse = response.json().await.unwrap();
    assert_eq!(error.code, "IMAGE_DECODE_ERROR");
}

#[tokio::test]
async fn test_concurrent_extraction_is_rejected_as_busy() {
    let base_url = spawn_server(Arc::new(StubEngine::slow(Duration::from_millis(500)))).await;

    let first_url = base_url.clone();
    let first = tokio::spawn(async move {
        reqwest::Client::new()
            .post(format!("{}/extract", first_url))
            .multipart(form_with_file(sample_png()))
            .send()
            .await
            .unwrap()
            .status()
    });

    // Give the first request time to take the in-flight slot
    tokio::time::sleep(Duration::from_millis(150)).await;

    let second = reqwest::Client::new()
        .post(format!("{}/extract", base_url))
        .multipart(form_with_file(sample_png()))
        .send()
        .await
        .unwrap();

    assert_eq!(second.status(), 429);
    let error: ErrorResponse = second.json().await.unwrap();
    assert_eq!(error.code, "BUSY");

    assert_eq!(first.await.unwrap(), 200);
}
