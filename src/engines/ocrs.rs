//! OCRS engine implementation
//!
//! Pure Rust OCR engine using the ocrs library. No system dependencies
//! required. Downloads neural network models automatically on first use.

use crate::config::Config;
use crate::engine::{OcrEngine, OcrResult, Progress, ProgressFn, ProgressStage};
use crate::error::OcrError;
use ocrs::{DecodeMethod, ImageSource, OcrEngine as OcrsOcrEngine, OcrEngineParams};
use rten::Model;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Default model URLs from the ocrs project
const DETECTION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-detection.rten";
const RECOGNITION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-recognition.rten";

/// OCR Engine wrapping the ocrs library
pub struct OcrsEngine {
    engine: Arc<OcrsOcrEngine>,
}

impl OcrsEngine {
    /// Create a new engine instance, downloading models if needed
    pub fn new(_config: &Config) -> Result<Self, OcrError> {
        let detection_model_path =
            ensure_model_downloaded(DETECTION_MODEL_URL, "text-detection.rten")?;
        let recognition_model_path =
            ensure_model_downloaded(RECOGNITION_MODEL_URL, "text-recognition.rten")?;

        let detection_model = Model::load_file(&detection_model_path).map_err(|e| {
            OcrError::InitializationError(format!("Failed to load detection model: {}", e))
        })?;
        let recognition_model = Model::load_file(&recognition_model_path).map_err(|e| {
            OcrError::InitializationError(format!("Failed to load recognition model: {}", e))
        })?;

        let engine = OcrsOcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            decode_method: DecodeMethod::Greedy,
            ..Default::default()
        })
        .map_err(|e| {
            OcrError::InitializationError(format!("Failed to create OCR engine: {}", e))
        })?;

        tracing::info!("ocrs engine initialized successfully");

        Ok(Self {
            engine: Arc::new(engine),
        })
    }
}

impl OcrEngine for OcrsEngine {
    fn name(&self) -> &'static str {
        "ocrs"
    }

    fn description(&self) -> &'static str {
        "Pure Rust OCR engine - fast, no system dependencies required"
    }

    fn recognize(
        &self,
        image: &[u8],
        language: &str,
        progress: ProgressFn,
    ) -> Result<OcrResult, OcrError> {
        let mut warnings = Vec::new();

        // ocrs currently only supports English/Latin alphabet
        if language != "eng" {
            warnings.push(format!(
                "ocrs only supports 'eng'; ignoring requested language '{}'",
                language
            ));
        }

        progress(Progress::new(ProgressStage::LoadingImage, 0.0));

        let img = image::load_from_memory(image)
            .map_err(|e| OcrError::ImageDecodeError(e.to_string()))?;

        // RGB8 in HWC layout, which is what ImageSource::from_bytes expects
        let rgb_img = img.into_rgb8();
        let dimensions = rgb_img.dimensions();

        let img_source = ImageSource::from_bytes(rgb_img.as_raw(), dimensions).map_err(|e| {
            OcrError::RecognitionError(format!("Failed to create image source: {}", e))
        })?;

        let ocr_input = self
            .engine
            .prepare_input(img_source)
            .map_err(|e| OcrError::RecognitionError(format!("Failed to prepare input: {}", e)))?;

        progress(Progress::new(ProgressStage::DetectingText, 0.0));

        let word_rects = self
            .engine
            .detect_words(&ocr_input)
            .map_err(|e| OcrError::RecognitionError(format!("Failed to detect words: {}", e)))?;

        let line_rects = self.engine.find_text_lines(&ocr_input, &word_rects);

        progress(Progress::new(ProgressStage::DetectingText, 1.0));

        // Recognize line by line so the callback sees fractional completion
        let total_lines = line_rects.len();
        let mut lines = Vec::with_capacity(total_lines);

        for (index, line_rect) in line_rects.iter().enumerate() {
            progress(Progress::new(
                ProgressStage::RecognizingText,
                index as f32 / total_lines as f32,
            ));

            let line_texts = self
                .engine
                .recognize_text(&ocr_input, std::slice::from_ref(line_rect))
                .map_err(|e| {
                    OcrError::RecognitionError(format!("Failed to recognize text: {}", e))
                })?;

            for line in line_texts.iter().filter_map(|line| line.as_ref()) {
                let words = line
                    .words()
                    .map(|word| word.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                lines.push(words);
            }
        }

        progress(Progress::new(ProgressStage::RecognizingText, 1.0));

        let text = lines.join("\n").trim().to_string();

        Ok(OcrResult { text, warnings })
    }

    fn supported_formats(&self) -> Vec<String> {
        vec![
            "image/png".to_string(),
            "image/jpeg".to_string(),
            "image/gif".to_string(),
            "image/bmp".to_string(),
            "image/webp".to_string(),
            "image/tiff".to_string(),
        ]
    }

    fn supported_languages(&self) -> Vec<String> {
        vec!["eng".to_string()]
    }
}

// ============================================================================
// Model download helpers
// ============================================================================

/// Ensure model is downloaded and return its path
fn ensure_model_downloaded(url: &str, filename: &str) -> Result<std::path::PathBuf, OcrError> {
    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("snaptext");

    std::fs::create_dir_all(&cache_dir).map_err(|e| {
        OcrError::InitializationError(format!("Failed to create cache directory: {}", e))
    })?;

    let model_path = cache_dir.join(filename);

    if !model_path.exists() {
        tracing::info!("Downloading {} (this may take a moment)...", filename);
        download_file(url, &model_path)?;
        tracing::info!("Downloaded {} to {:?}", filename, model_path);
    } else {
        tracing::info!("Using cached model from {:?}", model_path);
    }

    Ok(model_path)
}

/// Download a file from URL to path using ureq
fn download_file(url: &str, path: &Path) -> Result<(), OcrError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| OcrError::InitializationError(format!("Failed to download model: {}", e)))?;

    let mut file = File::create(path).map_err(|e| {
        OcrError::InitializationError(format!("Failed to create model file: {}", e))
    })?;

    let buffer = response.into_body().read_to_vec().map_err(|e| {
        OcrError::InitializationError(format!("Failed to read response body: {}", e))
    })?;

    file.write_all(&buffer)
        .map_err(|e| OcrError::InitializationError(format!("Failed to write model file: {}", e)))?;

    Ok(())
}
