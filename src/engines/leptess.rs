//! Leptess/Tesseract engine implementation
//!
//! Tesseract-based OCR engine. Better for noisy/messy images like phone
//! photos. Uses tesseract-static crate for static linking (no system
//! dependencies). Downloads tessdata (training data) automatically on
//! first use.

use crate::config::Config;
use crate::engine::{OcrEngine, OcrResult, Progress, ProgressFn, ProgressStage};
use crate::error::OcrError;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tesseract_static::tesseract::Tesseract;

/// Tesseract OCR Engine
pub struct LeptessEngine {
    /// Path to tessdata directory
    tessdata_path: String,
}

impl LeptessEngine {
    /// Create a new Tesseract-based OCR engine
    pub fn new(config: &Config) -> Result<Self, OcrError> {
        let default_language = &config.default_language;

        // Ensure tessdata for the default language is available up front
        let tessdata_path = ensure_tessdata_available(default_language)?;

        // Validate that tessdata is accessible by doing a test initialization
        let test_tess =
            Tesseract::new(Some(&tessdata_path), Some(default_language)).map_err(|e| {
                OcrError::InitializationError(format!("Failed to initialize Tesseract: {}", e))
            })?;
        drop(test_tess);

        tracing::info!(
            "Leptess engine initialized (tessdata: {}, language: {})",
            tessdata_path,
            default_language
        );

        Ok(Self { tessdata_path })
    }
}

impl OcrEngine for LeptessEngine {
    fn name(&self) -> &'static str {
        "leptess"
    }

    fn description(&self) -> &'static str {
        "Tesseract OCR engine - better for noisy/messy images like phone photos"
    }

    fn recognize(
        &self,
        image: &[u8],
        language: &str,
        progress: ProgressFn,
    ) -> Result<OcrResult, OcrError> {
        // Training data for languages other than the default is fetched
        // lazily on first request
        ensure_tessdata_available(language)?;

        progress(Progress::new(ProgressStage::LoadingImage, 0.0));

        let img = image::load_from_memory(image)
            .map_err(|e| OcrError::ImageDecodeError(e.to_string()))?;

        // Convert to BMP in memory (BMP is always supported by leptonica)
        let rgb_img = img.to_rgb8();
        let (width, height) = rgb_img.dimensions();
        let mut bmp_data = Vec::new();
        {
            let mut cursor = std::io::Cursor::new(&mut bmp_data);
            rgb_img
                .write_to(&mut cursor, image::ImageFormat::Bmp)
                .map_err(|e| OcrError::ImageEncodeError(format!("BMP conversion: {}", e)))?;
        }

        tracing::debug!(
            "Processing image: {}x{}, BMP size: {} bytes",
            width,
            height,
            bmp_data.len()
        );

        progress(Progress::new(ProgressStage::RecognizingText, 0.0));

        let mut tess = Tesseract::new(Some(&self.tessdata_path), Some(language))
            .map_err(|e| OcrError::RecognitionError(format!("Failed to create Tesseract: {}", e)))?;

        tess = tess.set_image_from_mem(&bmp_data).map_err(|e| {
            OcrError::RecognitionError(format!(
                "Failed to set image ({}x{}, {} bytes): {}",
                width,
                height,
                bmp_data.len(),
                e
            ))
        })?;

        tess = tess
            .recognize()
            .map_err(|e| OcrError::RecognitionError(format!("Failed to recognize text: {}", e)))?;

        let text = tess
            .get_text()
            .map_err(|e| OcrError::RecognitionError(format!("Failed to get text: {}", e)))?;

        progress(Progress::new(ProgressStage::RecognizingText, 1.0));

        Ok(OcrResult {
            text: text.trim().to_string(),
            warnings: Vec::new(),
        })
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
        // Tesseract supports many languages - return common ones
        // Users can install additional language packs
        vec![
            "eng".to_string(),     // English
            "deu".to_string(),     // German
            "fra".to_string(),     // French
            "spa".to_string(),     // Spanish
            "ita".to_string(),     // Italian
            "por".to_string(),     // Portuguese
            "nld".to_string(),     // Dutch
            "jpn".to_string(),     // Japanese
            "chi_sim".to_string(), // Chinese Simplified
            "chi_tra".to_string(), // Chinese Traditional
            "kor".to_string(),     // Korean
            "ara".to_string(),     // Arabic
            "rus".to_string(),     // Russian
        ]
    }
}

// ============================================================================
// Tessdata download helpers
// ============================================================================

/// Ensure tessdata is available, downloading if needed
fn ensure_tessdata_available(language: &str) -> Result<String, OcrError> {
    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("snaptext")
        .join("tessdata");

    std::fs::create_dir_all(&cache_dir).map_err(|e| {
        OcrError::InitializationError(format!("Failed to create tessdata directory: {}", e))
    })?;

    let traineddata_file = format!("{}.traineddata", language);
    let traineddata_path = cache_dir.join(&traineddata_file);

    if !traineddata_path.exists() {
        let url = tessdata_url(language);
        tracing::info!(
            "Downloading tessdata for '{}' (this may take a moment)...",
            language
        );
        download_file(&url, &traineddata_path)?;
        tracing::info!("Downloaded tessdata to {:?}", traineddata_path);
    }

    // Return the directory path (Tesseract expects the directory, not the file)
    cache_dir
        .to_str()
        .map(|s| s.to_string())
        .ok_or_else(|| OcrError::InitializationError("Invalid tessdata path".to_string()))
}

/// Get tessdata download URL for a language
fn tessdata_url(language: &str) -> String {
    // Use tessdata_fast for smaller, faster downloads
    format!(
        "https://github.com/tesseract-ocr/tessdata_fast/raw/main/{}.traineddata",
        language
    )
}

/// Download a file from URL to path using ureq
fn download_file(url: &str, path: &Path) -> Result<(), OcrError> {
    let response = ureq::get(url).call().map_err(|e| {
        OcrError::InitializationError(format!("Failed to download tessdata: {}", e))
    })?;

    let mut file = File::create(path).map_err(|e| {
        OcrError::InitializationError(format!("Failed to create tessdata file: {}", e))
    })?;

    let buffer = response.into_body().read_to_vec().map_err(|e| {
        OcrError::InitializationError(format!("Failed to read tessdata response: {}", e))
    })?;

    file.write_all(&buffer).map_err(|e| {
        OcrError::InitializationError(format!("Failed to write tessdata file: {}", e))
    })?;

    Ok(())
}
