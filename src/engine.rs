use crate::error::OcrError;

/// OCR processing result
#[derive(Debug, Clone)]
pub struct OcrResult {
    pub text: String,
    pub warnings: Vec<String>,
}

/// Recognition phase reported through the progress callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStage {
    LoadingImage,
    DetectingText,
    RecognizingText,
}

impl ProgressStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoadingImage => "loading image",
            Self::DetectingText => "detecting text",
            Self::RecognizingText => "recognizing text",
        }
    }
}

/// A progress update: a stage tag plus fractional completion in [0,1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub stage: ProgressStage,
    pub fraction: f32,
}

impl Progress {
    pub fn new(stage: ProgressStage, fraction: f32) -> Self {
        Self {
            stage,
            fraction: fraction.clamp(0.0, 1.0),
        }
    }
}

/// Caller-supplied progress callback
pub type ProgressFn<'a> = &'a (dyn Fn(Progress) + Send + Sync);

/// Trait that all OCR engines must implement
pub trait OcrEngine: Send + Sync {
    /// Returns the engine identifier (e.g., "ocrs", "leptess")
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of the engine
    fn description(&self) -> &'static str;

    /// Recognize text in an encoded image buffer, reporting progress
    /// through the supplied callback as recognition advances
    fn recognize(
        &self,
        image: &[u8],
        language: &str,
        progress: ProgressFn,
    ) -> Result<OcrResult, OcrError>;

    /// Get supported MIME types
    fn supported_formats(&self) -> Vec<String>;

    /// Get supported languages
    fn supported_languages(&self) -> Vec<String>;
}
