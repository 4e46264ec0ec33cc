use crate::error::OcrError;
use image::RgbaImage;
use serde::Serialize;
use std::time::Instant;

use super::{codec, steps};

/// Sensitivity used when the caller does not supply one
pub const DEFAULT_SENSITIVITY: u8 = 50;

/// Enhancement settings for a single extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnhanceOptions {
    /// When false, preprocessing is a pass-through
    pub enabled: bool,
    /// Binarization sensitivity in [0,100], inversely related to the
    /// threshold
    pub sensitivity: u8,
}

impl EnhanceOptions {
    /// Build options from caller input. Out-of-range sensitivity is
    /// clamped, never rejected.
    pub fn new(enabled: bool, sensitivity: i64) -> Self {
        Self {
            enabled,
            sensitivity: sensitivity.clamp(0, 100) as u8,
        }
    }
}

impl Default for EnhanceOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            sensitivity: DEFAULT_SENSITIVITY,
        }
    }
}

/// Timing information for a single preprocessing step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Result of preprocessing including timing stats
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessResult {
    /// Encoded image ready for the OCR engine (not serialized)
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// Whether enhancement ran or the input passed through untouched
    pub applied: bool,
    /// Sensitivity the pipeline ran with
    pub sensitivity: u8,
    /// Total preprocessing time in milliseconds
    pub total_time_ms: u64,
    /// Individual step timings
    pub steps: Vec<StepTiming>,
}

/// Preprocessing pipeline that applies the enhancement steps in order:
/// grayscale, contrast boost, binarization
pub struct Pipeline {
    options: EnhanceOptions,
}

impl Pipeline {
    pub fn new(options: EnhanceOptions) -> Self {
        Self { options }
    }

    /// Process an encoded image according to the configured options.
    ///
    /// With enhancement disabled the input bytes are returned byte-for-byte;
    /// the image is not even decoded. Otherwise the input is decoded,
    /// transformed per pixel, and re-encoded as PNG. All-or-nothing: any
    /// decode or encode failure fails the whole operation.
    pub fn process(&self, input: &[u8]) -> Result<PreprocessResult, OcrError> {
        let start = Instant::now();
        let mut steps_timing = Vec::new();

        if !self.options.enabled {
            return Ok(PreprocessResult {
                bytes: input.to_vec(),
                applied: false,
                sensitivity: self.options.sensitivity,
                total_time_ms: 0,
                steps: vec![],
            });
        }

        let sensitivity = self.options.sensitivity;
        let mut img = codec::decode(input)?;

        img = self.run_step("grayscale", img, &mut steps_timing, steps::grayscale::apply)?;
        img = self.run_step("contrast", img, &mut steps_timing, |img| {
            steps::contrast::apply(img, sensitivity)
        })?;
        img = self.run_step("binarize", img, &mut steps_timing, |img| {
            steps::binarize::apply(img, sensitivity)
        })?;

        let bytes = codec::encode_png(&img)?;

        Ok(PreprocessResult {
            bytes,
            applied: true,
            sensitivity,
            total_time_ms: start.elapsed().as_millis() as u64,
            steps: steps_timing,
        })
    }

    fn run_step<F>(
        &self,
        name: &str,
        img: RgbaImage,
        timings: &mut Vec<StepTiming>,
        step_fn: F,
    ) -> Result<RgbaImage, OcrError>
    where
        F: FnOnce(RgbaImage) -> Result<RgbaImage, OcrError>,
    {
        let step_start = Instant::now();
        let result = step_fn(img)?;
        timings.push(StepTiming {
            name: name.to_string(),
            time_ms: step_start.elapsed().as_millis() as u64,
        });
        Ok(result)
    }
}
