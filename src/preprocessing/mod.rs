//! Image preprocessing for OCR enhancement
//!
//! Converts an image to grayscale, boosts contrast, and binarizes it based
//! on a user-tunable sensitivity value before it is handed to an OCR engine.
//! When enhancement is disabled the input bytes pass through untouched.

pub mod codec;
pub mod pipeline;
pub mod steps;

pub use pipeline::{EnhanceOptions, Pipeline, PreprocessResult, StepTiming, DEFAULT_SENSITIVITY};
