//! OCR pipeline
//!
//! Turns a decoded image into a transcript plus per-token geometry.
//! The pipeline runs three stages: optional preprocessing, recognition
//! via Tesseract, and annotation of the detected text regions.

pub mod annotate;
pub mod engine;
pub mod preprocess;

pub use annotate::{draw_token_boxes, DEFAULT_CONFIDENCE_THRESHOLD};
pub use engine::{engine_available, TesseractEngine, SUPPORTED_LANGUAGES};
pub use preprocess::normalize;

use image::{DynamicImage, RgbImage};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Errors produced by the OCR pipeline
#[derive(Error, Debug)]
pub enum OcrError {
    /// Input image is malformed or uses an unsupported channel layout
    #[error("Invalid input image: {0}")]
    InvalidImage(String),

    /// Requested language is not in the supported set
    #[error("Unsupported OCR language '{0}'")]
    UnsupportedLanguage(String),

    /// Tesseract is missing or misconfigured on this machine
    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Engine invocation failed for this image
    #[error("Recognition failed: {0}")]
    Recognition(String),
}

/// Granularity of a recognized token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenLevel {
    Page,
    Block,
    Paragraph,
    Line,
    Word,
}

/// Axis-aligned bounding box in processed-image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Get the exclusive right edge coordinate
    pub fn right(&self) -> u32 {
        self.left + self.width
    }

    /// Get the exclusive bottom edge coordinate
    pub fn bottom(&self) -> u32 {
        self.top + self.height
    }

    /// Check whether two boxes share any pixels
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.left < other.right()
            && other.left < self.right()
            && self.top < other.bottom()
            && other.top < self.bottom()
    }
}

/// One recognized text unit with geometry and confidence
#[derive(Debug, Clone, Serialize)]
pub struct TokenRecord {
    /// Recognized text; empty for structural levels above word
    pub text: String,
    /// 0-100 for word tokens; -1 where Tesseract reports no score
    pub confidence: i32,
    /// Location in the image the engine ran against
    pub bounds: BoundingBox,
    /// Granularity of this record
    pub level: TokenLevel,
}

/// Transcript plus token records, as produced by the recognition engine
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    /// Whole-image text output with the engine's own line breaks
    pub full_text: String,
    /// Token records in reading order
    pub tokens: Vec<TokenRecord>,
}

/// Aggregate output of one pipeline invocation
#[derive(Debug, Clone)]
pub struct RecognitionResult {
    /// Whole-image transcript, independent of token filtering
    pub full_text: String,
    /// Token records in reading order
    pub tokens: Vec<TokenRecord>,
    /// Processed image with boxes drawn; present whenever recognition ran
    pub annotated: Option<RgbImage>,
}

/// Text recognition backends consumed by the pipeline
pub trait TextRecognizer {
    /// Recognize text in an image, returning the transcript and tokens
    fn recognize(&self, image: &DynamicImage, language: &str) -> Result<Transcript, OcrError>;
}

/// Run the full pipeline against the system Tesseract install.
pub fn extract_text(
    image: &DynamicImage,
    language: &str,
    enable_preprocessing: bool,
) -> Result<RecognitionResult, OcrError> {
    let recognizer = TesseractEngine::new()?;
    extract_text_with(
        &recognizer,
        image,
        language,
        enable_preprocessing,
        DEFAULT_CONFIDENCE_THRESHOLD,
    )
}

/// Run the full pipeline against a specific recognizer.
///
/// The language is validated before the recognizer is touched. When
/// preprocessing is disabled the raw image is handed to the recognizer
/// unmodified, but it must still be an 8-bit grayscale or RGB bitmap
/// with nonzero dimensions.
pub fn extract_text_with(
    recognizer: &dyn TextRecognizer,
    image: &DynamicImage,
    language: &str,
    enable_preprocessing: bool,
    confidence_threshold: i32,
) -> Result<RecognitionResult, OcrError> {
    engine::validate_language(language)?;

    let processed = if enable_preprocessing {
        DynamicImage::ImageLuma8(preprocess::normalize(image)?)
    } else {
        preprocess::check_layout(image)?;
        image.clone()
    };

    let transcript = recognizer.recognize(&processed, language)?;
    debug!(
        "Recognition produced {} tokens, {} chars of text",
        transcript.tokens.len(),
        transcript.full_text.len()
    );

    let annotated = if transcript.tokens.is_empty() {
        processed.to_rgb8()
    } else {
        draw_token_boxes(&processed, &transcript.tokens, confidence_threshold)
    };

    Ok(RecognitionResult {
        full_text: transcript.full_text,
        tokens: transcript.tokens,
        annotated: Some(annotated),
    })
}
