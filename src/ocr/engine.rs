//! Tesseract recognition adapter
//!
//! Wraps leptess to turn a processed bitmap into a transcript plus
//! per-token geometry and confidence. Availability of the system
//! Tesseract install is probed once per process.

use std::io::Cursor;
use std::sync::OnceLock;

use image::{DynamicImage, GenericImageView};
use leptess::{capi, LepTess};
use tracing::debug;

use super::{BoundingBox, OcrError, TextRecognizer, TokenLevel, TokenRecord, Transcript};

/// Languages the pipeline accepts, as Tesseract traineddata codes
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "eng", "fra", "deu", "spa", "ita", "jpn", "kor", "chi_sim",
];

/// Confidence reported for structural levels above word
const STRUCTURAL_CONFIDENCE: i32 = -1;

static ENGINE_STATUS: OnceLock<Result<(), String>> = OnceLock::new();

/// Check that the requested language is in the supported set.
pub fn validate_language(language: &str) -> Result<(), OcrError> {
    if SUPPORTED_LANGUAGES.contains(&language) {
        Ok(())
    } else {
        Err(OcrError::UnsupportedLanguage(language.to_string()))
    }
}

/// Probe the system Tesseract install. The probe runs once per process;
/// later calls return the cached outcome.
pub fn engine_available() -> Result<(), OcrError> {
    let status = ENGINE_STATUS.get_or_init(|| match LepTess::new(None, "eng") {
        Ok(_) => Ok(()),
        Err(e) => Err(format!(
            "Tesseract is not installed or not in PATH \
             (install with e.g. 'sudo apt install tesseract-ocr' or 'brew install tesseract'): {e}"
        )),
    });

    status.clone().map_err(OcrError::EngineUnavailable)
}

/// Tesseract-backed recognizer
#[derive(Debug, Default)]
pub struct TesseractEngine;

impl TesseractEngine {
    /// Create the recognizer, failing fast if Tesseract is unavailable.
    pub fn new() -> Result<Self, OcrError> {
        engine_available()?;
        Ok(Self)
    }
}

impl TextRecognizer for TesseractEngine {
    fn recognize(&self, image: &DynamicImage, language: &str) -> Result<Transcript, OcrError> {
        validate_language(language)?;
        engine_available()?;

        let mut lt = LepTess::new(None, language).map_err(|e| {
            OcrError::EngineUnavailable(format!(
                "failed to initialize Tesseract with language '{language}': {e}. \
                 Make sure the language data is installed \
                 (e.g. 'sudo apt install tesseract-ocr-{language}')"
            ))
        })?;

        // leptess wants an encoded image; round-trip through an in-memory PNG
        let mut png = Cursor::new(Vec::new());
        image
            .write_to(&mut png, image::ImageFormat::Png)
            .map_err(|e| OcrError::Recognition(format!("failed to encode image: {e}")))?;
        lt.set_image_from_mem(png.get_ref())
            .map_err(|e| OcrError::Recognition(format!("failed to load image into Tesseract: {e}")))?;

        // Whole-image transcript, engine line breaks preserved
        let full_text = lt
            .get_utf8_text()
            .map_err(|e| OcrError::Recognition(format!("failed to read transcript: {e}")))?;

        let (width, height) = (image.width(), image.height());
        let mut tokens = vec![TokenRecord {
            text: String::new(),
            confidence: STRUCTURAL_CONFIDENCE,
            bounds: BoundingBox {
                left: 0,
                top: 0,
                width,
                height,
            },
            level: TokenLevel::Page,
        }];

        // Structural boxes carry geometry only; gather them before any
        // per-word rectangle restriction is applied
        let structural_levels = [
            (TokenLevel::Block, capi::TessPageIteratorLevel_RIL_BLOCK),
            (TokenLevel::Paragraph, capi::TessPageIteratorLevel_RIL_PARA),
            (TokenLevel::Line, capi::TessPageIteratorLevel_RIL_TEXTLINE),
        ];
        for (level, ril) in structural_levels {
            if let Some(boxes) = lt.get_component_boxes(ril, true) {
                for bbox in &boxes {
                    let geom = bbox.get_geometry();
                    tokens.push(TokenRecord {
                        text: String::new(),
                        confidence: STRUCTURAL_CONFIDENCE,
                        bounds: clamp_bounds(geom.x, geom.y, geom.w, geom.h, width, height),
                        level,
                    });
                }
            }
        }

        // Word boxes carry text and a real confidence
        if let Some(boxes) = lt.get_component_boxes(capi::TessPageIteratorLevel_RIL_WORD, true) {
            for bbox in &boxes {
                let geom = bbox.get_geometry();
                lt.set_rectangle(geom.x, geom.y, geom.w, geom.h);

                let text = lt.get_utf8_text().unwrap_or_default().trim().to_string();
                if text.is_empty() {
                    continue;
                }

                tokens.push(TokenRecord {
                    text,
                    confidence: lt.mean_text_conf(),
                    bounds: clamp_bounds(geom.x, geom.y, geom.w, geom.h, width, height),
                    level: TokenLevel::Word,
                });
            }
        }

        debug!(
            "Tesseract ({language}) returned {} tokens for {}x{} image",
            tokens.len(),
            width,
            height
        );

        Ok(Transcript { full_text, tokens })
    }
}

/// Clamp engine-reported geometry into the image bounds.
fn clamp_bounds(x: i32, y: i32, w: i32, h: i32, img_w: u32, img_h: u32) -> BoundingBox {
    let left = (x.max(0) as u32).min(img_w.saturating_sub(1));
    let top = (y.max(0) as u32).min(img_h.saturating_sub(1));
    BoundingBox {
        left,
        top,
        width: (w.max(0) as u32).min(img_w - left),
        height: (h.max(0) as u32).min(img_h - top),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_supported_language_set() {
        assert!(validate_language("eng").is_ok());
        assert!(validate_language("chi_sim").is_ok());
        assert!(matches!(
            validate_language("xyz"),
            Err(OcrError::UnsupportedLanguage(_))
        ));
        assert!(matches!(
            validate_language(""),
            Err(OcrError::UnsupportedLanguage(_))
        ));
    }

    #[test]
    fn test_clamp_bounds_stays_inside_image() {
        let bounds = clamp_bounds(-5, -5, 200, 200, 100, 50);
        assert_eq!(bounds.left, 0);
        assert_eq!(bounds.top, 0);
        assert!(bounds.right() <= 100);
        assert!(bounds.bottom() <= 50);

        let inner = clamp_bounds(10, 10, 20, 20, 100, 50);
        assert_eq!(inner.left, 10);
        assert_eq!(inner.width, 20);
    }

    #[test]
    fn test_engine_probe_is_stable() {
        // Whatever the first probe reported, repeated probes agree
        let first = engine_available().is_ok();
        let second = engine_available().is_ok();
        assert_eq!(first, second);
    }

    #[test]
    fn test_blank_image_yields_no_word_tokens() {
        let engine = match TesseractEngine::new() {
            Ok(engine) => engine,
            Err(e) => {
                eprintln!("Skipping test: {e}");
                return;
            }
        };

        let blank = DynamicImage::ImageRgb8(RgbImage::from_pixel(50, 50, Rgb([255, 255, 255])));
        let transcript = engine.recognize(&blank, "eng").unwrap();

        assert!(
            transcript.full_text.trim().is_empty(),
            "blank image produced text: {:?}",
            transcript.full_text
        );
        assert!(transcript
            .tokens
            .iter()
            .all(|t| t.level != TokenLevel::Word || t.confidence <= 30));
        // The whole-page record is always present
        assert!(transcript
            .tokens
            .iter()
            .any(|t| t.level == TokenLevel::Page));
    }

    #[test]
    fn test_token_boxes_stay_inside_image() {
        let engine = match TesseractEngine::new() {
            Ok(engine) => engine,
            Err(e) => {
                eprintln!("Skipping test: {e}");
                return;
            }
        };

        let blank = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 32, Rgb([255, 255, 255])));
        let transcript = engine.recognize(&blank, "eng").unwrap();

        for token in &transcript.tokens {
            assert!(token.bounds.right() <= 64);
            assert!(token.bounds.bottom() <= 32);
        }
    }
}
