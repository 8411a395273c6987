//! Core library for github-image-ocr
//!
//! Fetches an image from a GitHub repository, optionally normalizes it,
//! runs Tesseract OCR, and draws boxes around the detected text regions.
//! The pipeline entry point is [`ocr::extract_text`]; the GitHub contents
//! API collaborator lives in [`github`].

pub mod config;
pub mod github;
pub mod ocr;
