//! github-image-ocr - Extract text from images stored in GitHub repositories
//!
//! Fetches an image through the GitHub contents API, runs it through a
//! Tesseract OCR pipeline, and renders the transcript plus boxes around
//! the detected text regions.

use anyhow::{bail, Result};
use clap::Parser;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use github_image_ocr::config::{self, AppConfig};
use github_image_ocr::github::{self, RepoLocation};
use github_image_ocr::ocr::{self, TesseractEngine};

/// github-image-ocr - OCR for images hosted in GitHub repositories
#[derive(Parser, Debug)]
#[command(name = "github-image-ocr")]
#[command(about = "Extract text from images stored in GitHub repositories")]
struct Args {
    /// Repository owner (user or organization)
    #[arg(short, long)]
    owner: Option<String>,

    /// Repository name
    #[arg(short, long)]
    repo: Option<String>,

    /// Full repository URL (alternative to --owner/--repo)
    #[arg(long)]
    repo_url: Option<String>,

    /// Branch to read from
    #[arg(short, long)]
    branch: Option<String>,

    /// Path of the image inside the repository
    #[arg(short, long)]
    path: Option<String>,

    /// GitHub token for private repos or higher rate limits
    #[arg(long, env = "GITHUB_TOKEN")]
    token: Option<String>,

    /// OCR language code (eng, fra, deu, spa, ita, jpn, kor, chi_sim)
    #[arg(short, long)]
    language: Option<String>,

    /// Skip image preprocessing before recognition
    #[arg(long)]
    no_preprocess: bool,

    /// Confidence cutoff for drawing token boxes
    #[arg(long)]
    confidence_threshold: Option<i32>,

    /// List image files at --path (or the repository root) and exit
    #[arg(long)]
    list_images: bool,

    /// Check whether the Tesseract engine is installed and exit
    #[arg(long)]
    check_engine: bool,

    /// Write the transcript to this file
    #[arg(long)]
    text_out: Option<PathBuf>,

    /// Write the annotated image to this file
    #[arg(long)]
    image_out: Option<PathBuf>,

    /// Write the token records as JSON to this file
    #[arg(long)]
    tokens_out: Option<PathBuf>,

    /// Configuration file to load instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    // Engine check mode
    if args.check_engine {
        return match ocr::engine_available() {
            Ok(()) => {
                println!("Tesseract OCR engine is available.");
                Ok(())
            }
            Err(e) => bail!("{e}"),
        };
    }

    let config = load_config(args.config.as_deref())?;
    let location = resolve_location(&args, &config)?;

    let image_path = args
        .path
        .clone()
        .unwrap_or_else(|| config.github.path.clone());

    // Browse mode
    if args.list_images {
        return list_repository_images(&location, &image_path);
    }

    if image_path.is_empty() {
        bail!("No image path given; use --path (or --list-images to browse the repository)");
    }

    run_extraction(&args, &config, &location, &image_path)
}

/// Load configuration from an explicit path, the default location, or defaults
fn load_config(custom_path: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = custom_path {
        return config::load_config(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {path:?}: {e}"));
    }

    if let Ok(default_path) = config::default_config_path() {
        if default_path.exists() {
            if let Ok(config) = config::load_config(&default_path) {
                info!("Loaded configuration from {:?}", default_path);
                return Ok(config);
            }
        }
    }

    info!("Using default configuration");
    Ok(AppConfig::default())
}

/// Merge CLI arguments over the configuration into repository coordinates
fn resolve_location(args: &Args, config: &AppConfig) -> Result<RepoLocation> {
    let (owner, repo) = match (&args.owner, &args.repo) {
        (Some(owner), Some(repo)) => (owner.clone(), repo.clone()),
        _ => {
            if let Some(url) = &args.repo_url {
                github::parse_repo_url(url)
                    .ok_or_else(|| anyhow::anyhow!("Could not parse repository URL '{url}'"))?
            } else if !config.github.owner.is_empty() && !config.github.repo.is_empty() {
                (config.github.owner.clone(), config.github.repo.clone())
            } else {
                bail!("No repository given; use --owner/--repo or --repo-url");
            }
        }
    };

    Ok(RepoLocation {
        owner,
        repo,
        branch: args
            .branch
            .clone()
            .unwrap_or_else(|| config.github.branch.clone()),
        token: args.token.clone().or_else(|| config.github.token.clone()),
    })
}

/// List the image files at a repository path
fn list_repository_images(location: &RepoLocation, dir: &str) -> Result<()> {
    let entries = github::list_images(location, dir)?;

    if entries.is_empty() {
        println!("No image files found in this directory");
        return Ok(());
    }

    println!(
        "Image files in {}/{} ({}):",
        location.owner, location.repo, location.branch
    );
    for entry in &entries {
        println!("  {} ({} bytes)", entry.path, entry.size);
    }

    Ok(())
}

/// Fetch the image and run the OCR pipeline
fn run_extraction(
    args: &Args,
    config: &AppConfig,
    location: &RepoLocation,
    image_path: &str,
) -> Result<()> {
    // Probe the engine once up front so a missing install fails with
    // guidance instead of mid-pipeline
    let engine = TesseractEngine::new()?;

    info!(
        "Fetching {} from {}/{} ({})",
        image_path, location.owner, location.repo, location.branch
    );
    let fetched = github::fetch_image(location, image_path)?;

    // The pipeline accepts 8-bit grayscale or RGB; normalize the decoded
    // transport format here
    let raw = match fetched {
        DynamicImage::ImageLuma8(_) => fetched,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    };

    let language = args
        .language
        .clone()
        .unwrap_or_else(|| config.ocr.language.clone());
    let preprocessing = if args.no_preprocess {
        false
    } else {
        config.ocr.preprocessing
    };
    let threshold = args
        .confidence_threshold
        .unwrap_or(config.ocr.confidence_threshold);

    info!(
        "Running OCR (language={}, preprocessing={})",
        language, preprocessing
    );
    let result = ocr::extract_text_with(&engine, &raw, &language, preprocessing, threshold)?;

    println!("{}", result.full_text);
    info!(
        "Extracted {} words from image",
        result.full_text.split_whitespace().count()
    );

    if let Some(path) = &args.text_out {
        std::fs::write(path, &result.full_text)?;
        info!("Wrote transcript to {:?}", path);
    }

    if let Some(path) = &args.tokens_out {
        std::fs::write(path, serde_json::to_string_pretty(&result.tokens)?)?;
        info!("Wrote {} token records to {:?}", result.tokens.len(), path);
    }

    if let Some(path) = &args.image_out {
        if let Some(annotated) = &result.annotated {
            annotated.save(path)?;
            info!("Wrote annotated image to {:?}", path);
        }
    }

    Ok(())
}
