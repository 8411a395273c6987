//! GitHub image source
//!
//! Fetches images from repositories through the GitHub contents API and
//! decodes them into bitmaps for the OCR pipeline. Also supports listing
//! the image files in a repository directory.

use anyhow::{bail, Context, Result};
use base64::Engine as _;
use image::DynamicImage;
use serde::Deserialize;
use tokio::runtime::Runtime;
use tracing::{debug, info};

const API_ROOT: &str = "https://api.github.com";

/// File extensions treated as images when browsing a repository
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];

/// Repository coordinates plus optional auth token
#[derive(Debug, Clone, Default)]
pub struct RepoLocation {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Branch to read from
    pub branch: String,
    /// Token for private repos or higher rate limits
    pub token: Option<String>,
}

/// Parse `owner` and `repo` out of a repository URL like
/// `https://github.com/username/repo`.
pub fn parse_repo_url(url: &str) -> Option<(String, String)> {
    let mut parts = url.trim_end_matches('/').rsplit('/');
    let repo = parts.next()?.trim_end_matches(".git");
    let owner = parts.next()?;
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}

/// One entry returned by the contents API
#[derive(Debug, Clone, Deserialize)]
pub struct RepoEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub size: u64,
    pub download_url: Option<String>,
}

impl RepoEntry {
    /// Check whether this entry is an image file by extension
    pub fn is_image(&self) -> bool {
        if self.kind != "file" {
            return false;
        }
        match self.name.rsplit_once('.') {
            Some((_, ext)) => IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
            None => false,
        }
    }
}

/// Single-file payload from the contents API
#[derive(Debug, Deserialize)]
struct ContentPayload {
    content: Option<String>,
    encoding: Option<String>,
    download_url: Option<String>,
}

/// Fetch one image file from the repository and decode it.
pub fn fetch_image(location: &RepoLocation, path: &str) -> Result<DynamicImage> {
    let rt = Runtime::new().context("Failed to create tokio runtime")?;
    let bytes = rt.block_on(fetch_file(location, path))?;

    info!("Fetched {} ({} bytes) from {}/{}", path, bytes.len(), location.owner, location.repo);

    image::load_from_memory(&bytes)
        .with_context(|| format!("Failed to decode image data from '{path}'"))
}

/// List the image files in a repository directory (use an empty `dir`
/// for the repository root).
pub fn list_images(location: &RepoLocation, dir: &str) -> Result<Vec<RepoEntry>> {
    let rt = Runtime::new().context("Failed to create tokio runtime")?;
    let entries = rt.block_on(fetch_dir(location, dir))?;

    Ok(entries.into_iter().filter(RepoEntry::is_image).collect())
}

fn contents_url(location: &RepoLocation, path: &str) -> String {
    format!(
        "{API_ROOT}/repos/{}/{}/contents/{}?ref={}",
        location.owner, location.repo, path, location.branch
    )
}

fn build_client(location: &RepoLocation) -> Result<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        concat!("github-image-ocr/", env!("CARGO_PKG_VERSION")).parse()?,
    );
    if let Some(token) = &location.token {
        headers.insert(
            reqwest::header::AUTHORIZATION,
            format!("token {token}")
                .parse()
                .context("Invalid characters in GitHub token")?,
        );
    }

    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .default_headers(headers)
        .build()
        .context("Failed to create HTTP client")
}

async fn fetch_file(location: &RepoLocation, path: &str) -> Result<Vec<u8>> {
    let client = build_client(location)?;
    let url = contents_url(location, path);
    debug!("GET {url}");

    let response = client
        .get(&url)
        .send()
        .await
        .context("Failed to send contents request")?;

    if !response.status().is_success() {
        bail!("GitHub API request failed with status {}: {url}", response.status());
    }

    let payload: ContentPayload = response
        .json()
        .await
        .context("Failed to parse contents response")?;

    if payload.encoding.as_deref() == Some("base64") {
        if let Some(content) = payload.content {
            return decode_content(&content);
        }
    }

    // Large files come back without inline content; follow the download URL
    let download_url = payload
        .download_url
        .with_context(|| format!("No content or download URL for '{path}'"))?;
    debug!("GET {download_url}");

    let response = client
        .get(&download_url)
        .send()
        .await
        .context("Failed to download file")?;
    if !response.status().is_success() {
        bail!("Download failed with status {}: {download_url}", response.status());
    }

    Ok(response.bytes().await.context("Error reading download body")?.to_vec())
}

async fn fetch_dir(location: &RepoLocation, dir: &str) -> Result<Vec<RepoEntry>> {
    let client = build_client(location)?;
    let url = contents_url(location, dir);
    debug!("GET {url}");

    let response = client
        .get(&url)
        .send()
        .await
        .context("Failed to send contents request")?;

    if !response.status().is_success() {
        bail!("GitHub API request failed with status {}: {url}", response.status());
    }

    response
        .json()
        .await
        .context("Failed to parse directory listing")
}

/// Decode a base64 contents payload. The API wraps the body with
/// newlines, which the decoder rejects, so strip whitespace first.
fn decode_content(content: &str) -> Result<Vec<u8>> {
    let stripped: String = content.split_whitespace().collect();
    base64::engine::general_purpose::STANDARD
        .decode(stripped)
        .context("Failed to decode base64 content")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, kind: &str) -> RepoEntry {
        RepoEntry {
            name: name.to_string(),
            path: name.to_string(),
            kind: kind.to_string(),
            size: 0,
            download_url: None,
        }
    }

    #[test]
    fn test_parse_repo_url() {
        assert_eq!(
            parse_repo_url("https://github.com/username/repo"),
            Some(("username".to_string(), "repo".to_string()))
        );
        assert_eq!(
            parse_repo_url("https://github.com/username/repo.git/"),
            Some(("username".to_string(), "repo".to_string()))
        );
        assert_eq!(parse_repo_url(""), None);
    }

    #[test]
    fn test_is_image_by_extension() {
        assert!(entry("screenshot.PNG", "file").is_image());
        assert!(entry("photo.jpeg", "file").is_image());
        assert!(entry("anim.gif", "file").is_image());
        assert!(!entry("readme.md", "file").is_image());
        assert!(!entry("noextension", "file").is_image());
        assert!(!entry("images.png", "dir").is_image());
    }

    #[test]
    fn test_decode_content_strips_api_newlines() {
        // "hello world" split across lines, as the contents API returns it
        let wrapped = "aGVsbG8g\nd29ybGQ=\n";
        assert_eq!(decode_content(wrapped).unwrap(), b"hello world");
    }

    #[test]
    fn test_decode_content_rejects_garbage() {
        assert!(decode_content("not base64 at all!!!").is_err());
    }

    #[test]
    fn test_contents_url_shape() {
        let location = RepoLocation {
            owner: "octo".to_string(),
            repo: "demo".to_string(),
            branch: "main".to_string(),
            token: None,
        };
        assert_eq!(
            contents_url(&location, "images/shot.png"),
            "https://api.github.com/repos/octo/demo/contents/images/shot.png?ref=main"
        );
    }
}
