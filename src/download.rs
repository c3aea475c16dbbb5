//! Image download stage: bounded-concurrency fetches with retries,
//! size validation, deterministic naming, and the metadata sidecar.
//!
//! A failed or rejected image never aborts the gallery; it is counted
//! and reported in the stats.

use crate::config::DownloadConfig;
use crate::detect::metadata::GalleryMetadata;
use crate::error::DownloadError;
use futures::stream::{self, StreamExt};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Maximum characters of URL path kept in a gallery directory name.
const MAX_FOLDER_PATH_CHARS: usize = 50;

/// Filename of the metadata sidecar inside each gallery directory.
const METADATA_FILENAME: &str = "metadata.json";

/// Outcome counters for one gallery's downloads.
#[derive(Debug, Default, Clone)]
pub struct DownloadStats {
    /// Images written to disk.
    pub downloaded: usize,

    /// Images rejected by validation (too small to be content).
    pub skipped: usize,

    /// Bytes written.
    pub total_bytes: u64,

    /// URLs that failed after all retry attempts.
    pub failures: Vec<String>,
}

impl DownloadStats {
    /// Number of images that failed outright.
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Downloads a gallery's images concurrently.
pub struct ImageDownloader {
    client: reqwest::Client,
    config: DownloadConfig,
}

impl ImageDownloader {
    /// Creates a downloader with its own HTTP client.
    pub fn new(config: DownloadConfig, user_agent: &str) -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { client, config })
    }

    /// Directory for one gallery under the configured output root.
    pub fn gallery_dir(&self, url: &str) -> PathBuf {
        if self.config.create_subdirs {
            self.config.output_dir.join(folder_name(url))
        } else {
            self.config.output_dir.clone()
        }
    }

    /// Downloads every image into `output_dir`, with bounded
    /// concurrency and per-image retries.
    pub async fn download_gallery(
        &self,
        urls: &[String],
        output_dir: &Path,
    ) -> Result<DownloadStats, DownloadError> {
        tokio::fs::create_dir_all(output_dir).await?;

        let results: Vec<(String, Result<Option<u64>, DownloadError>)> =
            stream::iter(urls.iter().enumerate().map(|(index, url)| async move {
                let outcome = self.download_one(url, output_dir, index + 1).await;
                (url.clone(), outcome)
            }))
            .buffer_unordered(self.config.max_concurrent.max(1))
            .collect()
            .await;

        let mut stats = DownloadStats::default();
        for (url, outcome) in results {
            match outcome {
                Ok(Some(bytes)) => {
                    stats.downloaded += 1;
                    stats.total_bytes += bytes;
                }
                Ok(None) => stats.skipped += 1,
                Err(_) => stats.failures.push(url),
            }
        }

        Ok(stats)
    }

    /// Downloads a single image with retry attempts. `Ok(None)` means
    /// the body was rejected by validation.
    async fn download_one(
        &self,
        url: &str,
        dir: &Path,
        index: usize,
    ) -> Result<Option<u64>, DownloadError> {
        let attempts = self.config.max_retries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.try_download(url, dir, index).await {
                Ok(outcome) => return Ok(outcome),
                Err(error) => {
                    if attempt >= attempts {
                        return Err(error);
                    }
                    tokio::time::sleep(Duration::from_secs_f64(self.config.retry_delay_sec)).await;
                }
            }
        }
    }

    async fn try_download(
        &self,
        url: &str,
        dir: &Path,
        index: usize,
    ) -> Result<Option<u64>, DownloadError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.bytes().await?;

        if (body.len() as u64) < self.config.min_image_size_kb * 1024 {
            return Ok(None);
        }

        let path = dir.join(filename_for(url, index));
        tokio::fs::write(&path, &body).await?;

        Ok(Some(body.len() as u64))
    }

    /// Writes the metadata sidecar next to the images.
    pub async fn save_metadata(
        &self,
        metadata: &GalleryMetadata,
        output_dir: &Path,
    ) -> Result<(), DownloadError> {
        let json = serde_json::to_string_pretty(metadata)?;
        tokio::fs::write(output_dir.join(METADATA_FILENAME), json).await?;
        Ok(())
    }
}

/// `{index:03}_{stem}{ext}`, keeping the original filename stem and
/// falling back to `.jpg` when the URL carries no extension.
fn filename_for(url: &str, index: usize) -> String {
    let path = Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    let name = path.rsplit('/').next().unwrap_or("");

    let (stem, ext) = match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], &name[pos..]),
        _ => (name, ".jpg"),
    };

    format!("{index:03}_{stem}{ext}")
}

/// Deterministic gallery directory name:
/// `<domain>_<path-slug>_<hash8>`, or `<domain>_<hash8>` at the root.
fn folder_name(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let hash = hex::encode(&digest[..4]);

    let (domain, path) = match Url::parse(url) {
        Ok(parsed) => {
            let domain = parsed
                .host_str()
                .unwrap_or("")
                .strip_prefix("www.")
                .unwrap_or(parsed.host_str().unwrap_or(""))
                .to_string();
            let path = parsed.path().trim_matches('/').replace('/', "_");
            (domain, path)
        }
        Err(_) => (String::new(), String::new()),
    };

    let path: String = path.chars().take(MAX_FOLDER_PATH_CHARS).collect();

    if path.is_empty() {
        format!("{domain}_{hash}")
    } else {
        format!("{domain}_{path}_{hash}")
    }
}
