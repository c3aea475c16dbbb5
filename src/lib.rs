//! Mekuru - heuristic image gallery scraper and downloader.
//!
//! This library provides functionality for:
//! - Detecting the full-size images of a gallery inside arbitrary,
//!   unknown HTML templates
//! - Classifying pages as single galleries or listing/category pages
//!   and harvesting gallery links from the latter
//! - Extracting gallery metadata (title, tags, artist, date, category,
//!   description) with a multi-signal tag scorer
//! - Downloading image sets with validation and a JSON metadata sidecar

pub mod config;
pub mod console;
pub mod detect;
pub mod download;
pub mod error;
pub mod fetch;
pub mod scrape;

// Re-export commonly used types
pub use config::Config;
pub use console::Console;
pub use detect::images::ImageCandidate;
pub use detect::metadata::GalleryMetadata;
pub use detect::{
    DetectEvent, EventSink, GalleryResult, ImageSource, ListingClassification, NullSink,
};
pub use download::{DownloadStats, ImageDownloader};
pub use error::{ConfigError, DownloadError, ScrapeError};
pub use fetch::{FetchedPage, Fetcher, HttpFetcher};
pub use scrape::{BatchSummary, GalleryScraper, ScrapeOutcome};
