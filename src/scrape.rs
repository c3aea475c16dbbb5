//! Scrape orchestration: pagination loops, listing recursion, batch
//! runs.
//!
//! The orchestrator is the only async layer above the detection engine.
//! Per gallery it is strictly sequential (page N+1 cannot be classified
//! before page N's HTML arrives); independent galleries from a listing
//! are processed one at a time to keep host load predictable. Every
//! traversal carries its own visited-set of normalized URLs as a cycle
//! guard.

use crate::config::Config;
use crate::console::Console;
use crate::detect::{images, listing, metadata, pagination};
use crate::detect::{EventSink, GalleryResult};
use crate::download::{DownloadStats, ImageDownloader};
use crate::error::ScrapeError;
use crate::fetch::Fetcher;
use scraper::Html;
use std::collections::HashSet;

/// Minimum harvested links for a page to be treated as a listing.
const MIN_LISTING_GALLERIES: usize = 3;

/// What happened to one scraped URL.
#[derive(Debug)]
pub enum ScrapeOutcome {
    /// The URL was a gallery; images were collected and downloaded.
    Gallery {
        images: usize,
        stats: DownloadStats,
    },
    /// The URL was a listing; each discovered gallery was scraped.
    Listing {
        galleries: usize,
        completed: usize,
        failed: usize,
    },
    /// Neither images nor gallery links were found. Terminal for this
    /// URL, not an error.
    NoContent,
}

/// Counters for a batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Drives the detection engine over fetched pages and hands results to
/// the download stage.
pub struct GalleryScraper {
    config: Config,
    fetcher: Box<dyn Fetcher>,
    downloader: ImageDownloader,
    events: Box<dyn EventSink>,
    console: Console,
}

impl GalleryScraper {
    /// Creates a scraper around an externally supplied fetcher.
    pub fn new(
        config: Config,
        fetcher: Box<dyn Fetcher>,
        events: Box<dyn EventSink>,
    ) -> crate::error::Result<Self> {
        let downloader =
            ImageDownloader::new(config.download.clone(), &config.scraper.user_agent)?;

        Ok(Self {
            config,
            fetcher,
            downloader,
            events,
            console: Console::new(),
        })
    }

    /// Scrapes one URL end to end.
    ///
    /// The URL is first treated as a gallery. If its first page reads as
    /// a listing (or no images turn up at all), the discovered gallery
    /// links are scraped instead, each in isolation.
    pub async fn scrape(&self, url: &str) -> crate::error::Result<ScrapeOutcome> {
        self.console.section(&format!("Scraping {url}"));

        let (gallery, first_html) = self.collect_gallery_images(url).await?;

        // A listing page can itself show plenty of thumbnail images, so
        // the listing check runs before anything is downloaded.
        if let Some(html) = first_html.as_deref() {
            let classification = {
                let document = Html::parse_document(html);
                listing::classify_listing(&document, url, self.events.as_ref())
            };

            if classification.is_listing
                && classification.gallery_links.len() >= MIN_LISTING_GALLERIES
            {
                self.console.step("Detected listing/category page with gallery grid");
                return Ok(self.scrape_listing(url, html).await);
            }
        }

        if gallery.images.is_empty() {
            // Last resort: a page that yielded nothing may still be a
            // listing whose structure the first check missed.
            if let Some(html) = first_html.as_deref() {
                let links = {
                    let document = Html::parse_document(html);
                    listing::extract_gallery_links(&document, url)
                };
                if links.len() >= MIN_LISTING_GALLERIES {
                    self.console.step("No images; retrying as listing page");
                    return Ok(self.scrape_listing(url, html).await);
                }
            }

            self.console.warning("No images or gallery links found");
            return Ok(ScrapeOutcome::NoContent);
        }

        if gallery.images.len() < self.config.scraper.min_images_threshold {
            self.console.warning(&format!(
                "Only {} images found (minimum {})",
                gallery.images.len(),
                self.config.scraper.min_images_threshold
            ));
        }

        self.download_and_record(url, &gallery, first_html.as_deref())
            .await
    }

    /// Scrapes every URL in a batch, isolating failures per URL.
    pub async fn scrape_batch(&self, urls: &[String]) -> BatchSummary {
        let mut summary = BatchSummary {
            total: urls.len(),
            ..BatchSummary::default()
        };

        for (index, url) in urls.iter().enumerate() {
            self.console.section(&format!(
                "{} {}",
                self.console.gallery_info(index + 1, urls.len()),
                url
            ));
            match self.scrape(url).await {
                Ok(_) => summary.completed += 1,
                Err(error) => {
                    self.console.error(&format!("Scrape failed: {error:#}"));
                    summary.failed += 1;
                }
            }
        }

        summary
    }

    /// Collects image URLs for one gallery across its paginated fetches.
    ///
    /// Also returns the first page's HTML for the listing check and
    /// metadata extraction. A fetch failure on the first page fails the
    /// gallery; on later pages it just ends pagination.
    async fn collect_gallery_images(
        &self,
        url: &str,
    ) -> Result<(GalleryResult, Option<String>), ScrapeError> {
        let mut images: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut current = url.to_string();
        let mut first_html: Option<String> = None;
        let mut page_count = 0u32;

        while page_count < self.config.detection.max_pages {
            if !visited.insert(normalize_url(&current)) {
                break;
            }

            let page = match self.fetcher.fetch(&current).await {
                Ok(page) => page,
                Err(error) if page_count == 0 => return Err(error),
                Err(error) => {
                    self.console
                        .warning(&format!("Page fetch failed, stopping pagination: {error}"));
                    break;
                }
            };
            page_count += 1;

            let next = {
                let document = Html::parse_document(&page.html);
                let page_images = images::detect_gallery_images(
                    &document,
                    &current,
                    &self.config.detection,
                    self.events.as_ref(),
                );
                self.console.info(&format!(
                    "Found {} images on page {}",
                    page_images.len(),
                    page_count
                ));
                for image in page_images {
                    if seen.insert(image.clone()) {
                        images.push(image);
                    }
                }

                if self.config.detection.detect_pagination {
                    pagination::detect_next_page(
                        &document,
                        &current,
                        &self.config.detection.pagination_selectors,
                        self.events.as_ref(),
                    )
                } else {
                    None
                }
            };

            if first_html.is_none() {
                first_html = Some(page.html);
            }

            match next {
                Some(next_url) => current = next_url,
                None => break,
            }
        }

        Ok((GalleryResult { images, page_count }, first_html))
    }

    /// Scrapes each gallery discovered on a listing, sequentially. A
    /// failed gallery is logged and skipped; the traversal always
    /// completes.
    async fn scrape_listing(&self, url: &str, first_html: &str) -> ScrapeOutcome {
        let links = self.collect_listing_links(url, first_html).await;
        self.console.success(&format!(
            "Listing page with {} galleries",
            self.console.count(links.len())
        ));

        let mut completed = 0;
        let mut failed = 0;
        for (index, gallery_url) in links.iter().enumerate() {
            self.console.section(&format!(
                "{} {}",
                self.console.gallery_info(index + 1, links.len()),
                gallery_url
            ));
            match self.scrape_one_gallery(gallery_url).await {
                Ok(_) => completed += 1,
                Err(error) => {
                    self.console.error(&format!("Gallery failed: {error:#}"));
                    failed += 1;
                }
            }
        }

        ScrapeOutcome::Listing {
            galleries: links.len(),
            completed,
            failed,
        }
    }

    /// Gathers gallery links across the pages of a listing.
    async fn collect_listing_links(&self, url: &str, first_html: &str) -> Vec<String> {
        let mut links: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut current = url.to_string();
        let mut html = first_html.to_string();
        let mut pages = 0u32;

        loop {
            pages += 1;
            visited.insert(normalize_url(&current));

            let next = {
                let document = Html::parse_document(&html);
                for link in listing::extract_gallery_links(&document, &current) {
                    if seen.insert(link.clone()) {
                        links.push(link);
                    }
                }
                pagination::detect_next_listing_page(&document, &current, self.events.as_ref())
            };

            if pages >= self.config.detection.max_pages {
                break;
            }
            let Some(next_url) = next else {
                break;
            };
            if visited.contains(&normalize_url(&next_url)) {
                break;
            }

            match self.fetcher.fetch(&next_url).await {
                Ok(page) => {
                    html = page.html;
                    current = next_url;
                }
                Err(error) => {
                    self.console
                        .warning(&format!("Listing page fetch failed: {error}"));
                    break;
                }
            }
        }

        links
    }

    /// Gallery scrape without the listing fallback (used for links that
    /// were themselves discovered on a listing).
    async fn scrape_one_gallery(&self, url: &str) -> crate::error::Result<ScrapeOutcome> {
        let (gallery, first_html) = self.collect_gallery_images(url).await?;

        if gallery.images.is_empty() {
            self.console.warning("No images found");
            return Ok(ScrapeOutcome::NoContent);
        }

        self.download_and_record(url, &gallery, first_html.as_deref())
            .await
    }

    /// Downloads a collected gallery and writes its metadata sidecar.
    async fn download_and_record(
        &self,
        url: &str,
        gallery: &GalleryResult,
        first_html: Option<&str>,
    ) -> crate::error::Result<ScrapeOutcome> {
        self.console.success(&format!(
            "Total unique images found: {}",
            self.console.count(gallery.images.len())
        ));

        let output_dir = self.downloader.gallery_dir(url);
        self.console
            .info(&format!("Output directory: {}", output_dir.display()));

        let stats = self
            .downloader
            .download_gallery(&gallery.images, &output_dir)
            .await?;
        for failure in &stats.failures {
            self.console.error(&format!("Failed to download {failure}"));
        }

        if self.config.metadata.save_metadata
            && let Some(html) = first_html
        {
            let record = {
                let document = Html::parse_document(html);
                metadata::extract_metadata(
                    &document,
                    url,
                    gallery.images.len(),
                    self.events.as_ref(),
                )
            };
            match self.downloader.save_metadata(&record, &output_dir).await {
                Ok(()) => self.console.success("Saved metadata sidecar"),
                Err(error) => self
                    .console
                    .warning(&format!("Failed to save metadata: {error}")),
            }
        }

        self.console.section("Download summary");
        self.console
            .summary_row("downloaded", &stats.downloaded.to_string());
        self.console.summary_row("skipped", &stats.skipped.to_string());
        self.console.summary_row("failed", &stats.failed().to_string());
        self.console
            .summary_row("size", &self.console.megabytes(stats.total_bytes));
        self.console
            .summary_row("location", &output_dir.display().to_string());

        Ok(ScrapeOutcome::Gallery {
            images: gallery.images.len(),
            stats,
        })
    }
}

/// Visited-set key: fragment stripped, trailing slash trimmed.
fn normalize_url(url: &str) -> String {
    let without_fragment = url.split('#').next().unwrap_or(url);
    without_fragment.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::NullSink;
    use crate::fetch::FetchedPage;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct MapFetcher {
        pages: HashMap<String, String>,
    }

    #[async_trait]
    impl Fetcher for MapFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedPage, ScrapeError> {
            self.pages
                .get(url)
                .map(|html| FetchedPage {
                    url: url.to_string(),
                    html: html.clone(),
                })
                .ok_or_else(|| ScrapeError::InvalidUrl(url.to_string()))
        }
    }

    fn scraper_with(pages: HashMap<String, String>) -> GalleryScraper {
        let mut config = Config::default();
        config.scraper.delay_between_requests_sec = 0.0;
        GalleryScraper::new(config, Box::new(MapFetcher { pages }), Box::new(NullSink)).unwrap()
    }

    const PAGE_A: &str = "https://x.com/g/beach-set";
    const PAGE_B: &str = "https://x.com/g/beach-set?page=2";

    fn page_a_html() -> String {
        r#"<html><body>
        <strong>Tags:</strong>
        <div class="taglist">
            <a href="/tag/amateur">amateur</a>
            <a href="/tag/beach">beach</a>
            <a href="/tag/outdoor">outdoor</a>
            <a href="/tag/bikini">bikini</a>
            <a href="/tag/candid">candid</a>
        </div>
        <div class="gallery">
            <a href="/full/a1.jpg"><img src="/t/a1.jpg"></a>
            <a href="/full/a2.jpg"><img src="/t/a2.jpg"></a>
            <a href="/full/a3.jpg"><img src="/t/a3.jpg"></a>
            <a href="/full/a4.jpg"><img src="/t/a4.jpg"></a>
            <a href="/full/a5.jpg"><img src="/t/a5.jpg"></a>
        </div>
        <a class="next" href="/g/beach-set?page=2">Next</a>
        </body></html>"#
            .to_string()
    }

    fn page_b_html(next_href: Option<&str>) -> String {
        let next = next_href
            .map(|href| format!(r#"<a class="next" href="{href}">Next</a>"#))
            .unwrap_or_default();
        format!(
            r#"<html><body>
            <div class="gallery">
                <a href="/full/b1.jpg"><img src="/t/b1.jpg"></a>
                <a href="/full/b2.jpg"><img src="/t/b2.jpg"></a>
                <a href="/full/a1.jpg"><img src="/t/a1.jpg"></a>
                <a href="/full/b3.jpg"><img src="/t/b3.jpg"></a>
            </div>
            {next}
            </body></html>"#
        )
    }

    #[tokio::test]
    async fn test_two_page_gallery_collection() {
        let mut pages = HashMap::new();
        pages.insert(PAGE_A.to_string(), page_a_html());
        pages.insert(PAGE_B.to_string(), page_b_html(None));
        let scraper = scraper_with(pages);

        let (gallery, first_html) = scraper.collect_gallery_images(PAGE_A).await.unwrap();

        assert_eq!(gallery.page_count, 2);
        // 5 from page A, 3 new from page B; the repeated a1.jpg is
        // dropped, order is cross-page discovery order.
        assert_eq!(
            gallery.images,
            vec![
                "https://x.com/full/a1.jpg",
                "https://x.com/full/a2.jpg",
                "https://x.com/full/a3.jpg",
                "https://x.com/full/a4.jpg",
                "https://x.com/full/a5.jpg",
                "https://x.com/full/b1.jpg",
                "https://x.com/full/b2.jpg",
                "https://x.com/full/b3.jpg",
            ]
        );

        // First page HTML is retained for metadata extraction.
        let document = Html::parse_document(first_html.as_deref().unwrap());
        let tags = crate::detect::tags::extract_tags(&document, &NullSink);
        assert_eq!(tags, vec!["amateur", "beach", "outdoor", "bikini", "candid"]);
    }

    #[tokio::test]
    async fn test_pagination_cycle_guard() {
        // Page B's next link points back at page A; the loop must stop
        // without revisiting.
        let mut pages = HashMap::new();
        pages.insert(PAGE_A.to_string(), page_a_html());
        pages.insert(PAGE_B.to_string(), page_b_html(Some("/g/beach-set")));
        let scraper = scraper_with(pages);

        let (gallery, _) = scraper.collect_gallery_images(PAGE_A).await.unwrap();
        assert_eq!(gallery.page_count, 2);
        assert_eq!(gallery.images.len(), 8);
    }

    #[tokio::test]
    async fn test_first_page_fetch_failure_is_an_error() {
        let scraper = scraper_with(HashMap::new());
        assert!(scraper.collect_gallery_images(PAGE_A).await.is_err());
    }

    #[tokio::test]
    async fn test_later_page_fetch_failure_ends_pagination() {
        // Page A links to a page that will 404; the gallery keeps its
        // first-page images.
        let mut pages = HashMap::new();
        pages.insert(PAGE_A.to_string(), page_a_html());
        let scraper = scraper_with(pages);

        let (gallery, _) = scraper.collect_gallery_images(PAGE_A).await.unwrap();
        assert_eq!(gallery.page_count, 1);
        assert_eq!(gallery.images.len(), 5);
    }

    #[tokio::test]
    async fn test_no_content_outcome() {
        let mut pages = HashMap::new();
        pages.insert(
            "https://x.com/empty".to_string(),
            "<html><body><p>nothing here</p></body></html>".to_string(),
        );
        let scraper = scraper_with(pages);

        let outcome = scraper.scrape("https://x.com/empty").await.unwrap();
        assert!(matches!(outcome, ScrapeOutcome::NoContent));
    }

    #[tokio::test]
    async fn test_listing_links_collected_across_pages() {
        let listing_1 = r#"<html><body>
            <a href="/g/red-beach-set-0001"><img src="/t/1.jpg"></a>
            <a href="/g/blue-beach-set-0002"><img src="/t/2.jpg"></a>
            <a href="/g/green-beach-set-0003"><img src="/t/3.jpg"></a>
            <a href="/cat?page=2">Next</a>
            </body></html>"#;
        let listing_2 = r#"<html><body>
            <a href="/g/gold-beach-set-0004"><img src="/t/4.jpg"></a>
            <a href="/g/red-beach-set-0001"><img src="/t/1.jpg"></a>
            </body></html>"#;

        let mut pages = HashMap::new();
        pages.insert("https://x.com/cat?page=2".to_string(), listing_2.to_string());
        let scraper = scraper_with(pages);

        let links = scraper
            .collect_listing_links("https://x.com/cat", listing_1)
            .await;

        assert_eq!(
            links,
            vec![
                "https://x.com/g/red-beach-set-0001",
                "https://x.com/g/blue-beach-set-0002",
                "https://x.com/g/green-beach-set-0003",
                "https://x.com/g/gold-beach-set-0004",
            ]
        );
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("https://x.com/a/"), "https://x.com/a");
        assert_eq!(normalize_url("https://x.com/a#top"), "https://x.com/a");
        assert_eq!(
            normalize_url("https://x.com/a?page=2"),
            "https://x.com/a?page=2"
        );
    }
}
