//! Listing-page classification: is this page a gallery, or a grid of
//! links to galleries?
//!
//! The key signal is anchors that wrap a thumbnail and lead to a
//! deeper, same-domain page. Gallery-link extraction layers fallbacks
//! from strict URL patterns down to "thumbnail plus a sufficiently
//! distinct path", since sites share no common gallery-URL convention.

use super::links::{is_excluded_link, resolve_url};
use super::{DetectEvent, EventSink, ListingClassification};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

/// Thumbnail links to deeper internal pages needed to call a page a
/// listing.
const MIN_LISTING_THUMB_LINKS: usize = 5;

/// How much longer a link's path must be than the current page's to
/// count as "deeper".
const PATH_DEPTH_MARGIN: usize = 5;

static ANCHOR_WITH_HREF: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").unwrap());
static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());

/// URL shapes that are confidently gallery pages.
static GALLERY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Named gallery sections with a long slug.
        r"/(gallery|galleries|comic|comics|album|post|pics|galls)/[^/]{10,}",
        // Descriptive slug ending in a numeric ID.
        r"/[a-z0-9]+-[a-z0-9-]+-\d{4,}/?$",
        // Bare numeric ID segment.
        r"/\d{5,}/",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid gallery pattern"))
    .collect()
});

/// Image extensions a listing link must not point at.
const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp"];

/// Classifies a page and, when it is a listing, harvests its gallery
/// links.
pub fn classify_listing(
    document: &Html,
    page_url: &str,
    events: &dyn EventSink,
) -> ListingClassification {
    let thumb_link_count = count_thumb_links(document, page_url);
    let is_listing = thumb_link_count >= MIN_LISTING_THUMB_LINKS;

    if is_listing {
        events.on_event(DetectEvent::ListingDetected { thumb_link_count });
    }

    let gallery_links = if is_listing {
        let links = extract_gallery_links(document, page_url);
        events.on_event(DetectEvent::GalleryLinksFound { count: links.len() });
        links
    } else {
        Vec::new()
    };

    ListingClassification {
        is_listing,
        gallery_links,
    }
}

/// True when the page reads as a listing: enough anchors that wrap a
/// thumbnail and resolve to a deeper page on the same domain.
pub fn is_listing_page(document: &Html, page_url: &str) -> bool {
    count_thumb_links(document, page_url) >= MIN_LISTING_THUMB_LINKS
}

fn count_thumb_links(document: &Html, page_url: &str) -> usize {
    let base_domain = domain_without_www(page_url);
    let base_path = page_path(page_url);

    let mut count = 0;
    for link in document.select(&ANCHOR_WITH_HREF) {
        let href = link.value().attr("href").unwrap_or("");
        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
            continue;
        }

        // Must wrap an image.
        if link.select(&IMG).next().is_none() {
            continue;
        }

        let full_url = resolve_url(page_url, href);
        let Ok(parsed) = Url::parse(&full_url) else {
            continue;
        };

        // Must stay on the same domain.
        if strip_www(parsed.host_str().unwrap_or("")) != base_domain {
            continue;
        }

        // Must lead to a different page, not an image file.
        let link_path = parsed.path().trim_end_matches('/').to_string();
        if link_path == base_path {
            continue;
        }
        let path_lower = link_path.to_lowercase();
        if IMAGE_EXTENSIONS.iter().any(|ext| path_lower.ends_with(ext)) {
            continue;
        }

        // Gallery links are deeper/more specific than the listing page.
        if link_path.len() > base_path.len() + PATH_DEPTH_MARGIN {
            count += 1;
        }
    }

    count
}

/// Harvests gallery links from a listing page, unique, in document
/// order.
pub fn extract_gallery_links(document: &Html, base_url: &str) -> Vec<String> {
    let mut links: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    let base_domain = domain_without_www(base_url);
    let base_path = page_path(base_url);
    let base_trimmed = base_url.trim_end_matches('/');

    for link in document.select(&ANCHOR_WITH_HREF) {
        let href = link.value().attr("href").unwrap_or("");
        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
            continue;
        }

        let full_url = resolve_url(base_url, href);
        if seen.contains(&full_url) {
            continue;
        }

        let Ok(parsed) = Url::parse(&full_url) else {
            continue;
        };
        if strip_www(parsed.host_str().unwrap_or("")) != base_domain {
            continue;
        }
        if full_url.trim_end_matches('/') == base_trimmed {
            continue;
        }
        if is_excluded_link(&full_url) {
            continue;
        }

        let has_thumb = link.select(&IMG).next().is_some();
        let path = parsed.path();

        let mut gallery_like = GALLERY_PATTERNS.iter().any(|re| re.is_match(path));

        // Thumbnail wrapped in a link with a descriptive slug, or a
        // clearly deeper path.
        if !gallery_like && has_thumb {
            let slug = path.trim_matches('/').rsplit('/').next().unwrap_or("");
            if slug.len() > 10 && slug.matches('-').count() >= 2 {
                gallery_like = true;
            } else if path.trim_end_matches('/').len() > base_path.len() + PATH_DEPTH_MARGIN {
                gallery_like = true;
            }
        }

        // Last resort for thumb grids: multi-segment or very long paths.
        if !gallery_like && has_thumb && path.len() > 10 {
            let segments: Vec<&str> = path.trim_matches('/').split('/').filter(|s| !s.is_empty()).collect();
            if segments.len() >= 2 || (segments.len() == 1 && segments[0].len() > 20) {
                gallery_like = true;
            }
        }

        if gallery_like {
            seen.insert(full_url.clone());
            links.push(full_url);
        }
    }

    links
}

fn domain_without_www(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| strip_www(h).to_string()))
        .unwrap_or_default()
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

fn page_path(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.path().trim_end_matches('/').to_string())
        .unwrap_or_default()
}
