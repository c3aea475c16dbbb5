//! Image extraction: the ordered, deduplicated list of full-size image
//! URLs for a page.
//!
//! Sites commonly wrap a low-resolution thumbnail `<img>` inside an
//! `<a>` pointing at the high-resolution original. Collecting both
//! yields duplicate, low-quality entries, so extraction runs in two
//! passes: anchors that link to image files win, and any thumbnail they
//! wrap is suppressed before inline images are considered.

use super::container::locate_gallery_container;
use super::links::{is_image_url, resolve_url};
use super::{EventSink, ImageSource};
use crate::config::DetectionConfig;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());

/// Attributes checked for a lazy-loaded full-size URL, in priority
/// order, before `srcset` and `src`.
const LAZY_ATTRS: &[&str] = &["data-src", "data-original", "data-full", "data-large", "data-lazy"];

/// Detects the gallery images on a page: locates the gallery container
/// and extracts from it, or scans the whole document when no container
/// qualifies.
pub fn detect_gallery_images(
    document: &Html,
    base_url: &str,
    config: &DetectionConfig,
    events: &dyn EventSink,
) -> Vec<String> {
    match locate_gallery_container(document, config, events) {
        Some(container) => extract_images(container, base_url),
        None => extract_images(document.root_element(), base_url),
    }
}

/// An image URL found during extraction, with where it came from.
#[derive(Debug, Clone)]
pub struct ImageCandidate {
    /// Absolute URL.
    pub url: String,

    /// Linked full-size versus inline thumbnail.
    pub source: ImageSource,
}

/// Two-pass image extraction from a DOM subtree.
///
/// Pass 1 collects anchors whose href is an image file (full-size
/// URLs); every `<img>` nested in such an anchor is recorded as a
/// suppressed thumbnail. Pass 2 collects remaining inline images. The
/// result is deduplicated with first occurrence winning position.
pub fn extract_images(scope: ElementRef<'_>, base_url: &str) -> Vec<String> {
    extract_image_candidates(scope, base_url)
        .into_iter()
        .map(|candidate| candidate.url)
        .collect()
}

/// Two-pass extraction keeping each URL's provenance.
pub fn extract_image_candidates(scope: ElementRef<'_>, base_url: &str) -> Vec<ImageCandidate> {
    let mut candidates: Vec<ImageCandidate> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut suppressed: HashSet<String> = HashSet::new();

    for link in scope.select(&ANCHOR) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if !is_image_url(href) {
            continue;
        }

        let full_url = resolve_url(base_url, href);
        if seen.insert(full_url.clone()) {
            candidates.push(ImageCandidate {
                url: full_url,
                source: ImageSource::Linked,
            });
            for img in link.select(&IMG) {
                if let Some(thumb_url) = best_image_url(img, base_url) {
                    suppressed.insert(thumb_url);
                }
            }
        }
    }

    for img in scope.select(&IMG) {
        if let Some(img_url) = best_image_url(img, base_url)
            && !seen.contains(&img_url)
            && !suppressed.contains(&img_url)
        {
            seen.insert(img_url.clone());
            candidates.push(ImageCandidate {
                url: img_url,
                source: ImageSource::Inline,
            });
        }
    }

    candidates
}

/// Best inline URL for an `<img>`: lazy-loading attributes first, then
/// the first `srcset` entry, then `src`. The first candidate that is
/// non-empty, not a `data:` URI, and looks like an image file wins.
pub fn best_image_url(img: ElementRef<'_>, base_url: &str) -> Option<String> {
    let element = img.value();
    let srcset_first = element.attr("srcset").and_then(first_srcset_entry);

    let candidates = LAZY_ATTRS
        .iter()
        .filter_map(|attr| element.attr(attr))
        .chain(srcset_first)
        .chain(element.attr("src"));

    for candidate in candidates {
        if is_image_url(candidate) {
            return Some(resolve_url(base_url, candidate));
        }
    }

    None
}

/// First URL in a `srcset` attribute (`"url1 640w, url2 1280w"`).
fn first_srcset_entry(srcset: &str) -> Option<&str> {
    srcset.split(',').next()?.split_whitespace().next()
}
