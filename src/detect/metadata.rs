//! Gallery metadata extraction and the sidecar record.
//!
//! Every field uses an ordered list of CSS-selector fallbacks; the first
//! non-trivial text wins. A selector that fails to parse or match is
//! simply skipped. Absence of any usable source yields `None`/empty,
//! never an error.

use super::tags::extract_tags;
use super::{element_text, EventSink};
use chrono::Local;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;
use std::sync::LazyLock;
use url::Url;

/// Maximum stored description length in characters.
const MAX_DESCRIPTION_CHARS: usize = 500;

/// Replacement for scraped mentions of other sites.
const DOMAIN_REPLACEMENT: &str = "pornypics.net";

const TITLE_SELECTORS: &[&str] = &[
    "h1",
    ".title",
    ".post-title",
    "#title",
    "title",
    ".entry-title",
    ".comic-title",
    ".gallery-title",
];

const ARTIST_SELECTORS: &[&str] = &[
    ".artist",
    ".author",
    ".by-author a",
    "a[rel=\"author\"]",
    ".creator",
    ".artist-name",
];

const DATE_SELECTORS: &[&str] = &["time", ".date", ".published", ".post-date", ".upload-date"];

const CATEGORY_SELECTORS: &[&str] = &[".category", ".series", ".breadcrumb a", ".cat-links a"];

const DESCRIPTION_SELECTORS: &[&str] = &[
    ".description",
    ".content",
    ".post-content",
    ".entry-content",
];

static META_DESCRIPTION: LazyLock<Option<Selector>> =
    LazyLock::new(|| Selector::parse("meta[name=\"description\"]").ok());

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Trailing page-file extensions stripped from URL-derived titles.
static PAGE_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(html|php|aspx?)$").unwrap());

/// Any full URL inside a description.
static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[a-zA-Z0-9\-\.]+\.[a-zA-Z]{2,}(?:/[^\s",}\]]*)?"#).unwrap()
});

/// Bare competitor domain mentions inside a description.
static COMPETITOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:pornpics|allasianpics|lamalinks)\.\w+").unwrap());

/// Metadata record written as `metadata.json` next to the images.
///
/// Field names and the `null` representation of absent values are a
/// compatibility surface for downstream consumers; do not rename.
#[derive(Debug, Clone, Serialize)]
pub struct GalleryMetadata {
    pub url: String,
    pub scraped_at: String,
    pub image_count: usize,
    pub title: String,
    pub tags: Vec<String>,
    pub artist: Option<String>,
    pub date: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
}

/// Extracts the full metadata record for a gallery page.
pub fn extract_metadata(
    document: &Html,
    url: &str,
    image_count: usize,
    events: &dyn EventSink,
) -> GalleryMetadata {
    GalleryMetadata {
        url: url.to_string(),
        scraped_at: Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        image_count,
        title: extract_title(document, url),
        tags: extract_tags(document, events),
        artist: extract_artist(document),
        date: extract_date(document),
        category: extract_category(document, url),
        description: extract_description(document).map(|d| sanitize_description(&d)),
    }
}

/// Gallery title: selector fallbacks, then a slug derived from the URL.
pub fn extract_title(document: &Html, url: &str) -> String {
    for selector_str in TITLE_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let title = element_text(element);
            if title.chars().count() > 3 {
                return WHITESPACE_RE.replace_all(&title, " ").to_string();
            }
        }
    }

    title_from_url(url)
}

/// Derives a readable title from the URL's final path segment.
fn title_from_url(url: &str) -> String {
    let path = Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());

    let Some(last) = path.split('/').filter(|p| !p.is_empty()).next_back() else {
        return "Unknown Gallery".to_string();
    };

    let spaced = last.replace(['-', '_'], " ");
    let trimmed = PAGE_SUFFIX_RE.replace(&spaced, "").to_string();
    title_case(&trimmed)
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn extract_artist(document: &Html) -> Option<String> {
    for selector_str in ARTIST_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let artist = element_text(element);
            if artist.chars().count() > 2 {
                return Some(artist);
            }
        }
    }
    None
}

fn extract_date(document: &Html) -> Option<String> {
    for selector_str in DATE_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            // A machine-readable datetime attribute beats display text.
            if let Some(datetime) = element.value().attr("datetime")
                && !datetime.is_empty()
            {
                return Some(datetime.to_string());
            }

            let text = element_text(element);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

fn extract_category(document: &Html, url: &str) -> Option<String> {
    for selector_str in CATEGORY_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        // Last match is the most specific breadcrumb level.
        if let Some(element) = document.select(&selector).last() {
            let category = element_text(element);
            if category.chars().count() > 2 {
                return Some(category);
            }
        }
    }

    // Fall back to a /category/<name> path segment.
    let path = Url::parse(url).map(|u| u.path().to_string()).ok()?;
    let (_, after) = path.split_once("/category/")?;
    let segment = after.split('/').next().unwrap_or("");
    if segment.is_empty() {
        return None;
    }
    Some(title_case(&segment.replace('-', " ")))
}

fn extract_description(document: &Html) -> Option<String> {
    for selector_str in DESCRIPTION_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text = element_text(element);
            if text.chars().count() > 10 {
                let collapsed = WHITESPACE_RE.replace_all(&text, " ").to_string();
                return Some(collapsed.chars().take(MAX_DESCRIPTION_CHARS).collect());
            }
        }
    }

    if let Some(selector) = META_DESCRIPTION.as_ref()
        && let Some(element) = document.select(selector).next()
    {
        let content = element.value().attr("content").unwrap_or("").trim();
        if content.chars().count() > 10 {
            return Some(content.chars().take(MAX_DESCRIPTION_CHARS).collect());
        }
    }

    None
}

/// Replaces scraped mentions of other sites (full URLs and bare domain
/// names) with a fixed replacement string.
fn sanitize_description(description: &str) -> String {
    let replaced = URL_RE.replace_all(description, DOMAIN_REPLACEMENT);
    COMPETITOR_RE
        .replace_all(&replaced, DOMAIN_REPLACEMENT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::NullSink;

    #[test]
    fn test_title_from_selector() {
        let html = Html::parse_document(
            "<html><body><h1>  Beach   Shoot\n2024 </h1></body></html>",
        );
        assert_eq!(
            extract_title(&html, "https://x.com/g/1"),
            "Beach Shoot 2024"
        );
    }

    #[test]
    fn test_title_slug_fallback() {
        let html = Html::parse_document("<html><body></body></html>");
        assert_eq!(
            extract_title(&html, "https://x.com/galleries/cute-beach_set.html"),
            "Cute Beach Set"
        );
        assert_eq!(extract_title(&html, "https://x.com/"), "Unknown Gallery");
    }

    #[test]
    fn test_short_title_falls_through() {
        // Three characters or fewer is noise, not a title.
        let html = Html::parse_document("<html><body><h1>ad</h1></body></html>");
        assert_eq!(
            extract_title(&html, "https://x.com/big-summer-album"),
            "Big Summer Album"
        );
    }

    #[test]
    fn test_date_prefers_datetime_attr() {
        let html = Html::parse_document(
            r#"<html><body><time datetime="2024-03-01">March 1st, 2024</time></body></html>"#,
        );
        assert_eq!(extract_date(&html).unwrap(), "2024-03-01");

        let html = Html::parse_document(
            r#"<html><body><span class="date">yesterday</span></body></html>"#,
        );
        assert_eq!(extract_date(&html).unwrap(), "yesterday");
    }

    #[test]
    fn test_category_last_breadcrumb() {
        let html = Html::parse_document(
            r#"<html><body><nav class="breadcrumb">
            <a href="/">Home</a><a href="/asian/">Asian</a><a href="/asian/gravure/">Gravure</a>
            </nav></body></html>"#,
        );
        assert_eq!(extract_category(&html, "https://x.com/g/1").unwrap(), "Gravure");
    }

    #[test]
    fn test_category_from_url_path() {
        let html = Html::parse_document("<html><body></body></html>");
        assert_eq!(
            extract_category(&html, "https://x.com/category/asian-teen/page").unwrap(),
            "Asian Teen"
        );
        assert!(extract_category(&html, "https://x.com/g/1").is_none());
    }

    #[test]
    fn test_description_meta_fallback_and_cap() {
        let long = "word ".repeat(200);
        let html = Html::parse_document(&format!(
            r#"<html><head><meta name="description" content="{long}"></head><body></body></html>"#
        ));

        let description = extract_description(&html).unwrap();
        assert_eq!(description.chars().count(), MAX_DESCRIPTION_CHARS);
    }

    #[test]
    fn test_description_sanitization() {
        assert_eq!(
            sanitize_description("More at https://pornpics.com/best stuff"),
            "More at pornypics.net stuff"
        );
        assert_eq!(
            sanitize_description("see lamalinks.com and allasianpics.net"),
            "see pornypics.net and pornypics.net"
        );
        assert_eq!(sanitize_description("plain text"), "plain text");
    }

    #[test]
    fn test_metadata_record_serialization() {
        let html = Html::parse_document(
            r#"<html><body>
            <h1>Test Gallery</h1>
            <div class="tags">
                <a href="/tag/a1">one tag</a><a href="/tag/a2">two tag</a>
            </div>
            </body></html>"#,
        );

        let metadata = extract_metadata(&html, "https://x.com/g/test", 8, &NullSink);
        assert_eq!(metadata.title, "Test Gallery");
        assert_eq!(metadata.image_count, 8);

        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&metadata).unwrap()).unwrap();
        assert_eq!(json["image_count"], 8);
        assert_eq!(json["url"], "https://x.com/g/test");
        // Absent optional fields serialize as null, not missing keys.
        assert!(json["artist"].is_null());
        assert!(json.get("scraped_at").is_some());
    }
}
