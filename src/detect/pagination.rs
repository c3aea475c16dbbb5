//! Next-page detection for gallery and listing pagination.
//!
//! Gallery pagination trusts the configured selector list. Listing
//! pagination has no configuration to lean on, so it falls back through
//! three strategies: literal "next" link texts, a page-2 link on page 1,
//! and a fixed list of common pagination selectors.

use super::links::resolve_url;
use super::{element_text, DetectEvent, EventSink};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

/// Link texts treated as "next" controls, compared case-insensitively
/// after trimming.
const NEXT_TOKENS: &[&str] = &[
    "next", "next page", "»", ">", "→",
    "weiter", "suivant", "siguiente", "próxima", "次へ", "下一页",
];

/// Common pagination selectors tried when no textual control matches.
const NEXT_SELECTOR_FALLBACKS: &[&str] = &[
    "a.next",
    "a[rel=\"next\"]",
    ".pagination a",
    ".pager a",
    "a.nextpostslink",
];

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

static NEXT_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    NEXT_SELECTOR_FALLBACKS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .collect()
});

/// Finds the next gallery page using the configured selector list, in
/// order, returning the first resolvable href.
pub fn detect_next_page(
    document: &Html,
    current_url: &str,
    pagination_selectors: &[String],
    events: &dyn EventSink,
) -> Option<String> {
    for selector_str in pagination_selectors {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        for link in document.select(&selector) {
            if let Some(url) = usable_href(link, current_url) {
                events.on_event(DetectEvent::NextPageFound {
                    url: url.clone(),
                    strategy: "configured-selector",
                });
                return Some(url);
            }
        }
    }

    None
}

/// Finds the next listing page through the three-strategy fallback
/// chain.
pub fn detect_next_listing_page(
    document: &Html,
    current_url: &str,
    events: &dyn EventSink,
) -> Option<String> {
    // Strategy 1: an anchor whose text is a "next" token.
    for link in document.select(&ANCHOR) {
        let text = element_text(link).to_lowercase();
        if NEXT_TOKENS.contains(&text.as_str())
            && let Some(url) = usable_href(link, current_url)
        {
            events.on_event(DetectEvent::NextPageFound {
                url: url.clone(),
                strategy: "next-token",
            });
            return Some(url);
        }
    }

    // Strategy 2: on page 1 (no page query parameter), a literal "2"
    // link whose href mentions paging.
    if !has_page_param(current_url) {
        for link in document.select(&ANCHOR) {
            if element_text(link) == "2"
                && link.value().attr("href").is_some_and(|h| h.contains("page"))
                && let Some(url) = usable_href(link, current_url)
            {
                events.on_event(DetectEvent::NextPageFound {
                    url: url.clone(),
                    strategy: "page-two",
                });
                return Some(url);
            }
        }
    }

    // Strategy 3: common pagination selectors, first match each.
    for selector in NEXT_SELECTORS.iter() {
        if let Some(link) = document.select(selector).next()
            && let Some(url) = usable_href(link, current_url)
        {
            events.on_event(DetectEvent::NextPageFound {
                url: url.clone(),
                strategy: "selector-fallback",
            });
            return Some(url);
        }
    }

    None
}

/// Resolves an anchor's href, rejecting empty and `#` pseudo-links.
fn usable_href(link: ElementRef<'_>, current_url: &str) -> Option<String> {
    let href = link.value().attr("href")?.trim();
    if href.is_empty() || href == "#" {
        return None;
    }
    Some(resolve_url(current_url, href))
}

fn has_page_param(url: &str) -> bool {
    Url::parse(url).is_ok_and(|u| u.query_pairs().any(|(key, _)| key == "page"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::NullSink;

    const URL: &str = "https://x.com/asian";

    #[test]
    fn test_configured_selector_order() {
        let html = Html::parse_document(
            r#"<html><body>
            <div class="pagination"><a href="/asian?page=5">5</a></div>
            <a class="next" href="/asian?page=2">Next</a>
            </body></html>"#,
        );

        let selectors = vec!["a.next".to_string(), ".pagination a".to_string()];
        let next = detect_next_page(&html, URL, &selectors, &NullSink).unwrap();
        assert_eq!(next, "https://x.com/asian?page=2");
    }

    #[test]
    fn test_no_pagination_selectors_finds_nothing() {
        let html = Html::parse_document(
            r#"<html><body><a class="next" href="/p2">Next</a></body></html>"#,
        );
        assert!(detect_next_page(&html, URL, &[], &NullSink).is_none());
    }

    #[test]
    fn test_listing_next_token() {
        let html = Html::parse_document(
            r#"<html><body>
            <a href="/asian?page=1">1</a>
            <a href="/asian?page=2">NEXT</a>
            </body></html>"#,
        );

        let next = detect_next_listing_page(&html, URL, &NullSink).unwrap();
        assert_eq!(next, "https://x.com/asian?page=2");
    }

    #[test]
    fn test_listing_arrow_token() {
        let html = Html::parse_document(
            r#"<html><body><a href="/asian/page/2/">»</a></body></html>"#,
        );

        let next = detect_next_listing_page(&html, URL, &NullSink).unwrap();
        assert_eq!(next, "https://x.com/asian/page/2/");
    }

    #[test]
    fn test_listing_page_two_strategy() {
        let html = Html::parse_document(
            r#"<html><body>
            <a href="/asian?page=2">2</a>
            <a href="/asian?page=3">3</a>
            </body></html>"#,
        );

        // On page 1, the "2" anchor is the next page.
        let next = detect_next_listing_page(&html, URL, &NullSink).unwrap();
        assert_eq!(next, "https://x.com/asian?page=2");

        // Already paginated: the "2" shortcut no longer applies.
        assert!(
            detect_next_listing_page(&html, "https://x.com/asian?page=2", &NullSink).is_none()
        );
    }

    #[test]
    fn test_listing_selector_fallback() {
        let html = Html::parse_document(
            r#"<html><body>
            <a rel="next" href="/asian/seite-2/">weiter geht's</a>
            </body></html>"#,
        );

        let next = detect_next_listing_page(&html, URL, &NullSink).unwrap();
        assert_eq!(next, "https://x.com/asian/seite-2/");
    }

    #[test]
    fn test_empty_and_hash_hrefs_never_returned() {
        let html = Html::parse_document(
            r##"<html><body>
            <a href="#">Next</a>
            <a href="">Next</a>
            </body></html>"##,
        );

        assert!(detect_next_listing_page(&html, URL, &NullSink).is_none());
    }
}
