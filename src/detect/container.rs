//! Gallery container location.
//!
//! Finds the DOM node that *is* the gallery, as opposed to sidebars,
//! headers, and "related" rails. Configured selectors are tried first;
//! a structural fallback based on image density runs when none match.

use super::{DetectEvent, EventSink};
use crate::config::DetectionConfig;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());

/// Element kinds considered by the structural fallback.
static FALLBACK_CANDIDATES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div, article, section, main").unwrap());

/// Minimum `<img>` descendants for the fallback to consider a node a
/// gallery at all.
const MIN_FALLBACK_IMAGES: usize = 3;

/// Locates the main gallery container, or `None` when no candidate
/// qualifies (callers then fall back to whole-document extraction).
///
/// Configured selectors are tried in order; within one selector the
/// match with the most `<img>` descendants wins, ties going to the
/// earliest match in document order. The structural fallback considers
/// every `div`/`article`/`section`/`main`, discards any that contain a
/// match of an exclusion selector, and keeps the densest candidate with
/// at least [`MIN_FALLBACK_IMAGES`] images.
pub fn locate_gallery_container<'a>(
    document: &'a Html,
    config: &DetectionConfig,
    events: &dyn EventSink,
) -> Option<ElementRef<'a>> {
    for selector_str in &config.gallery_selectors {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };

        let mut best: Option<(ElementRef<'a>, usize)> = None;
        for element in document.select(&selector) {
            let count = image_count(element);
            if best.as_ref().is_none_or(|(_, c)| count > *c) {
                best = Some((element, count));
            }
        }

        if let Some((element, count)) = best
            && count > 0
        {
            events.on_event(DetectEvent::ContainerMatched {
                selector: selector_str.clone(),
                image_count: count,
            });
            return Some(element);
        }
    }

    let exclude: Vec<Selector> = config
        .exclude_selectors
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .collect();

    let mut best: Option<(ElementRef<'a>, usize)> = None;
    for element in document.select(&FALLBACK_CANDIDATES) {
        if exclude
            .iter()
            .any(|sel| element.select(sel).next().is_some())
        {
            continue;
        }

        let count = image_count(element);
        if count < MIN_FALLBACK_IMAGES {
            continue;
        }

        if best.as_ref().is_none_or(|(_, c)| count > *c) {
            best = Some((element, count));
        }
    }

    match best {
        Some((element, count)) => {
            events.on_event(DetectEvent::ContainerFallback { image_count: count });
            Some(element)
        }
        None => {
            events.on_event(DetectEvent::NoContainer);
            None
        }
    }
}

fn image_count(element: ElementRef<'_>) -> usize {
    element.select(&IMG).count()
}
