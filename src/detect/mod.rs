//! Gallery/image/link detection engine.
//!
//! Pure, synchronous heuristics over parsed HTML: which images on a page
//! are "the gallery" rather than navigation or ads, which links are tags
//! rather than performer names, whether a page is itself a gallery or a
//! listing of galleries, and where the next page lives.
//!
//! The engine performs no I/O and holds no shared mutable state; it may
//! be called concurrently for independent pages. Progress is reported
//! through the [`EventSink`] callback, never printed.

pub mod container;
pub mod images;
pub mod links;
pub mod listing;
pub mod metadata;
pub mod pagination;
pub mod tags;

use scraper::ElementRef;

/// Where an image URL was found on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    /// From an `<a href>` pointing at an image file (full-size).
    Linked,
    /// From an `<img>` element (inline, usually a thumbnail).
    Inline,
}

/// Images collected for one gallery across its paginated fetches.
///
/// `images` is deduplicated in first-seen order across all pages.
#[derive(Debug, Clone, Default)]
pub struct GalleryResult {
    /// Absolute image URLs, unique, in cross-page discovery order.
    pub images: Vec<String>,

    /// Number of pages fetched for this gallery.
    pub page_count: u32,
}

/// Outcome of listing-page classification.
#[derive(Debug, Clone)]
pub struct ListingClassification {
    /// True when the page reads as a grid of links to other galleries.
    pub is_listing: bool,

    /// Gallery URLs harvested from the page, unique, in document order.
    pub gallery_links: Vec<String>,
}

/// Structured events emitted by the detection engine.
///
/// Formatting and filtering are the caller's concern; the engine never
/// writes to stdout itself.
#[derive(Debug, Clone)]
pub enum DetectEvent {
    /// A configured gallery selector matched.
    ContainerMatched { selector: String, image_count: usize },
    /// No selector matched; the structural fallback picked a container.
    ContainerFallback { image_count: usize },
    /// No gallery container found; extraction will scan the whole page.
    NoContainer,
    /// The tag scorer picked a winning container.
    TagContainerScored { score: i64, tag_count: usize },
    /// The page classified as a listing of galleries.
    ListingDetected { thumb_link_count: usize },
    /// Gallery links were harvested from a listing page.
    GalleryLinksFound { count: usize },
    /// A next-page link was found.
    NextPageFound { url: String, strategy: &'static str },
}

/// Callback interface for detection events.
pub trait EventSink: Send + Sync {
    fn on_event(&self, event: DetectEvent);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn on_event(&self, _event: DetectEvent) {}
}

/// Trimmed, concatenated text content of an element.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
