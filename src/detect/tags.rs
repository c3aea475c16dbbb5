//! Tag extraction: finding the gallery's real tag list on a page full
//! of impostors.
//!
//! A tag bar, a performer-name list, a "related galleries" rail, and
//! site navigation all share the same DOM shape: a container with
//! several short `<a>` children. Extraction therefore runs three
//! strategies — tag-like link URLs, known tag selectors, and a
//! multi-signal container scorer — and merges their output through a
//! shared validator.
//!
//! Scoring signals are represented as named deltas so a winning
//! container's verdict can be inspected and tested rule by rule.

use super::{element_text, DetectEvent, EventSink};
use regex::Regex;
use ego_tree::{NodeId, NodeRef};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Maximum tags kept per gallery.
const MAX_TAGS: usize = 50;

/// Containers with more element descendants than this are never tag
/// bars (they are page sections).
const MAX_DESCENDANTS: usize = 150;

/// Minimum qualifying child texts for a container to enter scoring.
const MIN_QUALIFYING_TAGS: usize = 5;

/// Starting score for every candidate container.
const BASE_SCORE: i64 = 100;

/// Dense-image-run window: three images within this many elements mark
/// the start of the main gallery block.
const GALLERY_RUN_WINDOW: usize = 30;

/// Texts that are navigation or boilerplate, never tags.
const SKIP_WORDS: &[&str] = &[
    "tags", "tag", "tags:", "categories:", "keywords:", "characters:",
    "more", "all", "category", "categories",
    "home", "next", "prev", "previous", "»", "«", ">", "<",
    "search", "login", "register", "menu",
    "pornstars", "sex chat", "horny girls", "tik tok porn",
    "amateur cams", "live cams", "webcams", "welcome",
    "dmca", "privacy", "terms", "2257", "sitemap",
    "contact", "about", "help", "faq",
];

/// Navigation words counted against a candidate container.
const NAV_WORDS: &[&str] = &[
    "home", "about", "contact", "login", "register", "sign in", "sign up",
    "search", "pornstars", "sex chat", "horny girls",
    "tik tok porn", "amateur cams", "live cams", "webcams",
    "dmca", "privacy", "terms", "2257", "sitemap",
    "welcome", "help", "faq", "menu", "rss",
];

/// Wording that marks directory/listing sections rather than gallery
/// tag bars.
const DIRECTORY_WORDS: &[&str] = &[
    "trending", "related", "popular", "view more", "more tags",
    "more pornstar", "more categor", "more model",
    "favourite", "favorite", "featured", "suggested", "recommended",
    "top pornstar", "top model", "top artist",
    "all pornstar", "all model", "all artist", "all tag", "all categor",
    "similar", "you may", "you might", "best pornstar", "best model",
    "pornstar list", "model list", "artist list",
];

/// Class/id fragments that mark directory sections.
const DIRECTORY_CLASS_WORDS: &[&str] = &[
    "trending", "related", "popular", "sidebar", "suggested",
    "recommended", "similar", "favourite", "favorite", "featured",
    "pornstar", "model-list", "artist",
];

/// URL path segments that indicate performer/model links.
const MODEL_URL_PATTERNS: &[&str] = &[
    "/models/", "/model/", "/pornstars/", "/pornstar/",
    "/actress/", "/girls/", "/girl/", "/artists/", "/artist/",
    "/performers/", "/performer/", "/stars/", "/star/",
];

/// URL path segments that indicate tag/category links.
const TAG_URL_PATTERNS: &[&str] = &[
    "/tags/", "/tag/", "/category/", "/categories/",
    "/cat/", "/keywords/", "/keyword/", "/niches/", "/niche/",
];

/// Label texts that announce a tag list when found adjacent to it.
const TAG_LABEL_WORDS: &[&str] = &[
    "tags:", "tags", "categories:", "categories",
    "keywords:", "keywords", "characters:",
];

/// Class fragments that suggest a tag-related container.
const TAG_CLASS_HINTS: &[&str] = &["tag", "cat", "label", "info", "meta", "keyword", "badge"];

/// Model URL patterns used by the link-URL harvest (people, not tags).
const HARVEST_MODEL_PATTERNS: &[&str] = &[
    "/pornstars/", "/pornstar/", "/models/", "/model/",
    "/actress/", "/performers/", "/performer/",
];

/// Href markers harvested directly as tag links.
const HARVEST_TAG_MARKERS: &[&str] = &[
    "/category/", "/tag/", "/user_tags/", "/tags/", "/labels/", "/niches/",
];

/// Prefixes harvested only when the trailing slug is short enough to be
/// a tag name rather than a gallery slug.
const HARVEST_FILTERED_PREFIXES: &[&str] = &["/pics/", "/galleries/", "/channels/"];

/// Known tag-list CSS selectors, generic and site-specific.
const TAG_SELECTORS: &[&str] = &[
    ".tags a",
    ".tag",
    ".post-tag",
    "a[rel=\"tag\"]",
    ".label",
    ".badge",
    ".content-categories a:not(.person)",
    ".bot a",
    ".wp-tag-cloud a",
    ".tagcloud a",
    ".entry-tags a",
    ".post-tags a",
    "a.tag-link",
    "a.tag_item",
    ".tag-list a",
    ".tags-list a",
    ".tag-container a",
    ".tdn a",
    ".info-tags a",
    ".meta-tags a",
    ".categories-list a",
    ".cats a",
    ".cat-list a",
    "a[href*=\"/tag/\"]",
    "a[href*=\"/tags/\"]",
];

static ANCHOR_WITH_HREF: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").unwrap());
static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());
static A_OR_SPAN: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a, span").unwrap());
static CANDIDATE_CONTAINERS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div, ul, ol, span, section, p, nav").unwrap());

/// Person name pattern: 2-3 capitalized words ("Arisa Nakano").
static PERSON_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][a-z]+(?:\s+[A-Z][a-z]+){1,2}$").unwrap());

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// One applied scoring rule: a name and its signed contribution.
#[derive(Debug, Clone)]
pub struct Signal {
    pub name: &'static str,
    pub delta: i64,
}

/// The winning container's tags together with its score breakdown.
#[derive(Debug, Clone)]
pub struct ScoredTags {
    pub tags: Vec<String>,
    pub score: i64,
    pub signals: Vec<Signal>,
}

/// Extracts the gallery's tag list, unique, in discovery order, capped
/// at [`MAX_TAGS`].
pub fn extract_tags(document: &Html, events: &dyn EventSink) -> Vec<String> {
    let mut acc = TagAccumulator::default();

    collect_link_pattern_tags(document, &mut acc);
    collect_selector_tags(document, &mut acc);

    if let Some(scored) = heuristic_tag_extraction(document) {
        events.on_event(DetectEvent::TagContainerScored {
            score: scored.score,
            tag_count: scored.tags.len(),
        });
        for tag in &scored.tags {
            acc.add(tag);
        }
    }

    acc.into_tags()
}

/// Orders and dedups tags through the shared validator.
#[derive(Debug, Default)]
struct TagAccumulator {
    tags: Vec<String>,
    seen: HashSet<String>,
}

impl TagAccumulator {
    fn add(&mut self, raw: &str) {
        let cleaned = clean_tag_text(raw);
        if is_valid_tag(&cleaned) && self.seen.insert(cleaned.clone()) {
            self.tags.push(cleaned);
        }
    }

    fn into_tags(mut self) -> Vec<String> {
        self.tags.truncate(MAX_TAGS);
        self.tags
    }
}

/// Strips list punctuation and collapses whitespace.
fn clean_tag_text(raw: &str) -> String {
    let stripped: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | ';' | '#'))
        .collect();
    WHITESPACE_RE.replace_all(&stripped, " ").trim().to_string()
}

/// A usable tag is 2-40 chars, not purely numeric, and not boilerplate.
fn is_valid_tag(text: &str) -> bool {
    let len = text.chars().count();
    if !(2..=40).contains(&len) {
        return false;
    }
    if text.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    if SKIP_WORDS.contains(&text.to_lowercase().as_str()) {
        return false;
    }
    true
}

/// True for links marked as people rather than tags.
fn is_person_entry(element: ElementRef<'_>) -> bool {
    element.value().classes().any(|class| class == "person")
        || element.value().attr("data-models").is_some()
}

/// Strategy 1: harvest anchors whose URLs follow tag conventions.
fn collect_link_pattern_tags(document: &Html, acc: &mut TagAccumulator) {
    for link in document.select(&ANCHOR_WITH_HREF) {
        let href = link.value().attr("href").unwrap_or("");

        if is_person_entry(link) {
            continue;
        }
        if HARVEST_MODEL_PATTERNS.iter().any(|p| href.contains(p)) {
            continue;
        }

        if HARVEST_TAG_MARKERS.iter().any(|p| href.contains(p)) {
            acc.add(&element_text(link));
            continue;
        }

        // /pics/, /galleries/, /channels/ double as both tag and gallery
        // prefixes; tag slugs are short, gallery slugs are long and dashy.
        for prefix in HARVEST_FILTERED_PREFIXES {
            if let Some(idx) = href.find(prefix) {
                let remaining = href[idx + prefix.len()..].trim_matches('/');
                if !remaining.is_empty()
                    && remaining.chars().count() < 25
                    && remaining.matches('-').count() < 3
                {
                    acc.add(&element_text(link));
                }
                break;
            }
        }
    }
}

/// Strategy 2: known tag-list selectors.
fn collect_selector_tags(document: &Html, acc: &mut TagAccumulator) {
    for selector_str in TAG_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        for element in document.select(&selector) {
            if is_person_entry(element) {
                continue;
            }
            acc.add(&element_text(element));
        }
    }
}

/// Strategy 3: score every plausible container and keep the best.
///
/// Returns `None` when no candidate scores above zero.
pub fn heuristic_tag_extraction(document: &Html) -> Option<ScoredTags> {
    let (positions, gallery_pos) = document_positions(document);
    let total = positions.len();
    let mut best: Option<ScoredTags> = None;

    for container in document.select(&CANDIDATE_CONTAINERS) {
        let descendant_count = container
            .descendants()
            .skip(1)
            .filter(|n| n.value().is_element())
            .count();
        if descendant_count > MAX_DESCENDANTS {
            continue;
        }

        let children = candidate_children(container);
        if children.len() < 3 {
            continue;
        }

        let analysis = analyze_children(&children);
        if analysis.tags.len() < MIN_QUALIFYING_TAGS {
            continue;
        }
        if analysis.nav_count > analysis.tags.len() {
            continue;
        }
        if analysis.img_count > analysis.tags.len() {
            continue;
        }

        let (score, signals) = score_candidate(
            container,
            &analysis.tags,
            &analysis.hrefs,
            &positions,
            gallery_pos,
            total,
        );

        if score > best.as_ref().map_or(0, |b| b.score) {
            best = Some(ScoredTags {
                tags: analysis.tags,
                score,
                signals,
            });
        }
    }

    best
}

/// Direct children of a candidate, with `<li>` wrappers collapsed to
/// their inner `<a>`/`<span>` when the container is list-shaped.
fn candidate_children(container: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let children: Vec<ElementRef> = container.children().filter_map(ElementRef::wrap).collect();

    let li_count = children
        .iter()
        .filter(|c| c.value().name() == "li")
        .count();
    if li_count * 2 > children.len() {
        return children
            .into_iter()
            .map(|child| {
                if child.value().name() == "li" {
                    child.select(&A_OR_SPAN).next().unwrap_or(child)
                } else {
                    child
                }
            })
            .collect();
    }

    children
}

#[derive(Debug, Default)]
struct ChildAnalysis {
    tags: Vec<String>,
    hrefs: Vec<String>,
    nav_count: usize,
    img_count: usize,
}

/// Sorts a candidate's children into qualifying tag texts, navigation,
/// and image-only entries.
fn analyze_children(children: &[ElementRef<'_>]) -> ChildAnalysis {
    let mut analysis = ChildAnalysis::default();

    for child in children {
        let text = element_text(*child);
        if text.is_empty()
            || text.chars().count() > 35
            || text.chars().all(|c| c.is_ascii_digit())
        {
            continue;
        }
        if child.select(&IMG).next().is_some() && text.chars().count() < 2 {
            analysis.img_count += 1;
            continue;
        }
        if NAV_WORDS.contains(&text.to_lowercase().as_str()) {
            analysis.nav_count += 1;
            continue;
        }
        if is_person_entry(*child) {
            continue;
        }

        let href = if child.value().name() == "a" {
            child.value().attr("href").unwrap_or("")
        } else {
            ""
        };

        if !href.is_empty() {
            let href_lower = href.to_lowercase();
            if [".jpg", ".jpeg", ".png", ".gif", ".webp"]
                .iter()
                .any(|ext| href_lower.contains(ext))
            {
                continue;
            }
            analysis.tags.push(text);
            analysis.hrefs.push(href_lower);
        } else {
            analysis.tags.push(text);
        }
    }

    analysis
}

/// Applies every scoring rule to a qualifying candidate.
fn score_candidate(
    container: ElementRef<'_>,
    tags: &[String],
    hrefs: &[String],
    positions: &HashMap<NodeId, usize>,
    gallery_pos: usize,
    total: usize,
) -> (i64, Vec<Signal>) {
    let mut score = BASE_SCORE;
    let mut signals = vec![Signal {
        name: "base",
        delta: BASE_SCORE,
    }];
    let apply = |score: &mut i64, signals: &mut Vec<Signal>, name: &'static str, delta: i64| {
        *score += delta;
        signals.push(Signal { name, delta });
    };

    // An adjacent "Tags:" style label is the strongest positive signal.
    if has_tag_label(container) {
        apply(&mut score, &mut signals, "tag-label-adjacent", 500);
    }

    // Where the child links point: model pages damn, tag pages bless.
    if !hrefs.is_empty() {
        let model_links = hrefs
            .iter()
            .filter(|h| MODEL_URL_PATTERNS.iter().any(|p| h.contains(p)))
            .count();
        let tag_links = hrefs
            .iter()
            .filter(|h| TAG_URL_PATTERNS.iter().any(|p| h.contains(p)))
            .count();

        if model_links as f64 > hrefs.len() as f64 * 0.3 {
            apply(&mut score, &mut signals, "model-link-urls", -600);
        }
        if tag_links as f64 > hrefs.len() as f64 * 0.3 {
            apply(&mut score, &mut signals, "tag-link-urls", 300);
        }
    }

    // Mostly "Firstname Lastname" texts: a people list, not a tag bar.
    let name_count = tags.iter().filter(|t| PERSON_NAME_RE.is_match(t)).count();
    if !tags.is_empty() && name_count as f64 / tags.len() as f64 > 0.5 {
        apply(&mut score, &mut signals, "person-name-texts", -400);
    }

    // Tag bars usually sit above the image block.
    let container_pos = positions.get(&container.id()).copied().unwrap_or(total);
    if container_pos < gallery_pos {
        apply(&mut score, &mut signals, "before-gallery-block", 100);
    }

    if is_directory_section(container) {
        apply(&mut score, &mut signals, "directory-section", -500);
    }

    // Item count shaping: tag bars are small, directories are not.
    let n = tags.len();
    if n <= 20 {
        apply(&mut score, &mut signals, "typical-tag-count", 30);
    } else if n > 30 {
        apply(&mut score, &mut signals, "oversized-list", -100);
    }

    if has_tag_class_hint(container) {
        apply(&mut score, &mut signals, "tag-class-name", 200);
    }

    if in_header_or_footer(container) {
        let reduced = score.div_euclid(3);
        signals.push(Signal {
            name: "inside-header-or-footer",
            delta: reduced - score,
        });
        score = reduced;
    }

    (score, signals)
}

/// Element positions in document order, plus the position of the first
/// dense image run (the main gallery block).
fn document_positions(document: &Html) -> (HashMap<NodeId, usize>, usize) {
    let mut positions = HashMap::new();
    let mut img_positions = Vec::new();
    let mut index = 0usize;

    for node in document.root_element().descendants() {
        let Some(element) = node.value().as_element() else {
            continue;
        };
        positions.insert(node.id(), index);
        if element.name() == "img" {
            img_positions.push(index);
        }
        index += 1;
    }

    let mut gallery_pos = index;
    for i in 0..img_positions.len().saturating_sub(2) {
        if img_positions[i + 2] - img_positions[i] < GALLERY_RUN_WINDOW {
            gallery_pos = img_positions[i];
            break;
        }
    }

    (positions, gallery_pos)
}

/// Looks for a "Tags:" style label as an inline text node, a
/// bold/strong/label sibling, or the immediately preceding element.
fn has_tag_label(container: ElementRef<'_>) -> bool {
    for scope in [Some(container), parent_element(container)].into_iter().flatten() {
        for node in scope.children() {
            match node.value() {
                Node::Text(text) => {
                    if TAG_LABEL_WORDS.contains(&text.trim().to_lowercase().as_str()) {
                        return true;
                    }
                }
                Node::Element(element)
                    if matches!(element.name(), "strong" | "b" | "span" | "label" | "em") =>
                {
                    if let Some(child) = ElementRef::wrap(node)
                        && TAG_LABEL_WORDS.contains(&element_text(child).to_lowercase().as_str())
                    {
                        return true;
                    }
                }
                _ => {}
            }
        }
    }

    if let Some(prev) = container.prev_siblings().find_map(ElementRef::wrap)
        && TAG_LABEL_WORDS.contains(&element_text(prev).to_lowercase().as_str())
    {
        return true;
    }

    false
}

/// Checks the container's surroundings for directory-section markers:
/// class/id fragments up the lineage, wording in preceding siblings,
/// and headings inside the parent wrapper.
fn is_directory_section(container: ElementRef<'_>) -> bool {
    let parent = parent_element(container);
    let grandparent = parent.and_then(parent_element);

    for element in [Some(container), parent, grandparent].into_iter().flatten() {
        let attrs = format!(
            "{} {}",
            element.value().attr("class").unwrap_or(""),
            element.value().attr("id").unwrap_or("")
        )
        .to_lowercase();
        if DIRECTORY_CLASS_WORDS.iter().any(|w| attrs.contains(w)) {
            return true;
        }
    }

    for scope in [Some(container), parent].into_iter().flatten() {
        for sibling in scope.prev_siblings() {
            let text = node_text(sibling);
            let trimmed = text.trim().to_lowercase();
            if trimmed.chars().count() > 100 {
                // Stop at large content blocks.
                break;
            }
            if DIRECTORY_WORDS.iter().any(|w| trimmed.contains(w)) {
                return true;
            }
        }
    }

    for scope in [Some(container), parent].into_iter().flatten() {
        let Some(wrapper) = parent_element(scope) else {
            continue;
        };
        for child in wrapper.children().filter_map(ElementRef::wrap) {
            if child.id() == scope.id() || child.id() == container.id() {
                continue;
            }
            let text = element_text(child).to_lowercase();
            if text.chars().count() < 80 && DIRECTORY_WORDS.iter().any(|w| text.contains(w)) {
                return true;
            }
        }
    }

    false
}

fn has_tag_class_hint(container: ElementRef<'_>) -> bool {
    for element in [Some(container), parent_element(container)].into_iter().flatten() {
        let classes = element.value().attr("class").unwrap_or("").to_lowercase();
        if TAG_CLASS_HINTS.iter().any(|w| classes.contains(w)) {
            return true;
        }
    }
    false
}

fn in_header_or_footer(container: ElementRef<'_>) -> bool {
    container
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| matches!(ancestor.value().name(), "header" | "footer"))
}

fn parent_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.parent().and_then(ElementRef::wrap)
}

fn node_text(node: NodeRef<'_, Node>) -> String {
    match node.value() {
        Node::Text(text) => text.text.to_string(),
        Node::Element(_) => ElementRef::wrap(node).map(element_text).unwrap_or_default(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::NullSink;

    #[test]
    fn test_tag_validator() {
        assert!(is_valid_tag("amateur"));
        assert!(is_valid_tag("beach fun"));

        assert!(!is_valid_tag("x")); // too short
        assert!(!is_valid_tag("1234")); // numeric
        assert!(!is_valid_tag("home")); // stop word
        assert!(!is_valid_tag("Tags:")); // label, not a tag
        assert!(!is_valid_tag(&"a".repeat(41))); // too long
    }

    #[test]
    fn test_clean_tag_text() {
        assert_eq!(clean_tag_text("  big,  tits; "), "big tits");
        assert_eq!(clean_tag_text("#cosplay"), "cosplay");
        assert_eq!(clean_tag_text("two\n words"), "two words");
    }

    #[test]
    fn test_labeled_tag_bar_beats_related_rail() {
        let html = Html::parse_document(
            r#"<html><body>
            <div class="info">
                <strong>Tags:</strong>
                <div id="tagbar">
                    <a href="/tag/amateur">amateur</a>
                    <a href="/tag/beach">beach fun</a>
                    <a href="/tag/outdoor">outdoor</a>
                    <a href="/tag/bikini">bikini</a>
                    <a href="/tag/candid">candid</a>
                    <a href="/tag/petite">petite</a>
                </div>
            </div>
            <div id="pics">
                <img src="1.jpg"><img src="2.jpg"><img src="3.jpg"><img src="4.jpg">
            </div>
            <h3>Related Galleries</h3>
            <div id="related">
                <a href="/g/summer-set-one-0001">Summer Set One</a>
                <a href="/g/summer-set-two-0002">Summer Set Two</a>
                <a href="/g/summer-set-three-0003">Summer Set Three</a>
                <a href="/g/summer-set-four-0004">Summer Set Four</a>
                <a href="/g/summer-set-five-0005">Summer Set Five</a>
                <a href="/g/summer-set-six-0006">Summer Set Six</a>
                <a href="/g/summer-set-seven-0007">Summer Set Seven</a>
                <a href="/g/summer-set-eight-0008">Summer Set Eight</a>
                <a href="/g/summer-set-nine-0009">Summer Set Nine</a>
                <a href="/g/summer-set-ten-0010">Summer Set Ten</a>
            </div>
            </body></html>"#,
        );

        let scored = heuristic_tag_extraction(&html).unwrap();
        assert_eq!(
            scored.tags,
            vec!["amateur", "beach fun", "outdoor", "bikini", "candid", "petite"]
        );

        let tags = extract_tags(&html, &NullSink);
        assert_eq!(
            tags,
            vec!["amateur", "beach fun", "outdoor", "bikini", "candid", "petite"]
        );
    }

    #[test]
    fn test_signal_trace_sums_to_score() {
        let html = Html::parse_document(
            r#"<html><body>
            <div class="tags-wrap">
                <span>Tags:</span>
                <div id="bar">
                    <a href="/tags/a-one">first tag</a>
                    <a href="/tags/a-two">second tag</a>
                    <a href="/tags/a-three">third tag</a>
                    <a href="/tags/a-four">fourth tag</a>
                    <a href="/tags/a-five">fifth tag</a>
                </div>
            </div>
            </body></html>"#,
        );

        let scored = heuristic_tag_extraction(&html).unwrap();
        let sum: i64 = scored.signals.iter().map(|s| s.delta).sum();
        assert_eq!(sum, scored.score);
        assert!(scored.signals.iter().any(|s| s.name == "tag-label-adjacent"));
        assert!(scored.signals.iter().any(|s| s.name == "tag-link-urls"));
    }

    #[test]
    fn test_person_list_is_rejected() {
        // A model list: capitalized names linking to /models/ pages.
        // Nothing here should score above zero.
        let html = Html::parse_document(
            r#"<html><body>
            <div id="cast">
                <a href="/models/arisa">Arisa Nakano</a>
                <a href="/models/yui">Yui Sato</a>
                <a href="/models/mei">Mei Tanaka</a>
                <a href="/models/rin">Rin Suzuki</a>
                <a href="/models/aoi">Aoi Yamada</a>
                <a href="/models/emi">Emi Kimura</a>
            </div>
            </body></html>"#,
        );

        assert!(heuristic_tag_extraction(&html).is_none());
    }

    #[test]
    fn test_person_class_children_skipped() {
        let html = Html::parse_document(
            r#"<html><body>
            <div class="meta">
                <a class="person" href="/x/arisa">Arisa Nakano</a>
                <a href="/tag/solo">solo</a>
                <a href="/tag/cosplay">cosplay</a>
                <a href="/tag/gravure">gravure</a>
                <a href="/tag/idol">idol pics</a>
                <a href="/tag/studio">studio</a>
            </div>
            </body></html>"#,
        );

        let scored = heuristic_tag_extraction(&html).unwrap();
        assert!(!scored.tags.iter().any(|t| t == "Arisa Nakano"));
        assert_eq!(scored.tags.len(), 5);
    }

    #[test]
    fn test_ul_li_wrappers_collapse() {
        let html = Html::parse_document(
            r#"<html><body>
            <ul class="tag-list">
                <li><a href="/tag/one">alpha</a></li>
                <li><a href="/tag/two">bravo</a></li>
                <li><a href="/tag/three">charlie</a></li>
                <li><a href="/tag/four">delta</a></li>
                <li><a href="/tag/five">echo</a></li>
            </ul>
            </body></html>"#,
        );

        let scored = heuristic_tag_extraction(&html).unwrap();
        assert_eq!(scored.tags, vec!["alpha", "bravo", "charlie", "delta", "echo"]);
    }

    #[test]
    fn test_header_container_score_divided() {
        // Same shape twice; the copy buried in <header> must lose.
        let html = Html::parse_document(
            r#"<html><body>
            <header>
                <div class="tags"><a href="/tag/n1">november</a><a href="/tag/n2">oscar</a>
                <a href="/tag/n3">papa</a><a href="/tag/n4">quebec</a><a href="/tag/n5">romeo</a></div>
            </header>
            <div class="tags"><a href="/tag/s1">sierra</a><a href="/tag/s2">tango</a>
            <a href="/tag/s3">uniform</a><a href="/tag/s4">victor</a><a href="/tag/s5">whiskey</a></div>
            </body></html>"#,
        );

        let scored = heuristic_tag_extraction(&html).unwrap();
        assert_eq!(
            scored.tags,
            vec!["sierra", "tango", "uniform", "victor", "whiskey"]
        );
    }

    #[test]
    fn test_tag_cap_and_filtering() {
        let mut items = String::new();
        for i in 0..60 {
            items.push_str(&format!("<a href=\"/tag/t{i}\">tag number {i}</a>\n"));
        }
        // Noise that the validator must drop.
        items.push_str("<a href=\"/tag/numeric\">12345</a>");
        items.push_str("<a href=\"/tag/nav\">home</a>");

        let html = Html::parse_document(&format!(
            "<html><body><div class=\"tags\">{items}</div></body></html>"
        ));

        let tags = extract_tags(&html, &NullSink);
        assert_eq!(tags.len(), MAX_TAGS);
        assert!(!tags.iter().any(|t| t == "12345"));
        assert!(!tags.iter().any(|t| t == "home"));
    }

    #[test]
    fn test_link_url_harvest_skips_gallery_slugs() {
        let html = Html::parse_document(
            r#"<html><body>
            <a href="/pics/teen/">teen</a>
            <a href="/pics/very-long-gallery-slug-name-here-123/">Very Long Gallery</a>
            </body></html>"#,
        );

        let mut acc = TagAccumulator::default();
        collect_link_pattern_tags(&html, &mut acc);
        assert_eq!(acc.into_tags(), vec!["teen"]);
    }
}
