//! Pure URL classification predicates.
//!
//! These are the smallest building blocks of the detection engine:
//! deciding whether an href points at an image file, and whether a link
//! is site navigation rather than content. Malformed URLs never raise;
//! they simply fail to match.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// File extensions treated as images (checked against the URL path with
/// the query string stripped).
const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp"];

/// Navigational and non-content URL patterns.
///
/// Matched against both the full URL and the lowercased path, so query
/// parameters (`?page=2`) and path shapes (`/tag/foo/`) are both caught.
static EXCLUDED_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^/?$",
        r"[?&]page=",
        r"[?&]sort=",
        r"[?&]filter=",
        r"/page/\d+/?$",
        r"/tag/[^/]+/?$",
        r"/tags/[^/]+/?$",
        r"/category/[^/]+/?$",
        r"/categories/?$",
        r"/channels/?$",
        r"/pornstars/?$",
        r"/pornstar/[^/]+/?$",
        r"/models/?$",
        r"/search",
        r"/login",
        r"/register",
        r"/dmca",
        r"/privacy",
        r"/terms",
        r"/contact",
        r"/about",
        r"/sitemap",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid exclusion pattern"))
    .collect()
});

/// Checks whether a URL points at an image file.
///
/// True iff the URL's path (query string stripped) ends in a known image
/// extension, case-insensitive. A `data:` URI is never an image URL
/// regardless of its content.
pub fn is_image_url(url: &str) -> bool {
    if url.is_empty() || url.starts_with("data:") {
        return false;
    }

    let path = url_path(url).to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Checks whether a URL matches a navigational/non-content pattern:
/// pagination, sort/filter query params, tag/category/search/login and
/// similar site chrome.
pub fn is_excluded_link(url: &str) -> bool {
    let path = url_path(url).to_lowercase();
    EXCLUDED_PATTERNS
        .iter()
        .any(|pattern| pattern.is_match(url) || pattern.is_match(&path))
}

/// Resolves a possibly-relative href against the page URL.
///
/// Falls back to returning the href unchanged when the base cannot be
/// parsed, mirroring lenient urljoin behavior.
pub fn resolve_url(base: &str, href: &str) -> String {
    if let Ok(base_url) = Url::parse(base)
        && let Ok(resolved) = base_url.join(href)
    {
        return resolved.to_string();
    }

    href.to_string()
}

/// Path component of a URL, tolerating relative references.
fn url_path(url: &str) -> String {
    if let Ok(parsed) = Url::parse(url) {
        return parsed.path().to_string();
    }

    // Relative reference: strip query and fragment by hand.
    let end = url.find(['?', '#']).unwrap_or(url.len());
    url[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_url_extensions() {
        assert!(is_image_url("https://x.com/a.jpg"));
        assert!(is_image_url("https://x.com/a.JPG?x=1"));
        assert!(is_image_url("https://x.com/pics/photo.webp"));
        assert!(is_image_url("/relative/path/img.png"));
        assert!(is_image_url("img/thumb.gif"));

        assert!(!is_image_url("https://x.com/a.html"));
        assert!(!is_image_url("https://x.com/a.jpg.html"));
        assert!(!is_image_url("https://x.com/gallery/"));
        assert!(!is_image_url(""));
    }

    #[test]
    fn test_data_uri_never_image() {
        assert!(!is_image_url("data:image/png;base64,AAA"));
        assert!(!is_image_url("data:image/jpeg;base64,/9j/4AAQ.jpg"));
    }

    #[test]
    fn test_query_string_stripped() {
        assert!(is_image_url("https://cdn.x.com/full/123.jpeg?token=abc&w=1920"));
        assert!(!is_image_url("https://x.com/view?img=a.jpg"));
    }

    #[test]
    fn test_excluded_navigation_links() {
        assert!(is_excluded_link("https://x.com/?page=2"));
        assert!(is_excluded_link("https://x.com/galleries?sort=new"));
        assert!(is_excluded_link("https://x.com/page/3/"));
        assert!(is_excluded_link("https://x.com/tag/amateur/"));
        assert!(is_excluded_link("https://x.com/category/asian"));
        assert!(is_excluded_link("https://x.com/login"));
        assert!(is_excluded_link("https://x.com/dmca"));
        assert!(is_excluded_link("https://x.com/sitemap.xml"));
        assert!(is_excluded_link("https://x.com/"));
    }

    #[test]
    fn test_content_links_not_excluded() {
        assert!(!is_excluded_link("https://x.com/gallery/cute-girl-beach-1234"));
        assert!(!is_excluded_link("https://x.com/album/98765"));
        assert!(!is_excluded_link("https://x.com/pics/summer-set-photos-2024"));
    }

    #[test]
    fn test_malformed_urls_do_not_match() {
        assert!(!is_image_url("::::"));
        assert!(!is_excluded_link("ht!tp://weird"));
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(
            resolve_url("https://x.com/gallery/set/", "../full/a.jpg"),
            "https://x.com/gallery/full/a.jpg"
        );
        assert_eq!(
            resolve_url("https://x.com/gallery/", "/abs/b.png"),
            "https://x.com/abs/b.png"
        );
        assert_eq!(
            resolve_url("https://x.com/", "https://cdn.y.com/c.gif"),
            "https://cdn.y.com/c.gif"
        );
        // Unparseable base: href passes through untouched.
        assert_eq!(resolve_url("not a url", "d.jpg"), "d.jpg");
    }
}
