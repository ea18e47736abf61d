//! HTML parser for extracting links and metadata
//!
//! This module handles parsing HTML content to extract:
//! - Links to follow (from <a> tags and canonical links)
//! - Page title
//! - Other metadata as needed

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use url::Url;

/// Elements dropped before text extraction regardless of navigation settings
const REMOVE_TAGS: &[&str] = &[
    "script", "style", "noscript", "iframe", "object", "embed", "form", "input", "button",
    "select", "textarea",
];

/// Elements dropped in addition to [`REMOVE_TAGS`] when navigation removal is enabled
const NAV_TAGS: &[&str] = &["nav", "header", "footer", "aside", "menu"];

/// Class/id substrings (case-insensitive) that mark an element as boilerplate
/// navigation when navigation removal is enabled
const NAV_PATTERNS: &[&str] = &[
    "nav",
    "menu",
    "sidebar",
    "breadcrumb",
    "pagination",
    "social",
    "share",
];

/// Selectors tried in order to locate the main content region of a page
const MAIN_CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    "[role='main']",
    ".main-content",
    ".content",
    ".post-content",
    ".entry-content",
    "#main",
    "#content",
];

const BLOCK_TAGS: &[&str] = &[
    "div", "p", "h1", "h2", "h3", "h4", "h5", "h6", "article", "section", "main", "blockquote",
    "pre",
];

/// Minimum text length (in characters) for a block-level fallback candidate
const MIN_BLOCK_TEXT_LEN: usize = 50;

/// Extracted information from an HTML page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// All links found on the page (absolute URLs)
    pub links: Vec<String>,

    /// Cleaned text extracted from the main content region
    pub text: String,

    /// Metadata collected from meta tags, JSON-LD, Open Graph, and Twitter Card
    pub metadata: HashMap<String, String>,
}

/// Parses HTML content and extracts links and metadata
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags in body, nav, header, footer
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<link rel="stylesheet" ...>`
/// - `<script src="...">`
/// - `<img src="...">`
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
///
/// **Note:** `rel="nofollow"` links ARE followed per spec
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The base URL for resolving relative links
///
/// # Returns
///
/// * `Ok(ParsedPage)` - Successfully parsed page
/// * `Err(String)` - Failed to parse HTML
///
/// # Example
///
/// ```no_run
/// use sumi_ripple::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url).unwrap();
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> Result<ParsedPage, String> {
    let document = Html::parse_document(html);

    // Extract title
    let title = extract_title(&document);

    // Extract links from the unmodified document, before any navigation/script removal
    let links = extract_links(&document, base_url)?;

    let text = extract_main_text(&document, true);
    let metadata = extract_metadata(&document, title.clone());

    Ok(ParsedPage {
        title,
        links,
        text,
        metadata,
    })
}

/// Extracts cleaned text from the page's main content region
///
/// Locates the main content element via [`MAIN_CONTENT_SELECTORS`], falling
/// back to the largest block-level element with at least
/// [`MIN_BLOCK_TEXT_LEN`] characters of text, and finally the whole
/// document. Script/style/form-like subtrees, comments, and (when
/// `remove_navigation` is set) navigation-pattern elements are excluded
/// from the walk.
fn extract_main_text(document: &Html, remove_navigation: bool) -> String {
    let root = find_main_content(document).unwrap_or_else(|| document.root_element());

    let mut raw = String::new();
    walk_text(root, remove_navigation, &mut raw);
    clean_text(&raw)
}

/// Locates the main content element using the selector cascade, falling
/// back to the largest sufficiently-long block-level element
fn find_main_content(document: &Html) -> Option<ElementRef> {
    for selector_str in MAIN_CONTENT_SELECTORS {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = document.select(&selector).next() {
                return Some(element);
            }
        }
    }

    let mut best: Option<(ElementRef, usize)> = None;
    for tag in BLOCK_TAGS {
        let Ok(selector) = Selector::parse(tag) else {
            continue;
        };
        for element in document.select(&selector) {
            let mut buf = String::new();
            walk_text(element, true, &mut buf);
            let len = buf.trim().len();
            if len >= MIN_BLOCK_TEXT_LEN && best.as_ref().map(|(_, l)| len > *l).unwrap_or(true) {
                best = Some((element, len));
            }
        }
    }

    best.map(|(element, _)| element)
}

/// Returns true if an element should be excluded from text extraction
fn is_excluded_element(element: &ElementRef, remove_navigation: bool) -> bool {
    let name = element.value().name();

    if REMOVE_TAGS.contains(&name) {
        return true;
    }

    if let Some(style) = element.value().attr("style") {
        let style = style.to_lowercase();
        if style.contains("display:none") || style.contains("display: none") {
            return true;
        }
        if style.contains("visibility:hidden") || style.contains("visibility: hidden") {
            return true;
        }
    }

    if remove_navigation {
        if NAV_TAGS.contains(&name) {
            return true;
        }

        let class_and_id = format!(
            "{} {}",
            element.value().attr("class").unwrap_or(""),
            element.value().attr("id").unwrap_or("")
        )
        .to_lowercase();

        if NAV_PATTERNS.iter().any(|pat| class_and_id.contains(pat)) {
            return true;
        }
    }

    false
}

/// Recursively collects text from an element, skipping excluded subtrees and comments
fn walk_text(element: ElementRef, remove_navigation: bool, out: &mut String) {
    if is_excluded_element(&element, remove_navigation) {
        return;
    }

    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        } else if let Some(child_element) = ElementRef::wrap(child) {
            walk_text(child_element, remove_navigation, out);
        }
    }
}

/// Extracts the given user-agent, meta-tag, Open Graph/Twitter, and JSON-LD metadata
fn extract_metadata(document: &Html, title: Option<String>) -> HashMap<String, String> {
    let mut metadata = HashMap::new();

    if let Some(title) = title {
        metadata.insert("title".to_string(), title);
    }

    if let Ok(meta_selector) = Selector::parse("meta") {
        for element in document.select(&meta_selector) {
            let name = element
                .value()
                .attr("name")
                .or_else(|| element.value().attr("property"))
                .or_else(|| element.value().attr("http-equiv"));

            if let (Some(name), Some(content)) = (name, element.value().attr("content")) {
                let content = content.trim();
                if !content.is_empty() {
                    metadata.insert(name.to_lowercase(), content.to_string());
                }
            }
        }
    }

    extract_json_ld(document, &mut metadata);

    metadata
}

/// Pulls `name`/`description`/`@type` out of `<script type="application/ld+json">` blocks
///
/// Uses a targeted regex scan rather than a full JSON parser since only a
/// handful of top-level string fields are of interest here.
fn extract_json_ld(document: &Html, metadata: &mut HashMap<String, String>) {
    let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return;
    };

    let name_re = Regex::new(r#""name"\s*:\s*"([^"]*)""#).unwrap();
    let description_re = Regex::new(r#""description"\s*:\s*"([^"]*)""#).unwrap();
    let type_re = Regex::new(r#""@type"\s*:\s*"([^"]*)""#).unwrap();

    for element in document.select(&selector) {
        let raw = element.text().collect::<String>();

        if metadata.get("structured_name").is_none() {
            if let Some(cap) = name_re.captures(&raw) {
                metadata.insert("structured_name".to_string(), cap[1].to_string());
            }
        }
        if metadata.get("structured_description").is_none() {
            if let Some(cap) = description_re.captures(&raw) {
                metadata.insert("structured_description".to_string(), cap[1].to_string());
            }
        }
        if metadata.get("structured_type").is_none() {
            if let Some(cap) = type_re.captures(&raw) {
                metadata.insert("structured_type".to_string(), cap[1].to_string());
            }
        }
    }
}

/// Collapses whitespace, trims excessive punctuation runs, strips non-printable
/// characters, and removes embedded URLs/email addresses
fn clean_text(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let whitespace_re = Regex::new(r"\s+").unwrap();
    let dots_re = Regex::new(r"\.{3,}").unwrap();
    let dashes_re = Regex::new(r"-{3,}").unwrap();
    let url_re = Regex::new(r"https?://\S+").unwrap();
    let email_re = Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap();

    let collapsed = whitespace_re.replace_all(text, " ");
    let no_urls = url_re.replace_all(&collapsed, "");
    let no_emails = email_re.replace_all(&no_urls, "");
    let no_dots = dots_re.replace_all(&no_emails, "...");
    let no_dashes = dashes_re.replace_all(&no_dots, "---");

    let printable: String = no_dashes
        .chars()
        .filter(|&c| {
            let code = c as u32;
            (0x20..=0x7E).contains(&code) || (0xA0..=0xFFFF).contains(&code)
        })
        .collect();

    whitespace_re.replace_all(&printable, " ").trim().to_string()
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts all valid links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Result<Vec<String>, String> {
    let mut links = Vec::new();

    // Extract links from <a> tags
    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            // Skip if it has the download attribute
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    // Extract canonical link
    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    Ok(links)
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    // Skip empty hrefs
    if href.is_empty() {
        return None;
    }

    // Skip special schemes
    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    // Skip fragment-only links (same page anchors)
    if href.starts_with('#') {
        return None;
    }

    // Try to resolve the URL
    match base_url.join(href) {
        Ok(absolute_url) => {
            // Only accept HTTP and HTTPS URLs
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

/// Convenience function for extracting just the links from HTML
///
/// # Arguments
///
/// * `html` - The HTML content
/// * `base_url` - The base URL for resolving relative links
///
/// # Returns
///
/// A vector of absolute URLs found in the HTML
pub fn extract_links_simple(html: &str, base_url: &Url) -> Vec<String> {
    parse_html(html, base_url)
        .map(|parsed| parsed.links)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/page").unwrap()
    }

    #[test]
    fn test_extract_title() {
        let html = r#"<html><head><title>Test Page</title></head><body></body></html>"#;
        let parsed = parse_html(html, &base_url()).unwrap();
        assert_eq!(parsed.title, Some("Test Page".to_string()));
    }

    #[test]
    fn test_extract_title_with_whitespace() {
        let html = r#"<html><head><title>  Test Page  </title></head><body></body></html>"#;
        let parsed = parse_html(html, &base_url()).unwrap();
        assert_eq!(parsed.title, Some("Test Page".to_string()));
    }

    #[test]
    fn test_no_title() {
        let html = r#"<html><head></head><body></body></html>"#;
        let parsed = parse_html(html, &base_url()).unwrap();
        assert_eq!(parsed.title, None);
    }

    #[test]
    fn test_extract_absolute_link() {
        let html = r#"<html><body><a href="https://other.com/page">Link</a></body></html>"#;
        let parsed = parse_html(html, &base_url()).unwrap();
        assert_eq!(parsed.links.len(), 1);
        assert_eq!(parsed.links[0], "https://other.com/page");
    }

    #[test]
    fn test_extract_relative_link() {
        let html = r#"<html><body><a href="/other">Link</a></body></html>"#;
        let parsed = parse_html(html, &base_url()).unwrap();
        assert_eq!(parsed.links.len(), 1);
        assert_eq!(parsed.links[0], "https://example.com/other");
    }

    #[test]
    fn test_extract_relative_path_link() {
        let html = r#"<html><body><a href="other">Link</a></body></html>"#;
        let parsed = parse_html(html, &base_url()).unwrap();
        assert_eq!(parsed.links.len(), 1);
        assert_eq!(parsed.links[0], "https://example.com/other");
    }

    #[test]
    fn test_skip_javascript_link() {
        let html = r#"<html><body><a href="javascript:void(0)">Link</a></body></html>"#;
        let parsed = parse_html(html, &base_url()).unwrap();
        assert_eq!(parsed.links.len(), 0);
    }

    #[test]
    fn test_skip_mailto_link() {
        let html = r#"<html><body><a href="mailto:test@example.com">Email</a></body></html>"#;
        let parsed = parse_html(html, &base_url()).unwrap();
        assert_eq!(parsed.links.len(), 0);
    }

    #[test]
    fn test_skip_tel_link() {
        let html = r#"<html><body><a href="tel:+1234567890">Call</a></body></html>"#;
        let parsed = parse_html(html, &base_url()).unwrap();
        assert_eq!(parsed.links.len(), 0);
    }

    #[test]
    fn test_skip_data_uri() {
        let html = r#"<html><body><a href="data:text/html,<h1>Test</h1>">Data</a></body></html>"#;
        let parsed = parse_html(html, &base_url()).unwrap();
        assert_eq!(parsed.links.len(), 0);
    }

    #[test]
    fn test_skip_download_link() {
        let html = r#"<html><body><a href="/file.pdf" download>Download</a></body></html>"#;
        let parsed = parse_html(html, &base_url()).unwrap();
        assert_eq!(parsed.links.len(), 0);
    }

    #[test]
    fn test_skip_fragment_only() {
        let html = r##"<html><body><a href="#section">Jump</a></body></html>"##;
        let parsed = parse_html(html, &base_url()).unwrap();
        assert_eq!(parsed.links.len(), 0);
    }

    #[test]
    fn test_follow_nofollow_links() {
        let html = r#"<html><body><a href="/page" rel="nofollow">Link</a></body></html>"#;
        let parsed = parse_html(html, &base_url()).unwrap();
        assert_eq!(parsed.links.len(), 1);
        assert_eq!(parsed.links[0], "https://example.com/page");
    }

    #[test]
    fn test_extract_canonical_link() {
        let html = r#"<html><head><link rel="canonical" href="https://example.com/canonical" /></head><body></body></html>"#;
        let parsed = parse_html(html, &base_url()).unwrap();
        assert!(parsed
            .links
            .contains(&"https://example.com/canonical".to_string()));
    }

    #[test]
    fn test_multiple_links() {
        let html = r#"
            <html>
            <body>
                <a href="/page1">Link 1</a>
                <a href="/page2">Link 2</a>
                <a href="https://other.com/page3">Link 3</a>
            </body>
            </html>
        "#;
        let parsed = parse_html(html, &base_url()).unwrap();
        assert_eq!(parsed.links.len(), 3);
    }

    #[test]
    fn test_mixed_valid_and_invalid_links() {
        let html = r#"
            <html>
            <body>
                <a href="/valid">Valid</a>
                <a href="javascript:alert('no')">Invalid</a>
                <a href="mailto:test@example.com">Invalid</a>
                <a href="/another-valid">Valid</a>
            </body>
            </html>
        "#;
        let parsed = parse_html(html, &base_url()).unwrap();
        assert_eq!(parsed.links.len(), 2);
    }

    #[test]
    fn test_extract_main_content_from_article() {
        let html = r#"<html><body>
            <nav>Home About</nav>
            <article><p>This is the real article content that matters most.</p></article>
            <footer>Copyright 2026</footer>
        </body></html>"#;
        let parsed = parse_html(html, &base_url()).unwrap();
        assert!(parsed.text.contains("real article content"));
        assert!(!parsed.text.contains("Home About"));
        assert!(!parsed.text.contains("Copyright"));
    }

    #[test]
    fn test_script_and_style_excluded_from_text() {
        let html = r#"<html><body>
            <article>
                <script>alert('hi')</script>
                <style>.x { color: red }</style>
                <p>Visible content here that is long enough to matter for extraction.</p>
            </article>
        </body></html>"#;
        let parsed = parse_html(html, &base_url()).unwrap();
        assert!(parsed.text.contains("Visible content"));
        assert!(!parsed.text.contains("alert"));
        assert!(!parsed.text.contains("color: red"));
    }

    #[test]
    fn test_hidden_style_element_excluded() {
        let html = r#"<html><body>
            <article>
                <div style="display:none">Hidden text should not appear</div>
                <p>Shown text that should appear in the output every time.</p>
            </article>
        </body></html>"#;
        let parsed = parse_html(html, &base_url()).unwrap();
        assert!(!parsed.text.contains("Hidden text"));
        assert!(parsed.text.contains("Shown text"));
    }

    #[test]
    fn test_fallback_to_largest_block_when_no_main_selector() {
        let html = r#"<html><body>
            <div>short</div>
            <div>This is a much longer block of text that should be picked as the main content area since nothing else matches.</div>
        </body></html>"#;
        let parsed = parse_html(html, &base_url()).unwrap();
        assert!(parsed.text.contains("much longer block"));
    }

    #[test]
    fn test_metadata_extracts_meta_tags() {
        let html = r#"<html><head>
            <title>My Page</title>
            <meta name="description" content="A great page">
            <meta property="og:title" content="OG Title">
        </head><body></body></html>"#;
        let parsed = parse_html(html, &base_url()).unwrap();
        assert_eq!(parsed.metadata.get("title"), Some(&"My Page".to_string()));
        assert_eq!(
            parsed.metadata.get("description"),
            Some(&"A great page".to_string())
        );
        assert_eq!(
            parsed.metadata.get("og:title"),
            Some(&"OG Title".to_string())
        );
    }

    #[test]
    fn test_metadata_extracts_json_ld() {
        let html = r#"<html><head>
            <script type="application/ld+json">{"@type": "Article", "name": "Structured Title", "description": "Structured desc"}</script>
        </head><body></body></html>"#;
        let parsed = parse_html(html, &base_url()).unwrap();
        assert_eq!(
            parsed.metadata.get("structured_name"),
            Some(&"Structured Title".to_string())
        );
        assert_eq!(
            parsed.metadata.get("structured_type"),
            Some(&"Article".to_string())
        );
    }

    #[test]
    fn test_clean_text_removes_urls_and_emails() {
        let cleaned = clean_text("Visit https://example.com/path or email me@example.com now");
        assert!(!cleaned.contains("https://"));
        assert!(!cleaned.contains("@example.com"));
        assert!(cleaned.contains("Visit"));
    }

    #[test]
    fn test_clean_text_collapses_whitespace_and_punctuation_runs() {
        let cleaned = clean_text("too   many     spaces... and----dashes");
        assert!(!cleaned.contains("   "));
        assert!(cleaned.contains("..."));
        assert!(cleaned.contains("---"));
    }

    #[test]
    fn test_clean_text_empty_input() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("   "), "");
    }
}
