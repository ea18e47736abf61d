//! Sitemap discovery and parsing
//!
//! Discovers sitemap URLs for a domain (robots-declared plus a fixed set of
//! common paths), fetches each, and extracts the URLs it lists. A sitemap
//! index's children are returned as additional sitemap URLs rather than
//! expanded recursively here.

use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use std::time::Duration;
use url::Url;

/// Common sitemap paths probed when robots.txt declares none (or in
/// addition to what it declares). The last two cover sites that nest their
/// sitemap under a dedicated directory.
const COMMON_SITEMAP_PATHS: &[&str] = &[
    "/sitemap.xml",
    "/sitemap_index.xml",
    "/sitemaps.xml",
    "/sitemap/sitemap.xml",
    "/sitemaps/sitemap.xml",
];

/// Extracts `Sitemap:` directive values from raw robots.txt content
pub fn declared_sitemaps(robots_content: &str) -> Vec<String> {
    robots_content
        .lines()
        .filter_map(|line| {
            let line = line.split('#').next().unwrap_or("").trim();
            let (field, value) = line.split_once(':')?;
            if field.trim().eq_ignore_ascii_case("sitemap") {
                Some(value.trim().to_string())
            } else {
                None
            }
        })
        .collect()
}

/// Probes the fixed set of common sitemap paths for a domain via HEAD,
/// returning those that respond 200 with an XML content type.
///
/// `origin` supplies the scheme, host, and port to probe under (any URL on
/// the domain works; only its origin is used) rather than assuming HTTPS on
/// the default port, so this works the same against a real site and a test
/// HTTP server on an arbitrary port.
///
/// Failures (network error, timeout, non-200, wrong content type) are
/// silently skipped; sitemap discovery never aborts a crawl.
pub async fn probe_common_paths(client: &Client, origin: &Url) -> Vec<String> {
    let mut found = Vec::new();

    for path in COMMON_SITEMAP_PATHS {
        let Ok(url) = origin.join(path) else {
            continue;
        };
        let response = match tokio::time::timeout(Duration::from_secs(10), client.head(url.as_str()).send())
            .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::debug!("sitemap probe failed for {}: {}", url, e);
                continue;
            }
            Err(_) => {
                tracing::debug!("sitemap probe timed out for {}", url);
                continue;
            }
        };

        if !response.status().is_success() {
            continue;
        }

        let is_xml = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("xml"))
            .unwrap_or(false);

        if is_xml {
            found.push(url.to_string());
        }
    }

    found
}

fn loc_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("loc").expect("static selector"))
}

fn loc_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<loc>\s*([^<\s]+)\s*</loc>").expect("static regex"))
}

/// Extracts `<loc>` entries from sitemap (or sitemap index) XML
///
/// Parses with `scraper`'s HTML parser first (lenient enough for
/// well-formed sitemap XML); if that yields nothing, falls back to a
/// regex scan, which tolerates XML declarations and namespaces that
/// occasionally trip up the HTML parser.
///
/// Results are capped at `max_entries` to bound memory and downstream
/// queue pressure from very large sitemaps.
pub fn extract_locations(xml: &str, max_entries: usize) -> Vec<String> {
    let document = Html::parse_document(xml);
    let mut locations: Vec<String> = document
        .select(loc_selector())
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if locations.is_empty() {
        locations = loc_regex()
            .captures_iter(xml)
            .filter_map(|cap| cap.get(1).map(|m| m.as_str().trim().to_string()))
            .filter(|s| !s.is_empty())
            .collect();
    }

    locations.truncate(max_entries);
    locations
}

/// Fetches a sitemap URL and extracts its `<loc>` entries
///
/// Fails open: any network error, timeout, or non-200 response yields an
/// empty list rather than propagating an error, matching how missing or
/// broken sitemaps are treated elsewhere in discovery.
pub async fn fetch_and_parse(client: &Client, sitemap_url: &str, max_entries: usize) -> Vec<String> {
    let response = match tokio::time::timeout(
        Duration::from_secs(10),
        client.get(sitemap_url).send(),
    )
    .await
    {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            tracing::debug!("sitemap fetch failed for {}: {}", sitemap_url, e);
            return Vec::new();
        }
        Err(_) => {
            tracing::debug!("sitemap fetch timed out for {}", sitemap_url);
            return Vec::new();
        }
    };

    if !response.status().is_success() {
        return Vec::new();
    }

    match response.text().await {
        Ok(body) => extract_locations(&body, max_entries),
        Err(e) => {
            tracing::debug!("failed to read sitemap body for {}: {}", sitemap_url, e);
            Vec::new()
        }
    }
}
