//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching robots.txt files.
//! It respects robots.txt directives when crawling websites.

mod cache;
mod parser;
pub mod sitemap;

pub use cache::CachedRobots;
pub use parser::ParsedRobots;

use crate::SumiError;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Fetches robots.txt for the origin (scheme + host + port) of `origin_url`
///
/// Fails open: any network error, timeout, or non-200 response is treated
/// as "no robots.txt restrictions" rather than aborting the crawl, matching
/// how most polite crawlers treat a missing or unreachable robots.txt.
///
/// Builds the robots.txt URL by joining `/robots.txt` onto `origin_url`'s
/// origin rather than assuming HTTPS on port 443, so this works the same
/// against a real site and a test HTTP server on an arbitrary port.
///
/// # Arguments
///
/// * `client` - HTTP client to reuse (pool, TLS config, user agent already set)
/// * `origin_url` - Any URL on the domain; only its scheme/host/port are used
/// * `user_agent` - The user agent string, used only for logging here
///
/// # Returns
///
/// Always `Ok` — fetch/parse failures degrade to `ParsedRobots::allow_all()`
pub async fn fetch_robots(
    client: &Client,
    origin_url: &Url,
    user_agent: &str,
) -> Result<ParsedRobots, SumiError> {
    let Ok(url) = origin_url.join("/robots.txt") else {
        return Ok(ParsedRobots::allow_all());
    };

    let response = match tokio::time::timeout(Duration::from_secs(10), client.get(url.as_str()).send())
        .await
    {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            tracing::debug!("robots.txt fetch failed for {}: {}", url, e);
            return Ok(ParsedRobots::allow_all());
        }
        Err(_) => {
            tracing::debug!("robots.txt fetch timed out for {}", url);
            return Ok(ParsedRobots::allow_all());
        }
    };

    if !response.status().is_success() {
        tracing::debug!(
            "robots.txt for {} returned {}, treating as allow-all",
            url,
            response.status()
        );
        return Ok(ParsedRobots::allow_all());
    }

    match response.text().await {
        Ok(content) => {
            tracing::debug!(
                "Fetched robots.txt for {} ({} bytes, user agent {})",
                url,
                content.len(),
                user_agent
            );
            Ok(ParsedRobots::from_content(&content))
        }
        Err(e) => {
            tracing::debug!("Failed to read robots.txt body for {}: {}", url, e);
            Ok(ParsedRobots::allow_all())
        }
    }
}

/// Checks if a URL is allowed by robots.txt
///
/// # Arguments
///
/// * `robots` - The parsed robots.txt data
/// * `url` - The URL to check
/// * `user_agent` - The user agent string
///
/// # Returns
///
/// * `true` - If the URL is allowed
/// * `false` - If the URL is disallowed
pub fn is_allowed(robots: &ParsedRobots, url: &str, user_agent: &str) -> bool {
    robots.is_allowed(url, user_agent)
}
