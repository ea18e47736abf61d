//! Robots.txt parser implementation
//!
//! This module provides functionality for parsing robots.txt content using the robotstxt crate.

use crate::robots::sitemap;
use robotstxt::DefaultMatcher;

/// Parsed robots.txt data
///
/// This is a wrapper around the robotstxt crate's types, providing a simplified
/// interface for checking if URLs are allowed.
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
    /// Whether to allow all (true = allow all, false = parse content)
    allow_all: bool,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    ///
    /// # Arguments
    ///
    /// * `content` - The raw robots.txt file content
    ///
    /// # Returns
    ///
    /// A ParsedRobots instance that can be used to check URL permissions
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// This is used as the default when robots.txt cannot be fetched or parsed.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The URL path to check (e.g., "/page.html")
    /// * `user_agent` - The user agent string
    ///
    /// # Returns
    ///
    /// * `true` - If the URL is allowed
    /// * `false` - If the URL is disallowed
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.allow_all || self.content.is_empty() {
            // Empty content or explicit allow-all means allow all
            return true;
        }

        // Parse and check on-demand
        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Returns the `Sitemap:` directives declared in this robots.txt
    ///
    /// # Returns
    ///
    /// The declared sitemap URLs, in file order. Empty if there is no
    /// content to parse (allow-all / unreachable robots.txt).
    pub fn sitemaps(&self) -> Vec<String> {
        if self.allow_all || self.content.is_empty() {
            return Vec::new();
        }
        sitemap::declared_sitemaps(&self.content)
    }

    /// Gets the crawl delay for a specific user agent
    ///
    /// # Arguments
    ///
    /// * `user_agent` - The user agent string
    ///
    /// # Returns
    ///
    /// * `Some(f64)` - The crawl delay in seconds
    /// * `None` - If no crawl delay is specified
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        if self.allow_all || self.content.is_empty() {
            return None;
        }

        let product_token = user_agent
            .split('/')
            .next()
            .unwrap_or(user_agent)
            .trim()
            .to_lowercase();

        let records = parse_records(&self.content);

        // Prefer a record whose agent list names us specifically; fall back
        // to the wildcard "*" record. A later, more specific match replaces
        // an earlier wildcard match, matching robots.txt's usual precedence.
        let mut wildcard_delay = None;
        let mut specific_delay = None;

        for record in &records {
            let matches_specific = record
                .agents
                .iter()
                .any(|agent| agent != "*" && (agent == &product_token || product_token.contains(agent.as_str())));
            let matches_wildcard = record.agents.iter().any(|agent| agent == "*");

            if matches_specific {
                if let Some(delay) = record.crawl_delay {
                    specific_delay = Some(delay);
                }
            } else if matches_wildcard {
                if let Some(delay) = record.crawl_delay {
                    wildcard_delay = Some(delay);
                }
            }
        }

        specific_delay.or(wildcard_delay)
    }
}

/// A single `User-agent:` block and its directives
struct RobotsRecord {
    agents: Vec<String>,
    crawl_delay: Option<f64>,
}

/// Groups robots.txt lines into per-user-agent records
///
/// A record is a run of `User-agent:` lines followed by directive lines,
/// ending at the next `User-agent:` line that follows a non-user-agent
/// directive (the standard robots.txt grouping rule).
fn parse_records(content: &str) -> Vec<RobotsRecord> {
    let mut records = Vec::new();
    let mut current_agents: Vec<String> = Vec::new();
    let mut current_delay: Option<f64> = None;
    let mut seen_directive_since_agent = false;

    for raw_line in content.lines() {
        let line = raw_line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let Some((field, value)) = line.split_once(':') else {
            continue;
        };
        let field = field.trim().to_lowercase();
        let value = value.trim();

        if field == "user-agent" {
            if seen_directive_since_agent && !current_agents.is_empty() {
                records.push(RobotsRecord {
                    agents: std::mem::take(&mut current_agents),
                    crawl_delay: current_delay.take(),
                });
                seen_directive_since_agent = false;
            }
            current_agents.push(value.to_lowercase());
        } else {
            seen_directive_since_agent = true;
            if field == "crawl-delay" {
                if let Ok(delay) = value.parse::<f64>() {
                    current_delay = Some(delay);
                }
            }
        }
    }

    if !current_agents.is_empty() {
        records.push(RobotsRecord {
            agents: current_agents,
            crawl_delay: current_delay,
        });
    }

    records
}
