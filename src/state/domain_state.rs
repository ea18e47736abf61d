use crate::config::CrawlerConfig;
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

/// Represents the robots.txt content for a domain
///
/// This is a placeholder type that will be properly implemented in the robots module.
/// For now, we just need to track whether we have robots.txt data.
#[derive(Debug, Clone)]
pub struct CachedRobots {
    pub content: String,
    pub fetched_at: DateTime<Utc>,
}

/// Tracks the state of a domain during crawling
///
/// This structure maintains per-domain information needed for rate limiting,
/// request counting, and robots.txt caching.
#[derive(Debug, Clone)]
pub struct DomainState {
    /// Number of requests made to this domain in the current crawl
    pub request_count: u32,

    /// Timestamp of the last request to this domain
    pub last_request_time: Option<Instant>,

    /// Whether this domain has been rate limited (HTTP 429)
    pub rate_limited: bool,

    /// Cached robots.txt data for this domain
    pub robots_txt: Option<CachedRobots>,

    /// When the robots.txt was fetched (for cache expiration)
    pub robots_fetched_at: Option<DateTime<Utc>>,
}

impl DomainState {
    /// Creates a new DomainState with default values
    pub fn new() -> Self {
        Self {
            request_count: 0,
            last_request_time: None,
            rate_limited: false,
            robots_txt: None,
            robots_fetched_at: None,
        }
    }

    /// Checks if a request can be made to this domain
    ///
    /// This method enforces:
    /// - Rate limiting (if domain returned HTTP 429)
    /// - Maximum requests per domain
    /// - Minimum time between requests to the same domain
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration containing limits
    /// * `now` - The current time instant
    ///
    /// # Returns
    ///
    /// * `true` - If a request can be made now
    /// * `false` - If the request should be delayed or blocked
    pub fn can_request(&self, config: &CrawlerConfig, now: Instant) -> bool {
        // Check if domain is rate limited
        if self.rate_limited {
            return false;
        }

        // Check if we've hit the maximum request limit for this domain
        if self.request_count >= config.max_domain_requests {
            return false;
        }

        // Check minimum time between requests
        if let Some(last) = self.last_request_time {
            let min_delay = Duration::from_millis(config.minimum_time_on_page);
            if now.duration_since(last) < min_delay {
                return false;
            }
        }

        true
    }

    /// Records that a request was made to this domain
    ///
    /// Updates the request count and last request time.
    pub fn record_request(&mut self, now: Instant) {
        self.request_count += 1;
        self.last_request_time = Some(now);
    }

    /// Marks this domain as rate limited
    pub fn mark_rate_limited(&mut self) {
        self.rate_limited = true;
    }

    /// Clears the rate limited flag (e.g., after cooldown period)
    pub fn clear_rate_limit(&mut self) {
        self.rate_limited = false;
    }

    /// Checks if this domain has exceeded the request limit
    pub fn has_exceeded_limit(&self, config: &CrawlerConfig) -> bool {
        self.request_count >= config.max_domain_requests
    }

    /// Returns the number of requests remaining for this domain
    pub fn requests_remaining(&self, config: &CrawlerConfig) -> u32 {
        config
            .max_domain_requests
            .saturating_sub(self.request_count)
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(
        &self,
        config: &CrawlerConfig,
        now: Instant,
    ) -> Option<Duration> {
        self.should_wait_for_crawl_delay(config, None, now)
    }

    /// Calculates the time until the next request can be made, honoring a
    /// robots.txt `Crawl-delay` directive alongside the configured minimum
    /// time between requests -- whichever of the two is longer wins.
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn should_wait_for_crawl_delay(
        &self,
        config: &CrawlerConfig,
        crawl_delay_secs: Option<f64>,
        now: Instant,
    ) -> Option<Duration> {
        let configured = Duration::from_millis(config.minimum_time_on_page);
        let from_robots = crawl_delay_secs
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(Duration::from_secs_f64)
            .unwrap_or(Duration::ZERO);
        let min_delay = configured.max(from_robots);

        if let Some(last) = self.last_request_time {
            let elapsed = now.duration_since(last);
            if elapsed < min_delay {
                return Some(min_delay - elapsed);
            }
        }
        None
    }

    /// Checks if the robots.txt cache is stale (older than 24 hours)
    pub fn is_robots_stale(&self) -> bool {
        if let Some(fetched_at) = self.robots_fetched_at {
            let age = Utc::now() - fetched_at;
            age > chrono::Duration::hours(24)
        } else {
            true // No robots.txt fetched yet
        }
    }

    /// Updates the robots.txt cache
    pub fn update_robots(&mut self, content: String) {
        let now = Utc::now();
        self.robots_txt = Some(CachedRobots {
            content,
            fetched_at: now,
        });
        self.robots_fetched_at = Some(now);
    }
}

impl Default for DomainState {
    fn default() -> Self {
        Self::new()
    }
}
