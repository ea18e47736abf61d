use serde::Deserialize;

/// Main configuration structure for Sumi-Ripple
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub quality: Vec<QualityEntry>,
    #[serde(default)]
    pub blacklist: Vec<DomainEntry>,
    #[serde(default)]
    pub stub: Vec<DomainEntry>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum depth to crawl from seed URLs
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum number of concurrent page fetches
    #[serde(rename = "max-concurrent-pages-open")]
    pub max_concurrent_pages_open: u32,

    /// Minimum time between requests to the same domain (milliseconds)
    #[serde(rename = "minimum-time-on-page")]
    pub minimum_time_on_page: u64,

    /// Maximum number of requests per domain
    #[serde(rename = "max-domain-requests")]
    pub max_domain_requests: u32,

    /// Hard cap on total pages fetched in a single run (0 means unlimited)
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u64,

    /// Size of the worker pool draining the frontier
    #[serde(rename = "concurrent-workers", default = "default_concurrent_workers")]
    pub concurrent_workers: u32,

    /// Per-request timeout, in seconds
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum retry attempts for a transiently-failed fetch
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Maximum total HTTP connections held open by the client pool
    #[serde(rename = "max-connections", default = "default_max_connections")]
    pub max_connections: usize,

    /// Maximum connections kept open per host
    #[serde(
        rename = "max-connections-per-host",
        default = "default_max_connections_per_host"
    )]
    pub max_connections_per_host: usize,

    /// How long a resolved DNS entry stays cached, in seconds
    #[serde(rename = "dns-cache-ttl-secs", default = "default_dns_cache_ttl_secs")]
    pub dns_cache_ttl_secs: u64,

    /// How long an idle pooled connection is kept alive, in seconds
    #[serde(
        rename = "keepalive-timeout-secs",
        default = "default_keepalive_timeout_secs"
    )]
    pub keepalive_timeout_secs: u64,

    /// Bound on the in-memory frontier queue size before it starts spilling to storage
    #[serde(rename = "url-queue-size", default = "default_url_queue_size")]
    pub url_queue_size: usize,

    /// Whether to pre-filter frontier dedup checks through a bloom filter
    #[serde(rename = "enable-bloom-filter", default = "default_enable_bloom_filter")]
    pub enable_bloom_filter: bool,

    /// Whether frontier mutations are mirrored to persistent storage
    #[serde(
        rename = "enable-persistent-queue",
        default = "default_enable_persistent_queue"
    )]
    pub enable_persistent_queue: bool,

    /// Maximum retry attempts for a frontier entry before it's marked permanently failed
    #[serde(rename = "queue-max-retries", default = "default_queue_max_retries")]
    pub queue_max_retries: u32,

    /// How long a page may sit in `Fetching` before a resumed run treats it
    /// as abandoned and resets it to pending
    #[serde(
        rename = "queue-recovery-timeout-minutes",
        default = "default_queue_recovery_timeout_minutes"
    )]
    pub queue_recovery_timeout_minutes: i64,

    /// How long a terminal frontier entry is kept before `cleanup_old_queue_entries` drops it
    #[serde(
        rename = "queue-cleanup-after-hours",
        default = "default_queue_cleanup_after_hours"
    )]
    pub queue_cleanup_after_hours: i64,
}

fn default_max_pages() -> u64 {
    0
}

fn default_concurrent_workers() -> u32 {
    4
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_max_connections() -> usize {
    100
}

fn default_max_connections_per_host() -> usize {
    10
}

fn default_dns_cache_ttl_secs() -> u64 {
    300
}

fn default_keepalive_timeout_secs() -> u64 {
    90
}

fn default_url_queue_size() -> usize {
    100_000
}

fn default_enable_bloom_filter() -> bool {
    true
}

fn default_enable_persistent_queue() -> bool {
    true
}

fn default_queue_max_retries() -> u32 {
    3
}

fn default_queue_recovery_timeout_minutes() -> i64 {
    30
}

fn default_queue_cleanup_after_hours() -> i64 {
    24
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_concurrent_pages_open: 10,
            minimum_time_on_page: 1000,
            max_domain_requests: 500,
            max_pages: default_max_pages(),
            concurrent_workers: default_concurrent_workers(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            max_connections: default_max_connections(),
            max_connections_per_host: default_max_connections_per_host(),
            dns_cache_ttl_secs: default_dns_cache_ttl_secs(),
            keepalive_timeout_secs: default_keepalive_timeout_secs(),
            url_queue_size: default_url_queue_size(),
            enable_bloom_filter: default_enable_bloom_filter(),
            enable_persistent_queue: default_enable_persistent_queue(),
            queue_max_retries: default_queue_max_retries(),
            queue_recovery_timeout_minutes: default_queue_recovery_timeout_minutes(),
            queue_cleanup_after_hours: default_queue_cleanup_after_hours(),
        }
    }
}

/// Content extraction and filtering configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ContentConfig {
    /// Maximum page size to download, in bytes
    #[serde(rename = "max-page-size", default = "default_max_page_size")]
    pub max_page_size: usize,

    /// Content-Type prefixes accepted for parsing (others are rejected as a mismatch)
    #[serde(
        rename = "allowed-content-types",
        default = "default_allowed_content_types"
    )]
    pub allowed_content_types: Vec<String>,

    /// Whether to strip `<script>` contents before text extraction
    #[serde(rename = "remove-scripts", default = "default_remove_scripts")]
    pub remove_scripts: bool,

    /// Whether to strip `<style>` contents before text extraction
    #[serde(rename = "remove-styles", default = "default_remove_styles")]
    pub remove_styles: bool,

    /// Pages with less extracted text than this (in characters) are treated as thin content
    #[serde(rename = "min-text-length", default = "default_min_text_length")]
    pub min_text_length: usize,

    /// Cap on words counted towards word-frequency analysis per page
    #[serde(rename = "max-words-per-page", default = "default_max_words_per_page")]
    pub max_words_per_page: usize,
}

fn default_max_page_size() -> usize {
    5 * 1024 * 1024
}

fn default_allowed_content_types() -> Vec<String> {
    vec!["text/html".to_string(), "application/xhtml+xml".to_string()]
}

fn default_remove_scripts() -> bool {
    true
}

fn default_remove_styles() -> bool {
    true
}

fn default_min_text_length() -> usize {
    200
}

fn default_max_words_per_page() -> usize {
    20_000
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            max_page_size: default_max_page_size(),
            allowed_content_types: default_allowed_content_types(),
            remove_scripts: default_remove_scripts(),
            remove_styles: default_remove_styles(),
            min_text_length: default_min_text_length(),
            max_words_per_page: default_max_words_per_page(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the markdown summary file
    #[serde(rename = "summary-path")]
    pub summary_path: String,
}

/// Quality domain entry with seed URLs
#[derive(Debug, Clone, Deserialize)]
pub struct QualityEntry {
    /// Domain pattern (e.g., "example.com" or "*.example.com")
    pub domain: String,

    /// List of seed URLs to start crawling from
    pub seeds: Vec<String>,
}

/// Simple domain entry for blacklist and stub lists
#[derive(Debug, Clone, Deserialize)]
pub struct DomainEntry {
    /// Domain pattern (e.g., "example.com" or "*.example.com")
    pub domain: String,
}
