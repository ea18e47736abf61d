//! Crawler coordinator - main crawl orchestration logic
//!
//! `Coordinator` owns every piece of mutable crawl state (storage handle,
//! HTTP client, frontier, per-domain rate-limit state, per-domain robots
//! cache, worker pool) and drives them through a single dispatch loop:
//!
//! 1. Seed the frontier from the configured quality domains' literal seeds
//!    plus their sitemap-discovered URLs (or resume one persisted from a
//!    prior interrupted run, recovering anything stuck mid-fetch)
//! 2. Fill the worker pool up to `concurrent_workers` in-flight tasks, each
//!    popped off the frontier honoring per-domain rate limits and robots.txt
//! 3. Drain whatever worker results are ready, persisting outcomes and
//!    enqueuing newly discovered links
//! 4. Repeat until the frontier drains, stalls, or `max-pages` is hit
//!
//! Only the coordinator ever touches `storage`; workers are pure
//! fetch/parse/analyze computation (see `crawler::worker`), so the
//! `rusqlite::Connection` is never shared across tasks.

use crate::config::{Config, QualityEntry};
use crate::crawler::analyzer::analyze_text;
use crate::crawler::fetcher::build_http_client_from_config;
use crate::crawler::frontier::{Frontier, QueuedUrl};
use crate::crawler::parser::parse_html;
use crate::crawler::worker::{WorkerOutcome, WorkerPool, WorkerResult, WorkerTask};
use crate::robots::{fetch_robots, sitemap, CachedRobots};
use crate::state::{DomainState, ErrorCategory, ErrorSeverity, PageState};
use crate::storage::{LinkType, RunStatus, SqliteStorage, Storage};
use crate::url::{classify_domain, extract_domain, normalize_url, validate_url, DomainClassification, ValidationError};
use crate::SumiError;
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::{Duration, Instant};
use url::Url;

/// Per-sitemap URL cap used when `max-pages` is unbounded (0)
const DEFAULT_SITEMAP_CAP: usize = 250;

/// Consecutive no-progress dispatch iterations before the loop gives up
const STALL_ITERATION_LIMIT: u32 = 5;

/// Absolute dispatch-loop iteration ceiling, a backstop against any bug
/// that would otherwise spin forever
const MAX_DISPATCH_ITERATIONS: u64 = 5000;

/// Per-iteration budget for draining worker results out of the result channel
const DRAIN_BUDGET: Duration = Duration::from_millis(500);

/// Per-result timeout while waiting out in-flight work after the main loop exits
const FINAL_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// What a domain's rate-limit state says about dispatching a queued URL now
enum DomainGate {
    Proceed,
    Wait(Duration),
    Skip(PageState),
}

/// Drives a single crawl run from seed URLs to a drained frontier
pub struct Coordinator {
    config: Config,
    storage: SqliteStorage,
    client: Client,
    user_agent: String,
    frontier: Frontier,
    pool: WorkerPool,
    domain_states: HashMap<String, DomainState>,
    robots_cache: HashMap<String, CachedRobots>,
    /// The quality domain a page's depth is tracked relative to, keyed by page id
    quality_origins: HashMap<i64, String>,
    /// Every normalized URL this run has seen, regardless of outcome
    seen_urls: HashSet<String>,
    run_id: i64,
    resumed: bool,
    pages_fetched: u64,
}

impl Coordinator {
    /// Opens storage, builds the HTTP client and worker pool, and prepares a run
    ///
    /// `fresh` starts a brand-new run and clears any persisted frontier.
    /// Otherwise, an interrupted run (if one exists) is resumed: its
    /// frontier and domain states are reloaded from storage.
    pub fn new(config: Config, fresh: bool) -> Result<Self, SumiError> {
        let db_path = Path::new(&config.output.database_path);
        let mut storage = SqliteStorage::new(db_path)?;

        let config_hash = config_fingerprint(&config);

        let (run_id, resumed) = if fresh {
            storage.clear_frontier()?;
            (storage.create_run(&config_hash)?, false)
        } else {
            match storage.get_latest_run()? {
                Some(run)
                    if matches!(run.status, RunStatus::Running | RunStatus::Interrupted) =>
                {
                    (run.id, true)
                }
                _ => (storage.create_run(&config_hash)?, false),
            }
        };

        let client = build_http_client_from_config(&config.user_agent, &config.crawler)?;
        let user_agent = format!(
            "{}/{} (+{}; {})",
            config.user_agent.crawler_name,
            config.user_agent.crawler_version,
            config.user_agent.contact_url,
            config.user_agent.contact_email
        );

        let domain_states = if resumed {
            storage.load_domain_states()?
        } else {
            HashMap::new()
        };

        if resumed {
            let recovered = storage.recover_interrupted_urls(
                run_id,
                config.crawler.queue_recovery_timeout_minutes,
            )?;
            if recovered > 0 {
                tracing::info!("Recovered {} URL(s) stuck mid-fetch from a prior run", recovered);
            }
        }

        let frontier = if resumed {
            let rows = storage.load_frontier()?;
            let mut urls_by_page_id = HashMap::new();
            for (page_id, _) in &rows {
                let Ok(page) = storage.get_page(*page_id) else {
                    continue;
                };
                let Ok(url) = Url::parse(&page.url) else {
                    continue;
                };
                let depth = storage
                    .get_depths(*page_id)
                    .map(|depths| depths.iter().map(|d| d.depth).min().unwrap_or(0))
                    .unwrap_or(0);
                urls_by_page_id.insert(
                    *page_id,
                    QueuedUrl {
                        url,
                        domain: page.domain.clone(),
                        priority: priority_for_depth(depth),
                        page_id: *page_id,
                        depth,
                        parent_url: None,
                        discovered_at: Instant::now(),
                        attempts: 0,
                        scheduled_at: None,
                        error: None,
                    },
                );
            }
            Frontier::load_from_storage(
                &storage,
                &urls_by_page_id,
                config.crawler.url_queue_size,
                config.crawler.enable_bloom_filter,
                config.crawler.queue_max_retries,
            )?
        } else {
            Frontier::with_max_retries(
                config.crawler.url_queue_size,
                config.crawler.enable_bloom_filter,
                config.crawler.enable_persistent_queue,
                config.crawler.queue_max_retries,
            )
        };

        let pool = WorkerPool::spawn(
            config.crawler.concurrent_workers as usize,
            client.clone(),
            config.content.clone(),
        );

        Ok(Self {
            config,
            storage,
            client,
            user_agent,
            frontier,
            pool,
            domain_states,
            robots_cache: HashMap::new(),
            quality_origins: HashMap::new(),
            seen_urls: HashSet::new(),
            run_id,
            resumed,
            pages_fetched: 0,
        })
    }

    /// Runs the crawl to completion: seeds (or resumes), dispatches work
    /// across the worker pool until the frontier drains or stalls, and
    /// marks the run complete.
    pub async fn run(&mut self) -> Result<(), SumiError> {
        if !self.resumed {
            self.seed_frontier().await?;
        }

        let concurrency = (self.config.crawler.concurrent_workers as usize).max(1);
        let mut pending_tasks: usize = 0;
        let mut stall_rounds: u32 = 0;
        let mut last_frontier_size = self.frontier.size();
        let mut iterations: u64 = 0;

        'dispatch: loop {
            iterations += 1;
            if iterations > MAX_DISPATCH_ITERATIONS {
                tracing::warn!(
                    "Dispatch loop hit the {}-iteration guard, stopping",
                    MAX_DISPATCH_ITERATIONS
                );
                break;
            }

            if self.config.crawler.max_pages > 0
                && self.pages_fetched >= self.config.crawler.max_pages
            {
                tracing::info!(
                    "Reached max-pages limit ({}), stopping",
                    self.config.crawler.max_pages
                );
                break;
            }

            // Fill: keep the worker pool saturated up to `concurrent_workers`.
            while pending_tasks < concurrency {
                match self.next_dispatchable().await? {
                    Some(queued) => {
                        if self.pool.tasks.send(WorkerTask { queued }).await.is_err() {
                            tracing::warn!("Worker pool's task channel closed, stopping");
                            break 'dispatch;
                        }
                        pending_tasks += 1;
                    }
                    None => break,
                }
            }

            if pending_tasks == 0 && self.frontier.is_empty() {
                break;
            }

            // Drain: handle whatever results are ready without blocking the
            // fill loop indefinitely.
            self.drain_results(&mut pending_tasks, DRAIN_BUDGET).await?;

            let frontier_size = self.frontier.size();
            if frontier_size == last_frontier_size && pending_tasks == 0 {
                stall_rounds += 1;
                if stall_rounds >= STALL_ITERATION_LIMIT {
                    tracing::warn!(
                        "Frontier made no progress for {} iterations with nothing in flight, stopping",
                        STALL_ITERATION_LIMIT
                    );
                    break;
                }
            } else {
                stall_rounds = 0;
            }
            last_frontier_size = frontier_size;
        }

        // Final drain: give in-flight workers a bounded window to land.
        while pending_tasks > 0 {
            match tokio::time::timeout(FINAL_DRAIN_TIMEOUT, self.pool.results.recv()).await {
                Ok(Some(result)) => {
                    pending_tasks -= 1;
                    self.handle_worker_result(result)?;
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        "Timed out waiting on {} in-flight worker result(s) during final drain",
                        pending_tasks
                    );
                    break;
                }
            }
        }

        self.storage.complete_run(self.run_id)?;
        tracing::info!(
            "Crawl complete: {} pages fetched over run {}",
            self.pages_fetched,
            self.run_id
        );
        Ok(())
    }

    /// Drains up to `budget` worth of ready worker results, persisting each
    /// as it arrives. Returns early once the channel has nothing left to
    /// offer within the remaining budget.
    async fn drain_results(
        &mut self,
        pending_tasks: &mut usize,
        budget: Duration,
    ) -> Result<usize, SumiError> {
        let deadline = Instant::now() + budget;
        let mut drained = 0;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            match tokio::time::timeout(remaining, self.pool.results.recv()).await {
                Ok(Some(result)) => {
                    *pending_tasks -= 1;
                    self.handle_worker_result(result)?;
                    drained += 1;
                }
                Ok(None) => break,
                Err(_) => break,
            }
        }

        Ok(drained)
    }

    /// Pops frontier entries until one is actually dispatchable: rate-limit
    /// and robots.txt gates are resolved here, before a task ever reaches a
    /// worker, so workers never need to re-check either.
    ///
    /// A domain `Skip` finalizes that URL immediately and moves on to the
    /// next. A domain `Wait` puts the URL back in the frontier (bypassing
    /// dedup, since it's already known) and sleeps a bounded amount before
    /// retrying, rather than blocking the dispatch loop on one busy domain.
    async fn next_dispatchable(&mut self) -> Result<Option<QueuedUrl>, SumiError> {
        loop {
            let popped = if self.config.crawler.enable_persistent_queue {
                self.frontier.get(Some(&mut self.storage))?
            } else {
                self.frontier.get(None)?
            };
            let Some(queued) = popped else {
                return Ok(None);
            };

            match self.domain_gate(&queued.domain) {
                DomainGate::Proceed => {}
                DomainGate::Wait(wait) => {
                    let min_gap = Duration::from_millis(self.config.crawler.minimum_time_on_page);
                    let timeout = wait.max(Duration::from_secs(5)).max(min_gap * 2);
                    self.frontier.requeue(queued);
                    tokio::time::sleep(wait.min(timeout)).await;
                    continue;
                }
                DomainGate::Skip(state) => {
                    self.storage
                        .update_page_state(queued.page_id, state, None, None, None, None)?;
                    self.frontier.mark_completed(queued.page_id);
                    continue;
                }
            }

            if !self.robots_allowed(&queued).await? {
                self.storage.update_page_state(
                    queued.page_id,
                    PageState::Failed,
                    None,
                    None,
                    None,
                    Some("disallowed by robots.txt"),
                )?;
                self.frontier.mark_completed(queued.page_id);
                continue;
            }

            self.domain_states
                .entry(queued.domain.clone())
                .or_insert_with(DomainState::new)
                .record_request(Instant::now());
            self.storage.update_page_state(
                queued.page_id,
                PageState::Fetching,
                None,
                None,
                None,
                None,
            )?;

            return Ok(Some(queued));
        }
    }

    /// Enqueues every quality domain's literal seed URLs at depth 0, then
    /// augments each with its sitemap-discovered URLs
    async fn seed_frontier(&mut self) -> Result<(), SumiError> {
        let quality = self.config.quality.clone();
        for entry in &quality {
            for seed in &entry.seeds {
                self.enqueue_url(seed, 0, None, &entry.domain, &entry.domain)?;
            }
            self.discover_sitemap_seeds(entry).await?;
        }
        Ok(())
    }

    /// Discovers sitemap-listed URLs for a quality domain and enqueues them
    /// at depth 0 alongside its configured literal seeds
    ///
    /// Sitemaps are found via the domain's robots.txt `Sitemap:` directives
    /// plus HEAD-probing a fixed set of common paths. A sitemap index's
    /// children are fetched once more as sitemaps in their own right but not
    /// expanded past that single extra level. Entirely fail-open: a domain
    /// with no reachable sitemap simply contributes nothing here.
    async fn discover_sitemap_seeds(&mut self, entry: &QualityEntry) -> Result<(), SumiError> {
        let Some(origin) = entry.seeds.first().and_then(|seed| Url::parse(seed).ok()) else {
            return Ok(());
        };

        let parsed = fetch_robots(&self.client, &origin, &self.user_agent).await?;
        let mut sitemap_urls = parsed.sitemaps();
        sitemap_urls.extend(sitemap::probe_common_paths(&self.client, &origin).await);
        sitemap_urls.sort();
        sitemap_urls.dedup();
        self.robots_cache
            .entry(entry.domain.clone())
            .or_insert_with(|| CachedRobots::new(parsed));

        let cap = if self.config.crawler.max_pages > 0 {
            (self.config.crawler.max_pages / 4).max(1) as usize
        } else {
            DEFAULT_SITEMAP_CAP
        };

        let mut discovered = Vec::new();
        for sitemap_url in sitemap_urls {
            for loc in sitemap::fetch_and_parse(&self.client, &sitemap_url, cap).await {
                if loc.ends_with(".xml") {
                    // One level of sitemap-index expansion: pull the child
                    // sitemap's own entries, but don't recurse past that.
                    discovered.extend(sitemap::fetch_and_parse(&self.client, &loc, cap).await);
                } else {
                    discovered.push(loc);
                }
            }
        }

        for url in discovered.into_iter().take(cap) {
            self.enqueue_url(&url, 0, None, &entry.domain, &entry.domain)?;
        }

        Ok(())
    }

    /// Validates, classifies, and enqueues a discovered (or seed) URL
    ///
    /// A URL that fails structural validation is dropped silently, except
    /// for a blocked file extension: the fetcher's own Content-Type check
    /// is the real gate for non-HTML content, so a `.pdf`-looking link is
    /// still queued and left to resolve as a `ContentMismatch`.
    fn enqueue_url(
        &mut self,
        raw_url: &str,
        depth: u32,
        parent_url: Option<&str>,
        quality_origin: &str,
        source_domain: &str,
    ) -> Result<(), SumiError> {
        let Ok(normalized) = normalize_url(raw_url) else {
            return Ok(());
        };

        if !self.seen_urls.insert(normalized.as_str().to_string()) {
            return Ok(());
        }

        if let Err(err) = validate_url(&normalized) {
            if err != ValidationError::BlockedExtension {
                return Ok(());
            }
        }

        let domain = extract_domain(&normalized).unwrap_or_default();
        let classification = classify_domain(&domain, &self.config);

        if classification.is_terminal() {
            let referrer = parent_url.unwrap_or("");
            match classification {
                DomainClassification::Blacklisted => {
                    self.storage
                        .record_blacklisted(normalized.as_str(), referrer, self.run_id)?;
                }
                DomainClassification::Stubbed => {
                    self.storage
                        .record_stubbed(normalized.as_str(), referrer, self.run_id)?;
                }
                _ => unreachable!("is_terminal only matches Blacklisted/Stubbed"),
            }
            return Ok(());
        }

        let page_id = self
            .storage
            .insert_or_get_page(normalized.as_str(), &domain, self.run_id)?;
        self.quality_origins
            .entry(page_id)
            .or_insert_with(|| quality_origin.to_string());
        self.storage.upsert_depth(page_id, quality_origin, depth)?;

        if let Some(parent) = parent_url {
            if let Ok(Some(parent_page)) = self.storage.get_page_by_url(parent) {
                let link_type = LinkType::classify(source_domain, &domain);
                self.storage
                    .insert_link(parent_page.id, page_id, link_type, self.run_id)?;
            }
        }

        if depth > self.config.crawler.max_depth {
            self.storage.update_page_state(
                page_id,
                PageState::DepthExceeded,
                None,
                None,
                None,
                None,
            )?;
            return Ok(());
        }

        let queued = QueuedUrl {
            url: normalized,
            domain,
            priority: priority_for_depth(depth),
            page_id,
            depth,
            parent_url: parent_url.map(|s| s.to_string()),
            discovered_at: Instant::now(),
            attempts: 0,
            scheduled_at: None,
            error: None,
        };

        let persist = self.config.crawler.enable_persistent_queue;
        if persist {
            self.frontier.put(Some(&mut self.storage), queued)?;
        } else {
            self.frontier.put(None, queued)?;
        }

        Ok(())
    }

    /// Checks whether `domain` may be requested right now
    ///
    /// The wait, if any, honors the domain's cached robots.txt crawl-delay
    /// in addition to the configured minimum time between requests.
    fn domain_gate(&mut self, domain: &str) -> DomainGate {
        let now = Instant::now();
        let crawl_delay = self
            .robots_cache
            .get(domain)
            .and_then(|cached| cached.crawl_delay(&self.user_agent));
        let state = self
            .domain_states
            .entry(domain.to_string())
            .or_insert_with(DomainState::new);

        if state.rate_limited {
            return DomainGate::Skip(PageState::RateLimited);
        }
        if state.has_exceeded_limit(&self.config.crawler) {
            return DomainGate::Skip(PageState::RequestLimitHit);
        }
        match state.should_wait_for_crawl_delay(&self.config.crawler, crawl_delay, now) {
            Some(wait) => DomainGate::Wait(wait),
            None => DomainGate::Proceed,
        }
    }

    /// Ensures the robots.txt cache for `queued`'s domain is fresh, fetching
    /// it on first use or once the 24-hour cache expires
    async fn robots_allowed(&mut self, queued: &QueuedUrl) -> Result<bool, SumiError> {
        let needs_fetch = match self.robots_cache.get(&queued.domain) {
            Some(cached) => cached.is_stale(),
            None => true,
        };

        if needs_fetch {
            let parsed = fetch_robots(&self.client, &queued.url, &self.user_agent).await?;
            self.robots_cache
                .insert(queued.domain.clone(), CachedRobots::new(parsed));
        }

        let cache = self
            .robots_cache
            .get(&queued.domain)
            .expect("just inserted or already present");
        Ok(cache.is_allowed(queued.url.path(), &self.user_agent))
    }

    /// Records a non-fatal error against the run, tagged with the page's depth
    fn record_error(
        &mut self,
        queued: &QueuedUrl,
        operation: &str,
        category: ErrorCategory,
        severity: ErrorSeverity,
        message: &str,
    ) -> Result<(), SumiError> {
        self.storage.record_error_event(
            self.run_id,
            Some(queued.page_id),
            queued.url.as_str(),
            queued.depth,
            operation,
            category,
            severity,
            message,
        )?;
        Ok(())
    }

    /// Persists a completed worker task's outcome and enqueues any links it
    /// discovered
    ///
    /// Successes and terminal-by-nature outcomes (content mismatch) mark
    /// the frontier entry completed; genuine failures go through
    /// `mark_failed` so they're retried with backoff up to the configured
    /// retry ceiling instead of being dropped after one attempt.
    fn handle_worker_result(&mut self, result: WorkerResult) -> Result<(), SumiError> {
        let queued = result.queued;
        self.pages_fetched += 1;

        match result.outcome {
            WorkerOutcome::Processed {
                status_code,
                content_type,
                title,
                links,
                word_frequencies,
            } => {
                self.storage.update_page_state(
                    queued.page_id,
                    PageState::Processed,
                    title.as_deref(),
                    Some(status_code),
                    Some(&content_type),
                    None,
                )?;

                if !word_frequencies.is_empty() {
                    self.storage.record_word_frequencies(
                        self.run_id,
                        queued.page_id,
                        &word_frequencies,
                    )?;
                }

                let quality_origin = self
                    .quality_origins
                    .get(&queued.page_id)
                    .cloned()
                    .unwrap_or_else(|| queued.domain.clone());
                let next_depth = queued.depth + 1;
                let parent = queued.url.as_str().to_string();
                let source_domain = queued.domain.clone();

                for link in &links {
                    self.enqueue_url(link, next_depth, Some(&parent), &quality_origin, &source_domain)?;
                }

                self.frontier.mark_completed(queued.page_id);
            }
            WorkerOutcome::ParseFailed {
                status_code,
                content_type,
                message,
            } => {
                self.storage.update_page_state(
                    queued.page_id,
                    PageState::Failed,
                    None,
                    Some(status_code),
                    Some(&content_type),
                    Some(&message),
                )?;
                self.record_error(
                    &queued,
                    "parse",
                    ErrorCategory::ContentError,
                    ErrorSeverity::Error,
                    &message,
                )?;
                self.frontier.mark_failed(queued, message);
            }
            WorkerOutcome::ContentMismatch { content_type } => {
                self.storage.update_page_state(
                    queued.page_id,
                    PageState::ContentMismatch,
                    None,
                    None,
                    Some(&content_type),
                    None,
                )?;
                self.frontier.mark_completed(queued.page_id);
            }
            WorkerOutcome::HttpError { status_code, state } => {
                if state == PageState::RateLimited {
                    self.domain_states
                        .entry(queued.domain.clone())
                        .or_insert_with(DomainState::new)
                        .mark_rate_limited();
                }
                self.storage.update_page_state(
                    queued.page_id,
                    state,
                    None,
                    Some(status_code),
                    None,
                    None,
                )?;
                let message = format!("HTTP {}", status_code);
                self.record_error(
                    &queued,
                    "fetch",
                    ErrorCategory::from_page_state(state),
                    ErrorSeverity::Error,
                    &message,
                )?;
                self.frontier.mark_failed(queued, message);
            }
            WorkerOutcome::NetworkError { error, state } => {
                self.storage.increment_retry_count(queued.page_id)?;
                self.storage
                    .update_page_state(queued.page_id, state, None, None, None, Some(&error))?;
                self.record_error(
                    &queued,
                    "fetch",
                    ErrorCategory::from_page_state(state),
                    ErrorSeverity::Warning,
                    &error,
                )?;
                self.frontier.mark_failed(queued, error);
            }
            WorkerOutcome::RedirectError { error } => {
                self.storage.update_page_state(
                    queued.page_id,
                    PageState::Failed,
                    None,
                    None,
                    None,
                    Some(&error),
                )?;
                self.record_error(
                    &queued,
                    "fetch",
                    ErrorCategory::NetworkError,
                    ErrorSeverity::Error,
                    &error,
                )?;
                self.frontier.mark_failed(queued, error);
            }
        }

        Ok(())
    }
}

/// Higher-priority (lower-depth) entries are popped first
fn priority_for_depth(depth: u32) -> u32 {
    u32::MAX - depth.min(u32::MAX - 1)
}

/// Fingerprints a parsed config for run-resumption comparisons
///
/// `Config` isn't `Serialize` (it's parsed from TOML, never written back
/// out), so this hashes its `Debug` representation rather than a
/// canonical serialization. Good enough to detect "this is probably the
/// same config" across runs; not a cryptographic commitment.
fn config_fingerprint(config: &Config) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{:?}", config).as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ContentConfig, CrawlerConfig, OutputConfig, QualityEntry, UserAgentConfig};

    fn create_test_config(db_path: &str) -> Config {
        Config {
            crawler: CrawlerConfig {
                max_depth: 2,
                max_concurrent_pages_open: 5,
                minimum_time_on_page: 10,
                max_domain_requests: 100,
                ..CrawlerConfig::default()
            },
            user_agent: UserAgentConfig {
                crawler_name: "TestCrawler".to_string(),
                crawler_version: "1.0".to_string(),
                contact_url: "https://example.com/about".to_string(),
                contact_email: "admin@example.com".to_string(),
            },
            output: OutputConfig {
                database_path: db_path.to_string(),
                summary_path: "./summary.md".to_string(),
            },
            content: ContentConfig::default(),
            quality: vec![QualityEntry {
                domain: "example.com".to_string(),
                seeds: vec!["https://example.com/".to_string()],
            }],
            blacklist: vec![],
            stub: vec![],
        }
    }

    #[test]
    fn test_new_creates_run() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("coordinator.db");
        let config = create_test_config(db_path.to_str().unwrap());

        let coordinator = Coordinator::new(config, true).expect("coordinator should open");
        assert!(coordinator.run_id > 0);
        assert!(!coordinator.resumed);
    }

    #[test]
    fn test_config_fingerprint_is_deterministic() {
        let config = create_test_config("./a.db");
        let other = create_test_config("./a.db");
        assert_eq!(config_fingerprint(&config), config_fingerprint(&other));
    }

    #[test]
    fn test_config_fingerprint_differs_on_change() {
        let mut config = create_test_config("./a.db");
        let before = config_fingerprint(&config);
        config.crawler.max_depth = 9;
        assert_ne!(before, config_fingerprint(&config));
    }

    #[test]
    fn test_priority_decreases_with_depth() {
        assert!(priority_for_depth(0) > priority_for_depth(1));
        assert!(priority_for_depth(1) > priority_for_depth(2));
    }

    #[test]
    fn test_enqueue_blocked_extension_still_queued() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("coordinator.db");
        let config = create_test_config(db_path.to_str().unwrap());
        let mut coordinator = Coordinator::new(config, true).expect("coordinator should open");

        coordinator
            .enqueue_url(
                "https://example.com/document.pdf",
                0,
                None,
                "example.com",
                "example.com",
            )
            .expect("enqueue should not error");

        assert_eq!(coordinator.frontier.size(), 1);
    }

    #[test]
    fn test_enqueue_depth_exceeded_not_queued() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("coordinator.db");
        let config = create_test_config(db_path.to_str().unwrap());
        let mut coordinator = Coordinator::new(config, true).expect("coordinator should open");

        coordinator
            .enqueue_url(
                "https://example.com/too-deep",
                5,
                None,
                "example.com",
                "example.com",
            )
            .expect("enqueue should not error");

        assert_eq!(coordinator.frontier.size(), 0);
        let count = coordinator
            .storage
            .count_pages_by_state(PageState::DepthExceeded)
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_enqueue_dedups_repeated_url() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("coordinator.db");
        let config = create_test_config(db_path.to_str().unwrap());
        let mut coordinator = Coordinator::new(config, true).expect("coordinator should open");

        coordinator
            .enqueue_url(
                "https://example.com/page",
                0,
                None,
                "example.com",
                "example.com",
            )
            .unwrap();
        coordinator
            .enqueue_url(
                "https://example.com/page",
                0,
                None,
                "example.com",
                "example.com",
            )
            .unwrap();

        assert_eq!(coordinator.frontier.size(), 1);
    }

    #[test]
    fn test_enqueue_classifies_link_type_on_insert() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("coordinator.db");
        let config = create_test_config(db_path.to_str().unwrap());
        let mut coordinator = Coordinator::new(config, true).expect("coordinator should open");

        coordinator
            .enqueue_url(
                "https://example.com/parent",
                0,
                None,
                "example.com",
                "example.com",
            )
            .unwrap();
        coordinator
            .enqueue_url(
                "https://other.com/child",
                1,
                Some("https://example.com/parent"),
                "example.com",
                "example.com",
            )
            .unwrap();

        let parent_page = coordinator
            .storage
            .get_page_by_url("https://example.com/parent")
            .unwrap()
            .unwrap();
        let links = coordinator.storage.get_outgoing_links(parent_page.id).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].link_type, LinkType::External);
    }
}
