//! Output module for generating crawl summaries and reports
//!
//! This module handles:
//! - Generating markdown summaries of crawl results
//! - Exporting data in various formats
//! - Recording crawl statistics and metrics

mod markdown;
mod sqlite_output;
mod stats;
mod traits;

pub use markdown::generate_markdown_summary;
pub use sqlite_output::SqliteOutputHandler;
pub use stats::{load_statistics, print_statistics, CrawlStatistics};
pub use traits::{CrawlSummary, OutputHandler};

use crate::storage::Storage;
use crate::SumiError;

/// Generates a crawl summary from storage
///
/// # Arguments
///
/// * `storage` - The storage backend containing crawl data
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Successfully generated summary
/// * `Err(SumiError)` - Failed to generate summary
pub fn generate_summary(storage: &dyn Storage) -> Result<CrawlSummary, SumiError> {
    use crate::state::PageState;

    let run = storage
        .get_latest_run()?
        .ok_or_else(|| SumiError::Storage("No crawl runs found".to_string()))?;

    let mut summary = CrawlSummary::new();
    summary.run_id = run.id;
    summary.started_at = run.started_at.clone();
    summary.finished_at = run.finished_at.clone();
    summary.status = run.status.to_db_string().to_string();
    summary.config_hash = run.config_hash.clone();

    if let Some(finished) = &run.finished_at {
        if let (Ok(start), Ok(end)) = (
            chrono::DateTime::parse_from_rfc3339(&run.started_at),
            chrono::DateTime::parse_from_rfc3339(finished),
        ) {
            summary.duration_seconds = Some((end - start).num_seconds().max(0) as u64);
        }
    }

    summary.total_pages = storage.count_total_pages()?;
    summary.unique_domains = storage.count_unique_domains()?;
    summary.total_links = storage.count_links()?;

    summary.pages_discovered = storage.count_pages_by_state(PageState::Discovered)?;
    summary.pages_queued = storage.count_pages_by_state(PageState::Queued)?;
    summary.pages_processed = storage.count_pages_by_state(PageState::Processed)?;
    summary.pages_blacklisted = storage.count_pages_by_state(PageState::Blacklisted)?;
    summary.pages_stubbed = storage.count_pages_by_state(PageState::Stubbed)?;
    summary.pages_dead_link = storage.count_pages_by_state(PageState::DeadLink)?;
    summary.pages_unreachable = storage.count_pages_by_state(PageState::Unreachable)?;
    summary.pages_rate_limited = storage.count_pages_by_state(PageState::RateLimited)?;
    summary.pages_failed = storage.count_pages_by_state(PageState::Failed)?;
    summary.pages_depth_exceeded = storage.count_pages_by_state(PageState::DepthExceeded)?;
    summary.pages_request_limit_hit = storage.count_pages_by_state(PageState::RequestLimitHit)?;
    summary.pages_content_mismatch = storage.count_pages_by_state(PageState::ContentMismatch)?;

    summary.error_summary = storage.get_error_summary()?;
    summary.total_errors = summary.error_summary.values().sum();

    summary.depth_breakdown = storage
        .get_depth_breakdown()?
        .into_iter()
        .map(|(depth, count)| (depth, count as u64))
        .collect();

    summary.discovered_domains = storage.get_discovered_domains()?;
    summary.top_blacklisted = storage.get_blacklisted_urls()?;
    summary.top_stubbed = storage.get_stubbed_urls()?;
    summary.rate_limited_domains = storage.get_rate_limited_domains()?;

    summary.top_words = storage.get_top_word_frequencies(run.id, 25)?;
    summary.recent_errors = storage.get_recent_error_events(run.id, 20)?;

    Ok(summary)
}
