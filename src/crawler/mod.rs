//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - HTML parsing and link extraction
//! - Request scheduling and rate limiting
//! - Overall crawl coordination

pub mod analyzer;
pub mod bloom;
mod coordinator;
mod fetcher;
pub mod frontier;
mod parser;
pub mod worker;

pub use analyzer::{analyze_text, top_n, WordAnalysis};
pub use bloom::BloomFilter;
pub use coordinator::Coordinator;
pub use fetcher::{build_http_client, build_http_client_from_config, fetch_url, FetchResult};
pub use frontier::{Frontier, FrontierStats, QueuedUrl};
pub use parser::{extract_links_simple, parse_html};
pub use worker::{Timings, WorkerOutcome, WorkerPool, WorkerResult, WorkerTask};

use crate::config::Config;
use crate::SumiError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Initialize the storage layer
/// 2. Load or create a crawl run
/// 3. Build the HTTP client
/// 4. Schedule and fetch pages
/// 5. Extract and follow links
/// 6. Generate summary output
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `fresh` - Start a new run instead of resuming an interrupted one
///
/// # Returns
///
/// * `Ok(())` - Crawl completed successfully
/// * `Err(SumiError)` - Crawl failed
pub async fn crawl(config: Config, fresh: bool) -> Result<(), SumiError> {
    let mut coordinator = Coordinator::new(config, fresh)?;
    coordinator.run().await
}
