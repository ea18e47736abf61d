//! State module for tracking crawl progress
//!
//! This module provides state management for pages and domains during the crawl process.
//!
//! # Components
//!
//! - `PageState`: Tracks the state of individual pages (discovered, queued, fetching, processed, etc.)
//! - `DomainState`: Tracks per-domain state for rate limiting and request counting
//! - `CachedRobots`: Stores cached robots.txt data for domains
//! - `QueueStatus`: Tracks where a frontier entry sits in its own lifecycle
//!
//! Run/session lifecycle itself is tracked by `storage::RunRecord` and
//! `storage::RunStatus` (the persisted row) plus `Coordinator`'s own
//! `run_id`/`resumed` fields (the in-memory handle to it) rather than a
//! separate in-memory type here.

mod domain_state;
mod error_category;
mod page_state;
mod queue_status;

// Re-export main types
pub use domain_state::{CachedRobots, DomainState};
pub use error_category::{ErrorCategory, ErrorSeverity};
pub use page_state::PageState;
pub use queue_status::QueueStatus;
