//! Error taxonomy for non-fatal crawl errors
//!
//! Classifies why a page attempt failed, independent of the richer
//! `PageState` the page itself ends up in. Used purely for `error_events`
//! reporting (`category`/`severity` columns), not for crawl control flow.

use crate::state::PageState;

/// Broad category a non-fatal error falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// DNS/connect/read/TLS timeouts, non-2xx HTTP status
    NetworkError,
    /// Content-type rejected, body too large, decode failure, unparseable HTML
    ContentError,
    /// Frontier capacity or invariant violation
    QueueError,
    /// Any persistence failure
    DatabaseError,
    /// Config or URL validation failure
    ValidationError,
    /// Robots.txt fetch/parse failure (fails open, so rarely surfaced)
    RobotsError,
}

impl ErrorCategory {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::NetworkError => "network_error",
            Self::ContentError => "content_error",
            Self::QueueError => "queue_error",
            Self::DatabaseError => "database_error",
            Self::ValidationError => "validation_error",
            Self::RobotsError => "robots_error",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "network_error" => Some(Self::NetworkError),
            "content_error" => Some(Self::ContentError),
            "queue_error" => Some(Self::QueueError),
            "database_error" => Some(Self::DatabaseError),
            "validation_error" => Some(Self::ValidationError),
            "robots_error" => Some(Self::RobotsError),
            _ => None,
        }
    }

    /// Derives a category from the `PageState` a fetch attempt ended in
    ///
    /// `Processed`/`DepthExceeded`/the skip states never reach
    /// `record_error_event` in the first place, so they have no mapping
    /// here; callers only invoke this for states that represent a failure.
    pub fn from_page_state(state: PageState) -> Self {
        match state {
            PageState::DeadLink | PageState::Unreachable | PageState::RateLimited => {
                Self::NetworkError
            }
            PageState::ContentMismatch => Self::ContentError,
            PageState::RequestLimitHit => Self::QueueError,
            _ => Self::NetworkError,
        }
    }
}

/// How severe a recorded error event is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorSeverity {
    /// Transient, a retry is already scheduled
    Warning,
    /// Terminal for this URL, but the crawl continues
    Error,
    /// Affects the run as a whole (persistence failures)
    Critical,
}

impl ErrorSeverity {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "warning" => Some(Self::Warning),
            "error" => Some(Self::Error),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}
