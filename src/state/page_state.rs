/// Page state definitions for tracking crawl progress
///
/// This module defines all possible states a page can be in during the crawl process.
use std::fmt;

/// Represents the current state of a page in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    // ===== Active States =====
    /// Page has been discovered but not yet queued for fetching
    Discovered,

    /// Page is queued and waiting to be fetched
    Queued,

    /// Page is currently being fetched
    Fetching,

    // ===== Terminal Success States =====
    /// Page was successfully fetched and processed
    Processed,

    // ===== Terminal Skip States =====
    /// Page is on a blacklisted domain - recorded but skipped
    Blacklisted,

    /// Page is on a stubbed domain - noted but never visited
    Stubbed,

    // ===== Terminal Error States =====
    /// Page returned HTTP 404 or similar (permanent failure)
    DeadLink,

    /// Page could not be reached (connection refused, DNS failure, TLS error)
    Unreachable,

    /// Page returned HTTP 429 or domain is rate limited
    RateLimited,

    /// Page fetch failed for other reasons (redirect loop, parse error, etc.)
    Failed,

    // ===== Special States =====
    /// Page exceeds the maximum crawl depth
    DepthExceeded,

    /// Domain has hit the maximum request limit
    RequestLimitHit,

    /// Page Content-Type is not HTML
    ContentMismatch,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing needed)
    ///
    /// Active states (Discovered, Queued, Fetching) are not terminal.
    /// All other states are terminal.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Discovered | Self::Queued | Self::Fetching)
    }

    /// Returns true if this is an active state (page may still be processed)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Discovered | Self::Queued | Self::Fetching)
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Processed)
    }

    /// Returns true if this represents a skip state (blacklist/stub)
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Blacklisted | Self::Stubbed)
    }

    /// Returns true if this represents an error state
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::DeadLink
                | Self::Unreachable
                | Self::RateLimited
                | Self::Failed
                | Self::DepthExceeded
                | Self::RequestLimitHit
                | Self::ContentMismatch
        )
    }

    /// Converts the page state to a database string representation
    ///
    /// This is used for storing the state in the SQLite database.
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Queued => "queued",
            Self::Fetching => "fetching",
            Self::Processed => "processed",
            Self::Blacklisted => "blacklisted",
            Self::Stubbed => "stubbed",
            Self::DeadLink => "dead_link",
            Self::Unreachable => "unreachable",
            Self::RateLimited => "rate_limited",
            Self::Failed => "failed",
            Self::DepthExceeded => "depth_exceeded",
            Self::RequestLimitHit => "request_limit_hit",
            Self::ContentMismatch => "content_mismatch",
        }
    }

    /// Parses a page state from a database string representation
    ///
    /// Returns None if the string doesn't match any known state.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "discovered" => Some(Self::Discovered),
            "queued" => Some(Self::Queued),
            "fetching" => Some(Self::Fetching),
            "processed" => Some(Self::Processed),
            "blacklisted" => Some(Self::Blacklisted),
            "stubbed" => Some(Self::Stubbed),
            "dead_link" => Some(Self::DeadLink),
            "unreachable" => Some(Self::Unreachable),
            "rate_limited" => Some(Self::RateLimited),
            "failed" => Some(Self::Failed),
            "depth_exceeded" => Some(Self::DepthExceeded),
            "request_limit_hit" => Some(Self::RequestLimitHit),
            "content_mismatch" => Some(Self::ContentMismatch),
            _ => None,
        }
    }

    /// Returns all possible page states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Discovered,
            Self::Queued,
            Self::Fetching,
            Self::Processed,
            Self::Blacklisted,
            Self::Stubbed,
            Self::DeadLink,
            Self::Unreachable,
            Self::RateLimited,
            Self::Failed,
            Self::DepthExceeded,
            Self::RequestLimitHit,
            Self::ContentMismatch,
        ]
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
