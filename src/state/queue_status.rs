//! Frontier-entry lifecycle state
//!
//! `QueueStatus` tracks where a queued URL sits in the frontier's lifecycle.
//! It is deliberately distinct from `PageState`: `PageState` classifies how a
//! fetch ended (dead link, rate limited, processed, ...), while `QueueStatus`
//! tracks whether the frontier still owns the entry. A page can be
//! re-enqueued as a new `QueuedUrl` (new `QueueStatus::Pending` row) without
//! disturbing its prior `PageState` history.
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueStatus {
    /// Waiting in the frontier, not yet handed to a worker
    Pending,
    /// Handed to a worker, fetch/processing in flight
    Processing,
    /// Worker finished; the underlying page now has a terminal `PageState`
    Completed,
    /// Retries exhausted; the frontier gave up on this entry
    Failed,
}

impl QueueStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
