//! Frontier: the crawl's priority queue and dedup layer
//!
//! This module replaces the older scheduler's in-memory-only `BinaryHeap` with
//! a frontier that also tracks each entry's queue lifecycle (`QueueStatus`),
//! dedups URLs with a bloom filter ahead of an exact set, and optionally
//! mirrors mutations to persistent storage so a crash mid-crawl can resume.
//!
//! Ordering here is the natural `Ord` on `(priority, depth, discovered_at)`
//! (higher priority first, then shallower depth, then older discovery time,
//! popped first). The persistent `frontier` table in storage uses the
//! opposite convention for priority (`ORDER BY priority ASC`, lower value
//! first), so `to_db_priority`/`from_db_priority` invert the value at the
//! persistence boundary only; in-memory ordering and the stored table never
//! need to agree on which direction is "up".
//!
//! Entries that fail are not dropped: `mark_failed` schedules them into
//! `delayed` behind an exponential backoff, and `get` promotes any entry
//! whose backoff has elapsed back into the heap before popping.

use crate::crawler::bloom::BloomFilter;
use crate::state::QueueStatus;
use crate::storage::Storage;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::time::{Duration, Instant};
use url::Url;

/// A URL queued for fetching with priority and depth information
#[derive(Debug, Clone)]
pub struct QueuedUrl {
    pub url: Url,
    pub domain: String,
    /// Higher value is fetched first
    pub priority: u32,
    pub page_id: i64,
    pub depth: u32,
    pub parent_url: Option<String>,
    /// When this entry first entered the frontier
    pub discovered_at: Instant,
    /// Number of failed attempts so far
    pub attempts: u32,
    /// When a failed entry becomes eligible for retry again
    pub scheduled_at: Option<Instant>,
    /// The most recent failure's message, if any
    pub error: Option<String>,
}

impl Ord for QueuedUrl {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.depth.cmp(&self.depth))
            .then_with(|| other.discovered_at.cmp(&self.discovered_at))
    }
}

impl PartialOrd for QueuedUrl {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedUrl {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.url == other.url
    }
}

impl Eq for QueuedUrl {}

/// Inverts an in-memory priority into the DB's "lower value wins" convention
fn to_db_priority(priority: u32) -> u32 {
    u32::MAX - priority
}

/// Inverts a DB-stored priority back into the natural "higher value wins" convention
fn from_db_priority(db_priority: u32) -> u32 {
    u32::MAX - db_priority
}

/// Base used for `2^attempts` exponential backoff between retries
const BACKOFF_BASE_SECS: u64 = 2;

/// Computes the backoff delay before an entry's `attempts`-th retry
fn backoff_for_attempt(attempts: u32) -> Duration {
    Duration::from_secs(BACKOFF_BASE_SECS.saturating_pow(attempts.min(16)))
}

/// Snapshot counts for monitoring/diagnostics
#[derive(Debug, Clone, Copy, Default)]
pub struct FrontierStats {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
}

/// The crawl frontier: priority queue + dedup + lifecycle tracking
pub struct Frontier {
    heap: BinaryHeap<QueuedUrl>,
    /// Entries that failed and are waiting out their backoff window
    delayed: Vec<QueuedUrl>,
    seen: HashSet<String>,
    bloom: Option<BloomFilter>,
    status: HashMap<i64, QueueStatus>,
    processing: HashSet<i64>,
    capacity: usize,
    persist: bool,
    max_retries: u32,
}

impl Frontier {
    /// Creates a new, empty frontier
    ///
    /// # Arguments
    ///
    /// * `capacity` - Soft cap on queued entries; `put` silently drops overflow
    /// * `use_bloom` - Whether to pre-filter dedup checks through a bloom filter
    /// * `persist` - Whether mutations are mirrored to persistent storage
    pub fn new(capacity: usize, use_bloom: bool, persist: bool) -> Self {
        Self::with_max_retries(capacity, use_bloom, persist, 3)
    }

    /// Creates a new, empty frontier with an explicit retry ceiling
    pub fn with_max_retries(
        capacity: usize,
        use_bloom: bool,
        persist: bool,
        max_retries: u32,
    ) -> Self {
        Self {
            heap: BinaryHeap::new(),
            delayed: Vec::new(),
            seen: HashSet::new(),
            bloom: if use_bloom {
                Some(BloomFilter::new(capacity.max(1024), 0.01))
            } else {
                None
            },
            status: HashMap::new(),
            processing: HashSet::new(),
            capacity,
            persist,
            max_retries,
        }
    }

    /// Loads a frontier from storage (crash recovery / resume)
    ///
    /// Every loaded entry starts as `Pending`; any entry previously
    /// `Processing` when the process died is implicitly reset since the
    /// persisted `frontier` table only tracks pending work, not in-flight
    /// status.
    pub fn load_from_storage(
        storage: &dyn Storage,
        urls_by_page_id: &HashMap<i64, QueuedUrl>,
        capacity: usize,
        use_bloom: bool,
        max_retries: u32,
    ) -> crate::storage::StorageResult<Self> {
        let mut frontier = Self::with_max_retries(capacity, use_bloom, true, max_retries);

        for (page_id, db_priority) in storage.load_frontier()? {
            if let Some(queued) = urls_by_page_id.get(&page_id) {
                let mut queued = queued.clone();
                queued.priority = from_db_priority(db_priority);
                frontier.insert_local(queued);
            }
        }

        Ok(frontier)
    }

    fn insert_local(&mut self, queued: QueuedUrl) {
        self.seen.insert(queued.url.as_str().to_string());
        if let Some(bloom) = &mut self.bloom {
            bloom.insert(queued.url.as_str());
        }
        self.status.insert(queued.page_id, QueueStatus::Pending);
        self.heap.push(queued);
    }

    /// Returns true if this URL has already been seen by the frontier
    /// (queued, in flight, or completed)
    pub fn has_seen(&self, url: &str) -> bool {
        match &self.bloom {
            Some(bloom) if !bloom.contains(url) => false,
            _ => self.seen.contains(url),
        }
    }

    /// Adds a single URL to the frontier
    ///
    /// Returns `false` if the URL was already seen, or the frontier is at
    /// capacity.
    pub fn put(
        &mut self,
        storage: Option<&mut dyn Storage>,
        queued: QueuedUrl,
    ) -> crate::storage::StorageResult<bool> {
        if self.has_seen(queued.url.as_str()) {
            return Ok(false);
        }

        if self.heap.len() >= self.capacity {
            tracing::warn!(
                "Frontier at capacity ({}), dropping {}",
                self.capacity,
                queued.url
            );
            return Ok(false);
        }

        if self.persist {
            if let Some(storage) = storage {
                storage.add_to_frontier(queued.page_id, to_db_priority(queued.priority))?;
            }
        }

        self.insert_local(queued);
        Ok(true)
    }

    /// Adds a batch of URLs, skipping any already seen or over capacity
    pub fn put_batch(
        &mut self,
        mut storage: Option<&mut dyn Storage>,
        urls: Vec<QueuedUrl>,
    ) -> crate::storage::StorageResult<usize> {
        let mut added = 0;
        for queued in urls {
            if self.put(storage.as_deref_mut(), queued)? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Moves any `delayed` entry whose backoff has elapsed back into the heap
    fn promote_ready_retries(&mut self) {
        if self.delayed.is_empty() {
            return;
        }
        let now = Instant::now();
        let mut still_waiting = Vec::with_capacity(self.delayed.len());
        for entry in self.delayed.drain(..) {
            let ready = entry.scheduled_at.map(|at| at <= now).unwrap_or(true);
            if ready {
                self.heap.push(entry);
            } else {
                still_waiting.push(entry);
            }
        }
        self.delayed = still_waiting;
    }

    /// Pops the highest-priority pending URL, marking it `Processing`
    ///
    /// When `storage` is given and persistence is enabled, also deletes the
    /// entry's row from the persisted frontier so a later resume doesn't
    /// reload work that's already been picked up.
    pub fn get(
        &mut self,
        storage: Option<&mut dyn Storage>,
    ) -> crate::storage::StorageResult<Option<QueuedUrl>> {
        self.promote_ready_retries();
        let Some(queued) = self.heap.pop() else {
            return Ok(None);
        };

        self.status.insert(queued.page_id, QueueStatus::Processing);
        self.processing.insert(queued.page_id);

        if self.persist {
            if let Some(storage) = storage {
                storage.remove_from_frontier(queued.page_id)?;
            }
        }

        Ok(Some(queued))
    }

    /// Re-adds a popped entry to the heap without re-running the dedup
    /// check (used when a dispatch attempt is abandoned, e.g. a domain rate
    /// limit wait, so the URL goes back to waiting rather than being
    /// treated as newly discovered)
    pub fn requeue(&mut self, queued: QueuedUrl) {
        self.status.insert(queued.page_id, QueueStatus::Pending);
        self.processing.remove(&queued.page_id);
        self.heap.push(queued);
    }

    /// Marks a page's frontier entry as completed (fetch succeeded or failed terminally)
    pub fn mark_completed(&mut self, page_id: i64) {
        self.processing.remove(&page_id);
        self.status.insert(page_id, QueueStatus::Completed);
    }

    /// Records a failed attempt for a popped entry
    ///
    /// Once `attempts` reaches the configured retry ceiling the entry is
    /// marked permanently `Failed`. Otherwise it's scheduled into `delayed`
    /// behind an exponential backoff and its priority is nudged down so a
    /// page that keeps failing doesn't keep crowding out fresh work.
    pub fn mark_failed(&mut self, mut queued: QueuedUrl, error: String) {
        self.processing.remove(&queued.page_id);
        queued.attempts += 1;
        queued.error = Some(error);

        if queued.attempts >= self.max_retries {
            self.status.insert(queued.page_id, QueueStatus::Failed);
            return;
        }

        queued.priority = queued.priority.saturating_sub(1);
        queued.scheduled_at = Some(Instant::now() + backoff_for_attempt(queued.attempts));
        self.status.insert(queued.page_id, QueueStatus::Pending);
        self.delayed.push(queued);
    }

    /// Returns the number of URLs still pending in the queue (including
    /// entries waiting out a retry backoff)
    pub fn size(&self) -> usize {
        self.heap.len() + self.delayed.len()
    }

    /// Returns true if there is no pending work and nothing in flight
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty() && self.delayed.is_empty() && self.processing.is_empty()
    }

    /// Returns true if there is no pending work (ignores in-flight entries)
    pub fn is_drained(&self) -> bool {
        self.heap.is_empty() && self.delayed.is_empty()
    }

    /// Returns a snapshot of entry counts by lifecycle status
    pub fn stats(&self) -> FrontierStats {
        let mut stats = FrontierStats::default();
        for status in self.status.values() {
            match status {
                QueueStatus::Pending => stats.pending += 1,
                QueueStatus::Processing => stats.processing += 1,
                QueueStatus::Completed => stats.completed += 1,
                QueueStatus::Failed => stats.failed += 1,
            }
        }
        stats
    }
}
