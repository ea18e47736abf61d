//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::state::{CachedRobots, DomainState, ErrorCategory, ErrorSeverity, PageState};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{DepthRecord, LinkRecord, LinkType, PageRecord, RunRecord, RunStatus};
use crate::SumiError;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(SumiError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, SumiError> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
            PRAGMA mmap_size = 268435456;
        ",
        )?;

        // Initialize schema
        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, SumiError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, finished_at, config_hash, status FROM runs WHERE id = ?1",
        )?;

        let run = stmt
            .query_row(params![run_id], |row| {
                Ok(RunRecord {
                    id: row.get(0)?,
                    started_at: row.get(1)?,
                    finished_at: row.get(2)?,
                    config_hash: row.get(3)?,
                    status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
                        .unwrap_or(RunStatus::Running),
                })
            })
            .map_err(|_| StorageError::RunNotFound(run_id))?;

        Ok(run)
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, finished_at, config_hash, status FROM runs ORDER BY id DESC LIMIT 1",
        )?;

        let run = stmt
            .query_row([], |row| {
                Ok(RunRecord {
                    id: row.get(0)?,
                    started_at: row.get(1)?,
                    finished_at: row.get(2)?,
                    config_hash: row.get(3)?,
                    status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
                        .unwrap_or(RunStatus::Running),
                })
            })
            .optional()?;

        Ok(run)
    }

    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE runs SET status = ?1 WHERE id = ?2",
            params![status.to_db_string(), run_id],
        )?;
        Ok(())
    }

    fn complete_run(&mut self, run_id: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![RunStatus::Completed.to_db_string(), now, run_id],
        )?;
        Ok(())
    }

    // ===== Page Management =====

    fn insert_or_get_page(
        &mut self,
        url: &str,
        domain: &str,
        discovered_run: i64,
    ) -> StorageResult<i64> {
        // Try to get existing page
        let existing: Option<i64> = self
            .conn
            .query_row("SELECT id FROM pages WHERE url = ?1", params![url], |row| {
                row.get(0)
            })
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        // Insert new page
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO pages (url, domain, state, discovered_at, discovered_run) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![url, domain, PageState::Discovered.to_db_string(), now, discovered_run],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_page(&self, page_id: i64) -> StorageResult<PageRecord> {
        let mut stmt = self.conn.prepare(
            "SELECT id, url, domain, state, title, status_code, content_type, last_modified,
             visited_at, discovered_at, discovered_run, error_message, retry_count
             FROM pages WHERE id = ?1",
        )?;

        let page = stmt
            .query_row(params![page_id], |row| {
                Ok(PageRecord {
                    id: row.get(0)?,
                    url: row.get(1)?,
                    domain: row.get(2)?,
                    state: PageState::from_db_string(&row.get::<_, String>(3)?)
                        .unwrap_or(PageState::Failed),
                    title: row.get(4)?,
                    status_code: row.get(5)?,
                    content_type: row.get(6)?,
                    last_modified: row.get(7)?,
                    visited_at: row.get(8)?,
                    discovered_at: row.get(9)?,
                    discovered_run: row.get(10)?,
                    error_message: row.get(11)?,
                    retry_count: row.get(12)?,
                })
            })
            .map_err(|_| StorageError::PageNotFound(format!("Page ID {}", page_id)))?;

        Ok(page)
    }

    fn get_page_by_url(&self, url: &str) -> StorageResult<Option<PageRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, url, domain, state, title, status_code, content_type, last_modified,
             visited_at, discovered_at, discovered_run, error_message, retry_count
             FROM pages WHERE url = ?1",
        )?;

        let page = stmt
            .query_row(params![url], |row| {
                Ok(PageRecord {
                    id: row.get(0)?,
                    url: row.get(1)?,
                    domain: row.get(2)?,
                    state: PageState::from_db_string(&row.get::<_, String>(3)?)
                        .unwrap_or(PageState::Failed),
                    title: row.get(4)?,
                    status_code: row.get(5)?,
                    content_type: row.get(6)?,
                    last_modified: row.get(7)?,
                    visited_at: row.get(8)?,
                    discovered_at: row.get(9)?,
                    discovered_run: row.get(10)?,
                    error_message: row.get(11)?,
                    retry_count: row.get(12)?,
                })
            })
            .optional()?;

        Ok(page)
    }

    fn update_page_state(
        &mut self,
        page_id: i64,
        state: PageState,
        title: Option<&str>,
        status_code: Option<u16>,
        content_type: Option<&str>,
        error_message: Option<&str>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE pages SET state = ?1, title = ?2, status_code = ?3, content_type = ?4,
             visited_at = ?5, error_message = ?6 WHERE id = ?7",
            params![
                state.to_db_string(),
                title,
                status_code,
                content_type,
                now,
                error_message,
                page_id
            ],
        )?;
        Ok(())
    }

    fn increment_retry_count(&mut self, page_id: i64) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE pages SET retry_count = retry_count + 1 WHERE id = ?1",
            params![page_id],
        )?;
        Ok(())
    }

    fn get_pages_by_state(&self, state: PageState) -> StorageResult<Vec<PageRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, url, domain, state, title, status_code, content_type, last_modified,
             visited_at, discovered_at, discovered_run, error_message, retry_count
             FROM pages WHERE state = ?1",
        )?;

        let pages = stmt
            .query_map(params![state.to_db_string()], |row| {
                Ok(PageRecord {
                    id: row.get(0)?,
                    url: row.get(1)?,
                    domain: row.get(2)?,
                    state: PageState::from_db_string(&row.get::<_, String>(3)?)
                        .unwrap_or(PageState::Failed),
                    title: row.get(4)?,
                    status_code: row.get(5)?,
                    content_type: row.get(6)?,
                    last_modified: row.get(7)?,
                    visited_at: row.get(8)?,
                    discovered_at: row.get(9)?,
                    discovered_run: row.get(10)?,
                    error_message: row.get(11)?,
                    retry_count: row.get(12)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pages)
    }

    fn get_interrupted_pages(&self) -> StorageResult<Vec<PageRecord>> {
        self.get_pages_by_state(PageState::Fetching)
    }

    // ===== Depth Tracking =====

    fn upsert_depth(
        &mut self,
        page_id: i64,
        quality_origin: &str,
        depth: u32,
    ) -> StorageResult<()> {
        // Try to insert, on conflict keep the minimum depth
        self.conn.execute(
            "INSERT INTO page_depths (page_id, quality_origin, depth) VALUES (?1, ?2, ?3)
             ON CONFLICT(page_id, quality_origin) DO UPDATE SET depth = MIN(depth, excluded.depth)",
            params![page_id, quality_origin, depth],
        )?;
        Ok(())
    }

    fn get_depths(&self, page_id: i64) -> StorageResult<Vec<DepthRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT page_id, quality_origin, depth FROM page_depths WHERE page_id = ?1")?;

        let depths = stmt
            .query_map(params![page_id], |row| {
                Ok(DepthRecord {
                    page_id: row.get(0)?,
                    quality_origin: row.get(1)?,
                    depth: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(depths)
    }

    fn should_crawl(&self, page_id: i64, max_depth: u32) -> StorageResult<bool> {
        let min_depth: Option<u32> = self
            .conn
            .query_row(
                "SELECT MIN(depth) FROM page_depths WHERE page_id = ?1",
                params![page_id],
                |row| row.get(0),
            )
            .optional()?
            .flatten();

        Ok(min_depth.map(|d| d <= max_depth).unwrap_or(false))
    }

    // ===== Link Management =====

    fn insert_link(
        &mut self,
        from_page_id: i64,
        to_page_id: i64,
        link_type: LinkType,
        run_id: i64,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT OR IGNORE INTO links (from_page_id, to_page_id, link_type, discovered_at, discovered_run) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![from_page_id, to_page_id, link_type.to_db_string(), now, run_id],
            )?;
        Ok(())
    }

    fn get_outgoing_links(&self, page_id: i64) -> StorageResult<Vec<LinkRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT from_page_id, to_page_id, link_type, discovered_at, discovered_run FROM links WHERE from_page_id = ?1",
        )?;

        let links = stmt
            .query_map(params![page_id], |row| {
                Ok(LinkRecord {
                    from_page_id: row.get(0)?,
                    to_page_id: row.get(1)?,
                    link_type: LinkType::from_db_string(&row.get::<_, String>(2)?)
                        .unwrap_or(LinkType::External),
                    discovered_at: row.get(3)?,
                    discovered_run: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(links)
    }

    fn get_incoming_links(&self, page_id: i64) -> StorageResult<Vec<LinkRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT from_page_id, to_page_id, link_type, discovered_at, discovered_run FROM links WHERE to_page_id = ?1",
        )?;

        let links = stmt
            .query_map(params![page_id], |row| {
                Ok(LinkRecord {
                    from_page_id: row.get(0)?,
                    to_page_id: row.get(1)?,
                    link_type: LinkType::from_db_string(&row.get::<_, String>(2)?)
                        .unwrap_or(LinkType::External),
                    discovered_at: row.get(3)?,
                    discovered_run: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(links)
    }

    fn count_links(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM links", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Frontier Management =====

    fn add_to_frontier(&mut self, page_id: i64, priority: u32) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO frontier (page_id, priority) VALUES (?1, ?2)",
            params![page_id, priority],
        )?;
        Ok(())
    }

    fn pop_from_frontier(&mut self) -> StorageResult<Option<i64>> {
        let page_id: Option<i64> = self
            .conn
            .query_row(
                "SELECT page_id FROM frontier ORDER BY priority ASC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = page_id {
            self.conn
                .execute("DELETE FROM frontier WHERE page_id = ?1", params![id])?;
        }

        Ok(page_id)
    }

    fn remove_from_frontier(&mut self, page_id: i64) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM frontier WHERE page_id = ?1", params![page_id])?;
        Ok(())
    }

    fn load_frontier(&self) -> StorageResult<Vec<(i64, u32)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT page_id, priority FROM frontier ORDER BY priority ASC")?;

        let frontier = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(frontier)
    }

    fn clear_frontier(&mut self) -> StorageResult<()> {
        self.conn.execute("DELETE FROM frontier", [])?;
        Ok(())
    }

    fn recover_interrupted_urls(
        &mut self,
        run_id: i64,
        timeout_minutes: i64,
    ) -> StorageResult<usize> {
        let cutoff = Utc::now() - ChronoDuration::minutes(timeout_minutes);

        let mut stmt = self.conn.prepare(
            "SELECT id, visited_at FROM pages WHERE discovered_run = ?1 AND state = ?2",
        )?;
        let stuck: Vec<(i64, Option<String>)> = stmt
            .query_map(params![run_id, PageState::Fetching.to_db_string()], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut reset = 0usize;
        let tx = self.conn.transaction()?;
        for (page_id, visited_at) in stuck {
            let stale = match visited_at.and_then(|s| s.parse::<DateTime<Utc>>().ok()) {
                Some(visited_at) => visited_at < cutoff,
                None => true,
            };
            if !stale {
                continue;
            }

            tx.execute(
                "UPDATE pages SET state = ?1 WHERE id = ?2",
                params![PageState::Discovered.to_db_string(), page_id],
            )?;
            tx.execute(
                "INSERT OR REPLACE INTO frontier (page_id, priority) VALUES (?1, 0)",
                params![page_id],
            )?;
            reset += 1;
        }
        tx.commit()?;

        Ok(reset)
    }

    fn cleanup_old_queue_entries(&mut self, run_id: i64, hours_old: i64) -> StorageResult<usize> {
        let cutoff = Utc::now() - ChronoDuration::hours(hours_old);

        let mut stmt = self.conn.prepare(
            "SELECT f.page_id, p.state, p.visited_at FROM frontier f
             JOIN pages p ON p.id = f.page_id
             WHERE p.discovered_run = ?1",
        )?;
        let rows: Vec<(i64, String, Option<String>)> = stmt
            .query_map(params![run_id], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut removed = 0usize;
        let tx = self.conn.transaction()?;
        for (page_id, state_str, visited_at) in rows {
            let state = PageState::from_db_string(&state_str).unwrap_or(PageState::Failed);
            if !state.is_terminal() {
                continue;
            }

            let old_enough = match visited_at.and_then(|s| s.parse::<DateTime<Utc>>().ok()) {
                Some(visited_at) => visited_at < cutoff,
                None => true,
            };
            if !old_enough {
                continue;
            }

            tx.execute("DELETE FROM frontier WHERE page_id = ?1", params![page_id])?;
            removed += 1;
        }
        tx.commit()?;

        Ok(removed)
    }

    // ===== Domain State Persistence =====

    fn load_domain_states(&self) -> StorageResult<HashMap<String, DomainState>> {
        let mut stmt = self.conn.prepare(
            "SELECT domain, request_count, rate_limited, robots_txt, robots_fetched_at, last_request_time
             FROM domain_states"
        )?;

        let mut states = HashMap::new();
        let rows = stmt.query_map([], |row| {
            let domain: String = row.get(0)?;
            let request_count: u32 = row.get(1)?;
            let rate_limited_int: i32 = row.get(2)?;
            let robots_txt: Option<String> = row.get(3)?;
            let robots_fetched_at: Option<String> = row.get(4)?;
            let _last_request_time: Option<String> = row.get(5)?;

            let robots = if let (Some(content), Some(fetched_str)) = (robots_txt, robots_fetched_at)
            {
                if let Ok(fetched_at) = fetched_str.parse::<DateTime<Utc>>() {
                    Some(CachedRobots {
                        content,
                        fetched_at,
                    })
                } else {
                    None
                }
            } else {
                None
            };

            let state = DomainState {
                request_count,
                last_request_time: None, // We don't persist Instant, will be set on first use
                rate_limited: rate_limited_int != 0,
                robots_txt: robots.clone(),
                robots_fetched_at: robots.as_ref().map(|r| r.fetched_at),
            };

            Ok((domain, state))
        })?;

        for row in rows {
            let (domain, state) = row?;
            states.insert(domain, state);
        }

        Ok(states)
    }

    fn save_domain_states(&mut self, states: &HashMap<String, DomainState>) -> StorageResult<()> {
        // Clear existing domain states
        self.conn.execute("DELETE FROM domain_states", [])?;

        // Insert all current states
        for (domain, state) in states {
            self.update_domain_state(domain, state)?;
        }

        Ok(())
    }

    fn update_domain_state(&mut self, domain: &str, state: &DomainState) -> StorageResult<()> {
        let rate_limited_int = if state.rate_limited { 1 } else { 0 };

        let (robots_txt, robots_fetched_at) = if let Some(robots) = &state.robots_txt {
            (
                Some(robots.content.clone()),
                Some(robots.fetched_at.to_rfc3339()),
            )
        } else {
            (None, None)
        };

        // Note: We don't persist last_request_time (Instant) as it's not serializable
        // It will be reset when domain state is loaded
        self.conn.execute(
            "INSERT OR REPLACE INTO domain_states
             (domain, request_count, rate_limited, robots_txt, robots_fetched_at, last_request_time)
             VALUES (?1, ?2, ?3, ?4, ?5, NULL)",
            params![
                domain,
                state.request_count,
                rate_limited_int,
                robots_txt,
                robots_fetched_at,
            ],
        )?;

        Ok(())
    }

    // ===== Blacklist/Stub Tracking =====

    fn record_blacklisted(&mut self, url: &str, referrer: &str, run_id: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO blacklisted_urls (url, referrer, discovered_run, discovered_at) VALUES (?1, ?2, ?3, ?4)",
            params![url, referrer, run_id, now],
        )?;
        Ok(())
    }

    fn record_stubbed(&mut self, url: &str, referrer: &str, run_id: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO stubbed_urls (url, referrer, discovered_run, discovered_at) VALUES (?1, ?2, ?3, ?4)",
            params![url, referrer, run_id, now],
        )?;
        Ok(())
    }

    fn get_blacklisted_urls(&self) -> StorageResult<Vec<(String, u32)>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, COUNT(*) as count FROM blacklisted_urls GROUP BY url ORDER BY count DESC",
        )?;

        let urls = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as u32)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(urls)
    }

    fn get_stubbed_urls(&self) -> StorageResult<Vec<(String, u32)>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, COUNT(*) as count FROM stubbed_urls GROUP BY url ORDER BY count DESC",
        )?;

        let urls = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as u32)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(urls)
    }

    // ===== Statistics =====

    fn count_pages_by_state(&self, state: PageState) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE state = ?1",
            params![state.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_total_pages(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_unique_domains(&self) -> StorageResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(DISTINCT domain) FROM pages", [], |row| {
                    row.get(0)
                })?;
        Ok(count as u64)
    }

    fn get_error_summary(&self) -> StorageResult<HashMap<PageState, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT state, COUNT(*) FROM pages GROUP BY state")?;

        let mut summary = HashMap::new();
        let rows = stmt.query_map([], |row| {
            let state_str: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((state_str, count))
        })?;

        for row in rows {
            let (state_str, count) = row?;
            if let Some(state) = PageState::from_db_string(&state_str) {
                if state.is_error() {
                    summary.insert(state, count as u64);
                }
            }
        }

        Ok(summary)
    }

    fn get_rate_limited_domains(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT domain FROM pages WHERE state = ?1")?;

        let domains = stmt
            .query_map(params![PageState::RateLimited.to_db_string()], |row| {
                row.get(0)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(domains)
    }

    fn get_depth_breakdown(&self) -> StorageResult<HashMap<u32, usize>> {
        let query = "
            SELECT depth, COUNT(DISTINCT page_id) as count
            FROM page_depths
            GROUP BY depth
            ORDER BY depth
        ";

        let mut stmt = self.conn.prepare(query)?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, u32>(0)?, row.get::<_, usize>(1)?))
        })?;

        let mut breakdown = HashMap::new();
        for row in rows {
            let (depth, count) = row?;
            breakdown.insert(depth, count);
        }

        Ok(breakdown)
    }

    fn get_discovered_domains(&self) -> StorageResult<Vec<String>> {
        let query = "
            SELECT DISTINCT domain
            FROM pages
            ORDER BY domain
        ";

        let mut stmt = self.conn.prepare(query)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut domains = Vec::new();
        for row in rows {
            domains.push(row?);
        }

        Ok(domains)
    }

    // ===== Word Frequency Tracking =====

    fn record_word_frequencies(
        &mut self,
        run_id: i64,
        page_id: i64,
        counts: &[(String, u64, usize)],
    ) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        for (word, frequency, word_length) in counts {
            tx.execute(
                "INSERT INTO word_frequencies (run_id, page_id, word, word_length, frequency)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(page_id, word) DO UPDATE SET frequency = frequency + excluded.frequency",
                params![run_id, page_id, word, *word_length as i64, *frequency as i64],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn get_top_word_frequencies(
        &self,
        run_id: i64,
        limit: usize,
    ) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT word, SUM(frequency) as total FROM word_frequencies WHERE run_id = ?1
             GROUP BY word ORDER BY total DESC, word ASC LIMIT ?2",
        )?;

        let rows = stmt
            .query_map(params![run_id, limit as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    // ===== Error Event Tracking =====

    fn record_error_event(
        &mut self,
        run_id: i64,
        page_id: Option<i64>,
        url: &str,
        depth: u32,
        operation: &str,
        category: ErrorCategory,
        severity: ErrorSeverity,
        message: &str,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO error_events (run_id, page_id, url, depth, operation, category, severity, message, occurred_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                run_id,
                page_id,
                url,
                depth,
                operation,
                category.to_db_string(),
                severity.to_db_string(),
                message,
                now
            ],
        )?;
        Ok(())
    }

    fn get_recent_error_events(
        &self,
        run_id: i64,
        limit: usize,
    ) -> StorageResult<Vec<(String, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, message FROM error_events WHERE run_id = ?1
             ORDER BY id DESC LIMIT ?2",
        )?;

        let rows = stmt
            .query_map(params![run_id, limit as i64], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_in_memory() {
        let storage = SqliteStorage::new_in_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_create_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("test_hash").unwrap();
        assert!(run_id > 0);
    }

    #[test]
    fn test_insert_page() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("test_hash").unwrap();
        let page_id = storage
            .insert_or_get_page("https://example.com/", "example.com", run_id)
            .unwrap();
        assert!(page_id > 0);
    }

    #[test]
    fn test_insert_duplicate_page() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("test_hash").unwrap();

        let page_id1 = storage
            .insert_or_get_page("https://example.com/", "example.com", run_id)
            .unwrap();
        let page_id2 = storage
            .insert_or_get_page("https://example.com/", "example.com", run_id)
            .unwrap();

        assert_eq!(page_id1, page_id2);
    }

    #[test]
    fn test_update_page_state() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("test_hash").unwrap();
        let page_id = storage
            .insert_or_get_page("https://example.com/", "example.com", run_id)
            .unwrap();

        storage
            .update_page_state(
                page_id,
                PageState::Processed,
                Some("Test Page"),
                Some(200),
                Some("text/html"),
                None,
            )
            .unwrap();

        let page = storage.get_page(page_id).unwrap();
        assert_eq!(page.state, PageState::Processed);
        assert_eq!(page.title, Some("Test Page".to_string()));
    }

    #[test]
    fn test_domain_state_persistence() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();

        // Create a domain state
        let mut state = DomainState::new();
        state.request_count = 42;
        state.rate_limited = true;
        state.update_robots("User-agent: *\nDisallow: /admin".to_string());

        // Save it
        storage.update_domain_state("example.com", &state).unwrap();

        // Load it back
        let loaded_states = storage.load_domain_states().unwrap();
        assert_eq!(loaded_states.len(), 1);

        let loaded_state = loaded_states.get("example.com").unwrap();
        assert_eq!(loaded_state.request_count, 42);
        assert_eq!(loaded_state.rate_limited, true);
        assert!(loaded_state.robots_txt.is_some());
        assert_eq!(
            loaded_state.robots_txt.as_ref().unwrap().content,
            "User-agent: *\nDisallow: /admin"
        );
    }

    #[test]
    fn test_save_multiple_domain_states() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();

        // Create multiple domain states
        let mut states = HashMap::new();

        let mut state1 = DomainState::new();
        state1.request_count = 10;
        states.insert("example.com".to_string(), state1);

        let mut state2 = DomainState::new();
        state2.request_count = 20;
        state2.rate_limited = true;
        states.insert("test.com".to_string(), state2);

        let mut state3 = DomainState::new();
        state3.request_count = 5;
        states.insert("demo.org".to_string(), state3);

        // Save all states
        storage.save_domain_states(&states).unwrap();

        // Load them back
        let loaded_states = storage.load_domain_states().unwrap();
        assert_eq!(loaded_states.len(), 3);

        assert_eq!(loaded_states.get("example.com").unwrap().request_count, 10);
        assert_eq!(loaded_states.get("test.com").unwrap().request_count, 20);
        assert!(loaded_states.get("test.com").unwrap().rate_limited);
        assert_eq!(loaded_states.get("demo.org").unwrap().request_count, 5);
    }

    #[test]
    fn test_update_domain_state_replaces_existing() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();

        // Create and save initial state
        let mut state1 = DomainState::new();
        state1.request_count = 10;
        storage.update_domain_state("example.com", &state1).unwrap();

        // Update with new state
        let mut state2 = DomainState::new();
        state2.request_count = 20;
        state2.rate_limited = true;
        storage.update_domain_state("example.com", &state2).unwrap();

        // Load and verify only latest state exists
        let loaded_states = storage.load_domain_states().unwrap();
        assert_eq!(loaded_states.len(), 1);

        let loaded = loaded_states.get("example.com").unwrap();
        assert_eq!(loaded.request_count, 20);
        assert!(loaded.rate_limited);
    }

    #[test]
    fn test_record_and_get_word_frequencies() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("test_hash").unwrap();
        let page1 = storage
            .insert_or_get_page("https://example.com/a", "example.com", run_id)
            .unwrap();
        let page2 = storage
            .insert_or_get_page("https://example.com/b", "example.com", run_id)
            .unwrap();

        storage
            .record_word_frequencies(
                run_id,
                page1,
                &[("rust".to_string(), 3, 4), ("crate".to_string(), 1, 5)],
            )
            .unwrap();
        storage
            .record_word_frequencies(run_id, page2, &[("rust".to_string(), 2, 4)])
            .unwrap();

        let top = storage.get_top_word_frequencies(run_id, 10).unwrap();
        assert_eq!(top[0], ("rust".to_string(), 5));
        assert_eq!(top[1], ("crate".to_string(), 1));
    }

    #[test]
    fn test_record_word_frequencies_same_page_upserts() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("test_hash").unwrap();
        let page_id = storage
            .insert_or_get_page("https://example.com/a", "example.com", run_id)
            .unwrap();

        storage
            .record_word_frequencies(run_id, page_id, &[("rust".to_string(), 3, 4)])
            .unwrap();
        storage
            .record_word_frequencies(run_id, page_id, &[("rust".to_string(), 2, 4)])
            .unwrap();

        let top = storage.get_top_word_frequencies(run_id, 10).unwrap();
        assert_eq!(top[0], ("rust".to_string(), 5));
    }

    #[test]
    fn test_record_and_get_error_events() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("test_hash").unwrap();

        storage
            .record_error_event(
                run_id,
                None,
                "https://example.com/broken",
                2,
                "fetch",
                ErrorCategory::NetworkError,
                ErrorSeverity::Error,
                "timeout",
            )
            .unwrap();

        let events = storage.get_recent_error_events(run_id, 10).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, "https://example.com/broken");
        assert_eq!(events[0].1, "timeout");
    }

    #[test]
    fn test_insert_link_classifies_type() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("test_hash").unwrap();
        let from = storage
            .insert_or_get_page("https://example.com/a", "example.com", run_id)
            .unwrap();
        let to = storage
            .insert_or_get_page("https://other.com/b", "other.com", run_id)
            .unwrap();

        storage
            .insert_link(from, to, LinkType::External, run_id)
            .unwrap();

        let links = storage.get_outgoing_links(from).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].link_type, LinkType::External);
    }

    #[test]
    fn test_remove_from_frontier() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("test_hash").unwrap();
        let page_id = storage
            .insert_or_get_page("https://example.com/a", "example.com", run_id)
            .unwrap();

        storage.add_to_frontier(page_id, 0).unwrap();
        storage.remove_from_frontier(page_id).unwrap();

        assert_eq!(storage.load_frontier().unwrap(), vec![]);
    }

    #[test]
    fn test_recover_interrupted_urls_resets_stuck_pages() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("test_hash").unwrap();
        let page_id = storage
            .insert_or_get_page("https://example.com/a", "example.com", run_id)
            .unwrap();

        // Simulate a crash mid-fetch: state flipped to `fetching` but no
        // visited_at was ever recorded for it, so it must be treated as
        // stuck unconditionally regardless of the timeout.
        storage
            .conn
            .execute(
                "UPDATE pages SET state = ?1 WHERE id = ?2",
                params![PageState::Fetching.to_db_string(), page_id],
            )
            .unwrap();

        let reset = storage.recover_interrupted_urls(run_id, 30).unwrap();
        assert_eq!(reset, 1);

        let page = storage.get_page(page_id).unwrap();
        assert_eq!(page.state, PageState::Discovered);
        assert_eq!(storage.load_frontier().unwrap(), vec![(page_id, 0)]);
    }

    #[test]
    fn test_recover_interrupted_urls_ignores_other_states() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("test_hash").unwrap();
        let page_id = storage
            .insert_or_get_page("https://example.com/a", "example.com", run_id)
            .unwrap();

        storage
            .update_page_state(page_id, PageState::Processed, None, None, None, None)
            .unwrap();

        let reset = storage.recover_interrupted_urls(run_id, 30).unwrap();
        assert_eq!(reset, 0);
    }

    #[test]
    fn test_cleanup_old_queue_entries_removes_stale_terminal_rows() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("test_hash").unwrap();
        let page_id = storage
            .insert_or_get_page("https://example.com/a", "example.com", run_id)
            .unwrap();

        storage
            .update_page_state(page_id, PageState::Processed, None, None, None, None)
            .unwrap();
        storage.add_to_frontier(page_id, 0).unwrap();

        // visited_at was just set to now, so a 0-hour cutoff treats it as stale
        let removed = storage.cleanup_old_queue_entries(run_id, 0).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(storage.load_frontier().unwrap(), vec![]);
    }

    #[test]
    fn test_cleanup_old_queue_entries_keeps_non_terminal_rows() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("test_hash").unwrap();
        let page_id = storage
            .insert_or_get_page("https://example.com/a", "example.com", run_id)
            .unwrap();

        storage.add_to_frontier(page_id, 0).unwrap();

        let removed = storage.cleanup_old_queue_entries(run_id, 0).unwrap();
        assert_eq!(removed, 0);
        assert_eq!(storage.load_frontier().unwrap(), vec![(page_id, 0)]);
    }
}
