//! Worker pool: parallel fetch/parse/analyze pipelines
//!
//! A fixed-size pool of long-lived tasks pulls `WorkerTask`s off a shared
//! channel and pushes back `WorkerResult`s. Workers are pure computation —
//! fetch, parse, word-analysis, link extraction — and never touch storage;
//! the `Coordinator` is the sole owner of the `rusqlite::Connection` and
//! persists every result as it arrives off the result channel. This keeps
//! the actual network/CPU work running `concurrent_workers`-wide in
//! parallel without sharing the connection across tasks.

use crate::config::ContentConfig;
use crate::crawler::analyzer::analyze_text;
use crate::crawler::fetcher::{fetch_url, FetchResult};
use crate::crawler::frontier::QueuedUrl;
use crate::crawler::parser::parse_html;
use crate::state::PageState;
use reqwest::Client;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// A unit of work handed to a worker: fetch, parse, and analyze one URL
pub struct WorkerTask {
    pub queued: QueuedUrl,
}

/// Per-task timing breakdown, in seconds
#[derive(Debug, Clone, Copy, Default)]
pub struct Timings {
    pub fetch: f64,
    pub parse: f64,
    pub analyze: f64,
    pub total: f64,
}

/// What a worker learned about a task, computed but not yet persisted
pub enum WorkerOutcome {
    /// Fetched and parsed successfully
    Processed {
        status_code: u16,
        content_type: String,
        title: Option<String>,
        links: Vec<String>,
        word_frequencies: Vec<(String, u64, usize)>,
    },
    /// Fetched but the body failed to parse as HTML
    ParseFailed {
        status_code: u16,
        content_type: String,
        message: String,
    },
    /// Content-Type wasn't in the accepted list
    ContentMismatch { content_type: String },
    /// Non-2xx HTTP response
    HttpError { status_code: u16, state: PageState },
    /// Connection/DNS/TLS/timeout failure
    NetworkError { error: String, state: PageState },
    /// Too many redirects, or a redirect loop
    RedirectError { error: String },
}

/// A completed task, returned to the coordinator for persistence
pub struct WorkerResult {
    pub queued: QueuedUrl,
    pub worker_id: usize,
    pub outcome: WorkerOutcome,
    pub timings: Timings,
}

/// A running worker pool: submit tasks on `tasks`, collect results from `results`
pub struct WorkerPool {
    pub tasks: mpsc::Sender<WorkerTask>,
    pub results: mpsc::Receiver<WorkerResult>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `worker_count` long-lived tasks, each pulling from a shared
    /// task queue and feeding a shared result queue
    ///
    /// `tokio::sync::mpsc` only supports a single consumer, so the task
    /// receiver is shared behind an `Arc<Mutex<_>>` rather than each worker
    /// owning its own channel; workers only hold the lock for the instant
    /// it takes to pop the next task.
    pub fn spawn(worker_count: usize, client: Client, content: ContentConfig) -> Self {
        let worker_count = worker_count.max(1);
        let (task_tx, task_rx) = mpsc::channel(worker_count * 4);
        let (result_tx, result_rx) = mpsc::channel(worker_count * 4);
        let task_rx = Arc::new(Mutex::new(task_rx));

        let mut handles = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let client = client.clone();
            let content = content.clone();
            let task_rx = Arc::clone(&task_rx);
            let result_tx = result_tx.clone();
            handles.push(tokio::spawn(worker_loop(
                worker_id, client, task_rx, result_tx, content,
            )));
        }

        Self {
            tasks: task_tx,
            results: result_rx,
            handles,
        }
    }

    /// Drops the task sender so workers exit once their queue empties, then
    /// waits for every worker to finish
    pub async fn shutdown(self) {
        drop(self.tasks);
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

async fn worker_loop(
    worker_id: usize,
    client: Client,
    task_rx: Arc<Mutex<mpsc::Receiver<WorkerTask>>>,
    result_tx: mpsc::Sender<WorkerResult>,
    content: ContentConfig,
) {
    loop {
        let task = {
            let mut rx = task_rx.lock().await;
            rx.recv().await
        };
        let Some(task) = task else {
            break;
        };

        let result = execute_task(worker_id, &client, task, &content).await;
        if result_tx.send(result).await.is_err() {
            break;
        }
    }
}

/// Runs one task's full pipeline: fetch, then (on success) parse and analyze
async fn execute_task(
    worker_id: usize,
    client: &Client,
    task: WorkerTask,
    content: &ContentConfig,
) -> WorkerResult {
    let total_start = Instant::now();
    let queued = task.queued;

    let fetch_start = Instant::now();
    let fetch_result = fetch_url(client, queued.url.as_str()).await;
    let fetch_secs = fetch_start.elapsed().as_secs_f64();

    let mut timings = Timings {
        fetch: fetch_secs,
        ..Timings::default()
    };

    let outcome = match fetch_result {
        FetchResult::Success {
            status_code,
            content_type,
            body,
            ..
        } => {
            let parse_start = Instant::now();
            let parsed = parse_html(&body, &queued.url);
            timings.parse = parse_start.elapsed().as_secs_f64();

            match parsed {
                Ok(parsed) => {
                    let analyze_start = Instant::now();
                    let analysis =
                        analyze_text(&parsed.text, false, content.max_words_per_page);
                    timings.analyze = analyze_start.elapsed().as_secs_f64();

                    let word_frequencies = analysis
                        .word_frequencies
                        .into_iter()
                        .map(|(word, freq)| {
                            let length = word.chars().count();
                            (word, freq, length)
                        })
                        .collect();

                    WorkerOutcome::Processed {
                        status_code,
                        content_type,
                        title: parsed.title,
                        links: parsed.links,
                        word_frequencies,
                    }
                }
                Err(message) => WorkerOutcome::ParseFailed {
                    status_code,
                    content_type,
                    message,
                },
            }
        }
        FetchResult::ContentMismatch { content_type } => {
            WorkerOutcome::ContentMismatch { content_type }
        }
        FetchResult::HttpError { status_code, state } => {
            WorkerOutcome::HttpError { status_code, state }
        }
        FetchResult::NetworkError { error, state } => {
            WorkerOutcome::NetworkError { error, state }
        }
        FetchResult::RedirectError { error } => WorkerOutcome::RedirectError { error },
    };

    timings.total = total_start.elapsed().as_secs_f64();

    WorkerResult {
        queued,
        worker_id,
        outcome,
        timings,
    }
}
