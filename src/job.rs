// src/job.rs
//! # Fetch Job Controller
//! Runs one fetch-and-aggregate job at a time and exposes progress snapshots.
//!
//! State machine: `idle -> running -> done | error`, and from either terminal
//! state back to `running` on the next `start`. Terminal states persist until
//! then; nothing resets to `idle`.
//!
//! **Single flight:** at most one job runs per controller, across *all*
//! channels, not per channel. `start` while a job is running is a no-op that
//! returns [`StartOutcome::AlreadyRunning`]. The service is meant for one
//! operator driving one job at a time; the limitation is intentional.
//!
//! There is no timeout on the fetcher. A hung fetch leaves the progress stalled.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::counter;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::analytics::Aggregator;
use crate::error::{AppError, Result};
use crate::fetcher::VideoFetcher;
use crate::models::Video;
use crate::store::AnalyticsStore;

pub const DEFAULT_VIDEO_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Idle,
    Running,
    Done,
    Error,
}

/// Snapshot served to polling clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    pub status: JobStatus,
    /// 0..=100
    pub percent: u8,
    pub message: String,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            status: JobStatus::Idle,
            percent: 0,
            message: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

#[derive(Debug)]
struct CachedVideos {
    fetched_at: Instant,
    videos: Vec<Video>,
}

#[derive(Debug)]
struct JobState {
    progress: ProgressState,
    run_id: u64,
    cancel: CancellationToken,
    last_videos: Vec<Video>,
    cache: HashMap<String, CachedVideos>,
}

impl JobState {
    fn new() -> Self {
        Self {
            progress: ProgressState::default(),
            run_id: 0,
            cancel: CancellationToken::new(),
            last_videos: Vec::new(),
            cache: HashMap::new(),
        }
    }
}

/// Handed to the fetcher so it can push progress into the run that owns it.
///
/// Updates from a stale run or after the run finished are ignored; percent is
/// clamped to 100 and never moves backwards.
#[derive(Clone)]
pub struct ProgressReporter {
    state: Arc<Mutex<JobState>>,
    run_id: u64,
}

impl ProgressReporter {
    /// A reporter bound to its own private state. Used to drive a fetcher outside the controller.
    pub fn detached() -> Self {
        let mut st = JobState::new();
        st.progress.status = JobStatus::Running;
        Self {
            state: Arc::new(Mutex::new(st)),
            run_id: 0,
        }
    }

    pub fn report(&self, percent: u8, message: impl Into<String>) {
        let mut st = self.state.lock();
        if st.run_id != self.run_id || st.progress.status != JobStatus::Running {
            return;
        }
        st.progress.percent = st.progress.percent.max(percent.min(100));
        st.progress.message = message.into();
        debug!(percent = st.progress.percent, message = %st.progress.message, "progress");
    }

    /// Report `done` of `total` items.
    pub fn report_step(&self, done: usize, total: usize, message: impl Into<String>) {
        let pct = if total == 0 {
            0
        } else {
            (done.min(total) * 100 / total) as u8
        };
        self.report(pct, message);
    }

    pub fn current(&self) -> ProgressState {
        self.state.lock().progress.clone()
    }
}

/// Owns the process-wide progress state. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct FetchJobController {
    state: Arc<Mutex<JobState>>,
    fetcher: Arc<dyn VideoFetcher>,
    aggregator: Arc<Aggregator>,
    store: Arc<dyn AnalyticsStore>,
    cache_ttl: Duration,
}

impl FetchJobController {
    pub fn new(
        fetcher: Arc<dyn VideoFetcher>,
        aggregator: Arc<Aggregator>,
        store: Arc<dyn AnalyticsStore>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(JobState::new())),
            fetcher,
            aggregator,
            store,
            cache_ttl: DEFAULT_VIDEO_CACHE_TTL,
        }
    }

    /// Zero disables the video cache.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Start a job for `channel_url` on a background task and return immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, channel_url: &str) -> StartOutcome {
        let (run_id, token) = {
            let mut st = self.state.lock();
            if st.progress.status == JobStatus::Running {
                debug!(channel = channel_url, "start ignored, job already running");
                return StartOutcome::AlreadyRunning;
            }
            st.run_id += 1;
            st.cancel = CancellationToken::new();
            st.progress = ProgressState {
                status: JobStatus::Running,
                percent: 0,
                message: "Starting...".to_string(),
            };
            (st.run_id, st.cancel.clone())
        };

        counter!("fetch_jobs_started_total").increment(1);
        info!(channel = channel_url, run_id, fetcher = self.fetcher.name(), "fetch job started");

        let this = self.clone();
        let url = channel_url.to_string();
        tokio::spawn(async move {
            // A panic in the work surfaces here as a JoinError.
            let work = {
                let this = this.clone();
                let url = url.clone();
                tokio::spawn(async move { this.run(run_id, &url, token).await })
            };
            let outcome = match work.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(channel = %url, run_id, error = %e, "fetch job panicked");
                    Err(AppError::FetchFailure("job panicked".to_string()))
                }
            };
            this.finish(run_id, &url, outcome);
        });
        StartOutcome::Started
    }

    pub fn get_progress(&self) -> ProgressState {
        self.state.lock().progress.clone()
    }

    /// Videos of the most recent successful run; empty before the first one.
    pub fn get_last_videos(&self) -> Vec<Video> {
        self.state.lock().last_videos.clone()
    }

    /// Token of the current (or most recent) run. Cancelling it ends the run in `error`.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.state.lock().cancel.clone()
    }

    async fn run(
        &self,
        run_id: u64,
        url: &str,
        token: CancellationToken,
    ) -> Result<(Vec<Video>, bool)> {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(AppError::Cancelled),
            res = self.execute(run_id, url) => res,
        }
    }

    /// Apply a run's outcome, unless a newer run has taken over.
    fn finish(&self, run_id: u64, url: &str, outcome: Result<(Vec<Video>, bool)>) {
        let mut st = self.state.lock();
        if st.run_id != run_id {
            return;
        }
        match outcome {
            Ok((videos, from_cache)) => {
                counter!("fetch_jobs_completed_total").increment(1);
                info!(channel = url, videos = videos.len(), from_cache, "fetch job done");
                st.last_videos = videos;
                st.progress = ProgressState {
                    status: JobStatus::Done,
                    percent: 100,
                    message: if from_cache {
                        "Loaded from cache".to_string()
                    } else {
                        "Completed!".to_string()
                    },
                };
            }
            Err(e) => {
                counter!("fetch_jobs_failed_total").increment(1);
                warn!(channel = url, error = %e, percent = st.progress.percent, "fetch job failed");
                st.progress.status = JobStatus::Error;
                st.progress.message = e.to_string();
            }
        }
    }

    /// Fetch (or reuse cached) videos, aggregate, save. Returns the videos and whether the cache served them.
    async fn execute(&self, run_id: u64, url: &str) -> Result<(Vec<Video>, bool)> {
        let reporter = ProgressReporter {
            state: self.state.clone(),
            run_id,
        };

        let (videos, from_cache) = match self.cached(url) {
            Some(v) => {
                counter!("video_cache_hits_total").increment(1);
                reporter.report(100, "Loaded from cache");
                (v, true)
            }
            None => (self.fetcher.fetch_videos(url, &reporter).await?, false),
        };

        let summary = self.aggregator.aggregate(&videos)?;
        self.store.save(url, &summary).await?;
        counter!("analytics_computed_total").increment(1);

        if !from_cache && !self.cache_ttl.is_zero() {
            let ttl = self.cache_ttl;
            let mut st = self.state.lock();
            st.cache.retain(|_, c| c.fetched_at.elapsed() < ttl);
            st.cache.insert(
                url.to_string(),
                CachedVideos {
                    fetched_at: Instant::now(),
                    videos: videos.clone(),
                },
            );
        }
        Ok((videos, from_cache))
    }

    fn cached(&self, url: &str) -> Option<Vec<Video>> {
        if self.cache_ttl.is_zero() {
            return None;
        }
        let mut st = self.state.lock();
        let fresh = st
            .cache
            .get(url)
            .is_some_and(|c| c.fetched_at.elapsed() < self.cache_ttl);
        if !fresh {
            st.cache.remove(url);
            return None;
        }
        st.cache.get(url).map(|c| c.videos.clone())
    }
}
