// tests/common/mod.rs
// Shared fixtures: a scripted fetcher and helpers to build controllers/routers.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::Notify;

use channel_insights::analytics::Aggregator;
use channel_insights::channels::ChannelStore;
use channel_insights::error::{AppError, Result};
use channel_insights::fetcher::VideoFetcher;
use channel_insights::job::{FetchJobController, JobStatus, ProgressReporter, ProgressState};
use channel_insights::models::Video;
use channel_insights::store::{AnalyticsStore, MemoryAnalyticsStore};
use channel_insights::AppState;

pub fn video(id: &str, title: &str, views: u64, likes: u64, day: u32) -> Video {
    Video {
        id: id.to_string(),
        title: title.to_string(),
        url: format!("https://www.youtube.com/watch?v={id}"),
        views,
        like_count: likes,
        duration: 300,
        published: Some(Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()),
        ..Default::default()
    }
}

pub fn sample_videos() -> Vec<Video> {
    vec![
        video("v1", "Rust async deep dive", 1000, 50, 1),
        video("v2", "Async traits in Rust!", 3000, 90, 4),
        video("v3", "Borrow checker tips", 0, 0, 10),
    ]
}

/// Reports a few progress steps, optionally waits for `gate`, then returns `videos` or fails.
pub struct StubFetcher {
    pub videos: Vec<Video>,
    pub fail_with: Option<String>,
    pub gate: Option<Arc<Notify>>,
    pub calls: AtomicUsize,
}

impl StubFetcher {
    pub fn ok(videos: Vec<Video>) -> Self {
        Self {
            videos,
            fail_with: None,
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Self::ok(Vec::new())
        }
    }

    pub fn gated(videos: Vec<Video>, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::ok(videos)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoFetcher for StubFetcher {
    async fn fetch_videos(&self, _channel_url: &str, progress: &ProgressReporter) -> Result<Vec<Video>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        progress.report_step(1, 3, "page 1 of 3");
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        progress.report_step(2, 3, "page 2 of 3");
        if let Some(msg) = &self.fail_with {
            return Err(AppError::FetchFailure(msg.clone()));
        }
        progress.report_step(3, 3, "page 3 of 3");
        Ok(self.videos.clone())
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

pub fn controller(
    fetcher: Arc<StubFetcher>,
    store: Arc<dyn AnalyticsStore>,
    cache_ttl: Duration,
) -> FetchJobController {
    FetchJobController::new(fetcher, Arc::new(Aggregator::default()), store)
        .with_cache_ttl(cache_ttl)
}

pub fn test_state(fetcher: Arc<StubFetcher>, channels_dir: &std::path::Path) -> AppState {
    let store: Arc<dyn AnalyticsStore> = Arc::new(MemoryAnalyticsStore::new());
    AppState {
        jobs: controller(fetcher, store.clone(), Duration::ZERO),
        aggregator: Arc::new(Aggregator::default()),
        store,
        channels: Arc::new(ChannelStore::new(channels_dir.join("channels.json"))),
        static_dir: None,
    }
}

/// Poll until the job leaves `running`; panics after ~2s.
pub async fn wait_terminal(c: &FetchJobController) -> ProgressState {
    for _ in 0..400 {
        let p = c.get_progress();
        if matches!(p.status, JobStatus::Done | JobStatus::Error) {
            return p;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("job still running: {:?}", c.get_progress());
}
