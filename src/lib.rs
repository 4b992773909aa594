// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analytics;
pub mod api;
pub mod channels;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod job;
pub mod keywords;
pub mod metrics;
pub mod models;
pub mod store;

use std::sync::Arc;

use axum::Router;
use tracing::info;

pub use crate::api::{create_router, AppState};
pub use crate::error::{AppError, Result};

use crate::analytics::Aggregator;
use crate::channels::ChannelStore;
use crate::config::AppConfig;
use crate::fetcher::YtDlpFetcher;
use crate::job::FetchJobController;
use crate::keywords::KeywordConfig;
use crate::store::JsonFileAnalyticsStore;

/// Production wiring: yt-dlp fetcher, JSON-file analytics and channel stores.
pub fn build_state(cfg: &AppConfig) -> anyhow::Result<AppState> {
    let keywords = if cfg.keywords_config_path.exists() {
        KeywordConfig::load_from(&cfg.keywords_config_path)?
    } else {
        KeywordConfig::default()
    };
    info!(
        stopwords = keywords.stopwords.len(),
        min_len = keywords.min_len,
        "keyword config loaded"
    );

    let aggregator = Arc::new(Aggregator::new(keywords));
    let store = Arc::new(JsonFileAnalyticsStore::new(&cfg.analytics_path));
    let fetcher = Arc::new(YtDlpFetcher::new(&cfg.ytdlp_bin, cfg.playlist_end));
    let jobs = FetchJobController::new(fetcher, aggregator.clone(), store.clone())
        .with_cache_ttl(cfg.video_cache_ttl);

    Ok(AppState {
        jobs,
        aggregator,
        store,
        channels: Arc::new(ChannelStore::new(&cfg.channels_path)),
        static_dir: cfg.static_dir.clone(),
    })
}

/// Router for `cfg` without the `/metrics` route (that needs the global recorder).
pub fn app(cfg: &AppConfig) -> anyhow::Result<Router> {
    Ok(create_router(build_state(cfg)?))
}
