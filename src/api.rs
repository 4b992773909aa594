// src/api.rs
//! HTTP surface: channel list, fetch trigger, progress polling, analytics.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{debug, warn};

use crate::analytics::Aggregator;
use crate::channels::ChannelStore;
use crate::error::{AppError, Result};
use crate::job::{FetchJobController, ProgressState, StartOutcome};
use crate::models::{AnalyticsSummary, Channel, Video};
use crate::store::AnalyticsStore;

#[derive(Clone)]
pub struct AppState {
    pub jobs: FetchJobController,
    pub aggregator: Arc<Aggregator>,
    pub store: Arc<dyn AnalyticsStore>,
    pub channels: Arc<ChannelStore>,
    pub static_dir: Option<PathBuf>,
}

pub fn create_router(state: AppState) -> Router {
    let static_dir = state.static_dir.clone();

    let router = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route(
            "/api/channels",
            get(list_channels).post(add_channel).delete(remove_channel),
        )
        .route("/api/videos", post(trigger_fetch))
        .route("/api/progress", get(progress))
        .route("/api/videos/latest", get(latest_videos))
        .route("/api/videos/analytics", post(compute_analytics))
        .route("/api/analytics/{*channel_url}", get(saved_analytics))
        .layer(CorsLayer::very_permissive())
        .with_state(state);

    match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    }
}

#[derive(Deserialize)]
struct UrlReq {
    url: String,
}

impl UrlReq {
    fn url(&self) -> Result<&str> {
        let u = self.url.trim();
        if u.is_empty() {
            return Err(AppError::InvalidInput("url is required".into()));
        }
        Ok(u)
    }
}

async fn list_channels(State(state): State<AppState>) -> Result<Json<Vec<Channel>>> {
    Ok(Json(state.channels.list().await?))
}

async fn add_channel(
    State(state): State<AppState>,
    Json(body): Json<UrlReq>,
) -> Result<Json<Vec<Channel>>> {
    Ok(Json(state.channels.add(body.url()?).await?))
}

async fn remove_channel(
    State(state): State<AppState>,
    Json(body): Json<UrlReq>,
) -> Result<Json<Vec<Channel>>> {
    Ok(Json(state.channels.remove(body.url()?).await?))
}

#[derive(Serialize)]
struct TriggerResp {
    status: &'static str,
}

async fn trigger_fetch(
    State(state): State<AppState>,
    Json(body): Json<UrlReq>,
) -> Result<(StatusCode, Json<TriggerResp>)> {
    let status = match state.jobs.start(body.url()?) {
        StartOutcome::Started => "started",
        StartOutcome::AlreadyRunning => "already_running",
    };
    Ok((StatusCode::ACCEPTED, Json(TriggerResp { status })))
}

async fn progress(State(state): State<AppState>) -> Json<ProgressState> {
    Json(state.jobs.get_progress())
}

async fn latest_videos(State(state): State<AppState>) -> Json<Vec<Video>> {
    Json(state.jobs.get_last_videos())
}

#[derive(Deserialize)]
struct AnalyticsReq {
    #[serde(default)]
    videos: Vec<Video>,
    #[serde(default)]
    channel_url: Option<String>,
}

async fn compute_analytics(
    State(state): State<AppState>,
    Json(body): Json<AnalyticsReq>,
) -> Result<Json<AnalyticsSummary>> {
    let summary = state.aggregator.aggregate(&body.videos)?;

    if let Some(url) = body.channel_url.as_deref().filter(|u| !u.trim().is_empty()) {
        state.store.save(url, &summary).await.inspect_err(|e| {
            warn!(channel = url, error = %e, "saving analytics failed");
        })?;
        counter!("analytics_computed_total").increment(1);
    }
    Ok(Json(summary))
}

async fn saved_analytics(
    State(state): State<AppState>,
    Path(channel_url): Path<String>,
) -> Result<Json<AnalyticsSummary>> {
    match state.store.load(&channel_url).await {
        Ok(summary) => Ok(Json(summary)),
        Err(e @ AppError::NotFound(_)) => {
            debug!(channel = %channel_url, "no saved analytics");
            Err(e)
        }
        Err(e) => {
            warn!(channel = %channel_url, error = %e, "loading analytics failed");
            Err(e)
        }
    }
}
