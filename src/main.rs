//! Channel Insights — Binary Entrypoint
//! Boots the Axum HTTP server: channel list, background catalog fetch with
//! progress polling, and per-channel analytics.

use channel_insights::config::AppConfig;
use channel_insights::metrics::Metrics;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("channel_insights=info,tower_http=info,warn"));

    // The runtime may already have installed a subscriber; keep that one.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = AppConfig::from_env();
    tracing::info!(
        analytics = %cfg.analytics_path.display(),
        channels = %cfg.channels_path.display(),
        ytdlp = %cfg.ytdlp_bin,
        cache_ttl_secs = cfg.video_cache_ttl.as_secs(),
        "starting channel-insights"
    );

    let metrics = Metrics::init()?;
    let router = channel_insights::app(&cfg)?.merge(metrics.router());

    Ok(router.into())
}
