use axum::{routing::get, Router};
use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Call once per process.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;
        describe_all();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe_all() {
    describe_counter!("fetch_jobs_started_total", "Fetch jobs accepted by the controller.");
    describe_counter!("fetch_jobs_completed_total", "Fetch jobs that reached `done`.");
    describe_counter!("fetch_jobs_failed_total", "Fetch jobs that ended in `error`.");
    describe_counter!(
        "video_cache_hits_total",
        "Jobs served from the per-channel video cache."
    );
    describe_counter!(
        "analytics_computed_total",
        "Summaries computed and saved (job and synchronous paths)."
    );
}
