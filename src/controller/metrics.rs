//! Prometheus scrape endpoint.

use axum::{http::header, response::IntoResponse, routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

use crate::http::Controller;

pub const METRICS_PATH: &str = "/metrics";

static EXPORTER: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the global recorder. Call once, before the runtime starts.
pub fn init_prometheus_exporter() -> anyhow::Result<()> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("install prometheus recorder: {}", e))?;
    EXPORTER
        .set(handle)
        .map_err(|_| anyhow::anyhow!("prometheus recorder installed twice"))
}

/// Current exposition text; empty while no exporter is installed.
pub fn render() -> String {
    EXPORTER.get().map(PrometheusHandle::render).unwrap_or_default()
}

/// PrometheusMetricsController serves `GET /metrics`.
#[derive(Default)]
pub struct PrometheusMetricsController;

impl PrometheusMetricsController {
    pub fn new() -> Self {
        Self
    }
}

impl Controller for PrometheusMetricsController {
    fn add_route(&self, router: Router) -> Router {
        router.route(
            METRICS_PATH,
            get(|| async { ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], render()).into_response() }),
        )
    }
}
