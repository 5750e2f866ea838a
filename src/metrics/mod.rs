//! Prometheus metrics recorded by the manager.
//
//! Metrics go through the `metrics` facade; the exporter is installed in
//! `main` and rendered by `controller::metrics`.

use std::time::Duration;

use crate::error::AgentOp;

// Metric name constants
pub const AGENT_REQUESTS: &str = "cm_agent_requests_total";
pub const AGENT_RUN_RETRIES: &str = "cm_agent_run_retries_total";
pub const MIGRATIONS: &str = "cm_migrations_total";
pub const MIGRATION_DURATION: &str = "cm_migration_duration_seconds";
pub const WORKERS_DOWN: &str = "cm_workers_down_total";

pub const OUTCOME_OK: &str = "ok";
pub const OUTCOME_REMOTE_ERROR: &str = "remote_error";
pub const OUTCOME_TRANSPORT_ERROR: &str = "transport_error";

/// Counts one agent round trip by operation and outcome.
pub fn add_agent_request(op: AgentOp, outcome: &'static str) {
    metrics::counter!(AGENT_REQUESTS, "op" => op.as_str(), "outcome" => outcome).increment(1);
}

/// Counts an immediate retry of a failed run.
pub fn add_run_retry() {
    metrics::counter!(AGENT_RUN_RETRIES).increment(1);
}

/// Counts a finished migration; `outcome` is `ok` or the failed phase.
pub fn add_migration(outcome: &'static str) {
    metrics::counter!(MIGRATIONS, "outcome" => outcome).increment(1);
}

/// Records the wall-clock time of a successful migration.
pub fn observe_migration_duration(elapsed: Duration) {
    metrics::histogram!(MIGRATION_DURATION).record(elapsed.as_secs_f64());
}

/// Adds workers the liveness monitor declared down.
pub fn add_workers_down(value: u64) {
    metrics::counter!(WORKERS_DOWN).increment(value);
}
