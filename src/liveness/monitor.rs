// Package liveness provides the countdown-based worker failure detector.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::metrics;
use crate::model::WorkerStatus;
use crate::registry::{Registry, Tick};

/// Declares workers down after `max_countdown` ticks without a heartbeat.
///
/// Heartbeats and ticks both go through the registry lock, so a reset can
/// never be lost to a concurrent decrement.
pub struct LivenessMonitor {
    registry: Arc<Registry>,
    max_countdown: i64,
    interval: Duration,
}

impl LivenessMonitor {
    pub fn new(registry: Arc<Registry>, max_countdown: i64, interval: Duration) -> Self {
        Self {
            registry,
            max_countdown,
            interval,
        }
    }

    pub fn max_countdown(&self) -> i64 {
        self.max_countdown
    }

    /// Resets the countdown of `worker_id` and marks it up.
    pub fn heartbeat(&self, worker_id: &str) -> Result<()> {
        let previous = self.registry.heartbeat(worker_id, self.max_countdown)?;
        if previous != WorkerStatus::Up {
            info!(
                component = "liveness",
                event = "worker_up",
                worker = worker_id,
                previous = %previous,
                "worker is up"
            );
        } else {
            debug!(component = "liveness", event = "heartbeat", worker = worker_id, "heartbeat received");
        }
        Ok(())
    }

    /// Runs one decrement round.
    pub fn tick(&self) -> Tick {
        let tick = self.registry.tick();
        for worker in &tick.went_down {
            warn!(
                component = "liveness",
                event = "worker_down",
                worker = %worker,
                "no heartbeat within countdown, worker is down"
            );
        }
        if !tick.went_down.is_empty() {
            metrics::add_workers_down(tick.went_down.len() as u64);
        }
        tick
    }

    /// Ticks every `interval` until `shutdown_token` is cancelled.
    pub async fn run(self: Arc<Self>, shutdown_token: CancellationToken) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        ticker.tick().await;

        info!(
            component = "liveness",
            event = "started",
            interval = ?self.interval,
            max_countdown = self.max_countdown,
            "liveness monitor started"
        );

        loop {
            tokio::select! {
                _ = shutdown_token.cancelled() => {
                    info!(component = "liveness", event = "stopped", "liveness monitor stopped");
                    return;
                }
                _ = ticker.tick() => {
                    self.tick();
                }
            }
        }
    }
}
