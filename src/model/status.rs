//! Worker and instance status enumerations.
//!
//! Agents report instance state as free-form strings. Every such string goes
//! through [`InstanceStatus::reconcile`], which is the only place where an
//! unrecognised value is detected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a worker as seen by the liveness monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    /// Registered, no heartbeat received yet.
    New,
    Up,
    Down,
}

impl WorkerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkerStatus::New => "new",
            WorkerStatus::Up => "up",
            WorkerStatus::Down => "down",
        }
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of one service deployed on one worker.
///
/// Terminal agent states (`exited`, `stopped`) are never stored: the
/// reconciler drops the instance instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    /// Container exists, no restored process is running.
    Standby,
    Running,
    Paused,
    Checkpointed,
}

/// Outcome of mapping an agent-reported status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    /// The instance is alive in the given state.
    Keep(InstanceStatus),
    /// The instance reached a terminal state and holds nothing on the worker.
    Drop,
    /// The agent reported a value this manager does not understand.
    Unknown(String),
}

impl InstanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InstanceStatus::Standby => "standby",
            InstanceStatus::Running => "running",
            InstanceStatus::Paused => "paused",
            InstanceStatus::Checkpointed => "checkpointed",
        }
    }

    /// Maps an agent status string onto the closed status set.
    pub fn reconcile(reported: &str) -> Reconciled {
        match reported.trim().to_ascii_lowercase().as_str() {
            "standby" | "created" => Reconciled::Keep(InstanceStatus::Standby),
            "running" => Reconciled::Keep(InstanceStatus::Running),
            "paused" => Reconciled::Keep(InstanceStatus::Paused),
            "checkpointed" => Reconciled::Keep(InstanceStatus::Checkpointed),
            "exited" | "stopped" | "dead" => Reconciled::Drop,
            _ => Reconciled::Unknown(reported.to_string()),
        }
    }

    /// True when the container on the worker can be reused by a restore
    /// without being created again.
    pub fn is_primed(self) -> bool {
        matches!(self, InstanceStatus::Standby | InstanceStatus::Checkpointed)
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
