//! Worker entity.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::{InstanceStatus, StartOptions, WorkerStatus};

/// A node running an agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Worker {
    pub id: String,
    /// Agent address, `host:port`.
    #[serde(rename = "addr")]
    pub addr: String,
    pub status: WorkerStatus,
    /// Monitor ticks left before the worker is declared down.
    pub countdown: i64,
    /// Instances deployed on this worker, keyed by service name.
    #[serde(rename = "services")]
    pub instances: BTreeMap<String, InstanceStatus>,
    /// Start options last applied per service.
    #[serde(skip)]
    pub last_start: HashMap<String, StartOptions>,
}

impl Worker {
    pub fn new(id: impl Into<String>, addr: impl Into<String>, countdown: i64) -> Self {
        Self {
            id: id.into(),
            addr: addr.into(),
            status: WorkerStatus::New,
            countdown,
            instances: BTreeMap::new(),
            last_start: HashMap::new(),
        }
    }

    pub fn instance(&self, service: &str) -> Option<InstanceStatus> {
        self.instances.get(service).copied()
    }
}
