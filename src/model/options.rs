//! Option payloads sent to worker agents.
//!
//! Field names follow the agent wire contract, so these structs are
//! serialized as-is into request bodies.

use serde::{Deserialize, Serialize};

use crate::error::{ManagerError, Result};

/// Docker-style mount.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Mount {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub r#type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub target: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
}

/// Options for creating a service container on a worker.
///
/// Compared structurally to decide whether a destination container can be
/// reused during migration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartOptions {
    pub container_name: String,
    pub image: String,
    pub app_port: String,
    pub envs: Vec<String>,
    pub mounts: Vec<Mount>,
    pub caps: Vec<String>,
}

impl StartOptions {
    /// Binds the options to `service`: an empty container name becomes the
    /// service name, any other name must match it.
    pub fn resolve_container_name(&mut self, service: &str) -> Result<()> {
        if self.container_name.is_empty() {
            self.container_name = service.to_string();
            return Ok(());
        }
        if self.container_name != service {
            return Err(ManagerError::Precondition(format!(
                "container name {} does not match service {}",
                self.container_name, service
            )));
        }
        Ok(())
    }
}

/// Options for checkpointing a running service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointOptions {
    pub leave_running: bool,
    /// Filled in by the manager; caller-supplied values are overwritten.
    pub image_url: String,
    #[serde(rename = "passphrase_file")]
    pub passphrase: String,
    pub preserved_paths: String,
    pub num_shards: u32,
    pub cpu_budget: String,
    pub verbose: i32,
    pub envs: Vec<String>,
}

/// Options for running (restoring) a service on a worker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    pub app_args: String,
    /// Artifact to restore from; empty for a cold start.
    pub image_url: String,
    pub on_app_ready: String,
    pub passphrase_file: String,
    pub preserved_paths: String,
    pub no_restore: bool,
    pub allow_bad_image: bool,
    pub leave_stopped: bool,
    pub verbose: i32,
    pub envs: Vec<String>,
}
