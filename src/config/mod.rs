// Configuration loading and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::Mount;

pub const PROD: &str = "prod";
#[allow(dead_code)]
pub const DEV: &str = "dev";
#[allow(dead_code)]
pub const TEST: &str = "test";

const DEFAULT_PORT: &str = "8080";
const DEFAULT_BASE_PATH: &str = "/cm_controller/v1";
const DEFAULT_MAX_COUNTDOWN: i64 = 3;
const DEFAULT_LIVENESS_INTERVAL: Duration = Duration::from_secs(3);
const DEFAULT_RUN_RETRIES: u32 = 1;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Manager {
    #[serde(rename = "manager")]
    pub manager: ManagerBox,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ManagerBox {
    pub env: String,
    pub logs: Option<Logs>,
    pub api: Option<Api>,
    pub agent: Option<Agent>,
    pub liveness: Option<Liveness>,
    pub checkpoint: Option<Checkpoint>,
    pub seed: Option<Seed>,
    pub metrics: Option<Metrics>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Logs {
    pub level: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Api {
    pub name: Option<String>,
    pub port: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Agent {
    pub scheme: Option<String>,
    #[serde(rename = "base_path")]
    pub base_path: Option<String>,
    /// No timeout unless configured; the transport default applies.
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
    #[serde(rename = "run_retries")]
    pub run_retries: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Liveness {
    pub enabled: bool,
    #[serde(rename = "max_countdown")]
    pub max_countdown: Option<i64>,
    #[serde(default, with = "humantime_serde")]
    pub interval: Option<Duration>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Checkpoint {
    /// Manager-side mount point of the shared checkpoint filesystem.
    #[serde(rename = "mount_dir")]
    pub mount_dir: Option<PathBuf>,
    /// Prefix of artifact locations as seen by the agents.
    #[serde(rename = "url_prefix")]
    pub url_prefix: Option<String>,
    /// Volume injected into every started container.
    pub volume: Option<Volume>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Volume {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Seed {
    pub workers: Option<PathBuf>,
    pub services: Option<PathBuf>,
    #[serde(rename = "scan_on_start", default)]
    pub scan_on_start: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Metrics {
    pub enabled: bool,
}

/// Resolved agent client settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSettings {
    pub scheme: String,
    pub base_path: String,
    pub timeout: Option<Duration>,
    pub run_retries: u32,
    pub checkpoint_url_prefix: String,
    pub checkpoint_volume: Option<Mount>,
}

// Config trait
pub trait ConfigTrait {
    fn logs(&self) -> Option<&Logs>;
    fn is_prod(&self) -> bool;
    #[allow(dead_code)]
    fn is_test(&self) -> bool;
    fn api(&self) -> Option<&Api>;
    fn port(&self) -> &str;
    fn agent_settings(&self) -> AgentSettings;
    fn liveness_enabled(&self) -> bool;
    fn max_countdown(&self) -> i64;
    fn liveness_interval(&self) -> Duration;
    fn checkpoint_mount_dir(&self) -> Option<&Path>;
    fn seed(&self) -> Option<&Seed>;
    fn metrics_enabled(&self) -> bool;
}

// Config type alias for convenience
pub type Config = Manager;

impl ConfigTrait for Config {
    fn logs(&self) -> Option<&Logs> {
        self.manager.logs.as_ref()
    }

    fn is_prod(&self) -> bool {
        self.manager.env == PROD
    }

    fn is_test(&self) -> bool {
        self.manager.env == TEST
    }

    fn api(&self) -> Option<&Api> {
        self.manager.api.as_ref()
    }

    fn port(&self) -> &str {
        self.api()
            .and_then(|api| api.port.as_deref())
            .unwrap_or(DEFAULT_PORT)
    }

    fn agent_settings(&self) -> AgentSettings {
        let agent = self.manager.agent.as_ref();
        let checkpoint = self.manager.checkpoint.as_ref();

        let checkpoint_volume = match checkpoint {
            Some(cp) => cp.volume.as_ref().map(|v| Mount {
                r#type: v.kind.clone().unwrap_or_else(|| "volume".to_string()),
                source: v.source.clone(),
                target: v.target.clone(),
                read_only: false,
            }),
            None => Some(Mount {
                r#type: "volume".to_string(),
                source: "chkfs".to_string(),
                target: "/checkpointfs".to_string(),
                read_only: false,
            }),
        };

        AgentSettings {
            scheme: agent
                .and_then(|a| a.scheme.clone())
                .unwrap_or_else(|| "http".to_string()),
            base_path: agent
                .and_then(|a| a.base_path.clone())
                .unwrap_or_else(|| DEFAULT_BASE_PATH.to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout: agent.and_then(|a| a.timeout),
            run_retries: agent
                .and_then(|a| a.run_retries)
                .unwrap_or(DEFAULT_RUN_RETRIES),
            checkpoint_url_prefix: checkpoint
                .and_then(|cp| cp.url_prefix.clone())
                .unwrap_or_else(|| "file:/checkpointfs".to_string())
                .trim_end_matches('/')
                .to_string(),
            checkpoint_volume,
        }
    }

    fn liveness_enabled(&self) -> bool {
        self.manager.liveness.as_ref().map(|l| l.enabled).unwrap_or(true)
    }

    fn max_countdown(&self) -> i64 {
        self.manager
            .liveness
            .as_ref()
            .and_then(|l| l.max_countdown)
            .unwrap_or(DEFAULT_MAX_COUNTDOWN)
    }

    fn liveness_interval(&self) -> Duration {
        self.manager
            .liveness
            .as_ref()
            .and_then(|l| l.interval)
            .unwrap_or(DEFAULT_LIVENESS_INTERVAL)
    }

    fn checkpoint_mount_dir(&self) -> Option<&Path> {
        self.manager
            .checkpoint
            .as_ref()
            .and_then(|cp| cp.mount_dir.as_deref())
    }

    fn seed(&self) -> Option<&Seed> {
        self.manager.seed.as_ref()
    }

    fn metrics_enabled(&self) -> bool {
        self.manager.metrics.as_ref().map(|m| m.enabled).unwrap_or(true)
    }
}

impl Config {
    /// Loads configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Resolve absolute path
        let abs_path = path
            .canonicalize()
            .with_context(|| format!("failed to resolve absolute config filepath: {:?}", path))?;

        let data = std::fs::read_to_string(&abs_path)
            .with_context(|| format!("read config yaml file {:?}", abs_path))?;

        let cfg = Self::parse(&data).with_context(|| format!("unmarshal yaml from {:?}", abs_path))?;
        Ok(cfg)
    }

    /// Parses and validates configuration from YAML text.
    pub fn parse(data: &str) -> Result<Self> {
        let cfg: Manager = serde_yaml::from_str(data)?;

        if cfg.max_countdown() <= 0 {
            anyhow::bail!("liveness.max_countdown must be positive");
        }
        if cfg.liveness_interval().is_zero() {
            anyhow::bail!("liveness.interval must be non-zero");
        }
        let settings = cfg.agent_settings();
        if settings.scheme != "http" {
            anyhow::bail!("unsupported agent scheme {:?}", settings.scheme);
        }
        if !settings.base_path.starts_with('/') {
            anyhow::bail!("agent.base_path must start with '/'");
        }

        Ok(cfg)
    }

    /// Overrides the seed list paths given on the command line.
    pub fn override_seed(&mut self, workers: Option<PathBuf>, services: Option<PathBuf>) {
        if workers.is_none() && services.is_none() {
            return;
        }
        let seed = self.manager.seed.get_or_insert(Seed {
            workers: None,
            services: None,
            scan_on_start: true,
        });
        if workers.is_some() {
            seed.workers = workers;
        }
        if services.is_some() {
            seed.services = services;
        }
    }
}

#[cfg(test)]
mod config_test;

// Test config is always available for integration tests
mod test_config;
#[allow(dead_code)]
pub use test_config::new_test_config;
