// Manager wired to the in-memory agent fleet.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::fake_transport::{FakeTransport, FAKE_BASE_PATH};
use crate::agent::AgentClient;
use crate::config::AgentSettings;
use crate::liveness::LivenessMonitor;
use crate::manager::Manager;
use crate::registry::Registry;

pub const MAX_COUNTDOWN: i64 = 3;

pub fn fake_settings() -> AgentSettings {
    AgentSettings {
        scheme: "http".to_string(),
        base_path: FAKE_BASE_PATH.to_string(),
        timeout: None,
        run_retries: 1,
        checkpoint_url_prefix: "file:/checkpointfs".to_string(),
        checkpoint_volume: None,
    }
}

/// Builds a manager over a fresh registry and fake agents.
pub fn fake_manager(checkpoint_dir: Option<PathBuf>) -> (Arc<Manager>, Arc<FakeTransport>) {
    let registry = Arc::new(Registry::new(MAX_COUNTDOWN));
    let fake = Arc::new(FakeTransport::new());
    let agent = Arc::new(AgentClient::new(registry.clone(), fake.clone(), fake_settings()));
    let monitor = Arc::new(LivenessMonitor::new(
        registry.clone(),
        MAX_COUNTDOWN,
        Duration::from_secs(3),
    ));
    let manager = Arc::new(Manager::new(registry, agent, monitor, checkpoint_dir));
    (manager, fake)
}

/// Unique scratch directory under the system temp dir.
pub fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "cmmanager-{}-{}-{}",
        tag,
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
