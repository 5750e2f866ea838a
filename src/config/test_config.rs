use super::{Agent, Api, Checkpoint, Liveness, Logs, Manager, ManagerBox, Metrics, Volume};
use std::path::PathBuf;
use std::time::Duration;

/// Creates a new test configuration.
///
/// The liveness loop is off so tests drive ticks by hand, and the checkpoint
/// mount points at `checkpoint_dir`.
pub fn new_test_config(port: u16, checkpoint_dir: PathBuf) -> Manager {
    Manager {
        manager: ManagerBox {
            env: super::TEST.to_string(),
            logs: Some(Logs {
                level: Some("debug".to_string()),
            }),
            api: Some(Api {
                name: Some("cm_manager_test".to_string()),
                port: Some(port.to_string()),
            }),
            agent: Some(Agent {
                scheme: Some("http".to_string()),
                base_path: Some("/cm_controller/v1".to_string()),
                timeout: Some(Duration::from_secs(5)),
                run_retries: Some(1),
            }),
            liveness: Some(Liveness {
                enabled: false,
                max_countdown: Some(3),
                interval: Some(Duration::from_millis(100)),
            }),
            checkpoint: Some(Checkpoint {
                mount_dir: Some(checkpoint_dir),
                url_prefix: Some("file:/checkpointfs".to_string()),
                volume: Some(Volume {
                    source: "chkfs".to_string(),
                    target: "/checkpointfs".to_string(),
                    kind: Some("volume".to_string()),
                }),
            }),
            seed: None,
            metrics: Some(Metrics { enabled: false }),
        },
    }
}
