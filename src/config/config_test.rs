use std::path::PathBuf;
use std::time::Duration;

use super::{Config, ConfigTrait};
use crate::model::Mount;

const FULL: &str = r#"
manager:
  env: prod
  logs:
    level: info
  api:
    name: cm_manager
    port: "9090"
  agent:
    scheme: http
    base_path: /cm_controller/v1/
    timeout: 30s
    run_retries: 2
  liveness:
    enabled: true
    max_countdown: 5
    interval: 1s
  checkpoint:
    mount_dir: /mnt/checkpointfs
    url_prefix: file:/checkpointfs/
    volume:
      source: chkfs
      target: /checkpointfs
      type: volume
  seed:
    workers: cfg/workers.list
    services: cfg/services.list
    scan_on_start: true
  metrics:
    enabled: false
"#;

#[test]
fn test_parse_full_config() {
    let cfg = Config::parse(FULL).unwrap();
    assert!(cfg.is_prod());
    assert_eq!(cfg.port(), "9090");
    assert_eq!(cfg.max_countdown(), 5);
    assert_eq!(cfg.liveness_interval(), Duration::from_secs(1));
    assert_eq!(cfg.checkpoint_mount_dir(), Some(PathBuf::from("/mnt/checkpointfs").as_path()));
    assert!(!cfg.metrics_enabled());

    let agent = cfg.agent_settings();
    assert_eq!(agent.base_path, "/cm_controller/v1");
    assert_eq!(agent.checkpoint_url_prefix, "file:/checkpointfs");
    assert_eq!(agent.timeout, Some(Duration::from_secs(30)));
    assert_eq!(agent.run_retries, 2);
    assert_eq!(
        agent.checkpoint_volume,
        Some(Mount {
            r#type: "volume".into(),
            source: "chkfs".into(),
            target: "/checkpointfs".into(),
            read_only: false,
        })
    );
}

#[test]
fn test_minimal_config_uses_defaults() {
    let cfg = Config::parse("manager:\n  env: dev\n").unwrap();
    assert!(!cfg.is_prod());
    assert_eq!(cfg.port(), "8080");
    assert_eq!(cfg.max_countdown(), 3);
    assert_eq!(cfg.liveness_interval(), Duration::from_secs(3));
    assert!(cfg.liveness_enabled());

    let agent = cfg.agent_settings();
    assert_eq!(agent.scheme, "http");
    assert_eq!(agent.base_path, "/cm_controller/v1");
    assert_eq!(agent.timeout, None);
    assert_eq!(agent.run_retries, 1);
    assert!(agent.checkpoint_volume.is_some());
}

#[test]
fn test_invalid_liveness_is_rejected() {
    let data = "manager:\n  env: dev\n  liveness:\n    enabled: true\n    max_countdown: 0\n";
    assert!(Config::parse(data).is_err());
}

#[test]
fn test_seed_override() {
    let mut cfg = Config::parse("manager:\n  env: dev\n").unwrap();
    cfg.override_seed(Some(PathBuf::from("w.list")), None);
    let seed = cfg.seed().unwrap();
    assert_eq!(seed.workers, Some(PathBuf::from("w.list")));
    assert_eq!(seed.services, None);
    assert!(seed.scan_on_start);
}
