use crate::config::Seed;
use crate::model::InstanceStatus;
use crate::support::fixture::{fake_manager, temp_dir};

use super::{bootstrap, parse_list};

#[test]
fn test_parse_list_skips_noise() {
    let text = "\
# id addr
w1 10.0.0.1:8787

w2   10.0.0.2:8787   trailing
broken
";
    assert_eq!(
        parse_list(text, "workers.list"),
        vec![
            ("w1".to_string(), "10.0.0.1:8787".to_string()),
            ("w2".to_string(), "10.0.0.2:8787".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_bootstrap_registers_and_scans() {
    let dir = temp_dir("seed");
    let mount = dir.join("mnt");
    std::fs::create_dir_all(mount.join("ff").join("ff_w1_2024-03-09T14:05:07Z")).unwrap();
    std::fs::create_dir_all(mount.join("ff").join("ff_w1_2024-03-09T14:06:00Z")).unwrap();

    let workers = dir.join("workers.list");
    let services = dir.join("services.list");
    std::fs::write(&workers, "w1 10.0.0.1:8787\nw2 10.0.0.2:8787\nw1 10.0.0.9:8787\n").unwrap();
    std::fs::write(&services, "ff ffdev:c4\n").unwrap();

    let (manager, fake) = fake_manager(Some(mount.clone()));
    fake.set_instance("10.0.0.2:8787", "ff", "running");

    let seed = Seed {
        workers: Some(workers),
        services: Some(services),
        scan_on_start: true,
    };
    let report = bootstrap(&manager, &seed, Some(&mount), "file:/checkpointfs").await.unwrap();

    assert_eq!(report.workers, 2, "duplicate w1 is skipped");
    assert_eq!(report.services, 1);
    assert_eq!(report.instances, 1);
    assert_eq!(report.artifacts, 2);

    let registry = manager.registry();
    assert_eq!(registry.worker("w1").unwrap().addr, "10.0.0.1:8787");
    assert_eq!(registry.instance("w2", "ff").unwrap(), Some(InstanceStatus::Running));
    assert_eq!(registry.instance("w1", "ff").unwrap(), None);
    assert_eq!(
        registry.service("ff").unwrap().latest_checkpoint(),
        Some("file:/checkpointfs/ff/ff_w1_2024-03-09T14:06:00Z")
    );

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_bootstrap_tolerates_unreachable_agents() {
    let dir = temp_dir("seed-unreachable");
    let workers = dir.join("workers.list");
    let services = dir.join("services.list");
    std::fs::write(&workers, "w1 10.0.0.1:8787\n").unwrap();
    std::fs::write(&services, "ff ffdev:c4\ndb postgres:16\n").unwrap();

    let (manager, fake) = fake_manager(None);
    fake.set_unreachable("10.0.0.1:8787");

    let seed = Seed {
        workers: Some(workers),
        services: Some(services),
        scan_on_start: true,
    };
    let report = bootstrap(&manager, &seed, None, "file:/checkpointfs").await.unwrap();

    assert_eq!(report.workers, 1);
    assert_eq!(report.services, 2);
    assert_eq!(report.instances, 0);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_bootstrap_missing_list_fails() {
    let (manager, _) = fake_manager(None);
    let seed = Seed {
        workers: Some(temp_dir("seed-missing").join("nope.list")),
        services: None,
        scan_on_start: false,
    };
    assert!(bootstrap(&manager, &seed, None, "file:/checkpointfs").await.is_err());
}
