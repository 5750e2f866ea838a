// Package seed loads the initial fleet and picks up what already exists.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

use crate::agent::artifact;
use crate::config::Seed;
use crate::error::ManagerError;
use crate::manager::Manager;

/// Counters of what a bootstrap picked up.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub workers: usize,
    pub services: usize,
    pub instances: usize,
    pub artifacts: usize,
}

/// Parses `<key> <value>` lines; comments, blanks and short lines are skipped.
pub fn parse_list(text: &str, source: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    for (n, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        match (fields.next(), fields.next()) {
            (Some(key), Some(value)) => entries.push((key.to_string(), value.to_string())),
            _ => warn!(
                component = "seed",
                event = "invalid_line",
                source,
                line = n + 1,
                "skipping line with fewer than two fields"
            ),
        }
    }
    entries
}

fn load_list(path: &Path) -> Result<Vec<(String, String)>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read seed list {:?}", path))?;
    Ok(parse_list(&text, &path.display().to_string()))
}

/// Registers the seeded workers and services, then optionally records the
/// instances agents already hold and the artifacts already on disk.
pub async fn bootstrap(
    manager: &Manager,
    seed: &Seed,
    mount_dir: Option<&Path>,
    url_prefix: &str,
) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    if let Some(path) = &seed.workers {
        for (id, addr) in load_list(path)? {
            match manager.register_worker(&id, &addr) {
                Ok(_) => report.workers += 1,
                Err(e) => warn!(component = "seed", event = "worker_skipped", worker = %id, error = %e, "worker not seeded"),
            }
        }
    }
    if let Some(path) = &seed.services {
        for (name, image) in load_list(path)? {
            match manager.register_service(&name, &image) {
                Ok(_) => report.services += 1,
                Err(e) => warn!(component = "seed", event = "service_skipped", service = %name, error = %e, "service not seeded"),
            }
        }
    }

    if seed.scan_on_start {
        report.instances = scan_instances(manager).await;
        if let Some(dir) = mount_dir {
            report.artifacts = scan_artifacts(manager, dir, url_prefix);
        }
    }

    info!(
        component = "seed",
        event = "finished",
        workers = report.workers,
        services = report.services,
        instances = report.instances,
        artifacts = report.artifacts,
        "bootstrap finished"
    );
    Ok(report)
}

/// Asks every agent about every service; unreachable agents are skipped.
async fn scan_instances(manager: &Manager) -> usize {
    let services = manager.services();
    let mut found = 0;
    for worker in manager.registry().workers() {
        for service in &services {
            match manager.agent().refresh_instance(&worker.id, &service.name).await {
                Ok(Some(_)) => found += 1,
                Ok(None) => {}
                Err(ManagerError::Transport { reason, .. }) => {
                    warn!(
                        component = "seed",
                        event = "worker_unreachable",
                        worker = %worker.id,
                        reason = %reason,
                        "agent unreachable, skipping scan"
                    );
                    break;
                }
                Err(e) => warn!(
                    component = "seed",
                    event = "scan_failed",
                    worker = %worker.id,
                    service = %service.name,
                    error = %e,
                    "instance scan failed"
                ),
            }
        }
    }
    found
}

fn scan_artifacts(manager: &Manager, mount_dir: &Path, url_prefix: &str) -> usize {
    let mut found = 0;
    for service in manager.services() {
        let artifacts = match artifact::scan_service_artifacts(mount_dir, url_prefix, &service.name) {
            Ok(artifacts) => artifacts,
            Err(e) => {
                warn!(
                    component = "seed",
                    event = "artifact_scan_failed",
                    service = %service.name,
                    error = %e,
                    "failed to scan checkpoint directory"
                );
                continue;
            }
        };
        for location in artifacts {
            if manager
                .registry()
                .append_checkpoint_artifact(&service.name, &location)
                .is_ok()
            {
                found += 1;
            }
        }
    }
    found
}
