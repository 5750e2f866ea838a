//! Checkpoint artifact naming and the shared checkpoint directory layout.
//!
//! Artifacts live under `<prefix>/<service>/<service>_<worker>_<timestamp>`.
//! The timestamp is RFC 3339 UTC with second precision, so lexical order of
//! names is chronological order.

use chrono::{DateTime, SecondsFormat, Utc};
use std::io;
use std::path::{Path, PathBuf};

/// Artifact location for a checkpoint of `service` taken on `worker` at `ts`.
pub fn artifact_url(prefix: &str, service: &str, worker: &str, ts: DateTime<Utc>) -> String {
    format!(
        "{}/{}/{}",
        prefix.trim_end_matches('/'),
        service,
        artifact_name(service, worker, ts)
    )
}

/// File name part of an artifact location.
pub fn artifact_name(service: &str, worker: &str, ts: DateTime<Utc>) -> String {
    format!(
        "{}_{}_{}",
        service,
        worker,
        ts.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

/// Directory holding the artifacts of `service` under the manager's mount.
pub fn service_dir(mount_dir: &Path, service: &str) -> PathBuf {
    mount_dir.join(service)
}

/// Creates the artifact directory of `service`; an existing one is fine.
pub fn ensure_service_dir(mount_dir: &Path, service: &str) -> io::Result<PathBuf> {
    let dir = service_dir(mount_dir, service);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Lists the artifacts already present for `service`, oldest first.
///
/// Only entries named `<service>_*` count. A missing directory yields an
/// empty list.
pub fn scan_service_artifacts(mount_dir: &Path, prefix: &str, service: &str) -> io::Result<Vec<String>> {
    let dir = service_dir(mount_dir, service);
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let name_prefix = format!("{}_", service);
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(&name_prefix) {
            names.push(name);
        }
    }
    names.sort();

    let prefix = prefix.trim_end_matches('/');
    Ok(names
        .into_iter()
        .map(|name| format!("{}/{}/{}", prefix, service, name))
        .collect())
}
