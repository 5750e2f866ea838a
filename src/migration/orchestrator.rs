//! Migration orchestrator.
//!
//! A migration primes the destination container while the source is being
//! checkpointed, restores the checkpoint at the destination, and optionally
//! stops the source. If the restore fails the source is resumed from the same
//! artifact. Phases never overlap except start/checkpoint, and both results
//! are observed before any branching.

use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::agent::AgentClient;
use crate::error::{Authority, ManagerError, MigrationPhase, Result};
use crate::metrics;
use crate::model::{CheckpointOptions, RunOptions, StartOptions, WorkerStatus};
use crate::registry::Registry;

/// Parameters of one migration.
#[derive(Debug, Clone, Default)]
pub struct MigrationRequest {
    pub service: String,
    pub source: String,
    pub destination: String,
    pub checkpoint: CheckpointOptions,
    pub run: RunOptions,
    pub start: StartOptions,
    pub stop_source: bool,
}

/// Option bundle accepted by the migrate endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MigrationOptions {
    pub copt: CheckpointOptions,
    pub ropt: RunOptions,
    pub sopt: StartOptions,
    pub stop: bool,
}

impl MigrationRequest {
    pub fn new(service: &str, source: &str, destination: &str, opts: MigrationOptions) -> Self {
        Self {
            service: service.to_string(),
            source: source.to_string(),
            destination: destination.to_string(),
            checkpoint: opts.copt,
            run: opts.ropt,
            start: opts.sopt,
            stop_source: opts.stop,
        }
    }
}

/// Drives agent calls for migrations.
pub struct Orchestrator {
    registry: Arc<Registry>,
    agent: Arc<AgentClient>,
}

impl Orchestrator {
    pub fn new(registry: Arc<Registry>, agent: Arc<AgentClient>) -> Self {
        Self { registry, agent }
    }

    /// Migrates `req.service` from `req.source` to `req.destination`.
    ///
    /// Returns the wall-clock duration of the whole migration.
    pub async fn migrate(&self, req: MigrationRequest) -> Result<Duration> {
        let started_at = Instant::now();
        match self.migrate_inner(req).await {
            Ok(()) => {
                let elapsed = started_at.elapsed();
                metrics::add_migration("ok");
                metrics::observe_migration_duration(elapsed);
                Ok(elapsed)
            }
            Err(e) => {
                metrics::add_migration(outcome_label(&e));
                Err(e)
            }
        }
    }

    async fn migrate_inner(&self, mut req: MigrationRequest) -> Result<()> {
        self.validate(&mut req)?;
        let MigrationRequest {
            service,
            source,
            destination,
            checkpoint,
            mut run,
            start,
            stop_source,
        } = req;
        let service = service.as_str();
        let (src, dest) = (source.as_str(), destination.as_str());

        info!(
            component = "migration",
            event = "started",
            service,
            src,
            dest,
            stop_source,
            "migration started"
        );

        // Reuse a destination container that is already provisioned.
        let needs_start = self.needs_start(dest, service, &start).await?;

        // Prime the destination and checkpoint the source together.
        let start_fut = async {
            if needs_start {
                self.agent.start(dest, &start).await
            } else {
                Ok(())
            }
        };
        let checkpoint_fut = self.agent.checkpoint(src, service, &checkpoint);
        let (started, checkpointed) = tokio::join!(start_fut, checkpoint_fut);

        // A failed start aborts; the checkpoint result is drained.
        if let Err(e) = started {
            let authoritative = match &checkpointed {
                Ok(artifact) if !checkpoint.leave_running => {
                    warn!(
                        component = "migration",
                        event = "source_checkpointed",
                        service,
                        src,
                        artifact = %artifact,
                        "start failed, source is checkpointed and not running; run it from the artifact to resume"
                    );
                    Authority::SourceCheckpointed
                }
                Ok(artifact) => {
                    warn!(
                        component = "migration",
                        event = "artifact_orphaned",
                        service,
                        artifact = %artifact,
                        "start failed, checkpoint artifact left unused"
                    );
                    Authority::Source
                }
                Err(ce) => {
                    warn!(
                        component = "migration",
                        event = "checkpoint_failed",
                        service,
                        error = %ce,
                        "checkpoint also failed"
                    );
                    Authority::Source
                }
            };
            return Err(self.failed(service, MigrationPhase::Start, authoritative, e));
        }

        let artifact = match checkpointed {
            Ok(artifact) => artifact,
            Err(e) => {
                return Err(self.failed(service, MigrationPhase::Checkpoint, Authority::Source, e));
            }
        };

        // Restore at the destination from the fresh artifact.
        run.image_url = artifact;
        if let Err(restore_err) = self.agent.run(dest, service, &run).await {
            // Resume the source from the same artifact.
            warn!(
                component = "migration",
                event = "rollback",
                service,
                src,
                dest,
                error = %restore_err,
                "restore at destination failed, resuming at source"
            );
            return Err(match self.agent.run(src, service, &run).await {
                Ok(()) => self.failed(service, MigrationPhase::Restore, Authority::Source, restore_err),
                Err(rollback_err) => {
                    error!(
                        component = "migration",
                        event = "rollback_failed",
                        service,
                        src,
                        dest,
                        restore_error = %restore_err,
                        rollback_error = %rollback_err,
                        "rollback failed, service may be down on both workers"
                    );
                    ManagerError::Rollback {
                        service: service.to_string(),
                        restore: Box::new(restore_err),
                        rollback: Box::new(rollback_err),
                    }
                }
            });
        }

        if stop_source {
            if let Err(e) = self.agent.stop(src, service).await {
                return Err(self.failed(service, MigrationPhase::StopSource, Authority::Both, e));
            }
        }

        info!(component = "migration", event = "finished", service, src, dest, "migration finished");
        Ok(())
    }

    /// Checks names and fills in the container name.
    fn validate(&self, req: &mut MigrationRequest) -> Result<()> {
        if req.source == req.destination {
            return Err(ManagerError::Precondition(format!(
                "source and destination are the same worker {}",
                req.source
            )));
        }
        self.registry.service(&req.service)?;
        self.registry.worker(&req.source)?;
        let destination = self.registry.worker(&req.destination)?;

        req.start.resolve_container_name(&req.service)?;

        if destination.status == WorkerStatus::Down {
            warn!(
                component = "migration",
                event = "destination_down",
                service = %req.service,
                dest = %req.destination,
                "destination worker is marked down"
            );
        }
        Ok(())
    }

    /// Decides whether the destination container has to be (re)created.
    async fn needs_start(&self, dest: &str, service: &str, opts: &StartOptions) -> Result<bool> {
        let status = match self.agent.refresh_instance(dest, service).await {
            Ok(status) => status,
            Err(ManagerError::Transport { .. }) => {
                warn!(
                    component = "migration",
                    event = "status_unavailable",
                    service,
                    dest,
                    "destination status unavailable, using registry state"
                );
                self.registry.instance(dest, service)?
            }
            Err(e) => return Err(e),
        };

        let primed = status.map(|s| s.is_primed()).unwrap_or(false)
            && self.registry.last_start_options(dest, service)?.as_ref() == Some(opts);
        if primed {
            info!(
                component = "migration",
                event = "start_skipped",
                service,
                dest,
                "destination already provisioned with identical start options"
            );
        }
        Ok(!primed)
    }

    fn failed(&self, service: &str, phase: MigrationPhase, authoritative: Authority, cause: ManagerError) -> ManagerError {
        warn!(
            component = "migration",
            event = "failed",
            service,
            phase = %phase,
            authoritative = %authoritative,
            error = %cause,
            "migration failed"
        );
        ManagerError::Migration {
            service: service.to_string(),
            phase,
            authoritative,
            cause: Box::new(cause),
        }
    }
}

fn outcome_label(err: &ManagerError) -> &'static str {
    match err {
        ManagerError::Migration { phase, .. } => match phase {
            MigrationPhase::Start => "start_failed",
            MigrationPhase::Checkpoint => "checkpoint_failed",
            MigrationPhase::Restore => "rolled_back",
            MigrationPhase::StopSource => "stop_source_failed",
        },
        ManagerError::Rollback { .. } => "rollback_failed",
        _ => "rejected",
    }
}
