// Package manager ties the registry, agent client, orchestrator and liveness
// monitor together behind one API.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::agent::{artifact, AgentClient};
use crate::error::{ManagerError, Result};
use crate::liveness::LivenessMonitor;
use crate::migration::{MigrationOptions, MigrationRequest, Orchestrator};
use crate::model::{CheckpointOptions, RunOptions, Service, StartOptions, Worker};
use crate::registry::Registry;

/// Worker listing entry, optionally with a fresh probe result.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerReport {
    #[serde(flatten)]
    pub worker: Worker,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reachable: Option<bool>,
}

/// Control-plane operations over workers and services.
pub struct Manager {
    registry: Arc<Registry>,
    agent: Arc<AgentClient>,
    orchestrator: Orchestrator,
    monitor: Arc<LivenessMonitor>,
    checkpoint_dir: Option<PathBuf>,
}

impl Manager {
    pub fn new(
        registry: Arc<Registry>,
        agent: Arc<AgentClient>,
        monitor: Arc<LivenessMonitor>,
        checkpoint_dir: Option<PathBuf>,
    ) -> Self {
        let orchestrator = Orchestrator::new(registry.clone(), agent.clone());
        Self {
            registry,
            agent,
            orchestrator,
            monitor,
            checkpoint_dir,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn agent(&self) -> &Arc<AgentClient> {
        &self.agent
    }

    pub fn monitor(&self) -> &Arc<LivenessMonitor> {
        &self.monitor
    }

    pub fn register_worker(&self, id: &str, addr: &str) -> Result<Worker> {
        require("worker id", id)?;
        require("worker address", addr)?;
        let worker = self.registry.register_worker(id, addr)?;
        info!(component = "manager", event = "worker_registered", worker = id, addr, "worker registered");
        Ok(worker)
    }

    /// Registers a service and creates its checkpoint directory.
    pub fn register_service(&self, name: &str, image: &str) -> Result<Service> {
        require("service name", name)?;
        require("service image", image)?;
        let service = self.registry.register_service(name, image)?;

        if let Some(dir) = &self.checkpoint_dir {
            if let Err(e) = artifact::ensure_service_dir(dir, name) {
                warn!(
                    component = "manager",
                    event = "checkpoint_dir_failed",
                    service = name,
                    dir = ?dir,
                    error = %e,
                    "failed to create checkpoint directory"
                );
            }
        }

        info!(component = "manager", event = "service_registered", service = name, image, "service registered");
        Ok(service)
    }

    pub fn deregister_worker(&self, id: &str) -> Result<Worker> {
        let worker = self.registry.deregister_worker(id)?;
        info!(component = "manager", event = "worker_deregistered", worker = id, "worker deregistered");
        Ok(worker)
    }

    /// Removes the service from every worker hosting it, then deregisters it.
    pub async fn delete_service(&self, name: &str) -> Result<Service> {
        let service = self.registry.service(name)?;
        for host in self.registry.hosts_of(name) {
            self.agent.remove(&host, name).await?;
        }
        match self.registry.deregister_service(name) {
            Ok(_) => {}
            // Removing the last deployment already deregistered it.
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
        info!(component = "manager", event = "service_deleted", service = name, "service deleted");
        Ok(service)
    }

    /// All workers; with `probe` each agent is asked whether it is up.
    pub async fn workers(&self, probe: bool) -> Result<Vec<WorkerReport>> {
        let mut reports = Vec::new();
        for worker in self.registry.workers() {
            let reachable = if probe {
                Some(self.agent.query_up(&worker.id).await?)
            } else {
                None
            };
            reports.push(WorkerReport { worker, reachable });
        }
        Ok(reports)
    }

    /// One worker after reconciling its instances with the agent.
    pub async fn worker(&self, id: &str) -> Result<Worker> {
        self.agent.refresh_worker(id).await
    }

    pub fn services(&self) -> Vec<Service> {
        self.registry.services()
    }

    pub fn service(&self, name: &str) -> Result<Service> {
        self.registry.service(name)
    }

    pub async fn start(&self, worker: &str, service: &str, mut opts: StartOptions) -> Result<()> {
        opts.resolve_container_name(service)?;
        self.agent.start(worker, &opts).await
    }

    pub async fn run(&self, worker: &str, service: &str, opts: RunOptions) -> Result<()> {
        self.agent.run(worker, service, &opts).await
    }

    /// Returns the artifact location.
    pub async fn checkpoint(&self, worker: &str, service: &str, opts: CheckpointOptions) -> Result<String> {
        self.agent.checkpoint(worker, service, &opts).await
    }

    pub async fn stop(&self, worker: &str, service: &str) -> Result<()> {
        self.agent.stop(worker, service).await
    }

    pub async fn remove(&self, worker: &str, service: &str) -> Result<()> {
        self.agent.remove(worker, service).await
    }

    pub async fn migrate(&self, service: &str, src: &str, dest: &str, opts: MigrationOptions) -> Result<Duration> {
        self.orchestrator
            .migrate(MigrationRequest::new(service, src, dest, opts))
            .await
    }

    pub fn heartbeat(&self, worker_id: &str) -> Result<()> {
        self.monitor.heartbeat(worker_id)
    }
}

fn require(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ManagerError::Precondition(format!("{} is required", what)));
    }
    Ok(())
}
