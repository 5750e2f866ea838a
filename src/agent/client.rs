//! Agent client: one method per remote lifecycle action.
//!
//! Every call is a single request/response against the worker's agent. A 200
//! is success, anything else is a [`ManagerError::Remote`] carrying the status
//! and body. Successful calls update the registry; the registry lock is never
//! held while a request is in flight.

use bytes::Bytes;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::artifact::artifact_url;
use super::transport::{AgentRequest, AgentResponse, Transport};
use crate::config::AgentSettings;
use crate::error::{AgentOp, ManagerError, Result};
use crate::metrics;
use crate::model::{CheckpointOptions, InstanceStatus, Reconciled, RunOptions, StartOptions, Worker};
use crate::registry::Registry;

#[derive(Debug, Deserialize)]
struct StatusReply {
    status: String,
}

/// Client for the agent RPC contract.
pub struct AgentClient {
    registry: Arc<Registry>,
    transport: Arc<dyn Transport>,
    settings: AgentSettings,
}

impl AgentClient {
    pub fn new(registry: Arc<Registry>, transport: Arc<dyn Transport>, settings: AgentSettings) -> Self {
        Self {
            registry,
            transport,
            settings,
        }
    }

    /// Target URL for `op` on the agent at `addr`.
    pub fn url(&self, addr: &str, op: AgentOp, service: Option<&str>) -> String {
        let segment = match op {
            AgentOp::Status => "service",
            other => other.as_str(),
        };
        let mut url = format!("{}://{}{}/{}", self.settings.scheme, addr, self.settings.base_path, segment);
        if let Some(service) = service {
            url.push('/');
            url.push_str(&urlencoding::encode(service));
        }
        url
    }

    /// Creates the service container on `worker_id`.
    ///
    /// The service is `opts.container_name`. On success the instance is
    /// `standby` and `opts` become the last applied start options.
    pub async fn start(&self, worker_id: &str, opts: &StartOptions) -> Result<()> {
        let service = opts.container_name.as_str();
        if service.is_empty() {
            return Err(ManagerError::Precondition("container_name is required".to_string()));
        }
        let worker = self.registry.worker(worker_id)?;
        if !self.registry.has_service(service) {
            return Err(ManagerError::service_not_found(service));
        }

        match worker.instance(service) {
            Some(status @ (InstanceStatus::Running | InstanceStatus::Standby | InstanceStatus::Checkpointed)) => {
                return Err(ManagerError::Precondition(format!(
                    "{} is {} on worker {}, stop/remove first",
                    service, status, worker_id
                )));
            }
            Some(InstanceStatus::Paused) if worker.last_start.get(service) != Some(opts) => {
                return Err(ManagerError::Precondition(format!(
                    "{} is paused on worker {} with different start options, remove first",
                    service, worker_id
                )));
            }
            _ => {}
        }

        let mut wire = opts.clone();
        if let Some(volume) = &self.settings.checkpoint_volume {
            if !wire.mounts.contains(volume) {
                wire.mounts.push(volume.clone());
            }
        }

        let url = self.url(&worker.addr, AgentOp::Start, None);
        let body = encode(AgentOp::Start, &url, &wire)?;
        self.call(AgentOp::Start, &worker, AgentRequest::post(url, Some(body)))
            .await?;

        self.registry
            .upsert_instance(worker_id, service, InstanceStatus::Standby)?;
        self.registry
            .record_last_start_options(worker_id, service, opts)?;

        info!(
            component = "agent",
            event = "started",
            worker = worker_id,
            service,
            image = %opts.image,
            "service container started"
        );
        Ok(())
    }

    /// Runs (restores) `service` on `worker_id`.
    ///
    /// A 500 from the agent is retried immediately, up to the configured
    /// number of retries.
    pub async fn run(&self, worker_id: &str, service: &str, opts: &RunOptions) -> Result<()> {
        let worker = self.registry.worker(worker_id)?;
        if !self.registry.has_service(service) {
            return Err(ManagerError::service_not_found(service));
        }

        let url = self.url(&worker.addr, AgentOp::Run, Some(service));
        let body = encode(AgentOp::Run, &url, opts)?;

        let mut attempt = 0;
        loop {
            let request = AgentRequest::post(url.clone(), Some(body.clone()));
            match self.call(AgentOp::Run, &worker, request).await {
                Ok(_) => break,
                Err(e) if e.is_retryable_remote() && attempt < self.settings.run_retries => {
                    attempt += 1;
                    metrics::add_run_retry();
                    warn!(
                        component = "agent",
                        event = "run_retry",
                        worker = worker_id,
                        service,
                        attempt,
                        error = %e,
                        "run failed, retrying"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        self.registry
            .upsert_instance(worker_id, service, InstanceStatus::Running)?;

        info!(
            component = "agent",
            event = "running",
            worker = worker_id,
            service,
            image_url = %opts.image_url,
            "service running"
        );
        Ok(())
    }

    /// Checkpoints `service` on `worker_id`; returns the artifact location.
    pub async fn checkpoint(&self, worker_id: &str, service: &str, opts: &CheckpointOptions) -> Result<String> {
        let worker = self.registry.worker(worker_id)?;
        if !self.registry.has_service(service) {
            return Err(ManagerError::service_not_found(service));
        }

        let artifact = artifact_url(&self.settings.checkpoint_url_prefix, service, worker_id, Utc::now());
        let mut wire = opts.clone();
        wire.image_url = artifact.clone();

        let url = self.url(&worker.addr, AgentOp::Checkpoint, Some(service));
        let body = encode(AgentOp::Checkpoint, &url, &wire)?;
        self.call(AgentOp::Checkpoint, &worker, AgentRequest::post(url, Some(body)))
            .await?;

        self.registry.append_checkpoint_artifact(service, &artifact)?;
        let status = if opts.leave_running {
            InstanceStatus::Running
        } else {
            InstanceStatus::Checkpointed
        };
        self.registry.upsert_instance(worker_id, service, status)?;

        info!(
            component = "agent",
            event = "checkpointed",
            worker = worker_id,
            service,
            artifact = %artifact,
            leave_running = opts.leave_running,
            "service checkpointed"
        );
        Ok(artifact)
    }

    /// Stops `service` on `worker_id` and drops its instance row.
    pub async fn stop(&self, worker_id: &str, service: &str) -> Result<()> {
        let worker = self.registry.worker(worker_id)?;
        let url = self.url(&worker.addr, AgentOp::Stop, Some(service));
        self.call(AgentOp::Stop, &worker, AgentRequest::post(url, None))
            .await?;

        self.registry.remove_instance(worker_id, service)?;
        info!(component = "agent", event = "stopped", worker = worker_id, service, "service stopped");
        Ok(())
    }

    /// Removes `service` from `worker_id`.
    ///
    /// The service itself is deregistered once no worker holds it anymore.
    pub async fn remove(&self, worker_id: &str, service: &str) -> Result<()> {
        let worker = self.registry.worker(worker_id)?;
        let url = self.url(&worker.addr, AgentOp::Remove, Some(service));
        self.call(AgentOp::Remove, &worker, AgentRequest::delete(url))
            .await?;

        self.registry.remove_instance(worker_id, service)?;
        info!(component = "agent", event = "removed", worker = worker_id, service, "service removed");

        if self.registry.has_service(service) && self.registry.hosts_of(service).is_empty() {
            match self.registry.deregister_service(service) {
                Ok(_) => info!(
                    component = "agent",
                    event = "service_deregistered",
                    service,
                    "last deployment removed, service deregistered"
                ),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Status string the agent reports for `service`.
    pub async fn query_status(&self, worker_id: &str, service: &str) -> Result<String> {
        let worker = self.registry.worker(worker_id)?;
        let url = self.url(&worker.addr, AgentOp::Status, Some(service));
        let response = self
            .call(AgentOp::Status, &worker, AgentRequest::get(url.clone()))
            .await?;

        let reply: StatusReply = serde_json::from_slice(&response.body).map_err(|e| ManagerError::Transport {
            op: AgentOp::Status,
            url,
            reason: format!("decode status reply: {}", e),
        })?;
        Ok(reply.status)
    }

    /// Probes the agent; any failure counts as down.
    pub async fn query_up(&self, worker_id: &str) -> Result<bool> {
        let worker = self.registry.worker(worker_id)?;
        let url = self.url(&worker.addr, AgentOp::Up, None);
        match self.call(AgentOp::Up, &worker, AgentRequest::get(url)).await {
            Ok(_) => Ok(true),
            Err(e) => {
                debug!(component = "agent", event = "probe_failed", worker = worker_id, error = %e, "agent probe failed");
                Ok(false)
            }
        }
    }

    /// Reconciles one instance row with what the agent reports.
    ///
    /// Returns the resulting row. An agent that does not know the service
    /// drops the row; an unreachable agent leaves it and fails.
    pub async fn refresh_instance(&self, worker_id: &str, service: &str) -> Result<Option<InstanceStatus>> {
        match self.query_status(worker_id, service).await {
            Ok(reported) => {
                let reconciled = InstanceStatus::reconcile(&reported);
                if let Reconciled::Unknown(raw) = &reconciled {
                    warn!(
                        component = "agent",
                        event = "unknown_status",
                        worker = worker_id,
                        service,
                        status = %raw,
                        "agent reported unknown status, instance left unchanged"
                    );
                }
                self.registry
                    .reconcile_instance(worker_id, service, &reconciled)
            }
            Err(ManagerError::Remote { status, .. }) => {
                debug!(
                    component = "agent",
                    event = "instance_gone",
                    worker = worker_id,
                    service,
                    status,
                    "agent does not know the service"
                );
                self.registry.remove_instance(worker_id, service)?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Reconciles every instance row of `worker_id` and returns the worker.
    ///
    /// Rows of an unreachable agent are kept as they are.
    pub async fn refresh_worker(&self, worker_id: &str) -> Result<Worker> {
        let worker = self.registry.worker(worker_id)?;
        for service in worker.instances.keys() {
            if let Err(e) = self.refresh_instance(worker_id, service).await {
                if e.is_not_found() {
                    continue;
                }
                warn!(
                    component = "agent",
                    event = "refresh_failed",
                    worker = worker_id,
                    service = %service,
                    error = %e,
                    "instance refresh failed"
                );
                break;
            }
        }
        self.registry.worker(worker_id)
    }

    async fn call(&self, op: AgentOp, worker: &Worker, request: AgentRequest) -> Result<AgentResponse> {
        let url = request.url.clone();
        debug!(component = "agent", event = "request", op = %op, worker = %worker.id, url = %url, "agent request");

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                metrics::add_agent_request(op, metrics::OUTCOME_TRANSPORT_ERROR);
                return Err(ManagerError::Transport {
                    op,
                    url,
                    reason: format!("{:#}", e),
                });
            }
        };

        if !response.is_ok() {
            metrics::add_agent_request(op, metrics::OUTCOME_REMOTE_ERROR);
            return Err(ManagerError::Remote {
                op,
                worker: worker.id.clone(),
                status: response.status,
                body: response.body_text(),
            });
        }

        metrics::add_agent_request(op, metrics::OUTCOME_OK);
        Ok(response)
    }
}

fn encode<T: serde::Serialize>(op: AgentOp, url: &str, value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|e| ManagerError::Transport {
            op,
            url: url.to_string(),
            reason: format!("encode request body: {}", e),
        })
}
