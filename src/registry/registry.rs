//! Registry implementation.
//!
//! Every read and write goes through one mutex. No method performs I/O, so
//! the lock is never held across an agent round trip.

use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{ManagerError, Result};
use crate::model::{InstanceStatus, Reconciled, Service, StartOptions, Worker, WorkerStatus};

#[derive(Default)]
struct State {
    workers: HashMap<String, Worker>,
    services: HashMap<String, Service>,
}

impl State {
    fn worker_mut(&mut self, id: &str) -> Result<&mut Worker> {
        self.workers
            .get_mut(id)
            .ok_or_else(|| ManagerError::worker_not_found(id))
    }

    fn require_service(&self, name: &str) -> Result<()> {
        if self.services.contains_key(name) {
            Ok(())
        } else {
            Err(ManagerError::service_not_found(name))
        }
    }
}

/// Result of one liveness tick.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Tick {
    /// Workers whose status changed to down on this tick.
    pub went_down: Vec<String>,
}

/// Authoritative store of workers and services.
pub struct Registry {
    state: Mutex<State>,
    initial_countdown: i64,
}

impl Registry {
    /// Creates an empty registry; new workers start with `initial_countdown` ticks.
    pub fn new(initial_countdown: i64) -> Self {
        Self {
            state: Mutex::new(State::default()),
            initial_countdown,
        }
    }

    pub fn register_worker(&self, id: &str, addr: &str) -> Result<Worker> {
        let mut state = self.state.lock();
        if state.workers.contains_key(id) {
            return Err(ManagerError::Conflict {
                kind: "worker",
                id: id.to_string(),
            });
        }
        let worker = Worker::new(id, addr, self.initial_countdown);
        state.workers.insert(id.to_string(), worker.clone());
        debug!(component = "registry", worker = id, addr, "worker added");
        Ok(worker)
    }

    pub fn register_service(&self, name: &str, image: &str) -> Result<Service> {
        let mut state = self.state.lock();
        if state.services.contains_key(name) {
            return Err(ManagerError::Conflict {
                kind: "service",
                id: name.to_string(),
            });
        }
        let service = Service::new(name, image);
        state.services.insert(name.to_string(), service.clone());
        debug!(component = "registry", service = name, image, "service added");
        Ok(service)
    }

    /// Removes a worker together with its instance rows.
    pub fn deregister_worker(&self, id: &str) -> Result<Worker> {
        self.state
            .lock()
            .workers
            .remove(id)
            .ok_or_else(|| ManagerError::worker_not_found(id))
    }

    /// Removes a service and every instance row that refers to it.
    pub fn deregister_service(&self, name: &str) -> Result<Service> {
        let mut state = self.state.lock();
        let service = state
            .services
            .remove(name)
            .ok_or_else(|| ManagerError::service_not_found(name))?;
        for worker in state.workers.values_mut() {
            worker.instances.remove(name);
            worker.last_start.remove(name);
        }
        Ok(service)
    }

    pub fn worker(&self, id: &str) -> Result<Worker> {
        self.state
            .lock()
            .workers
            .get(id)
            .cloned()
            .ok_or_else(|| ManagerError::worker_not_found(id))
    }

    pub fn service(&self, name: &str) -> Result<Service> {
        self.state
            .lock()
            .services
            .get(name)
            .cloned()
            .ok_or_else(|| ManagerError::service_not_found(name))
    }

    /// Snapshot of all workers, sorted by id.
    pub fn workers(&self) -> Vec<Worker> {
        let mut workers: Vec<Worker> = self.state.lock().workers.values().cloned().collect();
        workers.sort_by(|a, b| a.id.cmp(&b.id));
        workers
    }

    /// Snapshot of all services, sorted by name.
    pub fn services(&self) -> Vec<Service> {
        let mut services: Vec<Service> = self.state.lock().services.values().cloned().collect();
        services.sort_by(|a, b| a.name.cmp(&b.name));
        services
    }

    pub fn has_service(&self, name: &str) -> bool {
        self.state.lock().services.contains_key(name)
    }

    /// Instance status of `service` on `worker`; `None` when not deployed there.
    pub fn instance(&self, worker_id: &str, service: &str) -> Result<Option<InstanceStatus>> {
        let state = self.state.lock();
        let worker = state
            .workers
            .get(worker_id)
            .ok_or_else(|| ManagerError::worker_not_found(worker_id))?;
        Ok(worker.instance(service))
    }

    /// Ids of the workers holding an instance of `service`, sorted.
    pub fn hosts_of(&self, service: &str) -> Vec<String> {
        let state = self.state.lock();
        let mut hosts: Vec<String> = state
            .workers
            .values()
            .filter(|w| w.instances.contains_key(service))
            .map(|w| w.id.clone())
            .collect();
        hosts.sort();
        hosts
    }

    pub fn upsert_instance(&self, worker_id: &str, service: &str, status: InstanceStatus) -> Result<()> {
        let mut state = self.state.lock();
        state.require_service(service)?;
        let worker = state.worker_mut(worker_id)?;
        let previous = worker.instances.insert(service.to_string(), status);
        if previous != Some(status) {
            debug!(
                component = "registry",
                worker = worker_id,
                service,
                status = %status,
                "instance updated"
            );
        }
        Ok(())
    }

    /// Removes the instance row; returns whether one existed.
    pub fn remove_instance(&self, worker_id: &str, service: &str) -> Result<bool> {
        let mut state = self.state.lock();
        let worker = state.worker_mut(worker_id)?;
        Ok(worker.instances.remove(service).is_some())
    }

    /// Applies an agent-reported status to the instance row.
    ///
    /// Returns the resulting row. Unknown statuses leave the row untouched.
    pub fn reconcile_instance(
        &self,
        worker_id: &str,
        service: &str,
        reported: &Reconciled,
    ) -> Result<Option<InstanceStatus>> {
        let mut state = self.state.lock();
        let service_known = state.services.contains_key(service);
        let worker = state.worker_mut(worker_id)?;
        match reported {
            Reconciled::Keep(status) if service_known => {
                worker.instances.insert(service.to_string(), *status);
            }
            Reconciled::Keep(_) => {
                return Err(ManagerError::service_not_found(service));
            }
            Reconciled::Drop => {
                worker.instances.remove(service);
            }
            Reconciled::Unknown(_) => {}
        }
        Ok(worker.instance(service))
    }

    pub fn record_last_start_options(&self, worker_id: &str, service: &str, opts: &StartOptions) -> Result<()> {
        let mut state = self.state.lock();
        state.require_service(service)?;
        let worker = state.worker_mut(worker_id)?;
        worker.last_start.insert(service.to_string(), opts.clone());
        Ok(())
    }

    pub fn last_start_options(&self, worker_id: &str, service: &str) -> Result<Option<StartOptions>> {
        let state = self.state.lock();
        let worker = state
            .workers
            .get(worker_id)
            .ok_or_else(|| ManagerError::worker_not_found(worker_id))?;
        Ok(worker.last_start.get(service).cloned())
    }

    /// Appends an artifact location; a location already recorded is not repeated.
    pub fn append_checkpoint_artifact(&self, service: &str, path: &str) -> Result<()> {
        let mut state = self.state.lock();
        let entry = state
            .services
            .get_mut(service)
            .ok_or_else(|| ManagerError::service_not_found(service))?;
        if !entry.checkpoints.iter().any(|p| p == path) {
            entry.checkpoints.push(path.to_string());
        }
        Ok(())
    }

    pub fn set_worker_status(&self, id: &str, status: WorkerStatus) -> Result<()> {
        self.state.lock().worker_mut(id)?.status = status;
        Ok(())
    }

    pub fn set_worker_countdown(&self, id: &str, countdown: i64) -> Result<()> {
        self.state.lock().worker_mut(id)?.countdown = countdown;
        Ok(())
    }

    /// Resets the countdown and marks the worker up in one critical section.
    pub fn heartbeat(&self, id: &str, countdown: i64) -> Result<WorkerStatus> {
        let mut state = self.state.lock();
        let worker = state.worker_mut(id)?;
        let previous = worker.status;
        worker.countdown = countdown;
        worker.status = WorkerStatus::Up;
        Ok(previous)
    }

    /// Decrements every countdown; workers reaching zero or below are down.
    pub fn tick(&self) -> Tick {
        let mut state = self.state.lock();
        let mut tick = Tick::default();
        for worker in state.workers.values_mut() {
            worker.countdown -= 1;
            if worker.countdown <= 0 && worker.status != WorkerStatus::Down {
                worker.status = WorkerStatus::Down;
                tick.went_down.push(worker.id.clone());
            }
        }
        tick.went_down.sort();
        tick
    }
}
