//! Error types for the manager core.

use std::fmt;
use thiserror::Error;

/// Remote agent operation, used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentOp {
    Up,
    Status,
    Start,
    Run,
    Checkpoint,
    Stop,
    Remove,
}

impl AgentOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentOp::Up => "up",
            AgentOp::Status => "status",
            AgentOp::Start => "start",
            AgentOp::Run => "run",
            AgentOp::Checkpoint => "checkpoint",
            AgentOp::Stop => "stop",
            AgentOp::Remove => "remove",
        }
    }
}

impl fmt::Display for AgentOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Migration step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationPhase {
    Start,
    Checkpoint,
    Restore,
    StopSource,
}

impl fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MigrationPhase::Start => "start at destination",
            MigrationPhase::Checkpoint => "checkpoint at source",
            MigrationPhase::Restore => "run at destination",
            MigrationPhase::StopSource => "stop at source",
        })
    }
}

/// Side that holds the serving instance after a failed migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    Source,
    /// The source holds a fresh checkpoint but is no longer running.
    SourceCheckpointed,
    /// The service runs on both workers.
    Both,
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Authority::Source => "source",
            Authority::SourceCheckpointed => "source (checkpointed, not running)",
            Authority::Both => "source and destination",
        })
    }
}

/// Manager errors.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// Unknown worker, service or instance.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Duplicate registration.
    #[error("{kind} already exists: {id}")]
    Conflict { kind: &'static str, id: String },

    /// Agent answered with a non-success status.
    #[error("{op} failed at worker {worker} with response code {status}: {body}")]
    Remote {
        op: AgentOp,
        worker: String,
        status: u16,
        body: String,
    },

    /// Request could not be sent or its response could not be read.
    #[error("{op} request to {url} failed: {reason}")]
    Transport {
        op: AgentOp,
        url: String,
        reason: String,
    },

    /// Operation is not allowed in the current state.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// A migration step failed; `authoritative` tells where the service lives now.
    #[error("migration of {service} failed at {phase}, {authoritative} is authoritative: {cause}")]
    Migration {
        service: String,
        phase: MigrationPhase,
        authoritative: Authority,
        #[source]
        cause: Box<ManagerError>,
    },

    /// Restore failed at the destination and resuming at the source failed too.
    #[error("rollback of {service} failed, service may be down on both workers (restore: {restore}; rollback: {rollback})")]
    Rollback {
        service: String,
        restore: Box<ManagerError>,
        rollback: Box<ManagerError>,
    },
}

impl ManagerError {
    pub fn worker_not_found(id: &str) -> Self {
        ManagerError::NotFound {
            kind: "worker",
            id: id.to_string(),
        }
    }

    pub fn service_not_found(name: &str) -> Self {
        ManagerError::NotFound {
            kind: "service",
            id: name.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ManagerError::NotFound { .. })
    }

    /// Agent-side failures worth one immediate retry.
    pub fn is_retryable_remote(&self) -> bool {
        matches!(self, ManagerError::Remote { status: 500, .. })
    }

    /// Only a failed rollback needs a human.
    pub fn requires_operator(&self) -> bool {
        matches!(self, ManagerError::Rollback { .. })
    }

    /// Returns the phase error carried by a migration failure, or `self`.
    pub fn cause(&self) -> &ManagerError {
        match self {
            ManagerError::Migration { cause, .. } => cause.as_ref(),
            other => other,
        }
    }
}

/// Result type using ManagerError.
pub type Result<T> = std::result::Result<T, ManagerError>;
