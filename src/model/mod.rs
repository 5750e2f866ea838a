// Package model provides the worker/service/instance state model and agent option payloads.

pub mod options;
pub mod service;
pub mod status;
pub mod worker;

#[cfg(test)]
mod status_test;

// Re-export main types
pub use options::{CheckpointOptions, Mount, RunOptions, StartOptions};
pub use service::Service;
pub use status::{InstanceStatus, Reconciled, WorkerStatus};
pub use worker::Worker;
