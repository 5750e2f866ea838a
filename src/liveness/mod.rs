//! Heartbeat-driven liveness detection for workers.

pub mod monitor;


pub use monitor::LivenessMonitor;
