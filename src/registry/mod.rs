//! In-memory registry of workers, services and per-worker instances.

pub mod registry;


pub use registry::{Registry, Tick};
