//! Live migration of a service between two workers.

pub mod orchestrator;


pub use orchestrator::{MigrationOptions, MigrationRequest, Orchestrator};
