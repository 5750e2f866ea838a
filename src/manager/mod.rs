//! Manager facade: the operations exposed over HTTP.

pub mod manager;


pub use manager::{Manager, WorkerReport};
