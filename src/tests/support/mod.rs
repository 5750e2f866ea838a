// Shared test support code for unit and integration tests.

pub mod agent_server;
pub mod common;
pub mod fake_transport;
pub mod fixture;
pub mod harness;

pub use common::*;
pub use harness::Harness;
