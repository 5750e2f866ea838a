//! Client side of the worker agent RPC contract.

pub mod artifact;
pub mod client;
mod hyper_transport;
pub mod transport;


// Re-export main types
pub use client::AgentClient;
pub use hyper_transport::HyperTransport;
pub use transport::{AgentRequest, AgentResponse, Transport};
