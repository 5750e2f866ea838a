// HTTP module: agent client and manager API server.

pub mod client;
pub mod server;

// Re-export server types
pub use server::{HttpServer, Server};

// Common controller interface
pub use crate::controller::controller::Controller;
pub use crate::middleware::middleware::Middleware;
