pub mod agent;
pub mod app;
pub mod config;
pub mod controller;
pub mod error;
pub mod http;
pub mod liveness;
pub mod manager;
pub mod metrics;
pub mod middleware;
pub mod migration;
pub mod model;
pub mod registry;
pub mod seed;
pub mod shutdown;

#[cfg(test)]
mod tests;

#[cfg(test)]
pub use tests::support;
