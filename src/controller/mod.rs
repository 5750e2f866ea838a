// HTTP API controllers for the manager endpoints.

pub mod controller;
pub mod heartbeat;
pub mod instances;
pub mod metrics;
pub mod migrate;
pub mod response;
pub mod services;
pub mod workers;


// Re-export controller types for convenience
pub use heartbeat::HeartbeatController;
pub use instances::InstancesController;
pub use metrics::PrometheusMetricsController;
pub use migrate::MigrateController;
pub use services::ServicesController;
pub use workers::WorkersController;
