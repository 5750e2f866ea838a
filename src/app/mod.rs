// Application wiring: builds the manager and serves its API.

pub mod app;
pub mod server;

pub use app::App;
