// HTTP server for the manager API.

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::controller;
use crate::http::{Controller, Middleware, Server};
use crate::manager::Manager;
use crate::middleware::trace_middleware::TraceMiddleware;

/// Manager API server with liveness tracking.
pub struct HttpServer {
    server: Arc<dyn Server>,
    is_server_alive: Arc<AtomicBool>,
}

impl HttpServer {
    pub fn new(ctx: CancellationToken, cfg: &Config, manager: Arc<Manager>) -> Result<Self> {
        let server: Arc<dyn Server> = crate::http::HttpServer::new(
            ctx,
            cfg.clone(),
            Self::controllers(manager),
            Self::middlewares(),
        )?;

        Ok(Self {
            server,
            is_server_alive: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Returns true while the server is listening.
    pub fn is_alive(&self) -> bool {
        self.is_server_alive.load(Ordering::Relaxed)
    }

    /// Serves until the shutdown token is cancelled.
    pub async fn listen_and_serve(&self) -> Result<()> {
        self.is_server_alive.store(true, Ordering::Relaxed);
        let result = self.server.listen_and_serve().await;
        self.is_server_alive.store(false, Ordering::Relaxed);
        result
    }

    fn controllers(manager: Arc<Manager>) -> Vec<Box<dyn Controller>> {
        vec![
            // Worker registry
            Box::new(controller::WorkersController::new(manager.clone())),
            // Service registry
            Box::new(controller::ServicesController::new(manager.clone())),
            // start/run/checkpoint/stop/remove per instance
            Box::new(controller::InstancesController::new(manager.clone())),
            Box::new(controller::MigrateController::new(manager.clone())),
            // Agent heartbeats
            Box::new(controller::HeartbeatController::new(manager)),
            Box::new(controller::PrometheusMetricsController::new()),
        ]
    }

    fn middlewares() -> Vec<Box<dyn Middleware>> {
        vec![Box::new(TraceMiddleware::new())]
    }
}
