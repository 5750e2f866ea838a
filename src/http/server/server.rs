//! Manager API listener.

use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::{Config, ConfigTrait};
use crate::controller::controller::Controller;
use crate::middleware::middleware::Middleware;

const DEFAULT_NAME: &str = "cm_manager";

#[async_trait::async_trait]
pub trait Server: Send + Sync {
    /// Serves until the shutdown token fires.
    async fn listen_and_serve(&self) -> Result<()>;
}

/// Axum router bound to the configured API port.
pub struct HttpServer {
    shutdown_token: CancellationToken,
    name: String,
    addr: SocketAddr,
    router: Router,
}

impl HttpServer {
    pub fn new(
        shutdown_token: CancellationToken,
        config: Config,
        controllers: Vec<Box<dyn Controller>>,
        middlewares: Vec<Box<dyn Middleware>>,
    ) -> Result<Arc<Self>> {
        let name = config
            .api()
            .and_then(|api| api.name.clone())
            .unwrap_or_else(|| DEFAULT_NAME.to_string());
        let addr = bind_addr(config.port())?;

        let router = controllers
            .iter()
            .fold(Router::new(), |router, controller| controller.add_route(router));
        // The first middleware ends up outermost.
        let router = middlewares
            .iter()
            .rev()
            .fold(router, |router, middleware| middleware.apply(router));

        Ok(Arc::new(Self {
            shutdown_token,
            name,
            addr,
            router,
        }))
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    async fn serve(&self) -> Result<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("failed to bind manager API on {}", self.addr))?;
        info!(component = "server", event = "listening", name = %self.name, addr = %self.addr, "manager API listening");

        let token = self.shutdown_token.clone();
        let served = axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await;

        match served {
            Ok(()) => {
                info!(component = "server", event = "stopped", name = %self.name, "manager API stopped");
                Ok(())
            }
            Err(e) => {
                error!(component = "server", event = "serve_failed", name = %self.name, error = %e, "manager API failed");
                Err(e.into())
            }
        }
    }
}

/// Accepts `8080` or `:8080` and listens on every interface.
fn bind_addr(port: &str) -> Result<SocketAddr> {
    let port: u16 = port
        .trim_start_matches(':')
        .parse()
        .with_context(|| format!("invalid API port {:?}", port))?;
    Ok(SocketAddr::from(([0, 0, 0, 0], port)))
}

#[async_trait::async_trait]
impl Server for HttpServer {
    async fn listen_and_serve(&self) -> Result<()> {
        self.serve().await
    }
}
