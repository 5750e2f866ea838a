// Main manager application implementation.

use anyhow::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::agent::{AgentClient, HyperTransport, Transport};
use crate::config::{Config, ConfigTrait};
use crate::liveness::LivenessMonitor;
use crate::manager::Manager;
use crate::registry::Registry;
use crate::seed;
use crate::shutdown::GracefulShutdown;

use super::server::HttpServer;

/// Encapsulates the whole manager process state.
#[derive(Clone)]
pub struct App {
    cfg: Config,
    shutdown_token: CancellationToken,
    manager: Arc<Manager>,
    server: Arc<HttpServer>,
}

impl App {
    /// Builds the manager over real agents and runs the bootstrap.
    pub async fn new(shutdown_token: CancellationToken, cfg: Config) -> Result<Self> {
        let transport: Arc<dyn Transport> = Arc::new(HyperTransport::new(cfg.agent_settings().timeout));
        Self::with_transport(shutdown_token, cfg, transport).await
    }

    /// Same as [`App::new`] with a caller-supplied transport.
    pub async fn with_transport(
        shutdown_token: CancellationToken,
        cfg: Config,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let registry = Arc::new(Registry::new(cfg.max_countdown()));
        let agent = Arc::new(AgentClient::new(registry.clone(), transport, cfg.agent_settings()));
        let monitor = Arc::new(LivenessMonitor::new(
            registry.clone(),
            cfg.max_countdown(),
            cfg.liveness_interval(),
        ));
        let manager = Arc::new(Manager::new(
            registry,
            agent,
            monitor,
            cfg.checkpoint_mount_dir().map(|p| p.to_path_buf()),
        ));

        if let Some(seed_cfg) = cfg.seed() {
            seed::bootstrap(
                &manager,
                seed_cfg,
                cfg.checkpoint_mount_dir(),
                &cfg.agent_settings().checkpoint_url_prefix,
            )
            .await?;
        }

        let server = Arc::new(HttpServer::new(shutdown_token.clone(), &cfg, manager.clone())?);

        Ok(Self {
            cfg,
            shutdown_token,
            manager,
            server,
        })
    }

    pub fn manager(&self) -> &Arc<Manager> {
        &self.manager
    }

    /// Spawns the liveness loop and the API server; both are tracked by `gsh`.
    pub async fn serve(&self, gsh: Arc<GracefulShutdown>) -> Result<()> {
        if self.cfg.liveness_enabled() {
            gsh.add(1);
            let monitor = self.manager.monitor().clone();
            let token = self.shutdown_token.clone();
            let gsh_clone = gsh.clone();
            tokio::task::spawn(async move {
                monitor.run(token).await;
                gsh_clone.done();
            });
        }

        gsh.add(1);
        let app = self.clone();
        let gsh_clone = gsh.clone();
        tokio::task::spawn(async move {
            if let Err(e) = app.server.listen_and_serve().await {
                error!(
                    component = "app",
                    scope = "server",
                    event = "serve_failed",
                    error = %e,
                    "server failed to serve"
                );
            }
            app.close();
            gsh_clone.done();
        });

        info!(
            component = "app",
            event = "started",
            port = self.cfg.port(),
            liveness = self.cfg.liveness_enabled(),
            "application lifecycle"
        );

        Ok(())
    }

    /// Checks whether the HTTP server is still alive.
    pub fn is_alive(&self) -> bool {
        self.server.is_alive()
    }

    /// Stops everything sharing the shutdown token.
    pub fn close(&self) {
        self.shutdown_token.cancel();
        info!(component = "app", event = "stopped", "application lifecycle");
    }
}
