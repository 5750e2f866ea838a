// Integration test harness: a real manager process over fake agents.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::agent_server::AgentServer;
use super::fake_transport::FakeTransport;
use super::fixture::temp_dir;
use crate::app::App;
use crate::config;
use crate::shutdown::GracefulShutdown;

/// Manager API under test plus the agents it talks to.
pub struct Harness {
    pub base: String,
    pub app: App,
    pub fleet: Arc<FakeTransport>,
    pub agents: Vec<AgentServer>,
    pub checkpoint_dir: PathBuf,
    shutdown_token: CancellationToken,
    gsh: Arc<GracefulShutdown>,
}

impl Harness {
    /// Starts `agents` fake agents and a manager on a free port.
    pub async fn start(tag: &str, agents: usize) -> Self {
        let fleet = Arc::new(FakeTransport::new());
        let mut servers = Vec::with_capacity(agents);
        for _ in 0..agents {
            servers.push(AgentServer::start(fleet.clone()).await);
        }

        let port = free_port().await;
        let checkpoint_dir = temp_dir(tag);
        let cfg = config::new_test_config(port, checkpoint_dir.clone());

        let shutdown_token = CancellationToken::new();
        let gsh = Arc::new(GracefulShutdown::new(shutdown_token.clone(), Duration::from_secs(5)));
        let app = App::new(shutdown_token.clone(), cfg).await.unwrap();
        app.serve(gsh.clone()).await.unwrap();

        let base = format!("http://127.0.0.1:{}/cm_manager/v1.0", port);
        wait_ready(&format!("{}/worker", base)).await;
        println!("[e2e] manager at {}", base);

        Self {
            base,
            app,
            fleet,
            agents: servers,
            checkpoint_dir,
            shutdown_token,
            gsh,
        }
    }

    pub fn agent_addr(&self, i: usize) -> String {
        self.agents[i].addr()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Stops the manager and waits for its tasks.
    pub async fn stop(self) {
        self.shutdown_token.cancel();
        let _ = self.gsh.await_shutdown().await;
        assert!(!self.app.is_alive());
        let _ = std::fs::remove_dir_all(&self.checkpoint_dir);
    }
}

async fn free_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_ready(url: &str) {
    let client = reqwest::Client::new();
    for _ in 0..100 {
        if client.get(url).send().await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("manager did not come up at {}", url);
}
