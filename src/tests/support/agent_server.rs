// Fake worker agents served over real HTTP.
//
// Every request is handed to a shared `FakeTransport` under the listener's own
// address, so scripted failures and instance state work the same as in unit
// tests.

use axum::{
    body::Bytes,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use super::fake_transport::FakeTransport;
use crate::agent::{AgentRequest, Transport};

/// One fake agent listening on a random local port.
pub struct AgentServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl AgentServer {
    pub async fn start(fleet: Arc<FakeTransport>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let app = Router::new().fallback(move |method: Method, uri: Uri, body: Bytes| {
            let fleet = fleet.clone();
            async move { Self::handle(fleet, addr, method, uri, body).await }
        });

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, handle }
    }

    async fn handle(
        fleet: Arc<FakeTransport>,
        addr: SocketAddr,
        method: Method,
        uri: Uri,
        body: Bytes,
    ) -> Response {
        let request = AgentRequest {
            method,
            url: format!("http://{}{}", addr, uri.path()),
            body: if body.is_empty() { None } else { Some(body) },
        };
        match fleet.send(request).await {
            Ok(resp) => {
                let status = StatusCode::from_u16(resp.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, resp.body).into_response()
            }
            Err(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response(),
        }
    }

    /// `host:port` as registered with the manager.
    pub fn addr(&self) -> String {
        self.addr.to_string()
    }

    /// Simulates a crashed agent.
    pub fn close(&self) {
        self.handle.abort();
    }
}

impl Drop for AgentServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
