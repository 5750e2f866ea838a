//! Hyper-based agent transport.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::{Request, Uri};
use std::time::Duration;
use tokio::time::timeout;

use super::transport::{AgentRequest, AgentResponse, Transport};
use crate::http::client::{create_client, HyperClient};

/// Sends agent requests over a pooled hyper client.
pub struct HyperTransport {
    client: HyperClient,
    timeout: Option<Duration>,
}

impl HyperTransport {
    /// Creates a transport; `timeout` bounds each round trip when set.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            client: create_client(),
            timeout,
        }
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn send(&self, request: AgentRequest) -> Result<AgentResponse> {
        let uri: Uri = request
            .url
            .parse()
            .with_context(|| format!("invalid agent URL: {}", request.url))?;

        let mut builder = Request::builder().method(request.method.clone()).uri(uri);

        let body: BoxBody<Bytes, hyper::Error> = match request.body {
            Some(bytes) => {
                builder = builder.header(hyper::header::CONTENT_TYPE, "application/json");
                Full::new(bytes)
                    .map_err(|never: std::convert::Infallible| match never {})
                    .boxed()
            }
            None => Empty::<Bytes>::new()
                .map_err(|never: std::convert::Infallible| match never {})
                .boxed(),
        };
        let req = builder.body(body)?;

        let pending = self.client.request(req);
        let response = match self.timeout {
            Some(limit) => match timeout(limit, pending).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(uri = %request.url, timeout = ?limit, "agent request timed out");
                    anyhow::bail!("request timed out after {:?}", limit);
                }
            },
            None => pending.await,
        };
        let response = match response {
            Ok(resp) => resp,
            Err(e) => {
                tracing::debug!(uri = %request.url, error = %e, error_debug = ?e, "hyper client request failed");
                return Err(anyhow::anyhow!("hyper client error: {}", e));
            }
        };

        let status = response.status().as_u16();
        let body = response
            .into_body()
            .collect()
            .await
            .context("failed to read response body")?
            .to_bytes();

        Ok(AgentResponse::new(status, body))
    }
}
