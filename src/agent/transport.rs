// Package agent provides the transport seam between the client and the network.

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use hyper::Method;

/// One HTTP request towards an agent.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    pub method: Method,
    pub url: String,
    /// JSON body, if any.
    pub body: Option<Bytes>,
}

impl AgentRequest {
    pub fn get(url: String) -> Self {
        Self {
            method: Method::GET,
            url,
            body: None,
        }
    }

    pub fn post(url: String, body: Option<Bytes>) -> Self {
        Self {
            method: Method::POST,
            url,
            body,
        }
    }

    pub fn delete(url: String) -> Self {
        Self {
            method: Method::DELETE,
            url,
            body: None,
        }
    }
}

/// Raw agent reply.
#[derive(Debug, Clone)]
pub struct AgentResponse {
    pub status: u16,
    pub body: Bytes,
}

impl AgentResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Transport defines how a request reaches an agent.
///
/// An `Err` means no HTTP response was obtained; any status code, including
/// failures, comes back as `Ok`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: AgentRequest) -> Result<AgentResponse>;
}
