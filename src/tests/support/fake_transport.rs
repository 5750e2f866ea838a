// In-memory agent fleet for tests.
//
// Behaves like a set of well-behaved agents keyed by worker address: start
// creates a standby container, run makes it running, checkpoint marks it
// checkpointed, stop/remove drop it. Failures and unreachable workers are
// scripted per (address, operation).

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};

use crate::agent::{AgentRequest, AgentResponse, Transport};
use crate::error::AgentOp;

pub const FAKE_BASE_PATH: &str = "/cm_controller/v1";

/// One request seen by the fake.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub addr: String,
    pub op: String,
    pub service: Option<String>,
    pub body: Option<Value>,
}

struct Failure {
    status: u16,
    body: String,
    /// `None` fails forever.
    remaining: Option<usize>,
}

#[derive(Default)]
struct FakeState {
    instances: HashMap<(String, String), String>,
    failures: HashMap<(String, String), Failure>,
    unreachable: HashSet<String>,
    calls: Vec<RecordedCall>,
}

/// Scriptable in-memory `Transport`.
#[derive(Default)]
pub struct FakeTransport {
    state: Mutex<FakeState>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `op` at `addr` answer `status` for the next `times` calls (forever on `None`).
    pub fn fail(&self, addr: &str, op: AgentOp, status: u16, times: Option<usize>) {
        self.state.lock().failures.insert(
            (addr.to_string(), op.as_str().to_string()),
            Failure {
                status,
                body: format!("{} failed by script", op),
                remaining: times,
            },
        );
    }

    /// Every request to `addr` fails before reaching an agent.
    pub fn set_unreachable(&self, addr: &str) {
        self.state.lock().unreachable.insert(addr.to_string());
    }

    /// Sets the status the agent at `addr` reports for `service`.
    pub fn set_instance(&self, addr: &str, service: &str, status: &str) {
        self.state
            .lock()
            .instances
            .insert((addr.to_string(), service.to_string()), status.to_string());
    }

    /// Agent-side status of `service` at `addr`.
    pub fn instance(&self, addr: &str, service: &str) -> Option<String> {
        self.state
            .lock()
            .instances
            .get(&(addr.to_string(), service.to_string()))
            .cloned()
    }

    /// Number of `op` requests sent to `addr`.
    pub fn calls(&self, addr: &str, op: AgentOp) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.addr == addr && c.op == op.as_str())
            .count()
    }

    /// Body of the latest `op` request sent to `addr`.
    pub fn last_body(&self, addr: &str, op: AgentOp) -> Option<Value> {
        self.state
            .lock()
            .calls
            .iter()
            .rev()
            .find(|c| c.addr == addr && c.op == op.as_str())
            .and_then(|c| c.body.clone())
    }

    /// All requests in the order they were sent.
    pub fn history(&self) -> Vec<RecordedCall> {
        self.state.lock().calls.clone()
    }
}

/// Splits `http://<addr><base>/<segment>[/<service>]`.
fn parse_url(url: &str) -> Result<(String, String, Option<String>)> {
    let rest = url
        .strip_prefix("http://")
        .ok_or_else(|| anyhow!("unexpected scheme in {}", url))?;
    let (addr, path) = rest
        .split_once('/')
        .ok_or_else(|| anyhow!("no path in {}", url))?;
    let path = format!("/{}", path);
    let path = path
        .strip_prefix(FAKE_BASE_PATH)
        .ok_or_else(|| anyhow!("unexpected base path in {}", url))?;
    let mut parts = path.trim_start_matches('/').splitn(2, '/');
    let segment = parts.next().unwrap_or_default();
    let op = match segment {
        "service" => "status",
        other => other,
    };
    let service = parts
        .next()
        .map(|s| urlencoding::decode(s).map(|d| d.into_owned()))
        .transpose()?;
    Ok((addr.to_string(), op.to_string(), service))
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: AgentRequest) -> Result<AgentResponse> {
        let (addr, op, service) = parse_url(&request.url)?;
        let body: Option<Value> = request
            .body
            .as_ref()
            .and_then(|b| serde_json::from_slice(b).ok());

        let mut state = self.state.lock();
        state.calls.push(RecordedCall {
            addr: addr.clone(),
            op: op.clone(),
            service: service.clone(),
            body: body.clone(),
        });

        if state.unreachable.contains(&addr) {
            bail!("connection refused by {}", addr);
        }

        if let Some(failure) = state.failures.get_mut(&(addr.clone(), op.clone())) {
            let fire = match failure.remaining.as_mut() {
                None => true,
                Some(0) => false,
                Some(n) => {
                    *n -= 1;
                    true
                }
            };
            if fire {
                return Ok(AgentResponse::new(failure.status, failure.body.clone()));
            }
        }

        let ok = || AgentResponse::new(200, "ok");
        let name = service.clone().unwrap_or_default();
        let response = match op.as_str() {
            "up" => ok(),
            "status" => match state.instances.get(&(addr.clone(), name)) {
                Some(status) => AgentResponse::new(200, json!({ "status": status }).to_string()),
                None => AgentResponse::new(404, "no such service"),
            },
            "start" => {
                let container = body
                    .as_ref()
                    .and_then(|b| b.get("container_name"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                state.instances.insert((addr, container), "standby".to_string());
                ok()
            }
            "run" => {
                state.instances.insert((addr, name), "running".to_string());
                ok()
            }
            "checkpoint" => {
                let leave_running = body
                    .as_ref()
                    .and_then(|b| b.get("leave_running"))
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                let status = if leave_running { "running" } else { "checkpointed" };
                state.instances.insert((addr, name), status.to_string());
                ok()
            }
            "stop" | "remove" => {
                state.instances.remove(&(addr, name));
                ok()
            }
            other => AgentResponse::new(404, format!("unknown operation {}", other)),
        };
        Ok(response)
    }
}
