// Common HTTP helpers for integration tests.

use serde_json::Value;
use std::time::Duration;

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

/// Status code and JSON body (`Value::Null` when the body is not JSON).
async fn into_parts(resp: reqwest::Response) -> (u16, Value) {
    let status = resp.status().as_u16();
    let body = resp.bytes().await.unwrap_or_default();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

pub async fn get(url: &str) -> (u16, Value) {
    into_parts(client().get(url).send().await.unwrap()).await
}

pub async fn post(url: &str, body: Option<Value>) -> (u16, Value) {
    let mut request = client().post(url);
    if let Some(body) = body {
        request = request.json(&body);
    }
    into_parts(request.send().await.unwrap()).await
}

pub async fn post_raw(url: &str, body: &'static str) -> (u16, Value) {
    let request = client()
        .post(url)
        .header("content-type", "application/json")
        .body(body);
    into_parts(request.send().await.unwrap()).await
}

pub async fn delete(url: &str) -> (u16, Value) {
    into_parts(client().delete(url).send().await.unwrap()).await
}

/// Asserts the status and returns the body.
pub fn expect_status(want: u16, got: (u16, Value)) -> Value {
    let (status, body) = got;
    if status != want {
        panic!("want status={} got={} body={}", want, status, body);
    }
    body
}
