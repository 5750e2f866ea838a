//! Per-instance lifecycle endpoints: start, run, checkpoint, stop, remove.

use axum::{
    body::Bytes,
    extract::Path,
    response::{IntoResponse, Response},
    routing::{delete, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;

use super::response::{message, ok_json, parse_body, API_PREFIX};
use crate::http::Controller;
use crate::manager::Manager;
use crate::model::{CheckpointOptions, RunOptions, StartOptions};

/// InstancesController forwards lifecycle commands to the worker agents.
pub struct InstancesController {
    manager: Arc<Manager>,
}

impl InstancesController {
    pub fn new(manager: Arc<Manager>) -> Self {
        Self { manager }
    }

    async fn start(manager: Arc<Manager>, worker: String, service: String, body: Bytes) -> Response {
        let opts: StartOptions = match parse_body(&body) {
            Ok(opts) => opts,
            Err(resp) => return resp,
        };
        match manager.start(&worker, &service, opts).await {
            Ok(()) => message(format!("{} started on {}", service, worker)),
            Err(e) => e.into_response(),
        }
    }

    async fn run(manager: Arc<Manager>, worker: String, service: String, body: Bytes) -> Response {
        let opts: RunOptions = match parse_body(&body) {
            Ok(opts) => opts,
            Err(resp) => return resp,
        };
        match manager.run(&worker, &service, opts).await {
            Ok(()) => message(format!("{} running on {}", service, worker)),
            Err(e) => e.into_response(),
        }
    }

    async fn checkpoint(manager: Arc<Manager>, worker: String, service: String, body: Bytes) -> Response {
        let opts: CheckpointOptions = match parse_body(&body) {
            Ok(opts) => opts,
            Err(resp) => return resp,
        };
        match manager.checkpoint(&worker, &service, opts).await {
            Ok(image_url) => ok_json(json!({ "image_url": image_url })),
            Err(e) => e.into_response(),
        }
    }

    async fn stop(manager: Arc<Manager>, worker: String, service: String) -> Response {
        match manager.stop(&worker, &service).await {
            Ok(()) => message(format!("{} stopped on {}", service, worker)),
            Err(e) => e.into_response(),
        }
    }

    async fn remove(manager: Arc<Manager>, worker: String, service: String) -> Response {
        match manager.remove(&worker, &service).await {
            Ok(()) => message(format!("{} removed from {}", service, worker)),
            Err(e) => e.into_response(),
        }
    }
}

impl Controller for InstancesController {
    fn add_route(&self, router: Router) -> Router {
        let (m1, m2, m3, m4, m5) = (
            self.manager.clone(),
            self.manager.clone(),
            self.manager.clone(),
            self.manager.clone(),
            self.manager.clone(),
        );
        router
            .route(
                &format!("{}/start/:worker/:service", API_PREFIX),
                post(move |Path((worker, service)): Path<(String, String)>, body: Bytes| {
                    let manager = m1.clone();
                    async move { Self::start(manager, worker, service, body).await }
                }),
            )
            .route(
                &format!("{}/run/:worker/:service", API_PREFIX),
                post(move |Path((worker, service)): Path<(String, String)>, body: Bytes| {
                    let manager = m2.clone();
                    async move { Self::run(manager, worker, service, body).await }
                }),
            )
            .route(
                &format!("{}/checkpoint/:worker/:service", API_PREFIX),
                post(move |Path((worker, service)): Path<(String, String)>, body: Bytes| {
                    let manager = m3.clone();
                    async move { Self::checkpoint(manager, worker, service, body).await }
                }),
            )
            .route(
                &format!("{}/stop/:worker/:service", API_PREFIX),
                post(move |Path((worker, service)): Path<(String, String)>| {
                    let manager = m4.clone();
                    async move { Self::stop(manager, worker, service).await }
                }),
            )
            .route(
                &format!("{}/remove/:worker/:service", API_PREFIX),
                delete(move |Path((worker, service)): Path<(String, String)>| {
                    let manager = m5.clone();
                    async move { Self::remove(manager, worker, service).await }
                }),
            )
    }
}
