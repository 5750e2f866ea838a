//! Worker registry endpoints.

use axum::{
    extract::{Path, Query},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

use super::response::{message, ok_json, API_PREFIX};
use crate::http::Controller;
use crate::manager::Manager;

#[derive(Deserialize)]
struct RegisterQuery {
    id: Option<String>,
    addr: Option<String>,
}

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default)]
    probe: bool,
}

/// WorkersController registers, lists and removes workers.
pub struct WorkersController {
    manager: Arc<Manager>,
}

impl WorkersController {
    pub fn new(manager: Arc<Manager>) -> Self {
        Self { manager }
    }

    async fn register(manager: Arc<Manager>, query: RegisterQuery) -> Response {
        let id = query.id.unwrap_or_default();
        let addr = query.addr.unwrap_or_default();
        match manager.register_worker(&id, &addr) {
            Ok(worker) => ok_json(worker),
            Err(e) => e.into_response(),
        }
    }

    async fn list(manager: Arc<Manager>, query: ListQuery) -> Response {
        match manager.workers(query.probe).await {
            Ok(workers) => ok_json(workers),
            Err(e) => e.into_response(),
        }
    }

    async fn get(manager: Arc<Manager>, id: String) -> Response {
        match manager.worker(&id).await {
            Ok(worker) => ok_json(worker),
            Err(e) => e.into_response(),
        }
    }

    async fn delete(manager: Arc<Manager>, id: String) -> Response {
        match manager.deregister_worker(&id) {
            Ok(_) => message(format!("worker {} deregistered", id)),
            Err(e) => e.into_response(),
        }
    }
}

impl Controller for WorkersController {
    fn add_route(&self, router: Router) -> Router {
        let (m1, m2, m3, m4) = (
            self.manager.clone(),
            self.manager.clone(),
            self.manager.clone(),
            self.manager.clone(),
        );
        router
            .route(
                &format!("{}/worker", API_PREFIX),
                get(move |Query(query): Query<ListQuery>| {
                    let manager = m1.clone();
                    async move { Self::list(manager, query).await }
                })
                .post(move |Query(query): Query<RegisterQuery>| {
                    let manager = m2.clone();
                    async move { Self::register(manager, query).await }
                }),
            )
            .route(
                &format!("{}/worker/:id", API_PREFIX),
                get(move |Path(id): Path<String>| {
                    let manager = m3.clone();
                    async move { Self::get(manager, id).await }
                })
                .delete(move |Path(id): Path<String>| {
                    let manager = m4.clone();
                    async move { Self::delete(manager, id).await }
                }),
            )
    }
}
