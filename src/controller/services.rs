//! Service registry endpoints.

use axum::{
    extract::{Path, Query},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

use super::response::{ok_json, API_PREFIX};
use crate::http::Controller;
use crate::manager::Manager;

#[derive(Deserialize)]
struct RegisterQuery {
    name: Option<String>,
    image: Option<String>,
}

/// ServicesController registers, lists and deletes services.
pub struct ServicesController {
    manager: Arc<Manager>,
}

impl ServicesController {
    pub fn new(manager: Arc<Manager>) -> Self {
        Self { manager }
    }

    async fn register(manager: Arc<Manager>, query: RegisterQuery) -> Response {
        let name = query.name.unwrap_or_default();
        let image = query.image.unwrap_or_default();
        match manager.register_service(&name, &image) {
            Ok(service) => ok_json(service),
            Err(e) => e.into_response(),
        }
    }

    async fn get(manager: Arc<Manager>, name: String) -> Response {
        match manager.service(&name) {
            Ok(service) => ok_json(service),
            Err(e) => e.into_response(),
        }
    }

    /// Removes the service from every worker first.
    async fn delete(manager: Arc<Manager>, name: String) -> Response {
        match manager.delete_service(&name).await {
            Ok(service) => ok_json(service),
            Err(e) => e.into_response(),
        }
    }
}

impl Controller for ServicesController {
    fn add_route(&self, router: Router) -> Router {
        let (m1, m2, m3, m4) = (
            self.manager.clone(),
            self.manager.clone(),
            self.manager.clone(),
            self.manager.clone(),
        );
        router
            .route(
                &format!("{}/service", API_PREFIX),
                get(move || {
                    let manager = m1.clone();
                    async move { ok_json(manager.services()) }
                })
                .post(move |Query(query): Query<RegisterQuery>| {
                    let manager = m2.clone();
                    async move { Self::register(manager, query).await }
                }),
            )
            .route(
                &format!("{}/service/:name", API_PREFIX),
                get(move |Path(name): Path<String>| {
                    let manager = m3.clone();
                    async move { Self::get(manager, name).await }
                })
                .delete(move |Path(name): Path<String>| {
                    let manager = m4.clone();
                    async move { Self::delete(manager, name).await }
                }),
            )
    }
}
