//! Migration endpoint.

use axum::{
    body::Bytes,
    extract::{Path, Query},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::response::{ok_json, parse_body, API_PREFIX};
use crate::http::Controller;
use crate::manager::Manager;
use crate::migration::MigrationOptions;

#[derive(Deserialize)]
struct MigrateQuery {
    src: Option<String>,
    dest: Option<String>,
}

/// MigrateController runs a live migration and reports its duration.
pub struct MigrateController {
    manager: Arc<Manager>,
}

impl MigrateController {
    pub fn new(manager: Arc<Manager>) -> Self {
        Self { manager }
    }

    async fn migrate(manager: Arc<Manager>, service: String, query: MigrateQuery, body: Bytes) -> Response {
        let opts: MigrationOptions = match parse_body(&body) {
            Ok(opts) => opts,
            Err(resp) => return resp,
        };
        let src = query.src.unwrap_or_default();
        let dest = query.dest.unwrap_or_default();

        match manager.migrate(&service, &src, &dest, opts).await {
            Ok(elapsed) => ok_json(json!({
                "message": format!("{} migrated from {} to {}", service, src, dest),
                "elapsed": elapsed.as_secs_f64(),
            })),
            Err(e) => e.into_response(),
        }
    }
}

impl Controller for MigrateController {
    fn add_route(&self, router: Router) -> Router {
        let manager = self.manager.clone();
        router.route(
            &format!("{}/migrate/:service", API_PREFIX),
            post(
                move |Path(service): Path<String>, Query(query): Query<MigrateQuery>, body: Bytes| {
                    let manager = manager.clone();
                    async move { Self::migrate(manager, service, query, body).await }
                },
            ),
        )
    }
}
