//! Heartbeat endpoint used by worker agents.

use axum::{
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use super::response::{message, API_PREFIX};
use crate::http::Controller;
use crate::manager::Manager;

#[derive(Deserialize)]
struct Heartbeat {
    worker_id: String,
}

/// HeartbeatController resets the liveness countdown of the sender.
pub struct HeartbeatController {
    manager: Arc<Manager>,
}

impl HeartbeatController {
    pub fn new(manager: Arc<Manager>) -> Self {
        Self { manager }
    }

    async fn heartbeat(manager: Arc<Manager>, beat: Heartbeat) -> Response {
        match manager.heartbeat(&beat.worker_id) {
            Ok(()) => message("ok"),
            Err(e) => e.into_response(),
        }
    }
}

impl Controller for HeartbeatController {
    fn add_route(&self, router: Router) -> Router {
        let manager = self.manager.clone();
        router.route(
            &format!("{}/heartbeat", API_PREFIX),
            post(move |Json(beat): Json<Heartbeat>| {
                let manager = manager.clone();
                async move { Self::heartbeat(manager, beat).await }
            }),
        )
    }
}
