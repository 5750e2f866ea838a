//! Request tracing middleware.
//

use axum::{extract::Request, Router};
use tower_http::trace::TraceLayer;
use tracing::Level;

use crate::middleware::middleware::Middleware;

/// TraceMiddleware opens a tracing span per request and logs responses.
pub struct TraceMiddleware;

impl TraceMiddleware {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TraceMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for TraceMiddleware {
    fn apply(&self, router: Router) -> Router {
        router.layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request| {
                    tracing::span!(
                        Level::DEBUG,
                        "request",
                        component = "api",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                })
                .on_response(tower_http::trace::DefaultOnResponse::new().level(Level::DEBUG)),
        )
    }
}
