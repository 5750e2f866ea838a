// Router-wide layers for the manager API.

use axum::Router;

/// Middleware wraps the whole router in one layer.
pub trait Middleware: Send + Sync {
    fn apply(&self, router: Router) -> Router;
}
