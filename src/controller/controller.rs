// Route registration interface shared by the API controllers.

use axum::Router;

/// Controller mounts its endpoints onto the manager router.
pub trait Controller: Send + Sync {
    fn add_route(&self, router: Router) -> Router;
}
