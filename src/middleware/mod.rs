// Request middlewares applied to the manager API router.

pub mod middleware;
pub mod trace_middleware;
