// The gateway module is the request surface: it maps paths to service
// operations and service outcomes to response statuses.

#[path = "routes.rs"]
pub mod routes;

#[path = "handlers.rs"]
pub mod handlers;

pub use handlers::{Gateway, Request, Response};
