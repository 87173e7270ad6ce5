mod dispatch_handler;
mod error;
mod health_handler;
mod metrics_handler;
mod openapi;
mod router;
mod server;
mod state;
mod status_handler;

pub use router::build_router;
pub use server::run_http_server;
pub use state::AppState;
