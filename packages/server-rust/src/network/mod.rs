//! HTTP surface: route table, action dispatch, middleware, and shutdown control.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod module;
pub mod routes;
pub mod shutdown;

pub use config::*;
pub use handlers::AppState;
pub use module::NetworkModule;
pub use routes::{InMemoryResources, RequestTarget, RouteKey, RouteTable};
pub use shutdown::*;
