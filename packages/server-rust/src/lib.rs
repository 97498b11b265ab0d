//! actiongate server: action registry, request pipeline, and the axum
//! surface that publishes action endpoints.

pub mod network;
pub mod service;
pub mod traits;

pub use network::{NetworkConfig, NetworkModule, RouteTable};
pub use service::{ActionProvider, ActionRegistry, ServerConfig};
pub use traits::{ActionModel, NoModel, RestAction};
