//! HTTP handlers and the shared state they extract.

pub mod action;
pub mod health;

pub use action::action_handler;
pub use health::{health_handler, liveness_handler, readiness_handler};

use std::sync::Arc;
use std::time::Instant;

use super::{NetworkConfig, RouteTable, ShutdownController};
use crate::service::ActionRegistry;
use crate::traits::ResourceResolver;

/// Shared application state passed to all axum handlers via `State` extraction.
///
/// Holds `Arc` references so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Published action endpoints.
    pub routes: Arc<RouteTable>,
    /// Maps request paths onto content resources.
    pub resources: Arc<dyn ResourceResolver>,
    /// Active action registrations.
    pub registry: Arc<ActionRegistry>,
    /// Graceful shutdown controller with health state and in-flight tracking.
    pub shutdown: Arc<ShutdownController>,
    pub config: Arc<NetworkConfig>,
    /// Server process start time, used for uptime calculation.
    pub start_time: Instant,
}
