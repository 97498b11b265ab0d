//! Network module with deferred startup lifecycle.
//!
//! `new()` wires shared state, `start()` binds the TCP listener and
//! `serve()` accepts connections. Actions may be registered at any point;
//! the fallback handler reads the route table on every request.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::{NetworkConfig, TlsConfig};
use super::handlers::{
    action_handler, health_handler, liveness_handler, readiness_handler, AppState,
};
use super::middleware::apply_http_layers;
use super::routes::RouteTable;
use super::shutdown::ShutdownController;
use crate::service::ActionRegistry;
use crate::traits::ResourceResolver;

/// Owns the HTTP server lifecycle around one action registry.
///
/// 1. `new()`: builds handler state and the shutdown controller
/// 2. `start()`: binds the listener to the configured address
/// 3. `serve()`: accepts requests until the shutdown future resolves, drains
///    in-flight actions, then shuts the registry down
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    state: AppState,
}

impl NetworkModule {
    #[must_use]
    pub fn new(
        config: NetworkConfig,
        registry: Arc<ActionRegistry>,
        routes: Arc<RouteTable>,
        resources: Arc<dyn ResourceResolver>,
    ) -> Self {
        let state = AppState {
            routes,
            resources,
            registry,
            shutdown: Arc::new(ShutdownController::new()),
            config: Arc::new(config.clone()),
            start_time: Instant::now(),
        };
        Self {
            config,
            listener: None,
            state,
        }
    }

    #[must_use]
    pub fn registry(&self) -> Arc<ActionRegistry> {
        Arc::clone(&self.state.registry)
    }

    /// Other modules use this to check health state or trigger shutdown.
    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.state.shutdown)
    }

    /// Routes:
    /// - `GET /health`: detailed health JSON
    /// - `GET /health/live`: liveness probe
    /// - `GET /health/ready`: readiness probe
    /// - anything else: action dispatch through the route table
    pub fn build_router(&self) -> Router {
        let router = Router::new()
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .fallback(action_handler);

        apply_http_layers(router, &self.config).with_state(self.state.clone())
    }

    /// Binds the TCP listener and returns the bound port, which differs
    /// from the configured one when port 0 is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!(host = %self.config.host, port, "TCP listener bound");

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves requests until `shutdown` resolves.
    ///
    /// When the signal fires the health state moves to Draining and new
    /// action requests get 503. Once the listener closes, in-flight actions
    /// get up to `drain_timeout` to finish and every registered action is
    /// unpublished.
    ///
    /// # Errors
    ///
    /// Returns an error if the server hits a fatal I/O error or the TLS
    /// certificates cannot be loaded.
    ///
    /// # Panics
    ///
    /// Panics if `start()` was not called before `serve()`.
    pub async fn serve(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let router = self.build_router();
        let listener = self
            .listener
            .expect("start() must be called before serve()");
        let state = self.state;
        let config = self.config;

        let controller = Arc::clone(&state.shutdown);
        let signal = async move {
            shutdown.await;
            controller.trigger_shutdown();
        };

        state.shutdown.set_ready();

        match config.tls {
            Some(ref tls) => serve_tls(listener, router, tls, signal).await?,
            None => serve_plain(listener, router, signal).await?,
        }

        drain_requests(&state, &config).await;
        Ok(())
    }
}

async fn serve_plain(
    listener: TcpListener,
    router: Router,
    signal: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    info!("Serving plain HTTP");

    axum::serve(listener, router)
        .with_graceful_shutdown(signal)
        .await?;
    Ok(())
}

/// Reuses the pre-bound listener by converting it to a `std::net::TcpListener`.
async fn serve_tls(
    listener: TcpListener,
    router: Router,
    tls: &TlsConfig,
    signal: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    use axum_server::tls_rustls::RustlsConfig;

    let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load TLS certificates: {e}"))?;

    let addr = listener.local_addr()?;
    let std_listener = listener.into_std()?;
    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();

    tokio::spawn(async move {
        signal.await;
        shutdown_handle.graceful_shutdown(None);
    });

    info!(%addr, "Serving TLS");

    axum_server::from_tcp_rustls(std_listener, rustls_config)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;
    Ok(())
}

async fn drain_requests(state: &AppState, config: &NetworkConfig) {
    // Covers servers that exit without the signal having fired.
    state.shutdown.trigger_shutdown();

    if state.shutdown.wait_for_drain(config.drain_timeout).await {
        info!("All in-flight actions completed");
    } else {
        warn!(
            in_flight = state.shutdown.in_flight_count(),
            "Drain timeout expired with in-flight actions remaining"
        );
    }

    state.registry.shutdown();
}
