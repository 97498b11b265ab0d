//! actiongate server binary.
//!
//! Wires the route table, action registry and pipeline collaborators, then
//! serves the built-in actions until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use actiongate_server::network::{InMemoryResources, NetworkConfig, NetworkModule, RouteTable, TlsConfig};
use actiongate_server::service::{
    build_auth_provider, ActionProvider, ActionRegistry, AuthConfig, CheckAuthenticationAction,
    DeclarativeValidator, PipelineDeps, RequestParameterBinder, ResponseMapper,
    RoutingMetadataResolver, ServerConfig, DEFAULT_ACTION_SUFFIX, FRAMEWORK_MODULE,
};
use actiongate_server::traits::{EndpointPublisher, ResourceResolver};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "actiongate", about = "Serves registered REST actions over HTTP")]
struct Args {
    #[arg(long, env = "ACTIONGATE_HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(long, env = "ACTIONGATE_PORT", default_value_t = 8080)]
    port: u16,

    /// PEM certificate chain; TLS is enabled when both cert and key are set.
    #[arg(long, env = "ACTIONGATE_TLS_CERT", requires = "tls_key")]
    tls_cert: Option<PathBuf>,

    #[arg(long, env = "ACTIONGATE_TLS_KEY", requires = "tls_cert")]
    tls_key: Option<PathBuf>,

    #[arg(long, env = "ACTIONGATE_CORS_ORIGINS", value_delimiter = ',', default_value = "*")]
    cors_origins: Vec<String>,

    /// Request timeout in seconds.
    #[arg(long, env = "ACTIONGATE_REQUEST_TIMEOUT", default_value_t = 30)]
    request_timeout: u64,

    #[arg(long, env = "ACTIONGATE_MAX_BODY_BYTES", default_value_t = 2 * 1024 * 1024)]
    max_body_bytes: usize,

    /// Module id for the built-in actions.
    #[arg(long, env = "ACTIONGATE_MODULE_ID", default_value = FRAMEWORK_MODULE)]
    module_id: String,

    #[arg(long, env = "ACTIONGATE_ACTION_SUFFIX", default_value = DEFAULT_ACTION_SUFFIX)]
    action_suffix: String,

    /// Header carrying the caller id set by an authenticating proxy.
    #[arg(long, env = "ACTIONGATE_REMOTE_USER_HEADER")]
    remote_user_header: Option<String>,

    /// HS256 secret for bearer tokens.
    #[arg(long, env = "ACTIONGATE_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    #[arg(long, env = "ACTIONGATE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

impl Args {
    fn network_config(&self) -> NetworkConfig {
        let tls = match (&self.tls_cert, &self.tls_key) {
            (Some(cert_path), Some(key_path)) => Some(TlsConfig {
                cert_path: cert_path.clone(),
                key_path: key_path.clone(),
            }),
            _ => None,
        };
        NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            tls,
            cors_origins: self.cors_origins.clone(),
            request_timeout: Duration::from_secs(self.request_timeout),
            max_body_bytes: self.max_body_bytes,
            ..NetworkConfig::default()
        }
    }

    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            module_id: self.module_id.clone(),
            action_suffix: self.action_suffix.clone(),
            auth: AuthConfig {
                remote_user_header: self.remote_user_header.clone(),
                jwt_secret: self.jwt_secret.clone(),
            },
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format);

    let server_config = args.server_config();
    let network_config = args.network_config();

    let routes = Arc::new(RouteTable::new());
    let resources = Arc::new(InMemoryResources::new());
    let deps = PipelineDeps {
        binder: Arc::new(RequestParameterBinder::new()),
        validator: Arc::new(DeclarativeValidator::new()),
        mapper: Arc::new(ResponseMapper::new(build_auth_provider(&server_config.auth))),
    };
    let registry = Arc::new(ActionRegistry::new(
        RoutingMetadataResolver::new(server_config.action_suffix.clone()),
        Arc::clone(&routes) as Arc<dyn EndpointPublisher>,
        deps,
    ));

    let report = registry.initialize([ActionProvider::new(
        CheckAuthenticationAction::new(server_config.module_id.clone())
            .with_suffix(server_config.action_suffix.clone()),
    )]);
    if !report.is_clean() {
        anyhow::bail!("built-in actions failed to register");
    }

    let mut module = NetworkModule::new(
        network_config,
        Arc::clone(&registry),
        routes,
        resources as Arc<dyn ResourceResolver>,
    );
    let port = module.start().await?;
    info!(port, module = %server_config.module_id, "actiongate listening");

    module
        .serve(async {
            // An error here means no signal handler could be installed.
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
