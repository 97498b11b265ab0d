//! Action registry and request pipeline.
//!
//! 1. **Resolution** (`resolver`): action metadata -> routing identity
//! 2. **Registry** (`registry`): provider lifecycle, endpoint (un)publication
//! 3. **Pipeline** (`pipeline`): bind, validate, execute
//! 4. **Response** (`response`): outcome -> envelope and status code
//! 5. **Watch** (`watch`, `worker`): provider events applied in the background

pub mod auth;
pub mod binding;
pub mod builtin;
pub mod config;
pub mod operation;
pub mod pipeline;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod response;
pub mod validation;
pub mod watch;
pub mod worker;

#[cfg(test)]
pub(crate) mod fixtures;

pub use auth::{build_auth_provider, ChainedAuthProvider, JwtAuthProvider, RemoteUserHeader};
pub use binding::RequestParameterBinder;
pub use builtin::CheckAuthenticationAction;
pub use config::{AuthConfig, ServerConfig, FRAMEWORK_MODULE};
pub use operation::{
    ActionRequest, BindError, ConfigurationError, DispatchError, EndpointHandle,
    ExecutionFailure, PipelineOutcome, PipelineStage, PublishError, RegistryError,
};
pub use pipeline::{PipelineDeps, RequestPipeline};
pub use provider::{ActionDeclaration, ActionMetadata, ActionProvider, ErasedAction, ProviderId};
pub use registry::{ActionRegistry, InitReport, Registration, RegistrationHandle};
pub use resolver::{RoutingMetadataResolver, DEFAULT_ACTION_SUFFIX};
pub use response::{ActionResponse, ResponseMapper};
pub use validation::DeclarativeValidator;
pub use watch::{spawn_registry_watcher, ProviderEvent, RegistryWatcher};
pub use worker::{BackgroundRunnable, BackgroundWorker};
