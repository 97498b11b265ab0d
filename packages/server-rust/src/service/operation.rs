//! Request, outcome and error types flowing through the action pipeline.

use std::fmt;

use actiongate_core::{ActionResult, HttpMethod, Resource, ValidationErrors};
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::HeaderMap;
use serde_json::Value;

use super::provider::ProviderId;

// ---------------------------------------------------------------------------
// ActionRequest
// ---------------------------------------------------------------------------

/// Inbound request as seen by the pipeline, detached from the HTTP server.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub method: HttpMethod,
    /// Request URI path, including selectors and extension.
    pub path: String,
    /// Raw query string without the leading `?`.
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Resource resolved from the path, when one exists.
    pub resource: Option<Resource>,
}

impl ActionRequest {
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            resource: None,
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Adds a header. Invalid names or values are ignored.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resource = Some(resource);
        self
    }

    /// Content type without parameters, lower-cased.
    #[must_use]
    pub fn content_type(&self) -> Option<String> {
        let raw = self.headers.get(CONTENT_TYPE)?.to_str().ok()?;
        let mime = raw.split(';').next().unwrap_or(raw).trim();
        Some(mime.to_ascii_lowercase())
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

// ---------------------------------------------------------------------------
// Endpoint handles
// ---------------------------------------------------------------------------

/// Live handle to one published endpoint, issued by an endpoint publisher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointHandle(pub u64);

impl fmt::Display for EndpointHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "endpoint-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Action metadata violating a routing rule. Raised per provider at registration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("action {action} declares both primary types and resource types")]
    BothRoutingKinds { action: String },
    #[error("action type {action} does not end with suffix {suffix}")]
    MissingSuffix { action: String, suffix: String },
    #[error("action type {action} has an empty name once suffix {suffix} is removed")]
    EmptyActionName { action: String, suffix: String },
    #[error("action {action} has no owning module")]
    MissingModule { action: String },
    #[error("model {model} of action {action} cannot be bound from a request")]
    ModelNotBindable { action: String, model: &'static str },
}

/// Failures reported by an endpoint publisher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    #[error("route already published: {route}")]
    RouteConflict { route: String },
    #[error("unknown endpoint handle: {0}")]
    UnknownHandle(EndpointHandle),
}

/// Failures from [`ActionRegistry::register`](super::registry::ActionRegistry::register).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("provider {id} is already registered")]
    Duplicate { id: ProviderId },
    #[error("registry is shut down")]
    Closed,
    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Request data that cannot be turned into a model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),
    #[error("malformed request body: {0}")]
    MalformedBody(String),
}

/// Binding failures. Distinct from validation: the caller gets ERROR, not
/// VALIDATION_FAILURE.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Bind(#[from] BindError),
    #[error("cannot build model {model}: {source}")]
    Model {
        model: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// An action body that failed with an error or a panic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionFailure {
    pub action: String,
    /// Top-level error message. Reported to the caller as `messageDetails`.
    pub message: String,
}

// ---------------------------------------------------------------------------
// Pipeline outcome
// ---------------------------------------------------------------------------

/// Stages of the per-request state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Start,
    ModelBound,
    Validated,
    Executed,
    Responded,
}

impl PipelineStage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::ModelBound => "model_bound",
            Self::Validated => "validated",
            Self::Executed => "executed",
            Self::Responded => "responded",
        }
    }
}

/// Terminal result of running one request through the pipeline.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// The action ran; its entity has been converted to JSON.
    Completed(ActionResult<Value>),
    /// The model was rejected; the action never ran.
    ValidationHalt(ValidationErrors),
    DispatchFailed(DispatchError),
    ExecutionFailed(ExecutionFailure),
}

impl PipelineOutcome {
    /// Last stage successfully reached before this outcome.
    #[must_use]
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::DispatchFailed(_) => PipelineStage::Start,
            Self::ValidationHalt(_) => PipelineStage::ModelBound,
            Self::ExecutionFailed(_) => PipelineStage::Validated,
            Self::Completed(_) => PipelineStage::Executed,
        }
    }
}
