use std::borrow::Cow;
use std::sync::Arc;

use actiongate_core::{
    ActionResult, InputType, ModelDescriptor, Resource, RoutingIdentity, ValidationErrors,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::service::operation::{ActionRequest, BindError, EndpointHandle, PublishError};
use crate::service::provider::{short_type_name, ActionDeclaration};
use crate::service::response::ActionResponse;

/// A unit of request-handling behavior published as an HTTP endpoint.
///
/// The route is derived from the type name, which must end with the
/// configured suffix: `HelloPathAction` with module `greeter` is served at
/// `/apps/greeter/bin/hello-path.action`.
pub trait RestAction: Send + Sync + 'static {
    /// Input bound from the request. Use [`NoModel`] for actions without input.
    type Model: ActionModel;
    /// Entity type placed in the envelope.
    type Output: Serialize;

    /// Routing metadata: owning module, method, primary or resource types.
    fn declaration(&self) -> ActionDeclaration;

    /// Executes the action.
    ///
    /// # Errors
    ///
    /// Any error is logged with the action identity and answered as an ERROR
    /// envelope. Panics are treated the same way.
    fn perform(&self, model: Self::Model) -> anyhow::Result<ActionResult<Self::Output>>;

    /// Name the route segment is derived from.
    fn type_name(&self) -> Cow<'static, str> {
        Cow::Borrowed(short_type_name::<Self>())
    }
}

/// Typed input model of an action.
pub trait ActionModel: Serialize + DeserializeOwned + Send + 'static {
    /// Declared input type, including its field constraints.
    fn input_type() -> InputType;

    /// Custom validation run after the declarative constraints pass.
    /// `None` means the model has no custom validation.
    fn validate(&self) -> Option<ValidationErrors> {
        None
    }
}

/// Model of actions that take no input. Bound from JSON `null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoModel;

impl ActionModel for NoModel {
    fn input_type() -> InputType {
        InputType::None
    }
}

/// A published endpoint: a pipeline closed over one action.
pub trait ActionEndpoint: Send + Sync {
    fn identity(&self) -> &RoutingIdentity;

    /// Whether this endpoint handles `request`; a refusal is answered as 404.
    fn accepts(&self, request: &ActionRequest) -> bool;

    /// Runs the request to completion. Never panics.
    fn handle(&self, request: ActionRequest) -> ActionResponse;
}

/// Makes endpoints reachable over HTTP.
pub trait EndpointPublisher: Send + Sync {
    /// # Errors
    ///
    /// Returns [`PublishError::RouteConflict`] when any route of `identity` is
    /// already taken. Nothing is published in that case.
    fn publish(
        &self,
        identity: &RoutingIdentity,
        endpoint: Arc<dyn ActionEndpoint>,
    ) -> Result<EndpointHandle, PublishError>;

    /// # Errors
    ///
    /// Returns [`PublishError::UnknownHandle`] when `handle` is not published.
    fn unpublish(&self, handle: EndpointHandle) -> Result<(), PublishError>;
}

/// Turns request data into the JSON form of a model.
pub trait ModelBinder: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`BindError`] when the request body cannot be read.
    fn bind(&self, request: &ActionRequest, model: &ModelDescriptor) -> Result<Value, BindError>;
}

/// Declarative constraint validation of a bound model.
pub trait ConstraintValidator: Send + Sync {
    fn validate(&self, model: &ModelDescriptor, value: &Value) -> ValidationErrors;
}

/// Reads the authenticated caller. Identity is reported, never enforced.
pub trait AuthContextProvider: Send + Sync {
    fn caller_id(&self, request: &ActionRequest) -> Option<String>;
}

/// Looks up content resources for type-selector routes.
pub trait ResourceResolver: Send + Sync {
    fn resolve(&self, path: &str) -> Option<Resource>;
}
