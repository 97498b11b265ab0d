//! Actions and helpers shared by the unit tests.

use std::sync::Arc;
use std::time::Instant;

use actiongate_core::{
    ActionResult, Constraint, FieldConstraint, InputType, ModelDescriptor, ResponseEnvelope,
    ValidationErrors,
};
use bytes::Bytes;
use http::header::HeaderName;
use http::StatusCode;
use serde::{Deserialize, Serialize};

use super::auth::RemoteUserHeader;
use super::binding::RequestParameterBinder;
use super::pipeline::PipelineDeps;
use super::provider::{ActionDeclaration, ErasedAction};
use super::registry::ActionRegistry;
use super::resolver::RoutingMetadataResolver;
use super::response::{ActionResponse, ResponseMapper};
use super::validation::DeclarativeValidator;
use crate::network::handlers::AppState;
use crate::network::routes::{InMemoryResources, RouteTable};
use crate::network::{NetworkConfig, ShutdownController};
use crate::traits::{
    ActionEndpoint, ActionModel, EndpointPublisher, NoModel, ResourceResolver, RestAction,
};

pub const MODULE: &str = "greeter";
pub const REMOTE_USER_HEADER: &str = "x-remote-user";

pub fn test_deps() -> PipelineDeps {
    PipelineDeps {
        binder: Arc::new(RequestParameterBinder::new()),
        validator: Arc::new(DeclarativeValidator::new()),
        mapper: Arc::new(ResponseMapper::new(Arc::new(RemoteUserHeader::new(
            HeaderName::from_static(REMOTE_USER_HEADER),
        )))),
    }
}

pub fn test_registry() -> (ActionRegistry, Arc<RouteTable>) {
    let routes = Arc::new(RouteTable::new());
    let registry = ActionRegistry::new(
        RoutingMetadataResolver::default(),
        Arc::clone(&routes) as Arc<dyn EndpointPublisher>,
        test_deps(),
    );
    (registry, routes)
}

/// Handler state over a fresh registry, plus the resource store behind it.
pub fn test_app_state() -> (AppState, Arc<InMemoryResources>) {
    let (registry, routes) = test_registry();
    let resources = Arc::new(InMemoryResources::new());
    let state = AppState {
        routes,
        resources: Arc::clone(&resources) as Arc<dyn ResourceResolver>,
        registry: Arc::new(registry),
        shutdown: Arc::new(ShutdownController::new()),
        config: Arc::new(NetworkConfig::default()),
        start_time: Instant::now(),
    };
    (state, resources)
}

/// Resolves `action` and wraps it in a pipeline without publishing it.
pub fn endpoint_for<A: RestAction>(action: A) -> Arc<dyn ActionEndpoint> {
    let action = Arc::new(action);
    let identity = RoutingMetadataResolver::default()
        .resolve(&action.metadata())
        .expect("fixture action resolves");
    action.into_endpoint(identity, &test_deps())
}

pub fn envelope_of(response: ActionResponse) -> ResponseEnvelope {
    match response {
        ActionResponse::Envelope { envelope, .. } => envelope,
        other => panic!("expected an envelope, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Hello actions
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct HelloModel {
    pub name: Option<String>,
}

impl ActionModel for HelloModel {
    fn input_type() -> InputType {
        InputType::Model(
            ModelDescriptor::request("HelloModel")
                .with_constraint(FieldConstraint::new("name", Constraint::NotNull)),
        )
    }

    fn validate(&self) -> Option<ValidationErrors> {
        let name = self.name.as_deref()?;
        name.starts_with(char::is_lowercase).then(|| {
            ValidationErrors::of(
                "name",
                serde_json::Value::String(name.to_string()),
                "Name should not start lower case",
            )
        })
    }
}

pub struct HelloPathAction;

impl RestAction for HelloPathAction {
    type Model = HelloModel;
    type Output = ();

    fn declaration(&self) -> ActionDeclaration {
        ActionDeclaration::new(MODULE).get()
    }

    fn perform(&self, model: HelloModel) -> anyhow::Result<ActionResult<()>> {
        let name = model.name.unwrap_or_default();
        Ok(ActionResult::success_with(
            format!("Hello {name}!"),
            format!("Your name is {name}"),
        ))
    }
}

pub struct HelloPrimaryTypeAction;

impl RestAction for HelloPrimaryTypeAction {
    type Model = NoModel;
    type Output = ();

    fn declaration(&self) -> ActionDeclaration {
        ActionDeclaration::new(MODULE).with_primary_types(["nt:folder"])
    }

    fn perform(&self, _model: NoModel) -> anyhow::Result<ActionResult<()>> {
        Ok(ActionResult::success_with("Hello folder!", "Primary type matched"))
    }
}

pub struct HelloResourceTypePostAction;

impl RestAction for HelloResourceTypePostAction {
    type Model = NoModel;
    type Output = ();

    fn declaration(&self) -> ActionDeclaration {
        ActionDeclaration::new(MODULE).with_resource_types(["some/example/resource/type"])
    }

    fn perform(&self, _model: NoModel) -> anyhow::Result<ActionResult<()>> {
        Ok(ActionResult::success_with(
            "Hello resource!",
            "Resource type matched",
        ))
    }
}

// ---------------------------------------------------------------------------
// Misbehaving actions
// ---------------------------------------------------------------------------

pub struct FailingAction;

impl RestAction for FailingAction {
    type Model = NoModel;
    type Output = ();

    fn declaration(&self) -> ActionDeclaration {
        ActionDeclaration::new(MODULE)
    }

    fn perform(&self, _model: NoModel) -> anyhow::Result<ActionResult<()>> {
        Err(anyhow::anyhow!("connection refused").context("storage unavailable"))
    }
}

pub struct PanickingAction;

impl RestAction for PanickingAction {
    type Model = NoModel;
    type Output = ();

    fn declaration(&self) -> ActionDeclaration {
        ActionDeclaration::new(MODULE)
    }

    fn perform(&self, _model: NoModel) -> anyhow::Result<ActionResult<()>> {
        panic!("boom")
    }
}

pub struct BrokenBothKindsAction;

impl RestAction for BrokenBothKindsAction {
    type Model = NoModel;
    type Output = ();

    fn declaration(&self) -> ActionDeclaration {
        ActionDeclaration::new(MODULE)
            .with_primary_types(["nt:folder"])
            .with_resource_types(["some/type"])
    }

    fn perform(&self, _model: NoModel) -> anyhow::Result<ActionResult<()>> {
        Ok(ActionResult::success())
    }
}

// ---------------------------------------------------------------------------
// Entity and raw actions
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct EchoModel {
    pub text: String,
    pub count: u32,
}

impl ActionModel for EchoModel {
    fn input_type() -> InputType {
        InputType::Model(
            ModelDescriptor::request("EchoModel")
                .with_constraint(FieldConstraint::new("text", Constraint::NotBlank)),
        )
    }
}

pub struct EchoEntityAction;

impl RestAction for EchoEntityAction {
    type Model = EchoModel;
    type Output = EchoModel;

    fn declaration(&self) -> ActionDeclaration {
        ActionDeclaration::new(MODULE)
    }

    fn perform(&self, model: EchoModel) -> anyhow::Result<ActionResult<EchoModel>> {
        Ok(ActionResult::success_entity(model))
    }
}

/// Typed, required fields bound from query, form or JSON.
#[derive(Debug, Serialize, Deserialize)]
pub struct PageModel {
    pub name: String,
    pub limit: u32,
    #[serde(default)]
    pub exact: bool,
}

impl ActionModel for PageModel {
    fn input_type() -> InputType {
        InputType::Model(
            ModelDescriptor::request("PageModel")
                .with_constraint(FieldConstraint::new("name", Constraint::NotNull))
                .with_constraint(FieldConstraint::new("limit", Constraint::Max(100))),
        )
    }
}

pub struct PageAction;

impl RestAction for PageAction {
    type Model = PageModel;
    type Output = PageModel;

    fn declaration(&self) -> ActionDeclaration {
        ActionDeclaration::new(MODULE)
    }

    fn perform(&self, model: PageModel) -> anyhow::Result<ActionResult<PageModel>> {
        Ok(ActionResult::success_full(
            format!("Page of {}", model.limit),
            format!("Listing for {}", model.name),
            model,
        ))
    }
}

pub struct RawTeapotAction;

impl RestAction for RawTeapotAction {
    type Model = NoModel;
    type Output = ();

    fn declaration(&self) -> ActionDeclaration {
        ActionDeclaration::new(MODULE).get()
    }

    fn perform(&self, _model: NoModel) -> anyhow::Result<ActionResult<()>> {
        Ok(ActionResult::free_form(|| {
            let mut response = http::Response::new(Bytes::from_static(b"short and stout"));
            *response.status_mut() = StatusCode::IM_A_TEAPOT;
            Ok::<_, anyhow::Error>(response)
        }))
    }
}

pub struct MissingWriterAction;

impl RestAction for MissingWriterAction {
    type Model = NoModel;
    type Output = ();

    fn declaration(&self) -> ActionDeclaration {
        ActionDeclaration::new(MODULE)
    }

    fn perform(&self, _model: NoModel) -> anyhow::Result<ActionResult<()>> {
        Ok(ActionResult::free_form_missing())
    }
}
