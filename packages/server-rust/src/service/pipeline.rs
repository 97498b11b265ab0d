//! Per-request pipeline: bind, validate, execute, map.
//!
//! ```text
//! Start -> ModelBound -> Validated -> Executed -> Responded
//! ```
//!
//! Every transition may end the request early. Each run is wrapped in an
//! `action` span carrying the stage reached, the HTTP status and the elapsed
//! time.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use actiongate_core::{RoutingIdentity, ValidationErrors};
use serde_json::Value;
use tracing::field::Empty;
use tracing::{debug, error, info_span};

use super::binding::build_model;
use super::operation::{
    ActionRequest, DispatchError, ExecutionFailure, PipelineOutcome, PipelineStage,
};
use super::provider::short_type_name;
use super::response::{ActionResponse, ResponseMapper};
use crate::traits::{ActionEndpoint, ActionModel, ConstraintValidator, ModelBinder, RestAction};

/// Collaborators shared by every pipeline.
#[derive(Clone)]
pub struct PipelineDeps {
    pub binder: Arc<dyn ModelBinder>,
    pub validator: Arc<dyn ConstraintValidator>,
    pub mapper: Arc<ResponseMapper>,
}

/// A request pipeline closed over one action and its routing identity.
pub struct RequestPipeline<A: RestAction> {
    action: Arc<A>,
    identity: RoutingIdentity,
    deps: PipelineDeps,
}

impl<A: RestAction> RequestPipeline<A> {
    #[must_use]
    pub fn new(action: Arc<A>, identity: RoutingIdentity, deps: PipelineDeps) -> Self {
        Self {
            action,
            identity,
            deps,
        }
    }

    /// Runs bind, validate and execute. Never panics and never returns an error:
    /// every failure is folded into the outcome.
    ///
    /// Declarative constraints see the bound JSON before the typed model is
    /// built, so a missing required field is a validation failure rather than
    /// a dispatch error. The model's own validation runs once constraints pass.
    pub fn run(&self, request: &ActionRequest) -> PipelineOutcome {
        let value = match self.bind(request) {
            Ok(value) => value,
            Err(err) => return self.dispatch_failed(err),
        };

        let errors = self.check_constraints(&value);
        if !errors.is_empty() {
            return self.validation_halt(errors);
        }

        let model = match build_model::<A::Model>(value) {
            Ok(model) => model,
            Err(source) => {
                return self.dispatch_failed(DispatchError::Model {
                    model: short_type_name::<A::Model>(),
                    source,
                })
            }
        };

        if let Some(errors) = ActionModel::validate(&model).filter(|errors| !errors.is_empty()) {
            return self.validation_halt(errors);
        }

        self.execute(model)
    }

    fn bind(&self, request: &ActionRequest) -> Result<Value, DispatchError> {
        match self.identity.input.descriptor() {
            Some(descriptor) => Ok(self.deps.binder.bind(request, descriptor)?),
            None => Ok(Value::Null),
        }
    }

    fn check_constraints(&self, value: &Value) -> ValidationErrors {
        match self.identity.input.descriptor() {
            Some(descriptor) => self.deps.validator.validate(descriptor, value),
            None => ValidationErrors::new(),
        }
    }

    fn dispatch_failed(&self, err: DispatchError) -> PipelineOutcome {
        error!(action = %self.identity.action_type, error = %err, "Unable to bind action model");
        PipelineOutcome::DispatchFailed(err)
    }

    fn validation_halt(&self, errors: ValidationErrors) -> PipelineOutcome {
        debug!(
            action = %self.identity.action_type,
            violations = errors.len(),
            "Model validation failed"
        );
        PipelineOutcome::ValidationHalt(errors)
    }

    fn execute(&self, model: A::Model) -> PipelineOutcome {
        let action = &self.action;
        let result = match panic::catch_unwind(AssertUnwindSafe(|| action.perform(model))) {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => return self.failed(&err),
            Err(payload) => return self.failed(&anyhow::anyhow!(panic_message(&*payload))),
        };
        match result.try_map_entity(serde_json::to_value) {
            Ok(result) => PipelineOutcome::Completed(result),
            Err(err) => self.failed(&anyhow::Error::new(err).context("cannot serialize entity")),
        }
    }

    fn failed(&self, err: &anyhow::Error) -> PipelineOutcome {
        error!(
            action = %self.identity.action_type,
            route = %self.identity,
            error = ?err,
            "Unable to perform rest action"
        );
        PipelineOutcome::ExecutionFailed(ExecutionFailure {
            action: self.identity.action_type.clone(),
            message: err.to_string(),
        })
    }
}

impl<A: RestAction> ActionEndpoint for RequestPipeline<A> {
    fn identity(&self) -> &RoutingIdentity {
        &self.identity
    }

    /// Primary-type endpoints only accept resources of one of those node types.
    fn accepts(&self, request: &ActionRequest) -> bool {
        if self.identity.primary_types.is_empty() {
            return true;
        }
        request.resource.as_ref().is_some_and(|resource| {
            self.identity
                .primary_types
                .iter()
                .any(|node_type| resource.is_node_type(node_type))
        })
    }

    fn handle(&self, request: ActionRequest) -> ActionResponse {
        let span = info_span!(
            "action",
            action = %self.identity.action_type,
            method = %request.method,
            stage = Empty,
            status = Empty,
            duration_ms = Empty,
        );
        let _entered = span.enter();
        let start = Instant::now();

        let outcome = self.run(&request);
        let stage = if matches!(outcome, PipelineOutcome::Completed(_)) {
            PipelineStage::Responded
        } else {
            outcome.stage()
        };
        let response = self.deps.mapper.map(&request, outcome);

        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = start.elapsed().as_millis() as u64;
        span.record("stage", stage.as_str());
        span.record("status", response.status().as_u16());
        span.record("duration_ms", duration_ms);
        response
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "action panicked".to_string()
    }
}
