//! Type-erased action providers handed to the registry.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use actiongate_core::{HttpMethod, InputType, RoutingIdentity};

use super::pipeline::{PipelineDeps, RequestPipeline};
use crate::traits::{ActionEndpoint, ActionModel, RestAction};

static NEXT_PROVIDER_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a provider for as long as it is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderId(pub u64);

impl ProviderId {
    /// Allocates a process-unique id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_PROVIDER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "provider-{}", self.0)
    }
}

/// Routing metadata an action declares about itself.
///
/// `None` and an empty list both mean "not declared" for routing purposes,
/// but declaring both kinds at all is a configuration error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionDeclaration {
    pub module_id: String,
    pub method: HttpMethod,
    pub primary_types: Option<Vec<String>>,
    pub resource_types: Option<Vec<String>>,
}

impl ActionDeclaration {
    /// A POST action owned by `module_id`, routed by path.
    #[must_use]
    pub fn new(module_id: impl Into<String>) -> Self {
        Self {
            module_id: module_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn get(self) -> Self {
        self.with_method(HttpMethod::Get)
    }

    #[must_use]
    pub fn with_primary_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_resource_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resource_types = Some(types.into_iter().map(Into::into).collect());
        self
    }
}

/// Everything the resolver needs to know about an action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionMetadata {
    pub action_type: String,
    pub declaration: ActionDeclaration,
    pub input: InputType,
}

/// Object-safe view of a [`RestAction`].
pub trait ErasedAction: Send + Sync {
    fn metadata(&self) -> ActionMetadata;

    /// Wraps the action in a request pipeline bound to `identity`.
    fn into_endpoint(
        self: Arc<Self>,
        identity: RoutingIdentity,
        deps: &PipelineDeps,
    ) -> Arc<dyn ActionEndpoint>;
}

impl<A: RestAction> ErasedAction for A {
    fn metadata(&self) -> ActionMetadata {
        ActionMetadata {
            action_type: self.type_name().into_owned(),
            declaration: self.declaration(),
            input: A::Model::input_type(),
        }
    }

    fn into_endpoint(
        self: Arc<Self>,
        identity: RoutingIdentity,
        deps: &PipelineDeps,
    ) -> Arc<dyn ActionEndpoint> {
        Arc::new(RequestPipeline::new(self, identity, deps.clone()))
    }
}

/// An action together with its provider identity.
#[derive(Clone)]
pub struct ActionProvider {
    pub id: ProviderId,
    pub action: Arc<dyn ErasedAction>,
}

impl ActionProvider {
    /// Wraps `action` under a freshly allocated id.
    #[must_use]
    pub fn new<A: RestAction>(action: A) -> Self {
        Self::with_id(ProviderId::next(), action)
    }

    #[must_use]
    pub fn with_id<A: RestAction>(id: ProviderId, action: A) -> Self {
        Self {
            id,
            action: Arc::new(action),
        }
    }
}

impl fmt::Debug for ActionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionProvider")
            .field("id", &self.id)
            .field("action", &self.action.metadata().action_type)
            .finish()
    }
}

/// Last path segment of a type name, without generic arguments.
#[must_use]
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
