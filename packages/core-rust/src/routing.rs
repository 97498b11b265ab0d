//! Routing identity derived from an action's declared metadata.

use std::fmt;

use crate::constraint::FieldConstraint;

/// Request extension every action route is bound to.
pub const ACTION_EXTENSION: &str = "action";

/// Resource type used for primary-type routes, matched against any resource.
pub const DEFAULT_RESOURCE_TYPE: &str = "actiongate/default";

/// HTTP method an action answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
}

impl HttpMethod {
    #[must_use]
    pub fn from_http(method: &http::Method) -> Option<Self> {
        match *method {
            http::Method::GET => Some(Self::Get),
            http::Method::POST => Some(Self::Post),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_http(self) -> http::Method {
        match self {
            Self::Get => http::Method::GET,
            Self::Post => http::Method::POST,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an endpoint is mounted. Exactly one kind per action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RouteBinding {
    /// Exact, non-prefix path match, e.g. `/apps/greeter/bin/hello`.
    Path { path: String },
    /// Resource-type plus selector match, e.g. `nt:folder` + `greeter.hello`.
    ResourceType {
        resource_types: Vec<String>,
        selector: String,
    },
}

/// Sources a model type can be bound from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Adaptable {
    Request,
    Resource,
}

/// Static description of an action's input model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescriptor {
    pub type_name: &'static str,
    pub adaptables: Vec<Adaptable>,
    pub constraints: Vec<FieldConstraint>,
}

impl ModelDescriptor {
    /// A request-bindable model without constraints.
    #[must_use]
    pub fn request(type_name: &'static str) -> Self {
        Self {
            type_name,
            adaptables: vec![Adaptable::Request],
            constraints: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_adaptables(mut self, adaptables: Vec<Adaptable>) -> Self {
        self.adaptables = adaptables;
        self
    }

    #[must_use]
    pub fn with_constraint(mut self, constraint: FieldConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    #[must_use]
    pub fn is_request_bindable(&self) -> bool {
        self.adaptables.contains(&Adaptable::Request)
    }
}

/// Input an action expects. `None` skips binding and validation.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InputType {
    #[default]
    None,
    Model(ModelDescriptor),
}

impl InputType {
    #[must_use]
    pub fn descriptor(&self) -> Option<&ModelDescriptor> {
        match self {
            Self::None => None,
            Self::Model(descriptor) => Some(descriptor),
        }
    }
}

/// Immutable routing identity, computed once per provider registration.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingIdentity {
    pub binding: RouteBinding,
    pub method: HttpMethod,
    pub extension: &'static str,
    /// Action type name, kept for diagnostics.
    pub action_type: String,
    pub module_id: String,
    /// Node types a resolved resource must have; empty accepts any resource.
    pub primary_types: Vec<String>,
    pub input: InputType,
}

impl fmt::Display for RoutingIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.binding {
            RouteBinding::Path { path } => {
                write!(f, "{} {path}.{}", self.method, self.extension)
            }
            RouteBinding::ResourceType {
                resource_types,
                selector,
            } => write!(
                f,
                "{} [{}] {selector}.{}",
                self.method,
                resource_types.join(","),
                self.extension
            ),
        }
    }
}
