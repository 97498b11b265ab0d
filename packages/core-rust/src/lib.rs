//! `actiongate` core: response envelope, action results, routing identity,
//! model descriptors and validation errors.

pub mod constraint;
pub mod envelope;
pub mod errors;
pub mod naming;
pub mod resource;
pub mod result;
pub mod routing;

pub use constraint::{Constraint, FieldConstraint, Pattern};
pub use envelope::{AuthContext, EnvelopeStatus, ResponseEnvelope, ANONYMOUS_USER};
pub use errors::{ValidationError, ValidationErrors};
pub use resource::Resource;
pub use result::{ActionResult, RawResponse, ResponseWriter, ResultBody, ResultStatus};
pub use routing::{
    Adaptable, HttpMethod, InputType, ModelDescriptor, RouteBinding, RoutingIdentity,
    ACTION_EXTENSION, DEFAULT_RESOURCE_TYPE,
};
