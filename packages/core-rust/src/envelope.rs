//! The JSON response envelope wrapping every non-raw action response.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// User id reported when the request carries no authenticated caller.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Status tag carried in the `status` field of the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnvelopeStatus {
    /// The action ran and reported success.
    Success,
    /// The action ran and reported a domain-level failure.
    Failure,
    /// The bound model was rejected; the action never ran.
    ValidationFailure,
    /// Binding or execution failed unexpectedly.
    Error,
}

impl EnvelopeStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::ValidationFailure => "VALIDATION_FAILURE",
            Self::Error => "ERROR",
        }
    }
}

/// Identity of the caller as seen by the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthContext {
    pub user_id: String,
}

impl AuthContext {
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            user_id: ANONYMOUS_USER.to_string(),
        }
    }

    /// Builds the context from an optional caller id, falling back to
    /// [`ANONYMOUS_USER`] when absent or blank.
    #[must_use]
    pub fn from_caller(caller_id: Option<String>) -> Self {
        match caller_id {
            Some(user_id) if !user_id.trim().is_empty() => Self { user_id },
            _ => Self::anonymous(),
        }
    }
}

impl Default for AuthContext {
    fn default() -> Self {
        Self::anonymous()
    }
}

/// Wire record: `{status, message, messageDetails, entity, authContext:{userId}}`.
///
/// Null fields are omitted from the encoded JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub status: EnvelopeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<Value>,
    pub auth_context: AuthContext,
}

impl ResponseEnvelope {
    #[must_use]
    pub fn new(status: EnvelopeStatus, auth_context: AuthContext) -> Self {
        Self {
            status,
            message: None,
            message_details: None,
            entity: None,
            auth_context,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }

    #[must_use]
    pub fn with_message_details(mut self, message_details: Option<String>) -> Self {
        self.message_details = message_details;
        self
    }

    /// Sets the entity. A JSON `null` entity is normalised to absent.
    #[must_use]
    pub fn with_entity(mut self, entity: Option<Value>) -> Self {
        self.entity = entity.filter(|value| !value.is_null());
        self
    }
}
