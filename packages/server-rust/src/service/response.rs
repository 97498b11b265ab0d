//! Mapping of pipeline outcomes onto the wire contract.

use std::sync::Arc;

use actiongate_core::{
    ActionResult, AuthContext, EnvelopeStatus, RawResponse, ResponseEnvelope, ResultBody,
};
use bytes::Bytes;
use http::header::{HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use http::StatusCode;
use serde_json::Value;
use tracing::error;

use super::operation::{ActionRequest, PipelineOutcome};
use crate::traits::AuthContextProvider;

pub const VALIDATION_FAILED_MESSAGE: &str = "Validation failed";
pub const ERROR_MESSAGE: &str = "Unexpected server error";

const JSON_CONTENT_TYPE: &str = "application/json;charset=UTF-8";

/// What goes back to the caller for one request.
#[derive(Debug)]
pub enum ActionResponse {
    Envelope {
        status: StatusCode,
        envelope: ResponseEnvelope,
    },
    /// Written by the action's own response writer.
    Raw(RawResponse),
    /// Bare status without a body.
    Empty(StatusCode),
}

impl ActionResponse {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Envelope { status, .. } | Self::Empty(status) => *status,
            Self::Raw(response) => response.status(),
        }
    }

    /// Encodes the response. Envelopes are JSON with null fields omitted and
    /// are never cached.
    #[must_use]
    pub fn into_http(self) -> RawResponse {
        match self {
            Self::Envelope { status, envelope } => match serde_json::to_vec(&envelope) {
                Ok(body) => {
                    let mut response = http::Response::new(Bytes::from(body));
                    *response.status_mut() = status;
                    let headers = response.headers_mut();
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
                    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
                    response
                }
                Err(err) => {
                    error!(error = %err, "Unable to encode response envelope");
                    empty(StatusCode::INTERNAL_SERVER_ERROR)
                }
            },
            Self::Raw(response) => response,
            Self::Empty(status) => empty(status),
        }
    }
}

fn empty(status: StatusCode) -> RawResponse {
    let mut response = http::Response::new(Bytes::new());
    *response.status_mut() = status;
    response
}

/// Turns a [`PipelineOutcome`] into status code plus envelope.
pub struct ResponseMapper {
    auth: Arc<dyn AuthContextProvider>,
}

impl ResponseMapper {
    #[must_use]
    pub fn new(auth: Arc<dyn AuthContextProvider>) -> Self {
        Self { auth }
    }

    #[must_use]
    pub fn auth_context(&self, request: &ActionRequest) -> AuthContext {
        AuthContext::from_caller(self.auth.caller_id(request))
    }

    #[must_use]
    pub fn map(&self, request: &ActionRequest, outcome: PipelineOutcome) -> ActionResponse {
        match outcome {
            PipelineOutcome::Completed(ActionResult::Success(body)) => {
                self.envelope(request, StatusCode::OK, EnvelopeStatus::Success, body)
            }
            PipelineOutcome::Completed(ActionResult::Failure(body)) => {
                self.envelope(request, StatusCode::OK, EnvelopeStatus::Failure, body)
            }
            PipelineOutcome::Completed(ActionResult::FreeForm(Some(writer))) => {
                match writer.write() {
                    Ok(response) => ActionResponse::Raw(response),
                    Err(err) => {
                        error!(error = ?err, "Response writer failed");
                        ActionResponse::Empty(StatusCode::INTERNAL_SERVER_ERROR)
                    }
                }
            }
            PipelineOutcome::Completed(ActionResult::FreeForm(None)) => {
                error!("Free-form result has no response writer");
                ActionResponse::Empty(StatusCode::INTERNAL_SERVER_ERROR)
            }
            PipelineOutcome::ValidationHalt(errors) => self.envelope(
                request,
                StatusCode::BAD_REQUEST,
                EnvelopeStatus::ValidationFailure,
                ResultBody {
                    message: Some(VALIDATION_FAILED_MESSAGE.to_string()),
                    message_details: None,
                    entity: serde_json::to_value(errors).ok(),
                },
            ),
            PipelineOutcome::DispatchFailed(err) => {
                self.error_envelope(request, err.to_string())
            }
            PipelineOutcome::ExecutionFailed(failure) => {
                self.error_envelope(request, failure.message)
            }
        }
    }

    fn error_envelope(&self, request: &ActionRequest, details: String) -> ActionResponse {
        self.envelope(
            request,
            StatusCode::INTERNAL_SERVER_ERROR,
            EnvelopeStatus::Error,
            ResultBody {
                message: Some(ERROR_MESSAGE.to_string()),
                message_details: Some(details),
                entity: None,
            },
        )
    }

    fn envelope(
        &self,
        request: &ActionRequest,
        status: StatusCode,
        envelope_status: EnvelopeStatus,
        body: ResultBody<Value>,
    ) -> ActionResponse {
        let envelope = ResponseEnvelope::new(envelope_status, self.auth_context(request))
            .with_message(body.message)
            .with_message_details(body.message_details)
            .with_entity(body.entity);
        ActionResponse::Envelope { status, envelope }
    }
}
