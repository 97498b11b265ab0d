//! Action outcomes, before they are mapped to the wire.

use std::fmt;

use bytes::Bytes;

/// Fully custom HTTP response produced by a [`ResponseWriter`].
pub type RawResponse = http::Response<Bytes>;

/// Writer supplied by an action that wants full control of the response.
///
/// Any `FnOnce() -> anyhow::Result<RawResponse> + Send` closure is a writer.
pub trait ResponseWriter: Send {
    /// Produces the response. Errors are logged and answered with a bare 500.
    fn write(self: Box<Self>) -> anyhow::Result<RawResponse>;
}

impl<F> ResponseWriter for F
where
    F: FnOnce() -> anyhow::Result<RawResponse> + Send,
{
    fn write(self: Box<Self>) -> anyhow::Result<RawResponse> {
        (*self)()
    }
}

/// Which variant an [`ActionResult`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStatus {
    Success,
    Failure,
    FreeFormResponse,
}

/// Message, details and entity shared by the success and failure variants.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultBody<R> {
    /// Short notification for the end user.
    pub message: Option<String>,
    /// Longer explanation accompanying `message`.
    pub message_details: Option<String>,
    /// Payload mapped into the envelope's `entity` field.
    pub entity: Option<R>,
}

impl<R> ResultBody<R> {
    fn new(message: Option<String>, message_details: Option<String>, entity: Option<R>) -> Self {
        Self {
            message,
            message_details,
            entity,
        }
    }

    fn try_map<T, E>(self, f: impl FnOnce(R) -> Result<T, E>) -> Result<ResultBody<T>, E> {
        Ok(ResultBody {
            message: self.message,
            message_details: self.message_details,
            entity: self.entity.map(f).transpose()?,
        })
    }
}

/// Result of executing one action. Exactly one variant is populated.
pub enum ActionResult<R> {
    Success(ResultBody<R>),
    Failure(ResultBody<R>),
    /// The writer takes over the response and bypasses the envelope.
    /// `None` is an invariant violation surfaced as a bare 500.
    FreeForm(Option<Box<dyn ResponseWriter>>),
}

impl<R> ActionResult<R> {
    #[must_use]
    pub fn success() -> Self {
        Self::Success(ResultBody::new(None, None, None))
    }

    #[must_use]
    pub fn success_with(message: impl Into<String>, message_details: impl Into<String>) -> Self {
        Self::Success(ResultBody::new(
            Some(message.into()),
            Some(message_details.into()),
            None,
        ))
    }

    #[must_use]
    pub fn success_entity(entity: R) -> Self {
        Self::Success(ResultBody::new(None, None, Some(entity)))
    }

    #[must_use]
    pub fn success_full(
        message: impl Into<String>,
        message_details: impl Into<String>,
        entity: R,
    ) -> Self {
        Self::Success(ResultBody::new(
            Some(message.into()),
            Some(message_details.into()),
            Some(entity),
        ))
    }

    #[must_use]
    pub fn failure() -> Self {
        Self::Failure(ResultBody::new(None, None, None))
    }

    #[must_use]
    pub fn failure_with(message: impl Into<String>, message_details: impl Into<String>) -> Self {
        Self::Failure(ResultBody::new(
            Some(message.into()),
            Some(message_details.into()),
            None,
        ))
    }

    #[must_use]
    pub fn failure_entity(entity: R) -> Self {
        Self::Failure(ResultBody::new(None, None, Some(entity)))
    }

    #[must_use]
    pub fn failure_full(
        message: impl Into<String>,
        message_details: impl Into<String>,
        entity: R,
    ) -> Self {
        Self::Failure(ResultBody::new(
            Some(message.into()),
            Some(message_details.into()),
            Some(entity),
        ))
    }

    /// Hands the whole response over to `writer`.
    #[must_use]
    pub fn free_form(writer: impl ResponseWriter + 'static) -> Self {
        Self::FreeForm(Some(Box::new(writer)))
    }

    /// A free-form result without a writer. Answered with a bare 500.
    #[must_use]
    pub fn free_form_missing() -> Self {
        Self::FreeForm(None)
    }

    #[must_use]
    pub fn status(&self) -> ResultStatus {
        match self {
            Self::Success(_) => ResultStatus::Success,
            Self::Failure(_) => ResultStatus::Failure,
            Self::FreeForm(_) => ResultStatus::FreeFormResponse,
        }
    }

    /// Converts the entity type, short-circuiting on the first conversion error.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns when the entity cannot be converted.
    pub fn try_map_entity<T, E>(
        self,
        f: impl FnOnce(R) -> Result<T, E>,
    ) -> Result<ActionResult<T>, E> {
        Ok(match self {
            Self::Success(body) => ActionResult::Success(body.try_map(f)?),
            Self::Failure(body) => ActionResult::Failure(body.try_map(f)?),
            Self::FreeForm(writer) => ActionResult::FreeForm(writer),
        })
    }
}

impl<R: fmt::Debug> fmt::Debug for ActionResult<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(body) => f.debug_tuple("Success").field(body).finish(),
            Self::Failure(body) => f.debug_tuple("Failure").field(body).finish(),
            Self::FreeForm(writer) => f
                .debug_tuple("FreeForm")
                .field(&writer.as_ref().map(|_| "<writer>"))
                .finish(),
        }
    }
}
