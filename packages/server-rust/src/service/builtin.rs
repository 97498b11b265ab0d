//! Actions shipped with the framework.

use std::borrow::Cow;

use actiongate_core::ActionResult;

use super::provider::ActionDeclaration;
use super::resolver::DEFAULT_ACTION_SUFFIX;
use crate::traits::{NoModel, RestAction};

/// `GET /apps/<module>/bin/check-authentication.action`
///
/// Always succeeds; the envelope's `authContext` tells the caller who the
/// server thinks they are. Its type name carries whatever suffix the
/// registry's resolver is configured with, so the route never changes.
#[derive(Debug, Clone)]
pub struct CheckAuthenticationAction {
    module_id: String,
    suffix: String,
}

impl CheckAuthenticationAction {
    #[must_use]
    pub fn new(module_id: impl Into<String>) -> Self {
        Self {
            module_id: module_id.into(),
            suffix: DEFAULT_ACTION_SUFFIX.to_string(),
        }
    }

    /// Names the action with `suffix` instead of the default one.
    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }
}

impl RestAction for CheckAuthenticationAction {
    type Model = NoModel;
    type Output = ();

    fn declaration(&self) -> ActionDeclaration {
        ActionDeclaration::new(self.module_id.clone()).get()
    }

    fn perform(&self, _model: NoModel) -> anyhow::Result<ActionResult<()>> {
        Ok(ActionResult::success())
    }

    fn type_name(&self) -> Cow<'static, str> {
        Cow::Owned(format!("CheckAuthentication{}", self.suffix))
    }
}
