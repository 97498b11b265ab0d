use actiongate_core::constraint::evaluate;
use actiongate_core::{ModelDescriptor, ValidationErrors};
use serde_json::Value;

use crate::traits::ConstraintValidator;

/// Evaluates the field constraints a model descriptor declares.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclarativeValidator;

impl DeclarativeValidator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ConstraintValidator for DeclarativeValidator {
    fn validate(&self, model: &ModelDescriptor, value: &Value) -> ValidationErrors {
        evaluate(&model.constraints, value)
    }
}
