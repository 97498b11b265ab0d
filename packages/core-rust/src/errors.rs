use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single rejected field: where it is, what was sent, and why it was refused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// Dotted path of the offending field within the bound model.
    pub path: String,
    /// The value that failed validation. Omitted from the wire when null.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub invalid_value: Value,
    /// Human-readable explanation, shown to the caller as-is.
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(path: impl Into<String>, invalid_value: Value, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            invalid_value,
            message: message.into(),
        }
    }
}

/// Ordered sequence of validation errors. An empty sequence means "valid".
///
/// Serialized transparently as a JSON array so it can be dropped directly into
/// the `entity` field of a `VALIDATION_FAILURE` envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// Creates an empty error sequence.
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Creates a sequence holding exactly one error.
    #[must_use]
    pub fn of(path: impl Into<String>, invalid_value: Value, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(path, invalid_value, message);
        errors
    }

    /// Appends an error, returning `self` for chaining.
    pub fn add(
        &mut self,
        path: impl Into<String>,
        invalid_value: Value,
        message: impl Into<String>,
    ) -> &mut Self {
        self.0.push(ValidationError::new(path, invalid_value, message));
        self
    }

    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[ValidationError] {
        &self.0
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<ValidationError> {
        self.0
    }
}

impl FromIterator<ValidationError> for ValidationErrors {
    fn from_iter<I: IntoIterator<Item = ValidationError>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<ValidationError> for ValidationErrors {
    fn extend<I: IntoIterator<Item = ValidationError>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn new_sequence_is_valid() {
        let errors = ValidationErrors::new();
        assert!(errors.is_empty());
        assert_eq!(errors.len(), 0);
    }

    #[test]
    fn add_preserves_insertion_order() {
        let mut errors = ValidationErrors::new();
        errors
            .add("name", json!("bob"), "Name should not start lower case")
            .add("age", json!(-1), "must be greater than or equal to 0");

        let paths: Vec<_> = errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["name", "age"]);
    }

    #[test]
    fn serializes_as_array_with_camel_case_fields() {
        let errors = ValidationErrors::of("name", json!("bob"), "bad name");
        let value = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            value,
            json!([{ "path": "name", "invalidValue": "bob", "message": "bad name" }])
        );
    }

    #[test]
    fn null_invalid_value_is_omitted() {
        let errors = ValidationErrors::of("name", Value::Null, "must not be null");
        let value = serde_json::to_value(&errors).unwrap();
        assert_eq!(value, json!([{ "path": "name", "message": "must not be null" }]));
    }
}
