//! Declarative field constraints carried by model descriptors.
//!
//! Constraints are evaluated against the JSON form of a bound model. Except for
//! the presence checks (`NotNull`, `NotBlank`, `NotEmpty`), a null or missing
//! value satisfies every constraint.

use std::fmt;

use regex::Regex;
use serde_json::Value;

use crate::errors::{ValidationError, ValidationErrors};

/// Compiled regular expression compared by its source text.
#[derive(Clone)]
pub struct Pattern(Regex);

impl Pattern {
    /// Compiles `source` into a pattern anchored to the whole value.
    ///
    /// # Errors
    ///
    /// Returns the regex compilation error for an invalid expression.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(&format!("^(?:{source})$")).map(Self)
    }

    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }

    /// The expression as written, without the anchoring wrapper.
    #[must_use]
    pub fn source(&self) -> &str {
        let anchored = self.0.as_str();
        anchored
            .strip_prefix("^(?:")
            .and_then(|s| s.strip_suffix(")$"))
            .unwrap_or(anchored)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source()).finish()
    }
}

/// A single declarative rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    NotNull,
    /// String must contain at least one non-whitespace character.
    NotBlank,
    /// String, array or object must be non-empty.
    NotEmpty,
    /// Length of a string, array or object must lie in `min..=max`.
    Size { min: usize, max: usize },
    Min(i64),
    Max(i64),
    Pattern(Pattern),
}

impl Constraint {
    /// Returns `true` when `value` satisfies the rule.
    #[must_use]
    pub fn check(&self, value: &Value) -> bool {
        match self {
            Self::NotNull => !value.is_null(),
            Self::NotBlank => value.as_str().is_some_and(|s| !s.trim().is_empty()),
            Self::NotEmpty => length_of(value).is_some_and(|len| len > 0),
            Self::Size { min, max } => {
                value.is_null() || length_of(value).is_some_and(|len| (*min..=*max).contains(&len))
            }
            Self::Min(min) => value.is_null() || number_of(value).is_some_and(|n| n >= *min as f64),
            Self::Max(max) => value.is_null() || number_of(value).is_some_and(|n| n <= *max as f64),
            Self::Pattern(pattern) => {
                value.is_null() || value.as_str().is_some_and(|s| pattern.is_match(s))
            }
        }
    }

    #[must_use]
    pub fn default_message(&self) -> String {
        match self {
            Self::NotNull => "must not be null".to_string(),
            Self::NotBlank => "must not be blank".to_string(),
            Self::NotEmpty => "must not be empty".to_string(),
            Self::Size { min, max } => format!("size must be between {min} and {max}"),
            Self::Min(min) => format!("must be greater than or equal to {min}"),
            Self::Max(max) => format!("must be less than or equal to {max}"),
            Self::Pattern(pattern) => format!("must match \"{}\"", pattern.source()),
        }
    }
}

/// A constraint bound to a field path, with an optional custom message.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldConstraint {
    /// Dotted path into the model, e.g. `"address.city"`.
    pub field: String,
    pub constraint: Constraint,
    pub message: Option<String>,
}

impl FieldConstraint {
    #[must_use]
    pub fn new(field: impl Into<String>, constraint: Constraint) -> Self {
        Self {
            field: field.into(),
            constraint,
            message: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn message(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| self.constraint.default_message())
    }
}

/// Evaluates every constraint against `model`, in declaration order.
#[must_use]
pub fn evaluate(constraints: &[FieldConstraint], model: &Value) -> ValidationErrors {
    constraints
        .iter()
        .filter_map(|rule| {
            let value = lookup(model, &rule.field).unwrap_or(&Value::Null);
            (!rule.constraint.check(value))
                .then(|| ValidationError::new(rule.field.clone(), value.clone(), rule.message()))
        })
        .collect()
}

fn lookup<'a>(model: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(model, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

fn length_of(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        Value::Object(map) => Some(map.len()),
        _ => None,
    }
}

fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
