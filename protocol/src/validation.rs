//! Schema validation seam.
//!
//! The protocol core does not implement JSON Schema. Callers that want
//! documents checked against their contract's type schema hand a
//! [`Validator`] to the [`DocumentFactory`](crate::document::DocumentFactory);
//! whatever it reports is surfaced unchanged.

use serde::{Deserialize, Serialize};

/// One problem found by a validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// JSON pointer into the validated object, e.g. `/message`.
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Outcome of validating one object against one schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub errors: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, issue: ValidationIssue) {
        self.errors.push(issue);
    }

    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
    }
}

/// Checks an object against a JSON-Schema-shaped schema.
pub trait Validator: Send + Sync {
    fn validate(&self, schema: &serde_json::Value, object: &serde_json::Value) -> ValidationResult;
}
