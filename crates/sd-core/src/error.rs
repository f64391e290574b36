//! Core error types for ShopDesk RS

use std::collections::HashMap;
use thiserror::Error;

/// Core error type for all ShopDesk operations
#[derive(Error, Debug)]
pub enum SdError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SdError {
    pub fn not_found(entity: &'static str, value: impl Into<String>) -> Self {
        SdError::NotFound {
            entity,
            field: "id",
            value: value.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        SdError::Conflict {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            SdError::NotFound { .. } => "not_found",
            SdError::Validation(_) => "validation_failed",
            SdError::Conflict { .. } => "conflict",
            SdError::Storage(_) => "storage_error",
            SdError::Serialization(_) => "serialization_error",
            SdError::Internal(_) => "internal_error",
        }
    }

    /// Whether a caller may reload the record and try again
    pub fn is_retryable(&self) -> bool {
        matches!(self, SdError::Conflict { .. })
    }
}

impl From<std::io::Error> for SdError {
    fn from(err: std::io::Error) -> Self {
        SdError::Storage(err.to_string())
    }
}

/// Validation errors collection, keyed by field name
#[derive(Error, Debug, Default, Clone, PartialEq)]
#[error("Validation errors: {errors:?}")]
pub struct ValidationErrors {
    /// Field-specific errors: field_name -> Vec<error_messages>
    pub errors: HashMap<String, Vec<String>>,
    /// Base errors not tied to a specific field
    pub base_errors: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_base(&mut self, message: impl Into<String>) {
        self.base_errors.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.base_errors.is_empty()
    }

    /// Check if there are errors for a specific field
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.errors.get(field)
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
        self.base_errors.extend(other.base_errors);
    }

    pub fn full_messages(&self) -> Vec<String> {
        let mut messages = self.base_errors.clone();
        let mut fields: Vec<_> = self.errors.iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));
        for (field, field_messages) in fields {
            for msg in field_messages {
                messages.push(format!("{} {}", field, msg));
            }
        }
        messages
    }

    /// `Ok(())` when empty, otherwise `Err(self)`
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}
