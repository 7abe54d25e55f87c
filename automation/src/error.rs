//! Error types for the automation engine
//!
//! Evaluation passes separate infrastructure failures, which abort the
//! pass, from per-step problems, which are reported in the pass summary.

use std::collections::HashMap;

use crate::store::StoreError;
use crate::workflows::scheduler::QueueError;

/// Failure of a whole evaluation pass
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Field-level problems found while validating a workflow definition
#[derive(Debug, Clone, thiserror::Error)]
#[error("workflow validation failed: {} field(s) have errors", .details.len())]
pub struct ValidationError {
    pub details: HashMap<String, Vec<String>>,
}

impl ValidationError {
    /// All messages for one field, empty when the field is clean
    pub fn messages(&self, field: &str) -> &[String] {
        self.details.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Helper to accumulate validation errors across fields
pub struct ValidationBuilder {
    details: HashMap<String, Vec<String>>,
}

impl ValidationBuilder {
    pub fn new() -> Self {
        Self {
            details: HashMap::new(),
        }
    }

    pub fn error(mut self, field: &str, message: &str) -> Self {
        self.details
            .entry(field.to_string())
            .or_insert_with(Vec::new)
            .push(message.to_string());
        self
    }

    pub fn build(self) -> Option<ValidationError> {
        if self.details.is_empty() {
            None
        } else {
            Some(ValidationError {
                details: self.details,
            })
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.details.is_empty()
    }
}

impl Default for ValidationBuilder {
    fn default() -> Self {
        Self::new()
    }
}
