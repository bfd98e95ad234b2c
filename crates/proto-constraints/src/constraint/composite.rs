use std::fmt;
use std::sync::Arc;

use prost_reflect::{DynamicMessage, Value};

use crate::config::ValidationConfig;
use crate::error::{self, CompilationError};
use crate::field::FieldDeclaration;
use crate::violation::ConstraintViolation;

use super::MessageConstraints;

const NESTED_MSG_FORMAT: &str = "The message must have valid properties.";

/// The `validate` option on a message-typed field: every nested message must
/// satisfy the constraints of its own type.
///
/// Nested violations are reported under a single violation of the field,
/// with their paths extended by the field name.
#[derive(Clone)]
pub struct CompositeConstraint {
    field: FieldDeclaration,
    message: Arc<MessageConstraints>,
}

impl CompositeConstraint {
    /// Validate `field` with the constraints of its message type.
    pub fn new(field: FieldDeclaration, message: Arc<MessageConstraints>) -> Self {
        Self { field, message }
    }

    /// The constrained field.
    #[must_use]
    pub fn field(&self) -> &FieldDeclaration {
        &self.field
    }

    /// The constraints of the nested message type.
    #[must_use]
    pub fn message(&self) -> &Arc<MessageConstraints> {
        &self.message
    }

    /// Check the nested messages of `msg`.
    ///
    /// # Errors
    ///
    /// Returns a `CompilationError` if the nested constraint set failed to
    /// build.
    pub fn validate(
        &self,
        msg: &DynamicMessage,
    ) -> Result<Vec<ConstraintViolation>, CompilationError> {
        self.validate_with(msg, &ValidationConfig::default())
    }

    pub(crate) fn validate_with(
        &self,
        msg: &DynamicMessage,
        cfg: &ValidationConfig,
    ) -> Result<Vec<ConstraintViolation>, CompilationError> {
        // An unset singular message is left to `required`.
        if !self.field.is_collection() && !msg.has_field(self.field.descriptor()) {
            return Ok(Vec::new());
        }

        let mut nested = Vec::new();
        for value in &self.field.values(msg) {
            let Value::Message(inner) = value else {
                continue;
            };
            let found = self.message.collect_violations(inner, cfg)?;
            if !error::merge_violations(&mut nested, found, cfg.fail_fast) {
                break;
            }
        }
        if nested.is_empty() {
            return Ok(Vec::new());
        }

        for violation in &mut nested {
            violation.prepend_path(self.field.name());
        }
        Ok(vec![
            self.field
                .violation(NESTED_MSG_FORMAT)
                .with_violations(nested),
        ])
    }
}

impl fmt::Debug for CompositeConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeConstraint")
            .field("field", &self.field)
            .field("message", &self.message.type_name())
            .finish()
    }
}
