use std::fmt;

use prost::Message;

use crate::violation::ConstraintViolation;

/// Top-level error type returned by validation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// One or more constraints were violated.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A constraint could not be built from its options, or could not be
    /// translated.
    #[error(transparent)]
    Compilation(#[from] CompilationError),
}

/// Returned when one or more constraints are violated.
///
/// Holds every violation found across the whole message, in field
/// declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    violations: Vec<ConstraintViolation>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.violations.as_slice() {
            [] => Ok(()),
            [single] if single.violations().is_empty() => {
                write!(f, "validation error: {single}")
            }
            violations => {
                write!(f, "validation errors:")?;
                for v in violations {
                    write_violation(f, v, 1)?;
                }
                Ok(())
            }
        }
    }
}

fn write_violation(
    f: &mut fmt::Formatter<'_>,
    violation: &ConstraintViolation,
    depth: usize,
) -> fmt::Result {
    write!(f, "\n{:width$}- {violation}", "", width = depth * 2 - 1)?;
    for nested in violation.violations() {
        write_violation(f, nested, depth + 1)?;
    }
    Ok(())
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    /// Wrap a non-empty list of violations.
    #[must_use]
    pub(crate) fn new(violations: Vec<ConstraintViolation>) -> Self {
        debug_assert!(!violations.is_empty(), "a validation error needs violations");
        Self { violations }
    }

    /// The violations in the order they were found.
    #[must_use]
    pub fn violations(&self) -> &[ConstraintViolation] {
        &self.violations
    }

    /// Consume the error and return its violations.
    #[must_use]
    pub fn into_violations(self) -> Vec<ConstraintViolation> {
        self.violations
    }

    /// Convert to the wire-compatible payload, preserving violation order.
    #[must_use]
    pub fn as_message(&self) -> proto_constraints_types::ValidationError {
        proto_constraints_types::ValidationError {
            constraint_violation: self
                .violations
                .iter()
                .map(ConstraintViolation::to_proto)
                .collect(),
        }
    }

    /// Rebuild an error from its wire payload. Returns `None` when the
    /// payload carries no violations.
    #[must_use]
    pub fn from_message(message: &proto_constraints_types::ValidationError) -> Option<Self> {
        if message.constraint_violation.is_empty() {
            return None;
        }
        Some(Self::new(
            message
                .constraint_violation
                .iter()
                .map(ConstraintViolation::from_proto)
                .collect(),
        ))
    }

    /// Encode the wire payload with `prost`.
    #[must_use]
    pub fn encode_to_vec(&self) -> Vec<u8> {
        self.as_message().encode_to_vec()
    }

    /// Decode a wire payload produced by [`encode_to_vec`](Self::encode_to_vec).
    /// A valid payload without violations decodes to `None`.
    ///
    /// # Errors
    ///
    /// Returns the `prost` decode error if `bytes` is not a valid payload.
    pub fn decode(bytes: &[u8]) -> Result<Option<Self>, prost::DecodeError> {
        let message = proto_constraints_types::ValidationError::decode(bytes)?;
        Ok(Self::from_message(&message))
    }
}

/// Returned when a constraint cannot be built from its options or cannot be
/// expressed by a translator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("compilation error: {cause}")]
pub struct CompilationError {
    /// Description of why the constraint failed to compile.
    pub cause: String,
}

impl CompilationError {
    pub(crate) fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
        }
    }
}

/// Merge violations from a sub-evaluation into an accumulator.
///
/// Returns `false` when evaluation should stop.
pub(crate) fn merge_violations(
    acc: &mut Vec<ConstraintViolation>,
    found: Vec<ConstraintViolation>,
    fail_fast: bool,
) -> bool {
    let stop = fail_fast && !found.is_empty();
    acc.extend(found);
    !stop
}
