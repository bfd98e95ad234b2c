use crate::boundary::{BoundViolation, ComparableNumber, NumberBoundaries};
use crate::field::FieldValues;
use crate::violation::ConstraintViolation;

use super::{FieldConstraint, FieldOption};

impl BoundViolation {
    /// The relation the value failed, e.g. `greater than or equal to`.
    #[must_use]
    pub fn relation(&self) -> &'static str {
        match self {
            Self::BelowMin(b) if b.is_inclusive() => "greater than or equal to",
            Self::BelowMin(_) => "greater than",
            Self::AboveMax(b) if b.is_inclusive() => "less than or equal to",
            Self::AboveMax(_) => "less than",
        }
    }

    /// The bound value as written.
    #[must_use]
    pub fn bound_value(&self) -> String {
        match self {
            Self::BelowMin(b) | Self::AboveMax(b) => b.value().to_string(),
        }
    }
}

impl FieldOption for NumberBoundaries {
    fn option_name(&self) -> &str {
        "range"
    }

    fn default_msg_format(&self) -> &str {
        "The number must be %s %s."
    }

    fn check(
        &self,
        constraint: &FieldConstraint<Self>,
        values: &FieldValues,
    ) -> Vec<ConstraintViolation> {
        values
            .iter()
            .filter_map(|value| {
                let number = ComparableNumber::from_value(value)?;
                let violated = self.violation_for(&number)?;
                Some(
                    constraint
                        .field()
                        .violation(constraint.error_message())
                        .with_params([violated.relation().to_string(), violated.bound_value()])
                        .with_field_value(value.clone()),
                )
            })
            .collect()
    }
}
