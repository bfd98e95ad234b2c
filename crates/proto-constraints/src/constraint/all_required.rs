use crate::field::FieldValues;
use crate::violation::ConstraintViolation;

use super::{FieldConstraint, FieldOption};

/// The `all_required` option: a non-empty collection must not contain
/// default elements.
///
/// At most one violation is reported per field, however many elements are
/// default. An empty collection passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AllRequired;

impl FieldOption for AllRequired {
    fn option_name(&self) -> &str {
        "all_required"
    }

    fn default_msg_format(&self) -> &str {
        "All values of the collection must be set, but %s of %s are default."
    }

    fn check(
        &self,
        constraint: &FieldConstraint<Self>,
        values: &FieldValues,
    ) -> Vec<ConstraintViolation> {
        if values.is_empty() {
            return Vec::new();
        }
        let (defaults, _) = values.partition_defaults();
        if defaults.is_empty() {
            return Vec::new();
        }
        vec![
            constraint
                .field()
                .violation(constraint.error_message())
                .with_params([defaults.len().to_string(), values.len().to_string()]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use prost_reflect::{DynamicMessage, Value};

    use super::AllRequired;
    use crate::constraint::FieldConstraint;
    use crate::test_support::{address, field, message, person, strings};

    fn tags_constraint() -> FieldConstraint<AllRequired> {
        FieldConstraint::new(field("test.Person", "tags"), AllRequired)
    }

    #[test]
    fn empty_collection_passes() {
        assert!(tags_constraint().validate(&person()).is_empty());
    }

    #[test]
    fn all_set_collection_passes() {
        let mut msg = person();
        msg.set_field_by_name("tags", strings(&["a", "b", "c"]));
        assert!(tags_constraint().validate(&msg).is_empty());
    }

    #[test]
    fn default_messages_count_as_missing() {
        let constraint = FieldConstraint::new(field("test.Person", "previous"), AllRequired);
        let mut msg = person();
        msg.set_field_by_name(
            "previous",
            Value::List(vec![
                Value::Message(address("Odesa")),
                Value::Message(DynamicMessage::new(message("test.Address"))),
            ]),
        );

        let violations = constraint.validate(&msg);
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].message(),
            "All values of the collection must be set, but 1 of 2 are default."
        );
    }

    proptest! {
        #[test]
        fn one_default_among_three_yields_one_violation(position in 0_usize..3) {
            let mut items = vec!["x", "y", "z"];
            items[position] = "";
            let mut msg = person();
            msg.set_field_by_name("tags", strings(&items));

            let violations = tags_constraint().validate(&msg);
            prop_assert_eq!(violations.len(), 1);
            prop_assert_eq!(violations[0].field_path(), ["tags".to_string()]);
        }
    }
}
