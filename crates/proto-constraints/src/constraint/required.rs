use crate::field::{FieldDeclaration, FieldValues};
use crate::violation::ConstraintViolation;

use super::{FieldConstraint, FieldOption};

/// The `required` option: the field must hold a non-default value, or at
/// least one element for collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Required;

impl Required {
    /// Numbers and booleans have no "unset" state distinct from a legal
    /// value, so `required` does not apply to singular fields of those kinds.
    #[must_use]
    pub fn applies_to(field: &FieldDeclaration) -> bool {
        field.is_collection()
            || !(field.is_numeric() || matches!(field.element_kind(), prost_reflect::Kind::Bool))
    }
}

impl FieldOption for Required {
    fn option_name(&self) -> &str {
        "required"
    }

    fn default_msg_format(&self) -> &str {
        "A value must be set."
    }

    fn check(
        &self,
        constraint: &FieldConstraint<Self>,
        values: &FieldValues,
    ) -> Vec<ConstraintViolation> {
        if values.is_unset() {
            vec![constraint.field().violation(constraint.error_message())]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use prost_reflect::Value;

    use super::Required;
    use crate::constraint::FieldConstraint;
    use crate::test_support::{address, field, person, strings};

    #[test]
    fn empty_string_is_missing() {
        let constraint = FieldConstraint::new(field("test.Person", "name"), Required);
        let violations = constraint.validate(&person());

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field_path(), ["name"]);
        assert_eq!(violations[0].type_name(), "test.Person");
        assert_eq!(violations[0].message(), "A value must be set.");

        let mut msg = person();
        msg.set_field_by_name("name", Value::String("Ada".to_string()));
        assert!(constraint.validate(&msg).is_empty());
    }

    #[test]
    fn unset_message_and_empty_list_are_missing() {
        let address_required = FieldConstraint::new(field("test.Person", "address"), Required);
        let tags_required = FieldConstraint::new(field("test.Person", "tags"), Required)
            .with_error_msg("At least one tag is needed.");

        let mut msg = person();
        assert_eq!(address_required.validate(&msg).len(), 1);
        let tags = tags_required.validate(&msg);
        assert_eq!(tags[0].message(), "At least one tag is needed.");

        msg.set_field_by_name("address", Value::Message(address("Lviv")));
        msg.set_field_by_name("tags", strings(&[""]));
        assert!(address_required.validate(&msg).is_empty());
        assert!(tags_required.validate(&msg).is_empty());
    }

    #[test]
    fn enum_zero_is_missing() {
        let constraint = FieldConstraint::new(field("test.Person", "status"), Required);
        assert_eq!(constraint.validate(&person()).len(), 1);

        let mut msg = person();
        msg.set_field_by_name("status", Value::EnumNumber(1));
        assert!(constraint.validate(&msg).is_empty());
    }

    #[test]
    fn not_applicable_to_scalar_numbers_and_bools() {
        assert!(!Required::applies_to(&field("test.Person", "age")));
        assert!(!Required::applies_to(&field("test.Person", "active")));
        assert!(Required::applies_to(&field("test.Person", "scores")));
        assert!(Required::applies_to(&field("test.Person", "status")));
        assert!(Required::applies_to(&field("test.Person", "name")));
    }
}
