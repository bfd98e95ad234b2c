use std::fmt;
use std::sync::Arc;

use crate::field::FieldValues;
use crate::violation::ConstraintViolation;

use super::{FieldConstraint, FieldOption};

/// A user-defined field option.
///
/// Register implementations with [`Rules::custom_rule`](crate::Rules::custom_rule);
/// a field then opts in by naming the rule in its `custom` options.
pub trait CustomRule: Send + Sync {
    /// The option name fields use to refer to this rule.
    fn name(&self) -> &str;

    /// Default message template for violations of this rule.
    fn msg_format(&self) -> &str;

    /// Check the field values. The option value is available through
    /// `constraint.option_value().value()`.
    fn validate(
        &self,
        constraint: &FieldConstraint<CustomOption>,
        values: &FieldValues,
    ) -> Vec<ConstraintViolation>;

    /// A Rust boolean expression that holds when one element, bound to
    /// `access`, satisfies the rule. `None` when the rule has no code form.
    fn rust_check(&self, _option: &serde_json::Value, _access: &str) -> Option<String> {
        None
    }
}

/// A custom rule paired with the option value a field gave it.
#[derive(Clone)]
pub struct CustomOption {
    rule: Arc<dyn CustomRule>,
    value: serde_json::Value,
}

impl CustomOption {
    /// Bind `value` to `rule`.
    pub fn new(rule: Arc<dyn CustomRule>, value: serde_json::Value) -> Self {
        Self { rule, value }
    }

    /// The registered rule.
    #[must_use]
    pub fn rule(&self) -> &dyn CustomRule {
        self.rule.as_ref()
    }

    /// The option value as written for the field.
    #[must_use]
    pub fn value(&self) -> &serde_json::Value {
        &self.value
    }
}

impl fmt::Debug for CustomOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomOption")
            .field("rule", &self.rule.name())
            .field("value", &self.value)
            .finish()
    }
}

impl FieldOption for CustomOption {
    fn option_name(&self) -> &str {
        self.rule.name()
    }

    fn default_msg_format(&self) -> &str {
        self.rule.msg_format()
    }

    fn check(
        &self,
        constraint: &FieldConstraint<Self>,
        values: &FieldValues,
    ) -> Vec<ConstraintViolation> {
        self.rule.validate(constraint, values)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use prost_reflect::Value;

    use super::CustomOption;
    use crate::constraint::FieldConstraint;
    use crate::test_support::{MaxLength, field, person, strings};

    fn max_length(limit: u64) -> CustomOption {
        CustomOption::new(Arc::new(MaxLength), serde_json::json!(limit))
    }

    #[test]
    fn delegates_to_the_registered_rule() {
        let constraint = FieldConstraint::new(field("test.Person", "tags"), max_length(3));
        assert_eq!(constraint.option_name(), "max_length");

        let mut msg = person();
        msg.set_field_by_name("tags", strings(&["abc", "abcd"]));
        let violations = constraint.validate(&msg);
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].message(),
            "The string must be at most 3 characters long."
        );
        assert_eq!(
            violations[0].field_value(),
            Some(&Value::String("abcd".to_string()))
        );
    }

    #[test]
    fn error_msg_override_reaches_the_rule() {
        let constraint = FieldConstraint::new(field("test.Person", "name"), max_length(2))
            .with_error_msg("Name too long (max %s).");
        let mut msg = person();
        msg.set_field_by_name("name", Value::String("Ada".to_string()));
        assert_eq!(
            constraint.validate(&msg)[0].message(),
            "Name too long (max 2)."
        );
    }

    #[test]
    fn debug_shows_rule_name() {
        assert_eq!(
            format!("{:?}", max_length(5)),
            "CustomOption { rule: \"max_length\", value: Number(5) }"
        );
    }
}
