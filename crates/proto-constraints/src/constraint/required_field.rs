use prost_reflect::{DynamicMessage, MessageDescriptor};

use crate::error::CompilationError;
use crate::field::FieldDeclaration;
use crate::violation::ConstraintViolation;

const MSG_FORMAT: &str = "None of the fields match the `required_field` definition: %s";

/// The message-level `required_field` option.
///
/// The expression lists alternatives separated by `|`; each alternative is a
/// group of fields joined with `&` that must all be set. The message is
/// valid when at least one alternative is fully set.
#[derive(Debug, Clone)]
pub struct RequiredFieldConstraint {
    type_name: String,
    expression: String,
    alternatives: Vec<Vec<FieldDeclaration>>,
}

impl RequiredFieldConstraint {
    /// Parse `expression` against the fields of `descriptor`.
    ///
    /// # Errors
    ///
    /// Returns a `CompilationError` if the expression is empty or names a
    /// field the message does not declare.
    pub fn parse(descriptor: &MessageDescriptor, expression: &str) -> Result<Self, CompilationError> {
        let type_name = descriptor.full_name();
        let mut alternatives = Vec::new();
        for alternative in expression.split('|') {
            let mut group = Vec::new();
            for name in alternative.split('&').map(str::trim) {
                if name.is_empty() {
                    return Err(CompilationError::new(format!(
                        "malformed required_field `{expression}` on {type_name}"
                    )));
                }
                let field = descriptor.get_field_by_name(name).ok_or_else(|| {
                    CompilationError::new(format!(
                        "required_field `{expression}` refers to unknown field `{name}` of {type_name}"
                    ))
                })?;
                group.push(FieldDeclaration::new(field));
            }
            alternatives.push(group);
        }
        Ok(Self {
            type_name: type_name.to_string(),
            expression: expression.trim().to_string(),
            alternatives,
        })
    }

    /// Full name of the constrained message type.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The expression as written.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The alternative field groups, in expression order.
    #[must_use]
    pub fn alternatives(&self) -> &[Vec<FieldDeclaration>] {
        &self.alternatives
    }

    /// Check `msg`. The violation, if any, has an empty field path.
    #[must_use]
    pub fn validate(&self, msg: &DynamicMessage) -> Vec<ConstraintViolation> {
        let matched = self
            .alternatives
            .iter()
            .any(|group| group.iter().all(|f| !f.values(msg).is_unset()));
        if matched {
            Vec::new()
        } else {
            vec![
                ConstraintViolation::new(self.type_name.clone(), Vec::new(), MSG_FORMAT)
                    .with_params([self.expression.clone()]),
            ]
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use prost_reflect::Value;

    use super::RequiredFieldConstraint;
    use crate::test_support::{message, person};

    fn contact() -> RequiredFieldConstraint {
        RequiredFieldConstraint::parse(&message("test.Person"), "email | phone & name")
            .expect("fields exist")
    }

    #[test]
    fn parses_alternatives_in_order() {
        let constraint = contact();
        let names: Vec<Vec<&str>> = constraint
            .alternatives()
            .iter()
            .map(|g| g.iter().map(|f| f.name()).collect())
            .collect();
        assert_eq!(names, [vec!["email"], vec!["phone", "name"]]);
    }

    #[test]
    fn unknown_field_is_a_compilation_error() {
        let err = RequiredFieldConstraint::parse(&message("test.Person"), "email | fax")
            .expect_err("fax is not declared");
        assert!(err.cause.contains("`fax`"));
    }

    #[test]
    fn empty_alternative_is_a_compilation_error() {
        assert!(RequiredFieldConstraint::parse(&message("test.Person"), "email |").is_err());
    }

    #[test]
    fn one_complete_alternative_satisfies() {
        let constraint = contact();
        let mut msg = person();
        msg.set_field_by_name("email", Value::String("a@b.c".to_string()));
        assert!(constraint.validate(&msg).is_empty());

        let mut msg = person();
        msg.set_field_by_name("phone", Value::String("123".to_string()));
        msg.set_field_by_name("name", Value::String("Ada".to_string()));
        assert!(constraint.validate(&msg).is_empty());
    }

    #[test]
    fn partial_alternative_is_reported_at_message_level() {
        let mut msg = person();
        msg.set_field_by_name("phone", Value::String("123".to_string()));

        let violations = contact().validate(&msg);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].field_path().is_empty());
        assert_eq!(
            violations[0].to_string(),
            "test.Person: None of the fields match the `required_field` definition: email | phone & name"
        );
    }
}
