use prost_reflect::Value;
use regex::Regex;

use crate::error::CompilationError;
use crate::field::FieldValues;
use crate::violation::ConstraintViolation;

use super::{FieldConstraint, FieldOption};

/// The `pattern` option: the whole string must match a regular expression.
///
/// Empty strings are left to the `required` option.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile a pattern.
    ///
    /// # Errors
    ///
    /// Returns a `CompilationError` if the expression is not a valid regex.
    pub fn new(source: &str) -> Result<Self, CompilationError> {
        let regex = Regex::new(&format!("^(?:{source})$"))
            .map_err(|e| CompilationError::new(format!("invalid regex pattern `{source}`: {e}")))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// The expression as written in the option.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether `text` matches in full.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl FieldOption for Pattern {
    fn option_name(&self) -> &str {
        "pattern"
    }

    fn default_msg_format(&self) -> &str {
        "The string must match the regular expression `%s`."
    }

    fn check(
        &self,
        constraint: &FieldConstraint<Self>,
        values: &FieldValues,
    ) -> Vec<ConstraintViolation> {
        values
            .iter()
            .filter(|value| match value {
                Value::String(s) => !s.is_empty() && !self.is_match(s),
                _ => false,
            })
            .map(|value| {
                constraint
                    .field()
                    .violation(constraint.error_message())
                    .with_params([self.source.clone()])
                    .with_field_value(value.clone())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use prost_reflect::Value;

    use super::Pattern;
    use crate::constraint::FieldConstraint;
    use crate::test_support::{field, person, strings};

    #[test]
    fn whole_string_must_match() {
        let pattern = Pattern::new("[a-z]+@[a-z]+").expect("valid regex");
        assert!(pattern.is_match("ada@example"));
        assert!(!pattern.is_match("Ada ada@example"));
    }

    #[test]
    fn invalid_regex_is_a_compilation_error() {
        let err = Pattern::new("(unclosed").expect_err("regex must not compile");
        assert!(err.cause.contains("(unclosed"));
    }

    #[test]
    fn mismatching_string_is_reported_with_the_regex() {
        let constraint = FieldConstraint::new(
            field("test.Person", "phone"),
            Pattern::new(r"\+?[0-9]{7,12}").expect("valid regex"),
        );
        let mut msg = person();
        assert!(constraint.validate(&msg).is_empty());

        msg.set_field_by_name("phone", Value::String("call me".to_string()));
        let violations = constraint.validate(&msg);
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].message(),
            r"The string must match the regular expression `\+?[0-9]{7,12}`."
        );

        msg.set_field_by_name("phone", Value::String("+3804412345678".to_string()));
        assert_eq!(constraint.validate(&msg).len(), 1);
        msg.set_field_by_name("phone", Value::String("+38044123456".to_string()));
        assert!(constraint.validate(&msg).is_empty());
    }

    #[test]
    fn repeated_strings_are_checked_one_by_one() {
        let constraint = FieldConstraint::new(
            field("test.Person", "tags"),
            Pattern::new("[a-z]+").expect("valid regex"),
        )
        .with_error_msg("Tag `%s` is not lowercase.");
        let mut msg = person();
        msg.set_field_by_name("tags", strings(&["ok", "NOPE", "fine", "Bad"]));

        let values: Vec<_> = constraint
            .validate(&msg)
            .iter()
            .filter_map(|v| v.field_value().cloned())
            .collect();
        assert_eq!(
            values,
            [
                Value::String("NOPE".to_string()),
                Value::String("Bad".to_string())
            ]
        );
    }
}
