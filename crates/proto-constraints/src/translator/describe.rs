use crate::boundary::NumberBoundaries;
use crate::constraint::{
    AllRequired, CompositeConstraint, CustomOption, FieldConstraint, Pattern, Required,
    RequiredFieldConstraint,
};
use crate::error::CompilationError;

use super::ConstraintTranslator;

/// Lists constraints as text, one line each, e.g. `age: range [0..150)`.
#[derive(Debug, Default)]
pub struct RuleDescriber {
    lines: Vec<String>,
}

impl RuleDescriber {
    /// An empty listing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

pub(crate) fn required_line(c: &FieldConstraint<Required>) -> String {
    format!("{}: required", c.field().name())
}

pub(crate) fn range_line(c: &FieldConstraint<NumberBoundaries>) -> String {
    format!("{}: range {}", c.field().name(), c.option_value())
}

pub(crate) fn pattern_line(c: &FieldConstraint<Pattern>) -> String {
    format!("{}: pattern `{}`", c.field().name(), c.option_value().as_str())
}

pub(crate) fn all_required_line(c: &FieldConstraint<AllRequired>) -> String {
    format!("{}: all_required", c.field().name())
}

pub(crate) fn custom_line(c: &FieldConstraint<CustomOption>) -> String {
    format!(
        "{}: {} = {}",
        c.field().name(),
        c.option_name(),
        c.option_value().value()
    )
}

pub(crate) fn composite_line(c: &CompositeConstraint) -> String {
    format!("{}: validate {}", c.field().name(), c.message().type_name())
}

pub(crate) fn required_field_line(c: &RequiredFieldConstraint) -> String {
    format!("required_field `{}`", c.expression())
}

impl ConstraintTranslator for RuleDescriber {
    type Output = Vec<String>;

    fn visit_required(&mut self, constraint: &FieldConstraint<Required>) {
        self.lines.push(required_line(constraint));
    }

    fn visit_range(&mut self, constraint: &FieldConstraint<NumberBoundaries>) {
        self.lines.push(range_line(constraint));
    }

    fn visit_pattern(&mut self, constraint: &FieldConstraint<Pattern>) {
        self.lines.push(pattern_line(constraint));
    }

    fn visit_all_required(&mut self, constraint: &FieldConstraint<AllRequired>) {
        self.lines.push(all_required_line(constraint));
    }

    fn visit_custom(&mut self, constraint: &FieldConstraint<CustomOption>) {
        self.lines.push(custom_line(constraint));
    }

    fn visit_composite(&mut self, constraint: &CompositeConstraint) {
        self.lines.push(composite_line(constraint));
    }

    fn visit_required_field(&mut self, constraint: &RequiredFieldConstraint) {
        self.lines.push(required_field_line(constraint));
    }

    fn finish(self) -> Result<Self::Output, CompilationError> {
        Ok(self.lines)
    }
}
