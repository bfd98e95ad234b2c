//! Visitors over the closed set of constraint kinds.
//!
//! [`MessageConstraints::translate`](crate::MessageConstraints::translate)
//! walks a constraint set in validation order and hands each constraint to a
//! [`ConstraintTranslator`]. Two translators ship with the crate:
//!
//! | Translator | Output |
//! |------------|--------|
//! | [`RuleDescriber`] | One human-readable line per constraint |
//! | [`RustCheckTranslator`] | A Rust function checking a generated message struct |

mod describe;
mod rust;

use crate::boundary::NumberBoundaries;
use crate::constraint::{
    AllRequired, CompositeConstraint, CustomOption, FieldConstraint, Pattern, Required,
    RequiredFieldConstraint,
};
use crate::error::CompilationError;

pub use describe::RuleDescriber;
pub use rust::RustCheckTranslator;

/// Turns constraints into another representation.
///
/// Visits happen in validation order. A translator that cannot express a
/// constraint records the problem and reports it from [`finish`](Self::finish);
/// no partial output is produced.
pub trait ConstraintTranslator {
    /// What the translation produces.
    type Output;

    /// A `required` option.
    fn visit_required(&mut self, constraint: &FieldConstraint<Required>);

    /// A numeric range.
    fn visit_range(&mut self, constraint: &FieldConstraint<NumberBoundaries>);

    /// A `pattern` option.
    fn visit_pattern(&mut self, constraint: &FieldConstraint<Pattern>);

    /// An `all_required` option.
    fn visit_all_required(&mut self, constraint: &FieldConstraint<AllRequired>);

    /// A user-defined option.
    fn visit_custom(&mut self, constraint: &FieldConstraint<CustomOption>);

    /// A nested message marked `validate`.
    fn visit_composite(&mut self, constraint: &CompositeConstraint);

    /// A message-level `required_field` option.
    fn visit_required_field(&mut self, constraint: &RequiredFieldConstraint);

    /// Produce the output.
    ///
    /// # Errors
    ///
    /// Returns a `CompilationError` if any visited constraint could not be
    /// translated.
    fn finish(self) -> Result<Self::Output, CompilationError>
    where
        Self: Sized;
}
