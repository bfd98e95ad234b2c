//! Typed constraints derived from field and message options.

mod all_required;
mod composite;
mod custom;
mod pattern;
mod range;
mod required;
mod required_field;

use std::fmt;
use std::sync::OnceLock;

use prost_reflect::{DynamicMessage, ReflectMessage};

use crate::config::ValidationConfig;
use crate::error::{self, CompilationError, Error, ValidationError};
use crate::field::{FieldDeclaration, FieldValues};
use crate::translator::ConstraintTranslator;
use crate::violation::ConstraintViolation;

pub use all_required::AllRequired;
pub use composite::CompositeConstraint;
pub use custom::{CustomOption, CustomRule};
pub use pattern::Pattern;
pub use required::Required;
pub use required_field::RequiredFieldConstraint;

/// The option kind carried by a [`FieldConstraint`].
pub trait FieldOption: Sized {
    /// The option name as written in the schema.
    fn option_name(&self) -> &str;

    /// Message template used when no `error_msg` override is set.
    fn default_msg_format(&self) -> &str;

    /// Check the field values and report violations.
    fn check(
        &self,
        constraint: &FieldConstraint<Self>,
        values: &FieldValues,
    ) -> Vec<ConstraintViolation>;
}

/// A constraint on one field, parameterized by the option value type.
///
/// Only active options produce a `FieldConstraint`; the builder never
/// creates one for an option left at its default.
#[derive(Debug, Clone)]
pub struct FieldConstraint<T> {
    option_value: T,
    field: FieldDeclaration,
    error_msg: Option<String>,
}

impl<T> FieldConstraint<T> {
    /// Constrain `field` with `option_value`.
    pub fn new(field: FieldDeclaration, option_value: T) -> Self {
        Self {
            option_value,
            field,
            error_msg: None,
        }
    }

    /// Replace the default message template.
    #[must_use]
    pub fn with_error_msg(mut self, error_msg: impl Into<String>) -> Self {
        self.error_msg = Some(error_msg.into());
        self
    }

    /// The option value.
    pub fn option_value(&self) -> &T {
        &self.option_value
    }

    /// The constrained field.
    pub fn field(&self) -> &FieldDeclaration {
        &self.field
    }
}

impl<T: FieldOption> FieldConstraint<T> {
    /// The option name.
    pub fn option_name(&self) -> &str {
        self.option_value.option_name()
    }

    /// The message template reported on violation.
    pub fn error_message(&self) -> &str {
        self.error_msg
            .as_deref()
            .unwrap_or_else(|| self.option_value.default_msg_format())
    }

    /// Check the field of `msg`.
    pub fn validate(&self, msg: &DynamicMessage) -> Vec<ConstraintViolation> {
        let values = self.field.values(msg);
        self.option_value.check(self, &values)
    }
}

/// Every constraint kind the option vocabulary defines.
///
/// The set is closed: translators match on it exhaustively.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// The field must be set.
    Required(FieldConstraint<Required>),
    /// Numbers must stay within boundaries.
    Range(FieldConstraint<crate::boundary::NumberBoundaries>),
    /// Strings must match a regular expression.
    Pattern(FieldConstraint<Pattern>),
    /// No element of a non-empty collection may be default.
    AllRequired(FieldConstraint<AllRequired>),
    /// A user-defined option.
    Custom(FieldConstraint<CustomOption>),
    /// Nested messages must be valid.
    Composite(CompositeConstraint),
    /// At least one group of alternative fields must be set.
    RequiredField(RequiredFieldConstraint),
}

impl Constraint {
    /// The constrained field, or `None` for message-level constraints.
    #[must_use]
    pub fn field(&self) -> Option<&FieldDeclaration> {
        match self {
            Self::Required(c) => Some(c.field()),
            Self::Range(c) => Some(c.field()),
            Self::Pattern(c) => Some(c.field()),
            Self::AllRequired(c) => Some(c.field()),
            Self::Custom(c) => Some(c.field()),
            Self::Composite(c) => Some(c.field()),
            Self::RequiredField(_) => None,
        }
    }

    /// Rank of this kind among the constraints of one field.
    fn priority(&self) -> u8 {
        match self {
            Self::Required(_) => 0,
            Self::Range(_) => 1,
            Self::Pattern(_) => 2,
            Self::AllRequired(_) => 3,
            Self::Custom(_) => 4,
            Self::Composite(_) => 5,
            Self::RequiredField(_) => 6,
        }
    }

    /// Field-declaration order first, then option priority. Message-level
    /// constraints sort after every field.
    fn order_key(&self) -> (usize, u8) {
        (
            self.field().map_or(usize::MAX, FieldDeclaration::index),
            self.priority(),
        )
    }

    /// Check `msg` against this constraint.
    ///
    /// # Errors
    ///
    /// Returns a `CompilationError` if a nested message type referenced by a
    /// composite constraint failed to build.
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
        Ok(match self {
            Self::Required(c) => c.validate(msg),
            Self::Range(c) => c.validate(msg),
            Self::Pattern(c) => c.validate(msg),
            Self::AllRequired(c) => c.validate(msg),
            Self::Custom(c) => c.validate(msg),
            Self::Composite(c) => c.validate_with(msg, cfg)?,
            Self::RequiredField(c) => c.validate(msg),
        })
    }

    /// Dispatch to the translator method for this kind.
    pub fn accept<T: ConstraintTranslator + ?Sized>(&self, translator: &mut T) {
        match self {
            Self::Required(c) => translator.visit_required(c),
            Self::Range(c) => translator.visit_range(c),
            Self::Pattern(c) => translator.visit_pattern(c),
            Self::AllRequired(c) => translator.visit_all_required(c),
            Self::Custom(c) => translator.visit_custom(c),
            Self::Composite(c) => translator.visit_composite(c),
            Self::RequiredField(c) => translator.visit_required_field(c),
        }
    }
}

/// The constraints of one message type, ordered by field declaration and
/// option priority.
pub struct MessageConstraints {
    type_name: String,
    state: OnceLock<Result<Vec<Constraint>, CompilationError>>,
}

impl MessageConstraints {
    /// Compose a constraint set. Constraints are put in validation order.
    pub fn new(type_name: impl Into<String>, mut constraints: Vec<Constraint>) -> Self {
        constraints.sort_by_key(Constraint::order_key);
        let state = OnceLock::new();
        let _ = state.set(Ok(constraints));
        Self {
            type_name: type_name.into(),
            state,
        }
    }

    /// An empty entry filled in later, so recursive message types can refer
    /// to themselves while being built.
    pub(crate) fn placeholder(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            state: OnceLock::new(),
        }
    }

    pub(crate) fn fill(&self, result: Result<Vec<Constraint>, CompilationError>) {
        let result = result.map(|mut constraints| {
            constraints.sort_by_key(Constraint::order_key);
            constraints
        });
        let _ = self.state.set(result);
    }

    /// Full name of the constrained message type.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The constraints in validation order.
    ///
    /// # Errors
    ///
    /// Returns the `CompilationError` the set failed to build with.
    pub fn constraints(&self) -> Result<&[Constraint], CompilationError> {
        match self.state.get() {
            Some(Ok(constraints)) => Ok(constraints),
            Some(Err(err)) => Err(err.clone()),
            None => Err(CompilationError::new(format!(
                "constraints for {} are still being built",
                self.type_name
            ))),
        }
    }

    /// Validate `msg`, collecting every violation before failing.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` with all violations found, or
    /// `Error::Compilation` if the constraint set is unusable.
    pub fn validate(&self, msg: &DynamicMessage) -> Result<(), Error> {
        self.validate_with(msg, &ValidationConfig::default())
    }

    pub(crate) fn validate_with(
        &self,
        msg: &DynamicMessage,
        cfg: &ValidationConfig,
    ) -> Result<(), Error> {
        let violations = self.collect_violations(msg, cfg)?;
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(violations).into())
        }
    }

    pub(crate) fn collect_violations(
        &self,
        msg: &DynamicMessage,
        cfg: &ValidationConfig,
    ) -> Result<Vec<ConstraintViolation>, CompilationError> {
        let constraints = self.constraints()?;
        let descriptor = msg.descriptor();
        if descriptor.full_name() != self.type_name {
            return Err(CompilationError::new(format!(
                "constraints for {} cannot validate a {} message",
                self.type_name,
                descriptor.full_name()
            )));
        }
        if !cfg.filter.should_validate(msg, &descriptor) {
            return Ok(Vec::new());
        }

        let mut acc = Vec::new();
        for constraint in constraints {
            if let Some(field) = constraint.field() {
                if !cfg.filter.should_validate_field(msg, field.descriptor()) {
                    continue;
                }
            }
            let found = constraint.validate_with(msg, cfg)?;
            if !error::merge_violations(&mut acc, found, cfg.fail_fast) {
                break;
            }
        }
        Ok(acc)
    }

    /// Visit every constraint in validation order and return the
    /// translator's output.
    ///
    /// # Errors
    ///
    /// Returns a `CompilationError` if the set failed to build or the
    /// translator cannot express one of the constraints.
    pub fn translate<T: ConstraintTranslator>(
        &self,
        mut translator: T,
    ) -> Result<T::Output, CompilationError> {
        for constraint in self.constraints()? {
            constraint.accept(&mut translator);
        }
        translator.finish()
    }
}

impl fmt::Debug for MessageConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("MessageConstraints");
        out.field("type_name", &self.type_name);
        match self.state.get() {
            Some(Ok(constraints)) => out.field("constraints", &constraints.len()),
            Some(Err(err)) => out.field("error", &err.cause),
            None => out.field("constraints", &"<building>"),
        };
        out.finish()
    }
}
