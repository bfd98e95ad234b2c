//! Typed field constraints for Protocol Buffer messages.
//!
//! Field and message options (`required`, `min`/`max`/`range`, `pattern`,
//! `all_required`, `validate`, `required_field` and user-defined options) are
//! turned into a tree of typed [`Constraint`]s per message type. A constraint
//! set can then be evaluated against `prost-reflect` messages, or walked by a
//! [`ConstraintTranslator`] to produce another representation such as Rust
//! check code.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use proto_constraints::{Rules, Validator};
//! # fn example(msg: impl prost_reflect::ReflectMessage) -> Result<(), proto_constraints::Error> {
//! let rules = Rules::from_json(r#"{
//!     "fields": {
//!         "acme.Person.age": { "min": { "value": 0 }, "max": { "value": 150, "exclusive": true } }
//!     }
//! }"#)?;
//! let validator = Validator::new(rules);
//! match validator.validate(&msg) {
//!     Ok(()) => { /* message is valid */ }
//!     Err(e) => eprintln!("validation failed: {e}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Error types
//!
//! | Type | When |
//! |------|------|
//! | [`ValidationError`] | One or more constraint violations detected |
//! | [`CompilationError`] | Options are inconsistent or inapplicable, or a translator cannot express a constraint |
//!
//! Both are unified under [`Error`].
//!
//! # Re-exported types
//!
//! The [`types`] module re-exports `proto-constraints-types`, the `prost`
//! messages used to send violations over the wire.

#![warn(missing_docs)]

mod boundary;
mod config;
mod constraint;
mod error;
mod field;
mod rules;
mod translator;
mod validator;
mod violation;

#[cfg(test)]
mod test_support;

/// Re-export of `proto-constraints-types` for the wire form of violations.
pub use proto_constraints_types as types;

pub use boundary::{BoundViolation, Boundary, ComparableNumber, NumberBoundaries};
pub use config::{Filter, ValidationOption, ValidatorOption};
pub use constraint::{
    AllRequired, CompositeConstraint, Constraint, CustomOption, CustomRule, FieldConstraint,
    FieldOption, MessageConstraints, Pattern, Required, RequiredFieldConstraint,
};
pub use error::{CompilationError, Error, ValidationError};
pub use field::{FieldDeclaration, FieldValues, is_default_value};
pub use rules::{BoundOption, FieldRules, MessageRules, PatternOption, Rules};
pub use translator::{ConstraintTranslator, RuleDescriber, RustCheckTranslator};
pub use validator::Validator;
pub use violation::ConstraintViolation;
