use std::sync::Arc;

use prost_reflect::{MessageDescriptor, ReflectMessage};

use crate::config::{ValidationConfig, ValidationOption, ValidatorOption};
use crate::constraint::MessageConstraints;
use crate::error::{CompilationError, Error};
use crate::rules::Rules;
use crate::translator::ConstraintTranslator;

mod builder;

use builder::Builder;

/// Thread-safe validator for Protocol Buffer messages.
///
/// Validates messages against the options registered in its [`Rules`].
/// Constraint sets are built lazily per message type and cached for reuse.
pub struct Validator {
    builder: Builder,
    fail_fast: bool,
}

impl Validator {
    /// Create a new `Validator` with default options.
    #[must_use]
    pub fn new(rules: Rules) -> Self {
        Self::with_options(rules, &[])
    }

    /// Create a new `Validator` with the given options.
    #[must_use]
    pub fn with_options(rules: Rules, options: &[ValidatorOption]) -> Self {
        let mut fail_fast = false;
        let mut disable_lazy = false;
        let mut message_descriptors = Vec::new();

        for opt in options {
            match opt {
                ValidatorOption::FailFast => fail_fast = true,
                ValidatorOption::DisableLazy => disable_lazy = true,
                ValidatorOption::MessageDescriptors(descriptors) => {
                    message_descriptors.extend(descriptors.iter().cloned());
                }
            }
        }

        let builder = Builder::new(rules, !disable_lazy);
        for descriptor in &message_descriptors {
            builder.preload(descriptor);
        }

        Self { builder, fail_fast }
    }

    /// Validate a message against its constraints.
    ///
    /// # Errors
    ///
    /// Returns an `Error` containing all constraint violations found, or a
    /// compilation error if the constraints of the message type could not be
    /// built.
    pub fn validate<M: ReflectMessage>(&self, msg: &M) -> Result<(), Error> {
        self.validate_with(msg, &[])
    }

    /// Validate a message with per-call validation options.
    ///
    /// # Errors
    ///
    /// Returns an `Error` containing all constraint violations found, or a
    /// compilation error if the constraints of the message type could not be
    /// built.
    pub fn validate_with<M: ReflectMessage>(
        &self,
        msg: &M,
        options: &[ValidationOption],
    ) -> Result<(), Error> {
        let dynamic = msg.transcode_to_dynamic();
        let descriptor = dynamic.descriptor();
        let constraints = self.builder.load_or_build(&descriptor);
        let cfg = ValidationConfig::with_options(self.fail_fast, options);
        constraints.validate_with(&dynamic, &cfg)
    }

    /// The constraint set of a message type, built on first use.
    ///
    /// # Errors
    ///
    /// Returns a `CompilationError` if the options of the type are
    /// inconsistent or inapplicable.
    pub fn constraints(
        &self,
        descriptor: &MessageDescriptor,
    ) -> Result<Arc<MessageConstraints>, CompilationError> {
        let constraints = self.builder.load_or_build(descriptor);
        constraints.constraints()?;
        Ok(constraints)
    }

    /// Translate the constraints of a message type.
    ///
    /// # Errors
    ///
    /// Returns a `CompilationError` if the constraints could not be built or
    /// the translator cannot express one of them.
    pub fn translate<T: ConstraintTranslator>(
        &self,
        descriptor: &MessageDescriptor,
        translator: T,
    ) -> Result<T::Output, CompilationError> {
        self.constraints(descriptor)?.translate(translator)
    }
}
