use std::sync::Arc;

use prost_reflect::{DynamicMessage, FieldDescriptor, MessageDescriptor, ReflectMessage};

/// Options for configuring the `Validator` at construction time.
#[non_exhaustive]
pub enum ValidatorOption {
    /// Stop validation on the first violation instead of collecting all.
    FailFast,

    /// Disable lazy building: all known message types must be
    /// pre-registered, and unknown types will produce a compilation error.
    DisableLazy,

    /// Build constraints for these descriptors at validator construction time.
    /// Useful with `DisableLazy` to allow a fixed set of message types.
    MessageDescriptors(Vec<MessageDescriptor>),
}

/// Options for configuring a single `Validator::validate_with` call.
#[non_exhaustive]
pub enum ValidationOption {
    /// Stop validation on the first violation instead of collecting all.
    FailFast,
    /// Override the filter for this validation call.
    Filter(Arc<dyn Filter>),
}

/// Controls which messages and fields are validated.
pub trait Filter: Send + Sync {
    /// Returns true if the given message should be validated.
    fn should_validate(&self, message: &DynamicMessage, descriptor: &MessageDescriptor) -> bool;

    /// Returns true if the constraints of the given field should be checked.
    /// Defaults to message-level filtering.
    fn should_validate_field(&self, message: &DynamicMessage, _field: &FieldDescriptor) -> bool {
        let descriptor = message.descriptor();
        self.should_validate(message, &descriptor)
    }
}

/// A filter that always validates everything.
pub(crate) struct NopFilter;

impl Filter for NopFilter {
    fn should_validate(&self, _message: &DynamicMessage, _descriptor: &MessageDescriptor) -> bool {
        true
    }
}

/// Runtime configuration passed to constraints during validation.
pub(crate) struct ValidationConfig {
    pub fail_fast: bool,
    pub filter: Arc<dyn Filter>,
}

impl ValidationConfig {
    /// Apply per-call options on top of the validator defaults.
    pub(crate) fn with_options(fail_fast: bool, options: &[ValidationOption]) -> Self {
        let mut cfg = Self {
            fail_fast,
            ..Self::default()
        };
        for option in options {
            match option {
                ValidationOption::FailFast => cfg.fail_fast = true,
                ValidationOption::Filter(filter) => cfg.filter = Arc::clone(filter),
            }
        }
        cfg
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            filter: Arc::new(NopFilter),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use prost_reflect::{DynamicMessage, FieldDescriptor, MessageDescriptor};

    use super::{Filter, ValidationConfig, ValidationOption};
    use crate::test_support::{message, person};

    struct SkipAddress;

    impl Filter for SkipAddress {
        fn should_validate(&self, _message: &DynamicMessage, descriptor: &MessageDescriptor) -> bool {
            descriptor.full_name() != "test.Address"
        }

        fn should_validate_field(&self, _message: &DynamicMessage, field: &FieldDescriptor) -> bool {
            field.name() != "age"
        }
    }

    #[test]
    fn per_call_options_override_defaults() {
        let cfg = ValidationConfig::with_options(
            false,
            &[
                ValidationOption::FailFast,
                ValidationOption::Filter(Arc::new(SkipAddress)),
            ],
        );
        assert!(cfg.fail_fast);
        assert!(!cfg.filter.should_validate(
            &DynamicMessage::new(message("test.Address")),
            &message("test.Address")
        ));
    }

    #[test]
    fn field_filter_defaults_to_message_filter() {
        struct OnlyPerson;
        impl Filter for OnlyPerson {
            fn should_validate(&self, _m: &DynamicMessage, d: &MessageDescriptor) -> bool {
                d.full_name() == "test.Person"
            }
        }
        let age = message("test.Person")
            .get_field_by_name("age")
            .expect("age exists");
        assert!(OnlyPerson.should_validate_field(&person(), &age));
        assert!(!SkipAddress.should_validate_field(&person(), &age));
    }
}
