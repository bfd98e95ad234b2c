//! Wire-compatible Protobuf messages describing constraint violations.
//!
//! These are the machine-readable counterparts of the `proto-constraints`
//! runtime types. They are declared with `prost` derives so they can be
//! embedded in RPC error details or persisted without a separate `.proto`
//! build step.
//!
//! | Message | Field | Tag |
//! |---------|-------|-----|
//! | [`ConstraintViolation`] | `msg_format` | 1 |
//! | | `param` | 2 |
//! | | `type_name` | 3 |
//! | | `field_path` | 4 |
//! | | `field_value` | 5 |
//! | | `violation` | 6 |
//! | [`FieldPath`] | `field_name` | 1 |
//! | [`ValidationError`] | `constraint_violation` | 1 |

#![warn(missing_docs)]

/// Path from the root message to a field, one segment per nesting level.
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct FieldPath {
    /// Field names, outermost first.
    #[prost(string, repeated, tag = "1")]
    pub field_name: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}

/// A single failed constraint check.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConstraintViolation {
    /// Message template with `%s` placeholders.
    #[prost(string, tag = "1")]
    pub msg_format: ::prost::alloc::string::String,

    /// Values substituted into `msg_format`, in placeholder order.
    #[prost(string, repeated, tag = "2")]
    pub param: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,

    /// Fully-qualified name of the message type that holds the field.
    #[prost(string, tag = "3")]
    pub type_name: ::prost::alloc::string::String,

    /// Path to the violating field.
    #[prost(message, optional, tag = "4")]
    pub field_path: ::core::option::Option<FieldPath>,

    /// Text rendering of the offending value, empty when not captured.
    #[prost(string, tag = "5")]
    pub field_value: ::prost::alloc::string::String,

    /// Violations found inside a nested message field.
    #[prost(message, repeated, tag = "6")]
    pub violation: ::prost::alloc::vec::Vec<ConstraintViolation>,
}

/// Every violation found while validating one message.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ValidationError {
    /// Violations in field declaration order.
    #[prost(message, repeated, tag = "1")]
    pub constraint_violation: ::prost::alloc::vec::Vec<ConstraintViolation>,
}

impl FieldPath {
    /// Build a path from its segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field_name: segments.into_iter().map(Into::into).collect(),
        }
    }
}
