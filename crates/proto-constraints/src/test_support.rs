//! In-memory descriptors shared by unit tests.
//!
//! ```proto
//! syntax = "proto3";
//! package test;
//!
//! enum Status { STATUS_UNKNOWN = 0; ACTIVE = 1; }
//!
//! message Person {
//!   string name = 1;
//!   int32 age = 2;
//!   repeated string tags = 3;
//!   repeated int64 scores = 4;
//!   Address address = 5;
//!   repeated Address previous = 6;
//!   map<string, string> labels = 7;
//!   double ratio = 8;
//!   string email = 9;
//!   string phone = 10;
//!   Status status = 11;
//!   bool active = 12;
//!   uint64 visits = 13;
//!   optional int32 rank = 14;
//! }
//!
//! message Address { string city = 1; string zip = 2; Geo geo = 3; }
//! message Geo { double lat = 1; double lon = 2; }
//! message Node { string id = 1; Node next = 2; }
//! ```

use std::sync::LazyLock;

use prost_reflect::{DescriptorPool, DynamicMessage, MessageDescriptor, Value};
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, FileDescriptorSet, MessageOptions, OneofDescriptorProto,
};

use crate::constraint::{CustomOption, CustomRule, FieldConstraint};
use crate::field::{FieldDeclaration, FieldValues};
use crate::violation::ConstraintViolation;

pub(crate) static TEST_POOL: LazyLock<DescriptorPool> = LazyLock::new(|| {
    DescriptorPool::from_file_descriptor_set(FileDescriptorSet {
        file: vec![test_file()],
    })
    .expect("test descriptors must be valid")
});

fn field_proto(name: &str, number: i32, label: Label, ty: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(label as i32),
        r#type: Some(ty as i32),
        json_name: Some(name.to_string()),
        ..Default::default()
    }
}

fn scalar(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    field_proto(name, number, Label::Optional, ty)
}

fn repeated(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    field_proto(name, number, Label::Repeated, ty)
}

/// A proto3 `optional` scalar, backed by the synthetic oneof at `oneof_index`.
fn optional(name: &str, number: i32, ty: Type, oneof_index: i32) -> FieldDescriptorProto {
    FieldDescriptorProto {
        oneof_index: Some(oneof_index),
        proto3_optional: Some(true),
        ..scalar(name, number, ty)
    }
}

fn typed(mut field: FieldDescriptorProto, type_name: &str) -> FieldDescriptorProto {
    field.type_name = Some(type_name.to_string());
    field
}

fn message_proto(name: &str, field: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field,
        ..Default::default()
    }
}

fn test_file() -> FileDescriptorProto {
    let labels_entry = DescriptorProto {
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..message_proto(
            "LabelsEntry",
            vec![scalar("key", 1, Type::String), scalar("value", 2, Type::String)],
        )
    };

    let person = DescriptorProto {
        nested_type: vec![labels_entry],
        oneof_decl: vec![OneofDescriptorProto {
            name: Some("_rank".to_string()),
            ..Default::default()
        }],
        ..message_proto(
            "Person",
            vec![
                scalar("name", 1, Type::String),
                scalar("age", 2, Type::Int32),
                repeated("tags", 3, Type::String),
                repeated("scores", 4, Type::Int64),
                typed(scalar("address", 5, Type::Message), ".test.Address"),
                typed(repeated("previous", 6, Type::Message), ".test.Address"),
                typed(repeated("labels", 7, Type::Message), ".test.Person.LabelsEntry"),
                scalar("ratio", 8, Type::Double),
                scalar("email", 9, Type::String),
                scalar("phone", 10, Type::String),
                typed(scalar("status", 11, Type::Enum), ".test.Status"),
                scalar("active", 12, Type::Bool),
                scalar("visits", 13, Type::Uint64),
                optional("rank", 14, Type::Int32, 0),
            ],
        )
    };

    let address = message_proto(
        "Address",
        vec![
            scalar("city", 1, Type::String),
            scalar("zip", 2, Type::String),
            typed(scalar("geo", 3, Type::Message), ".test.Geo"),
        ],
    );
    let geo = message_proto(
        "Geo",
        vec![scalar("lat", 1, Type::Double), scalar("lon", 2, Type::Double)],
    );
    let node = message_proto(
        "Node",
        vec![
            scalar("id", 1, Type::String),
            typed(scalar("next", 2, Type::Message), ".test.Node"),
        ],
    );

    let status = EnumDescriptorProto {
        name: Some("Status".to_string()),
        value: vec![
            EnumValueDescriptorProto {
                name: Some("STATUS_UNKNOWN".to_string()),
                number: Some(0),
                ..Default::default()
            },
            EnumValueDescriptorProto {
                name: Some("ACTIVE".to_string()),
                number: Some(1),
                ..Default::default()
            },
        ],
        ..Default::default()
    };

    FileDescriptorProto {
        name: Some("test/test.proto".to_string()),
        package: Some("test".to_string()),
        message_type: vec![person, address, geo, node],
        enum_type: vec![status],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    }
}

pub(crate) fn message(name: &str) -> MessageDescriptor {
    TEST_POOL
        .get_message_by_name(name)
        .expect("test message must exist")
}

pub(crate) fn field(message_name: &str, field_name: &str) -> FieldDeclaration {
    FieldDeclaration::new(
        message(message_name)
            .get_field_by_name(field_name)
            .expect("test field must exist"),
    )
}

pub(crate) fn person() -> DynamicMessage {
    DynamicMessage::new(message("test.Person"))
}

pub(crate) fn address(city: &str) -> DynamicMessage {
    let mut msg = DynamicMessage::new(message("test.Address"));
    msg.set_field_by_name("city", Value::String(city.to_string()));
    msg
}

pub(crate) fn strings(items: &[&str]) -> Value {
    Value::List(items.iter().map(|s| Value::String((*s).to_string())).collect())
}

/// Strings may not be longer than the option value.
pub(crate) struct MaxLength;

impl CustomRule for MaxLength {
    fn name(&self) -> &str {
        "max_length"
    }

    fn msg_format(&self) -> &str {
        "The string must be at most %s characters long."
    }

    fn validate(
        &self,
        constraint: &FieldConstraint<CustomOption>,
        values: &FieldValues,
    ) -> Vec<ConstraintViolation> {
        let limit = constraint.option_value().value().as_u64().unwrap_or(u64::MAX);
        values
            .iter()
            .filter(|v| matches!(v, Value::String(s) if s.chars().count() as u64 > limit))
            .map(|v| {
                constraint
                    .field()
                    .violation(constraint.error_message())
                    .with_params([limit.to_string()])
                    .with_field_value(v.clone())
            })
            .collect()
    }

    fn rust_check(&self, option: &serde_json::Value, access: &str) -> Option<String> {
        option
            .as_u64()
            .map(|limit| format!("{access}.chars().count() <= {limit}"))
    }
}
