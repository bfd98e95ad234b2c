use std::fmt;

use prost_reflect::{DynamicMessage, FieldDescriptor, Kind, MapKey, ReflectMessage, Value};

use crate::violation::ConstraintViolation;

/// A constrained field: its descriptor plus the identity of the message
/// type that declares it.
#[derive(Clone, PartialEq, Eq)]
pub struct FieldDeclaration {
    descriptor: FieldDescriptor,
    type_name: String,
    index: usize,
}

impl FieldDeclaration {
    /// Wrap a field descriptor.
    #[must_use]
    pub fn new(descriptor: FieldDescriptor) -> Self {
        let message = descriptor.parent_message();
        let index = message
            .fields()
            .position(|f| f.number() == descriptor.number())
            .unwrap_or_default();
        Self {
            type_name: message.full_name().to_string(),
            descriptor,
            index,
        }
    }

    /// The underlying descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    /// Full name of the declaring message type.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The field name as declared.
    #[must_use]
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Position of the field in its message's declaration order.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether the field is `repeated` (maps excluded).
    #[must_use]
    pub fn is_repeated(&self) -> bool {
        self.descriptor.is_list()
    }

    /// Whether the field is a `map`.
    #[must_use]
    pub fn is_map(&self) -> bool {
        self.descriptor.is_map()
    }

    /// Whether the field holds several values.
    #[must_use]
    pub fn is_collection(&self) -> bool {
        self.is_repeated() || self.is_map()
    }

    /// Kind of a single element. For maps this is the value kind.
    #[must_use]
    pub fn element_kind(&self) -> Kind {
        let kind = self.descriptor.kind();
        if self.is_map() {
            if let Some(entry) = kind.as_message() {
                return entry.map_entry_value_field().kind();
            }
        }
        kind
    }

    /// Whether elements are numbers.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self.element_kind(),
            Kind::Double
                | Kind::Float
                | Kind::Int32
                | Kind::Int64
                | Kind::Uint32
                | Kind::Uint64
                | Kind::Sint32
                | Kind::Sint64
                | Kind::Fixed32
                | Kind::Fixed64
                | Kind::Sfixed32
                | Kind::Sfixed64
        )
    }

    /// Whether elements are strings.
    #[must_use]
    pub fn is_string(&self) -> bool {
        matches!(self.element_kind(), Kind::String)
    }

    /// Whether elements are messages.
    #[must_use]
    pub fn is_message(&self) -> bool {
        matches!(self.element_kind(), Kind::Message(_))
    }

    /// Read the field of `msg` as a collection.
    ///
    /// Repeated fields yield every element and maps yield their values
    /// ordered by key. Singular fields yield one value, except fields with
    /// explicit presence that are not set, which yield none.
    #[must_use]
    pub fn values(&self, msg: &DynamicMessage) -> FieldValues {
        if !self.is_collection()
            && self.descriptor.supports_presence()
            && !msg.has_field(&self.descriptor)
        {
            return FieldValues {
                values: Vec::new(),
                collection: false,
            };
        }
        let value = msg.get_field(&self.descriptor);
        let values = match value.as_ref() {
            Value::List(items) => items.clone(),
            Value::Map(entries) => {
                let mut entries: Vec<(&MapKey, &Value)> = entries.iter().collect();
                entries.sort_by_key(|(key, _)| map_key_order(key));
                entries.into_iter().map(|(_, v)| v.clone()).collect()
            }
            single => vec![single.clone()],
        };
        FieldValues {
            values,
            collection: self.is_collection(),
        }
    }

    /// Start a violation of this field.
    pub fn violation(&self, msg_format: impl Into<String>) -> ConstraintViolation {
        ConstraintViolation::new(
            self.type_name.clone(),
            vec![self.name().to_string()],
            msg_format,
        )
    }
}

impl fmt::Debug for FieldDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDeclaration")
            .field("type_name", &self.type_name)
            .field("name", &self.name())
            .field("index", &self.index)
            .finish()
    }
}

/// Sort key giving maps a stable iteration order.
fn map_key_order(key: &MapKey) -> (u8, i128, String) {
    match key {
        MapKey::Bool(b) => (0, i128::from(*b), String::new()),
        MapKey::I32(v) => (1, i128::from(*v), String::new()),
        MapKey::I64(v) => (1, i128::from(*v), String::new()),
        MapKey::U32(v) => (1, i128::from(*v), String::new()),
        MapKey::U64(v) => (1, i128::from(*v), String::new()),
        MapKey::String(s) => (2, 0, s.clone()),
    }
}

/// The runtime values of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValues {
    values: Vec<Value>,
    collection: bool,
}

impl FieldValues {
    /// All values, in field order.
    #[must_use]
    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether the values come from a repeated or map field.
    #[must_use]
    pub fn is_collection(&self) -> bool {
        self.collection
    }

    /// Iterate over the values.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    /// Whether the field counts as not set: no values at all, an empty
    /// collection, or a singular value equal to its default.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        if self.collection || self.values.is_empty() {
            self.values.is_empty()
        } else {
            self.values.iter().all(is_default_value)
        }
    }

    /// Split into `(default, non_default)` values.
    #[must_use]
    pub fn partition_defaults(&self) -> (Vec<&Value>, Vec<&Value>) {
        self.values.iter().partition(|v| is_default_value(v))
    }
}

impl<'a> IntoIterator for &'a FieldValues {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Whether `value` equals the Protobuf default for its type.
///
/// Messages are default when none of their fields is set.
#[must_use]
pub fn is_default_value(value: &Value) -> bool {
    match value {
        Value::Bool(v) => !v,
        Value::I32(v) | Value::EnumNumber(v) => *v == 0,
        Value::I64(v) => *v == 0,
        Value::U32(v) => *v == 0,
        Value::U64(v) => *v == 0,
        Value::F32(v) => *v == 0.0,
        Value::F64(v) => *v == 0.0,
        Value::String(v) => v.is_empty(),
        Value::Bytes(v) => v.is_empty(),
        Value::Message(m) => m.descriptor().fields().all(|f| !m.has_field(&f)),
        Value::List(v) => v.is_empty(),
        Value::Map(v) => v.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use prost_reflect::{DynamicMessage, Value};

    use super::{FieldDeclaration, is_default_value};
    use crate::test_support::{address, field, message, person};

    #[test]
    fn declaration_reports_owner_and_index() {
        let age = field("test.Person", "age");
        assert_eq!(age.type_name(), "test.Person");
        assert_eq!(age.name(), "age");
        assert_eq!(age.index(), 1);
        assert!(age.is_numeric());
        assert!(!age.is_collection());

        let labels = field("test.Person", "labels");
        assert!(labels.is_map());
        assert!(labels.is_string());
    }

    #[test]
    fn singular_field_reads_as_one_element() {
        let msg = person();
        let values = field("test.Person", "name").values(&msg);
        assert_eq!(values.as_slice(), [Value::String(String::new())]);
        assert!(!values.is_collection());
    }

    #[test]
    fn unset_optional_scalar_has_no_values() {
        let rank = field("test.Person", "rank");
        let mut msg = person();
        let values = rank.values(&msg);
        assert!(values.is_empty());
        assert!(values.is_unset());

        msg.set_field_by_name("rank", Value::I32(0));
        let values = rank.values(&msg);
        assert_eq!(values.as_slice(), [Value::I32(0)]);
        assert!(values.is_unset());

        msg.set_field_by_name("rank", Value::I32(7));
        assert!(!rank.values(&msg).is_unset());
    }

    #[test]
    fn unset_message_field_has_no_values() {
        let values = field("test.Person", "address").values(&person());
        assert!(values.is_empty());
        assert!(values.is_unset());
    }

    #[test]
    fn map_values_are_ordered_by_key() {
        let mut msg = person();
        let labels = field("test.Person", "labels");
        let mut map = std::collections::HashMap::new();
        map.insert(
            prost_reflect::MapKey::String("b".to_string()),
            Value::String("2".to_string()),
        );
        map.insert(
            prost_reflect::MapKey::String("a".to_string()),
            Value::String("1".to_string()),
        );
        msg.set_field(labels.descriptor(), Value::Map(map));

        let values = labels.values(&msg);
        assert_eq!(
            values.as_slice(),
            [Value::String("1".to_string()), Value::String("2".to_string())]
        );
    }

    #[test]
    fn default_detection_covers_messages() {
        let empty = DynamicMessage::new(message("test.Address"));
        assert!(is_default_value(&Value::Message(empty)));
        assert!(!is_default_value(&Value::Message(address("Kyiv"))));
        assert!(is_default_value(&Value::F64(0.0)));
        assert!(!is_default_value(&Value::I64(-1)));
    }

    #[test]
    fn violation_starts_at_the_field() {
        let decl = FieldDeclaration::new(
            message("test.Person")
                .get_field_by_name("tags")
                .expect("tags field exists"),
        );
        let violation = decl.violation("x");
        assert_eq!(violation.type_name(), "test.Person");
        assert_eq!(violation.field_path(), ["tags"]);
    }
}
