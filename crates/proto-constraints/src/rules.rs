//! Typed option values, keyed by fully-qualified field and message names.
//!
//! Rules are usually supplied in JSON:
//!
//! ```json
//! {
//!   "fields": {
//!     "acme.Person.age": { "min": { "value": 0 }, "max": { "value": 150, "exclusive": true } },
//!     "acme.Person.email": { "required": true, "pattern": { "regex": ".+@.+" } },
//!     "acme.Person.address": { "validate": true }
//!   },
//!   "messages": {
//!     "acme.Person": { "required_field": "email | phone" }
//!   }
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use prost_reflect::{FieldDescriptor, MessageDescriptor};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use crate::constraint::CustomRule;
use crate::error::CompilationError;

/// Options of a single field. Every option left at its default is inactive.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldRules {
    /// The field must be set.
    pub required: bool,
    /// Message template overriding the `required` default.
    pub if_missing: Option<String>,
    /// Lower bound for numbers.
    pub min: Option<BoundOption>,
    /// Upper bound for numbers.
    pub max: Option<BoundOption>,
    /// Both bounds in range notation, e.g. `[0..150)`. Exclusive with
    /// `min` and `max`.
    pub range: Option<String>,
    /// Strings must match this expression.
    pub pattern: Option<PatternOption>,
    /// No element of a non-empty collection may be default.
    pub all_required: bool,
    /// Nested messages must be valid.
    pub validate: bool,
    /// User-defined options by rule name.
    pub custom: BTreeMap<String, serde_json::Value>,
}

/// A `min` or `max` option.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoundOption {
    /// Decimal literal of the limit. JSON numbers are accepted as well.
    #[serde(deserialize_with = "number_literal")]
    pub value: String,
    /// Whether the limit value itself is rejected.
    #[serde(default)]
    pub exclusive: bool,
    /// Message template overriding the range default.
    #[serde(default)]
    pub error_msg: Option<String>,
}

impl BoundOption {
    /// An inclusive limit.
    pub fn new(value: impl fmt::Display) -> Self {
        Self {
            value: value.to_string(),
            exclusive: false,
            error_msg: None,
        }
    }

    /// Reject the limit value itself.
    #[must_use]
    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }
}

/// A `pattern` option.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternOption {
    /// The regular expression the whole string must match.
    pub regex: String,
    /// Message template overriding the pattern default.
    #[serde(default)]
    pub error_msg: Option<String>,
}

impl PatternOption {
    /// A pattern with the default message.
    pub fn new(regex: impl Into<String>) -> Self {
        Self {
            regex: regex.into(),
            error_msg: None,
        }
    }
}

/// Options of a message type.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MessageRules {
    /// Alternatives of fields that must be set, e.g. `email | phone & name`.
    pub required_field: Option<String>,
}

fn number_literal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a number or numeric string, found {other}"
        ))),
    }
}

#[derive(Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RulesDocument {
    fields: HashMap<String, FieldRules>,
    messages: HashMap<String, MessageRules>,
}

/// Registry of field options, message options and custom rules.
#[derive(Clone, Default)]
pub struct Rules {
    fields: HashMap<String, FieldRules>,
    messages: HashMap<String, MessageRules>,
    custom: HashMap<String, Arc<dyn CustomRule>>,
}

impl Rules {
    /// An empty registry: every message is valid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse field and message options from JSON.
    ///
    /// # Errors
    ///
    /// Returns a `CompilationError` if the document is malformed or uses an
    /// unknown option.
    pub fn from_json(json: &str) -> Result<Self, CompilationError> {
        let doc: RulesDocument = serde_json::from_str(json)
            .map_err(|err| CompilationError::new(format!("invalid rules document: {err}")))?;
        Ok(Self {
            fields: doc.fields,
            messages: doc.messages,
            custom: HashMap::new(),
        })
    }

    /// Set the options of a field, by full name (`package.Message.field`).
    #[must_use]
    pub fn field(mut self, full_name: impl Into<String>, rules: FieldRules) -> Self {
        self.fields.insert(full_name.into(), rules);
        self
    }

    /// Set the options of a message type, by full name.
    #[must_use]
    pub fn message(mut self, full_name: impl Into<String>, rules: MessageRules) -> Self {
        self.messages.insert(full_name.into(), rules);
        self
    }

    /// Register a custom rule under its name.
    #[must_use]
    pub fn custom_rule(mut self, rule: Arc<dyn CustomRule>) -> Self {
        self.custom.insert(rule.name().to_string(), rule);
        self
    }

    /// Options of `field`, if any.
    #[must_use]
    pub fn field_rules(&self, field: &FieldDescriptor) -> Option<&FieldRules> {
        self.fields.get(field.full_name())
    }

    /// Options of `message`, if any.
    #[must_use]
    pub fn message_rules(&self, message: &MessageDescriptor) -> Option<&MessageRules> {
        self.messages.get(message.full_name())
    }

    /// The custom rule registered as `name`.
    #[must_use]
    pub fn custom(&self, name: &str) -> Option<&Arc<dyn CustomRule>> {
        self.custom.get(name)
    }
}

impl fmt::Debug for Rules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut custom: Vec<_> = self.custom.keys().collect();
        custom.sort();
        f.debug_struct("Rules")
            .field("fields", &self.fields.len())
            .field("messages", &self.messages.len())
            .field("custom", &custom)
            .finish()
    }
}
