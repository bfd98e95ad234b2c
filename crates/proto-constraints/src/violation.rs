use std::fmt;

use prost_reflect::Value;

use proto_constraints_types::FieldPath;

/// A single instance where a constraint was not met.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct ConstraintViolation {
    /// Message template with `%s` placeholders.
    msg_format: String,

    /// Values for the placeholders of `msg_format`.
    params: Vec<String>,

    /// Full name of the message type declaring the violated field.
    type_name: String,

    /// Field names from the validated root message to the violating field.
    field_path: Vec<String>,

    /// The value that failed validation, when available.
    field_value: Option<Value>,

    /// Violations of a nested message, for composite constraints.
    violations: Vec<ConstraintViolation>,
}

impl ConstraintViolation {
    /// Create a violation of `type_name` at `field_path`.
    pub fn new(
        type_name: impl Into<String>,
        field_path: Vec<String>,
        msg_format: impl Into<String>,
    ) -> Self {
        Self {
            msg_format: msg_format.into(),
            params: Vec::new(),
            type_name: type_name.into(),
            field_path,
            field_value: None,
            violations: Vec::new(),
        }
    }

    /// Set the placeholder values.
    #[must_use]
    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Attach the offending value.
    #[must_use]
    pub fn with_field_value(mut self, value: Value) -> Self {
        self.field_value = Some(value);
        self
    }

    /// Attach the violations found inside a nested message.
    #[must_use]
    pub fn with_violations(mut self, violations: Vec<ConstraintViolation>) -> Self {
        self.violations = violations;
        self
    }

    /// Returns the message template.
    #[must_use]
    pub fn msg_format(&self) -> &str {
        &self.msg_format
    }

    /// Returns the placeholder values.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Returns the full name of the violating message type.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the field path segments.
    #[must_use]
    pub fn field_path(&self) -> &[String] {
        &self.field_path
    }

    /// Returns the offending value, when captured.
    #[must_use]
    pub fn field_value(&self) -> Option<&Value> {
        self.field_value.as_ref()
    }

    /// Returns the nested violations.
    #[must_use]
    pub fn violations(&self) -> &[ConstraintViolation] {
        &self.violations
    }

    /// Returns `msg_format` with its placeholders substituted.
    #[must_use]
    pub fn message(&self) -> String {
        format_message(&self.msg_format, &self.params)
    }

    /// Prepend a parent field name to this violation and all nested ones.
    pub(crate) fn prepend_path(&mut self, parent: &str) {
        self.field_path.insert(0, parent.to_string());
        for nested in &mut self.violations {
            nested.prepend_path(parent);
        }
    }

    /// Serialize into the wire-compatible message.
    ///
    /// The field value is carried as text.
    #[must_use]
    pub fn to_proto(&self) -> proto_constraints_types::ConstraintViolation {
        proto_constraints_types::ConstraintViolation {
            msg_format: self.msg_format.clone(),
            param: self.params.clone(),
            type_name: self.type_name.clone(),
            field_path: Some(FieldPath::from_segments(self.field_path.iter().cloned())),
            field_value: self
                .field_value
                .as_ref()
                .map(render_value)
                .unwrap_or_default(),
            violation: self.violations.iter().map(Self::to_proto).collect(),
        }
    }

    /// Rebuild a violation from its wire form.
    ///
    /// The textual field value cannot be mapped back to a typed value and is
    /// dropped.
    #[must_use]
    pub fn from_proto(proto: &proto_constraints_types::ConstraintViolation) -> Self {
        Self {
            msg_format: proto.msg_format.clone(),
            params: proto.param.clone(),
            type_name: proto.type_name.clone(),
            field_path: proto
                .field_path
                .as_ref()
                .map(|p| p.field_name.clone())
                .unwrap_or_default(),
            field_value: None,
            violations: proto.violation.iter().map(Self::from_proto).collect(),
        }
    }
}

/// Substitute `%s` placeholders in order. Placeholders without a matching
/// param are kept verbatim.
pub(crate) fn format_message(msg_format: &str, params: &[String]) -> String {
    let mut out = String::with_capacity(msg_format.len());
    let mut params = params.iter();
    let mut rest = msg_format;
    while let Some(idx) = rest.find("%s") {
        out.push_str(&rest[..idx]);
        match params.next() {
            Some(param) => out.push_str(param),
            None => out.push_str("%s"),
        }
        rest = &rest[idx + 2..];
    }
    out.push_str(rest);
    out
}

pub(crate) fn render_value(value: &Value) -> String {
    match value {
        Value::Bool(v) => v.to_string(),
        Value::I32(v) | Value::EnumNumber(v) => v.to_string(),
        Value::I64(v) => v.to_string(),
        Value::U32(v) => v.to_string(),
        Value::U64(v) => v.to_string(),
        Value::F32(v) => v.to_string(),
        Value::F64(v) => v.to_string(),
        Value::String(v) => v.clone(),
        other => format!("{other:?}"),
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name)?;
        if !self.field_path.is_empty() {
            write!(f, ".{}", self.field_path.join("."))?;
        }
        write!(f, ": {}", self.message())
    }
}
