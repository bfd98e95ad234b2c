use std::fmt::Write as _;

use prost_reflect::Kind;

use crate::boundary::{Boundary, ComparableNumber, NumberBoundaries};
use crate::constraint::{
    AllRequired, CompositeConstraint, CustomOption, FieldConstraint, Pattern, Required,
    RequiredFieldConstraint,
};
use crate::error::CompilationError;
use crate::field::FieldDeclaration;

use super::ConstraintTranslator;
use super::describe;

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "static", "struct", "trait", "true", "try", "type", "unsafe", "use",
    "where", "while", "yield",
];

/// Emits a Rust function that checks a `prost`-generated struct.
///
/// For a message `acme.Person` the output is a function
/// `validate_person(msg: &Person) -> Vec<&'static str>` returning one
/// description per failed check. Nested messages marked `validate` call the
/// function generated for their own type, which must be in scope.
///
/// Custom rules are translated through [`CustomRule::rust_check`]; a rule
/// without a code form fails the whole translation.
///
/// [`CustomRule::rust_check`]: crate::CustomRule::rust_check
#[derive(Debug)]
pub struct RustCheckTranslator {
    type_name: String,
    checks: Vec<(String, String)>,
    errors: Vec<String>,
}

impl RustCheckTranslator {
    /// Translate the constraints of `type_name`.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            checks: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn push(&mut self, condition: String, description: String) {
        self.checks.push((condition, description));
    }
}

/// Name of the generated function for a message type.
pub(crate) fn function_name(type_name: &str) -> String {
    format!("validate_{}", snake_case(short_name(type_name)))
}

fn short_name(type_name: &str) -> &str {
    type_name.rsplit('.').next().unwrap_or(type_name)
}

fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower) {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }
    out
}

fn access(field: &FieldDeclaration) -> String {
    let name = field.name();
    if KEYWORDS.contains(&name) {
        format!("msg.r#{name}")
    } else {
        format!("msg.{name}")
    }
}

/// Whether the generated struct wraps the field in `Option`.
fn is_optional(field: &FieldDeclaration) -> bool {
    !field.is_collection() && (field.is_message() || field.descriptor().supports_presence())
}

/// An iterator expression over the elements of the field, yielding references.
fn elements(field: &FieldDeclaration) -> String {
    let access = access(field);
    if field.is_map() {
        format!("{access}.values()")
    } else if field.is_repeated() || is_optional(field) {
        format!("{access}.iter()")
    } else {
        format!("std::iter::once(&{access})")
    }
}

fn all_elements(field: &FieldDeclaration, condition: &str) -> String {
    format!("{}.all(|v| {condition})", elements(field))
}

fn is_float(field: &FieldDeclaration) -> bool {
    matches!(field.element_kind(), Kind::Float | Kind::Double)
}

/// A non-default check on one element bound to `v`.
fn element_is_set(field: &FieldDeclaration) -> &'static str {
    if matches!(field.element_kind(), Kind::String | Kind::Bytes) {
        "!v.is_empty()"
    } else {
        "*v != Default::default()"
    }
}

/// The check `required` performs, as an expression over `msg`.
fn is_set(field: &FieldDeclaration) -> String {
    let access = access(field);
    if field.is_collection() {
        format!("!{access}.is_empty()")
    } else if is_optional(field) {
        format!("{access}.as_ref().is_some_and(|v| {})", element_is_set(field))
    } else if matches!(field.element_kind(), Kind::String | Kind::Bytes) {
        format!("!{access}.is_empty()")
    } else {
        format!("{access} != Default::default()")
    }
}

fn bound_check(field: &FieldDeclaration, bound: &Boundary, lower: bool) -> String {
    let op = match (lower, bound.is_inclusive()) {
        (true, true) => ">=",
        (true, false) => ">",
        (false, true) => "<=",
        (false, false) => "<",
    };
    let value = bound.value();
    if is_float(field) {
        let literal = match value {
            ComparableNumber::Int(v) => format!("{v}.0"),
            ComparableNumber::UInt(v) => format!("{v}.0"),
            ComparableNumber::Float(v) => format!("{v:?}"),
        };
        return format!("*v {op} {literal}");
    }
    match value {
        ComparableNumber::Int(v) => format!("i128::from(*v) {op} {v}"),
        ComparableNumber::UInt(v) => format!("i128::from(*v) {op} {v}"),
        ComparableNumber::Float(v) => match integral_bound(v, lower, bound.is_inclusive()) {
            Some(whole) => format!("i128::from(*v) {op} {whole}"),
            None => format!("(*v as f64) {op} {v:?}"),
        },
    }
}

/// The integer an integer field is compared against in place of a float
/// bound, keeping the operator: `>= 2.5` becomes `>= 3`, `< 2.5` becomes
/// `< 3`, `> 2.5` and `<= 2.5` compare against `2`.
#[allow(clippy::cast_possible_truncation)]
fn integral_bound(value: f64, lower: bool, inclusive: bool) -> Option<i128> {
    let whole = if lower == inclusive {
        value.ceil()
    } else {
        value.floor()
    };
    (whole.is_finite() && whole.abs() < 1e38).then_some(whole as i128)
}

impl ConstraintTranslator for RustCheckTranslator {
    type Output = String;

    fn visit_required(&mut self, constraint: &FieldConstraint<Required>) {
        self.push(is_set(constraint.field()), describe::required_line(constraint));
    }

    fn visit_range(&mut self, constraint: &FieldConstraint<NumberBoundaries>) {
        let field = constraint.field();
        let bounds = constraint.option_value();
        let mut parts = Vec::new();
        if let Some(min) = bounds.min() {
            parts.push(bound_check(field, min, true));
        }
        if let Some(max) = bounds.max() {
            parts.push(bound_check(field, max, false));
        }
        if parts.is_empty() {
            self.errors.push(format!(
                "range on {}.{} has no bounds",
                field.type_name(),
                field.name()
            ));
            return;
        }
        self.push(
            all_elements(field, &parts.join(" && ")),
            describe::range_line(constraint),
        );
    }

    fn visit_pattern(&mut self, constraint: &FieldConstraint<Pattern>) {
        let regex = format!("^(?:{})$", constraint.option_value().as_str());
        let condition = format!(
            "v.is_empty() || ::regex::Regex::new({regex:?}).is_ok_and(|re| re.is_match(v))"
        );
        self.push(
            all_elements(constraint.field(), &condition),
            describe::pattern_line(constraint),
        );
    }

    fn visit_all_required(&mut self, constraint: &FieldConstraint<AllRequired>) {
        let field = constraint.field();
        let condition = format!(
            "{}.is_empty() || {}",
            access(field),
            all_elements(field, element_is_set(field))
        );
        self.push(condition, describe::all_required_line(constraint));
    }

    fn visit_custom(&mut self, constraint: &FieldConstraint<CustomOption>) {
        let option = constraint.option_value();
        match option.rule().rust_check(option.value(), "v") {
            Some(check) => self.push(
                all_elements(constraint.field(), &check),
                describe::custom_line(constraint),
            ),
            None => self.errors.push(format!(
                "custom option `{}` on {}.{} has no Rust form",
                constraint.option_name(),
                constraint.field().type_name(),
                constraint.field().name()
            )),
        }
    }

    fn visit_composite(&mut self, constraint: &CompositeConstraint) {
        let check = format!(
            "{}(v).is_empty()",
            function_name(constraint.message().type_name())
        );
        self.push(
            all_elements(constraint.field(), &check),
            describe::composite_line(constraint),
        );
    }

    fn visit_required_field(&mut self, constraint: &RequiredFieldConstraint) {
        let alternatives: Vec<String> = constraint
            .alternatives()
            .iter()
            .map(|group| {
                let checks: Vec<String> = group.iter().map(is_set).collect();
                format!("({})", checks.join(" && "))
            })
            .collect();
        self.push(
            alternatives.join(" || "),
            describe::required_field_line(constraint),
        );
    }

    fn finish(self) -> Result<Self::Output, CompilationError> {
        if !self.errors.is_empty() {
            return Err(CompilationError::new(self.errors.join("; ")));
        }

        let mut out = String::new();
        let _ = writeln!(out, "/// Checks generated for `{}`.", self.type_name);
        let _ = writeln!(
            out,
            "pub fn {}(msg: &{}) -> Vec<&'static str> {{",
            function_name(&self.type_name),
            short_name(&self.type_name)
        );
        out.push_str("    let mut violations: Vec<&'static str> = Vec::new();\n");
        for (condition, description) in &self.checks {
            let _ = writeln!(out, "    if !({condition}) {{");
            let _ = writeln!(out, "        violations.push({description:?});");
            out.push_str("    }\n");
        }
        out.push_str("    violations\n}\n");
        Ok(out)
    }
}
