use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;

use prost_reflect::Value;
use regex::Regex;

use crate::error::CompilationError;

static RANGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([\[(])\s*(\S+?)\s*\.\.\s*(\S+?)\s*([\])])\s*$")
        .expect("range regex must compile")
});

/// A number that compares across integer and floating-point kinds.
///
/// Equality and hashing are structural (`Int(1) != Float(1.0)`); numeric
/// comparison goes through [`ComparableNumber::compare`].
#[derive(Debug, Clone, Copy)]
pub enum ComparableNumber {
    /// A signed integer.
    Int(i64),
    /// An unsigned integer too large for `Int`, or read from an unsigned field.
    UInt(u64),
    /// A floating-point number.
    Float(f64),
}

impl ComparableNumber {
    /// Numeric comparison. Returns `None` when either side is NaN.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (*self, *other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(&b)),
            (Self::UInt(a), Self::UInt(b)) => Some(a.cmp(&b)),
            (Self::Int(a), Self::UInt(b)) => Some(match u64::try_from(a) {
                Ok(a) => a.cmp(&b),
                Err(_) => Ordering::Less,
            }),
            (Self::UInt(_), Self::Int(_)) => other.compare(self).map(Ordering::reverse),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(&b),
            (Self::Int(a), Self::Float(b)) => Self::compare_exact(i128::from(a), b),
            (Self::UInt(a), Self::Float(b)) => Self::compare_exact(i128::from(a), b),
            (Self::Float(_), Self::Int(_) | Self::UInt(_)) => {
                other.compare(self).map(Ordering::reverse)
            }
        }
    }

    /// Read a numeric scalar value. Returns `None` for non-numeric values.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::I32(v) => Some(Self::Int(i64::from(*v))),
            Value::I64(v) => Some(Self::Int(*v)),
            Value::U32(v) => Some(Self::UInt(u64::from(*v))),
            Value::U64(v) => Some(Self::UInt(*v)),
            Value::F32(v) => Some(Self::Float(f64::from(*v))),
            Value::F64(v) => Some(Self::Float(*v)),
            _ => None,
        }
    }

    // Integer against float without rounding the integer. The integral part
    // of `b` saturates into `i128`, which covers every `i64` and `u64`.
    #[allow(clippy::cast_possible_truncation)]
    fn compare_exact(a: i128, b: f64) -> Option<Ordering> {
        if b.is_nan() {
            return None;
        }
        let whole = b.trunc();
        match a.cmp(&(whole as i128)) {
            Ordering::Equal => 0.0_f64.partial_cmp(&(b - whole)),
            unequal => Some(unequal),
        }
    }

    fn normalized_bits(v: f64) -> u64 {
        if v == 0.0 { 0.0_f64.to_bits() } else { v.to_bits() }
    }
}

impl PartialEq for ComparableNumber {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::UInt(a), Self::UInt(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => {
                Self::normalized_bits(*a) == Self::normalized_bits(*b)
            }
            _ => false,
        }
    }
}

impl Eq for ComparableNumber {}

impl Hash for ComparableNumber {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Int(v) => v.hash(state),
            Self::UInt(v) => v.hash(state),
            Self::Float(v) => Self::normalized_bits(*v).hash(state),
        }
    }
}

impl fmt::Display for ComparableNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

impl FromStr for ComparableNumber {
    type Err = CompilationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(v) = s.parse::<i64>() {
            return Ok(Self::Int(v));
        }
        if let Ok(v) = s.parse::<u64>() {
            return Ok(Self::UInt(v));
        }
        match s.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Self::Float(v)),
            _ => Err(CompilationError::new(format!(
                "`{s}` is not a valid numeric boundary"
            ))),
        }
    }
}

macro_rules! comparable_from {
    ($($ty:ty => $variant:ident as $target:ty),* $(,)?) => {
        $(
            impl From<$ty> for ComparableNumber {
                fn from(v: $ty) -> Self {
                    Self::$variant(<$target>::from(v))
                }
            }
        )*
    };
}

comparable_from!(
    i32 => Int as i64,
    i64 => Int as i64,
    u32 => UInt as u64,
    u64 => UInt as u64,
    f32 => Float as f64,
    f64 => Float as f64,
);

/// One numeric limit of a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Boundary {
    value: ComparableNumber,
    inclusive: bool,
}

impl Boundary {
    /// Create a boundary.
    pub fn new(value: impl Into<ComparableNumber>, inclusive: bool) -> Self {
        Self {
            value: value.into(),
            inclusive,
        }
    }

    /// A boundary that admits its own value (`>=` / `<=`).
    pub fn inclusive(value: impl Into<ComparableNumber>) -> Self {
        Self::new(value, true)
    }

    /// A boundary that excludes its own value (`>` / `<`).
    pub fn exclusive(value: impl Into<ComparableNumber>) -> Self {
        Self::new(value, false)
    }

    /// Parse a decimal literal.
    ///
    /// # Errors
    ///
    /// Returns a `CompilationError` if `literal` is not a finite number.
    pub fn parse(literal: &str, inclusive: bool) -> Result<Self, CompilationError> {
        Ok(Self::new(literal.parse::<ComparableNumber>()?, inclusive))
    }

    /// The limit value.
    #[must_use]
    pub fn value(&self) -> ComparableNumber {
        self.value
    }

    /// Whether the limit value itself is admitted.
    #[must_use]
    pub fn is_inclusive(&self) -> bool {
        self.inclusive
    }
}

/// Which side of [`NumberBoundaries`] a value fell outside of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundViolation {
    /// The value is below the lower bound.
    BelowMin(Boundary),
    /// The value is above the upper bound.
    AboveMax(Boundary),
}

/// A pair of optional lower and upper bounds.
///
/// When both bounds are present the lower one never exceeds the upper one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NumberBoundaries {
    min: Option<Boundary>,
    max: Option<Boundary>,
}

impl NumberBoundaries {
    /// Combine two optional bounds.
    ///
    /// # Errors
    ///
    /// Returns a `CompilationError` naming both values if `min` is greater
    /// than `max`.
    pub fn new(min: Option<Boundary>, max: Option<Boundary>) -> Result<Self, CompilationError> {
        if let (Some(lo), Some(hi)) = (&min, &max) {
            match lo.value.compare(&hi.value) {
                Some(Ordering::Less | Ordering::Equal) => {}
                _ => {
                    return Err(CompilationError::new(format!(
                        "inconsistent boundaries: min {} is greater than max {}",
                        lo.value, hi.value
                    )));
                }
            }
        }
        Ok(Self { min, max })
    }

    /// Boundaries that admit every number.
    #[must_use]
    pub const fn unbound() -> Self {
        Self {
            min: None,
            max: None,
        }
    }

    /// Parse the range notation `[lo..hi)`, where `[`/`]` are inclusive and
    /// `(`/`)` are exclusive.
    ///
    /// # Errors
    ///
    /// Returns a `CompilationError` if the text is malformed or the bounds
    /// are inconsistent.
    pub fn parse_range(text: &str) -> Result<Self, CompilationError> {
        let caps = RANGE_REGEX.captures(text).ok_or_else(|| {
            CompilationError::new(format!(
                "`{text}` is not a valid range; expected a form like `[0..10)`"
            ))
        })?;
        let lo = Boundary::parse(&caps[2], &caps[1] == "[")?;
        let hi = Boundary::parse(&caps[3], &caps[4] == "]")?;
        Self::new(Some(lo), Some(hi))
    }

    /// Whether a lower bound is set.
    #[must_use]
    pub fn has_min(&self) -> bool {
        self.min.is_some()
    }

    /// Whether an upper bound is set.
    #[must_use]
    pub fn has_max(&self) -> bool {
        self.max.is_some()
    }

    /// The lower bound.
    #[must_use]
    pub fn min(&self) -> Option<&Boundary> {
        self.min.as_ref()
    }

    /// The upper bound.
    #[must_use]
    pub fn max(&self) -> Option<&Boundary> {
        self.max.as_ref()
    }

    /// Whether at least one bound is set.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.has_min() || self.has_max()
    }

    /// Returns the bound `value` violates, if any. The lower bound is checked
    /// first; NaN violates any bound.
    #[must_use]
    pub fn violation_for(&self, value: &ComparableNumber) -> Option<BoundViolation> {
        if let Some(min) = self.min {
            let ok = match value.compare(&min.value) {
                Some(Ordering::Greater) => true,
                Some(Ordering::Equal) => min.inclusive,
                _ => false,
            };
            if !ok {
                return Some(BoundViolation::BelowMin(min));
            }
        }
        if let Some(max) = self.max {
            let ok = match value.compare(&max.value) {
                Some(Ordering::Less) => true,
                Some(Ordering::Equal) => max.inclusive,
                _ => false,
            };
            if !ok {
                return Some(BoundViolation::AboveMax(max));
            }
        }
        None
    }
}

impl fmt::Display for NumberBoundaries {
    /// Range notation when both bounds are set, a comparison otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(lo), Some(hi)) => write!(
                f,
                "{}{}..{}{}",
                if lo.inclusive { '[' } else { '(' },
                lo.value,
                hi.value,
                if hi.inclusive { ']' } else { ')' },
            ),
            (Some(lo), None) => write!(f, "{} {}", if lo.inclusive { ">=" } else { ">" }, lo.value),
            (None, Some(hi)) => write!(f, "{} {}", if hi.inclusive { "<=" } else { "<" }, hi.value),
            (None, None) => f.write_str("unbound"),
        }
    }
}
