use std::{cell::RefCell, fmt, rc::Rc};

use indexmap::IndexMap;

use crate::{
    error::EvalError,
    interpreter::value::object::{HostObject, Method},
    util::num::f64_to_i64_trunc,
};

/// A shared, mutable binding handle.
///
/// Variables, array elements, and dict entries are stored as slots so that
/// an assignment through one alias is observed by every other holder.
pub type Slot = Rc<RefCell<Value>>;

/// Wraps a value in a fresh [`Slot`].
#[must_use]
pub fn slot(value: Value) -> Slot {
    Rc::new(RefCell::new(value))
}

/// Sentinel produced by division by zero, signed to match the dividend.
pub const INFINITY_SENTINEL: f64 = 2_100_776_655.0;

/// Represents a runtime value in the interpreter.
///
/// This enum models all the types that can appear in expressions, script
/// variables, host constants, and function returns. The variant fully
/// determines which payload is meaningful.
#[derive(Clone)]
pub enum Value {
    /// A numeric value (double precision floating-point).
    Number(f64),
    /// A UTF-8 string value.
    Str(String),
    /// An ordered sequence of values. Elements are shared slots.
    Array(Rc<RefCell<Vec<Slot>>>),
    /// An insertion-ordered mapping from string key to value.
    Dict(Rc<RefCell<IndexMap<String, Slot>>>),
    /// An opaque handle to a host-registered object.
    Object(Rc<dyn HostObject>),
    /// A bound invocable property discovered on an object.
    Func(Method),
    /// Tagged structured output (chart, table) produced by helpers.
    /// Not consumed by the core operators.
    Data {
        /// What kind of structure the payload is (`"chart"`, `"table"`).
        kind:    String,
        /// The structured payload.
        payload: Box<Value>,
    },
    /// A terminal error value carrying a stable numeric code. Emitted only
    /// as the top-level result of an evaluation.
    Error {
        /// The stable numeric code.
        code:    u16,
        /// The human-readable message.
        message: String,
    },
}

impl Value {
    /// Creates a `Number` value.
    #[must_use]
    pub const fn num(n: f64) -> Self {
        Self::Number(n)
    }

    /// Creates a `Str` value.
    pub fn str(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }

    /// Creates an `Array` value, wrapping every element in a fresh slot.
    #[must_use]
    pub fn array(items: Vec<Self>) -> Self {
        Self::Array(Rc::new(RefCell::new(items.into_iter().map(slot).collect())))
    }

    /// Creates a `Dict` value, wrapping every entry in a fresh slot.
    #[must_use]
    pub fn dict(entries: Vec<(String, Self)>) -> Self {
        Self::Dict(Rc::new(RefCell::new(entries.into_iter()
                                               .map(|(k, v)| (k, slot(v)))
                                               .collect())))
    }

    /// Creates an `Error` value mirroring an [`EvalError`].
    #[must_use]
    pub fn from_error(e: &EvalError) -> Self {
        Self::Error { code:    e.code(),
                      message: e.to_string(), }
    }

    /// Returns the tag name of this value (`"number"`, `"string"`, …).
    ///
    /// The names are part of the host-facing contract; `typeof` returns
    /// them verbatim.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Str(_) => "string",
            Self::Array(_) => "array",
            Self::Dict(_) => "dict",
            Self::Object(_) => "object",
            Self::Func(_) => "function",
            Self::Data { .. } => "data",
            Self::Error { .. } => "error",
        }
    }

    /// Coerces the value to a double.
    ///
    /// Numbers pass through; strings parse (whole trimmed text) with
    /// non-numeric text becoming `0`; every other tag is `0`.
    #[must_use]
    pub fn as_number(&self) -> f64 {
        match self {
            Self::Number(n) => *n,
            Self::Str(s) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Coerces the value to an integer by truncating [`Self::as_number`]
    /// toward zero.
    #[must_use]
    pub fn as_int(&self) -> i64 {
        f64_to_i64_trunc(self.as_number())
    }

    /// Tests the value the way `if` and `while` do.
    ///
    /// Only numbers and strings are truthy-tested: a number is truthy iff
    /// non-zero, a string iff non-empty. Every other tag is false.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Number(n) => *n != 0.0,
            Self::Str(s) => !s.is_empty(),
            _ => false,
        }
    }

    /// Loose equality, as used by `==` and `!=`.
    ///
    /// Two strings compare by byte equality; any other pairing compares
    /// numerically after coercion, rounded to ten decimals.
    #[must_use]
    pub fn loose_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a == b,
            _ => round10(self.as_number()) == round10(other.as_number()),
        }
    }

    /// Strict equality, as used by `===` and `!==`.
    ///
    /// Requires identical tags. Numbers use the ten-decimal rounding,
    /// strings byte equality; any other tag never compares strictly equal.
    #[must_use]
    pub fn strict_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => round10(*a) == round10(*b),
            (Self::Str(a), Self::Str(b)) => a == b,
            _ => false,
        }
    }
}

/// Rounds a double to ten decimal places, the precision used by the loose
/// and strict equality operators.
#[must_use]
pub fn round10(x: f64) -> f64 {
    (x * 1e10).round() / 1e10
}

/// Formats a double the way the language prints and stringifies it:
/// integral values drop the decimal point, everything else uses the
/// shortest faithful representation.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn fmt_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", fmt_number(*n)),
            Self::Str(s) => write!(f, "{s}"),
            Self::Array(items) => {
                write!(f, "[")?;
                for (index, item) in items.borrow().iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item.borrow())?;
                }
                write!(f, "]")
            },
            Self::Dict(entries) => {
                write!(f, "{{")?;
                for (index, (key, value)) in entries.borrow().iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {}", value.borrow())?;
                }
                write!(f, "}}")
            },
            Self::Object(_) => write!(f, "<object>"),
            Self::Func(_) => write!(f, "<function>"),
            Self::Data { kind, .. } => write!(f, "<{kind}>"),
            Self::Error { code, message } => write!(f, "<error {code}: {message}>"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({self})", self.tag())
    }
}

impl PartialEq for Value {
    /// Structural equality for hosts and tests. Containers compare by
    /// contents, objects and functions by handle identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => {
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| *x.borrow() == *y.borrow())
            },
            (Self::Dict(a), Self::Dict(b)) => {
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len()
                && a.iter()
                    .zip(b.iter())
                    .all(|((ka, va), (kb, vb))| ka == kb && *va.borrow() == *vb.borrow())
            },
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            (Self::Func(a), Self::Func(b)) => a.same_callable(b),
            (Self::Data { kind: ka, payload: pa }, Self::Data { kind: kb, payload: pb }) => {
                ka == kb && pa == pb
            },
            (Self::Error { code: a, .. }, Self::Error { code: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coercion_parses_numeric_strings_only() {
        assert_eq!(Value::str("12.5").as_number(), 12.5);
        assert_eq!(Value::str(" 3 ").as_number(), 3.0);
        assert_eq!(Value::str("x").as_number(), 0.0);
        assert_eq!(Value::array(vec![Value::num(1.0)]).as_number(), 0.0);
    }

    #[test]
    fn truthiness_covers_only_numbers_and_strings() {
        assert!(Value::num(0.5).is_truthy());
        assert!(!Value::num(0.0).is_truthy());
        assert!(Value::str("x").is_truthy());
        assert!(!Value::str("").is_truthy());
        assert!(!Value::array(vec![Value::num(1.0)]).is_truthy());
    }

    #[test]
    fn loose_equality_rounds_to_ten_decimals() {
        assert!(Value::num(0.1 + 0.2).loose_eq(&Value::num(0.3)));
        assert!(Value::str("5").loose_eq(&Value::num(5.0)));
        assert!(!Value::str("ab").loose_eq(&Value::str("cd")));
    }

    #[test]
    fn strict_equality_requires_matching_tags() {
        assert!(Value::str("5").loose_eq(&Value::num(5.0)));
        assert!(!Value::str("5").strict_eq(&Value::num(5.0)));
        assert!(Value::str("5").strict_eq(&Value::str("5")));
    }

    #[test]
    fn numbers_print_without_trailing_fraction() {
        assert_eq!(fmt_number(14.0), "14");
        assert_eq!(fmt_number(1.5), "1.5");
        assert_eq!(Value::array(vec![Value::num(1.0), Value::str("a")]).to_string(), "[1, a]");
    }

    #[test]
    fn slots_alias_their_value() {
        let s = slot(Value::num(5.0));
        let alias = Rc::clone(&s);
        *s.borrow_mut() = Value::num(8.0);
        assert_eq!(*alias.borrow(), Value::num(8.0));
    }
}
