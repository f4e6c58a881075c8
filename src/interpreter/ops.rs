use crate::{
    interpreter::value::core::{INFINITY_SENTINEL, Value},
    util::num::{f64_to_i64_exact, i64_to_f64_checked},
};

/// Applies one built-in binary operation.
///
/// Dispatch order, after the host overload hook has already declined:
/// `+` on two strings concatenates; any operand that is neither a number
/// nor a string collapses the result to `Number 0`; otherwise both sides
/// coerce to doubles (to integers for the bitwise and logical operators)
/// and the operator applies.
///
/// Returns `None` only for an invalid range (`:` with non-integral bounds
/// or a descending pair), which fails the surrounding parse.
pub(crate) fn binary_op(op: &str, left: &Value, right: &Value) -> Option<Value> {
    if op == "+"
       && let (Value::Str(a), Value::Str(b)) = (left, right)
    {
        return Some(Value::Str(format!("{a}{b}")));
    }

    if !is_scalar(left) || !is_scalar(right) {
        return Some(Value::num(0.0));
    }

    match op {
        "==" => Some(flag(left.loose_eq(right))),
        "!=" => Some(flag(!left.loose_eq(right))),
        "===" => Some(flag(left.strict_eq(right))),
        "!==" => Some(flag(!left.strict_eq(right))),
        "<" | "<=" | ">" | ">=" => Some(compare(op, left, right)),
        "+" => Some(Value::num(left.as_number() + right.as_number())),
        "-" => Some(Value::num(left.as_number() - right.as_number())),
        "*" => Some(Value::num(left.as_number() * right.as_number())),
        "/" => Some(divide(left.as_number(), right.as_number())),
        "%" => {
            let b = right.as_number();
            Some(Value::num(if b == 0.0 { 0.0 } else { left.as_number() % b }))
        },
        "&&" => Some(flag(left.as_int() != 0 && right.as_int() != 0)),
        "||" => Some(flag(left.as_int() != 0 || right.as_int() != 0)),
        "&" => Some(int_result(left.as_int() & right.as_int())),
        "|" => Some(int_result(left.as_int() | right.as_int())),
        "^" => Some(int_result(left.as_int() ^ right.as_int())),
        ":" => range(left, right),
        _ => None,
    }
}

/// Division with the signed infinity sentinel.
///
/// Dividing by zero yields ±[`INFINITY_SENTINEL`] with the sign of the
/// dividend; `0/0` is `0`.
fn divide(a: f64, b: f64) -> Value {
    if b == 0.0 {
        if a == 0.0 {
            return Value::num(0.0);
        }
        return Value::num(INFINITY_SENTINEL.copysign(a));
    }
    Value::num(a / b)
}

/// Builds the inclusive integer range `a:b`.
///
/// Both bounds must be exactly integral and `a ≤ b`; anything else fails
/// the parse.
fn range(left: &Value, right: &Value) -> Option<Value> {
    let a = f64_to_i64_exact(left.as_number())?;
    let b = f64_to_i64_exact(right.as_number())?;
    if a > b {
        return None;
    }

    Some(Value::array((a..=b).map(int_result).collect()))
}

/// Ordering comparison: two strings compare lexicographically by byte
/// order, every other pairing numerically.
fn compare(op: &str, left: &Value, right: &Value) -> Value {
    let ordered = match (left, right) {
        (Value::Str(a), Value::Str(b)) => match op {
            "<" => a < b,
            "<=" => a <= b,
            ">" => a > b,
            _ => a >= b,
        },
        _ => {
            let (a, b) = (left.as_number(), right.as_number());
            match op {
                "<" => a < b,
                "<=" => a <= b,
                ">" => a > b,
                _ => a >= b,
            }
        },
    };
    flag(ordered)
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::Number(_) | Value::Str(_))
}

fn flag(b: bool) -> Value {
    Value::num(f64::from(b))
}

/// Widens an integer result back to a double. A result outside the safe
/// integer range collapses to `0`, like any other degenerate operand.
fn int_result(i: i64) -> Value {
    Value::num(i64_to_f64_checked(i).unwrap_or(0.0))
}
