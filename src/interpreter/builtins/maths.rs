use ordered_float::OrderedFloat;
use rand::Rng;

use crate::{
    error::EvalError,
    interpreter::{
        builtins::{builtin_pack, num},
        value::core::Value,
    },
};

builtin_pack! {
    "abs"    => { min: 1, max: Some(1), func: |_, args| Ok(Value::num(num(args, 0).abs())) },
    "ceil"   => { min: 1, max: Some(1), func: |_, args| Ok(Value::num(num(args, 0).ceil())) },
    "floor"  => { min: 1, max: Some(1), func: |_, args| Ok(Value::num(num(args, 0).floor())) },
    "round"  => { min: 1, max: Some(2), func: |_, args| Ok(Value::num(round(args))) },
    "int"    => { min: 1, max: Some(1), func: |_, args| Ok(Value::num(num(args, 0).trunc())) },
    "float"  => { min: 1, max: Some(1), func: |_, args| Ok(Value::num(num(args, 0))) },
    "sqrt"   => { min: 1, max: Some(1), func: |_, args| Ok(Value::num(num(args, 0).sqrt())) },
    "pow"    => { min: 2, max: Some(2), func: |_, args| Ok(Value::num(num(args, 0).powf(num(args, 1)))) },
    "exp"    => { min: 1, max: Some(1), func: |_, args| Ok(Value::num(num(args, 0).exp())) },
    "log"    => { min: 1, max: Some(1), func: |_, args| Ok(Value::num(num(args, 0).ln())) },
    "log10"  => { min: 1, max: Some(1), func: |_, args| Ok(Value::num(num(args, 0).log10())) },
    "sin"    => { min: 1, max: Some(1), func: |_, args| Ok(Value::num(num(args, 0).sin())) },
    "cos"    => { min: 1, max: Some(1), func: |_, args| Ok(Value::num(num(args, 0).cos())) },
    "tan"    => { min: 1, max: Some(1), func: |_, args| Ok(Value::num(num(args, 0).tan())) },
    "asin"   => { min: 1, max: Some(1), func: |_, args| Ok(Value::num(num(args, 0).asin())) },
    "acos"   => { min: 1, max: Some(1), func: |_, args| Ok(Value::num(num(args, 0).acos())) },
    "atan"   => { min: 1, max: Some(1), func: |_, args| Ok(Value::num(num(args, 0).atan())) },
    "atan2"  => { min: 2, max: Some(2), func: |_, args| Ok(Value::num(num(args, 0).atan2(num(args, 1)))) },
    "min"    => { min: 1, max: None, func: |_, args| aggregate("min", args) },
    "max"    => { min: 1, max: None, func: |_, args| aggregate("max", args) },
    "sum"    => { min: 1, max: None, func: |_, args| aggregate("sum", args) },
    "random" => { min: 0, max: Some(2), func: |_, args| Ok(Value::num(random(args))) },
}

/// `round(x)` rounds to the nearest integer; `round(x, d)` to `d` decimal
/// places.
fn round(args: &[Value]) -> f64 {
    let x = num(args, 0);
    if args.len() < 2 {
        return x.round();
    }
    let factor = 10f64.powi(num(args, 1) as i32);
    (x * factor).round() / factor
}

/// Shared body of `min`, `max`, and `sum`.
///
/// Array arguments are flattened one level, so `min(values)` and
/// `min(a, b, c)` both work.
fn aggregate(which: &str, args: &[Value]) -> Result<Value, EvalError> {
    let mut numbers = Vec::new();
    for arg in args {
        match arg {
            Value::Array(items) => {
                numbers.extend(items.borrow().iter().map(|s| s.borrow().as_number()));
            },
            other => numbers.push(other.as_number()),
        }
    }

    if numbers.is_empty() {
        return Err(EvalError::InvalidArgument { details: format!("{which} needs at least one \
                                                                  value") });
    }

    let result = match which {
        "sum" => numbers.iter().sum(),
        "min" => numbers.iter().copied().map(OrderedFloat).min().map_or(0.0, |m| m.0),
        _ => numbers.iter().copied().map(OrderedFloat).max().map_or(0.0, |m| m.0),
    };
    Ok(Value::num(result))
}

/// `random()` is uniform in `[0, 1)`; `random(n)` in `[0, n)`;
/// `random(a, b)` in `[a, b)`.
fn random(args: &[Value]) -> f64 {
    let mut rng = rand::thread_rng();
    match args.len() {
        0 => rng.r#gen::<f64>(),
        1 => rng.r#gen::<f64>() * num(args, 0),
        _ => {
            let (a, b) = (num(args, 0), num(args, 1));
            a + rng.r#gen::<f64>() * (b - a)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregation_flattens_arrays_one_level() {
        let arr = Value::array(vec![Value::num(4.0), Value::num(-2.0)]);
        assert_eq!(aggregate("min", &[Value::num(3.0), arr.clone()]), Ok(Value::num(-2.0)));
        assert_eq!(aggregate("max", &[Value::num(3.0), arr.clone()]), Ok(Value::num(4.0)));
        assert_eq!(aggregate("sum", &[arr]), Ok(Value::num(2.0)));
    }

    #[test]
    fn round_takes_optional_decimals() {
        assert_eq!(round(&[Value::num(3.7)]), 4.0);
        assert_eq!(round(&[Value::num(3.14159), Value::num(2.0)]), 3.14);
    }
}
