use ordered_float::OrderedFloat;

use crate::{
    error::EvalError,
    interpreter::{
        builtins::{builtin_pack, num, text},
        value::core::Value,
    },
};

builtin_pack! {
    "typeof" => { min: 1, max: Some(1), func: |_, args| Ok(Value::str(args[0].tag())) },
    "caseof" => { min: 2, max: None, func: |_, args| Ok(caseof(args)) },
    "print"  => { min: 1, max: None, func: |_, args| Ok(print(args)) },
    "sort"   => { min: 1, max: Some(1), func: |_, args| sort(args) },
    "chart"  => { min: 2, max: Some(3), func: |_, args| chart(args) },
    "table"  => { min: 2, max: Some(2), func: |_, args| table(args) },
}

/// `caseof(selector, alt…)`: picks the 1-based alternative, clamping the
/// selector into range.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn caseof(args: &[Value]) -> Value {
    let alternatives = &args[1..];
    let selector = num(args, 0).trunc().max(1.0) as usize;
    let index = selector.min(alternatives.len());
    alternatives[index - 1].clone()
}

/// Writes the arguments to stdout, space-separated, and returns the last
/// one.
fn print(args: &[Value]) -> Value {
    let rendered = args.iter()
                       .map(std::string::ToString::to_string)
                       .collect::<Vec<_>>()
                       .join(" ");
    println!("{rendered}");

    args[args.len() - 1].clone()
}

/// `sort(array)`: a new array; all-string input sorts by byte order,
/// anything else numerically.
fn sort(args: &[Value]) -> Result<Value, EvalError> {
    let Value::Array(items) = &args[0] else {
        return Err(EvalError::InvalidArgument { details: "sort expects an array".to_string() });
    };

    let mut values: Vec<Value> = items.borrow().iter().map(|s| s.borrow().clone()).collect();
    if values.iter().all(|v| matches!(v, Value::Str(_))) {
        values.sort_by(|a, b| a.to_string().cmp(&b.to_string()));
    } else {
        values.sort_by_key(|v| OrderedFloat(v.as_number()));
    }

    Ok(Value::array(values))
}

/// `chart(name, values, labels?)` packages its inputs as tagged chart
/// data for the host to render.
fn chart(args: &[Value]) -> Result<Value, EvalError> {
    let name = text(args, 0, "chart")?;
    if !matches!(args[1], Value::Array(_)) {
        return Err(EvalError::InvalidArgument { details: "chart expects an array of values"
                                                             .to_string() });
    }

    let mut entries = vec![("name".to_string(), Value::str(name)),
                           ("values".to_string(), args[1].clone())];
    if let Some(labels) = args.get(2) {
        if !matches!(labels, Value::Array(_)) {
            return Err(EvalError::InvalidArgument { details: "chart labels must be an array"
                                                                 .to_string() });
        }
        entries.push(("labels".to_string(), labels.clone()));
    }

    Ok(Value::Data { kind:    "chart".to_string(),
                     payload: Box::new(Value::dict(entries)), })
}

/// `table(headers, rows)` packages its inputs as tagged table data for
/// the host to render.
fn table(args: &[Value]) -> Result<Value, EvalError> {
    let (Value::Array(_), Value::Array(rows)) = (&args[0], &args[1]) else {
        return Err(EvalError::InvalidArgument { details: "table expects header and row arrays"
                                                             .to_string() });
    };

    if !rows.borrow()
            .iter()
            .all(|row| matches!(*row.borrow(), Value::Array(_)))
    {
        return Err(EvalError::InvalidArgument { details: "table rows must be arrays".to_string() });
    }

    let entries = vec![("headers".to_string(), args[0].clone()),
                       ("rows".to_string(), args[1].clone())];
    Ok(Value::Data { kind:    "table".to_string(),
                     payload: Box::new(Value::dict(entries)), })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caseof_clamps_into_range() {
        let alts = [Value::num(1.0), Value::str("a"), Value::str("b"), Value::str("c")];
        assert_eq!(caseof(&alts), Value::str("a"));

        let high = [Value::num(9.0), Value::str("a"), Value::str("b"), Value::str("c")];
        assert_eq!(caseof(&high), Value::str("c"));

        let low = [Value::num(-3.0), Value::str("a"), Value::str("b")];
        assert_eq!(caseof(&low), Value::str("a"));
    }

    #[test]
    fn sort_orders_strings_and_numbers_differently() {
        let mixed = Value::array(vec![Value::num(10.0), Value::num(2.0)]);
        assert_eq!(sort(&[mixed]).unwrap(),
                   Value::array(vec![Value::num(2.0), Value::num(10.0)]));

        let words = Value::array(vec![Value::str("10"), Value::str("2")]);
        assert_eq!(sort(&[words]).unwrap(),
                   Value::array(vec![Value::str("10"), Value::str("2")]));
    }

    #[test]
    fn chart_data_is_tagged() {
        let values = Value::array(vec![Value::num(1.0)]);
        let data = chart(&[Value::str("cpu"), values]).unwrap();
        assert_eq!(data.tag(), "data");
        let Value::Data { kind, .. } = data else { panic!("expected data") };
        assert_eq!(kind, "chart");
    }
}
