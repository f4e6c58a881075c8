use crate::{
    error::EvalError,
    interpreter::{
        builtins::{builtin_pack, num, text},
        value::core::{Value, fmt_number},
    },
};

builtin_pack! {
    "strlen"  => { min: 1, max: Some(1), func: |_, args| length(args) },
    "length"  => { min: 1, max: Some(1), func: |_, args| length(args) },
    "substr"  => { min: 2, max: Some(3), func: |_, args| substr(args) },
    "strpos"  => { min: 2, max: Some(2), func: |_, args| strpos(args) },
    "replace" => { min: 3, max: Some(3), func: |_, args| replace(args) },
    "toupper" => { min: 1, max: Some(1), func: |_, args| Ok(Value::str(text(args, 0, "toupper")?.to_uppercase())) },
    "tolower" => { min: 1, max: Some(1), func: |_, args| Ok(Value::str(text(args, 0, "tolower")?.to_lowercase())) },
    "trim"    => { min: 1, max: Some(1), func: |_, args| Ok(Value::str(text(args, 0, "trim")?.trim())) },
    "sprintf" => { min: 1, max: None, func: |_, args| sprintf(args) },
    "join"    => { min: 2, max: Some(2), func: |_, args| join(args) },
    "split"   => { min: 2, max: Some(2), func: |_, args| split(args) },
}

/// `strlen`/`length`: characters of a string, elements of an array, keys
/// of a dict. Anything else is an invalid argument.
#[allow(clippy::cast_precision_loss)]
fn length(args: &[Value]) -> Result<Value, EvalError> {
    let n = match &args[0] {
        Value::Str(s) => s.chars().count(),
        Value::Array(items) => items.borrow().len(),
        Value::Dict(entries) => entries.borrow().len(),
        other => {
            return Err(EvalError::InvalidArgument { details: format!("length is undefined for a \
                                                                      {}", other.tag()) });
        },
    };
    Ok(Value::num(n as f64))
}

/// `substr(s, start, count?)`: `count` characters from `start`. A
/// negative start clamps to the beginning; a missing count takes the
/// rest.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn substr(args: &[Value]) -> Result<Value, EvalError> {
    let s = text(args, 0, "substr")?;
    let start = num(args, 1).max(0.0) as usize;
    let count = if args.len() > 2 {
        num(args, 2).max(0.0) as usize
    } else {
        usize::MAX
    };

    Ok(Value::str(s.chars().skip(start).take(count).collect::<String>()))
}

/// `strpos(haystack, needle)`: character index of the first occurrence,
/// or `-1`.
#[allow(clippy::cast_precision_loss)]
fn strpos(args: &[Value]) -> Result<Value, EvalError> {
    let haystack = text(args, 0, "strpos")?;
    let needle = text(args, 1, "strpos")?;

    let position = haystack.find(needle)
                           .map_or(-1.0, |byte| haystack[..byte].chars().count() as f64);
    Ok(Value::num(position))
}

/// `replace(s, from, to)`: all occurrences, returned as a string value.
fn replace(args: &[Value]) -> Result<Value, EvalError> {
    let s = text(args, 0, "replace")?;
    let from = text(args, 1, "replace")?;
    let to = text(args, 2, "replace")?;

    if from.is_empty() {
        return Ok(Value::str(s));
    }
    Ok(Value::str(s.replace(from, to)))
}

/// `join(array, separator)`.
fn join(args: &[Value]) -> Result<Value, EvalError> {
    let Value::Array(items) = &args[0] else {
        return Err(EvalError::InvalidArgument { details: "join expects an array".to_string() });
    };
    let sep = text(args, 1, "join")?;

    let joined = items.borrow()
                      .iter()
                      .map(|s| s.borrow().to_string())
                      .collect::<Vec<_>>()
                      .join(sep);
    Ok(Value::str(joined))
}

/// `split(string, separator)` into an array of strings. An empty
/// separator splits per character.
fn split(args: &[Value]) -> Result<Value, EvalError> {
    let s = text(args, 0, "split")?;
    let sep = text(args, 1, "split")?;

    let parts: Vec<Value> = if sep.is_empty() {
        s.chars().map(|c| Value::Str(c.to_string())).collect()
    } else {
        s.split(sep).map(Value::str).collect()
    };
    Ok(Value::array(parts))
}

/// `sprintf(format, args…)` with the printf subset
/// `%d %i %u %f %s %x %X %e %g %%`, plus the `-` and `0` flags, width,
/// and precision.
fn sprintf(args: &[Value]) -> Result<Value, EvalError> {
    let format = text(args, 0, "sprintf")?;
    let mut out = String::new();
    let mut next_arg = 1usize;
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        if chars.peek() == Some(&'%') {
            chars.next();
            out.push('%');
            continue;
        }

        let mut left_align = false;
        let mut zero_pad = false;
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => left_align = true,
                '0' => zero_pad = true,
                _ => break,
            }
            chars.next();
        }

        let mut width = 0usize;
        while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
            width = width * 10 + d as usize;
            chars.next();
        }

        let mut precision = None;
        if chars.peek() == Some(&'.') {
            chars.next();
            let mut p = 0usize;
            while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
                p = p * 10 + d as usize;
                chars.next();
            }
            precision = Some(p);
        }

        let conv = chars.next().ok_or(EvalError::InvalidArgument { details:
                                          "sprintf format ends inside a specifier".to_string() })?;

        let value = args.get(next_arg)
                        .ok_or(EvalError::InvalidArgument { details: "sprintf is missing an \
                                                                      argument"
                                                                         .to_string() })?;
        next_arg += 1;

        let body = render(conv, value, precision)?;
        out.push_str(&pad(&body, width, left_align, zero_pad));
    }

    Ok(Value::str(out))
}

/// Renders one conversion without padding.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn render(conv: char, value: &Value, precision: Option<usize>) -> Result<String, EvalError> {
    let rendered = match conv {
        'd' | 'i' => format!("{}", value.as_int()),
        'u' => format!("{}", value.as_int().unsigned_abs()),
        'f' => format!("{:.*}", precision.unwrap_or(6), value.as_number()),
        'e' => format!("{:.*e}", precision.unwrap_or(6), value.as_number()),
        'g' => fmt_number(value.as_number()),
        'x' => format!("{:x}", value.as_int()),
        'X' => format!("{:X}", value.as_int()),
        's' => match precision {
            Some(p) => value.to_string().chars().take(p).collect(),
            None => value.to_string(),
        },
        other => {
            return Err(EvalError::InvalidArgument { details: format!("sprintf does not support \
                                                                      '%{other}'") });
        },
    };
    Ok(rendered)
}

/// Applies width, alignment, and zero padding to a rendered conversion.
fn pad(body: &str, width: usize, left_align: bool, zero_pad: bool) -> String {
    let len = body.chars().count();
    if len >= width {
        return body.to_string();
    }

    let fill = width - len;
    if left_align {
        return format!("{body}{}", " ".repeat(fill));
    }
    if zero_pad {
        if let Some(stripped) = body.strip_prefix('-') {
            return format!("-{}{stripped}", "0".repeat(fill));
        }
        return format!("{}{body}", "0".repeat(fill));
    }
    format!("{}{body}", " ".repeat(fill))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sprintf_covers_the_reference_cases() {
        let result = sprintf(&[Value::str("%.2f"), Value::num(5.0 / 3.0)]).unwrap();
        assert_eq!(result, Value::str("1.67"));

        let result = sprintf(&[Value::str("%05.1f"), Value::num(3.14159)]).unwrap();
        assert_eq!(result, Value::str("003.1"));

        let result = sprintf(&[Value::str("%-4d|%x|%s"),
                               Value::num(7.0),
                               Value::num(255.0),
                               Value::str("ok")])
                         .unwrap();
        assert_eq!(result, Value::str("7   |ff|ok"));
    }

    #[test]
    fn substr_takes_start_and_count() {
        let result = substr(&[Value::str("--String--"), Value::num(2.0), Value::num(6.0)]).unwrap();
        assert_eq!(result, Value::str("String"));

        let rest = substr(&[Value::str("abcdef"), Value::num(4.0)]).unwrap();
        assert_eq!(rest, Value::str("ef"));
    }

    #[test]
    fn strpos_counts_characters_not_bytes() {
        let result = strpos(&[Value::str("héllo"), Value::str("llo")]).unwrap();
        assert_eq!(result, Value::num(2.0));
        assert_eq!(strpos(&[Value::str("abc"), Value::str("z")]).unwrap(), Value::num(-1.0));
    }

    #[test]
    fn length_counts_by_container_kind() {
        assert_eq!(length(&[Value::str("héj")]).unwrap(), Value::num(3.0));
        assert_eq!(length(&[Value::array(vec![Value::num(1.0)])]).unwrap(), Value::num(1.0));
        assert_eq!(length(&[Value::dict(vec![("a".to_string(), Value::num(1.0))])]).unwrap(),
                   Value::num(1.0));
        assert!(length(&[Value::num(5.0)]).is_err());
    }
}
