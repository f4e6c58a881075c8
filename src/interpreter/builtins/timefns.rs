use chrono::{DateTime, Local, Utc};

use crate::{
    error::EvalError,
    interpreter::{
        builtins::{builtin_pack, num, text},
        value::core::Value,
    },
};

builtin_pack! {
    "time" => { min: 0, max: Some(0), func: |_, _| Ok(Value::num(now_epoch())) },
    "date" => { min: 1, max: Some(2), func: |_, args| date(args) },
}

/// Whole seconds since the Unix epoch.
#[allow(clippy::cast_precision_loss)]
fn now_epoch() -> f64 {
    Utc::now().timestamp() as f64
}

/// `date(format)` formats the current local time; `date(format, epoch)`
/// formats the given epoch seconds.
///
/// The format supports the strftime subset
/// `%Y %m %d %H %M %S %j %a %b`; any other `%` sequence is kept
/// literally.
#[allow(clippy::cast_possible_truncation)]
fn date(args: &[Value]) -> Result<Value, EvalError> {
    let format = text(args, 0, "date")?;

    let moment: DateTime<Local> = if args.len() > 1 {
        let epoch = num(args, 1) as i64;
        DateTime::from_timestamp(epoch, 0).ok_or(EvalError::InvalidArgument { details:
                                                     "date received an out-of-range epoch"
                                                         .to_string() })?
                                          .with_timezone(&Local)
    } else {
        Local::now()
    };

    Ok(Value::str(moment.format(&sanitize(format)).to_string()))
}

/// Keeps only the supported specifiers; everything else is escaped so the
/// formatter cannot fail on host input.
fn sanitize(format: &str) -> String {
    const SUPPORTED: &[char] = &['Y', 'm', 'd', 'H', 'M', 'S', 'j', 'a', 'b'];

    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some(&spec) if SUPPORTED.contains(&spec) => {
                out.push('%');
                out.push(spec);
                chars.next();
            },
            _ => out.push_str("%%"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_epochs_format_deterministically() {
        // 2001-09-09 01:46:40 UTC.
        let result = date(&[Value::str("%Y-%m-%d"), Value::num(1_000_000_000.0)]).unwrap();
        let Value::Str(s) = result else { panic!("expected a string") };
        assert!(s.starts_with("2001-09-") || s.starts_with("2001-09"), "got {s}");
    }

    #[test]
    fn unsupported_specifiers_are_neutralized() {
        assert_eq!(sanitize("%Y %q %%"), "%Y %%q %%%%");
    }
}
