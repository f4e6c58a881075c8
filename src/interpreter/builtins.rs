use crate::{
    error::EvalError,
    interpreter::{
        registry::{Config, Registry},
        value::core::Value,
    },
};

/// Math helpers: trigonometry, rounding, aggregation, conversion.
pub mod maths;
/// String helpers: measurement, slicing, search/replace, `sprintf`,
/// splitting and joining.
pub mod strings;
/// Time helpers: epoch seconds and date formatting.
pub mod timefns;
/// Everything else: `typeof`, `caseof`, `print`, `sort`, and the chart and
/// table builders.
pub mod misc;

/// Registers the packs selected by the configuration, then removes the
/// names the host disabled.
pub(crate) fn install(registry: &mut Registry, config: &Config) {
    if config.maths_fns {
        maths::register(registry);
    }
    if config.string_fns {
        strings::register(registry);
    }
    if config.time_fns {
        timefns::register(registry);
    }
    if config.misc_fns {
        misc::register(registry);
    }

    for name in &config.disabled_fns {
        registry.remove_function(name);
    }
}

/// Declares one helper pack: a table of `name => { min, max, func }`
/// entries and the `register` function that installs them.
macro_rules! builtin_pack {
    ($($name:literal => { min: $min:expr, max: $max:expr, func: $func:expr }),* $(,)?) => {
        /// Registers this pack's functions.
        pub(crate) fn register(registry: &mut crate::interpreter::registry::Registry) {
            $(
                registry.add_builtin($name, $min, $max, std::rc::Rc::new($func));
            )*
        }
    };
}
pub(crate) use builtin_pack;

/// Reads argument `i` as a double, coercing like the operators do.
pub(crate) fn num(args: &[Value], i: usize) -> f64 {
    args.get(i).map_or(0.0, Value::as_number)
}

/// Reads argument `i`, which must be a string.
pub(crate) fn text<'a>(args: &'a [Value], i: usize, fn_name: &str) -> Result<&'a str, EvalError> {
    match args.get(i) {
        Some(Value::Str(s)) => Ok(s),
        _ => Err(EvalError::InvalidArgument { details: format!("{fn_name} expects a string \
                                                                argument") }),
    }
}
