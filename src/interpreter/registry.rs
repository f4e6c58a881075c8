use std::{collections::HashMap, f64::consts, rc::Rc};

use crate::{
    error::EvalError,
    interpreter::{engine::Engine, value::core::Value, value::object::HostObject},
};

/// Reserved words that cannot be used as function or script names.
pub const RESERVED_WORDS: &[&str] = &["def", "for", "in", "while", "return", "if", "else",
                                      "elseif", "break", "continue", "float", "int", "array",
                                      "string", "object", "const", "var", "global", "class",
                                      "new", "include"];

/// Returns `true` if `name` matches `[A-Za-z_][A-Za-z0-9_]*`.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {},
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Returns `true` if `name` is a valid, non-reserved identifier.
#[must_use]
pub fn is_usable_name(name: &str) -> bool {
    is_valid_name(name) && !RESERVED_WORDS.contains(&name)
}

/// A host-registered callable.
///
/// Receives the engine (so helpers can re-enter evaluation or stop the
/// script) and the already-evaluated arguments.
pub type HostFn = Rc<dyn Fn(&mut Engine, &[Value]) -> Result<Value, EvalError>>;

/// The host variable callback.
///
/// Consulted during identifier resolution (`VarOp::Read`), assignment to a
/// host variable (`VarOp::Set`), and existence checks (`VarOp::Check`).
/// Returning `None` means the host does not own the name.
pub type VariableFn = Rc<dyn Fn(&mut Engine, VarOp, &str, Option<&Value>) -> Option<Value>>;

/// A host operator overload.
///
/// Consulted before the built-in binary operator semantics. Returning
/// `Number 0` defers to the built-in behavior.
pub type OverloadFn = Rc<dyn Fn(&mut Engine, &Value, &str, &Value) -> Result<Value, EvalError>>;

/// Which access the variable callback is being asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarOp {
    /// Resolve the current value of the name.
    Read,
    /// Store a new value for the name.
    Set,
    /// Report whether the name exists, without producing its value.
    Check,
}

/// Engine configuration, consumed by [`Engine::new`].
#[derive(Clone)]
pub struct Config {
    /// Register the math helper pack.
    pub maths_fns:    bool,
    /// Register the time/date helper pack.
    pub time_fns:     bool,
    /// Register the string helper pack.
    pub string_fns:   bool,
    /// Register the misc helper pack (`typeof`, `caseof`, chart builders).
    pub misc_fns:     bool,
    /// Functions to remove again after the packs have registered.
    pub disabled_fns: Vec<String>,
    /// Host variable callback.
    pub variable_fn:  Option<VariableFn>,
    /// Operator overloads, keyed by operator symbol (`"+"`, `"=="`, …).
    pub overloads:    HashMap<String, OverloadFn>,
    /// Script indentation width in spaces.
    pub spaces:       usize,
    /// Executed-line budget for a script run.
    pub max_lines:    u64,
    /// Wall-clock budget for a script run, in microseconds.
    pub max_micros:   u64,
}

impl Default for Config {
    fn default() -> Self {
        Self { maths_fns:    true,
               time_fns:     true,
               string_fns:   true,
               misc_fns:     true,
               disabled_fns: Vec::new(),
               variable_fn:  None,
               overloads:    HashMap::new(),
               spaces:       2,
               max_lines:    10_000_000,
               max_micros:   10_000_000, }
    }
}

/// A registered function with its arity range.
#[derive(Clone)]
pub struct FunctionEntry {
    /// The callable itself.
    pub callable: HostFn,
    /// Minimum accepted argument count.
    pub min:      usize,
    /// Maximum accepted argument count; `None` is unbounded.
    pub max:      Option<usize>,
}

impl FunctionEntry {
    /// Tests whether the given argument count satisfies the arity range.
    #[must_use]
    pub fn accepts(&self, n: usize) -> bool {
        n >= self.min && self.max.is_none_or(|max| n <= max)
    }
}

/// Holds everything the host has registered: named constants, callable
/// functions, and objects.
pub struct Registry {
    constants: HashMap<String, Value>,
    functions: HashMap<String, FunctionEntry>,
    objects:   HashMap<String, Rc<dyn HostObject>>,
}

impl Registry {
    /// Creates a registry preloaded with the built-in constants.
    ///
    /// `true` is `1` and `false` is `0`.
    #[must_use]
    pub fn new() -> Self {
        let mut constants = HashMap::new();
        constants.insert("PI".to_string(), Value::num(consts::PI));
        constants.insert("e".to_string(), Value::num(consts::E));
        constants.insert("true".to_string(), Value::num(1.0));
        constants.insert("false".to_string(), Value::num(0.0));

        Self { constants,
               functions: HashMap::new(),
               objects: HashMap::new() }
    }

    /// Sets a named constant.
    ///
    /// # Errors
    /// - [`EvalError::InvalidArgument`] if the name is not a valid
    ///   identifier or the value is not a number, string, or array.
    pub fn set_constant(&mut self, name: &str, value: Value) -> Result<(), EvalError> {
        if !is_valid_name(name) {
            return Err(EvalError::InvalidArgument { details: format!("bad constant name '{name}'") });
        }
        if !matches!(value, Value::Number(_) | Value::Str(_) | Value::Array(_)) {
            return Err(EvalError::InvalidArgument { details: format!("constant '{name}' must be a number, string, or array") });
        }

        self.constants.insert(name.to_string(), value);
        Ok(())
    }

    /// Looks up a constant by name.
    #[must_use]
    pub fn constant(&self, name: &str) -> Option<Value> {
        self.constants.get(name).cloned()
    }

    /// Registers a callable under `name` with the arity range `[min, max]`.
    ///
    /// # Errors
    /// - [`EvalError::InvalidArgument`] if the name is not a valid
    ///   identifier.
    pub fn add_function(&mut self,
                        name: &str,
                        min: usize,
                        max: Option<usize>,
                        callable: HostFn)
                        -> Result<(), EvalError> {
        if !is_valid_name(name) {
            return Err(EvalError::InvalidArgument { details: format!("bad function name '{name}'") });
        }

        self.functions
            .insert(name.to_string(), FunctionEntry { callable, min, max });
        Ok(())
    }

    /// Registers a built-in under a trusted static name, skipping the
    /// identifier validation host registrations go through.
    pub(crate) fn add_builtin(&mut self, name: &'static str, min: usize, max: Option<usize>, callable: HostFn) {
        self.functions
            .insert(name.to_string(), FunctionEntry { callable, min, max });
    }

    /// Removes a function; unknown names are ignored.
    pub fn remove_function(&mut self, name: &str) {
        self.functions.remove(name);
    }

    /// Looks up a function by name.
    #[must_use]
    pub fn function(&self, name: &str) -> Option<FunctionEntry> {
        self.functions.get(name).cloned()
    }

    /// Registers a host object under `name`.
    pub fn add_object(&mut self, name: &str, object: Rc<dyn HostObject>) {
        self.objects.insert(name.to_string(), object);
    }

    /// Looks up an object by name.
    #[must_use]
    pub fn object(&self, name: &str) -> Option<Rc<dyn HostObject>> {
        self.objects.get(name).cloned()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_validation_follows_the_identifier_rule() {
        assert!(is_valid_name("_x9"));
        assert!(!is_valid_name("9x"));
        assert!(!is_valid_name("a-b"));
        assert!(is_valid_name("while"));
        assert!(!is_usable_name("while"));
    }

    #[test]
    fn constants_reject_unsupported_tags() {
        let mut reg = Registry::new();
        assert!(reg.set_constant("ok", Value::str("v")).is_ok());
        assert!(reg.set_constant("bad name", Value::num(1.0)).is_err());
        assert!(reg.set_constant("d", Value::dict(Vec::new())).is_err());
    }

    #[test]
    fn false_is_zero() {
        let reg = Registry::new();
        assert_eq!(reg.constant("false"), Some(Value::num(0.0)));
        assert_eq!(reg.constant("true"), Some(Value::num(1.0)));
    }

    #[test]
    fn arity_ranges_accept_inclusive_bounds() {
        let entry = FunctionEntry { callable: Rc::new(|_, _| Ok(Value::num(0.0))),
                                    min:      1,
                                    max:      Some(3), };
        assert!(!entry.accepts(0));
        assert!(entry.accepts(1));
        assert!(entry.accepts(3));
        assert!(!entry.accepts(4));

        let open = FunctionEntry { callable: Rc::new(|_, _| Ok(Value::num(0.0))),
                                   min:      0,
                                   max:      None, };
        assert!(open.accepts(250));
    }
}
