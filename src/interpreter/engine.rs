use std::{collections::HashMap, rc::Rc, time::Instant};

use crate::{
    error::EvalError,
    interpreter::{
        builtins,
        parser,
        registry::{Config, HostFn, Registry, VarOp},
        script::loader::Script,
        value::{
            core::{Slot, Value, slot},
            iter::ValueIter,
            object::HostObject,
        },
    },
};

/// What kind of block a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameKind {
    /// The bottom frame that always exists; holds global variables.
    Top,
    /// A function body frame; the scope barrier for lookups.
    Def,
    If,
    Elseif,
    Else,
    While,
    For,
}

/// A lexical scope record, pushed when a block is entered and popped when it
/// exits.
pub(crate) struct Frame {
    pub kind:      FrameKind,
    pub variables: HashMap<String, Slot>,
    pub globals:   Vec<String>,
}

impl Frame {
    pub fn new(kind: FrameKind) -> Self {
        Self { kind,
               variables: HashMap::new(),
               globals: Vec::new() }
    }
}

/// The interpreter instance.
///
/// An `Engine` owns everything the host registered, the loaded script, and
/// all run-time state. It is strictly single-threaded; every entry point
/// runs to completion on the caller's thread.
///
/// # Example
/// ```
/// use scriptum::{Config, Engine, Value};
///
/// let mut engine = Engine::new(Config::default());
/// assert_eq!(engine.eval("5*4-3*2").unwrap(), Value::num(14.0));
/// ```
pub struct Engine {
    pub(crate) registry: Registry,
    pub(crate) config:   Config,
    pub(crate) script:   Option<Script>,

    pub(crate) frames:         Vec<Frame>,
    pub(crate) returnvalue:    Value,
    pub(crate) infn:           Option<usize>,
    pub(crate) stop_requested: bool,
    pub(crate) executed_lines: u64,
    pub(crate) profile:        Vec<u64>,
    pub(crate) started:        Option<Instant>,
    pub(crate) iters:          HashMap<usize, Box<dyn ValueIter>>,
}

impl Engine {
    /// Creates an engine, registering the built-in function packs selected
    /// by the configuration and then removing any disabled names.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let mut registry = Registry::new();
        builtins::install(&mut registry, &config);

        Self { registry,
               config,
               script: None,
               frames: vec![Frame::new(FrameKind::Top)],
               returnvalue: Value::num(0.0),
               infn: None,
               stop_requested: false,
               executed_lines: 0,
               profile: Vec::new(),
               started: None,
               iters: HashMap::new() }
    }

    /// Evaluates a single expression (or several separated by `;`, the last
    /// value winning).
    ///
    /// # Errors
    /// Any [`EvalError`]; the first error recorded during the parse wins.
    pub fn eval(&mut self, input: &str) -> Result<Value, EvalError> {
        parser::core::parse(self, input)
    }

    /// Evaluates an expression, folding failures into an in-band
    /// [`Value::Error`] for hosts that prefer tagged results.
    pub fn eval_to_value(&mut self, input: &str) -> Value {
        match self.eval(input) {
            Ok(v) => v,
            Err(e) => Value::from_error(&e),
        }
    }

    /// Sets a named constant visible to every expression.
    ///
    /// # Errors
    /// - [`EvalError::InvalidArgument`] for bad names or unsupported tags.
    pub fn set_constant(&mut self, name: &str, value: Value) -> Result<(), EvalError> {
        self.registry.set_constant(name, value)
    }

    /// Registers a host callback as a function `name` with arity
    /// `[min, max]` (`None` = unbounded).
    ///
    /// # Errors
    /// - [`EvalError::InvalidArgument`] if the name is not a valid
    ///   identifier.
    pub fn register_function(&mut self,
                             name: &str,
                             min: usize,
                             max: Option<usize>,
                             callable: impl Fn(&mut Self, &[Value]) -> Result<Value, EvalError>
                                 + 'static)
                             -> Result<(), EvalError> {
        let callable: HostFn = Rc::new(callable);
        self.registry.add_function(name, min, max, callable)
    }

    /// Removes a registered function; unknown names are ignored.
    pub fn remove_function(&mut self, name: &str) {
        self.registry.remove_function(name);
    }

    /// Registers a host object under `name`.
    pub fn register_object(&mut self, name: &str, object: Rc<dyn HostObject>) {
        self.registry.add_object(name, object);
    }

    /// Requests a cooperative stop. The executor honors it at the next line
    /// boundary; [`Engine::run`] clears it when a new run starts.
    pub fn stop(&mut self) {
        self.stop_requested = true;
    }

    /// Returns the value of the last executed `return`, or `Number 0`.
    #[must_use]
    pub fn last_return(&self) -> Value {
        self.returnvalue.clone()
    }

    /// Returns how many lines the last run executed.
    #[must_use]
    pub const fn lines_executed(&self) -> u64 {
        self.executed_lines
    }

    /// Returns the per-line execution counts of the last run, indexed by
    /// line number.
    #[must_use]
    pub fn profile(&self) -> &[u64] {
        &self.profile
    }

    /// Reads a variable without creating it.
    ///
    /// Walks the script scopes by the read rule, then consults the host
    /// variable callback. `None` means the name exists nowhere.
    pub fn variable(&mut self, name: &str) -> Option<Value> {
        if let Some(s) = self.lookup_slot(name) {
            let value = s.borrow().clone();
            return Some(value);
        }
        let cb = self.config.variable_fn.clone()?;
        cb(self, VarOp::Check, name, None)?;
        cb(self, VarOp::Read, name, None)
    }

    /// Writes a script variable: mutates an existing binding in place, or
    /// creates one on the innermost scope.
    pub fn set_variable(&mut self, name: &str, value: Value) {
        match self.lookup_slot(name) {
            Some(s) => *s.borrow_mut() = value,
            None => {
                let s = slot(value);
                self.top_frame_mut().variables.insert(name.to_string(), s);
            },
        }
    }

    /// Locates the binding slot for `name` by the read rule.
    ///
    /// Frames are walked innermost-first. A `Def` frame terminates the walk
    /// unless the name was declared `global` in it, in which case the walk
    /// continues into the frames below.
    pub(crate) fn lookup_slot(&self, name: &str) -> Option<Slot> {
        let mut idx = self.frames.len();
        while idx > 0 {
            idx -= 1;
            let frame = &self.frames[idx];
            if let Some(s) = frame.variables.get(name) {
                return Some(Rc::clone(s));
            }
            if frame.kind == FrameKind::Def && !frame.globals.iter().any(|g| g == name) {
                return None;
            }
        }
        None
    }

    /// Resolves `name` to its binding slot, creating an auto-initialized
    /// `Number 0` on the innermost scope when it does not exist. Reads
    /// always succeed.
    pub(crate) fn read_slot(&mut self, name: &str) -> Slot {
        if let Some(s) = self.lookup_slot(name) {
            return s;
        }
        let s = slot(Value::num(0.0));
        self.top_frame_mut()
            .variables
            .insert(name.to_string(), Rc::clone(&s));
        s
    }

    /// Returns the innermost frame, restoring the bottom frame if the stack
    /// was ever drained.
    pub(crate) fn top_frame_mut(&mut self) -> &mut Frame {
        if self.frames.is_empty() {
            self.frames.push(Frame::new(FrameKind::Top));
        }
        let idx = self.frames.len() - 1;
        &mut self.frames[idx]
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_auto_create_on_the_innermost_scope() {
        let mut engine = Engine::new(Config::default());
        assert!(engine.variable("x").is_none());

        let s = engine.read_slot("x");
        assert_eq!(*s.borrow(), Value::num(0.0));
        assert_eq!(engine.variable("x"), Some(Value::num(0.0)));
    }

    #[test]
    fn def_frames_are_a_scope_barrier() {
        let mut engine = Engine::new(Config::default());
        engine.set_variable("x", Value::num(7.0));

        engine.frames.push(Frame::new(FrameKind::Def));
        assert!(engine.lookup_slot("x").is_none());

        engine.top_frame_mut().globals.push("x".to_string());
        assert_eq!(engine.lookup_slot("x").map(|s| s.borrow().clone()),
                   Some(Value::num(7.0)));
        engine.frames.pop();
    }

    #[test]
    fn writes_mutate_existing_bindings_in_place() {
        let mut engine = Engine::new(Config::default());
        engine.set_variable("x", Value::num(1.0));
        let alias = engine.read_slot("x");

        engine.frames.push(Frame::new(FrameKind::While));
        engine.set_variable("x", Value::num(2.0));
        engine.frames.pop();

        assert_eq!(*alias.borrow(), Value::num(2.0));
    }
}
