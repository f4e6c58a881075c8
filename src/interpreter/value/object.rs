use std::rc::Rc;

use indexmap::IndexMap;

use crate::interpreter::value::{core::Value, iter::ValueIter};

/// A bound invocable property discovered on a host object.
///
/// Carries the callable together with its arity range so call sites can
/// reject bad argument counts before invoking.
#[derive(Clone)]
pub struct Method {
    callable: Rc<dyn Fn(&[Value]) -> Value>,
    min:      usize,
    max:      Option<usize>,
}

impl Method {
    /// Creates a method with the given arity range. `max` of `None` means
    /// unbounded.
    pub fn new(min: usize, max: Option<usize>, callable: impl Fn(&[Value]) -> Value + 'static) -> Self {
        Self { callable: Rc::new(callable),
               min,
               max }
    }

    /// Invokes the method if the argument count satisfies the arity range.
    #[must_use]
    pub fn invoke(&self, args: &[Value]) -> Option<Value> {
        if args.len() < self.min || self.max.is_some_and(|max| args.len() > max) {
            return None;
        }
        Some((self.callable)(args))
    }

    /// Returns `true` if both methods share one callable.
    #[must_use]
    pub fn same_callable(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.callable, &other.callable)
    }
}

/// Capability interface through which the host exposes an object.
///
/// An object supplies named properties; a property holding a [`Method`]
/// becomes callable as `obj.name(args)`. Implementors only need
/// `get_property` — the default `call_method` routes through a
/// `Func`-tagged property, and `make_iter` opts the object out of `for`
/// loops.
pub trait HostObject {
    /// Looks up a property by name. `None` means the property does not
    /// exist.
    fn get_property(&self, name: &str) -> Option<Value>;

    /// Invokes a method-valued property with the given arguments.
    ///
    /// The default implementation fetches the property and, when it is a
    /// `Func`, checks arity and calls it.
    fn call_method(&self, name: &str, args: &[Value]) -> Option<Value> {
        match self.get_property(name)? {
            Value::Func(method) => method.invoke(args),
            _ => None,
        }
    }

    /// Produces an iterator over the object for `for NAME in obj`.
    ///
    /// The default is `None`: the object is not iterable.
    fn make_iter(&self) -> Option<Box<dyn ValueIter>> {
        None
    }
}

/// A fixed property table, for hosts that do not need a dynamic lookup
/// hook.
///
/// # Example
/// ```
/// use scriptum::interpreter::value::{core::Value, object::{HostObject, PropertyTable}};
///
/// let table = PropertyTable::new().with("version", Value::str("1.4"))
///                                 .with("poll_rate", Value::num(250.0));
/// assert_eq!(table.get_property("version"), Some(Value::str("1.4")));
/// assert_eq!(table.get_property("missing"), None);
/// ```
#[derive(Default)]
pub struct PropertyTable {
    props: IndexMap<String, Value>,
}

impl PropertyTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property, consuming and returning the table for chaining.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.props.insert(name.into(), value);
        self
    }

    /// Adds or replaces a property in place.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.props.insert(name.into(), value);
    }
}

impl HostObject for PropertyTable {
    fn get_property(&self, name: &str) -> Option<Value> {
        self.props.get(name).cloned()
    }
}
