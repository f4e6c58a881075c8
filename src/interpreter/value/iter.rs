use std::{cell::RefCell, rc::Rc};

use indexmap::IndexMap;

use crate::interpreter::value::core::{Slot, Value};

/// The iterator contract used by `for` statements.
///
/// Pulling returns the next value, or `None` when the sequence is
/// exhausted. State lives inside the iterator, keyed to its `for` line by
/// the executor.
pub trait ValueIter {
    /// Pulls the next value from the sequence.
    fn next_value(&mut self) -> Option<Value>;
}

/// Iterates a string one code point at a time, yielding one-character
/// strings.
pub struct StringIter {
    chars: Vec<char>,
    pos:   usize,
}

impl StringIter {
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self { chars: text.chars().collect(),
               pos:   0, }
    }
}

impl ValueIter for StringIter {
    fn next_value(&mut self) -> Option<Value> {
        let c = *self.chars.get(self.pos)?;
        self.pos += 1;
        Some(Value::Str(c.to_string()))
    }
}

/// Iterates the elements of an array by position.
pub struct ArrayIter {
    items: Rc<RefCell<Vec<Slot>>>,
    pos:   usize,
}

impl ArrayIter {
    #[must_use]
    pub fn new(items: Rc<RefCell<Vec<Slot>>>) -> Self {
        Self { items, pos: 0 }
    }
}

impl ValueIter for ArrayIter {
    fn next_value(&mut self) -> Option<Value> {
        let value = self.items.borrow().get(self.pos).map(|s| s.borrow().clone())?;
        self.pos += 1;
        Some(value)
    }
}

/// Iterates the values of a dict in insertion order.
///
/// The entry list is re-read on every pull, so entries inserted while the
/// loop runs are visited once the position reaches them.
pub struct DictIter {
    entries: Rc<RefCell<IndexMap<String, Slot>>>,
    pos:     usize,
}

impl DictIter {
    #[must_use]
    pub fn new(entries: Rc<RefCell<IndexMap<String, Slot>>>) -> Self {
        Self { entries, pos: 0 }
    }
}

impl ValueIter for DictIter {
    fn next_value(&mut self) -> Option<Value> {
        let value = self.entries
                        .borrow()
                        .get_index(self.pos)
                        .map(|(_, s)| s.borrow().clone())?;
        self.pos += 1;
        Some(value)
    }
}

/// Builds the iterator for a `for NAME in EXPR` subject.
///
/// Objects supply their own iterator through
/// [`HostObject::make_iter`](crate::interpreter::value::object::HostObject::make_iter);
/// strings iterate per code point, arrays per element, dicts per value.
/// Every other tag is not iterable.
#[must_use]
pub fn make_value_iter(value: &Value) -> Option<Box<dyn ValueIter>> {
    match value {
        Value::Object(obj) => obj.make_iter(),
        Value::Str(s) => Some(Box::new(StringIter::new(s))),
        Value::Array(items) => Some(Box::new(ArrayIter::new(Rc::clone(items)))),
        Value::Dict(entries) => Some(Box::new(DictIter::new(Rc::clone(entries)))),
        _ => None,
    }
}
