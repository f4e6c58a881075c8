use std::rc::Rc;

use crate::{
    error::EvalError,
    interpreter::{
        lexer::Token,
        parser::core::{Operand, Parser},
        value::core::{Value, fmt_number},
    },
    util::num::f64_to_i64_exact,
};

impl Parser<'_> {
    /// Level 7: a property/subscript chain on the left-hand atom.
    ///
    /// After the atom, consumes `.name` and `[expr]` links for as long as
    /// the current value is an object, dict, or array. A function-valued
    /// object property followed by `(` consumes an argument list and is
    /// invoked; any other link produces the accessed value (a live binding
    /// for dict entries and in-range array elements).
    pub(crate) fn parse_chain(&mut self) -> Option<Operand> {
        let mut current = self.parse_atom()?;

        loop {
            let subject = current.value();
            let dotted = matches!(self.peek(), Some(Token::Dot));
            let indexed = matches!(self.peek(), Some(Token::LBracket));

            current = if dotted && matches!(subject, Value::Object(_) | Value::Dict(_)) {
                self.parse_dot_link(&subject)?
            } else if indexed
                      && matches!(subject, Value::Object(_) | Value::Dict(_) | Value::Array(_))
            {
                self.parse_index_link(&subject)?
            } else {
                break;
            };
        }

        Some(current)
    }

    /// Consumes `.name` (and an argument list when the property is a
    /// method) on an object or dict.
    fn parse_dot_link(&mut self, subject: &Value) -> Option<Operand> {
        self.bump();

        let name = match self.peek().cloned() {
            Some(Token::Identifier(n)) => {
                self.bump();
                n
            },
            _ => {
                self.record(EvalError::Parse);
                return None;
            },
        };

        match subject {
            Value::Object(obj) => {
                let obj = Rc::clone(obj);

                if self.eat(&Token::LParen) {
                    let args = self.parse_expr_list(&Token::RParen)?;
                    return match obj.call_method(&name, &args) {
                        Some(v) => Some(Operand::Value(v)),
                        None => {
                            self.record(EvalError::InvalidObject { name });
                            None
                        },
                    };
                }

                match obj.get_property(&name) {
                    Some(v) => Some(Operand::Value(v)),
                    None => {
                        self.record(EvalError::InvalidObject { name });
                        None
                    },
                }
            },
            Value::Dict(entries) => {
                let found = entries.borrow().get(&name).cloned();
                match found {
                    Some(s) => Some(Operand::Binding(s)),
                    None => {
                        self.record(EvalError::KeyNotFound { key: name });
                        None
                    },
                }
            },
            _ => None,
        }
    }

    /// Consumes `[expr]` on an array, dict, or object.
    ///
    /// Array access returns the element binding when the index is in
    /// range and the empty string when it is not; a non-integral index is
    /// [`EvalError::BadIndex`]. Dict and object subscripts behave like
    /// `.name` with a computed key.
    #[allow(clippy::cast_sign_loss)]
    fn parse_index_link(&mut self, subject: &Value) -> Option<Operand> {
        self.bump();

        let index = self.parse_expression()?;
        if !self.eat(&Token::RBracket) {
            self.record(EvalError::BadIndex);
            return None;
        }
        let index = index.value();

        match subject {
            Value::Array(items) => {
                let Some(i) = f64_to_i64_exact(index.as_number()) else {
                    self.record(EvalError::BadIndex);
                    return None;
                };

                let element = if i >= 0 {
                    items.borrow().get(i as usize).cloned()
                } else {
                    None
                };
                // Out-of-range access reads as the empty string.
                match element {
                    Some(s) => Some(Operand::Binding(s)),
                    None => Some(Operand::Value(Value::str(""))),
                }
            },
            Value::Dict(entries) => {
                let key = match index {
                    Value::Str(s) => s,
                    Value::Number(n) => fmt_number(n),
                    _ => {
                        self.record(EvalError::BadIndex);
                        return None;
                    },
                };

                let found = entries.borrow().get(&key).cloned();
                match found {
                    Some(s) => Some(Operand::Binding(s)),
                    None => {
                        self.record(EvalError::KeyNotFound { key });
                        None
                    },
                }
            },
            Value::Object(obj) => {
                let name = match index {
                    Value::Str(s) => s,
                    Value::Number(n) => fmt_number(n),
                    _ => {
                        self.record(EvalError::BadIndex);
                        return None;
                    },
                };

                match obj.get_property(&name) {
                    Some(v) => Some(Operand::Value(v)),
                    None => {
                        self.record(EvalError::InvalidObject { name });
                        None
                    },
                }
            },
            _ => None,
        }
    }
}
