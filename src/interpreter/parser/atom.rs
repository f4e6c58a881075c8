use std::rc::Rc;

use crate::{
    error::EvalError,
    interpreter::{
        lexer::Token,
        parser::core::{Operand, Parser},
        registry::VarOp,
        value::core::{Value, fmt_number},
    },
};

impl Parser<'_> {
    /// Parses an atom, the leaves of the grammar.
    ///
    /// An atom is a numeric literal (optionally preceded by `-`), a string
    /// literal, a function call, an array or dict literal, a parenthesized
    /// expression, or an identifier resolved against constants, host
    /// variables, objects, and script variables, in that order.
    pub(crate) fn parse_atom(&mut self) -> Option<Operand> {
        match self.peek().cloned() {
            Some(Token::Number(n)) => {
                self.bump();
                Some(Operand::Value(Value::num(n)))
            },
            Some(Token::Minus) => {
                // A leading minus only forms a negative numeric literal.
                if let Some(Token::Number(n)) = self.peek_at(self.pos + 1).cloned() {
                    self.bump();
                    self.bump();
                    return Some(Operand::Value(Value::num(-n)));
                }
                None
            },
            Some(Token::Str(s)) => {
                self.bump();
                Some(Operand::Value(Value::Str(s)))
            },
            Some(Token::LParen) => {
                let save = self.pos;
                self.bump();

                let inner = self.parse_expression()?;
                if !self.eat(&Token::RParen) {
                    self.pos = save;
                    return None;
                }
                Some(Operand::Value(inner.value()))
            },
            Some(Token::LBracket) => self.parse_array_literal(),
            Some(Token::LBrace) => self.parse_dict_literal(),
            Some(Token::Identifier(name)) => {
                if self.peek_at(self.pos + 1) == Some(&Token::LParen) {
                    self.bump();
                    self.bump();
                    return self.parse_call(name);
                }
                self.bump();
                self.resolve_identifier(name)
            },
            _ => None,
        }
    }

    /// Parses `[e, …]` into an array value.
    fn parse_array_literal(&mut self) -> Option<Operand> {
        self.bump();
        let items = self.parse_expr_list(&Token::RBracket)?;
        Some(Operand::Value(Value::array(items)))
    }

    /// Parses `{key: expr, …}` into a dict value.
    ///
    /// Keys are identifiers, quoted strings, or numbers (stringified
    /// canonically). A missing key records [`EvalError::DictName`], a
    /// missing `:` records [`EvalError::DictColon`].
    fn parse_dict_literal(&mut self) -> Option<Operand> {
        self.bump();
        let mut entries = Vec::new();

        if self.eat(&Token::RBrace) {
            return Some(Operand::Value(Value::dict(entries)));
        }

        loop {
            let key = match self.peek().cloned() {
                Some(Token::Identifier(k)) => k,
                Some(Token::Str(k)) => k,
                Some(Token::Number(n)) => fmt_number(n),
                _ => {
                    self.record(EvalError::DictName);
                    return None;
                },
            };
            self.bump();

            if !self.eat(&Token::Colon) {
                self.record(EvalError::DictColon);
                return None;
            }

            let value = self.parse_expression()?.value();
            entries.push((key, value));

            if self.eat(&Token::Comma) {
                continue;
            }
            if self.eat(&Token::RBrace) {
                break;
            }
            self.record(EvalError::DictName);
            return None;
        }

        Some(Operand::Value(Value::dict(entries)))
    }

    /// Parses a call's argument list and invokes `name`.
    ///
    /// Registry functions are tried first (with their arity range), then
    /// script-defined functions through the call bridge. The cursor already
    /// sits past the opening parenthesis.
    fn parse_call(&mut self, name: String) -> Option<Operand> {
        let args = self.parse_expr_list(&Token::RParen)?;

        if let Some(entry) = self.engine.registry.function(&name) {
            if !entry.accepts(args.len()) {
                self.record(EvalError::Arity { name });
                return None;
            }

            let callable = Rc::clone(&entry.callable);
            return match callable(self.engine, &args) {
                Ok(v) => Some(Operand::Value(v)),
                Err(e) => {
                    self.record(e);
                    None
                },
            };
        }

        if self.engine
               .script
               .as_ref()
               .is_some_and(|s| s.functions.contains_key(&name))
        {
            return match self.engine.call_bridge(&name, &args) {
                Ok(v) => Some(Operand::Value(v)),
                Err(e) => {
                    self.record(e);
                    None
                },
            };
        }

        self.record(EvalError::UnknownFunction { name });
        None
    }

    /// Parses a comma-separated expression list up to `closer`. The list
    /// may be empty.
    pub(crate) fn parse_expr_list(&mut self, closer: &Token) -> Option<Vec<Value>> {
        let mut items = Vec::new();

        if self.eat(closer) {
            return Some(items);
        }

        loop {
            items.push(self.parse_expression()?.value());

            if self.eat(&Token::Comma) {
                continue;
            }
            if self.eat(closer) {
                return Some(items);
            }
            return None;
        }
    }

    /// Resolves a bare identifier.
    ///
    /// Order: registered constants, then the host variable callback
    /// (`Read`), then registered objects, then script variables. Script
    /// variable reads always succeed by auto-creating a `Number 0` binding
    /// on the innermost scope.
    fn resolve_identifier(&mut self, name: String) -> Option<Operand> {
        if let Some(v) = self.engine.registry.constant(&name) {
            return Some(Operand::Value(v));
        }

        if let Some(cb) = self.engine.config.variable_fn.clone()
           && let Some(value) = cb(self.engine, VarOp::Read, &name, None)
        {
            return Some(Operand::HostVar { name, value });
        }

        if let Some(obj) = self.engine.registry.object(&name) {
            return Some(Operand::Value(Value::Object(obj)));
        }

        Some(Operand::Binding(self.engine.read_slot(&name)))
    }
}
