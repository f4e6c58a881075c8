use crate::{
    error::EvalError,
    interpreter::{
        engine::Engine,
        lexer::{Token, lex},
        ops,
        registry::VarOp,
        value::core::{Slot, Value},
    },
};

/// Parses and evaluates a full input: one expression, or several separated
/// by semicolons with the last value winning. A trailing semicolon is
/// permitted.
///
/// # Errors
/// The first hard error recorded during the parse; [`EvalError::TrailingJunk`]
/// when input remains after the last expression.
pub(crate) fn parse(engine: &mut Engine, input: &str) -> Result<Value, EvalError> {
    let tokens = lex(input)?;
    Parser::new(engine, tokens).parse_program()
}

/// What a grammar non-terminal produces: a plain value, or a live binding.
///
/// Bindings keep assignment observable: writing through a `Binding` mutates
/// the shared slot every alias sees, and writing to a `HostVar` notifies
/// the host variable callback.
pub(crate) enum Operand {
    /// A plain temporary value.
    Value(Value),
    /// A shared binding slot (script variable, array element, dict entry).
    Binding(Slot),
    /// A value owned by the host variable callback.
    HostVar {
        name:  String,
        value: Value,
    },
}

impl Operand {
    /// Reads the operand's current value.
    pub fn value(&self) -> Value {
        match self {
            Self::Value(v) => v.clone(),
            Self::Binding(s) => s.borrow().clone(),
            Self::HostVar { value, .. } => value.clone(),
        }
    }
}

/// The expression parser.
///
/// Holds the token vector and an index cursor into it. Backtracking is
/// saving and restoring the index. Hard errors are recorded once
/// (first-error-wins) and surface from [`Parser::parse_program`]; grammar
/// misses return `None` so the caller can backtrack.
pub(crate) struct Parser<'e> {
    pub(crate) engine: &'e mut Engine,
    tokens:            Vec<Token>,
    pub(crate) pos:    usize,
    error:             Option<EvalError>,
}

impl<'e> Parser<'e> {
    pub fn new(engine: &'e mut Engine, tokens: Vec<Token>) -> Self {
        Self { engine,
               tokens,
               pos: 0,
               error: None }
    }

    /// Runs the semicolon-separated expression list and applies the
    /// first-error-wins rule.
    fn parse_program(mut self) -> Result<Value, EvalError> {
        let mut result = None;

        loop {
            match self.parse_expression() {
                Some(op) => result = Some(op.value()),
                None => return Err(self.take_error()),
            }

            if self.eat(&Token::Semicolon) {
                if self.at_end() {
                    break;
                }
                continue;
            }
            break;
        }

        if let Some(err) = self.error.take() {
            return Err(err);
        }
        if !self.at_end() {
            return Err(EvalError::TrailingJunk);
        }

        result.ok_or(EvalError::Empty)
    }

    /// Parses one expression, starting at the lowest precedence level.
    pub(crate) fn parse_expression(&mut self) -> Option<Operand> {
        self.parse_or()
    }

    /// Level 1: `||`, left-associative.
    fn parse_or(&mut self) -> Option<Operand> {
        let mut left = self.parse_and()?;
        loop {
            let save = self.pos;
            if !self.eat(&Token::DoublePipe) {
                break;
            }
            let Some(right) = self.parse_and() else {
                self.pos = save;
                break;
            };
            left = self.apply_binary("||", &left, &right)?;
        }
        Some(left)
    }

    /// Level 2: `&&`, left-associative.
    fn parse_and(&mut self) -> Option<Operand> {
        let mut left = self.parse_bitwise()?;
        loop {
            let save = self.pos;
            if !self.eat(&Token::DoubleAmpersand) {
                break;
            }
            let Some(right) = self.parse_bitwise() else {
                self.pos = save;
                break;
            };
            left = self.apply_binary("&&", &left, &right)?;
        }
        Some(left)
    }

    /// Level 3: `|`, `&`, `^`, left-associative.
    fn parse_bitwise(&mut self) -> Option<Operand> {
        let mut left = self.parse_comparison()?;
        loop {
            let save = self.pos;
            let op = match self.peek() {
                Some(Token::Pipe) => "|",
                Some(Token::Ampersand) => "&",
                Some(Token::Caret) => "^",
                _ => break,
            };
            self.pos += 1;

            let Some(right) = self.parse_comparison() else {
                self.pos = save;
                break;
            };
            left = self.apply_binary(op, &left, &right)?;
        }
        Some(left)
    }

    /// Level 4: comparisons and assignments, left-associative.
    ///
    /// Assignment operators share this level; `op=` desugars to
    /// `assign(L, binop(L, op, R))`, so host overloads participate in
    /// compound assignment too.
    fn parse_comparison(&mut self) -> Option<Operand> {
        let mut left = self.parse_sum()?;
        loop {
            let save = self.pos;
            let (op, assigns) = match self.peek() {
                Some(Token::TripleEqual) => ("===", false),
                Some(Token::BangDoubleEqual) => ("!==", false),
                Some(Token::EqualEqual) => ("==", false),
                Some(Token::BangEqual) => ("!=", false),
                Some(Token::LessEqual) => ("<=", false),
                Some(Token::GreaterEqual) => (">=", false),
                Some(Token::Less) => ("<", false),
                Some(Token::Greater) => (">", false),
                Some(Token::Equals) => ("=", true),
                Some(Token::PlusAssign) => ("+", true),
                Some(Token::MinusAssign) => ("-", true),
                Some(Token::MulAssign) => ("*", true),
                Some(Token::DivAssign) => ("/", true),
                Some(Token::AndAssign) => ("&", true),
                Some(Token::OrAssign) => ("|", true),
                Some(Token::XorAssign) => ("^", true),
                _ => break,
            };
            self.pos += 1;

            let Some(right) = self.parse_sum() else {
                self.pos = save;
                break;
            };
            left = if assigns {
                let new_value = if op == "=" {
                    right.value()
                } else {
                    self.apply_binary(op, &left, &right)?.value()
                };
                self.assign(left, new_value)
            } else {
                self.apply_binary(op, &left, &right)?
            };
        }
        Some(left)
    }

    /// Level 5: `+`, `-`, left-associative.
    fn parse_sum(&mut self) -> Option<Operand> {
        let mut left = self.parse_term()?;
        loop {
            let save = self.pos;
            let op = match self.peek() {
                Some(Token::Plus) => "+",
                Some(Token::Minus) => "-",
                _ => break,
            };
            self.pos += 1;

            let Some(right) = self.parse_term() else {
                self.pos = save;
                break;
            };
            left = self.apply_binary(op, &left, &right)?;
        }
        Some(left)
    }

    /// Level 6: `*`, `/`, `%`, and the range constructor `:`,
    /// left-associative.
    fn parse_term(&mut self) -> Option<Operand> {
        let mut left = self.parse_chain()?;
        loop {
            let save = self.pos;
            let op = match self.peek() {
                Some(Token::Star) => "*",
                Some(Token::Slash) => "/",
                Some(Token::Percent) => "%",
                Some(Token::Colon) => ":",
                _ => break,
            };
            self.pos += 1;

            let Some(right) = self.parse_chain() else {
                self.pos = save;
                break;
            };
            left = self.apply_binary(op, &left, &right)?;
        }
        Some(left)
    }

    /// Dispatches one binary operation: the host overload hook first (a
    /// `Number 0` result defers), then the built-in semantics.
    fn apply_binary(&mut self, op: &str, left: &Operand, right: &Operand) -> Option<Operand> {
        let l = left.value();
        let r = right.value();

        if let Some(overload) = self.engine.config.overloads.get(op).cloned() {
            match overload(self.engine, &l, op, &r) {
                Ok(v) => {
                    if !matches!(v, Value::Number(n) if n == 0.0) {
                        return Some(Operand::Value(v));
                    }
                },
                Err(e) => {
                    self.record(e);
                    return None;
                },
            }
        }

        ops::binary_op(op, &l, &r).map(Operand::Value)
    }

    /// Writes `value` through the target operand.
    ///
    /// Bindings mutate their shared slot in place, host variables notify
    /// the variable callback, and plain temporaries just take on the new
    /// value. The result is the target, now holding `value`.
    fn assign(&mut self, target: Operand, value: Value) -> Operand {
        match target {
            Operand::Binding(s) => {
                *s.borrow_mut() = value;
                Operand::Binding(s)
            },
            Operand::HostVar { name, .. } => {
                if let Some(cb) = self.engine.config.variable_fn.clone() {
                    cb(self.engine, VarOp::Set, &name, Some(&value));
                }
                Operand::HostVar { name, value }
            },
            Operand::Value(_) => Operand::Value(value),
        }
    }

    // ---- cursor helpers ----

    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    pub(crate) fn peek_at(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub(crate) fn bump(&mut self) {
        self.pos += 1;
    }

    pub(crate) fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            return true;
        }
        false
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Records a hard error. The first recorded error wins; later ones are
    /// dropped.
    pub(crate) fn record(&mut self, error: EvalError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn take_error(&mut self) -> EvalError {
        self.error.take().unwrap_or(EvalError::Parse)
    }
}
