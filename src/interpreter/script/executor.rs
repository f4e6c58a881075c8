use std::rc::Rc;

use crate::{
    error::{EvalError, ScriptError},
    interpreter::{
        engine::{Engine, Frame, FrameKind},
        parser,
        script::loader::{self, Line, LineKind},
        value::{
            core::{Value, slot},
            iter::make_value_iter,
        },
    },
};

/// The sentinel every executed line returns, directing the block loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    /// Advance to the next sibling, skipping deeper lines.
    NextLine,
    /// The current block is done; signal the caller.
    EndOfBlock,
    /// Unwind to the innermost function frame, then end its block.
    EndOfFn,
    /// Terminate the script.
    Abort,
    /// Unwind to the innermost `while`/`for`; resume at its sibling.
    AbortLoop,
    /// Re-enter the innermost `while`/`for` loop header.
    ContinueLoop,
    /// Jump to the given line.
    Goto(usize),
}

impl Engine {
    /// Loads and validates a script, replacing any previously loaded one.
    ///
    /// # Errors
    /// Any [`ScriptError`] from tokenization or validation.
    pub fn load_script(&mut self, source: &str) -> Result<(), ScriptError> {
        let script = loader::load(source, self.config.spaces)?;
        self.profile = vec![0; script.lines.len()];
        self.script = Some(script);
        Ok(())
    }

    /// Runs the loaded script from the top.
    ///
    /// Global variables surviving from earlier runs (and host-set
    /// variables) stay visible; all other run state is reset, including a
    /// pending stop request.
    ///
    /// # Errors
    /// - [`ScriptError::NoScript`] when nothing is loaded.
    /// - [`ScriptError::Expr`] when a line's expression fails.
    /// - [`ScriptError::LineLimit`] / [`ScriptError::TimeLimit`] /
    ///   [`ScriptError::Stopped`] when a resource bound fires.
    pub fn run(&mut self) -> Result<(), ScriptError> {
        if self.script.is_none() {
            return Err(ScriptError::NoScript);
        }

        self.frames.truncate(1);
        self.returnvalue = Value::num(0.0);
        self.infn = None;
        self.stop_requested = false;
        self.executed_lines = 0;
        self.profile.fill(0);
        self.started = Some(std::time::Instant::now());
        self.iters.clear();

        let result = self.execute_block(0);

        self.iters.clear();
        self.frames.truncate(1);
        result.map(|_| ())
    }

    /// Calls a script-defined function directly.
    ///
    /// # Errors
    /// - [`EvalError::UnknownFunction`] when the script does not define
    ///   `name`.
    /// - Any error raised while the body runs.
    pub fn call_function(&mut self, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        self.call_bridge(name, args)
    }

    /// The bridge that lets the expression evaluator invoke a
    /// script-defined function.
    ///
    /// Pushes a function frame, binds positional arguments by parameter
    /// name (missing parameters stay unbound and auto-create as `0` on
    /// first read), runs the body, pops the frame, and yields the
    /// function's return value.
    pub(crate) fn call_bridge(&mut self, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        let Some(def) = self.script
                            .as_ref()
                            .and_then(|s| s.functions.get(name).cloned())
        else {
            return Err(EvalError::UnknownFunction { name: name.to_string() });
        };

        let mut frame = Frame::new(FrameKind::Def);
        for (param, value) in def.params.iter().zip(args) {
            frame.variables.insert(param.clone(), slot(value.clone()));
        }
        self.frames.push(frame);

        let saved_infn = self.infn;
        let saved_return = std::mem::replace(&mut self.returnvalue, Value::num(0.0));
        self.infn = Some(def.lineno);

        let result = self.execute_block(def.lineno + 1);

        self.frames.pop();
        self.infn = saved_infn;
        let returned = std::mem::replace(&mut self.returnvalue, saved_return);

        match result {
            Ok(_) => Ok(returned),
            Err(ScriptError::Expr { source, .. }) => Err(source),
            Err(other) => Err(EvalError::InvalidArgument { details: other.to_string() }),
        }
    }

    /// Executes the block of sibling lines starting at `start`, following
    /// the sentinel each line returns.
    fn execute_block(&mut self, start: usize) -> Result<Flow, ScriptError> {
        let lines = match &self.script {
            Some(script) => Rc::clone(&script.lines),
            None => return Err(ScriptError::NoScript),
        };
        if start >= lines.len() {
            return Ok(Flow::EndOfBlock);
        }

        let level = lines[start].level;
        let mut last = start;
        while last + 1 < lines.len() && lines[last + 1].level >= level {
            last += 1;
        }

        let mut i = start;
        while i <= last && i < lines.len() {
            self.check_limits()?;
            self.executed_lines += 1;
            if let Some(count) = self.profile.get_mut(i) {
                *count += 1;
            }

            match self.execute_line(&lines, i)? {
                Flow::NextLine => i = i + 1 + lines[i].num_children,
                Flow::Goto(n) => i = n,
                Flow::EndOfBlock => return Ok(Flow::EndOfBlock),
                other => return Ok(other),
            }
        }

        Ok(Flow::EndOfBlock)
    }

    /// Executes one line and returns the sentinel for the block loop.
    fn execute_line(&mut self, lines: &Rc<Vec<Line>>, i: usize) -> Result<Flow, ScriptError> {
        let line = &lines[i];

        match line.kind {
            LineKind::Blank => Ok(Flow::NextLine),
            LineKind::Global => {
                for name in line.tokens[1..].iter().filter(|t| *t != ",") {
                    self.top_frame_mut().globals.push(name.clone());
                }
                Ok(Flow::NextLine)
            },
            LineKind::Return => {
                self.returnvalue = if line.tokens.len() > 1 {
                    self.eval_tokens(&line.tokens[1..], i)?
                } else {
                    Value::num(0.0)
                };

                if self.infn.is_some() {
                    Ok(Flow::EndOfFn)
                } else {
                    Ok(Flow::Abort)
                }
            },
            LineKind::If | LineKind::Elseif => self.execute_if(lines, i),
            LineKind::While => self.execute_while(lines, i),
            LineKind::For => self.execute_for(lines, i),
            LineKind::Break => Ok(Flow::AbortLoop),
            LineKind::Continue => Ok(Flow::ContinueLoop),
            // Definitions are skipped at execution; their bodies only run
            // through the call bridge.
            LineKind::Def => Ok(Flow::EndOfBlock),
            LineKind::Else => Ok(Flow::NextLine),
            LineKind::Expr => {
                self.eval_tokens(&line.tokens, i)?;
                Ok(Flow::NextLine)
            },
        }
    }

    /// Executes an `if` or `elseif` line.
    ///
    /// A truthy condition runs the child block and jumps past the rest of
    /// the `elseif`/`else` chain. A falsy one inspects the next sibling:
    /// an `elseif` is re-entered as a jump, an `else` runs its block, and
    /// anything else just advances.
    fn execute_if(&mut self, lines: &Rc<Vec<Line>>, i: usize) -> Result<Flow, ScriptError> {
        let line = &lines[i];
        let cond = self.eval_tokens(&line.tokens[1..], i)?;

        if cond.is_truthy() {
            let kind = if line.kind == LineKind::If { FrameKind::If } else { FrameKind::Elseif };
            let flow = self.execute_child_block(kind, i + 1)?;
            return match flow {
                Flow::EndOfFn | Flow::Abort | Flow::AbortLoop | Flow::ContinueLoop => Ok(flow),
                _ => Ok(Flow::Goto(skip_chain(lines, i))),
            };
        }

        let sibling = i + 1 + line.num_children;
        if let Some(next) = lines.get(sibling)
           && next.level == line.level
        {
            match next.kind {
                LineKind::Elseif => return Ok(Flow::Goto(sibling)),
                LineKind::Else => {
                    let flow = self.execute_child_block(FrameKind::Else, sibling + 1)?;
                    return match flow {
                        Flow::EndOfFn | Flow::Abort | Flow::AbortLoop | Flow::ContinueLoop => {
                            Ok(flow)
                        },
                        _ => Ok(Flow::Goto(skip_chain(lines, sibling))),
                    };
                },
                _ => {},
            }
        }

        Ok(Flow::NextLine)
    }

    /// Executes a `while` line: a truthy condition runs the child block
    /// once, then re-enters the header as a jump so the limits apply per
    /// iteration.
    fn execute_while(&mut self, lines: &Rc<Vec<Line>>, i: usize) -> Result<Flow, ScriptError> {
        let line = &lines[i];
        let cond = self.eval_tokens(&line.tokens[1..], i)?;

        if !cond.is_truthy() {
            return Ok(Flow::NextLine);
        }

        let flow = self.execute_child_block(FrameKind::While, i + 1)?;
        match flow {
            Flow::AbortLoop => Ok(Flow::NextLine),
            Flow::EndOfFn | Flow::Abort => Ok(flow),
            _ => Ok(Flow::Goto(i)),
        }
    }

    /// Executes a `for NAME in EXPR` line.
    ///
    /// The first entry evaluates the subject and builds its iterator,
    /// keyed to this line; every entry pulls one value, binds it, and runs
    /// the child block. Exhaustion, `break`, `return`, and abort all clear
    /// the iterator.
    fn execute_for(&mut self, lines: &Rc<Vec<Line>>, i: usize) -> Result<Flow, ScriptError> {
        let line = &lines[i];

        if !self.iters.contains_key(&i) {
            let subject = self.eval_tokens(&line.tokens[3..], i)?;
            let Some(iter) = make_value_iter(&subject) else {
                return Err(ScriptError::Expr { source: EvalError::InvalidArgument { details:
                                                   format!("cannot iterate a {}", subject.tag()) },
                                               lineno: i + 1, });
            };
            self.iters.insert(i, iter);
        }

        let next = self.iters.get_mut(&i).and_then(|it| it.next_value());
        let Some(value) = next else {
            self.iters.remove(&i);
            return Ok(Flow::NextLine);
        };

        self.set_variable(&line.tokens[1], value);

        let flow = self.execute_child_block(FrameKind::For, i + 1)?;
        match flow {
            Flow::AbortLoop => {
                self.iters.remove(&i);
                Ok(Flow::NextLine)
            },
            Flow::EndOfFn | Flow::Abort => {
                self.iters.remove(&i);
                Ok(flow)
            },
            _ => Ok(Flow::Goto(i)),
        }
    }

    /// Pushes a frame, runs the child block, and pops the frame again —
    /// also on error, so abnormal exits cannot leak scopes.
    fn execute_child_block(&mut self, kind: FrameKind, start: usize) -> Result<Flow, ScriptError> {
        self.frames.push(Frame::new(kind));
        let flow = self.execute_block(start);
        self.frames.pop();
        flow
    }

    /// Joins the tokens back into expression text and evaluates it.
    fn eval_tokens(&mut self, tokens: &[String], i: usize) -> Result<Value, ScriptError> {
        let text = tokens.join(" ");
        parser::core::parse(self, &text).map_err(|source| ScriptError::Expr { source,
                                                                             lineno: i + 1 })
    }

    /// Enforces the cooperative stop flag and the two resource bounds.
    /// Checked at every line boundary.
    fn check_limits(&self) -> Result<(), ScriptError> {
        if self.stop_requested {
            return Err(ScriptError::Stopped);
        }
        if self.executed_lines > self.config.max_lines {
            return Err(ScriptError::LineLimit);
        }
        if let Some(started) = self.started
           && u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX)
              > self.config.max_micros
        {
            return Err(ScriptError::TimeLimit);
        }
        Ok(())
    }
}

/// Returns the line index just past an `if` line's `elseif`/`else` chain.
fn skip_chain(lines: &[Line], i: usize) -> usize {
    let level = lines[i].level;
    let mut j = i + 1 + lines[i].num_children;

    while let Some(line) = lines.get(j) {
        if line.level != level || !matches!(line.kind, LineKind::Elseif | LineKind::Else) {
            break;
        }
        j = j + 1 + line.num_children;
    }
    j
}
