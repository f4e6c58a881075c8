//! # scriptum
//!
//! scriptum is an embeddable expression and script interpreter written in
//! Rust. A host application registers constants, variables, callback
//! functions, and objects; users submit expression text or small indented
//! scripts; the engine hands back tagged runtime values.

#![warn(
    clippy::redundant_clone,
    clippy::needless_pass_by_value,
    clippy::similar_names,
    clippy::large_enum_variant,
    clippy::string_lit_as_bytes,
    clippy::match_same_arms,
    clippy::cargo,
    clippy::nursery,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    clippy::correctness,
    clippy::complexity,
    clippy::pedantic,
)]
#![allow(clippy::missing_errors_doc)]

/// Provides unified error types for evaluation and script execution.
///
/// This module defines all errors the engine can raise. Expression errors
/// carry stable numeric codes for host mapping; script errors carry the
/// one-based source line they were detected on.
///
/// # Responsibilities
/// - Defines error enums for the expression and script layers.
/// - Keeps the numeric code contract stable across releases.
/// - Supports integration with standard error handling traits.
pub mod error;
/// Orchestrates the entire process of evaluation and script execution.
///
/// This module ties together lexing, parsing-while-evaluating, the value
/// model, registries, the script layer, and the built-in helper packs. It
/// exposes the public API for embedding the engine.
///
/// # Responsibilities
/// - Coordinates all core components: lexer, parser, executor, values.
/// - Provides entry points for evaluating expressions and running
///   scripts.
/// - Manages the flow of data and errors between phases.
pub mod interpreter;
/// General utilities for safe numeric conversion.
///
/// Reusable helpers shared by the operators, indexing, and the range
/// constructor.
///
/// # Responsibilities
/// - Safely convert between `i64` and `f64` without silent data loss.
pub mod util;

pub use error::{EvalError, ScriptError};
pub use interpreter::{
    engine::Engine,
    registry::{Config, VarOp},
    value::{
        core::Value,
        object::{HostObject, Method, PropertyTable},
    },
};

/// Evaluates one expression with a fresh, default-configured engine.
///
/// This is the quickest way to try the expression language; embedding
/// hosts that need registrations or scripts should build an [`Engine`]
/// instead.
///
/// # Errors
/// Returns any [`EvalError`] the expression raises.
///
/// # Examples
/// ```
/// use scriptum::{Value, eval_source};
///
/// assert_eq!(eval_source("5*(4-3)*2").unwrap(), Value::num(10.0));
///
/// // 'min' flattens array arguments.
/// assert_eq!(eval_source("min(10,11,12*4,-4-7,15)").unwrap(), Value::num(-11.0));
/// ```
pub fn eval_source(source: &str) -> Result<Value, EvalError> {
    Engine::new(Config::default()).eval(source)
}

/// Loads and runs a script with a fresh, default-configured engine,
/// returning the engine so results can be inspected.
///
/// # Errors
/// Returns any [`ScriptError`] from loading or running.
///
/// # Examples
/// ```
/// use scriptum::{Value, run_source};
///
/// let mut engine = run_source("s = 0\nfor i in 1:4\n  s = s + i").unwrap();
/// assert_eq!(engine.variable("s"), Some(Value::num(10.0)));
/// ```
pub fn run_source(source: &str) -> Result<Engine, ScriptError> {
    let mut engine = Engine::new(Config::default());
    engine.load_script(source)?;
    engine.run()?;
    Ok(engine)
}
