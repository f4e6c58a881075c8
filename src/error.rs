/// Evaluation errors.
///
/// Defines all error types that can occur while lexing and evaluating an
/// expression. Each error maps to a stable numeric code so that embedding
/// hosts can translate failures without parsing message text.
pub mod eval_error;
/// Script errors.
///
/// Contains all error types that can be raised while loading, validating, or
/// executing a script. Script errors carry the one-based source line they
/// were detected on.
pub mod script_error;

pub use eval_error::EvalError;
pub use script_error::ScriptError;
