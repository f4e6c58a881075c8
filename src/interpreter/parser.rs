/// Core parser state and the operator precedence chain.
///
/// Declares the cursor-based parser that evaluates an expression while
/// descending it: each precedence level parses the next-higher level, then
/// folds operators left-to-right, backtracking by restoring the saved
/// cursor when an operator's right-hand side does not parse.
pub mod core;
/// Leaf parsing.
///
/// Parses the atoms of the grammar: numeric and string literals, array and
/// dict literals, function calls, parenthesized expressions, and
/// identifier resolution against constants, host variables, objects, and
/// script variables.
pub mod atom;
/// Property and subscript chains.
///
/// Parses `.name` and `[expr]` chains on objects, dicts, and arrays,
/// including method dispatch on function-valued object properties.
pub mod chain;
