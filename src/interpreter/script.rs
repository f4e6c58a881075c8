/// Per-line token splitting.
///
/// Splits one script line into tokens, honoring quoted substrings,
/// parenthesized spans, and `//` comments.
pub mod tokenizer;
/// Script loading and validation.
///
/// Turns source text into the preparsed line array: indentation becomes a
/// nesting level, every line is tokenized and classified, structural rules
/// are checked, and function definitions are indexed by name.
pub mod loader;
/// Script execution.
///
/// The tree-walking state machine that runs the preparsed lines: block
/// ranges, control-flow sentinels, frames, the `for` iterator protocol,
/// resource limits, and the bridge that lets expressions call
/// script-defined functions.
pub mod executor;
