use std::{collections::HashMap, rc::Rc};

use crate::{
    error::ScriptError,
    interpreter::{registry::is_usable_name, script::tokenizer::tokenize_line},
};

/// What statement a line carries, derived from its first token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// An empty or comment-only line.
    Blank,
    If,
    Elseif,
    Else,
    While,
    For,
    Def,
    Return,
    Break,
    Continue,
    Global,
    /// Anything else: the tokens are re-joined and evaluated as a bare
    /// expression.
    Expr,
}

impl LineKind {
    fn classify(first: &str) -> Self {
        match first {
            "if" => Self::If,
            "elseif" => Self::Elseif,
            "else" => Self::Else,
            "while" => Self::While,
            "for" => Self::For,
            "def" => Self::Def,
            "return" => Self::Return,
            "break" => Self::Break,
            "continue" => Self::Continue,
            "global" => Self::Global,
            _ => Self::Expr,
        }
    }
}

/// One preparsed script line.
#[derive(Debug, Clone)]
pub struct Line {
    /// Zero-based position in the line array.
    pub lineno:       usize,
    /// The line's tokens, split by [`tokenize_line`].
    pub tokens:       Vec<String>,
    /// The statement kind, from the first token.
    pub kind:         LineKind,
    /// Indentation depth in units of the configured width.
    pub level:        usize,
    /// How many of the following contiguous lines are strictly deeper.
    pub num_children: usize,
}

/// A function defined by the script, indexed at load time.
#[derive(Debug, Clone)]
pub struct FunctionDef {
    /// The `def` line's position.
    pub lineno: usize,
    /// The parameter names, in order.
    pub params: Vec<String>,
}

/// A loaded, validated script.
pub struct Script {
    /// The preparsed lines, built once at load.
    pub lines:     Rc<Vec<Line>>,
    /// Function name → definition.
    pub functions: HashMap<String, FunctionDef>,
}

/// Loads and validates script source.
///
/// Indentation must be ASCII spaces in whole multiples of `spaces`; tabs
/// and carriage returns are trimmed from line ends and rejected as
/// indentation. Structural rules are checked up front so the executor can
/// assume a well-formed line array.
///
/// # Errors
/// Any [`ScriptError`] with the offending one-based line number.
pub fn load(source: &str, spaces: usize) -> Result<Script, ScriptError> {
    let mut lines = Vec::new();

    for (index, raw) in source.split('\n').enumerate() {
        let lineno = index + 1;
        let trimmed = raw.trim_end_matches(['\t', '\r']);

        if trimmed.trim().is_empty() {
            lines.push(Line { lineno:       index,
                              tokens:       Vec::new(),
                              kind:         LineKind::Blank,
                              level:        0,
                              num_children: 0, });
            continue;
        }

        let stripped = trimmed.trim_start_matches(' ');
        if stripped.starts_with('\t') {
            return Err(ScriptError::TabIndent { lineno });
        }

        let indent = trimmed.len() - stripped.len();
        if indent % spaces != 0 {
            return Err(ScriptError::BadIndent { lineno });
        }
        let level = indent / spaces;

        let tokens = tokenize_line(stripped).ok_or(ScriptError::DanglingQuote { lineno })?;
        let kind = match tokens.first() {
            Some(first) => LineKind::classify(first),
            None => LineKind::Blank,
        };

        lines.push(Line { lineno: index,
                          tokens,
                          kind,
                          level,
                          num_children: 0 });
    }

    for i in 0..lines.len() {
        let mut j = i + 1;
        while j < lines.len() && lines[j].level > lines[i].level {
            j += 1;
        }
        lines[i].num_children = j - i - 1;
    }

    let functions = validate(&lines)?;

    Ok(Script { lines: Rc::new(lines),
                functions })
}

/// Runs the structural checks and builds the function table.
fn validate(lines: &[Line]) -> Result<HashMap<String, FunctionDef>, ScriptError> {
    let mut functions: HashMap<String, FunctionDef> = HashMap::new();

    for (i, line) in lines.iter().enumerate() {
        let lineno = i + 1;

        match line.kind {
            LineKind::If | LineKind::Elseif | LineKind::Else | LineKind::While | LineKind::For
            | LineKind::Def => {
                let child_ok = line.num_children > 0
                               && lines.get(i + 1).is_some_and(|l| l.level == line.level + 1);
                if !child_ok {
                    return Err(ScriptError::EmptyBlock { lineno });
                }
            },
            _ => {},
        }

        match line.kind {
            LineKind::Def => {
                if line.level != 0 {
                    return Err(ScriptError::NestedDef { lineno });
                }

                let def = parse_def(line, lineno)?;
                let name = line.tokens[1].clone();
                if functions.insert(name.clone(), def).is_some() {
                    return Err(ScriptError::DuplicateFunction { name, lineno });
                }
            },
            LineKind::For => {
                let shaped = line.tokens.len() >= 4
                             && line.tokens[2] == "in"
                             && is_usable_name(&line.tokens[1]);
                if !shaped {
                    return Err(ScriptError::BadFor { lineno });
                }
            },
            LineKind::Global => {
                let inside_def = lines.iter().enumerate().any(|(d, def_line)| {
                                     def_line.kind == LineKind::Def
                                     && d < i
                                     && i <= d + def_line.num_children
                                 });
                if !inside_def {
                    return Err(ScriptError::GlobalOutsideDef { lineno });
                }

                for name in line.tokens[1..].iter().filter(|t| *t != ",") {
                    if !is_usable_name(name) {
                        return Err(ScriptError::ReservedName { name: name.clone(), lineno });
                    }
                }
            },
            LineKind::Elseif | LineKind::Else => {
                let prev = previous_sibling(lines, i);
                let chained = matches!(prev, Some(LineKind::If | LineKind::Elseif));
                if !chained {
                    return Err(ScriptError::DanglingElse { lineno });
                }
            },
            _ => {},
        }
    }

    Ok(functions)
}

/// Parses and validates a `def NAME ( ARG (, ARG)* )` line.
fn parse_def(line: &Line, lineno: usize) -> Result<FunctionDef, ScriptError> {
    let tokens = &line.tokens;
    let shaped = tokens.len() >= 4
                 && tokens[2] == "("
                 && tokens.last().is_some_and(|t| t == ")");
    if !shaped {
        return Err(ScriptError::BadDef { details: "expected 'def NAME(ARGS)'".to_string(),
                                         lineno });
    }

    let name = &tokens[1];
    if !is_usable_name(name) {
        return Err(ScriptError::ReservedName { name: name.clone(), lineno });
    }

    let mut params = Vec::new();
    for token in tokens[3..tokens.len() - 1].iter().filter(|t| *t != ",") {
        if !is_usable_name(token) {
            return Err(ScriptError::ReservedName { name: token.clone(), lineno });
        }
        if params.contains(token) {
            return Err(ScriptError::BadDef { details: format!("duplicate parameter '{token}'"),
                                             lineno });
        }
        params.push(token.clone());
    }

    Ok(FunctionDef { lineno: line.lineno,
                     params })
}

/// Finds the statement kind of the closest earlier line at the same level,
/// stopping when the nesting leaves the block.
fn previous_sibling(lines: &[Line], index: usize) -> Option<LineKind> {
    let level = lines[index].level;
    let mut j = index;
    while j > 0 {
        j -= 1;
        if lines[j].level == level {
            return Some(lines[j].kind);
        }
        if lines[j].level < level {
            return None;
        }
    }
    None
}
