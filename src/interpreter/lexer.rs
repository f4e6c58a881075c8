use logos::Logos;

use crate::error::EvalError;

/// Lexing failures, carried as the `logos` error type.
///
/// These are mapped onto [`EvalError`] codes before they leave the
/// interpreter.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexError {
    /// A character that no token matches.
    #[default]
    Unexpected,
    /// A string literal was opened but never closed.
    DanglingQuote,
    /// A backslash escape was started but never completed.
    DanglingBackslash,
}

impl From<LexError> for EvalError {
    fn from(e: LexError) -> Self {
        match e {
            LexError::Unexpected => Self::Parse,
            LexError::DanglingQuote => Self::DanglingQuote,
            LexError::DanglingBackslash => Self::DanglingBackslash,
        }
    }
}

/// Represents a lexical token of the expression language.
///
/// Whitespace outside string literals is skipped by the lexer, so the parser
/// never sees it. Multi-character operators are matched longest-first
/// (`===` before `==` before `=`).
#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(error = LexError)]
pub enum Token {
    /// Numeric literal tokens, such as `42` or `3.14`. A leading minus is
    /// handled at the atom level so binary minus survives lexing.
    #[regex(r"[0-9]+(\.[0-9]+)?", parse_number)]
    Number(f64),
    /// String literal tokens between double quotes. Escapes are processed
    /// here; the payload is the decoded text.
    #[regex(r#""([^"\\]|\\.)*""#, parse_string)]
    Str(String),
    /// An opened string literal with no closing quote. Never produced; the
    /// callback always raises [`LexError::DanglingQuote`].
    #[regex(r#""([^"\\]|\\.)*"#, unterminated_string)]
    Unterminated,
    /// Identifier tokens; variable, constant, object, or function names.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),
    /// `===`
    #[token("===")]
    TripleEqual,
    /// `!==`
    #[token("!==")]
    BangDoubleEqual,
    /// `==`
    #[token("==")]
    EqualEqual,
    /// `!=`
    #[token("!=")]
    BangEqual,
    /// `<=`
    #[token("<=")]
    LessEqual,
    /// `>=`
    #[token(">=")]
    GreaterEqual,
    /// `<`
    #[token("<")]
    Less,
    /// `>`
    #[token(">")]
    Greater,
    /// `||`
    #[token("||")]
    DoublePipe,
    /// `&&`
    #[token("&&")]
    DoubleAmpersand,
    /// `+=`
    #[token("+=")]
    PlusAssign,
    /// `-=`
    #[token("-=")]
    MinusAssign,
    /// `*=`
    #[token("*=")]
    MulAssign,
    /// `/=`
    #[token("/=")]
    DivAssign,
    /// `&=`
    #[token("&=")]
    AndAssign,
    /// `|=`
    #[token("|=")]
    OrAssign,
    /// `^=`
    #[token("^=")]
    XorAssign,
    /// `=`
    #[token("=")]
    Equals,
    /// `|`
    #[token("|")]
    Pipe,
    /// `&`
    #[token("&")]
    Ampersand,
    /// `^`
    #[token("^")]
    Caret,
    /// `+`
    #[token("+")]
    Plus,
    /// `-`
    #[token("-")]
    Minus,
    /// `*`
    #[token("*")]
    Star,
    /// `/`
    #[token("/")]
    Slash,
    /// `%`
    #[token("%")]
    Percent,
    /// `:`
    #[token(":")]
    Colon,
    /// `.`
    #[token(".")]
    Dot,
    /// `,`
    #[token(",")]
    Comma,
    /// `;`
    #[token(";")]
    Semicolon,
    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
    /// `[`
    #[token("[")]
    LBracket,
    /// `]`
    #[token("]")]
    RBracket,
    /// `{`
    #[token("{")]
    LBrace,
    /// `}`
    #[token("}")]
    RBrace,
}

/// Tokenizes a full expression.
///
/// # Errors
/// - [`EvalError::Empty`] if the input contains no tokens at all.
/// - [`EvalError::DanglingQuote`] / [`EvalError::DanglingBackslash`] for
///   malformed string literals.
/// - [`EvalError::Parse`] for any character no token matches.
pub fn lex(input: &str) -> Result<Vec<Token>, EvalError> {
    let mut tokens = Vec::new();

    for token in Token::lexer(input) {
        tokens.push(token.map_err(EvalError::from)?);
    }

    if tokens.is_empty() {
        return Err(EvalError::Empty);
    }

    Ok(tokens)
}

/// Parses a numeric literal from the current token slice.
fn parse_number(lex: &logos::Lexer<Token>) -> Option<f64> {
    lex.slice().parse().ok()
}

/// Decodes a complete string literal, processing backslash escapes.
///
/// Recognized escapes are `\n \r \t \b \" \\` and `\uXXXX` with exactly four
/// hex digits. Any other escaped character is kept verbatim.
fn parse_string(lex: &logos::Lexer<Token>) -> Result<String, LexError> {
    let slice = lex.slice();
    let raw = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('b') => out.push('\u{0008}'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('u') => {
                let mut code = 0u32;
                for _ in 0..4 {
                    let digit = chars.next()
                                     .and_then(|h| h.to_digit(16))
                                     .ok_or(LexError::DanglingBackslash)?;
                    code = (code << 4) | digit;
                }
                out.push(char::from_u32(code).ok_or(LexError::DanglingBackslash)?);
            },
            Some(other) => out.push(other),
            None => return Err(LexError::DanglingBackslash),
        }
    }

    Ok(out)
}

/// Raises the dangling-quote error for an unclosed string literal.
fn unterminated_string(_lex: &logos::Lexer<Token>) -> Result<(), LexError> {
    Err(LexError::DanglingQuote)
}
