#[derive(Debug, Clone, PartialEq, Eq)]
/// Represents all errors that can occur while evaluating an expression.
///
/// Every variant maps to a stable numeric code (see [`EvalError::code`]) so
/// embedding hosts can react to failures without matching on message text.
pub enum EvalError {
    /// A string literal was opened but never closed.
    DanglingQuote,
    /// The input contained no expression at all.
    Empty,
    /// Called a function that is not registered and not defined in the
    /// loaded script.
    UnknownFunction {
        /// The name of the function.
        name: String,
    },
    /// A function was called with an argument count outside its arity range.
    Arity {
        /// The name of the function.
        name: String,
    },
    /// Extra tokens remained after the expression ended.
    TrailingJunk,
    /// The expression could not be parsed.
    Parse,
    /// An argument was invalid or out of range.
    InvalidArgument {
        /// Details about why the argument is invalid.
        details: String,
    },
    /// An object reference or object property lookup failed.
    InvalidObject {
        /// The object or property name.
        name: String,
    },
    /// A backslash escape was started but never completed.
    DanglingBackslash,
    /// A subscript was not a valid index for the container.
    BadIndex,
    /// A dict literal entry was missing its key.
    DictName,
    /// A dict literal entry was missing the `:` after its key.
    DictColon,
    /// A dict lookup used a key that is not present.
    KeyNotFound {
        /// The missing key.
        key: String,
    },
}

impl EvalError {
    /// Returns the stable numeric code for this error.
    ///
    /// The codes are part of the host-facing contract and never change
    /// between releases.
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::DanglingQuote => 1,
            Self::Empty => 2,
            Self::UnknownFunction { .. } => 3,
            Self::Arity { .. } => 4,
            Self::TrailingJunk => 5,
            Self::Parse => 6,
            Self::InvalidArgument { .. } => 7,
            Self::InvalidObject { .. } => 9,
            Self::DanglingBackslash => 10,
            Self::BadIndex => 11,
            Self::DictName => 14,
            Self::DictColon => 15,
            Self::KeyNotFound { .. } => 16,
        }
    }
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = self.code();

        match self {
            Self::DanglingQuote => write!(f, "Error {code}: String literal is never closed."),
            Self::Empty => write!(f, "Error {code}: Expression is empty."),
            Self::UnknownFunction { name } => {
                write!(f, "Error {code}: Unknown function '{name}'.")
            },
            Self::Arity { name } => {
                write!(f, "Error {code}: Wrong number of arguments for '{name}'.")
            },
            Self::TrailingJunk => {
                write!(f, "Error {code}: Extra input after the end of the expression.")
            },
            Self::Parse => write!(f, "Error {code}: Expression could not be parsed."),
            Self::InvalidArgument { details } => {
                write!(f, "Error {code}: Invalid argument: {details}.")
            },
            Self::InvalidObject { name } => {
                write!(f, "Error {code}: Invalid object or property '{name}'.")
            },
            Self::DanglingBackslash => {
                write!(f, "Error {code}: Backslash escape is never completed.")
            },
            Self::BadIndex => write!(f, "Error {code}: Invalid container index."),
            Self::DictName => write!(f, "Error {code}: Dict entry is missing its key."),
            Self::DictColon => write!(f, "Error {code}: Dict entry is missing ':' after its key."),
            Self::KeyNotFound { key } => {
                write!(f, "Error {code}: Key '{key}' is not in the dict.")
            },
        }
    }
}

impl std::error::Error for EvalError {}
