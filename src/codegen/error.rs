//! Code generation error types.

/// Raised only for AST shapes that should be structurally impossible after a
/// successful parse (e.g. an `Affect` with fewer than two children). Allows
/// proper error propagation using `?` for both logical errors and the
/// formatting errors `write!` into a `String` buffer can raise.
#[derive(Debug)]
pub enum InternalError {
    /// A malformed AST shape reaching the emitter.
    Logic(String),
    /// A formatting error while writing assembly text.
    Format(std::fmt::Error),
}

impl std::fmt::Display for InternalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InternalError::Logic(s) => write!(f, "{s}"),
            InternalError::Format(e) => write!(f, "assembly generation error: {e}"),
        }
    }
}

impl std::error::Error for InternalError {}

impl From<String> for InternalError {
    fn from(s: String) -> Self {
        InternalError::Logic(s)
    }
}

impl From<std::fmt::Error> for InternalError {
    fn from(e: std::fmt::Error) -> Self {
        InternalError::Format(e)
    }
}
