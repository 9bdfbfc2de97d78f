//! Syntax errors of the condition grammar.

use thiserror::Error;

/// Errors that can occur while parsing a textual condition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyntaxError {
    /// The condition is empty.
    #[error("condition is empty")]
    EmptyExpression,

    /// A token appeared where the grammar does not allow it.
    #[error("unexpected token: {token}")]
    UnexpectedToken {
        /// The offending token as written.
        token: String,
    },

    /// The condition ended in the middle of a comparison.
    #[error("unexpected end of condition")]
    UnexpectedEndOfInput,

    /// A quoted string was not closed.
    #[error("unterminated string starting at position {position}")]
    UnterminatedString {
        /// Byte offset of the opening quote.
        position: usize,
    },
}

impl SyntaxError {
    /// Creates an unexpected token error.
    pub fn unexpected_token(token: impl Into<String>) -> Self {
        SyntaxError::UnexpectedToken {
            token: token.into(),
        }
    }
}
