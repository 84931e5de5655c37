//! Expression error types.

use thiserror::Error;

/// Errors raised while parsing or evaluating an attribute expression
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Malformed source text
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { message: String, offset: u32 },

    /// Valid JavaScript the interpreter deliberately does not run
    #[error("unsupported construct at offset {offset}: {construct}")]
    Unsupported { construct: &'static str, offset: u32 },

    /// Left-hand side is not a variable or member access
    #[error("invalid assignment target at offset {offset}")]
    InvalidAssignmentTarget { offset: u32 },

    /// Runtime type error (reading a member of `undefined`, ...)
    #[error("{0}")]
    Type(String),
}

impl EvalError {
    pub(crate) fn syntax(message: impl Into<String>, offset: u32) -> Self {
        Self::Syntax {
            message: message.into(),
            offset,
        }
    }
}
