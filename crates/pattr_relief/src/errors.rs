//! Markup error types.

use thiserror::Error;

/// Error codes reported while tokenizing markup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCode {
    EofInTag = 0,
    EofInComment = 1,
    EofInRawText = 2,
    MissingEndTagName = 3,
    InvalidFirstCharacterOfTagName = 4,
    UnexpectedEqualsSignBeforeAttributeName = 5,
    UnexpectedCharacterInAttributeName = 6,
    MissingAttributeValue = 7,
    InvalidEndTag = 8,
    MissingEndTag = 9,
}

impl ErrorCode {
    /// Human readable message for this code
    pub const fn message(self) -> &'static str {
        match self {
            Self::EofInTag => "Unexpected EOF in tag.",
            Self::EofInComment => "Unexpected EOF in comment.",
            Self::EofInRawText => "Unexpected EOF in raw text element.",
            Self::MissingEndTagName => "End tag name was expected.",
            Self::InvalidFirstCharacterOfTagName => "Illegal tag name. Use '&lt;' to print '<'.",
            Self::UnexpectedEqualsSignBeforeAttributeName => {
                "Attribute name cannot start with '='."
            }
            Self::UnexpectedCharacterInAttributeName => {
                "Attribute name cannot contain U+0022 (\"), U+0027 ('), and U+003C (<)."
            }
            Self::MissingAttributeValue => "Attribute value was expected.",
            Self::InvalidEndTag => "Invalid end tag.",
            Self::MissingEndTag => "Element is missing end tag.",
        }
    }
}

/// A markup error with its byte offset in the source
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} (at offset {offset})", .code.message())]
pub struct ParseError {
    pub code: ErrorCode,
    pub offset: usize,
}

impl ParseError {
    pub const fn new(code: ErrorCode, offset: usize) -> Self {
        Self { code, offset }
    }
}
