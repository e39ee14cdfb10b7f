//! Defines the error type for the formula module.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Formula is empty")]
    Empty,
    #[error("Unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },
    #[error("Invalid number literal '{0}'")]
    InvalidNumber(String),
    #[error("Unterminated string literal starting at offset {0}")]
    UnterminatedString(usize),
    #[error("Invalid token at offset {offset}")]
    InvalidToken { offset: usize },
    #[error("Unexpected '{found}' at offset {offset}, expected one of {}", .expected.join(", "))]
    UnexpectedToken { found: String, offset: usize, expected: Vec<String> },
    #[error("Unexpected end of formula, expected one of {}", .expected.join(", "))]
    UnexpectedEnd { expected: Vec<String> },
    #[error("Formula nests deeper than {limit} levels")]
    TooDeep { limit: usize },
}
