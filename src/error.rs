use serde::Serialize;
use thiserror::Error;

/// A malformed grammar record. Loading stops at the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarFormatError {
    #[error("Line {line}: too many \"->\"")]
    TooManyArrows { line: usize },
    #[error("Line {line}: empty left side")]
    EmptyLeftSide { line: usize },
    #[error("Line {line}: left side contains whitespace")]
    LeftSideContainsWhitespace { line: usize },
    #[error("Line {line}: left side must be a single character")]
    LeftSideTooLong { line: usize },
    #[error("Line {line}: cannot find left side")]
    MissingLeftSide { line: usize },
    #[error("Line {line}: `{head}` is reserved and cannot be a left side")]
    ReservedLeftSide { line: usize, head: String },
    #[error("Line {line}: `$` is reserved and cannot appear on a right side")]
    ReservedRightSide { line: usize },
    #[error("grammar has no productions")]
    Empty,
}

/// A parse-time error. Always recovered from (or counted), never returned as `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind")]
pub enum SyntaxError {
    #[error("expected `{expected}` but got `{found}`")]
    Mismatch { expected: String, found: String },
    #[error("no production for `{non_terminal}` on `{found}`")]
    NoEntry { non_terminal: String, found: String },
}
