//! Error types for the textly compiler.

use std::fmt;
use std::io;

use thiserror::Error;

use super::token::{Token, TokenKind};
use crate::cancel::Cancelled;

/// What the parser was looking for when it hit an unexpected token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    /// A token of one specific kind.
    Kind(TokenKind),
    /// A specific literal character, e.g. the letters of `clear`.
    Char(char),
    /// Any top-level element: text, `[`, `{` or `@`.
    Element,
    /// The separator inside a decorator list.
    ListDelimiter,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Kind(kind) => write!(f, "{kind}"),
            Expected::Char(ch) => write!(f, "'{ch}'"),
            Expected::Element => f.write_str("text, '[', '{' or '@'"),
            Expected::ListDelimiter => f.write_str("',' or ')'"),
        }
    }
}

/// An error that occurred while lexing, parsing, optimizing or decoding a program.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("reading input: {0}")]
    Read(#[source] io::Error),

    #[error("[{}:{}] expected {want}, got {}", .got.line, .got.col, describe(.got))]
    UnexpectedToken { got: Token, want: Expected },

    #[error("[{line}:{col}] unterminated bracket: expected ']' before end of line")]
    UnterminatedBracket { line: usize, col: usize },

    #[error("[{line}:{col}] unknown decorator: \"{name}\"")]
    UnknownDecorator { name: String, line: usize, col: usize },

    #[error("cannot flatten: deleting {count} characters from text of length {text_len}")]
    InvalidFlatten { text_len: usize, count: usize },

    #[error("optimizer did not settle after {passes} passes")]
    OptimizerDivergence { passes: usize },

    #[error("unknown opcode: \"{opcode}\"")]
    UnknownOpcode { opcode: String },

    #[error("malformed {opcode} instruction: {reason}")]
    MalformedInstruction { opcode: String, reason: String },

    #[error("decoding program: {0}")]
    Decode(#[from] serde_yaml::Error),

    #[error("compilation cancelled")]
    Cancelled,
}

fn describe(token: &Token) -> String {
    match token.kind {
        TokenKind::Eof => "end of input".to_string(),
        TokenKind::Newline => "newline".to_string(),
        kind => format!("{kind} \"{}\"", token.value),
    }
}

impl CompileError {
    pub fn unexpected(got: Token, want: Expected) -> Self {
        Self::UnexpectedToken { got, want }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, CompileError::Cancelled)
    }
}

impl From<Cancelled> for CompileError {
    fn from(_: Cancelled) -> Self {
        CompileError::Cancelled
    }
}
