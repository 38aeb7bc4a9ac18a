use thiserror::Error;

use crate::frontend::lexer::LexError;
use crate::lang::span::SourcePos;

/// A parsing error with source location.
///
/// Every variant carries the position of the offending token so the driver
/// can report a 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("Unexpected token {found}, expected {expected}")]
    UnexpectedToken {
        expected: String,
        found: String,
        pos: SourcePos,
    },

    #[error("Unsupported operator '{symbol}'")]
    UnsupportedOperator { symbol: String, pos: SourcePos },
}

impl ParseError {
    pub fn pos(&self) -> SourcePos {
        match self {
            ParseError::Lex(err) => err.pos(),
            ParseError::UnexpectedToken { pos, .. }
            | ParseError::UnsupportedOperator { pos, .. } => *pos,
        }
    }

    pub fn line(&self) -> usize {
        self.pos().line
    }
}
