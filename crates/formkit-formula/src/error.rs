//! Formula error types.

use crate::lexer::LexError;
use crate::parser::ParseError;

/// Everything that can go wrong turning a formula into a value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormulaError {
    #[error("formula is {len} bytes, the limit is {max}")]
    TooLong { len: usize, max: usize },

    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("formula is nested more than {0} levels deep")]
    TooComplex(usize),

    #[error("{0} is not defined")]
    UnboundName(String),

    #[error("{0} is not a function")]
    NotCallable(String),

    #[error("type error: {0}")]
    Type(String),

    #[error("invalid date")]
    InvalidDate,

    #[error("formula result cannot be stored: {0}")]
    Unrepresentable(String),

    #[error("cannot substitute parent fields: {0}")]
    Substitution(String),
}

pub type Result<T> = std::result::Result<T, FormulaError>;
