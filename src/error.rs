//! Error taxonomy for expression parsing and evaluation.
//!
//! Every variant carries the byte offset in the source expression at which
//! the condition was detected, so callers can point a user at the offending
//! character without the evaluator keeping any other diagnostic state.

use thiserror::Error;

use crate::quantity::Quantity;

/// Everything that can go wrong while evaluating an expression.
///
/// The parser recovers from nothing: the first error terminates evaluation
/// and is returned as-is from [`crate::evaluate`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("empty expression")]
    EmptyExpression,

    #[error("missing operand at position {0}")]
    MissingOperand(usize),

    #[error("missing closing ')' at position {0}")]
    MissingCloseParen(usize),

    #[error("missing ':' for conditional started near position {0}")]
    MissingColon(usize),

    #[error("trailing input at position {0}")]
    TrailingGarbage(usize),

    #[error("internal error: result stack had {0} elements after evaluation, expected 1")]
    InternalState(usize),

    #[error("bad numeric literal at position {0}")]
    BadNumber(usize),

    #[error("bad unit symbol '{symbol}' at position {position}")]
    BadUnitSymbol { symbol: String, position: usize },

    #[error("unknown unit '{unit}' at position {position}")]
    UnknownUnit { unit: String, position: usize },

    #[error("missing closing ']' at position {0}")]
    MissingCloseBracket(usize),

    #[error("bad operator '{operator}' at position {position}")]
    BadOperator { operator: String, position: usize },

    #[error("unknown function '{name}' with {arity} argument(s) at position {position}")]
    UnknownFunction {
        name: String,
        arity: usize,
        position: usize,
    },

    #[error("wrong number of arguments for '{name}' at position {position}: expected {expected}, got {got}")]
    WrongArity {
        name: String,
        expected: usize,
        got: usize,
        position: usize,
    },

    #[error("unresolved name '{name}' at position {position}")]
    UnresolvedName { name: String, position: usize },

    #[error("type error at position {position}: {message}")]
    TypeError { message: String, position: usize },

    #[error("dimension mismatch at position {position}: {left} vs {right}")]
    DimensionMismatch {
        left: Quantity,
        right: Quantity,
        position: usize,
    },

    #[error("division by zero at position {0}")]
    DivisionByZero(usize),

    #[error("invalid operation on an absolute quantity at position {0}")]
    AbsoluteOperation(usize),
}

impl EvalError {
    /// The byte offset in the source expression this error was detected at.
    #[must_use]
    pub fn position(&self) -> usize {
        match self {
            Self::EmptyExpression => 0,
            Self::MissingOperand(p)
            | Self::MissingCloseParen(p)
            | Self::MissingColon(p)
            | Self::TrailingGarbage(p)
            | Self::InternalState(p)
            | Self::BadNumber(p)
            | Self::MissingCloseBracket(p)
            | Self::DivisionByZero(p)
            | Self::AbsoluteOperation(p) => *p,
            Self::BadUnitSymbol { position, .. }
            | Self::UnknownUnit { position, .. }
            | Self::BadOperator { position, .. }
            | Self::UnknownFunction { position, .. }
            | Self::WrongArity { position, .. }
            | Self::UnresolvedName { position, .. }
            | Self::TypeError { position, .. }
            | Self::DimensionMismatch { position, .. } => *position,
        }
    }
}

/// Errors that can occur while building or extending a [`crate::registry::Registry`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("duplicate registry entry for '{name}' with arity {arity}")]
    DuplicateEntry { name: String, arity: usize },
}
