//! A recursive-descent evaluator for SI-unit-carrying expressions.
//!
//! [`evaluate`] parses and immediately evaluates a single expression — there
//! is no separate AST stage and no way to hold on to a parsed-but-unevaluated
//! form. Numeric literals may carry a bracketed unit (`9.8[m/s2]`), every
//! scalar tracks its dimensional signature through arithmetic, and mixing
//! incompatible dimensions is a [`EvalError::DimensionMismatch`] rather than
//! a silent coercion. Variables and unrecognized unit symbols are resolved
//! through the caller-supplied [`Resolver`] and [`UnitParser`] traits; the
//! function and constant table is fixed and owned entirely by this crate.

pub mod error;
pub mod lexer;
pub mod parser;
pub mod quantity;
pub mod registry;
pub mod scalar;
pub mod units;
pub mod value;

pub use error::{EvalError, RegistryError};
pub use quantity::Quantity;
pub use registry::Registry;
pub use scalar::{Kind, Scalar};
pub use units::Unit;
pub use value::Value;

use std::sync::OnceLock;

use lexer::Cursor;
use parser::Parser;

static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// The standard function/constant table, built once and shared across every
/// call to [`evaluate`].
fn standard_registry() -> &'static Registry {
    REGISTRY.get_or_init(|| {
        Registry::standard().expect("the built-in registry is a fixed literal table with no duplicate (name, arity) entries")
    })
}

/// Supplies the runtime value bound to a variable name, if any.
///
/// Because [`Value`] has exactly two variants, a `Resolver` cannot return
/// anything evaluation doesn't already know how to handle — there is no
/// analogue of a dynamically-typed host returning an unsupported type.
pub trait Resolver {
    fn lookup(&self, name: &str) -> Option<Value>;
}

/// Resolves a unit symbol the built-in table in [`units`] does not
/// recognize. Called with the raw literal value and the unit body text
/// (the text between `[` and `]`); returns the scalar the literal should
/// evaluate to, or `None` to let evaluation fall through to
/// [`EvalError::UnknownUnit`].
pub trait UnitParser {
    fn parse(&self, value: f64, unit: &str) -> Option<Scalar>;
}

/// Parses and evaluates `expression` in one pass.
///
/// `variables` resolves identifiers not followed by `(` into a value;
/// `user_units` extends unit-bracket resolution beyond the built-in SI
/// table. Both are optional — pass `None` for an expression that uses only
/// constants, functions, and built-in units.
///
/// # Errors
///
/// Returns the first [`EvalError`] encountered, at the byte offset where it
/// was detected. Parsing does not recover from errors; there is no partial
/// result.
pub fn evaluate(
    expression: &str,
    variables: Option<&dyn Resolver>,
    user_units: Option<&dyn UnitParser>,
) -> Result<Value, EvalError> {
    log::trace!("evaluate: {expression:?}");
    let mut cursor = Cursor::new(expression);
    let parser = Parser::new(standard_registry(), variables, user_units);
    match parser.run(&mut cursor) {
        Ok(value) => Ok(value),
        Err(err) => {
            log::debug!("evaluate failed at position {}: {err}", err.position());
            Err(err)
        }
    }
}
