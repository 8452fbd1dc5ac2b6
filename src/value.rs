//! The polymorphic runtime value produced by evaluation.

use crate::error::EvalError;
use crate::scalar::Scalar;

/// Everything [`crate::evaluate`] can return: a dimensioned scalar or a boolean.
/// No other runtime type exists; every arithmetic and comparison helper
/// pattern-matches this variant and errors out on an unexpected shape.
#[derive(Clone, Copy, Debug)]
pub enum Value {
    Scalar(Scalar),
    Boolean(bool),
}

impl Value {
    #[must_use]
    pub fn as_scalar(self) -> Option<Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::Boolean(_) => None,
        }
    }

    #[must_use]
    pub fn as_boolean(self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(b),
            Self::Scalar(_) => None,
        }
    }

    /// `==`/`!=` across possibly-mismatched runtime types: comparing values
    /// of different kinds (Scalar vs Boolean) is always non-equal, never an
    /// error. Comparing two `Scalar`s of differing quantity is the error
    /// case instead — it parallels the ordering comparisons, which reject a
    /// quantity mismatch rather than silently returning `false`.
    pub fn value_eq(self, other: Self, position: usize) -> Result<bool, EvalError> {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => a.value_eq(b, position),
            (Self::Boolean(a), Self::Boolean(b)) => Ok(a == b),
            _ => Ok(false),
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Self::Scalar(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::Quantity;
    use crate::scalar::Kind;

    #[test]
    fn mixed_runtime_kinds_are_never_equal() {
        let scalar = Value::Scalar(Scalar::new(5.0, Quantity::DIMENSIONLESS, Kind::Relative));
        let boolean = Value::Boolean(true);
        assert!(!scalar.value_eq(boolean, 0).unwrap());
    }

    #[test]
    fn booleans_compare_by_value() {
        assert!(Value::Boolean(true).value_eq(Value::Boolean(true), 0).unwrap());
        assert!(!Value::Boolean(true).value_eq(Value::Boolean(false), 0).unwrap());
    }

    #[test]
    fn mismatched_scalar_quantities_are_a_dimension_mismatch() {
        let m = Value::Scalar(Scalar::new(5.0, Quantity::new(0, 1, 0, 0, 0, 0, 0), Kind::Relative));
        let s = Value::Scalar(Scalar::new(5.0, Quantity::new(1, 0, 0, 0, 0, 0, 0), Kind::Relative));
        let err = m.value_eq(s, 4).unwrap_err();
        assert!(matches!(err, EvalError::DimensionMismatch { position: 4, .. }));
    }
}
