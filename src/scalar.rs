//! Dimensioned scalar values and the algebra of absolute vs relative kinds.
//!
//! A [`Scalar`] pairs a coherent-SI value with its [`Quantity`] signature and
//! a [`Kind`] tag: `Relative` scalars behave like vectors (closed under `+`,
//! `-`, `*`, `/`); `Absolute` scalars are point-like positions on an affine
//! scale (a position, an instant, a degree-Celsius temperature) where only a
//! restricted subset of the algebra is defined. The tag lives on the value,
//! not on a type, so every operator below pattern-matches the `(kind, kind)`
//! product directly instead of dispatching through a trait hierarchy.

use crate::error::EvalError;
use crate::quantity::Quantity;

/// Whether a scalar is point-like (`Absolute`) or vector-like (`Relative`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Relative,
    Absolute,
}

/// An SI-valued real number paired with a dimensional signature and a kind.
#[derive(Clone, Copy, Debug)]
pub struct Scalar {
    si: f64,
    quantity: Quantity,
    kind: Kind,
}

impl Scalar {
    #[must_use]
    pub fn new(si: f64, quantity: Quantity, kind: Kind) -> Self {
        Self { si, quantity, kind }
    }

    #[must_use]
    pub fn dimensionless(value: f64) -> Self {
        Self::new(value, Quantity::DIMENSIONLESS, Kind::Relative)
    }

    #[must_use]
    pub fn si(self) -> f64 {
        self.si
    }

    #[must_use]
    pub fn quantity(self) -> Quantity {
        self.quantity
    }

    #[must_use]
    pub fn kind(self) -> Kind {
        self.kind
    }

    #[must_use]
    pub fn is_dimensionless(self) -> bool {
        self.quantity.is_dimensionless()
    }

    fn same_quantity(self, other: Self, position: usize) -> Result<(), EvalError> {
        if self.quantity != other.quantity {
            return Err(EvalError::DimensionMismatch {
                left: self.quantity,
                right: other.quantity,
                position,
            });
        }
        Ok(())
    }

    /// `neg`: negation preserves quantity and kind.
    #[must_use]
    pub fn neg(self) -> Self {
        Self::new(-self.si, self.quantity, self.kind)
    }

    /// `L+R`, per the absolute/relative addition rules: two relatives add to
    /// a relative; an absolute plus a relative stays absolute; any other
    /// combination involving an absolute operand is undefined.
    pub fn add(self, other: Self, position: usize) -> Result<Self, EvalError> {
        self.same_quantity(other, position)?;
        match (self.kind, other.kind) {
            (Kind::Relative, Kind::Relative) => {
                Ok(Self::new(self.si + other.si, self.quantity, Kind::Relative))
            }
            (Kind::Absolute, Kind::Relative) => {
                Ok(Self::new(self.si + other.si, self.quantity, Kind::Absolute))
            }
            (Kind::Relative, Kind::Absolute) | (Kind::Absolute, Kind::Absolute) => {
                Err(EvalError::AbsoluteOperation(position))
            }
        }
    }

    /// `L-R`: two relatives or two absolutes subtract to a relative; an
    /// absolute minus a relative stays absolute; a relative minus an
    /// absolute is undefined.
    pub fn sub(self, other: Self, position: usize) -> Result<Self, EvalError> {
        self.same_quantity(other, position)?;
        match (self.kind, other.kind) {
            (Kind::Relative, Kind::Relative) | (Kind::Absolute, Kind::Absolute) => {
                Ok(Self::new(self.si - other.si, self.quantity, Kind::Relative))
            }
            (Kind::Absolute, Kind::Relative) => {
                Ok(Self::new(self.si - other.si, self.quantity, Kind::Absolute))
            }
            (Kind::Relative, Kind::Absolute) => Err(EvalError::AbsoluteOperation(position)),
        }
    }

    /// `L*R`: defined only between two relatives; quantities add.
    pub fn mul(self, other: Self, position: usize) -> Result<Self, EvalError> {
        self.require_relative(position)?;
        other.require_relative(position)?;
        Ok(Self::new(
            self.si * other.si,
            self.quantity.mul(other.quantity),
            Kind::Relative,
        ))
    }

    /// `L/R`: defined only between two relatives; quantities subtract.
    pub fn div(self, other: Self, position: usize) -> Result<Self, EvalError> {
        self.require_relative(position)?;
        other.require_relative(position)?;
        if other.si == 0.0 {
            return Err(EvalError::DivisionByZero(position));
        }
        Ok(Self::new(
            self.si / other.si,
            self.quantity.div(other.quantity),
            Kind::Relative,
        ))
    }

    /// `L^R`: both operands must be dimensionless relatives.
    pub fn pow(self, other: Self, position: usize) -> Result<Self, EvalError> {
        self.require_relative(position)?;
        other.require_relative(position)?;
        if !self.is_dimensionless() || !other.is_dimensionless() {
            return Err(EvalError::DimensionMismatch {
                left: self.quantity,
                right: other.quantity,
                position,
            });
        }
        Ok(Self::dimensionless(self.si.powf(other.si)))
    }

    fn require_relative(self, position: usize) -> Result<(), EvalError> {
        match self.kind {
            Kind::Relative => Ok(()),
            Kind::Absolute => Err(EvalError::AbsoluteOperation(position)),
        }
    }

    /// Ordering comparisons only require matching quantities; kind is
    /// irrelevant to `<`, `<=`, `>`, `>=`.
    pub fn compare(self, other: Self, position: usize) -> Result<std::cmp::Ordering, EvalError> {
        self.same_quantity(other, position)?;
        // Treat +0.0 and -0.0 as equal, matching `eq`.
        if self.si == other.si {
            return Ok(std::cmp::Ordering::Equal);
        }
        self.si.partial_cmp(&other.si).ok_or(EvalError::TypeError {
            message: "cannot order NaN scalars".to_string(),
            position,
        })
    }

    /// `==`/`!=` between two scalars requires equal quantity, same as the
    /// ordering comparisons; values compare by coherent-SI value with
    /// `+0.0 == -0.0`.
    pub fn value_eq(self, other: Self, position: usize) -> Result<bool, EvalError> {
        self.same_quantity(other, position)?;
        Ok(self.si == other.si)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(si: f64, q: Quantity) -> Scalar {
        Scalar::new(si, q, Kind::Relative)
    }

    fn abs(si: f64, q: Quantity) -> Scalar {
        Scalar::new(si, q, Kind::Absolute)
    }

    #[test]
    fn relative_plus_relative_is_relative() {
        let m = Quantity::new(0, 1, 0, 0, 0, 0, 0);
        let sum = rel(1.0, m).add(rel(2.0, m), 0).unwrap();
        assert_eq!(sum.kind(), Kind::Relative);
        assert_eq!(sum.si(), 3.0);
    }

    #[test]
    fn absolute_plus_relative_is_absolute() {
        let m = Quantity::new(0, 1, 0, 0, 0, 0, 0);
        let sum = abs(100.0, m).add(rel(10.0, m), 0).unwrap();
        assert_eq!(sum.kind(), Kind::Absolute);
        assert_eq!(sum.si(), 110.0);
    }

    #[test]
    fn relative_plus_absolute_fails() {
        let m = Quantity::new(0, 1, 0, 0, 0, 0, 0);
        let err = rel(10.0, m).add(abs(100.0, m), 0).unwrap_err();
        assert!(matches!(err, EvalError::AbsoluteOperation(0)));
    }

    #[test]
    fn absolute_minus_absolute_is_relative() {
        let m = Quantity::new(0, 1, 0, 0, 0, 0, 0);
        let diff = abs(100.0, m).sub(abs(100.0, m), 0).unwrap();
        assert_eq!(diff.kind(), Kind::Relative);
        assert_eq!(diff.si(), 0.0);
    }

    #[test]
    fn absolute_plus_absolute_fails() {
        let m = Quantity::new(0, 1, 0, 0, 0, 0, 0);
        let err = abs(100.0, m).add(abs(1.0, m), 0).unwrap_err();
        assert!(matches!(err, EvalError::AbsoluteOperation(0)));
    }

    #[test]
    fn mul_on_an_absolute_operand_fails() {
        let m = Quantity::new(0, 1, 0, 0, 0, 0, 0);
        let err = abs(10.0, m).mul(rel(2.0, Quantity::DIMENSIONLESS), 0).unwrap_err();
        assert!(matches!(err, EvalError::AbsoluteOperation(0)));
    }

    #[test]
    fn division_by_zero_is_rejected() {
        let err = rel(1.0, Quantity::DIMENSIONLESS)
            .div(rel(0.0, Quantity::DIMENSIONLESS), 7)
            .unwrap_err();
        assert!(matches!(err, EvalError::DivisionByZero(7)));
    }

    #[test]
    fn pow_requires_both_operands_dimensionless() {
        let m = Quantity::new(0, 1, 0, 0, 0, 0, 0);
        let err = rel(2.0, m).pow(rel(3.0, Quantity::DIMENSIONLESS), 0).unwrap_err();
        assert!(matches!(err, EvalError::DimensionMismatch { .. }));
    }

    #[test]
    fn negative_and_positive_zero_compare_equal() {
        let a = rel(0.0, Quantity::DIMENSIONLESS);
        let b = rel(-0.0, Quantity::DIMENSIONLESS);
        assert!(a.value_eq(b, 0).unwrap());
        assert_eq!(a.compare(b, 0).unwrap(), std::cmp::Ordering::Equal);
    }

    #[test]
    fn value_eq_rejects_mismatched_quantity() {
        let m = Quantity::new(0, 1, 0, 0, 0, 0, 0);
        let s = Quantity::new(1, 0, 0, 0, 0, 0, 0);
        let err = rel(5.0, m).value_eq(rel(5.0, s), 3).unwrap_err();
        assert!(matches!(err, EvalError::DimensionMismatch { position: 3, .. }));
    }
}
