//! Parsing of SI unit strings into `(scale, offset, quantity)` triples.
//!
//! A unit token is `numerator[/denominator]`, where numerator and
//! denominator are each a `.`-separated list of factors. A factor is a
//! symbol optionally followed by an integer exponent, written either as
//! `^N` or as a bare trailing signed integer (`ms-1`, `s2`). Symbols resolve
//! against the fixed table in this module; the caller-supplied unit parser
//! is consulted only once the local table has failed.

use crate::error::EvalError;
use crate::quantity::Quantity;

/// A resolved unit: how to convert a raw literal into coherent SI, and what
/// dimensional signature it carries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Unit {
    pub scale: f64,
    pub offset: f64,
    pub quantity: Quantity,
}

impl Unit {
    const fn relative(scale: f64, quantity: Quantity) -> Self {
        Self {
            scale,
            offset: 0.0,
            quantity,
        }
    }

    const fn affine(scale: f64, offset: f64, quantity: Quantity) -> Self {
        Self {
            scale,
            offset,
            quantity,
        }
    }

    /// Whether this unit carries a non-zero affine offset (degC, degF, and
    /// the like). Literals built from such units are `Absolute` scalars.
    #[must_use]
    pub fn is_affine(self) -> bool {
        self.offset != 0.0
    }

    const DIMENSIONLESS: Self = Self::relative(1.0, Quantity::DIMENSIONLESS);

    fn mul(self, other: Self) -> Self {
        Self::relative(self.scale * other.scale, self.quantity.mul(other.quantity))
    }

    fn div(self, other: Self) -> Self {
        Self::relative(self.scale / other.scale, self.quantity.div(other.quantity))
    }

    fn powi(self, n: i8) -> Self {
        Self::relative(self.scale.powi(i32::from(n)), self.quantity.powi(n))
    }
}

const T: Quantity = Quantity::new(1, 0, 0, 0, 0, 0, 0);
const L: Quantity = Quantity::new(0, 1, 0, 0, 0, 0, 0);
const M: Quantity = Quantity::new(0, 0, 1, 0, 0, 0, 0);
const I: Quantity = Quantity::new(0, 0, 0, 1, 0, 0, 0);
const THETA: Quantity = Quantity::new(0, 0, 0, 0, 1, 0, 0);
const N: Quantity = Quantity::new(0, 0, 0, 0, 0, 1, 0);
const J: Quantity = Quantity::new(0, 0, 0, 0, 0, 0, 1);

/// Resolves a single base symbol (no prefix, no exponent) against the fixed
/// table of SI base/derived units and common aliases.
fn base_symbol(symbol: &str) -> Option<Unit> {
    Some(match symbol {
        // Dimensionless.
        "" | "1" => Unit::DIMENSIONLESS,
        // Base SI units.
        "s" => Unit::relative(1.0, T),
        "m" => Unit::relative(1.0, L),
        "kg" => Unit::relative(1.0, M),
        "g" => Unit::relative(1e-3, M),
        "A" => Unit::relative(1.0, I),
        "K" => Unit::relative(1.0, THETA),
        "mol" => Unit::relative(1.0, N),
        "cd" => Unit::relative(1.0, J),
        // Affine temperature units.
        "degC" | "°C" => Unit::affine(1.0, 273.15, THETA),
        "degF" | "°F" => Unit::affine(5.0 / 9.0, 459.67 * 5.0 / 9.0, THETA),
        // Common length/time aliases.
        "mm" => Unit::relative(1e-3, L),
        "cm" => Unit::relative(1e-2, L),
        "km" => Unit::relative(1e3, L),
        "mi" => Unit::relative(1609.344, L),
        "ft" => Unit::relative(0.3048, L),
        "in" => Unit::relative(0.0254, L),
        "min" => Unit::relative(60.0, T),
        "h" => Unit::relative(3600.0, T),
        "ms" => Unit::relative(1e-3, T),
        // Derived units.
        "N" => Unit::relative(1.0, M.mul(L).mul(T.powi(-2))),
        "J" => Unit::relative(1.0, M.mul(L.powi(2)).mul(T.powi(-2))),
        "W" => Unit::relative(1.0, M.mul(L.powi(2)).mul(T.powi(-3))),
        "Pa" => Unit::relative(1.0, M.mul(L.powi(-1)).mul(T.powi(-2))),
        "Hz" => Unit::relative(1.0, T.powi(-1)),
        "C" => Unit::relative(1.0, I.mul(T)),
        "V" => Unit::relative(1.0, M.mul(L.powi(2)).mul(T.powi(-3)).mul(I.powi(-1))),
        "Ohm" | "ohm" => Unit::relative(1.0, M.mul(L.powi(2)).mul(T.powi(-3)).mul(I.powi(-2))),
        _ => return None,
    })
}

/// SI magnitude prefixes recognized before a base symbol, e.g. `k` in `km`.
const SI_PREFIXES: &[(&str, f64)] = &[
    ("Y", 1e24),
    ("Z", 1e21),
    ("E", 1e18),
    ("P", 1e15),
    ("T", 1e12),
    ("G", 1e9),
    ("M", 1e6),
    ("k", 1e3),
    ("h", 1e2),
    ("da", 1e1),
    ("d", 1e-1),
    ("c", 1e-2),
    ("m", 1e-3),
    ("u", 1e-6),
    ("µ", 1e-6),
    ("n", 1e-9),
    ("p", 1e-12),
    ("f", 1e-15),
    ("a", 1e-18),
];

/// Symbols that must never be prefix-decomposed: the unprefixed table entry
/// already means something else (`min` is minutes, not milli-in; `mm` and
/// `ms` are listed literally above and take priority over prefix matching).
const NO_PREFIX: &[&str] = &["mm", "cm", "km", "ms", "min", "mi", "mol"];

/// Resolves a symbol that may carry an SI magnitude prefix, e.g. `km`, `ns`, `kOhm`.
fn symbol_with_prefix(symbol: &str) -> Option<Unit> {
    if let Some(unit) = base_symbol(symbol) {
        return Some(unit);
    }
    if NO_PREFIX.contains(&symbol) {
        return None;
    }
    for (prefix, factor) in SI_PREFIXES {
        if let Some(rest) = symbol.strip_prefix(prefix) {
            if rest.is_empty() {
                continue;
            }
            if let Some(base) = base_symbol(rest) {
                if base.is_affine() {
                    // Prefixing an affine unit (e.g. "kdegC") is not meaningful.
                    continue;
                }
                return Some(Unit::relative(base.scale * factor, base.quantity));
            }
        }
    }
    None
}

/// Shorthand aliases that do not decompose into `symbol[/symbol]` under the
/// general grammar (`mi/h` and `km/h` already do, via the base table, and
/// need no entry here).
fn compound_alias(symbol: &str) -> Option<Unit> {
    Some(match symbol {
        "mph" => Unit::relative(0.447_04, L.div(T)),
        "kph" => Unit::relative(1.0 / 3.6, L.div(T)),
        _ => return None,
    })
}

/// Splits a factor token like `ms-1` or `s2` into `(symbol, exponent)`.
/// Exponent syntax is either `^N` (handled first) or a bare trailing signed
/// integer.
fn split_trailing_exponent(factor: &str) -> (&str, i8) {
    if let Some(caret) = factor.find('^') {
        let (symbol, exp) = factor.split_at(caret);
        let exp = &exp[1..];
        return (symbol, exp.parse().unwrap_or(1));
    }
    let bytes = factor.as_bytes();
    let mut end = bytes.len();
    while end > 0 && bytes[end - 1].is_ascii_digit() {
        end -= 1;
    }
    if end > 0 && end < bytes.len() && bytes[end - 1] == b'-' {
        end -= 1;
    }
    if end == factor.len() || end == 0 {
        return (factor, 1);
    }
    let (symbol, exp) = factor.split_at(end);
    match exp.parse::<i8>() {
        Ok(n) => (symbol, n),
        Err(_) => (factor, 1),
    }
}

fn resolve_factor(factor: &str) -> Option<Unit> {
    if factor.is_empty() {
        return Some(Unit::DIMENSIONLESS);
    }
    let (symbol, exponent) = split_trailing_exponent(factor);
    let had_exponent = symbol.len() != factor.len();
    // `ms-1` denotes `m * s^-1`, not `(millisecond)^-1` — the two adjacent
    // single-letter symbols bind the trailing exponent to the last one only.
    // Bare `ms` with no exponent is still the millisecond alias below.
    if had_exponent && symbol == "ms" {
        let meters = base_symbol("m")?;
        let seconds = base_symbol("s")?;
        return Some(meters.mul(seconds.powi(exponent)));
    }
    let base = symbol_with_prefix(symbol)?;
    Some(base.powi(exponent))
}

fn resolve_factor_list(list: &str) -> Option<Unit> {
    let mut unit = Unit::DIMENSIONLESS;
    for factor in list.split('.') {
        unit = unit.mul(resolve_factor(factor)?);
    }
    Some(unit)
}

/// Resolves a unit body (the text between `[` and `]`) against the built-in
/// table only. `position` is the byte offset of the opening `[`, used only
/// to annotate the one error this can raise on its own.
///
/// Returns `Ok(None)` when the body is syntactically well-formed but names
/// no unit this module knows about — the caller falls through to a
/// caller-supplied [`crate::UnitParser`] before giving up with
/// [`EvalError::UnknownUnit`]. Unlike a built-in unit, a user unit resolves
/// straight to a [`crate::scalar::Scalar`] (value and kind together), so it
/// is not folded into this function's `Unit` return type.
pub fn parse_unit(body: &str, position: usize) -> Result<Option<Unit>, EvalError> {
    if let Some(unit) = compound_alias(body) {
        return Ok(Some(unit));
    }
    if body.matches('/').count() > 1 {
        return Err(EvalError::BadUnitSymbol {
            symbol: body.to_string(),
            position,
        });
    }
    let resolved = match body.split_once('/') {
        Some((num, denom)) => match (resolve_factor_list(num), resolve_factor_list(denom)) {
            (Some(n), Some(d)) => Some(n.div(d)),
            _ => None,
        },
        None => resolve_factor_list(body),
    };
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(body: &str) -> Unit {
        parse_unit(body, 0)
            .unwrap_or_else(|e| panic!("failed to parse {body:?}: {e}"))
            .unwrap_or_else(|| panic!("{body:?} did not resolve against the built-in table"))
    }

    #[test]
    fn base_units_resolve() {
        assert_eq!(unit("m").quantity, L);
        assert_eq!(unit("s").quantity, T);
        assert_eq!(unit("kg").quantity, M);
    }

    #[test]
    fn prefixes_scale_correctly() {
        let mm = unit("mm");
        assert_eq!(mm.quantity, L);
        assert!((mm.scale - 1e-3).abs() < 1e-12);

        let km = unit("km");
        assert!((km.scale - 1e3).abs() < 1e-9);
    }

    #[test]
    fn trailing_exponents_and_caret_syntax_agree() {
        let a = unit("ms-1");
        let b = unit("m.s^-1");
        assert_eq!(a.quantity, b.quantity);
        assert!((a.scale - b.scale).abs() < 1e-12);
    }

    #[test]
    fn compound_division_and_dot_multiplication() {
        let newton = unit("kg.m/s2");
        assert_eq!(newton.quantity, M.mul(L).mul(T.powi(-2)));
    }

    #[test]
    fn affine_units_carry_an_offset() {
        let celsius = unit("degC");
        assert!(celsius.is_affine());
        assert!((celsius.offset - 273.15).abs() < 1e-9);
    }

    #[test]
    fn alias_units_resolve_to_the_same_quantity_as_their_base_ratio() {
        let mph = unit("mi/h");
        assert_eq!(mph.quantity, L.div(T));
    }

    #[test]
    fn unknown_unit_resolves_to_none_for_the_caller_to_try_user_units() {
        assert!(parse_unit("frobnicate", 5).unwrap().is_none());
    }

    #[test]
    fn more_than_one_slash_is_rejected() {
        let err = parse_unit("m/s/s", 0).unwrap_err();
        assert!(matches!(err, EvalError::BadUnitSymbol { .. }));
    }
}
