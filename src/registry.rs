//! The fixed table of zero/one/two-argument functions and constants.
//!
//! The registry is built once by [`Registry::standard`] and is immutable
//! thereafter — there is no runtime mechanism for user-defined functions,
//! matching the non-goal that the function table is fixed at construction.
//! Lookup is by `(name, arity)`: `sin` with one argument and a hypothetical
//! zero-argument `sin` would be distinct entries, though today only `pow`
//! shares dispatch machinery across more than a single arity slot.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{EvalError, RegistryError};
use crate::quantity::Quantity;
use crate::scalar::{Kind, Scalar};
use crate::value::Value;

/// A zero/one/two-argument function or constant handler.
type Handler = Box<dyn Fn(&[Value], usize) -> Result<Value, EvalError> + Send + Sync>;

/// `{ name, arity, handler }`, created once at registry construction and
/// never mutated afterwards.
struct FunctionDescriptor {
    handler: Handler,
}

/// Name/arity keyed table of [`FunctionDescriptor`]s.
pub struct Registry {
    entries: HashMap<(&'static str, usize), FunctionDescriptor>,
}

impl Registry {
    /// Builds the fixed table described in the function & constant registry
    /// section: physical constants, `TRUE`/`FALSE`/`CURRENTTIME`, the
    /// dimensionless-only transcendental functions, and `pow`.
    ///
    /// Construction cannot fail against the built-in table (it is a
    /// fixed literal with no duplicate `(name, arity)` pairs), but the
    /// constructor still returns a `Result` so a caller layering a custom
    /// registry on top via [`RegistryBuilder`] gets the same fallible shape.
    pub fn standard() -> Result<Self, RegistryError> {
        let mut builder = RegistryBuilder::new();
        for (name, value) in constants_full() {
            let value = value;
            builder.insert(name, 0, move |_, _| Ok(Value::Scalar(value)))?;
        }
        builder.insert("TRUE", 0, |_, _| Ok(Value::Boolean(true)))?;
        builder.insert("FALSE", 0, |_, _| Ok(Value::Boolean(false)))?;
        builder.insert("CURRENTTIME", 0, |_, _| Ok(current_time()))?;
        for (name, f) in UNARY_FUNCTIONS {
            let f = *f;
            builder.insert(name, 1, move |args, position| {
                let x = require_dimensionless(args[0], position)?;
                Ok(Value::Scalar(Scalar::dimensionless(f(x))))
            })?;
        }
        builder.insert("pow", 2, |args, position| {
            let base = require_dimensionless(args[0], position)?;
            let exponent = require_dimensionless(args[1], position)?;
            Ok(Value::Scalar(Scalar::dimensionless(base.powf(exponent))))
        })?;
        Ok(builder.build())
    }

    /// Looks up a `(name, arity)` pair and invokes its handler with the
    /// already-evaluated arguments.
    pub fn call(&self, name: &str, args: &[Value], position: usize) -> Result<Value, EvalError> {
        match self.entries.get(&(name, args.len())) {
            Some(descriptor) => (descriptor.handler)(args, position),
            None => {
                // Distinguish "right name, wrong argument count" from
                // "no such function at all".
                let known_arity = self
                    .entries
                    .keys()
                    .find(|(n, _)| *n == name)
                    .map(|(_, a)| *a);
                match known_arity {
                    Some(expected) => Err(EvalError::WrongArity {
                        name: name.to_string(),
                        expected,
                        got: args.len(),
                        position,
                    }),
                    None => Err(EvalError::UnknownFunction {
                        name: name.to_string(),
                        arity: args.len(),
                        position,
                    }),
                }
            }
        }
    }
}

/// Incrementally assembles a [`Registry`], rejecting duplicate `(name,
/// arity)` entries instead of silently overwriting them.
struct RegistryBuilder {
    entries: HashMap<(&'static str, usize), FunctionDescriptor>,
}

impl RegistryBuilder {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    fn insert(
        &mut self,
        name: &'static str,
        arity: usize,
        handler: impl Fn(&[Value], usize) -> Result<Value, EvalError> + Send + Sync + 'static,
    ) -> Result<(), RegistryError> {
        if self
            .entries
            .insert((name, arity), FunctionDescriptor { handler: Box::new(handler) })
            .is_some()
        {
            return Err(RegistryError::DuplicateEntry {
                name: name.to_string(),
                arity,
            });
        }
        Ok(())
    }

    fn build(self) -> Registry {
        Registry {
            entries: self.entries,
        }
    }
}

fn require_dimensionless(value: Value, position: usize) -> Result<f64, EvalError> {
    match value {
        Value::Scalar(s) if s.is_dimensionless() => Ok(s.si()),
        Value::Scalar(s) => Err(EvalError::DimensionMismatch {
            left: s.quantity(),
            right: Quantity::DIMENSIONLESS,
            position,
        }),
        Value::Boolean(_) => Err(EvalError::TypeError {
            message: "expected a dimensionless scalar, got a boolean".to_string(),
            position,
        }),
    }
}

fn scalar(si: f64, q: Quantity) -> Scalar {
    Scalar::new(si, q, Kind::Relative)
}

fn time_q() -> Quantity {
    Quantity::new(1, 0, 0, 0, 0, 0, 0)
}
fn length_q() -> Quantity {
    Quantity::new(0, 1, 0, 0, 0, 0, 0)
}
fn mass_q() -> Quantity {
    Quantity::new(0, 0, 1, 0, 0, 0, 0)
}
fn current_q() -> Quantity {
    Quantity::new(0, 0, 0, 1, 0, 0, 0)
}
fn amount_q() -> Quantity {
    Quantity::new(0, 0, 0, 0, 0, 1, 0)
}
fn luminous_q() -> Quantity {
    Quantity::new(0, 0, 0, 0, 0, 0, 1)
}
fn charge_q() -> Quantity {
    current_q().mul(time_q())
}
fn energy_q() -> Quantity {
    mass_q().mul(length_q().powi(2)).mul(time_q().powi(-2))
}
fn action_q() -> Quantity {
    energy_q().mul(time_q())
}
fn entropy_q() -> Quantity {
    energy_q().mul(Quantity::new(0, 0, 0, 0, -1, 0, 0))
}
fn frequency_q() -> Quantity {
    time_q().powi(-1)
}
fn speed_q() -> Quantity {
    length_q().mul(time_q().powi(-1))
}
fn gravitational_q() -> Quantity {
    length_q().powi(3).mul(mass_q().powi(-1)).mul(time_q().powi(-2))
}
fn impedance_q() -> Quantity {
    mass_q()
        .mul(length_q().powi(2))
        .mul(time_q().powi(-3))
        .mul(current_q().powi(-2))
}
fn permeability_q() -> Quantity {
    mass_q()
        .mul(length_q())
        .mul(time_q().powi(-2))
        .mul(current_q().powi(-2))
}
fn permittivity_q() -> Quantity {
    mass_q()
        .mul(length_q().powi(-3))
        .mul(time_q().powi(4))
        .mul(current_q().powi(2))
}
fn luminous_efficacy_q() -> Quantity {
    luminous_q().mul(time_q().powi(3)).mul(mass_q().powi(-1))
}

/// Physical constants, in SI coherent units (CODATA 2018 values).
fn constants() -> [(&'static str, Scalar); 19] {
    let dimensionless = Quantity::DIMENSIONLESS;
    [
        ("PI", scalar(std::f64::consts::PI, dimensionless)),
        ("E", scalar(std::f64::consts::E, dimensionless)),
        ("PHI", scalar(1.618_033_988_749_895, dimensionless)),
        ("TAU", scalar(std::f64::consts::TAU, dimensionless)),
        ("AVOGADRO", scalar(6.022_140_76e23, amount_q().powi(-1))),
        ("BOLTZMANN", scalar(1.380_649e-23, entropy_q())),
        ("CESIUM133_FREQUENCY", scalar(9_192_631_770.0, frequency_q())),
        ("ELECTRONCHARGE", scalar(-1.602_176_634e-19, charge_q())),
        ("ELECTRONMASS", scalar(9.109_383_7015e-31, mass_q())),
        ("G", scalar(6.674_30e-11, gravitational_q())),
        ("LIGHTSPEED", scalar(299_792_458.0, speed_q())),
        ("LUMINOUS_EFFICACY_540THZ", scalar(683.0, luminous_efficacy_q())),
        ("NEUTRONMASS", scalar(1.674_927_498_04e-27, mass_q())),
        ("PLANCK", scalar(6.626_070_15e-34, action_q())),
        ("PLANKREDUCED", scalar(1.054_571_817e-34, action_q())),
        ("PROTONCHARGE", scalar(1.602_176_634e-19, charge_q())),
        ("PROTONMASS", scalar(1.672_621_923_69e-27, mass_q())),
        ("VACUUMIMPEDANCE", scalar(376.730_313_668, impedance_q())),
        ("VACUUMPERMEABILITY", scalar(1.256_637_062_12e-6, permeability_q())),
    ]
}

/// `VACUUMPERMITTIVITY` is appended out of the fixed-size array above so
/// that array stays a direct 1:1 transcription of the registry's constant
/// groupings; it participates in the same `constants_full()` iteration.
fn constants_full() -> Vec<(&'static str, Scalar)> {
    let mut all = constants().to_vec();
    all.push((
        "VACUUMPERMITTIVITY",
        scalar(8.854_187_8128e-12, permittivity_q()),
    ));
    all
}

fn current_time() -> Value {
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);
    Value::Scalar(Scalar::new(since_epoch, time_q(), Kind::Absolute))
}

type UnaryFn = fn(f64) -> f64;

const UNARY_FUNCTIONS: &[(&str, UnaryFn)] = &[
    ("sin", f64::sin),
    ("cos", f64::cos),
    ("tan", f64::tan),
    ("asin", f64::asin),
    ("acos", f64::acos),
    ("atan", f64::atan),
    ("sinh", f64::sinh),
    ("cosh", f64::cosh),
    ("tanh", f64::tanh),
    ("exp", f64::exp),
    ("expm1", f64::exp_m1),
    ("log", f64::ln),
    ("log10", f64::log10),
    ("log1p", f64::ln_1p),
    ("sqrt", f64::sqrt),
    ("cbrt", f64::cbrt),
    ("signum", f64::signum),
];
