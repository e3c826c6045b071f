//! Leaf values.
//!
//! A [`Value`] is a tagged variant: the diagram algorithms never look inside
//! it, they only hash it, compare it, and hand it to evaluators from the
//! [`registry`](crate::registry). Equality and hashing include the variant,
//! so the integer `0` and the boolean `false` are different leaves.
//!
//! # Numeric tower
//!
//! ```text
//! Integer ──► Rational ──► Real
//!    └──────────┴────────► Interval
//! ```
//!
//! Binary numeric operators promote both operands to their least upper bound
//! (see [`ValueType::join`]) before computing.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, ToPrimitive, Zero};

use crate::error::EvalError;

/// Type tag of a [`Value`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ValueType {
    Boolean,
    Integer,
    Rational,
    Real,
    Interval,
}

impl ValueType {
    pub fn is_numeric(self) -> bool {
        !matches!(self, ValueType::Boolean)
    }

    /// Returns true if values of type `self` convert losslessly (or by
    /// rounding, for `Real`) into `target`.
    pub fn converts_to(self, target: ValueType) -> bool {
        use ValueType::*;
        match (self, target) {
            (a, b) if a == b => true,
            (Integer, Rational | Real | Interval) => true,
            (Rational, Real | Interval) => true,
            _ => false,
        }
    }

    /// Least upper bound in the numeric tower, `None` if there is none.
    pub fn join(self, other: ValueType) -> Option<ValueType> {
        if self.converts_to(other) {
            Some(other)
        } else if other.converts_to(self) {
            Some(self)
        } else {
            None
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueType::Boolean => "boolean",
            ValueType::Integer => "integer",
            ValueType::Rational => "rational",
            ValueType::Real => "real",
            ValueType::Interval => "interval",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An `f64` usable as a hash key.
///
/// `-0.0` equals `0.0` and all NaNs are equal to each other, so interning a
/// computed real never splits one semantic value over two leaves.
#[derive(Debug, Copy, Clone)]
pub struct Real(pub f64);

impl Real {
    fn key(self) -> u64 {
        if self.0 == 0.0 {
            0
        } else if self.0.is_nan() {
            f64::NAN.to_bits()
        } else {
            self.0.to_bits()
        }
    }
}

impl PartialEq for Real {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Real {}

impl Hash for Real {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A closed interval `[lo, hi]` with exact rational bounds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Interval {
    lo: BigRational,
    hi: BigRational,
}

impl Interval {
    /// # Panics
    ///
    /// Panics if `lo > hi`.
    pub fn new(lo: BigRational, hi: BigRational) -> Self {
        assert!(lo <= hi, "Interval bounds out of order: [{}, {}]", lo, hi);
        Self { lo, hi }
    }

    pub fn point(x: BigRational) -> Self {
        Self { lo: x.clone(), hi: x }
    }

    pub fn lo(&self) -> &BigRational {
        &self.lo
    }

    pub fn hi(&self) -> &BigRational {
        &self.hi
    }

    pub fn contains_zero(&self) -> bool {
        !self.lo.is_positive() && !self.hi.is_negative()
    }

    pub fn add(&self, other: &Interval) -> Interval {
        Interval::new(&self.lo + &other.lo, &self.hi + &other.hi)
    }

    pub fn sub(&self, other: &Interval) -> Interval {
        Interval::new(&self.lo - &other.hi, &self.hi - &other.lo)
    }

    pub fn mul(&self, other: &Interval) -> Interval {
        let products = [
            &self.lo * &other.lo,
            &self.lo * &other.hi,
            &self.hi * &other.lo,
            &self.hi * &other.hi,
        ];
        let lo = products.iter().min().cloned().unwrap_or_else(BigRational::zero);
        let hi = products.iter().max().cloned().unwrap_or_else(BigRational::zero);
        Interval::new(lo, hi)
    }

    pub fn div(&self, other: &Interval) -> Result<Interval, EvalError> {
        if other.contains_zero() {
            return Err(EvalError::DivisionByZero);
        }
        let recip = Interval::new(other.hi.recip(), other.lo.recip());
        Ok(self.mul(&recip))
    }

    pub fn max(&self, other: &Interval) -> Interval {
        Interval::new(self.lo.clone().max(other.lo.clone()), self.hi.clone().max(other.hi.clone()))
    }

    pub fn min(&self, other: &Interval) -> Interval {
        Interval::new(self.lo.clone().min(other.lo.clone()), self.hi.clone().min(other.hi.clone()))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lo, self.hi)
    }
}

/// A leaf value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Boolean(bool),
    Integer(BigInt),
    Rational(BigRational),
    Real(Real),
    Interval(Interval),
}

impl Value {
    pub fn integer(n: i64) -> Self {
        Value::Integer(BigInt::from(n))
    }

    /// Exact rational `numer / denom`, reduced.
    ///
    /// # Panics
    ///
    /// Panics if `denom == 0`.
    pub fn rational(numer: i64, denom: i64) -> Self {
        Value::Rational(BigRational::new(BigInt::from(numer), BigInt::from(denom)))
    }

    pub fn real(x: f64) -> Self {
        Value::Real(Real(x))
    }

    pub fn interval(lo: BigRational, hi: BigRational) -> Self {
        Value::Interval(Interval::new(lo, hi))
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Boolean(_) => ValueType::Boolean,
            Value::Integer(_) => ValueType::Integer,
            Value::Rational(_) => ValueType::Rational,
            Value::Real(_) => ValueType::Real,
            Value::Interval(_) => ValueType::Interval,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Lossy view as `f64`; intervals map to their midpoint.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Boolean(_) => None,
            Value::Integer(n) => n.to_f64(),
            Value::Rational(q) => q.to_f64(),
            Value::Real(r) => Some(r.0),
            Value::Interval(i) => ((i.lo() + i.hi()) / BigRational::from_integer(BigInt::from(2))).to_f64(),
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Value::Boolean(_) => false,
            Value::Integer(n) => n.is_zero(),
            Value::Rational(q) => q.is_zero(),
            Value::Real(r) => r.0 == 0.0,
            Value::Interval(i) => i.lo().is_zero() && i.hi().is_zero(),
        }
    }

    /// Converts `self` into `target` along the numeric tower.
    pub fn coerce(&self, target: ValueType) -> Result<Value, EvalError> {
        let from = self.value_type();
        if from == target {
            return Ok(self.clone());
        }
        let converted = match (self, target) {
            (Value::Integer(n), ValueType::Rational) => Some(Value::Rational(BigRational::from_integer(n.clone()))),
            (Value::Integer(n), ValueType::Real) => n.to_f64().map(Value::real),
            (Value::Integer(n), ValueType::Interval) => {
                Some(Value::Interval(Interval::point(BigRational::from_integer(n.clone()))))
            }
            (Value::Rational(q), ValueType::Real) => q.to_f64().map(Value::real),
            (Value::Rational(q), ValueType::Interval) => Some(Value::Interval(Interval::point(q.clone()))),
            _ => None,
        };
        converted.ok_or(EvalError::Conversion { from, to: target })
    }

    /// Total order on numeric values of the same promoted type.
    ///
    /// Intervals are ordered only when they do not overlap.
    pub fn compare(&self, other: &Value) -> Result<Ordering, EvalError> {
        let (a, b) = promote(self, other)?;
        match (&a, &b) {
            (Value::Integer(x), Value::Integer(y)) => Ok(x.cmp(y)),
            (Value::Rational(x), Value::Rational(y)) => Ok(x.cmp(y)),
            (Value::Real(x), Value::Real(y)) => x
                .0
                .partial_cmp(&y.0)
                .ok_or_else(|| EvalError::Domain("comparison with NaN".to_string())),
            (Value::Interval(x), Value::Interval(y)) => {
                if x == y && x.lo() == x.hi() {
                    Ok(Ordering::Equal)
                } else if x.hi() < y.lo() {
                    Ok(Ordering::Less)
                } else if y.hi() < x.lo() {
                    Ok(Ordering::Greater)
                } else {
                    Err(EvalError::Domain(format!("overlapping intervals {} and {} are unordered", x, y)))
                }
            }
            _ => Err(EvalError::TypeMismatch {
                expected: "numeric",
                found: a.value_type(),
            }),
        }
    }
}

/// Promotes both operands to their common numeric type.
pub fn promote(a: &Value, b: &Value) -> Result<(Value, Value), EvalError> {
    let (ta, tb) = (a.value_type(), b.value_type());
    for ty in [ta, tb] {
        if !ty.is_numeric() {
            return Err(EvalError::TypeMismatch {
                expected: "numeric",
                found: ty,
            });
        }
    }
    let target = ta.join(tb).ok_or(EvalError::Conversion { from: tb, to: ta })?;
    Ok((a.coerce(target)?, b.coerce(target)?))
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::integer(n as i64)
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::Integer(n)
    }
}

impl From<BigRational> for Value {
    fn from(q: BigRational) -> Self {
        Value::Rational(q)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::real(x)
    }
}

impl From<Interval> for Value {
    fn from(i: Interval) -> Self {
        Value::Interval(i)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Rational(q) => write!(f, "{}", q),
            Value::Real(r) => write!(f, "{}", r),
            Value::Interval(i) => write!(f, "{}", i),
        }
    }
}
