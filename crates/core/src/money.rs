use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

/// Dollar amount rounded to cents. Serialized as a plain JSON number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::from(cents) / Decimal::from(100))
    }

    pub fn to_cents(self) -> i64 {
        (self.0 * Decimal::from(100)).round().to_i64().unwrap_or_default()
    }

    pub fn from_decimal(decimal: Decimal) -> Self {
        Money(decimal.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    pub fn from_f64(value: f64) -> Option<Self> {
        Decimal::from_f64(value).map(Money::from_decimal)
    }

    /// Parses statement-style amounts: `$1,234.56`, `-15.00`, `(75.25)`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (negative, s) = match s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
            Some(inner) => (true, inner),
            None => (false, s),
        };
        let s = s.replace([',', '$', ' '], "");
        if s.is_empty() {
            return None;
        }
        let dec = Decimal::from_str(&s).ok()?;
        Some(Money::from_decimal(if negative { -dec } else { dec }))
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    pub fn to_f64(self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }

    /// Scales by a fractional factor, e.g. `0.9` for a 10% reduction.
    pub fn scale(self, factor: Decimal) -> Self {
        Money::from_decimal(self.0 * factor)
    }

    /// Divides evenly, returning zero for a zero divisor.
    pub fn div_by(self, divisor: usize) -> Self {
        if divisor == 0 {
            return Money::zero();
        }
        Money::from_decimal(self.0 / Decimal::from(divisor))
    }

    /// Share of `total` as a percentage, or 0 when `total` is zero.
    pub fn percent_of(self, total: Money) -> f64 {
        if total.is_zero() {
            return 0.0;
        }
        (self.0 / total.0 * Decimal::from(100))
            .to_f64()
            .unwrap_or_default()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |a, b| a + b)
    }
}
