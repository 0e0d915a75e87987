//! Monetary amounts held as integer cents.
//!
//! Every amount read from the backend goes through [`Amount::coerce`]:
//! numbers and numeric strings round to the nearest cent, anything missing,
//! non-numeric, non-finite or negative becomes zero. Stats arithmetic is done
//! on the cents value so optimistic adjustments can be undone exactly.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

/// Largest magnitude accepted from the wire, in whole currency units.
const MAX_UNITS: f64 = 1e13;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Whole units, e.g. `Amount::from_units(1000)` is 1000.00.
    pub fn from_units(units: i64) -> Self {
        Self(units.saturating_mul(100))
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Apply the coercion rule to an arbitrary JSON value.
    pub fn coerce(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map(Self::from_f64).unwrap_or_default(),
            serde_json::Value::String(s) => Self::parse_lenient(s),
            _ => Self::ZERO,
        }
    }

    /// Parse a decimal string, falling back to zero when it is not a usable amount.
    pub fn parse_lenient(raw: &str) -> Self {
        raw.trim()
            .parse::<f64>()
            .map(Self::from_f64)
            .unwrap_or_default()
    }

    fn from_f64(value: f64) -> Self {
        if !value.is_finite() || value < 0.0 || value > MAX_UNITS {
            return Self::ZERO;
        }
        Self((value * 100.0).round() as i64)
    }

    pub fn saturating_add(self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }

    /// Subtract, stopping at zero.
    pub fn saturating_sub_floor(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0).max(0))
    }

    /// Render with thousands separators, e.g. `12,500.00`.
    pub fn grouped(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = (abs / 100).to_string();
        let mut out = String::with_capacity(units.len() + units.len() / 3 + 4);
        for (i, ch) in units.chars().enumerate() {
            if i > 0 && (units.len() - i) % 3 == 0 {
                out.push(',');
            }
            out.push(ch);
        }
        format!("{}{}.{:02}", sign, out, abs % 100)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        self.saturating_add(rhs)
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Amount {
        iter.copied().sum()
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(Amount::coerce(&value))
    }
}
