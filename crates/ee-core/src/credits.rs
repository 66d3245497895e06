//! Credits: whole-credit money amounts
//!
//! The server sends pool values, wins and coin values as big integers. On the
//! wire they show up either as JSON numbers or as decimal strings, so the
//! deserializer accepts both.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Non-negative amount of credits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Credits(pub u64);

impl Credits {
    pub const ZERO: Credits = Credits(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// `self / other` as a float, 0 when `other` is zero
    pub fn ratio(self, other: Credits) -> f64 {
        if other.0 == 0 {
            0.0
        } else {
            self.0 as f64 / other.0 as f64
        }
    }

    pub fn saturating_sub(self, other: Credits) -> Credits {
        Credits(self.0.saturating_sub(other.0))
    }
}

impl From<u64> for Credits {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Credits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Credits {
    type Output = Credits;

    fn add(self, rhs: Credits) -> Credits {
        Credits(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Credits {
    fn add_assign(&mut self, rhs: Credits) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Credits {
    type Output = Credits;

    fn sub(self, rhs: Credits) -> Credits {
        self.saturating_sub(rhs)
    }
}

impl Mul<u64> for Credits {
    type Output = Credits;

    fn mul(self, rhs: u64) -> Credits {
        Credits(self.0.saturating_mul(rhs))
    }
}

impl Sum for Credits {
    fn sum<I: Iterator<Item = Credits>>(iter: I) -> Credits {
        iter.fold(Credits::ZERO, |acc, c| acc + c)
    }
}

impl Serialize for Credits {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

struct CreditsVisitor;

impl<'de> Visitor<'de> for CreditsVisitor {
    type Value = Credits;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer or a decimal string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Credits, E> {
        Ok(Credits(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Credits, E> {
        u64::try_from(v)
            .map(Credits)
            .map_err(|_| E::custom(format!("negative credits: {v}")))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Credits, E> {
        if v.is_finite() && v >= 0.0 && v.fract() == 0.0 {
            Ok(Credits(v as u64))
        } else {
            Err(E::custom(format!("credits must be a whole number: {v}")))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Credits, E> {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            return Ok(Credits::ZERO);
        }
        trimmed
            .parse::<u64>()
            .map(Credits)
            .map_err(|_| E::custom(format!("invalid credits string: {v:?}")))
    }
}

impl<'de> Deserialize<'de> for Credits {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Credits, D::Error> {
        deserializer.deserialize_any(CreditsVisitor)
    }
}
