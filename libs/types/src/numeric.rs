//! Fixed-point decimal types for prices and sizes
//!
//! Uses rust_decimal for deterministic arithmetic (no floating-point errors).
//!
//! One convention applies everywhere: a stored pair `(value, exponent)`
//! represents the real quantity `value × 10^exponent`.
//!
//! - [`to_scaled`] computes `round(real × 10^exponent)` (midpoint away from
//!   zero, or a caller-supplied [`RoundingStrategy`] via [`to_scaled_with`]).
//! - [`from_scaled`] computes `value × 10^exponent` exactly.
//!
//! Encoding a real number into a stored pair therefore scales by the
//! *negated* exponent: see [`FixedPoint::encode`]. The two functions are not an
//! inverse pair: encoding rounds, decoding is exact.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::NumericError;

/// Largest exponent magnitude representable by `rust_decimal` (28 digits of scale).
pub const MAX_EXPONENT: u32 = 28;

/// Default rounding used by [`to_scaled`]. Matches "round half up" for the
/// non-negative prices this crate deals with.
pub const DEFAULT_ROUNDING: RoundingStrategy = RoundingStrategy::MidpointAwayFromZero;

/// `10^exponent` as an exact decimal.
pub fn pow10(exponent: i32) -> Result<Decimal, NumericError> {
    let magnitude = exponent.unsigned_abs();
    if magnitude > MAX_EXPONENT {
        return Err(NumericError::ExponentOutOfRange {
            exponent,
            max: MAX_EXPONENT,
        });
    }
    if exponent >= 0 {
        Ok(Decimal::from_i128_with_scale(10_i128.pow(magnitude), 0))
    } else {
        Ok(Decimal::from_i128_with_scale(1, magnitude))
    }
}

/// Compute `round(real × 10^exponent)` with [`DEFAULT_ROUNDING`].
pub fn to_scaled(real: Decimal, exponent: i32) -> Result<i64, NumericError> {
    to_scaled_with(real, exponent, DEFAULT_ROUNDING)
}

/// Compute `round(real × 10^exponent)` with an explicit rounding strategy.
pub fn to_scaled_with(
    real: Decimal,
    exponent: i32,
    strategy: RoundingStrategy,
) -> Result<i64, NumericError> {
    let scaled = real
        .checked_mul(pow10(exponent)?)
        .ok_or_else(|| NumericError::Overflow {
            value: format!("{real}e{exponent}"),
        })?;
    scaled
        .round_dp_with_strategy(0, strategy)
        .to_i64()
        .ok_or_else(|| NumericError::Overflow {
            value: scaled.to_string(),
        })
}

/// Recover the real quantity `value × 10^exponent`. Exact.
pub fn from_scaled(value: i64, exponent: i32) -> Result<Decimal, NumericError> {
    Decimal::from(value)
        .checked_mul(pow10(exponent)?)
        .ok_or_else(|| NumericError::Overflow {
            value: format!("{value}e{exponent}"),
        })
}

/// Re-express a scaled integer stored under `from` as one stored under `to`.
///
/// Rounds when `to` is coarser than `from`.
pub fn rescale(value: i64, from: i32, to: i32) -> Result<i64, NumericError> {
    if from == to {
        return Ok(value);
    }
    to_scaled(from_scaled(value, from)?, -to)
}

/// Convert a collaborator-supplied float into a decimal.
///
/// Rejects NaN and infinities. Uses the shortest decimal representation of
/// the float, so `0.1` becomes exactly `0.1`.
pub fn decimal_from_f64(value: f64) -> Result<Decimal, NumericError> {
    if !value.is_finite() {
        return Err(NumericError::NonFinite(value.to_string()));
    }
    Decimal::from_f64(value).ok_or_else(|| NumericError::Overflow {
        value: value.to_string(),
    })
}

/// A `(value, exponent)` pair representing `value × 10^exponent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FixedPoint {
    pub value: i64,
    pub exponent: i32,
}

impl FixedPoint {
    pub const fn new(value: i64, exponent: i32) -> Self {
        Self { value, exponent }
    }

    /// Encode a real quantity under a fixed exponent, rounding to the
    /// nearest representable step.
    pub fn encode(real: Decimal, exponent: i32) -> Result<Self, NumericError> {
        Ok(Self {
            value: to_scaled(real, -exponent)?,
            exponent,
        })
    }

    /// The real quantity this pair represents.
    pub fn real_value(&self) -> Result<Decimal, NumericError> {
        from_scaled(self.value, self.exponent)
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    /// Same quantity under another exponent (rounded if coarser).
    pub fn with_exponent(&self, exponent: i32) -> Result<Self, NumericError> {
        Ok(Self {
            value: rescale(self.value, self.exponent, exponent)?,
            exponent,
        })
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}e{}", self.value, self.exponent)
    }
}

/// Per-field exponents of a stored orderbook: prices and sizes scale independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Exponents {
    pub price: i32,
    pub size: i32,
}

impl Exponents {
    pub const fn new(price: i32, size: i32) -> Self {
        Self { price, size }
    }

    /// Fill unset (zero) fields from `stored`.
    pub fn or_stored(self, stored: Exponents) -> Self {
        Self {
            price: if self.price == 0 { stored.price } else { self.price },
            size: if self.size == 0 { stored.size } else { self.size },
        }
    }
}
