//! Price level aggregation
//!
//! Collapses raw orders into price-unique levels with summed sizes.
//! Uses `BTreeMap` keyed by quantized price for deterministic sorted
//! iteration, so aggregation is O(n log n).
//!
//! Currency conversion is applied before quantization: a level's price is
//! `order.price × rate`, expressed in units of `10^exponent`.

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use types::errors::{NumericError, ValidationError};
use types::level::{PriceLevel, Side};
use types::numeric::{decimal_from_f64, pow10, DEFAULT_ROUNDING};

use crate::events::RawOrder;

/// Errors raised while aggregating orders into levels.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregationError {
    #[error("price {price} is not a whole number of units at exponent {exponent}")]
    UnquantizedPrice { price: String, exponent: i32 },

    #[error("quantized price {0} is negative")]
    NegativePrice(String),

    #[error("size overflow at price level {price}")]
    SizeOverflow { price: u64 },

    #[error("numeric error: {0}")]
    Numeric(#[from] NumericError),
}

/// How continuous prices map onto integer level prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantization {
    /// Level price unit is `10^exponent` quote units
    pub exponent: i32,
    /// Round to the nearest unit; when false the price must already be whole
    pub round: bool,
}

impl Default for Quantization {
    fn default() -> Self {
        Self {
            exponent: 0,
            round: true,
        }
    }
}

/// Native-to-quote conversion rate. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct ExchangeRate(Decimal);

impl ExchangeRate {
    pub fn new(rate: Decimal) -> Result<Self, ValidationError> {
        if rate <= Decimal::ZERO {
            return Err(ValidationError::InvalidPrice(format!("exchange rate {rate}")));
        }
        Ok(Self(rate))
    }

    /// From a collaborator-supplied float.
    pub fn from_f64(rate: f64) -> Result<Self, ValidationError> {
        Self::new(decimal_from_f64(rate)?)
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for ExchangeRate {
    type Error = ValidationError;

    fn try_from(rate: Decimal) -> Result<Self, Self::Error> {
        Self::new(rate)
    }
}

impl From<ExchangeRate> for Decimal {
    fn from(rate: ExchangeRate) -> Self {
        rate.0
    }
}

/// Which levels survive when a side is cut to a fixed depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthPolicy {
    /// Keep the levels closest to the top of book, best first:
    /// lowest asks ascending, highest bids descending.
    #[default]
    NearestToMarket,
    /// Sort descending and keep the last `depth` entries, for both sides.
    LegacyTail,
}

/// Aggregates raw orders into price levels.
///
/// Holds no per-build state; every call allocates its own working map.
#[derive(Debug, Clone)]
pub struct PriceLevelAggregator {
    quantization: Quantization,
    rate: Option<ExchangeRate>,
}

impl PriceLevelAggregator {
    pub fn new(quantization: Quantization, rate: Option<ExchangeRate>) -> Self {
        Self { quantization, rate }
    }

    /// Aggregator with whole-unit rounding and no conversion.
    pub fn with_defaults() -> Self {
        Self::new(Quantization::default(), None)
    }

    pub fn quantization(&self) -> Quantization {
        self.quantization
    }

    pub fn rate(&self) -> Option<ExchangeRate> {
        self.rate
    }

    /// Integer level price for one raw price.
    pub fn quantize(&self, price: Decimal) -> Result<u64, AggregationError> {
        let converted = match self.rate {
            Some(rate) => price
                .checked_mul(rate.as_decimal())
                .ok_or_else(|| NumericError::Overflow {
                    value: format!("{price} * {}", rate.as_decimal()),
                })?,
            None => price,
        };
        let scaled = converted
            .checked_mul(pow10(-self.quantization.exponent)?)
            .ok_or_else(|| NumericError::Overflow {
                value: converted.to_string(),
            })?;

        let whole = if self.quantization.round {
            scaled.round_dp_with_strategy(0, DEFAULT_ROUNDING)
        } else if scaled.fract().is_zero() {
            scaled
        } else {
            return Err(AggregationError::UnquantizedPrice {
                price: converted.to_string(),
                exponent: self.quantization.exponent,
            });
        };

        if whole.is_sign_negative() && !whole.is_zero() {
            return Err(AggregationError::NegativePrice(whole.to_string()));
        }
        whole.to_u64().ok_or_else(|| {
            AggregationError::Numeric(NumericError::Overflow {
                value: whole.to_string(),
            })
        })
    }

    /// Collapse orders into price-unique levels sorted by price descending.
    ///
    /// Sizes sharing a quantized price are summed. Zero-size orders still
    /// create a level.
    pub fn aggregate(&self, orders: &[RawOrder]) -> Result<Vec<PriceLevel>, AggregationError> {
        let mut levels: BTreeMap<u64, u64> = BTreeMap::new();

        for order in orders {
            let price = self.quantize(order.price)?;
            let size = levels.entry(price).or_insert(0);
            *size = size
                .checked_add(order.size)
                .ok_or(AggregationError::SizeOverflow { price })?;
        }

        debug!(
            orders = orders.len(),
            levels = levels.len(),
            "Orders aggregated"
        );

        Ok(levels
            .into_iter()
            .rev()
            .map(|(price, size)| PriceLevel::new(price, size))
            .collect())
    }
}

/// Cut a side to at most `depth` levels under `policy`.
pub fn select_depth(
    levels: &[PriceLevel],
    depth: usize,
    side: Side,
    policy: DepthPolicy,
) -> Vec<PriceLevel> {
    let mut sorted = levels.to_vec();
    match policy {
        DepthPolicy::NearestToMarket => {
            match side {
                Side::ASK => sorted.sort_by(|a, b| a.price.cmp(&b.price)),
                Side::BID => sorted.sort_by(|a, b| b.price.cmp(&a.price)),
            }
            sorted.truncate(depth);
            sorted
        }
        DepthPolicy::LegacyTail => {
            sorted.sort_by(|a, b| b.price.cmp(&a.price));
            let start = sorted.len().saturating_sub(depth);
            sorted.split_off(start)
        }
    }
}
