//! Order and bid-event definitions consumed by the snapshot builder
//!
//! - `RawOrder`: one resting order after ingestion, price in native units
//! - `BidEvent`: closed tagged variant for the bid log (placed / cancelled)
//! - `OrderingKey`: explicit `(timestamp, sequence)` total order on the log
//!
//! All values are produced fresh per build and consumed once.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::errors::ValidationError;

/// A single resting order, already normalized to `(price, size)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOrder {
    /// Price in native units (e.g. SOL, not lamports)
    pub price: Decimal,
    /// Number of tokens
    pub size: u64,
    /// Token identity (mint), when the source provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
}

impl RawOrder {
    /// Create an order, rejecting negative prices.
    pub fn new(price: Decimal, size: u64) -> Result<Self, ValidationError> {
        if price.is_sign_negative() && !price.is_zero() {
            return Err(ValidationError::InvalidPrice(price.to_string()));
        }
        Ok(Self {
            price,
            size,
            identity: None,
        })
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }
}

/// Position of an entry in the bid log.
///
/// Orders lexicographically: timestamp first, then sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct OrderingKey {
    /// Unix seconds reported by the source
    pub timestamp: i64,
    /// Tie-breaker within one timestamp
    pub sequence: u64,
}

impl OrderingKey {
    pub const fn new(timestamp: i64, sequence: u64) -> Self {
        Self { timestamp, sequence }
    }
}

/// One entry of the bid log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum BidEvent {
    /// A bid was placed on a token
    Placed {
        key: OrderingKey,
        identity: String,
        price: Decimal,
        size: u64,
    },

    /// A bid on a token was withdrawn
    Cancelled { key: OrderingKey, identity: String },
}

impl BidEvent {
    pub fn placed(key: OrderingKey, identity: impl Into<String>, price: Decimal, size: u64) -> Self {
        Self::Placed {
            key,
            identity: identity.into(),
            price,
            size,
        }
    }

    pub fn cancelled(key: OrderingKey, identity: impl Into<String>) -> Self {
        Self::Cancelled {
            key,
            identity: identity.into(),
        }
    }

    pub fn key(&self) -> OrderingKey {
        match self {
            BidEvent::Placed { key, .. } | BidEvent::Cancelled { key, .. } => *key,
        }
    }

    pub fn identity(&self) -> &str {
        match self {
            BidEvent::Placed { identity, .. } | BidEvent::Cancelled { identity, .. } => identity,
        }
    }

    /// Get the event kind as a string label for logging.
    pub fn kind_label(&self) -> &'static str {
        match self {
            BidEvent::Placed { .. } => "Placed",
            BidEvent::Cancelled { .. } => "Cancelled",
        }
    }
}

/// A bid still resting after reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveBid {
    pub key: OrderingKey,
    pub identity: String,
    pub price: Decimal,
    pub size: u64,
}

impl From<LiveBid> for RawOrder {
    fn from(bid: LiveBid) -> Self {
        RawOrder {
            price: bid.price,
            size: bid.size,
            identity: Some(bid.identity),
        }
    }
}
