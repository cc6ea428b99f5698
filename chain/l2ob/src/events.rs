//! Program events
//!
//! Immutable records appended to the account's event log by every
//! successful mutation.

use serde::{Deserialize, Serialize};
use types::ids::Address;
use types::level::Side;
use types::numeric::Exponents;

/// Orderbook account created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderbookInitialized {
    pub authority: Address,
    pub market_name: String,
    pub base_currency: String,
    pub quote_currency: String,
    pub exponents: Exponents,
    pub at: i64,
}

/// Market metadata renamed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketUpdated {
    pub market_name: String,
    pub base_currency: String,
    pub quote_currency: String,
    pub at: i64,
}

/// One side of the book overwritten
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelsUpdated {
    pub side: Side,
    /// Non-sentinel levels written
    pub populated: usize,
    pub at: i64,
}

/// Orderbook frozen against further updates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderbookDeprecated {
    pub at: i64,
}

/// Enum wrapper for all program events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgramEvent {
    Initialized(OrderbookInitialized),
    MarketUpdated(MarketUpdated),
    LevelsUpdated(LevelsUpdated),
    Deprecated(OrderbookDeprecated),
}

impl ProgramEvent {
    pub fn at(&self) -> i64 {
        match self {
            ProgramEvent::Initialized(e) => e.at,
            ProgramEvent::MarketUpdated(e) => e.at,
            ProgramEvent::LevelsUpdated(e) => e.at,
            ProgramEvent::Deprecated(e) => e.at,
        }
    }
}
