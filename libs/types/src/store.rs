//! Persistence collaborator interface
//!
//! A store holds one fixed-capacity orderbook: `capacity()` ask slots and
//! `capacity()` bid slots, each level expressed under the store's own
//! [`Exponents`]. Writers must hand over exactly `capacity()` levels per side.

use serde::{Deserialize, Serialize};

use crate::ids::Address;
use crate::level::PriceLevel;
use crate::numeric::{Exponents, FixedPoint};

/// Arguments for creating a market in a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializeParams {
    pub admin: Address,
    pub market_name: String,
    pub base_currency: String,
    pub quote_currency: String,
    pub min_size_increment: FixedPoint,
    pub min_price_increment: FixedPoint,
}

impl InitializeParams {
    /// Exponents implied by the two increments.
    pub fn exponents(&self) -> Exponents {
        Exponents::new(self.min_price_increment.exponent, self.min_size_increment.exponent)
    }
}

/// Mutation interface of a fixed-capacity orderbook store.
///
/// Implementations apply each call atomically: a rejected call leaves the
/// stored book untouched.
pub trait OrderbookStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Slots per side.
    fn capacity(&self) -> usize;

    /// Exponents currently stored for level prices and sizes.
    fn exponents(&self) -> Exponents;

    fn initialize(&mut self, params: InitializeParams, now: i64) -> Result<(), Self::Error>;

    fn update_bids(
        &mut self,
        authority: &Address,
        levels: &[PriceLevel],
        now: i64,
    ) -> Result<(), Self::Error>;

    fn update_asks(
        &mut self,
        authority: &Address,
        levels: &[PriceLevel],
        now: i64,
    ) -> Result<(), Self::Error>;
}
