//! L2 orderbook account
//!
//! Holds one market's bounded book and its metadata:
//! - Initialization with market/currency names and minimum increments
//! - Authority-gated market rename, level updates and deprecation
//! - Read-back of levels as real values via the stored exponents
//!
//! Every instruction validates fully before mutating, so a rejected call
//! leaves the account untouched.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use types::errors::NumericError;
use types::ids::{Address, MarketName};
use types::level::{PriceLevel, Side};
use types::numeric::{from_scaled, Exponents, FixedPoint};
use types::store::{InitializeParams, OrderbookStore};

use crate::errors::ProgramError;
use crate::events::{
    LevelsUpdated, MarketUpdated, OrderbookDeprecated, OrderbookInitialized, ProgramEvent,
};
use crate::layout::SnapshotRecord;

/// Maximum byte length of market and currency names.
pub const MAX_NAME_LEN: usize = 16;

/// A level decoded into real units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealLevel {
    pub price: Decimal,
    pub size: Decimal,
}

/// Orderbook account with `N` level slots per side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L2Orderbook<const N: usize> {
    authority: Address,
    market_name: String,
    base_currency_name: String,
    quote_currency_name: String,
    minimum_price_increment: FixedPoint,
    minimum_size_increment: FixedPoint,
    created_at: i64,
    updated_at: i64,
    asks: [PriceLevel; N],
    bids: [PriceLevel; N],
    is_initialized: bool,
    is_deprecated: bool,
    /// Emitted events log (append-only)
    events: Vec<ProgramEvent>,
}

impl<const N: usize> Default for L2Orderbook<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> L2Orderbook<N> {
    /// Slots per side.
    pub const CAPACITY: usize = N;

    /// Empty, uninitialized account.
    pub fn new() -> Self {
        Self {
            authority: Address::ZERO,
            market_name: String::new(),
            base_currency_name: String::new(),
            quote_currency_name: String::new(),
            minimum_price_increment: FixedPoint::default(),
            minimum_size_increment: FixedPoint::default(),
            created_at: 0,
            updated_at: 0,
            asks: [PriceLevel::EMPTY; N],
            bids: [PriceLevel::EMPTY; N],
            is_initialized: false,
            is_deprecated: false,
            events: Vec::new(),
        }
    }

    // ───────────────────────── Instructions ─────────────────────────

    /// Create the market. Exponents are taken from the increments.
    pub fn initialize(&mut self, params: InitializeParams, now: i64) -> Result<ProgramEvent, ProgramError> {
        if self.is_initialized {
            return Err(ProgramError::AlreadyInitialized);
        }
        validate_names(&params.market_name, &params.base_currency, &params.quote_currency)?;
        if params.min_size_increment.value <= 0 {
            return Err(ProgramError::InvalidSizeIncrement(params.min_size_increment.to_string()));
        }
        if params.min_price_increment.value <= 0 {
            return Err(ProgramError::InvalidPriceIncrement(params.min_price_increment.to_string()));
        }

        let exponents = params.exponents();
        self.authority = params.admin;
        self.market_name = params.market_name;
        self.base_currency_name = params.base_currency;
        self.quote_currency_name = params.quote_currency;
        self.minimum_size_increment = params.min_size_increment;
        self.minimum_price_increment = params.min_price_increment;
        self.created_at = now;
        self.updated_at = now;
        self.is_initialized = true;

        info!(
            authority = %self.authority,
            market = %self.market_name,
            price_exponent = exponents.price,
            size_exponent = exponents.size,
            "L2 Orderbook initialized"
        );

        Ok(self.emit(ProgramEvent::Initialized(OrderbookInitialized {
            authority: self.authority,
            market_name: self.market_name.clone(),
            base_currency: self.base_currency_name.clone(),
            quote_currency: self.quote_currency_name.clone(),
            exponents,
            at: now,
        })))
    }

    /// Rename the market and its currencies.
    pub fn update_market(
        &mut self,
        caller: &Address,
        market: impl Into<String>,
        base_currency: impl Into<String>,
        quote_currency: impl Into<String>,
        now: i64,
    ) -> Result<ProgramEvent, ProgramError> {
        self.check_writable(caller, now)?;
        let (market, base_currency, quote_currency) = (market.into(), base_currency.into(), quote_currency.into());
        validate_names(&market, &base_currency, &quote_currency)?;

        self.market_name = market;
        self.base_currency_name = base_currency;
        self.quote_currency_name = quote_currency;
        self.updated_at = now;

        info!(market = %self.market_name, "Market updated");

        Ok(self.emit(ProgramEvent::MarketUpdated(MarketUpdated {
            market_name: self.market_name.clone(),
            base_currency: self.base_currency_name.clone(),
            quote_currency: self.quote_currency_name.clone(),
            at: now,
        })))
    }

    /// Overwrite all bid slots. Exactly `N` levels.
    pub fn update_bids(
        &mut self,
        caller: &Address,
        levels: &[PriceLevel],
        now: i64,
    ) -> Result<ProgramEvent, ProgramError> {
        self.update_levels(caller, Side::BID, levels, now)
    }

    /// Overwrite all ask slots. Exactly `N` levels.
    pub fn update_asks(
        &mut self,
        caller: &Address,
        levels: &[PriceLevel],
        now: i64,
    ) -> Result<ProgramEvent, ProgramError> {
        self.update_levels(caller, Side::ASK, levels, now)
    }

    /// Freeze the account; later writes are rejected.
    pub fn deprecate(&mut self, caller: &Address, now: i64) -> Result<ProgramEvent, ProgramError> {
        self.check_writable(caller, now)?;
        self.is_deprecated = true;
        self.updated_at = now;

        info!(market = %self.market_name, "L2 Orderbook deprecated");

        Ok(self.emit(ProgramEvent::Deprecated(OrderbookDeprecated { at: now })))
    }

    fn update_levels(
        &mut self,
        caller: &Address,
        side: Side,
        levels: &[PriceLevel],
        now: i64,
    ) -> Result<ProgramEvent, ProgramError> {
        self.check_writable(caller, now)?;
        if levels.len() != N {
            return Err(ProgramError::LevelCountMismatch {
                side,
                expected: N,
                actual: levels.len(),
            });
        }

        let slots = match side {
            Side::ASK => &mut self.asks,
            Side::BID => &mut self.bids,
        };
        slots.copy_from_slice(levels);
        self.updated_at = now;

        let populated = levels.iter().filter(|l| !l.is_sentinel()).count();
        debug!(side = side.label(), populated, "Levels updated");

        Ok(self.emit(ProgramEvent::LevelsUpdated(LevelsUpdated {
            side,
            populated,
            at: now,
        })))
    }

    /// Initialized, live, called by the authority, and not behind the account clock.
    fn check_writable(&self, caller: &Address, now: i64) -> Result<(), ProgramError> {
        if !self.is_initialized {
            return Err(ProgramError::NotInitialized);
        }
        if self.is_deprecated {
            return Err(ProgramError::Deprecated);
        }
        if *caller != self.authority {
            return Err(ProgramError::Unauthorized);
        }
        if now < self.updated_at {
            return Err(ProgramError::StaleTimestamp {
                now,
                last: self.updated_at,
            });
        }
        Ok(())
    }

    fn emit(&mut self, event: ProgramEvent) -> ProgramEvent {
        self.events.push(event.clone());
        event
    }

    // ───────────────────────── Queries ─────────────────────────

    pub fn authority(&self) -> &Address {
        &self.authority
    }

    pub fn market_name(&self) -> &str {
        &self.market_name
    }

    pub fn base_currency(&self) -> &str {
        &self.base_currency_name
    }

    pub fn quote_currency(&self) -> &str {
        &self.quote_currency_name
    }

    pub fn exponents(&self) -> Exponents {
        Exponents::new(
            self.minimum_price_increment.exponent,
            self.minimum_size_increment.exponent,
        )
    }

    pub fn minimum_price_increment(&self) -> FixedPoint {
        self.minimum_price_increment
    }

    pub fn minimum_size_increment(&self) -> FixedPoint {
        self.minimum_size_increment
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn updated_at(&self) -> i64 {
        self.updated_at
    }

    pub fn asks(&self) -> &[PriceLevel; N] {
        &self.asks
    }

    pub fn bids(&self) -> &[PriceLevel; N] {
        &self.bids
    }

    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    pub fn is_deprecated(&self) -> bool {
        self.is_deprecated
    }

    pub fn events(&self) -> &[ProgramEvent] {
        &self.events
    }

    /// Populated ask levels in real units.
    pub fn real_asks(&self) -> Result<Vec<RealLevel>, ProgramError> {
        self.real_levels(&self.asks)
    }

    /// Populated bid levels in real units.
    pub fn real_bids(&self) -> Result<Vec<RealLevel>, ProgramError> {
        self.real_levels(&self.bids)
    }

    fn real_levels(&self, levels: &[PriceLevel]) -> Result<Vec<RealLevel>, ProgramError> {
        let exponents = self.exponents();
        levels
            .iter()
            .filter(|l| !l.is_sentinel())
            .map(|l| {
                Ok(RealLevel {
                    price: decode_u64(l.price, exponents.price)?,
                    size: decode_u64(l.size, exponents.size)?,
                })
            })
            .collect()
    }

    /// Fixed-layout record of the current book.
    ///
    /// The record name slot is narrower than the account's market name.
    pub fn snapshot_record(&self, identifier: Address) -> Result<SnapshotRecord<N>, ProgramError> {
        Ok(SnapshotRecord::new(
            MarketName::new(self.market_name.as_str())?,
            identifier,
            self.updated_at,
            self.asks,
            self.bids,
        ))
    }
}

impl<const N: usize> OrderbookStore for L2Orderbook<N> {
    type Error = ProgramError;

    fn capacity(&self) -> usize {
        N
    }

    fn exponents(&self) -> Exponents {
        L2Orderbook::exponents(self)
    }

    fn initialize(&mut self, params: InitializeParams, now: i64) -> Result<(), ProgramError> {
        L2Orderbook::initialize(self, params, now).map(|_| ())
    }

    fn update_bids(&mut self, authority: &Address, levels: &[PriceLevel], now: i64) -> Result<(), ProgramError> {
        L2Orderbook::update_bids(self, authority, levels, now).map(|_| ())
    }

    fn update_asks(&mut self, authority: &Address, levels: &[PriceLevel], now: i64) -> Result<(), ProgramError> {
        L2Orderbook::update_asks(self, authority, levels, now).map(|_| ())
    }
}

fn validate_names(market: &str, base: &str, quote: &str) -> Result<(), ProgramError> {
    if market.is_empty() {
        return Err(ProgramError::MarketEmpty);
    }
    if base.is_empty() {
        return Err(ProgramError::BaseCurrencyEmpty);
    }
    if quote.is_empty() {
        return Err(ProgramError::QuoteCurrencyEmpty);
    }
    for (field, value) in [("market", market), ("base currency", base), ("quote currency", quote)] {
        if value.len() > MAX_NAME_LEN {
            return Err(ProgramError::NameTooLong {
                field,
                len: value.len(),
                max: MAX_NAME_LEN,
            });
        }
    }
    Ok(())
}

fn decode_u64(value: u64, exponent: i32) -> Result<Decimal, NumericError> {
    let signed = i64::try_from(value).map_err(|_| NumericError::Overflow {
        value: value.to_string(),
    })?;
    from_scaled(signed, exponent)
}
