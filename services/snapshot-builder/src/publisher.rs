//! Snapshot publisher
//!
//! Pushes assembled snapshots into an `OrderbookStore`:
//! - resolves the store exponents (a configured value must agree with the
//!   store, zero fields are read back from it)
//! - rescales populated levels from the quantization exponent into them,
//!   merging levels that collapse onto one price
//! - bounds each side to the store's capacity, counting populated levels only
//! - skips sides whose content did not change since the last publish

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use types::errors::NumericError;
use types::ids::Address;
use types::level::{PriceLevel, Side};
use types::numeric::{rescale, Exponents};
use types::store::OrderbookStore;

use crate::aggregator::Quantization;
use crate::assembler::{levels_checksum, OrderbookSnapshot};
use crate::bounds::{BoundsAdapter, BoundsError, OverflowPolicy};
use crate::config::SnapshotConfig;

/// Errors raised while publishing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    #[error("numeric error: {0}")]
    Numeric(#[from] NumericError),

    #[error("bounds error: {0}")]
    Bounds(#[from] BoundsError),

    #[error("store rejected {side:?} update: {message}")]
    Store { side: Side, message: String },

    #[error("configured {field} exponent {configured} does not match stored {stored}")]
    ExponentMismatch {
        field: &'static str,
        configured: i32,
        stored: i32,
    },
}

/// Outcome of one publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReport {
    pub exponents: Exponents,
    pub asks_updated: bool,
    pub bids_updated: bool,
}

/// Writes snapshots to a store on behalf of one authority.
#[derive(Debug)]
pub struct Publisher<S: OrderbookStore> {
    store: S,
    authority: Address,
    exponent_override: Option<Exponents>,
    overflow: OverflowPolicy,
    last_asks: Option<String>,
    last_bids: Option<String>,
}

impl<S: OrderbookStore> Publisher<S> {
    pub fn new(store: S, authority: Address) -> Self {
        Self {
            store,
            authority,
            exponent_override: None,
            overflow: OverflowPolicy::Truncate,
            last_asks: None,
            last_bids: None,
        }
    }

    /// Builds a publisher from the service config.
    pub fn from_config(store: S, config: &SnapshotConfig) -> Self {
        Self::new(store, config.authority)
            .with_exponents(config.store_exponents)
            .with_overflow(config.overflow)
    }

    /// Expected store exponents; zero fields are taken from the store.
    pub fn with_exponents(mut self, exponents: Option<Exponents>) -> Self {
        self.exponent_override = exponents;
        self
    }

    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Exponents levels are written under.
    ///
    /// Always the store's own exponents. A configured non-zero field that
    /// disagrees with the store is an error.
    pub fn resolve_exponents(&self) -> Result<Exponents, PublishError> {
        let stored = self.store.exponents();
        let Some(configured) = self.exponent_override else {
            return Ok(stored);
        };
        let resolved = configured.or_stored(stored);
        for (field, configured, stored) in [
            ("price", resolved.price, stored.price),
            ("size", resolved.size, stored.size),
        ] {
            if configured != stored {
                return Err(PublishError::ExponentMismatch {
                    field,
                    configured,
                    stored,
                });
            }
        }
        debug!(
            price_exponent = resolved.price,
            size_exponent = resolved.size,
            "Configured exponents match store"
        );
        Ok(resolved)
    }

    pub fn publish(
        &mut self,
        snapshot: &OrderbookSnapshot,
        quantization: &Quantization,
    ) -> Result<PublishReport, PublishError> {
        let exponents = self.resolve_exponents()?;
        let adapter = BoundsAdapter::new(self.store.capacity(), self.overflow)?;

        let asks = adapter.adapt(
            rescale_levels(&snapshot.asks, quantization.exponent, exponents)?,
            Side::ASK,
        )?;
        let bids = adapter.adapt(
            rescale_levels(&snapshot.bids, quantization.exponent, exponents)?,
            Side::BID,
        )?;

        let asks_updated = self.write_side(Side::ASK, &asks.levels, snapshot.updated_at)?;
        let bids_updated = self.write_side(Side::BID, &bids.levels, snapshot.updated_at)?;

        info!(
            build_id = %snapshot.build_id,
            market = %snapshot.name,
            price_exponent = exponents.price,
            size_exponent = exponents.size,
            asks_updated,
            bids_updated,
            "Snapshot published"
        );

        Ok(PublishReport {
            exponents,
            asks_updated,
            bids_updated,
        })
    }

    fn write_side(&mut self, side: Side, levels: &[PriceLevel], now: i64) -> Result<bool, PublishError> {
        let checksum = levels_checksum(levels);
        let last = match side {
            Side::ASK => &self.last_asks,
            Side::BID => &self.last_bids,
        };
        if last.as_deref() == Some(checksum.as_str()) {
            debug!(side = side.label(), "Side unchanged, skipping update");
            return Ok(false);
        }

        let result = match side {
            Side::ASK => self.store.update_asks(&self.authority, levels, now),
            Side::BID => self.store.update_bids(&self.authority, levels, now),
        };
        result.map_err(|e| PublishError::Store {
            side,
            message: e.to_string(),
        })?;

        match side {
            Side::ASK => self.last_asks = Some(checksum),
            Side::BID => self.last_bids = Some(checksum),
        }
        Ok(true)
    }
}

/// Re-express populated levels under the store exponents.
///
/// Level prices are stored at `price_exponent`, sizes are token counts
/// (exponent 0). Sentinels are dropped. Rounding into a coarser price
/// exponent is monotonic, so levels that collapse onto one price are
/// adjacent and are merged by summing their sizes.
pub fn rescale_levels(
    levels: &[PriceLevel],
    price_exponent: i32,
    target: Exponents,
) -> Result<Vec<PriceLevel>, NumericError> {
    let mut out: Vec<PriceLevel> = Vec::with_capacity(levels.len());
    for level in levels.iter().filter(|l| !l.is_sentinel()) {
        let price = rescale_u64(level.price, price_exponent, target.price)?;
        let size = rescale_u64(level.size, 0, target.size)?;
        match out.last_mut() {
            Some(last) if last.price == price => {
                last.size = last.size.checked_add(size).ok_or_else(|| NumericError::Overflow {
                    value: format!("{} + {}", last.size, size),
                })?;
            }
            _ => out.push(PriceLevel::new(price, size)),
        }
    }
    Ok(out)
}

fn rescale_u64(value: u64, from: i32, to: i32) -> Result<u64, NumericError> {
    let signed = i64::try_from(value).map_err(|_| NumericError::Overflow {
        value: value.to_string(),
    })?;
    let scaled = rescale(signed, from, to)?;
    u64::try_from(scaled).map_err(|_| NumericError::Negative(scaled.to_string()))
}
