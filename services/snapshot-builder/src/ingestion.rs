//! Ingestion layer at the collaborator boundary
//!
//! Validates source-shaped records from the listings and bid-event
//! collaborators and converts them into `RawOrder` / `BidEvent` values.
//!
//! Two listing shapes are accepted:
//! - nested: `activeListings[0].amount` in base units, one token per record
//! - flat: `price` in native units with an explicit `tokenSize`
//!
//! Malformed records fail the whole batch; nothing is silently zeroed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use types::numeric::decimal_from_f64;

use crate::events::{BidEvent, OrderingKey, RawOrder};

/// Errors that can occur during ingestion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestionError {
    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("record {index}: no active listing")]
    EmptyListing { index: usize },

    #[error("record {index}: missing field `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("record {index}: invalid amount {value}: {reason}")]
    InvalidAmount {
        index: usize,
        value: String,
        reason: String,
    },

    #[error("record {index}: invalid token size {value}")]
    InvalidSize { index: usize, value: String },

    #[error("base units per native token must be positive")]
    ZeroBaseUnits,
}

/// One active listing inside a nested record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveListing {
    /// Asking price in base units
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketplace: Option<String>,
}

/// Listing with the price nested under `activeListings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedListing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mint: Option<String>,
    pub active_listings: Vec<ActiveListing>,
}

/// Listing with a flat native-unit price and size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatListing {
    /// Asking price in native units
    pub price: f64,
    #[serde(alias = "size")]
    pub token_size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_mint: Option<String>,
}

/// A listing record in either source shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListingRecord {
    Nested(NestedListing),
    Flat(FlatListing),
}

/// Kind of a bid-log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BidEventKind {
    #[serde(rename = "NFT_BID")]
    Bid,
    #[serde(rename = "NFT_BID_CANCELLED")]
    BidCancelled,
}

/// Token reference carried by some bid-event sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftRef {
    pub mint: String,
}

/// A bid-log record as delivered by the collaborator.
///
/// The token identity comes from `identity`, or failing that from
/// `nfts[0].mint`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidEventRecord {
    #[serde(rename = "type")]
    pub kind: BidEventKind,
    /// Bid amount in base units; required for placements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nfts: Vec<NftRef>,
    /// Unix seconds; missing timestamps sort first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Defaults to the record's arrival position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
}

impl BidEventRecord {
    fn resolved_identity(&self) -> Option<&str> {
        self.identity
            .as_deref()
            .or_else(|| self.nfts.first().map(|n| n.mint.as_str()))
    }
}

/// Parse a JSON array of listing records.
pub fn parse_listings_json(payload: &str) -> Result<Vec<ListingRecord>, IngestionError> {
    serde_json::from_str(payload).map_err(|e| IngestionError::Malformed(e.to_string()))
}

/// Parse a JSON array of bid-log records.
///
/// Unknown `type` values are rejected.
pub fn parse_bid_events_json(payload: &str) -> Result<Vec<BidEventRecord>, IngestionError> {
    serde_json::from_str(payload).map_err(|e| IngestionError::Malformed(e.to_string()))
}

/// Convert listing records into raw ask orders with native-unit prices.
pub fn ingest_listings(
    records: &[ListingRecord],
    base_units_per_native: u64,
) -> Result<Vec<RawOrder>, IngestionError> {
    let divisor = base_divisor(base_units_per_native)?;
    let mut orders = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let order = match record {
            ListingRecord::Nested(listing) => {
                let active = listing
                    .active_listings
                    .first()
                    .ok_or(IngestionError::EmptyListing { index })?;
                let base_units = non_negative_decimal(index, active.amount)?;
                let order = raw_order(index, base_units / divisor, 1)?;
                match &listing.mint {
                    Some(mint) => order.with_identity(mint.as_str()),
                    None => order,
                }
            }
            ListingRecord::Flat(listing) => {
                let price = non_negative_decimal(index, listing.price)?;
                let size = token_size(index, listing.token_size)?;
                let order = raw_order(index, price, size)?;
                match &listing.token_mint {
                    Some(mint) => order.with_identity(mint.as_str()),
                    None => order,
                }
            }
        };
        debug!(index, price = %order.price, size = order.size, "Listing ingested");
        orders.push(order);
    }

    info!(records = records.len(), "Listings ingested");
    Ok(orders)
}

/// Convert bid-log records into typed bid events.
///
/// Every placement is one token. Amounts are converted from base units to
/// native units.
pub fn ingest_bid_events(
    records: &[BidEventRecord],
    base_units_per_native: u64,
) -> Result<Vec<BidEvent>, IngestionError> {
    let divisor = base_divisor(base_units_per_native)?;
    let mut events = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let identity = record
            .resolved_identity()
            .ok_or(IngestionError::MissingField {
                index,
                field: "identity",
            })?;
        let key = OrderingKey::new(
            record.timestamp.unwrap_or(0),
            record.sequence.unwrap_or(index as u64),
        );

        let event = match record.kind {
            BidEventKind::Bid => {
                let amount = record.amount.ok_or(IngestionError::MissingField {
                    index,
                    field: "amount",
                })?;
                let base_units = non_negative_decimal(index, amount)?;
                BidEvent::placed(key, identity, base_units / divisor, 1)
            }
            BidEventKind::BidCancelled => BidEvent::cancelled(key, identity),
        };
        debug!(
            index,
            kind = event.kind_label(),
            identity = event.identity(),
            "Bid event ingested"
        );
        events.push(event);
    }

    info!(records = records.len(), "Bid events ingested");
    Ok(events)
}

fn base_divisor(base_units_per_native: u64) -> Result<Decimal, IngestionError> {
    if base_units_per_native == 0 {
        return Err(IngestionError::ZeroBaseUnits);
    }
    Ok(Decimal::from(base_units_per_native))
}

fn non_negative_decimal(index: usize, value: f64) -> Result<Decimal, IngestionError> {
    let decimal = decimal_from_f64(value).map_err(|e| IngestionError::InvalidAmount {
        index,
        value: value.to_string(),
        reason: e.to_string(),
    })?;
    if decimal.is_sign_negative() && !decimal.is_zero() {
        return Err(IngestionError::InvalidAmount {
            index,
            value: value.to_string(),
            reason: "negative".to_string(),
        });
    }
    Ok(decimal)
}

fn token_size(index: usize, value: f64) -> Result<u64, IngestionError> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value >= u64::MAX as f64 {
        return Err(IngestionError::InvalidSize {
            index,
            value: value.to_string(),
        });
    }
    Ok(value as u64)
}

fn raw_order(index: usize, price: Decimal, size: u64) -> Result<RawOrder, IngestionError> {
    RawOrder::new(price, size).map_err(|e| IngestionError::InvalidAmount {
        index,
        value: price.to_string(),
        reason: e.to_string(),
    })
}
