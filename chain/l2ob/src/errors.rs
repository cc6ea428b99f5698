//! Program error types

use thiserror::Error;
use types::errors::{NumericError, ValidationError};
use types::level::Side;

/// Errors returned by orderbook program instructions and record decoding
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgramError {
    #[error("The market must be non-empty.")]
    MarketEmpty,

    #[error("The base currency must be non-empty.")]
    BaseCurrencyEmpty,

    #[error("The quote currency must be non-empty.")]
    QuoteCurrencyEmpty,

    #[error("{field} too long: {len} bytes (max {max})")]
    NameTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("Minimum size increment must be positive: {0}")]
    InvalidSizeIncrement(String),

    #[error("Minimum price increment must be positive: {0}")]
    InvalidPriceIncrement(String),

    #[error("Orderbook already initialized")]
    AlreadyInitialized,

    #[error("Orderbook not initialized")]
    NotInitialized,

    #[error("Orderbook is deprecated")]
    Deprecated,

    #[error("Unauthorized: caller is not the orderbook authority")]
    Unauthorized,

    #[error("Stale timestamp {now}: orderbook last updated at {last}")]
    StaleTimestamp { now: i64, last: i64 },

    #[error("{side:?} update has {actual} levels, expected {expected}")]
    LevelCountMismatch {
        side: Side,
        expected: usize,
        actual: usize,
    },

    #[error("Record length {actual}, expected {expected}")]
    RecordLength { expected: usize, actual: usize },

    #[error("Numeric error: {0}")]
    Numeric(#[from] NumericError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}
