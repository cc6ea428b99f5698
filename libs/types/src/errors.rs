//! Error types shared across the snapshot builder and the orderbook program
//!
//! Comprehensive error taxonomy using thiserror

use thiserror::Error;

/// Fixed-point conversion errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NumericError {
    #[error("Exponent out of range: {exponent} (magnitude must be <= {max})")]
    ExponentOutOfRange { exponent: i32, max: u32 },

    #[error("Scaled value does not fit in 64 bits: {value}")]
    Overflow { value: String },

    #[error("Value is not finite: {0}")]
    NonFinite(String),

    #[error("Value is negative: {0}")]
    Negative(String),
}

/// Value validation errors raised when constructing domain types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Market name too long: {len} bytes (max {max})")]
    MarketNameTooLong { len: usize, max: usize },

    #[error("Market name must be non-empty")]
    MarketNameEmpty,

    #[error("Market name is not UTF-8: {0}")]
    MarketNameEncoding(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Numeric error: {0}")]
    Numeric(#[from] NumericError),
}
