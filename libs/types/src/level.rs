//! Price level and book side types
//!
//! A `PriceLevel` is the aggregated resting size at one quantized price.

use serde::{Deserialize, Serialize};

/// Book side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Resting buy interest (bids)
    BID,
    /// Resting sell interest (asks / listings)
    ASK,
}

impl Side {
    pub fn label(&self) -> &'static str {
        match self {
            Side::BID => "bids",
            Side::ASK => "asks",
        }
    }
}

/// Aggregated size at one price, both in integer units.
///
/// `(0, 0)` is the padding sentinel used to fill fixed-capacity arrays.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: u64,
    pub size: u64,
}

impl PriceLevel {
    /// Padding sentinel
    pub const EMPTY: Self = Self { price: 0, size: 0 };

    /// Encoded width of one level: two 8-byte integers.
    pub const ENCODED_LEN: usize = 16;

    pub const fn new(price: u64, size: u64) -> Self {
        Self { price, size }
    }

    /// Whether this is the `(0, 0)` padding sentinel.
    pub fn is_sentinel(&self) -> bool {
        *self == Self::EMPTY
    }

    /// Little-endian `price ‖ size`.
    pub fn to_le_bytes(&self) -> [u8; Self::ENCODED_LEN] {
        let mut out = [0u8; Self::ENCODED_LEN];
        out[..8].copy_from_slice(&self.price.to_le_bytes());
        out[8..].copy_from_slice(&self.size.to_le_bytes());
        out
    }

    pub fn from_le_bytes(bytes: [u8; Self::ENCODED_LEN]) -> Self {
        let mut price = [0u8; 8];
        let mut size = [0u8; 8];
        price.copy_from_slice(&bytes[..8]);
        size.copy_from_slice(&bytes[8..]);
        Self {
            price: u64::from_le_bytes(price),
            size: u64::from_le_bytes(size),
        }
    }
}

impl From<(u64, u64)> for PriceLevel {
    fn from((price, size): (u64, u64)) -> Self {
        Self { price, size }
    }
}
