//! Fixed-layout snapshot record
//!
//! ```text
//! offset            size      field
//! 0                 10        market name, UTF-8, zero padded
//! 10                32        collection identifier
//! 42                8         timestamp, i64 LE
//! 50                N * 16    asks: (price u64 LE, size u64 LE)
//! 50 + N * 16       N * 16    bids
//! ```

use types::ids::{Address, MarketName};
use types::level::PriceLevel;

use crate::errors::ProgramError;

const NAME_OFFSET: usize = 0;
const IDENTIFIER_OFFSET: usize = NAME_OFFSET + MarketName::MAX_LEN;
const TIMESTAMP_OFFSET: usize = IDENTIFIER_OFFSET + Address::LEN;
const LEVELS_OFFSET: usize = TIMESTAMP_OFFSET + 8;

/// One market's bounded book as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRecord<const N: usize> {
    pub name: MarketName,
    pub identifier: Address,
    pub timestamp: i64,
    pub asks: [PriceLevel; N],
    pub bids: [PriceLevel; N],
}

impl<const N: usize> SnapshotRecord<N> {
    /// Encoded length in bytes.
    pub const SIZE: usize = LEVELS_OFFSET + 2 * N * PriceLevel::ENCODED_LEN;

    pub fn new(
        name: MarketName,
        identifier: Address,
        timestamp: i64,
        asks: [PriceLevel; N],
        bids: [PriceLevel; N],
    ) -> Self {
        Self {
            name,
            identifier,
            timestamp,
            asks,
            bids,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::SIZE);
        out.extend_from_slice(&self.name.to_fixed_bytes());
        out.extend_from_slice(self.identifier.as_bytes());
        out.extend_from_slice(&self.timestamp.to_le_bytes());
        for level in self.asks.iter().chain(self.bids.iter()) {
            out.extend_from_slice(&level.to_le_bytes());
        }
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProgramError> {
        if bytes.len() != Self::SIZE {
            return Err(ProgramError::RecordLength {
                expected: Self::SIZE,
                actual: bytes.len(),
            });
        }

        let name = MarketName::from_fixed_bytes(&fixed::<{ MarketName::MAX_LEN }>(bytes, NAME_OFFSET))?;
        let identifier = Address::new(fixed::<{ Address::LEN }>(bytes, IDENTIFIER_OFFSET));
        let timestamp = i64::from_le_bytes(fixed::<8>(bytes, TIMESTAMP_OFFSET));

        let mut asks = [PriceLevel::EMPTY; N];
        let mut bids = [PriceLevel::EMPTY; N];
        for (i, slot) in asks.iter_mut().chain(bids.iter_mut()).enumerate() {
            let offset = LEVELS_OFFSET + i * PriceLevel::ENCODED_LEN;
            *slot = PriceLevel::from_le_bytes(fixed::<{ PriceLevel::ENCODED_LEN }>(bytes, offset));
        }

        Ok(Self {
            name,
            identifier,
            timestamp,
            asks,
            bids,
        })
    }
}

/// Copy `M` bytes starting at `offset`. Callers check the total length first.
fn fixed<const M: usize>(bytes: &[u8], offset: usize) -> [u8; M] {
    let mut out = [0u8; M];
    out.copy_from_slice(&bytes[offset..offset + M]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> SnapshotRecord<8> {
        let mut asks = [PriceLevel::EMPTY; 8];
        let mut bids = [PriceLevel::EMPTY; 8];
        asks[0] = PriceLevel::new(101, 2);
        asks[1] = PriceLevel::new(102, 1);
        bids[0] = PriceLevel::new(99, 4);
        SnapshotRecord::new(
            MarketName::new("SMB-SOL").unwrap(),
            Address::new([9; 32]),
            1_700_000_000,
            asks,
            bids,
        )
    }

    #[test]
    fn test_size_constant() {
        assert_eq!(SnapshotRecord::<8>::SIZE, 10 + 32 + 8 + 8 * 32);
        assert_eq!(SnapshotRecord::<8>::SIZE, 306);
        assert_eq!(SnapshotRecord::<16>::SIZE, 10 + 32 + 8 + 16 * 32);
    }

    #[test]
    fn test_encode_layout() {
        let bytes = record().encode();
        assert_eq!(bytes.len(), SnapshotRecord::<8>::SIZE);
        assert_eq!(&bytes[..7], b"SMB-SOL");
        assert_eq!(&bytes[7..10], &[0, 0, 0]);
        assert_eq!(&bytes[10..42], &[9; 32]);
        assert_eq!(i64::from_le_bytes(bytes[42..50].try_into().unwrap()), 1_700_000_000);
        assert_eq!(u64::from_le_bytes(bytes[50..58].try_into().unwrap()), 101);
        assert_eq!(u64::from_le_bytes(bytes[58..66].try_into().unwrap()), 2);
        // first bid starts after 8 asks
        let bid_offset = 50 + 8 * 16;
        assert_eq!(u64::from_le_bytes(bytes[bid_offset..bid_offset + 8].try_into().unwrap()), 99);
    }

    #[test]
    fn test_decode_roundtrip() {
        let r = record();
        assert_eq!(SnapshotRecord::<8>::decode(&r.encode()).unwrap(), r);
    }

    #[test]
    fn test_decode_wrong_length() {
        let err = SnapshotRecord::<8>::decode(&[0u8; 10]).unwrap_err();
        assert_eq!(err, ProgramError::RecordLength { expected: 306, actual: 10 });
    }

    #[test]
    fn test_decode_empty_name_rejected() {
        let bytes = vec![0u8; SnapshotRecord::<2>::SIZE];
        assert!(matches!(
            SnapshotRecord::<2>::decode(&bytes),
            Err(ProgramError::Validation(_))
        ));
    }
}
