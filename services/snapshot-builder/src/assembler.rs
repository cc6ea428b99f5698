//! Snapshot assembly
//!
//! Combines aggregated ask and bid levels with market metadata into an
//! `OrderbookSnapshot` holding exactly `capacity` levels per side.
//! Checksums exclude timestamps so an unchanged book hashes the same
//! across builds.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;
use types::ids::{Address, BuildId, MarketName};
use types::level::{PriceLevel, Side};

use crate::aggregator::{select_depth, DepthPolicy};
use crate::bounds::{normalize, BoundsAdapter, BoundsError, OverflowPolicy};

/// Errors raised while assembling a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssemblyError {
    #[error("bounds error: {0}")]
    Bounds(#[from] BoundsError),
}

/// Source of the snapshot timestamp (unix seconds).
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0
    }
}

/// A bounded L2 snapshot of one market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderbookSnapshot {
    pub build_id: BuildId,
    pub name: MarketName,
    pub identifier: Address,
    pub created_at: i64,
    pub updated_at: i64,
    /// Exactly `capacity` levels, sentinel padded
    pub asks: Vec<PriceLevel>,
    /// Exactly `capacity` levels, sentinel padded
    pub bids: Vec<PriceLevel>,
    /// Ask levels dropped on overflow
    pub truncated_asks: usize,
    /// Bid levels dropped on overflow
    pub truncated_bids: usize,
}

impl OrderbookSnapshot {
    pub fn capacity(&self) -> usize {
        self.asks.len()
    }

    pub fn levels(&self, side: Side) -> &[PriceLevel] {
        match side {
            Side::ASK => &self.asks,
            Side::BID => &self.bids,
        }
    }

    /// Non-sentinel levels of one side.
    pub fn populated(&self, side: Side) -> impl Iterator<Item = &PriceLevel> {
        self.levels(side).iter().filter(|l| !l.is_sentinel())
    }

    /// SHA-256 over name, identifier and both sides (hex).
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.name.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(self.identifier.as_bytes());
        hasher.update(b"|");
        hash_levels(&mut hasher, &self.asks);
        hasher.update(b"---");
        hash_levels(&mut hasher, &self.bids);
        format!("{:x}", hasher.finalize())
    }

    /// SHA-256 over one side's levels (hex).
    pub fn side_checksum(&self, side: Side) -> String {
        levels_checksum(self.levels(side))
    }
}

/// SHA-256 over a level sequence (hex).
pub fn levels_checksum(levels: &[PriceLevel]) -> String {
    let mut hasher = Sha256::new();
    hash_levels(&mut hasher, levels);
    format!("{:x}", hasher.finalize())
}

fn hash_levels(hasher: &mut Sha256, levels: &[PriceLevel]) {
    for level in levels {
        hasher.update(level.to_le_bytes());
    }
}

/// Builds snapshots for one market.
#[derive(Debug, Clone)]
pub struct OrderbookAssembler<C: Clock = SystemClock> {
    name: MarketName,
    identifier: Address,
    depth_policy: DepthPolicy,
    adapter: BoundsAdapter,
    clock: C,
}

impl OrderbookAssembler<SystemClock> {
    pub fn new(
        name: MarketName,
        identifier: Address,
        capacity: usize,
        depth_policy: DepthPolicy,
        overflow: OverflowPolicy,
    ) -> Result<Self, AssemblyError> {
        Self::with_clock(name, identifier, capacity, depth_policy, overflow, SystemClock)
    }
}

impl<C: Clock> OrderbookAssembler<C> {
    pub fn with_clock(
        name: MarketName,
        identifier: Address,
        capacity: usize,
        depth_policy: DepthPolicy,
        overflow: OverflowPolicy,
        clock: C,
    ) -> Result<Self, AssemblyError> {
        Ok(Self {
            name,
            identifier,
            depth_policy,
            adapter: BoundsAdapter::new(capacity, overflow)?,
            clock,
        })
    }

    pub fn capacity(&self) -> usize {
        self.adapter.capacity()
    }

    pub fn name(&self) -> &MarketName {
        &self.name
    }

    /// Assemble under a fresh build id.
    pub fn assemble(
        &self,
        asks: Vec<PriceLevel>,
        bids: Vec<PriceLevel>,
    ) -> Result<OrderbookSnapshot, AssemblyError> {
        self.assemble_for(BuildId::new(), asks, bids)
    }

    /// Select depth on both sides, bound them to capacity and stamp metadata.
    pub fn assemble_for(
        &self,
        build_id: BuildId,
        asks: Vec<PriceLevel>,
        bids: Vec<PriceLevel>,
    ) -> Result<OrderbookSnapshot, AssemblyError> {
        let (asks, truncated_asks) = self.bound(asks, Side::ASK)?;
        let (bids, truncated_bids) = self.bound(bids, Side::BID)?;
        let now = self.clock.now();

        let snapshot = OrderbookSnapshot {
            build_id,
            name: self.name.clone(),
            identifier: self.identifier,
            created_at: now,
            updated_at: now,
            asks,
            bids,
            truncated_asks,
            truncated_bids,
        };

        info!(
            build_id = %build_id,
            market = %self.name,
            capacity = self.capacity(),
            asks = snapshot.populated(Side::ASK).count(),
            bids = snapshot.populated(Side::BID).count(),
            truncated_asks,
            truncated_bids,
            "Snapshot assembled"
        );
        Ok(snapshot)
    }

    fn bound(&self, levels: Vec<PriceLevel>, side: Side) -> Result<(Vec<PriceLevel>, usize), BoundsError> {
        let capacity = self.adapter.capacity();
        let dropped = self.adapter.admit(levels.len(), side)?;
        let selected = select_depth(&levels, capacity, side, self.depth_policy);
        Ok((normalize(selected, capacity), dropped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assembler(capacity: usize, overflow: OverflowPolicy) -> OrderbookAssembler<FixedClock> {
        OrderbookAssembler::with_clock(
            MarketName::new("SMB-SOL").unwrap(),
            Address::digest("SMBH3wF6baUj6JWtzYvqcKuj2XCKWDqQxzspY12xPND"),
            capacity,
            DepthPolicy::NearestToMarket,
            overflow,
            FixedClock(1_700_000_000),
        )
        .unwrap()
    }

    fn levels(pairs: &[(u64, u64)]) -> Vec<PriceLevel> {
        pairs.iter().map(|&p| PriceLevel::from(p)).collect()
    }

    #[test]
    fn test_assemble_pads_both_sides() {
        let snap = assembler(4, OverflowPolicy::Truncate)
            .assemble(levels(&[(12, 1), (11, 2)]), levels(&[(9, 1)]))
            .unwrap();

        assert_eq!(snap.asks, levels(&[(11, 2), (12, 1), (0, 0), (0, 0)]));
        assert_eq!(snap.bids, levels(&[(9, 1), (0, 0), (0, 0), (0, 0)]));
        assert_eq!(snap.capacity(), 4);
        assert_eq!(snap.created_at, 1_700_000_000);
        assert_eq!(snap.updated_at, 1_700_000_000);
    }

    #[test]
    fn test_assemble_truncates_and_counts() {
        let snap = assembler(2, OverflowPolicy::Truncate)
            .assemble(
                levels(&[(14, 1), (13, 1), (12, 1), (11, 1)]),
                levels(&[(9, 1), (8, 1), (7, 1)]),
            )
            .unwrap();

        assert_eq!(snap.asks, levels(&[(11, 1), (12, 1)]));
        assert_eq!(snap.bids, levels(&[(9, 1), (8, 1)]));
        assert_eq!(snap.truncated_asks, 2);
        assert_eq!(snap.truncated_bids, 1);
    }

    #[test]
    fn test_assemble_reject_overflow() {
        let err = assembler(1, OverflowPolicy::Reject)
            .assemble(levels(&[(2, 1), (1, 1)]), vec![])
            .unwrap_err();
        assert!(matches!(
            err,
            AssemblyError::Bounds(BoundsError::CapacityExceeded { side: Side::ASK, .. })
        ));
    }

    #[test]
    fn test_legacy_tail_policy() {
        let asm = OrderbookAssembler::with_clock(
            MarketName::new("SMB-SOL").unwrap(),
            Address::ZERO,
            2,
            DepthPolicy::LegacyTail,
            OverflowPolicy::Truncate,
            FixedClock(0),
        )
        .unwrap();
        let snap = asm
            .assemble(levels(&[(3, 1), (2, 1), (1, 1)]), levels(&[(3, 1), (2, 1), (1, 1)]))
            .unwrap();
        assert_eq!(snap.asks, levels(&[(2, 1), (1, 1)]));
        assert_eq!(snap.bids, levels(&[(2, 1), (1, 1)]));
    }

    #[test]
    fn test_checksum_ignores_timestamps() {
        let asm = assembler(2, OverflowPolicy::Truncate);
        let a = asm.assemble(levels(&[(5, 1)]), levels(&[(4, 1)])).unwrap();
        let mut b = a.clone();
        b.updated_at += 60;
        b.build_id = BuildId::new();
        assert_eq!(a.checksum(), b.checksum());

        b.bids[0].size = 2;
        assert_ne!(a.checksum(), b.checksum());
        assert_eq!(a.side_checksum(Side::ASK), b.side_checksum(Side::ASK));
        assert_ne!(a.side_checksum(Side::BID), b.side_checksum(Side::BID));
    }

    #[test]
    fn test_snapshot_serialization() {
        let snap = assembler(2, OverflowPolicy::Truncate)
            .assemble(levels(&[(5, 1)]), vec![])
            .unwrap();
        let json = serde_json::to_string(&snap).unwrap();
        let back: OrderbookSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snap, back);
    }

    #[test]
    fn test_system_clock_is_recent() {
        // 2023-11-14
        assert!(SystemClock.now() > 1_700_000_000);
    }
}
