//! Fixed-capacity adaptation
//!
//! Boundary between variable-length aggregation and fixed-layout storage:
//! every side leaves here with exactly `capacity` levels. Short sides are
//! padded with the `(0, 0)` sentinel, long sides are truncated (keeping the
//! leading entries, no re-sorting) or rejected, depending on policy.

use serde::{Deserialize, Serialize};
use tracing::warn;
use types::level::{PriceLevel, Side};

/// Errors raised by the bounds adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoundsError {
    #[error("capacity must be positive")]
    ZeroCapacity,

    #[error("{side:?} side has {len} levels, capacity is {capacity}")]
    CapacityExceeded {
        side: Side,
        len: usize,
        capacity: usize,
    },
}

/// What happens when a side has more levels than slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Keep the first `capacity` levels and log the dropped count
    #[default]
    Truncate,
    /// Fail the build
    Reject,
}

/// Pad or truncate `levels` to exactly `capacity` entries.
pub fn normalize(mut levels: Vec<PriceLevel>, capacity: usize) -> Vec<PriceLevel> {
    levels.resize(capacity, PriceLevel::EMPTY);
    levels
}

/// [`normalize`] into a compile-time capacity.
pub fn to_array<const N: usize>(levels: &[PriceLevel]) -> [PriceLevel; N] {
    let mut out = [PriceLevel::EMPTY; N];
    for (slot, level) in out.iter_mut().zip(levels) {
        *slot = *level;
    }
    out
}

/// One side after adaptation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundedLevels {
    /// Exactly `capacity` levels
    pub levels: Vec<PriceLevel>,
    /// Levels cut off by truncation
    pub dropped: usize,
}

/// Applies a capacity and overflow policy to level sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundsAdapter {
    capacity: usize,
    overflow: OverflowPolicy,
}

impl BoundsAdapter {
    pub fn new(capacity: usize, overflow: OverflowPolicy) -> Result<Self, BoundsError> {
        if capacity == 0 {
            return Err(BoundsError::ZeroCapacity);
        }
        Ok(Self { capacity, overflow })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn overflow(&self) -> OverflowPolicy {
        self.overflow
    }

    /// Check `len` incoming levels against capacity.
    ///
    /// Returns how many levels will be dropped.
    pub fn admit(&self, len: usize, side: Side) -> Result<usize, BoundsError> {
        if len <= self.capacity {
            return Ok(0);
        }
        match self.overflow {
            OverflowPolicy::Reject => Err(BoundsError::CapacityExceeded {
                side,
                len,
                capacity: self.capacity,
            }),
            OverflowPolicy::Truncate => {
                let dropped = len - self.capacity;
                warn!(
                    side = side.label(),
                    len,
                    capacity = self.capacity,
                    dropped,
                    "Book depth truncated to capacity"
                );
                Ok(dropped)
            }
        }
    }

    /// Normalize one side to capacity under the overflow policy.
    pub fn adapt(&self, levels: Vec<PriceLevel>, side: Side) -> Result<BoundedLevels, BoundsError> {
        let dropped = self.admit(levels.len(), side)?;
        Ok(BoundedLevels {
            levels: normalize(levels, self.capacity),
            dropped,
        })
    }
}
