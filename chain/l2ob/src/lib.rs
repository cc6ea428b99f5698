//! L2 Orderbook Program
//!
//! In-memory rendition of the on-chain orderbook account that stores one
//! market's bounded book, plus the fixed-layout snapshot record.
//!
//! # Modules
//! - `account`: `L2Orderbook<N>` account and its instructions
//! - `layout`: `SnapshotRecord<N>` binary encoding
//! - `events`: Program events emitted by instructions
//! - `errors`: Program error types

pub mod errors;
pub mod events;
pub mod account;
pub mod layout;

pub use account::{L2Orderbook, RealLevel};
pub use layout::SnapshotRecord;

/// Common deployment capacity (levels per side).
pub const DEFAULT_CAPACITY: usize = 8;

/// Account with the common deployment capacity.
pub type DefaultOrderbook = L2Orderbook<DEFAULT_CAPACITY>;
