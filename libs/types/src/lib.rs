//! Types library for the L2 orderbook snapshot builder
//!
//! Core value types shared by the snapshot builder service and the
//! orderbook program, with deterministic fixed-point arithmetic.
//!
//! # Modules
//! - `ids`: Identifiers (BuildId, Address, MarketName)
//! - `numeric`: Fixed-point codec (FixedPoint, Exponents, to_scaled/from_scaled)
//! - `level`: Book side and price level types
//! - `store`: Persistence collaborator interface (OrderbookStore)
//! - `errors`: Error taxonomy

// Public modules
pub mod ids;
pub mod numeric;
pub mod level;
pub mod store;
pub mod errors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::level::*;
    pub use crate::store::*;
    pub use crate::errors::*;
}
