//! L2 Orderbook Snapshot Builder
//!
//! Turns marketplace listings and a bid event log for one token collection
//! into a bounded L2 snapshot:
//! - Ingestion of source-shaped listing and bid records
//! - Price level aggregation with currency conversion and quantization
//! - Bid log reconciliation in strict ordering-key order
//! - Fixed-capacity adaptation (sentinel padding, explicit truncation)
//! - Snapshot assembly and publishing into an orderbook store
//!
//! # Architecture
//!
//! ```text
//!  ListingSource      BidEventSource     ExchangeRateSource
//!        │                  │                    │
//!    ┌───▼───┐          ┌───▼───┐                │
//!    │Ingest │          │Ingest │                │
//!    └───┬───┘          └───┬───┘                │
//!        │            ┌─────▼─────┐              │
//!        │            │ Reconcile │              │
//!        │            └─────┬─────┘              │
//!   ┌────▼──────────────────▼────┐               │
//!   │         Aggregate          │◄──────────────┘
//!   └────────────┬───────────────┘
//!          ┌─────▼─────┐
//!          │  Assemble │  ← depth selection + bounds
//!          └─────┬─────┘
//!          ┌─────▼─────┐
//!          │  Publish  │  → OrderbookStore
//!          └───────────┘
//! ```

pub mod config;
pub mod events;
pub mod ingestion;
pub mod aggregator;
pub mod reconciler;
pub mod bounds;
pub mod assembler;
pub mod pipeline;
pub mod publisher;

