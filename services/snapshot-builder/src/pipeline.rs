//! Snapshot build pipeline
//!
//! The only async code in the crate. Fetches listings, the bid log and (in
//! stable-quote mode) the exchange rate concurrently, then runs the pure
//! stages: ingestion, aggregation, reconciliation, assembly.
//!
//! Each build gets its own `BuildId` and tracing span. Builds share no
//! mutable state.

use async_trait::async_trait;
use tracing::{info, info_span, Instrument};
use types::errors::ValidationError;
use types::ids::BuildId;

use crate::aggregator::{AggregationError, ExchangeRate, PriceLevelAggregator};
use crate::assembler::{AssemblyError, Clock, OrderbookAssembler, OrderbookSnapshot, SystemClock};
use crate::config::{ConfigError, QuoteMode, SnapshotConfig};
use crate::ingestion::{
    ingest_bid_events, ingest_listings, BidEventRecord, IngestionError, ListingRecord,
};
use crate::reconciler::BidReconciler;

/// Errors reported by collaborators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error("source returned malformed data: {0}")]
    Malformed(String),
}

/// Errors that can fail a build.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("invalid exchange rate: {0}")]
    Rate(#[from] ValidationError),

    #[error("ingestion error: {0}")]
    Ingestion(#[from] IngestionError),

    #[error("aggregation error: {0}")]
    Aggregation(#[from] AggregationError),

    #[error("assembly error: {0}")]
    Assembly(#[from] AssemblyError),
}

/// Supplies active listings for a collection.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch_listings(&self, identifier: &str) -> Result<Vec<ListingRecord>, SourceError>;
}

/// Supplies the bid log for a collection, in arrival order.
#[async_trait]
pub trait BidEventSource: Send + Sync {
    async fn fetch_bid_events(&self, identifier: &str) -> Result<Vec<BidEventRecord>, SourceError>;
}

/// Supplies the native-to-stable exchange rate.
#[async_trait]
pub trait ExchangeRateSource: Send + Sync {
    async fn fetch_rate(&self) -> Result<f64, SourceError>;
}

/// Builds snapshots for one market from its collaborators.
pub struct SnapshotPipeline<L, B, R, C: Clock = SystemClock> {
    config: SnapshotConfig,
    listings: L,
    bids: B,
    rates: R,
    reconciler: BidReconciler,
    assembler: OrderbookAssembler<C>,
}

impl<L, B, R> SnapshotPipeline<L, B, R, SystemClock>
where
    L: ListingSource,
    B: BidEventSource,
    R: ExchangeRateSource,
{
    pub fn new(config: SnapshotConfig, listings: L, bids: B, rates: R) -> Result<Self, PipelineError> {
        Self::with_clock(config, listings, bids, rates, SystemClock)
    }
}

impl<L, B, R, C> SnapshotPipeline<L, B, R, C>
where
    L: ListingSource,
    B: BidEventSource,
    R: ExchangeRateSource,
    C: Clock,
{
    pub fn with_clock(
        config: SnapshotConfig,
        listings: L,
        bids: B,
        rates: R,
        clock: C,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let assembler = OrderbookAssembler::with_clock(
            config.market_name()?,
            config.market_address(),
            config.capacity,
            config.depth_policy,
            config.overflow,
            clock,
        )?;

        info!(
            market = %assembler.name(),
            capacity = config.capacity,
            quote = config.quote_symbol(),
            "SnapshotPipeline initialized"
        );

        Ok(Self {
            config,
            listings,
            bids,
            rates,
            reconciler: BidReconciler::new(),
            assembler,
        })
    }

    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    /// Run one build end to end.
    pub async fn build(&self) -> Result<OrderbookSnapshot, PipelineError> {
        let build_id = BuildId::new();
        let span = info_span!("snapshot_build", build_id = %build_id, market = %self.assembler.name());
        self.build_inner(build_id).instrument(span).await
    }

    async fn build_inner(&self, build_id: BuildId) -> Result<OrderbookSnapshot, PipelineError> {
        let identifier = self.config.identifier.as_str();
        let rate = async {
            match self.config.quote {
                QuoteMode::Native => Ok(None),
                QuoteMode::Stable => self.rates.fetch_rate().await.map(Some),
            }
        };

        let (listing_records, bid_records, raw_rate) = tokio::try_join!(
            self.listings.fetch_listings(identifier),
            self.bids.fetch_bid_events(identifier),
            rate,
        )?;
        info!(
            listings = listing_records.len(),
            bid_events = bid_records.len(),
            rate = ?raw_rate,
            "Inputs fetched"
        );

        let rate = raw_rate.map(ExchangeRate::from_f64).transpose()?;
        let aggregator = PriceLevelAggregator::new(self.config.quantization, rate);

        let orders = ingest_listings(&listing_records, self.config.base_units_per_native)?;
        let events = ingest_bid_events(&bid_records, self.config.base_units_per_native)?;

        let asks = aggregator.aggregate(&orders)?;
        let bids = self.reconciler.reconcile_levels(&events, &aggregator)?;

        Ok(self.assembler.assemble_for(build_id, asks, bids)?)
    }
}
