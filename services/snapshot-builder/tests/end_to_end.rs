//! End-to-end snapshot tests
//!
//! Drives the full build against in-memory sources and publishes into the
//! orderbook account program:
//! - Build determinism (same inputs, same checksum)
//! - Publish rescaling into stored exponents
//! - Configured exponents checked against the store
//! - Store capacity smaller than the snapshot
//! - Unchanged-side skipping across consecutive publishes
//! - Fixed-layout record of an assembled snapshot

use async_trait::async_trait;
use l2ob::{DefaultOrderbook, SnapshotRecord, DEFAULT_CAPACITY};
use rust_decimal::Decimal;
use snapshot_builder::aggregator::Quantization;
use snapshot_builder::assembler::{FixedClock, OrderbookSnapshot};
use snapshot_builder::bounds::to_array;
use snapshot_builder::config::{QuoteMode, SnapshotConfig};
use snapshot_builder::ingestion::{parse_bid_events_json, parse_listings_json, BidEventRecord, ListingRecord};
use snapshot_builder::pipeline::{
    BidEventSource, ExchangeRateSource, ListingSource, PipelineError, SnapshotPipeline, SourceError,
};
use snapshot_builder::bounds::OverflowPolicy;
use snapshot_builder::publisher::{PublishError, Publisher};
use types::ids::Address;
use types::level::PriceLevel;
use types::numeric::{Exponents, FixedPoint};
use types::store::InitializeParams;

const AUTHORITY: Address = Address::new([0x11; 32]);

const LISTINGS: &str = r#"[
    {"mint":"m1","activeListings":[{"amount":10000000000,"marketplace":"ME"}]},
    {"mint":"m2","activeListings":[{"amount":10200000000}]},
    {"mint":"m3","activeListings":[{"amount":11000000000}]},
    {"price":10.0,"tokenSize":2,"tokenMint":"m4"}
]"#;

const BIDS: &str = r#"[
    {"type":"NFT_BID","amount":9000000000,"identity":"alice","timestamp":10},
    {"type":"NFT_BID","amount":8000000000,"identity":"bob","timestamp":11},
    {"type":"NFT_BID","amount":8500000000,"identity":"carol","timestamp":12},
    {"type":"NFT_BID_CANCELLED","identity":"bob","timestamp":13}
]"#;

struct JsonListings(&'static str);
struct JsonBids(&'static str);
struct FixedRate(f64);

#[async_trait]
impl ListingSource for JsonListings {
    async fn fetch_listings(&self, _identifier: &str) -> Result<Vec<ListingRecord>, SourceError> {
        parse_listings_json(self.0).map_err(|e| SourceError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl BidEventSource for JsonBids {
    async fn fetch_bid_events(&self, _identifier: &str) -> Result<Vec<BidEventRecord>, SourceError> {
        parse_bid_events_json(self.0).map_err(|e| SourceError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl ExchangeRateSource for FixedRate {
    async fn fetch_rate(&self) -> Result<f64, SourceError> {
        Ok(self.0)
    }
}

fn tenths_config() -> SnapshotConfig {
    SnapshotConfig {
        authority: AUTHORITY,
        quantization: Quantization {
            exponent: -1,
            round: true,
        },
        ..Default::default()
    }
}

fn pipeline(
    config: SnapshotConfig,
    bids: &'static str,
) -> SnapshotPipeline<JsonListings, JsonBids, FixedRate, FixedClock> {
    SnapshotPipeline::with_clock(
        config,
        JsonListings(LISTINGS),
        JsonBids(bids),
        FixedRate(150.0),
        FixedClock(1_700_000_000),
    )
    .unwrap()
}

fn store(config: &SnapshotConfig) -> DefaultOrderbook {
    let mut ob = DefaultOrderbook::new();
    ob.initialize(
        InitializeParams {
            admin: config.authority,
            market_name: config.market_name().unwrap().as_str().to_string(),
            base_currency: config.collection.clone(),
            quote_currency: config.quote_symbol().to_string(),
            min_size_increment: FixedPoint::new(1, 0),
            min_price_increment: FixedPoint::new(1, -3),
        },
        1_699_999_000,
    )
    .unwrap();
    ob
}

async fn build(config: SnapshotConfig, bids: &'static str) -> OrderbookSnapshot {
    pipeline(config, bids).build().await.unwrap()
}

// ═══════════════════════════════════════════════════════════════════
// Build Tests
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_native_build_levels() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let snap = build(tenths_config(), BIDS).await;

    // 10.0 SOL listed once nested and twice flat
    assert_eq!(snap.asks[0], PriceLevel::new(100, 3));
    assert_eq!(snap.asks[1], PriceLevel::new(102, 1));
    assert_eq!(snap.asks[2], PriceLevel::new(110, 1));
    assert!(snap.asks[3..].iter().all(PriceLevel::is_sentinel));

    // bob's bid cancelled, best bid first
    assert_eq!(snap.bids[0], PriceLevel::new(90, 1));
    assert_eq!(snap.bids[1], PriceLevel::new(85, 1));
    assert!(snap.bids[2..].iter().all(PriceLevel::is_sentinel));

    assert_eq!(snap.capacity(), DEFAULT_CAPACITY);
    assert_eq!(snap.truncated_asks, 0);
    assert_eq!(snap.name.as_str(), "SMB-SOL");
    assert_eq!(snap.identifier, tenths_config().market_address());
}

#[tokio::test]
async fn test_builds_are_deterministic() {
    let first = build(tenths_config(), BIDS).await;
    let second = build(tenths_config(), BIDS).await;

    assert_ne!(first.build_id, second.build_id);
    assert_eq!(first.checksum(), second.checksum());
    assert_eq!(first.asks, second.asks);
    assert_eq!(first.bids, second.bids);
}

#[tokio::test]
async fn test_stable_build_converts_and_truncates() {
    let config = SnapshotConfig {
        quote: QuoteMode::Stable,
        capacity: 2,
        ..tenths_config()
    };
    let snap = build(config, BIDS).await;

    assert_eq!(snap.name.as_str(), "SMB-USDC");
    // 10 SOL at 150 USDC/SOL, in tenths
    assert_eq!(snap.asks, vec![PriceLevel::new(15_000, 3), PriceLevel::new(15_300, 1)]);
    assert_eq!(snap.truncated_asks, 1);
    assert_eq!(snap.bids, vec![PriceLevel::new(13_500, 1), PriceLevel::new(12_750, 1)]);
}

#[tokio::test]
async fn test_unmatched_cancel_is_ignored() {
    const STRAY: &str = r#"[
        {"type":"NFT_BID_CANCELLED","identity":"nobody","timestamp":1},
        {"type":"NFT_BID","amount":9000000000,"identity":"alice","timestamp":2}
    ]"#;
    let snap = build(tenths_config(), STRAY).await;
    assert_eq!(snap.bids[0], PriceLevel::new(90, 1));
}

#[tokio::test]
async fn test_unavailable_source_fails_build() {
    struct Down;

    #[async_trait]
    impl ListingSource for Down {
        async fn fetch_listings(&self, identifier: &str) -> Result<Vec<ListingRecord>, SourceError> {
            Err(SourceError::Unavailable(format!("listings for {identifier}")))
        }
    }

    let pipeline = SnapshotPipeline::with_clock(
        tenths_config(),
        Down,
        JsonBids(BIDS),
        FixedRate(1.0),
        FixedClock(0),
    )
    .unwrap();
    assert!(matches!(
        pipeline.build().await,
        Err(PipelineError::Source(SourceError::Unavailable(_)))
    ));
}

// ═══════════════════════════════════════════════════════════════════
// Publish Tests
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_publish_rescales_into_store_exponents() {
    let config = tenths_config();
    let snap = build(config.clone(), BIDS).await;
    let mut publisher = Publisher::from_config(store(&config), &config);

    let report = publisher.publish(&snap, &config.quantization).unwrap();
    assert_eq!(report.exponents, Exponents::new(-3, 0));
    assert!(report.asks_updated && report.bids_updated);

    let ob = publisher.store();
    assert_eq!(ob.asks()[0], PriceLevel::new(10_000, 3));
    assert_eq!(ob.bids()[1], PriceLevel::new(8_500, 1));
    assert_eq!(ob.updated_at(), 1_700_000_000);

    let real = ob.real_asks().unwrap();
    assert_eq!(real.len(), 3);
    assert_eq!(real[0].price, Decimal::new(10, 0));
    assert_eq!(real[1].price, Decimal::new(102, 1));
}

#[tokio::test]
async fn test_republish_skips_unchanged_sides() {
    const MORE_BIDS: &str = r#"[
        {"type":"NFT_BID","amount":9000000000,"identity":"alice","timestamp":10},
        {"type":"NFT_BID","amount":9500000000,"identity":"dave","timestamp":14}
    ]"#;

    let config = tenths_config();
    let mut publisher = Publisher::from_config(store(&config), &config);

    let first = build(config.clone(), BIDS).await;
    publisher.publish(&first, &config.quantization).unwrap();
    let events_after_first = publisher.store().events().len();

    let again = publisher.publish(&first, &config.quantization).unwrap();
    assert!(!again.asks_updated && !again.bids_updated);
    assert_eq!(publisher.store().events().len(), events_after_first);

    let second = build(config.clone(), MORE_BIDS).await;
    let report = publisher.publish(&second, &config.quantization).unwrap();
    assert!(!report.asks_updated);
    assert!(report.bids_updated);
    assert_eq!(publisher.store().bids()[0], PriceLevel::new(9_500, 1));
}

#[tokio::test]
async fn test_publish_with_wrong_authority_fails() {
    let config = tenths_config();
    let snap = build(config.clone(), BIDS).await;
    let mut publisher = Publisher::new(store(&config), Address::new([0x22; 32]));

    assert!(publisher.publish(&snap, &config.quantization).is_err());
    assert!(publisher.store().asks().iter().all(PriceLevel::is_sentinel));
}

#[tokio::test]
async fn test_configured_exponents_must_match_store() {
    let config = SnapshotConfig {
        store_exponents: Some(Exponents::new(-2, 0)),
        ..tenths_config()
    };
    let snap = build(config.clone(), BIDS).await;
    let mut publisher = Publisher::from_config(store(&config), &config);

    assert_eq!(
        publisher.publish(&snap, &config.quantization),
        Err(PublishError::ExponentMismatch {
            field: "price",
            configured: -2,
            stored: -3,
        })
    );
    assert!(publisher.store().asks().iter().all(PriceLevel::is_sentinel));

    // A partial setting that agrees with the store publishes normally
    let config = SnapshotConfig {
        store_exponents: Some(Exponents::new(-3, 0)),
        ..tenths_config()
    };
    let mut publisher = Publisher::from_config(store(&config), &config);
    let report = publisher.publish(&snap, &config.quantization).unwrap();
    assert_eq!(report.exponents, Exponents::new(-3, 0));
    assert_eq!(publisher.store().asks()[0], PriceLevel::new(10_000, 3));
    assert_eq!(publisher.store().real_asks().unwrap()[0].price, Decimal::new(10, 0));
}

#[tokio::test]
async fn test_wide_snapshot_publishes_into_narrow_store() {
    let config = SnapshotConfig {
        capacity: 8,
        overflow: OverflowPolicy::Reject,
        ..tenths_config()
    };
    let snap = build(config.clone(), BIDS).await;
    assert_eq!(snap.capacity(), 8);

    let mut ob = l2ob::L2Orderbook::<4>::new();
    ob.initialize(
        InitializeParams {
            admin: config.authority,
            market_name: "SMB-SOL".to_string(),
            base_currency: config.collection.clone(),
            quote_currency: config.quote_symbol().to_string(),
            min_size_increment: FixedPoint::new(1, 0),
            min_price_increment: FixedPoint::new(1, -3),
        },
        1_699_999_000,
    )
    .unwrap();
    let mut publisher = Publisher::from_config(ob, &config);

    publisher.publish(&snap, &config.quantization).unwrap();
    let ob = publisher.store();
    assert_eq!(ob.asks()[2], PriceLevel::new(11_000, 1));
    assert_eq!(ob.asks()[3], PriceLevel::EMPTY);
    assert_eq!(ob.bids()[0], PriceLevel::new(9_000, 1));
}

// ═══════════════════════════════════════════════════════════════════
// Record Layout
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_snapshot_fits_record() {
    let snap = build(tenths_config(), BIDS).await;
    let record = SnapshotRecord::<DEFAULT_CAPACITY>::new(
        snap.name.clone(),
        snap.identifier,
        snap.updated_at,
        to_array(&snap.asks),
        to_array(&snap.bids),
    );

    let bytes = record.encode();
    assert_eq!(bytes.len(), SnapshotRecord::<DEFAULT_CAPACITY>::SIZE);
    let decoded = SnapshotRecord::<DEFAULT_CAPACITY>::decode(&bytes).unwrap();
    assert_eq!(decoded.asks.to_vec(), snap.asks);
    assert_eq!(decoded.bids.to_vec(), snap.bids);
    assert_eq!(decoded.name, snap.name);
}
