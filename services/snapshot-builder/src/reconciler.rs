//! Bid log reconciliation
//!
//! Reduces an append-only log of bid placements and cancellations to the
//! set of bids still resting.
//!
//! - Events are processed strictly in `OrderingKey` order (stable sort, so
//!   equal keys keep arrival order)
//! - A cancellation only matches placements that precede it
//! - Among earlier live placements for one identity, the oldest is removed
//! - Cancelling an unknown identity is a no-op

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;
use types::level::PriceLevel;

use crate::aggregator::{AggregationError, PriceLevelAggregator};
use crate::events::{BidEvent, LiveBid, RawOrder};

/// Counters for one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReconcileStats {
    pub placed: usize,
    pub cancelled: usize,
    /// Cancellations with no earlier live placement for their identity
    pub unmatched_cancels: usize,
}

/// Resolves a bid log into live bids.
#[derive(Debug, Clone, Copy, Default)]
pub struct BidReconciler;

impl BidReconciler {
    pub fn new() -> Self {
        Self
    }

    /// Live bids after applying every event, in log order.
    pub fn reconcile(&self, events: &[BidEvent]) -> Vec<LiveBid> {
        self.reconcile_with_stats(events).0
    }

    pub fn reconcile_with_stats(&self, events: &[BidEvent]) -> (Vec<LiveBid>, ReconcileStats) {
        let mut ordered: Vec<&BidEvent> = events.iter().collect();
        ordered.sort_by_key(|e| e.key());

        let mut slots: Vec<Option<LiveBid>> = Vec::with_capacity(ordered.len());
        let mut by_identity: HashMap<&str, VecDeque<usize>> = HashMap::new();
        let mut stats = ReconcileStats::default();

        for event in ordered {
            match event {
                BidEvent::Placed {
                    key,
                    identity,
                    price,
                    size,
                } => {
                    by_identity
                        .entry(identity.as_str())
                        .or_default()
                        .push_back(slots.len());
                    slots.push(Some(LiveBid {
                        key: *key,
                        identity: identity.clone(),
                        price: *price,
                        size: *size,
                    }));
                    stats.placed += 1;
                }
                BidEvent::Cancelled { key, identity } => {
                    let matched = by_identity
                        .get_mut(identity.as_str())
                        .and_then(|queue| queue.pop_front());
                    match matched {
                        Some(slot) => {
                            slots[slot] = None;
                            stats.cancelled += 1;
                        }
                        None => {
                            stats.unmatched_cancels += 1;
                            debug!(
                                identity = identity.as_str(),
                                timestamp = key.timestamp,
                                sequence = key.sequence,
                                "Cancellation without live bid ignored"
                            );
                        }
                    }
                }
            }
        }

        let live: Vec<LiveBid> = slots.into_iter().flatten().collect();
        debug!(
            events = events.len(),
            placed = stats.placed,
            cancelled = stats.cancelled,
            unmatched = stats.unmatched_cancels,
            live = live.len(),
            "Bid log reconciled"
        );
        (live, stats)
    }

    /// Reconcile, then aggregate the live bids with the ask-side rules.
    pub fn reconcile_levels(
        &self,
        events: &[BidEvent],
        aggregator: &PriceLevelAggregator,
    ) -> Result<Vec<PriceLevel>, AggregationError> {
        let orders: Vec<RawOrder> = self.reconcile(events).into_iter().map(RawOrder::from).collect();
        aggregator.aggregate(&orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use crate::events::OrderingKey;

    fn placed(ts: i64, seq: u64, id: &str, price: i64) -> BidEvent {
        BidEvent::placed(OrderingKey::new(ts, seq), id, Decimal::from(price), 1)
    }

    fn cancelled(ts: i64, seq: u64, id: &str) -> BidEvent {
        BidEvent::cancelled(OrderingKey::new(ts, seq), id)
    }

    #[test]
    fn test_place_then_cancel_is_empty() {
        let live = BidReconciler::new().reconcile(&[placed(1, 0, "A", 10), cancelled(2, 1, "A")]);
        assert!(live.is_empty());
    }

    #[test]
    fn test_duplicate_identity_single_cancel() {
        let (live, stats) = BidReconciler::new().reconcile_with_stats(&[
            placed(1, 0, "A", 10),
            placed(2, 1, "A", 11),
            cancelled(3, 2, "A"),
        ]);
        assert_eq!(live.len(), 1);
        // Oldest placement is the one removed
        assert_eq!(live[0].price, Decimal::from(11));
        assert_eq!(stats.cancelled, 1);
    }

    #[test]
    fn test_unknown_cancel_is_noop() {
        let (live, stats) = BidReconciler::new()
            .reconcile_with_stats(&[placed(1, 0, "A", 10), cancelled(2, 1, "B")]);
        assert_eq!(live.len(), 1);
        assert_eq!(stats.unmatched_cancels, 1);
    }

    #[test]
    fn test_cancel_before_placement_does_not_match() {
        // Arrives first in the array but is later by key
        let events = [cancelled(1, 0, "A"), placed(2, 1, "A", 10)];
        let live = BidReconciler::new().reconcile(&events);
        assert_eq!(live.len(), 1);
    }

    #[test]
    fn test_events_sorted_by_key_before_scan() {
        // Cancel arrives before the placement in the array, but its key is later
        let events = [cancelled(5, 1, "A"), placed(4, 0, "A", 10)];
        let live = BidReconciler::new().reconcile(&events);
        assert!(live.is_empty());
    }

    #[test]
    fn test_equal_keys_keep_arrival_order() {
        let events = [placed(1, 0, "A", 10), cancelled(1, 0, "A")];
        assert!(BidReconciler::new().reconcile(&events).is_empty());
    }

    #[test]
    fn test_live_bids_in_log_order() {
        let events = [placed(3, 0, "C", 30), placed(1, 0, "A", 10), placed(2, 0, "B", 20)];
        let live = BidReconciler::new().reconcile(&events);
        let ids: Vec<&str> = live.iter().map(|b| b.identity.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_reconcile_levels_aggregates() {
        let events = [
            placed(1, 0, "A", 10),
            placed(2, 0, "B", 10),
            placed(3, 0, "C", 9),
            cancelled(4, 0, "C"),
        ];
        let levels = BidReconciler::new()
            .reconcile_levels(&events, &PriceLevelAggregator::with_defaults())
            .unwrap();
        assert_eq!(levels, vec![PriceLevel::new(10, 2)]);
    }
}
