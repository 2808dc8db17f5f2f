//! Property tests over the aggregation and ranking arithmetic.

use proptest::prelude::*;

use shelf_core::model::record::{AuditKind, AuditRecord, CanonicalStatus};
use shelf_engine::metrics::aggregate_kind;
use shelf_engine::rank::rank_scores;

fn any_status() -> impl Strategy<Value = CanonicalStatus> {
    prop_oneof![
        Just(CanonicalStatus::Updated),
        Just(CanonicalStatus::Outdated),
        Just(CanonicalStatus::UnreadWithStock),
        Just(CanonicalStatus::NotBelonging),
        Just(CanonicalStatus::ReadNoStock),
        Just(CanonicalStatus::NoStock),
        Just(CanonicalStatus::WithProblem),
        Just(CanonicalStatus::NotRead),
    ]
}

fn any_kind() -> impl Strategy<Value = AuditKind> {
    prop_oneof![
        Just(AuditKind::Label),
        Just(AuditKind::Stockout),
        Just(AuditKind::Presence),
    ]
}

fn record(kind: AuditKind, status: CanonicalStatus, cost: Option<f64>) -> AuditRecord {
    AuditRecord {
        entity_user_id: "u-1".to_string(),
        store_id: "st-001".to_string(),
        audit_kind: kind,
        canonical_status: status,
        product_class: "misc".to_string(),
        location: "aisle-0".to_string(),
        stock_qty: 0,
        cost,
        recorded_at_us: 0,
    }
}

proptest! {
    #[test]
    fn completion_and_remainder_always_sum_to_hundred_or_zero(
        kind in any_kind(),
        statuses in proptest::collection::vec(any_status(), 0..64),
    ) {
        let records: Vec<AuditRecord> = statuses
            .into_iter()
            .map(|status| record(kind, status, Some(1.0)))
            .collect();
        let outcome = aggregate_kind(kind, &records);
        let metrics = &outcome.metrics;

        if metrics.valid_items > 0 {
            prop_assert!((metrics.completion_pct + metrics.remainder_pct - 100.0).abs() < 1e-9);
        } else {
            prop_assert_eq!(metrics.completion_pct, 0.0);
            prop_assert_eq!(metrics.remainder_pct, 0.0);
        }
    }

    #[test]
    fn completion_stays_within_bounds(
        kind in any_kind(),
        statuses in proptest::collection::vec(any_status(), 0..64),
    ) {
        let records: Vec<AuditRecord> = statuses
            .into_iter()
            .map(|status| record(kind, status, None))
            .collect();
        let metrics = aggregate_kind(kind, &records).metrics;

        prop_assert!(metrics.completion_pct >= 0.0);
        prop_assert!(metrics.completion_pct <= 100.0);
        prop_assert!(metrics.valid_items <= metrics.total_items);
    }

    #[test]
    fn ranking_is_a_contiguous_permutation(
        scores in proptest::collection::btree_map("st-[a-z]{3}", -1000_i64..1000, 0..32),
    ) {
        let entries: Vec<(String, i64)> = scores.into_iter().collect();
        let count = entries.len();
        let rows = rank_scores(entries);

        let mut positions: Vec<u32> = rows.iter().map(|row| row.position).collect();
        positions.sort_unstable();
        let expected: Vec<u32> = (1..=u32::try_from(count).expect("small board")).collect();
        prop_assert_eq!(positions, expected);

        for pair in rows.windows(2) {
            prop_assert!(pair[0].composite_score >= pair[1].composite_score);
        }
    }
}
