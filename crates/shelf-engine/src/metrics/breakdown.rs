//! Per-category breakdowns.
//!
//! Re-applies the kind-specific inclusion rules grouped by product class and
//! independently by physical location. Maps are sparse: categories absent
//! from the batch are omitted, never zero-filled, so the category tables
//! stay bounded by what was actually audited. Output must not depend on any
//! iteration order; `BTreeMap` keeps serialization deterministic.

use std::collections::{BTreeMap, HashSet};

use shelf_core::model::record::{AuditKind, AuditRecord};
use shelf_core::model::snapshot::{CategoryStat, KindBreakdown};
use tracing::warn;

use super::rules;

fn accumulate<'a>(
    kind: AuditKind,
    records: impl Iterator<Item = &'a AuditRecord>,
    key_of: impl Fn(&AuditRecord) -> &str,
) -> BTreeMap<String, CategoryStat> {
    let mut stats: BTreeMap<String, CategoryStat> = BTreeMap::new();
    let mut users: BTreeMap<String, HashSet<&str>> = BTreeMap::new();

    for record in records {
        let key = key_of(record);
        if key.is_empty() {
            continue;
        }

        let stat = stats.entry(key.to_string()).or_default();
        stat.total += 1;
        if rules::is_valid(kind, record.canonical_status) {
            stat.valid += 1;
        }
        if rules::is_read(kind, record.canonical_status) {
            stat.read += 1;
        }
        users
            .entry(key.to_string())
            .or_default()
            .insert(record.entity_user_id.as_str());
    }

    for (key, stat) in &mut stats {
        #[allow(clippy::cast_precision_loss)]
        if stat.valid > 0 {
            let pct = stat.read as f64 / stat.valid as f64 * 100.0;
            if pct > 100.0 {
                warn!(
                    category = key.as_str(),
                    pct, "category completion percentage above 100, clamping"
                );
            }
            stat.pct = pct.min(100.0);
        }
        stat.contributing_users = users
            .get(key)
            .map_or(0, |set| u64::try_from(set.len()).unwrap_or(u64::MAX));
    }

    stats
}

/// Build the sparse product-class and location breakdowns for one kind.
#[must_use]
pub fn breakdown_kind(kind: AuditKind, records: &[AuditRecord]) -> KindBreakdown {
    let of_kind = || records.iter().filter(move |r| r.audit_kind == kind);

    KindBreakdown {
        by_product_class: accumulate(kind, of_kind(), |r| r.product_class.as_str()),
        by_location: accumulate(kind, of_kind(), |r| r.location.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_core::model::record::CanonicalStatus;

    fn record(
        user: &str,
        status: CanonicalStatus,
        product_class: &str,
        location: &str,
    ) -> AuditRecord {
        AuditRecord {
            entity_user_id: user.to_string(),
            store_id: "st-001".to_string(),
            audit_kind: AuditKind::Label,
            canonical_status: status,
            product_class: product_class.to_string(),
            location: location.to_string(),
            stock_qty: 1,
            cost: None,
            recorded_at_us: 0,
        }
    }

    #[test]
    fn groups_by_product_class_and_location_independently() {
        let records = vec![
            record("u-1", CanonicalStatus::Updated, "dairy", "aisle-1"),
            record("u-1", CanonicalStatus::UnreadWithStock, "dairy", "aisle-2"),
            record("u-2", CanonicalStatus::Updated, "bakery", "aisle-1"),
        ];

        let breakdown = breakdown_kind(AuditKind::Label, &records);

        let dairy = &breakdown.by_product_class["dairy"];
        assert_eq!(dairy.total, 2);
        assert_eq!(dairy.valid, 2);
        assert_eq!(dairy.read, 1);
        assert!((dairy.pct - 50.0).abs() < 1e-9);
        assert_eq!(dairy.contributing_users, 1);

        let aisle1 = &breakdown.by_location["aisle-1"];
        assert_eq!(aisle1.total, 2);
        assert_eq!(aisle1.contributing_users, 2);
    }

    #[test]
    fn absent_categories_are_omitted_not_zero_filled() {
        let records = vec![record("u-1", CanonicalStatus::Updated, "dairy", "aisle-1")];
        let breakdown = breakdown_kind(AuditKind::Label, &records);

        assert_eq!(breakdown.by_product_class.len(), 1);
        assert!(!breakdown.by_product_class.contains_key("bakery"));
    }

    #[test]
    fn empty_category_keys_are_skipped() {
        let records = vec![record("u-1", CanonicalStatus::Updated, "", "aisle-1")];
        let breakdown = breakdown_kind(AuditKind::Label, &records);

        assert!(breakdown.by_product_class.is_empty());
        assert_eq!(breakdown.by_location.len(), 1);
    }

    #[test]
    fn category_with_no_valid_items_has_zero_pct() {
        let records = vec![record("u-1", CanonicalStatus::NoStock, "dairy", "aisle-1")];
        let breakdown = breakdown_kind(AuditKind::Label, &records);

        let dairy = &breakdown.by_product_class["dairy"];
        assert_eq!(dairy.valid, 0);
        assert!((dairy.pct - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn category_overflow_is_clamped_to_100() {
        // ReadNoStock is read but not valid for presence, so the raw
        // category percentage can exceed 100.
        let mut records = vec![
            record("u-1", CanonicalStatus::Updated, "dairy", "aisle-1"),
            record("u-1", CanonicalStatus::ReadNoStock, "dairy", "aisle-1"),
            record("u-1", CanonicalStatus::ReadNoStock, "dairy", "aisle-1"),
        ];
        for r in &mut records {
            r.audit_kind = AuditKind::Presence;
        }

        let breakdown = breakdown_kind(AuditKind::Presence, &records);
        let dairy = &breakdown.by_product_class["dairy"];
        assert_eq!(dairy.valid, 1);
        assert_eq!(dairy.read, 3);
        assert!((dairy.pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn insertion_order_does_not_change_output() {
        let forward = vec![
            record("u-1", CanonicalStatus::Updated, "dairy", "aisle-1"),
            record("u-2", CanonicalStatus::Outdated, "bakery", "aisle-2"),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        assert_eq!(
            breakdown_kind(AuditKind::Label, &forward),
            breakdown_kind(AuditKind::Label, &reversed)
        );
    }
}
