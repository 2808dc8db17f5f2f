//! Daily performance snapshots.
//!
//! A [`DailySnapshot`] is the fully derived state for one entity (user or
//! store) on one day. It is recomputed from scratch and replaced whole on
//! every batch ingest for its scope; nothing in it is patched in place.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::record::{AuditKind, EntityClass};

/// Per-kind sub-metrics inside a snapshot.
///
/// Invariant: `completion_pct + remainder_pct == 100` whenever
/// `valid_items > 0`; both are `0` when `valid_items == 0`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KindMetrics {
    pub total_items: u64,
    pub valid_items: u64,
    pub read_items: u64,
    pub updated_items: u64,
    pub outdated_items: u64,
    pub not_belonging_items: u64,
    pub unread_with_stock_items: u64,
    pub no_stock_items: u64,
    pub completion_pct: f64,
    pub remainder_pct: f64,
    /// Sum of `cost` over shortage items. Stockout kind only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_stockout_cost: Option<f64>,
    /// Updated + NotBelonging + ReadNoStock. Presence kind only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_presence: Option<u64>,
}

/// Per-category sub-totals produced by the breakdown calculator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CategoryStat {
    pub total: u64,
    pub valid: u64,
    pub read: u64,
    pub pct: f64,
    /// Distinct users that contributed rows to this category.
    pub contributing_users: u64,
}

/// Sparse category maps for one audit kind. Categories absent from the
/// batch are omitted, never zero-filled.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KindBreakdown {
    pub by_product_class: BTreeMap<String, CategoryStat>,
    pub by_location: BTreeMap<String, CategoryStat>,
}

/// Consolidated daily snapshot for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySnapshot {
    pub entity_id: String,
    pub entity_class: EntityClass,
    pub snapshot_date: chrono::NaiveDate,
    /// Sub-metrics for kinds with at least one row that day (sparse).
    pub kinds: BTreeMap<AuditKind, KindMetrics>,
    /// Category breakdowns, parallel to `kinds`.
    pub breakdowns: BTreeMap<AuditKind, KindBreakdown>,
    pub total_items: u64,
    pub items_read: u64,
    pub items_updated: u64,
    pub overall_completion_pct: f64,
    pub composite_score: i64,
    /// 0-10 summary of the composite score. Store snapshots only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_note: Option<i64>,
    /// Position on the day's leaderboard, assigned by the ranking engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank_position: Option<u32>,
    /// Non-fatal findings surfaced during aggregation (clamped percentages,
    /// low completion, shortage cost spikes).
    pub alerts: Vec<String>,
}

impl DailySnapshot {
    /// An empty snapshot shell for an entity-day with no activity yet.
    #[must_use]
    pub fn empty(
        entity_id: impl Into<String>,
        entity_class: EntityClass,
        snapshot_date: chrono::NaiveDate,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            entity_class,
            snapshot_date,
            kinds: BTreeMap::new(),
            breakdowns: BTreeMap::new(),
            total_items: 0,
            items_read: 0,
            items_updated: 0,
            overall_completion_pct: 0.0,
            composite_score: 0,
            quality_note: None,
            rank_position: None,
            alerts: Vec::new(),
        }
    }

    /// Number of audit kinds with at least one row that day.
    #[must_use]
    pub fn kinds_with_activity(&self) -> u32 {
        u32::try_from(
            self.kinds
                .values()
                .filter(|metrics| metrics.total_items > 0)
                .count(),
        )
        .unwrap_or(u32::MAX)
    }
}

/// Cumulative leaderboard history for one entity, advanced by every ranking
/// run and never reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankHistory {
    pub entity_id: String,
    pub entity_class: EntityClass,
    /// `position_counts[i]` counts finishes at position `i + 1` (1..=10).
    pub position_counts: [u64; 10],
    pub above_ten_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_position_ever: Option<u32>,
}

impl RankHistory {
    #[must_use]
    pub fn new(entity_id: impl Into<String>, entity_class: EntityClass) -> Self {
        Self {
            entity_id: entity_id.into(),
            entity_class,
            position_counts: [0; 10],
            above_ten_count: 0,
            best_position_ever: None,
        }
    }

    /// Record one leaderboard finish.
    pub fn record_position(&mut self, position: u32) {
        match position {
            1..=10 => self.position_counts[(position - 1) as usize] += 1,
            _ => self.above_ten_count += 1,
        }
        self.best_position_ever = Some(match self.best_position_ever {
            Some(best) => best.min(position),
            None => position,
        });
    }
}

/// One row of a day's leaderboard as exposed to callers. The ranking never
/// owns snapshot data, only the entity reference and its score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingRow {
    pub entity_id: String,
    pub position: u32,
    pub composite_score: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 2).expect("valid date")
    }

    #[test]
    fn empty_snapshot_has_zeroed_totals() {
        let snapshot = DailySnapshot::empty("st-001", EntityClass::Store, day());
        assert_eq!(snapshot.total_items, 0);
        assert_eq!(snapshot.overall_completion_pct, 0.0);
        assert_eq!(snapshot.kinds_with_activity(), 0);
        assert!(snapshot.rank_position.is_none());
    }

    #[test]
    fn kinds_with_activity_ignores_zero_rows() {
        let mut snapshot = DailySnapshot::empty("u-1", EntityClass::User, day());
        snapshot.kinds.insert(
            AuditKind::Label,
            KindMetrics {
                total_items: 4,
                ..KindMetrics::default()
            },
        );
        snapshot
            .kinds
            .insert(AuditKind::Presence, KindMetrics::default());
        assert_eq!(snapshot.kinds_with_activity(), 1);
    }

    #[test]
    fn rank_history_counts_top_ten_positions() {
        let mut history = RankHistory::new("st-001", EntityClass::Store);
        history.record_position(1);
        history.record_position(1);
        history.record_position(10);
        history.record_position(11);

        assert_eq!(history.position_counts[0], 2);
        assert_eq!(history.position_counts[9], 1);
        assert_eq!(history.above_ten_count, 1);
        assert_eq!(history.best_position_ever, Some(1));
    }

    #[test]
    fn rank_history_best_position_only_improves() {
        let mut history = RankHistory::new("u-9", EntityClass::User);
        history.record_position(4);
        assert_eq!(history.best_position_ever, Some(4));
        history.record_position(7);
        assert_eq!(history.best_position_ever, Some(4));
        history.record_position(2);
        assert_eq!(history.best_position_ever, Some(2));
    }
}
