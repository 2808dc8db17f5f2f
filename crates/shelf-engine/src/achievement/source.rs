//! Cumulative metric catalog backing achievement criteria.
//!
//! Every metric is derived on demand from the persisted snapshot history
//! and rank history, never incremented in place. Re-ingesting the same
//! batch rewrites the same snapshots, so the derived values come out
//! identical and nothing double-counts.

use chrono::Days;
use rusqlite::Connection;

use shelf_core::db::query::{self, StoreError};
use shelf_core::model::record::AuditKind;
use shelf_core::model::snapshot::DailySnapshot;

/// Snapshot-derived metrics for one entity, plus the latest day's snapshot
/// for daily-period and custom criteria.
#[derive(Debug, Clone, Default)]
pub struct MetricSource {
    pub lifetime_items_read: u64,
    pub lifetime_items_updated: u64,
    /// Days with at least one audited item.
    pub active_days: u64,
    /// Consecutive active days ending at the most recent active day.
    pub active_day_streak: u64,
    pub best_daily_completion_pct: f64,
    pub best_rank_position: Option<u32>,
    pub latest: Option<DailySnapshot>,
}

impl MetricSource {
    /// Gather the catalog for one entity from persisted history.
    pub fn collect(conn: &Connection, entity_id: &str) -> Result<Self, StoreError> {
        let history = query::snapshot_history(conn, entity_id)?;
        let best_rank_position = query::get_rank_history(conn, entity_id)?
            .and_then(|rank| rank.best_position_ever);
        Ok(Self::from_history(history, best_rank_position))
    }

    /// Fold an ascending-by-date snapshot history into the catalog.
    #[must_use]
    pub fn from_history(history: Vec<DailySnapshot>, best_rank_position: Option<u32>) -> Self {
        let mut source = Self {
            best_rank_position,
            ..Self::default()
        };

        let mut streak = 0_u64;
        let mut prev_active_day = None;

        for snapshot in &history {
            source.lifetime_items_read += snapshot.items_read;
            source.lifetime_items_updated += snapshot.items_updated;
            if snapshot.overall_completion_pct > source.best_daily_completion_pct {
                source.best_daily_completion_pct = snapshot.overall_completion_pct;
            }

            if snapshot.total_items > 0 {
                source.active_days += 1;
                let continues = prev_active_day
                    .and_then(|prev: chrono::NaiveDate| prev.checked_add_days(Days::new(1)))
                    .is_some_and(|next| next == snapshot.snapshot_date);
                streak = if continues { streak + 1 } else { 1 };
                prev_active_day = Some(snapshot.snapshot_date);
            }
        }

        source.active_day_streak = streak;
        source.latest = history.into_iter().next_back();
        source
    }

    /// Look up a named catalog field. `None` for unknown names, which the
    /// rule engine reports as a rule-source problem.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn field(&self, name: &str) -> Option<f64> {
        match name {
            "lifetime_items_read" => Some(self.lifetime_items_read as f64),
            "lifetime_items_updated" => Some(self.lifetime_items_updated as f64),
            "active_days" => Some(self.active_days as f64),
            "active_day_streak" => Some(self.active_day_streak as f64),
            "best_daily_completion_pct" => Some(self.best_daily_completion_pct),
            _ => None,
        }
    }

    /// True when the latest day had stockout audits and zero shortage cost.
    #[must_use]
    pub fn latest_day_zero_shortage(&self) -> bool {
        self.latest
            .as_ref()
            .and_then(|snapshot| snapshot.kinds.get(&AuditKind::Stockout))
            .is_some_and(|metrics| {
                metrics.valid_items > 0 && metrics.total_stockout_cost.unwrap_or(0.0) == 0.0
            })
    }

    /// True when the entity has ever finished first on a leaderboard.
    #[must_use]
    pub fn ever_ranked_first(&self) -> bool {
        self.best_rank_position == Some(1)
    }
}
