//! Snapshot building: per-kind aggregates merged into one entity-day view.
//!
//! Store and user snapshots share the consolidation arithmetic but score
//! differently: stores get a weighted completion/quality/productivity/
//! consistency composite, users get item-weighted activity XP with
//! multi-kind bonuses.

use std::collections::BTreeMap;

use shelf_core::config::{EngineConfig, ScoreConfig, XpConfig};
use shelf_core::error::EngineProblem;
use shelf_core::model::record::{AuditKind, AuditRecord, EntityClass};
use shelf_core::model::snapshot::DailySnapshot;

use crate::metrics::{aggregate_kind, breakdown_kind};

/// Build outcome: the snapshot plus non-fatal findings from aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutcome {
    pub snapshot: DailySnapshot,
    pub problems: Vec<EngineProblem>,
}

/// Number of distinct users that contributed rows.
#[must_use]
pub fn active_users(records: &[AuditRecord]) -> u64 {
    let distinct: std::collections::HashSet<&str> = records
        .iter()
        .map(|record| record.entity_user_id.as_str())
        .collect();
    u64::try_from(distinct.len()).unwrap_or(u64::MAX)
}

/// Build one entity-day snapshot from that entity's records.
///
/// `records` must already be filtered to the entity and day. Kinds with no
/// rows are omitted from the per-kind maps (sparse, like the category
/// breakdowns).
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn build_snapshot(
    config: &EngineConfig,
    entity_id: &str,
    entity_class: EntityClass,
    date: chrono::NaiveDate,
    records: &[AuditRecord],
) -> BuildOutcome {
    let mut snapshot = DailySnapshot::empty(entity_id, entity_class, date);
    let mut problems = Vec::new();

    let mut updated_by_kind: BTreeMap<AuditKind, u64> = BTreeMap::new();

    for kind in AuditKind::ALL {
        if !records.iter().any(|record| record.audit_kind == kind) {
            continue;
        }

        let outcome = aggregate_kind(kind, records);
        problems.extend(outcome.problems);

        snapshot.total_items += outcome.metrics.total_items;
        snapshot.items_read += outcome.metrics.read_items;
        snapshot.items_updated += outcome.metrics.updated_items;
        updated_by_kind.insert(kind, outcome.metrics.updated_items);

        snapshot.breakdowns.insert(kind, breakdown_kind(kind, records));
        snapshot.kinds.insert(kind, outcome.metrics);
    }

    if snapshot.items_read > 0 {
        snapshot.overall_completion_pct =
            snapshot.items_updated as f64 / snapshot.items_read as f64 * 100.0;
    }

    match entity_class {
        EntityClass::Store => {
            let users = active_users(records);
            let score = store_composite_score(
                &config.score,
                snapshot.overall_completion_pct,
                snapshot.kinds_with_activity(),
                snapshot.items_updated,
                users,
            );
            snapshot.composite_score = score;
            snapshot.quality_note = Some((score as f64 / 10.0).round() as i64);
        }
        EntityClass::User => {
            snapshot.composite_score = user_composite_score(&config.xp, &updated_by_kind);
        }
    }

    collect_alerts(&mut snapshot, &problems);

    BuildOutcome { snapshot, problems }
}

/// Store composite: `0.4*completion + 0.3*quality + 0.2*productivity +
/// 0.1*consistency`, rounded to the nearest integer.
///
/// - `quality = (kinds_with_activity / 3) * 100`
/// - `productivity = min((items_updated / active_users) * 2, 100)`, 0 with
///   no active users
/// - `consistency = min(active_users * 10, 100)`
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn store_composite_score(
    weights: &ScoreConfig,
    completion_pct: f64,
    kinds_with_activity: u32,
    items_updated: u64,
    active_users: u64,
) -> i64 {
    let quality = f64::from(kinds_with_activity) / 3.0 * 100.0;

    let productivity = if active_users == 0 {
        0.0
    } else {
        (items_updated as f64 / active_users as f64 * 2.0).min(100.0)
    };

    let consistency = (active_users as f64 * 10.0).min(100.0);

    let score = weights.completion_weight * completion_pct
        + weights.quality_weight * quality
        + weights.productivity_weight * productivity
        + weights.consistency_weight * consistency;

    score.round() as i64
}

/// User composite: item-weighted XP per kind, with a single multi-kind
/// multiplier (the higher of the two applies, never both).
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn user_composite_score(xp: &XpConfig, updated_by_kind: &BTreeMap<AuditKind, u64>) -> i64 {
    let mut score = 0.0_f64;
    for (kind, updated) in updated_by_kind {
        let weight = match kind {
            AuditKind::Label => xp.label_weight,
            AuditKind::Stockout => xp.stockout_weight,
            AuditKind::Presence => xp.presence_weight,
        };
        score += *updated as f64 * weight;
    }

    let kinds_worked = updated_by_kind.len();
    let multiplier = match kinds_worked {
        3 => xp.all_kind_multiplier,
        2 => xp.two_kind_multiplier,
        _ => 1.0,
    };

    (score * multiplier).round() as i64
}

/// Surface aggregation findings and completion warnings as snapshot alerts.
fn collect_alerts(snapshot: &mut DailySnapshot, problems: &[EngineProblem]) {
    for problem in problems {
        snapshot.alerts.push(format!("{}: {}", problem.code, problem.detail));
    }

    if snapshot.total_items > 0 && snapshot.overall_completion_pct < 50.0 {
        snapshot.alerts.push(format!(
            "low completion: {:.1}% of read items updated",
            snapshot.overall_completion_pct
        ));
    }

    let shortage: f64 = snapshot
        .kinds
        .values()
        .filter_map(|metrics| metrics.total_stockout_cost)
        .sum();
    if shortage > 0.0 {
        snapshot
            .alerts
            .push(format!("stockout shortage cost: {shortage:.2}"));
    }
}
