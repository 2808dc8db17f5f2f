//! Per-kind metric aggregation.
//!
//! Classifies one scope's records for one audit kind into canonical status
//! counts and derives the completion arithmetic from the inclusion sets in
//! [`super::rules`]. Percentages carry full float precision; rounding only
//! happens at presentation edges.

use shelf_core::error::{EngineProblem, ErrorCode};
use shelf_core::model::record::{AuditKind, AuditRecord, CanonicalStatus};
use shelf_core::model::snapshot::KindMetrics;
use tracing::warn;

/// Aggregation result: the metrics plus any non-fatal findings.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOutcome {
    pub metrics: KindMetrics,
    pub problems: Vec<EngineProblem>,
}

/// Compute completion percentage with the overflow guard applied.
///
/// `completion = read/valid*100` when `valid > 0`, else 0. A value above
/// 100 (possible for presence, where ReadNoStock is read but not valid)
/// indicates the read set outran the valid set; it is clamped to 100 and
/// reported, never silently accepted.
fn completion_pct(valid: u64, read: u64, context: &str) -> (f64, Option<EngineProblem>) {
    if valid == 0 {
        return (0.0, None);
    }

    #[allow(clippy::cast_precision_loss)]
    let pct = read as f64 / valid as f64 * 100.0;
    if pct > 100.0 {
        warn!(context, pct, "completion percentage above 100, clamping");
        return (
            100.0,
            Some(EngineProblem::new(
                ErrorCode::PercentageOverflow,
                format!("{context}: read {read} exceeds valid {valid} ({pct:.2}%)"),
            )),
        );
    }
    (pct, None)
}

/// Aggregate one audit kind's records into [`KindMetrics`].
///
/// `records` should already be filtered to `kind`; rows of other kinds are
/// skipped and never counted.
#[must_use]
pub fn aggregate_kind(kind: AuditKind, records: &[AuditRecord]) -> AggregateOutcome {
    let mut metrics = KindMetrics::default();
    let mut problems = Vec::new();

    let mut stockout_cost = 0.0_f64;
    let mut confirmed = 0_u64;

    for record in records.iter().filter(|r| r.audit_kind == kind) {
        metrics.total_items += 1;
        let status = record.canonical_status;

        match status {
            CanonicalStatus::Updated => metrics.updated_items += 1,
            CanonicalStatus::Outdated => metrics.outdated_items += 1,
            CanonicalStatus::NotBelonging => metrics.not_belonging_items += 1,
            CanonicalStatus::UnreadWithStock => metrics.unread_with_stock_items += 1,
            CanonicalStatus::NoStock => metrics.no_stock_items += 1,
            CanonicalStatus::ReadNoStock
            | CanonicalStatus::WithProblem
            | CanonicalStatus::NotRead => {}
        }

        if super::rules::is_valid(kind, status) {
            metrics.valid_items += 1;
        }
        if super::rules::is_read(kind, status) {
            metrics.read_items += 1;
        }

        if kind == AuditKind::Stockout && status == CanonicalStatus::WithProblem {
            stockout_cost += record.cost.unwrap_or(0.0);
        }
        if kind == AuditKind::Presence
            && super::rules::confirmed_presence_statuses().contains(&status)
        {
            confirmed += 1;
        }
    }

    let (pct, overflow) = completion_pct(
        metrics.valid_items,
        metrics.read_items,
        kind.as_str(),
    );
    metrics.completion_pct = pct;
    metrics.remainder_pct = if metrics.valid_items > 0 { 100.0 - pct } else { 0.0 };
    problems.extend(overflow);

    match kind {
        AuditKind::Stockout => metrics.total_stockout_cost = Some(stockout_cost),
        AuditKind::Presence => metrics.confirmed_presence = Some(confirmed),
        AuditKind::Label => {}
    }

    AggregateOutcome { metrics, problems }
}
