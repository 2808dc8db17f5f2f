//! Scope recompute orchestration.
//!
//! One recompute run replaces the scope's batch, rebuilds the store and
//! affected user snapshots, re-sorts the day's leaderboards, and refreshes
//! achievements and XP for every touched user. Everything persists inside a
//! single transaction under the scope's advisory lock, so a fatal failure
//! rolls back to the prior snapshot and a rerun over identical input
//! produces an identical result.

use std::path::Path;

use rusqlite::Connection;
use serde::Deserialize;
use tracing::{info, warn};

use shelf_core::config::EngineConfig;
use shelf_core::db::query::{
    self, StoreError, load_store_day_records, load_user_day_records, replace_batch,
    snapshot_version, upsert_snapshot, users_for_store_day,
};
use shelf_core::error::{EngineProblem, ErrorCode};
use shelf_core::lock::{DEFAULT_LOCK_TIMEOUT, LockError, ScopeLock};
use shelf_core::model::record::{AuditRecord, BatchScope, EntityClass};
use shelf_core::model::snapshot::{DailySnapshot, RankingRow};
use shelf_core::status::{StatusMatch, normalize_status};

use crate::achievement::evaluate_achievements;
use crate::rank::rerank_day;
use crate::snapshot::build_snapshot;
use crate::xp::refresh_xp_state;

/// One row of an incoming batch, statuses still raw.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAuditRow {
    pub entity_user_id: String,
    pub product_class: String,
    pub location: String,
    pub status: String,
    #[serde(default)]
    pub stock_qty: i64,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub recorded_at_us: Option<i64>,
}

/// What one recompute run produced. `problems` carries every non-fatal
/// finding (skipped rows, unknown statuses, clamps, skipped rules).
#[derive(Debug, Clone)]
pub struct RecomputeOutcome {
    pub success: bool,
    pub snapshot: DailySnapshot,
    pub user_snapshots: Vec<DailySnapshot>,
    pub ranking: Vec<RankingRow>,
    pub newly_unlocked: Vec<String>,
    pub problems: Vec<EngineProblem>,
}

/// Fatal recompute failures. Non-fatal conditions never surface here; they
/// land in [`RecomputeOutcome::problems`].
#[derive(Debug, thiserror::Error)]
pub enum RecomputeError {
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RecomputeError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Lock(err) => err.code(),
            Self::Store(StoreError::VersionConflict { .. }) => {
                ErrorCode::SnapshotVersionConflict
            }
            Self::Store(_) => ErrorCode::StoreWriteFailed,
        }
    }

    /// Conflicts are safe to retry; the newer batch was not dropped.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Lock(LockError::Timeout { .. })
                | Self::Store(StoreError::VersionConflict { .. })
        )
    }
}

/// Normalize raw batch rows into canonical records for one scope.
///
/// Rows with an unknown status or a missing user id are skipped and
/// reported; the batch itself still processes.
#[must_use]
pub fn normalize_rows(
    scope: &BatchScope,
    rows: &[RawAuditRow],
) -> (Vec<AuditRecord>, Vec<EngineProblem>) {
    let mut records = Vec::with_capacity(rows.len());
    let mut problems = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        if row.entity_user_id.trim().is_empty() {
            problems.push(EngineProblem::new(
                ErrorCode::RowValidationFailed,
                format!("row {index}: missing entity_user_id"),
            ));
            continue;
        }

        let canonical_status = match normalize_status(&row.status) {
            StatusMatch::Known(status) => status,
            StatusMatch::Unknown(raw) => {
                warn!(row = index, status = raw.as_str(), "unknown audit status");
                problems.push(EngineProblem::new(
                    ErrorCode::UnknownStatus,
                    format!("row {index}: unrecognized status {raw:?}"),
                ));
                continue;
            }
        };

        records.push(AuditRecord {
            entity_user_id: row.entity_user_id.clone(),
            store_id: scope.store_id.clone(),
            audit_kind: scope.audit_kind,
            canonical_status,
            product_class: row.product_class.clone(),
            location: row.location.clone(),
            stock_qty: row.stock_qty,
            cost: row.cost,
            recorded_at_us: row.recorded_at_us.unwrap_or_default(),
        });
    }

    (records, problems)
}

/// Replace one scope's batch and recompute everything it touches.
///
/// # Errors
///
/// Fails on lock contention, a snapshot version conflict, or a storage
/// error; the transaction rolls back and the prior snapshot stays intact.
pub fn recompute_scope(
    conn: &mut Connection,
    config: &EngineConfig,
    data_dir: &Path,
    scope: &BatchScope,
    rows: &[RawAuditRow],
    now_us: i64,
) -> Result<RecomputeOutcome, RecomputeError> {
    let scope_key = scope.key();
    let _lock = ScopeLock::acquire(data_dir, &scope_key, DEFAULT_LOCK_TIMEOUT)?;

    let (records, mut problems) = normalize_rows(scope, rows);

    let tx = conn.transaction().map_err(StoreError::from)?;

    let replaced = replace_batch(&tx, scope, &scope_key, &records, now_us)?;
    info!(
        scope = scope_key.as_str(),
        rows = replaced,
        skipped = rows.len() - records.len(),
        "batch replaced"
    );

    // Store snapshot covers every kind ingested for that store-day, not
    // just the kind being replaced.
    let store_records = load_store_day_records(&tx, &scope.store_id, scope.audit_date)?;
    let built = build_snapshot(
        config,
        &scope.store_id,
        EntityClass::Store,
        scope.audit_date,
        &store_records,
    );
    problems.extend(built.problems);
    let expected = snapshot_version(&tx, &scope.store_id, scope.audit_date)?;
    upsert_snapshot(&tx, &built.snapshot, expected, now_us)?;

    let mut user_snapshots = Vec::new();
    for user_id in users_for_store_day(&tx, &scope.store_id, scope.audit_date)? {
        let user_records = load_user_day_records(&tx, &user_id, scope.audit_date)?;
        let built = build_snapshot(
            config,
            &user_id,
            EntityClass::User,
            scope.audit_date,
            &user_records,
        );
        problems.extend(built.problems);
        let expected = snapshot_version(&tx, &user_id, scope.audit_date)?;
        upsert_snapshot(&tx, &built.snapshot, expected, now_us)?;
        user_snapshots.push(built.snapshot);
    }

    let ranking = rerank_day(&tx, scope.audit_date, EntityClass::Store, now_us)?;
    rerank_day(&tx, scope.audit_date, EntityClass::User, now_us)?;

    let mut newly_unlocked = Vec::new();
    for user_snapshot in &user_snapshots {
        let outcome = evaluate_achievements(&tx, config, &user_snapshot.entity_id, now_us)?;
        problems.extend(outcome.problems);
        newly_unlocked.extend(outcome.newly_unlocked);
        refresh_xp_state(&tx, &config.xp, &user_snapshot.entity_id, outcome.unlocked_xp)?;
    }

    // Re-read so the returned snapshot carries its leaderboard position.
    let snapshot =
        query::get_snapshot(&tx, &scope.store_id, scope.audit_date)?.unwrap_or(built.snapshot);

    tx.commit().map_err(StoreError::from)?;

    info!(
        scope = scope_key.as_str(),
        composite_score = snapshot.composite_score,
        users = user_snapshots.len(),
        problems = problems.len(),
        "scope recomputed"
    );

    Ok(RecomputeOutcome {
        success: true,
        snapshot,
        user_snapshots,
        ranking,
        newly_unlocked,
        problems,
    })
}
