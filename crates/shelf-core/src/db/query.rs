//! Typed query helpers for the shelfscore store.
//!
//! All functions take a shared `&Connection` (callers pass `&tx` inside a
//! transaction) and return typed structs, never raw rows. Snapshot writes go
//! through [`upsert_snapshot`], which enforces optimistic versioning: the
//! caller states the version it read, and a mismatch surfaces as
//! [`StoreError::VersionConflict`] instead of silently overwriting a
//! concurrent recompute.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::ErrorCode;
use crate::model::achievement::{AchievementProgress, XpLevelState};
use crate::model::record::{AuditKind, AuditRecord, BatchScope, EntityClass};
use crate::model::snapshot::{DailySnapshot, RankHistory};

/// Date format used for all TEXT date columns.
const DATE_FMT: &str = "%Y-%m-%d";

/// Errors surfaced by the store query layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The snapshot row changed underneath this recompute. Retryable.
    #[error("snapshot version conflict for {entity_id} on {snapshot_date}")]
    VersionConflict {
        entity_id: String,
        snapshot_date: NaiveDate,
    },
    /// Underlying SQLite failure.
    #[error("store query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A persisted payload or enum column failed to decode.
    #[error("corrupt store row: {0}")]
    Corrupt(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Corrupt(err.to_string())
    }
}

impl StoreError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::VersionConflict { .. } => ErrorCode::SnapshotVersionConflict,
            Self::Sqlite(_) => ErrorCode::StoreWriteFailed,
            Self::Corrupt(_) => ErrorCode::InternalUnexpected,
        }
    }
}

fn fmt_date(date: NaiveDate) -> String {
    date.format(DATE_FMT).to_string()
}

fn parse_date(raw: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(raw, DATE_FMT)
        .map_err(|err| StoreError::Corrupt(format!("invalid date {raw:?}: {err}")))
}

// ---------------------------------------------------------------------------
// Batch replace
// ---------------------------------------------------------------------------

/// Replace the authoritative batch for one scope.
///
/// Deletes every prior row for `(store, date, kind)` and inserts the new
/// rows, recording the originating batch id. Run inside the caller's
/// transaction so a failure leaves the previous batch intact.
///
/// Returns the number of rows inserted.
///
/// # Errors
///
/// Returns an error on SQLite failure.
pub fn replace_batch(
    conn: &Connection,
    scope: &BatchScope,
    batch_id: &str,
    records: &[AuditRecord],
    now_us: i64,
) -> Result<usize, StoreError> {
    let date = fmt_date(scope.audit_date);

    conn.execute(
        "DELETE FROM audit_records
         WHERE store_id = ?1 AND audit_date = ?2 AND audit_kind = ?3",
        params![scope.store_id, date, scope.audit_kind.as_str()],
    )?;

    conn.execute(
        "INSERT INTO audit_batches (store_id, audit_date, audit_kind, batch_id, ingested_at_us)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (store_id, audit_date, audit_kind)
         DO UPDATE SET batch_id = excluded.batch_id, ingested_at_us = excluded.ingested_at_us",
        params![scope.store_id, date, scope.audit_kind.as_str(), batch_id, now_us],
    )?;

    let mut stmt = conn.prepare(
        "INSERT INTO audit_records (
            store_id, audit_date, audit_kind, entity_user_id, canonical_status,
            product_class, location, stock_qty, cost, recorded_at_us
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )?;

    for record in records {
        stmt.execute(params![
            scope.store_id,
            date,
            scope.audit_kind.as_str(),
            record.entity_user_id,
            record.canonical_status.as_str(),
            record.product_class,
            record.location,
            record.stock_qty,
            record.cost,
            record.recorded_at_us,
        ])?;
    }

    Ok(records.len())
}

/// The batch id currently owning a scope, if any.
///
/// # Errors
///
/// Returns an error on SQLite failure.
pub fn batch_id_for_scope(
    conn: &Connection,
    scope: &BatchScope,
) -> Result<Option<String>, StoreError> {
    let id = conn
        .query_row(
            "SELECT batch_id FROM audit_batches
             WHERE store_id = ?1 AND audit_date = ?2 AND audit_kind = ?3",
            params![scope.store_id, fmt_date(scope.audit_date), scope.audit_kind.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

fn record_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, AuditRecord)> {
    let kind_raw: String = row.get(2)?;
    let status_raw: String = row.get(4)?;
    Ok((
        kind_raw,
        status_raw,
        AuditRecord {
            store_id: row.get(0)?,
            entity_user_id: row.get(3)?,
            // Placeholders; overwritten by the caller after parsing the raw
            // kind/status strings outside rusqlite's error type.
            audit_kind: AuditKind::Label,
            canonical_status: crate::model::record::CanonicalStatus::NotRead,
            product_class: row.get(5)?,
            location: row.get(6)?,
            stock_qty: row.get(7)?,
            cost: row.get(8)?,
            recorded_at_us: row.get(9)?,
        },
    ))
}

fn finish_record(
    (kind_raw, status_raw, mut record): (String, String, AuditRecord),
) -> Result<AuditRecord, StoreError> {
    record.audit_kind = kind_raw
        .parse()
        .map_err(|_| StoreError::Corrupt(format!("bad audit_kind {kind_raw:?}")))?;
    record.canonical_status = status_raw
        .parse()
        .map_err(|_| StoreError::Corrupt(format!("bad canonical_status {status_raw:?}")))?;
    Ok(record)
}

const RECORD_COLUMNS: &str = "store_id, audit_date, audit_kind, entity_user_id, \
     canonical_status, product_class, location, stock_qty, cost, recorded_at_us";

/// Load every record for one store-day across all audit kinds.
///
/// # Errors
///
/// Returns an error on SQLite failure or a corrupt row.
pub fn load_store_day_records(
    conn: &Connection,
    store_id: &str,
    date: NaiveDate,
) -> Result<Vec<AuditRecord>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS} FROM audit_records
         WHERE store_id = ?1 AND audit_date = ?2
         ORDER BY record_id"
    ))?;

    let rows = stmt
        .query_map(params![store_id, fmt_date(date)], record_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(finish_record).collect()
}

/// Load one user's records for one day (across stores and kinds).
///
/// # Errors
///
/// Returns an error on SQLite failure or a corrupt row.
pub fn load_user_day_records(
    conn: &Connection,
    entity_user_id: &str,
    date: NaiveDate,
) -> Result<Vec<AuditRecord>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS} FROM audit_records
         WHERE entity_user_id = ?1 AND audit_date = ?2
         ORDER BY record_id"
    ))?;

    let rows = stmt
        .query_map(params![entity_user_id, fmt_date(date)], record_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(finish_record).collect()
}

/// Distinct users with records for one store-day.
///
/// # Errors
///
/// Returns an error on SQLite failure.
pub fn users_for_store_day(
    conn: &Connection,
    store_id: &str,
    date: NaiveDate,
) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT entity_user_id FROM audit_records
         WHERE store_id = ?1 AND audit_date = ?2
         ORDER BY entity_user_id",
    )?;

    let users = stmt
        .query_map(params![store_id, fmt_date(date)], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(users)
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Current optimistic version of a snapshot row, `None` when absent.
///
/// # Errors
///
/// Returns an error on SQLite failure.
pub fn snapshot_version(
    conn: &Connection,
    entity_id: &str,
    date: NaiveDate,
) -> Result<Option<i64>, StoreError> {
    let version = conn
        .query_row(
            "SELECT version FROM daily_snapshots
             WHERE entity_id = ?1 AND snapshot_date = ?2",
            params![entity_id, fmt_date(date)],
            |row| row.get(0),
        )
        .optional()?;
    Ok(version)
}

/// Write (insert or compare-and-swap update) one snapshot.
///
/// `expected_version` must be the version the caller read before
/// recomputing (`None` when the row did not exist). A mismatch means
/// another recompute committed in between; [`StoreError::VersionConflict`]
/// is returned and nothing is written, and the caller re-reads and retries.
///
/// Returns the new row version.
///
/// # Errors
///
/// Returns [`StoreError::VersionConflict`] on a lost race, otherwise SQLite
/// or serialization failures.
pub fn upsert_snapshot(
    conn: &Connection,
    snapshot: &DailySnapshot,
    expected_version: Option<i64>,
    now_us: i64,
) -> Result<i64, StoreError> {
    let payload = serde_json::to_string(snapshot)?;
    let date = fmt_date(snapshot.snapshot_date);

    match expected_version {
        None => {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO daily_snapshots (
                    entity_id, entity_class, snapshot_date, payload_json,
                    composite_score, rank_position, version, updated_at_us
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)",
                params![
                    snapshot.entity_id,
                    snapshot.entity_class.as_str(),
                    date,
                    payload,
                    snapshot.composite_score,
                    snapshot.rank_position,
                    now_us,
                ],
            )?;
            if inserted == 0 {
                // Row appeared after our read: a concurrent insert won.
                return Err(StoreError::VersionConflict {
                    entity_id: snapshot.entity_id.clone(),
                    snapshot_date: snapshot.snapshot_date,
                });
            }
            Ok(1)
        }
        Some(expected) => {
            let changed = conn.execute(
                "UPDATE daily_snapshots
                 SET payload_json = ?1,
                     composite_score = ?2,
                     rank_position = ?3,
                     version = version + 1,
                     updated_at_us = ?4
                 WHERE entity_id = ?5 AND snapshot_date = ?6 AND version = ?7",
                params![
                    payload,
                    snapshot.composite_score,
                    snapshot.rank_position,
                    now_us,
                    snapshot.entity_id,
                    date,
                    expected,
                ],
            )?;
            if changed == 0 {
                return Err(StoreError::VersionConflict {
                    entity_id: snapshot.entity_id.clone(),
                    snapshot_date: snapshot.snapshot_date,
                });
            }
            Ok(expected + 1)
        }
    }
}

/// Load one snapshot, `None` when absent.
///
/// # Errors
///
/// Returns an error on SQLite failure or a corrupt payload.
pub fn get_snapshot(
    conn: &Connection,
    entity_id: &str,
    date: NaiveDate,
) -> Result<Option<DailySnapshot>, StoreError> {
    let payload: Option<String> = conn
        .query_row(
            "SELECT payload_json FROM daily_snapshots
             WHERE entity_id = ?1 AND snapshot_date = ?2",
            params![entity_id, fmt_date(date)],
            |row| row.get(0),
        )
        .optional()?;

    match payload {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

/// The raw snapshot payload as persisted, for byte-level idempotence checks.
///
/// # Errors
///
/// Returns an error on SQLite failure.
pub fn get_snapshot_payload(
    conn: &Connection,
    entity_id: &str,
    date: NaiveDate,
) -> Result<Option<String>, StoreError> {
    let payload = conn
        .query_row(
            "SELECT payload_json FROM daily_snapshots
             WHERE entity_id = ?1 AND snapshot_date = ?2",
            params![entity_id, fmt_date(date)],
            |row| row.get(0),
        )
        .optional()?;
    Ok(payload)
}

/// All snapshots of one entity class for one day, unordered.
///
/// # Errors
///
/// Returns an error on SQLite failure or a corrupt payload.
pub fn snapshots_for_day(
    conn: &Connection,
    date: NaiveDate,
    entity_class: EntityClass,
) -> Result<Vec<DailySnapshot>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT payload_json FROM daily_snapshots
         WHERE snapshot_date = ?1 AND entity_class = ?2",
    )?;

    let payloads = stmt
        .query_map(params![fmt_date(date), entity_class.as_str()], |row| {
            row.get::<_, String>(0)
        })?
        .collect::<Result<Vec<_>, _>>()?;

    payloads
        .iter()
        .map(|json| serde_json::from_str(json).map_err(StoreError::from))
        .collect()
}

/// Full snapshot history of one entity, ordered by date ascending.
///
/// This feeds the cumulative-metric derivation for achievements, which is
/// why it re-reads persisted snapshots instead of trusting in-memory state.
///
/// # Errors
///
/// Returns an error on SQLite failure or a corrupt payload.
pub fn snapshot_history(
    conn: &Connection,
    entity_id: &str,
) -> Result<Vec<DailySnapshot>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT payload_json FROM daily_snapshots
         WHERE entity_id = ?1
         ORDER BY snapshot_date ASC",
    )?;

    let payloads = stmt
        .query_map(params![entity_id], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<String>, _>>()?;

    payloads
        .iter()
        .map(|json| serde_json::from_str(json).map_err(StoreError::from))
        .collect()
}

// ---------------------------------------------------------------------------
// Rank history
// ---------------------------------------------------------------------------

/// Load one entity's cumulative rank history, `None` when absent.
///
/// # Errors
///
/// Returns an error on SQLite failure or a corrupt row.
pub fn get_rank_history(
    conn: &Connection,
    entity_id: &str,
) -> Result<Option<RankHistory>, StoreError> {
    let row = conn
        .query_row(
            "SELECT entity_class, position_counts_json, above_ten_count, best_position_ever
             FROM rank_history WHERE entity_id = ?1",
            params![entity_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                ))
            },
        )
        .optional()?;

    let Some((class_raw, counts_json, above_ten, best)) = row else {
        return Ok(None);
    };

    let entity_class: EntityClass = class_raw
        .parse()
        .map_err(|_| StoreError::Corrupt(format!("bad entity_class {class_raw:?}")))?;
    let counts: Vec<u64> = serde_json::from_str(&counts_json)?;
    let position_counts: [u64; 10] = counts
        .try_into()
        .map_err(|_| StoreError::Corrupt("position_counts_json is not length 10".to_string()))?;

    Ok(Some(RankHistory {
        entity_id: entity_id.to_string(),
        entity_class,
        position_counts,
        above_ten_count: u64::try_from(above_ten)
            .map_err(|_| StoreError::Corrupt("negative above_ten_count".to_string()))?,
        best_position_ever: best
            .map(|value| {
                u32::try_from(value)
                    .map_err(|_| StoreError::Corrupt("bad best_position_ever".to_string()))
            })
            .transpose()?,
    }))
}

/// Persist one entity's cumulative rank history.
///
/// # Errors
///
/// Returns an error on SQLite failure.
pub fn upsert_rank_history(conn: &Connection, history: &RankHistory) -> Result<(), StoreError> {
    let counts_json = serde_json::to_string(&history.position_counts)?;
    conn.execute(
        "INSERT INTO rank_history (
            entity_id, entity_class, position_counts_json, above_ten_count, best_position_ever
         ) VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (entity_id) DO UPDATE SET
            position_counts_json = excluded.position_counts_json,
            above_ten_count = excluded.above_ten_count,
            best_position_ever = excluded.best_position_ever",
        params![
            history.entity_id,
            history.entity_class.as_str(),
            counts_json,
            i64::try_from(history.above_ten_count)
                .map_err(|_| StoreError::Corrupt("above_ten_count overflow".to_string()))?,
            history.best_position_ever,
        ],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Achievement progress
// ---------------------------------------------------------------------------

/// Load every achievement progress row for one entity.
///
/// # Errors
///
/// Returns an error on SQLite failure.
pub fn load_progress(
    conn: &Connection,
    entity_id: &str,
) -> Result<Vec<AchievementProgress>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT achievement_id, current, target, percentage, unlocked, unlocked_at_us
         FROM achievement_progress
         WHERE entity_id = ?1
         ORDER BY achievement_id",
    )?;

    let rows = stmt
        .query_map(params![entity_id], |row| {
            Ok(AchievementProgress {
                entity_id: entity_id.to_string(),
                achievement_id: row.get(0)?,
                current: row.get(1)?,
                target: row.get(2)?,
                percentage: row.get(3)?,
                unlocked: row.get::<_, i64>(4)? != 0,
                unlocked_at_us: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Persist one achievement progress row.
///
/// # Errors
///
/// Returns an error on SQLite failure.
pub fn upsert_progress(conn: &Connection, progress: &AchievementProgress) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO achievement_progress (
            entity_id, achievement_id, current, target, percentage, unlocked, unlocked_at_us
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT (entity_id, achievement_id) DO UPDATE SET
            current = excluded.current,
            target = excluded.target,
            percentage = excluded.percentage,
            unlocked = excluded.unlocked,
            unlocked_at_us = excluded.unlocked_at_us",
        params![
            progress.entity_id,
            progress.achievement_id,
            progress.current,
            progress.target,
            progress.percentage,
            i64::from(progress.unlocked),
            progress.unlocked_at_us,
        ],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// XP state
// ---------------------------------------------------------------------------

/// Load one entity's XP/level state, `None` when absent.
///
/// # Errors
///
/// Returns an error on SQLite failure.
pub fn get_xp_state(conn: &Connection, entity_id: &str) -> Result<Option<XpLevelState>, StoreError> {
    let state = conn
        .query_row(
            "SELECT xp_from_activities, xp_from_achievements, total_xp, level, title
             FROM xp_state WHERE entity_id = ?1",
            params![entity_id],
            |row| {
                Ok(XpLevelState {
                    entity_id: entity_id.to_string(),
                    xp_from_activities: row.get::<_, i64>(0)?.unsigned_abs(),
                    xp_from_achievements: row.get::<_, i64>(1)?.unsigned_abs(),
                    total_xp: row.get::<_, i64>(2)?.unsigned_abs(),
                    level: row.get(3)?,
                    title: row.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(state)
}

/// Persist one entity's XP/level state.
///
/// # Errors
///
/// Returns an error on SQLite failure.
pub fn upsert_xp_state(conn: &Connection, state: &XpLevelState) -> Result<(), StoreError> {
    let activities = i64::try_from(state.xp_from_activities)
        .map_err(|_| StoreError::Corrupt("xp_from_activities overflow".to_string()))?;
    let achievements = i64::try_from(state.xp_from_achievements)
        .map_err(|_| StoreError::Corrupt("xp_from_achievements overflow".to_string()))?;
    let total = i64::try_from(state.total_xp)
        .map_err(|_| StoreError::Corrupt("total_xp overflow".to_string()))?;

    conn.execute(
        "INSERT INTO xp_state (
            entity_id, xp_from_activities, xp_from_achievements, total_xp, level, title
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT (entity_id) DO UPDATE SET
            xp_from_activities = excluded.xp_from_activities,
            xp_from_achievements = excluded.xp_from_achievements,
            total_xp = excluded.total_xp,
            level = excluded.level,
            title = excluded.title",
        params![state.entity_id, activities, achievements, total, state.level, state.title],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::model::record::CanonicalStatus;
    use crate::model::snapshot::DailySnapshot;
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 1).expect("valid date")
    }

    fn scope(kind: AuditKind) -> BatchScope {
        BatchScope {
            store_id: "st-001".to_string(),
            audit_date: day(),
            audit_kind: kind,
        }
    }

    fn record(user: &str, kind: AuditKind, status: CanonicalStatus) -> AuditRecord {
        AuditRecord {
            entity_user_id: user.to_string(),
            store_id: "st-001".to_string(),
            audit_kind: kind,
            canonical_status: status,
            product_class: "dairy".to_string(),
            location: "aisle-1".to_string(),
            stock_qty: 3,
            cost: None,
            recorded_at_us: 1_000,
        }
    }

    #[test]
    fn replace_batch_supersedes_prior_rows() -> Result<(), StoreError> {
        let conn = open_in_memory().expect("open store");
        let scope = scope(AuditKind::Label);

        let first = vec![
            record("u-1", AuditKind::Label, CanonicalStatus::Updated),
            record("u-1", AuditKind::Label, CanonicalStatus::Outdated),
        ];
        replace_batch(&conn, &scope, "batch-a", &first, 10)?;

        let second = vec![record("u-2", AuditKind::Label, CanonicalStatus::Updated)];
        replace_batch(&conn, &scope, "batch-b", &second, 20)?;

        let loaded = load_store_day_records(&conn, "st-001", day())?;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].entity_user_id, "u-2");
        assert_eq!(batch_id_for_scope(&conn, &scope)?, Some("batch-b".to_string()));

        Ok(())
    }

    #[test]
    fn replace_batch_leaves_other_kinds_alone() -> Result<(), StoreError> {
        let conn = open_in_memory().expect("open store");

        replace_batch(
            &conn,
            &scope(AuditKind::Label),
            "batch-a",
            &[record("u-1", AuditKind::Label, CanonicalStatus::Updated)],
            10,
        )?;
        replace_batch(
            &conn,
            &scope(AuditKind::Presence),
            "batch-b",
            &[record("u-1", AuditKind::Presence, CanonicalStatus::WithProblem)],
            11,
        )?;

        // Replacing the label batch must not touch presence rows.
        replace_batch(&conn, &scope(AuditKind::Label), "batch-c", &[], 12)?;

        let loaded = load_store_day_records(&conn, "st-001", day())?;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].audit_kind, AuditKind::Presence);

        Ok(())
    }

    #[test]
    fn snapshot_insert_then_cas_update() -> Result<(), StoreError> {
        let conn = open_in_memory().expect("open store");
        let mut snapshot = DailySnapshot::empty("st-001", EntityClass::Store, day());

        assert_eq!(snapshot_version(&conn, "st-001", day())?, None);
        let v1 = upsert_snapshot(&conn, &snapshot, None, 10)?;
        assert_eq!(v1, 1);

        snapshot.composite_score = 88;
        let v2 = upsert_snapshot(&conn, &snapshot, Some(1), 20)?;
        assert_eq!(v2, 2);
        assert_eq!(snapshot_version(&conn, "st-001", day())?, Some(2));

        let loaded = get_snapshot(&conn, "st-001", day())?.expect("snapshot exists");
        assert_eq!(loaded.composite_score, 88);

        Ok(())
    }

    #[test]
    fn stale_version_is_a_conflict_not_an_overwrite() -> Result<(), StoreError> {
        let conn = open_in_memory().expect("open store");
        let mut snapshot = DailySnapshot::empty("st-001", EntityClass::Store, day());

        upsert_snapshot(&conn, &snapshot, None, 10)?;
        snapshot.composite_score = 50;
        upsert_snapshot(&conn, &snapshot, Some(1), 20)?;

        // A recompute still holding version 1 must lose.
        snapshot.composite_score = 99;
        let err = upsert_snapshot(&conn, &snapshot, Some(1), 30).expect_err("stale write");
        assert!(matches!(err, StoreError::VersionConflict { .. }));

        let loaded = get_snapshot(&conn, "st-001", day())?.expect("snapshot exists");
        assert_eq!(loaded.composite_score, 50);

        Ok(())
    }

    #[test]
    fn duplicate_insert_is_a_conflict() -> Result<(), StoreError> {
        let conn = open_in_memory().expect("open store");
        let snapshot = DailySnapshot::empty("st-001", EntityClass::Store, day());

        upsert_snapshot(&conn, &snapshot, None, 10)?;
        let err = upsert_snapshot(&conn, &snapshot, None, 20).expect_err("duplicate insert");
        assert!(matches!(err, StoreError::VersionConflict { .. }));

        Ok(())
    }

    #[test]
    fn rank_history_round_trips() -> Result<(), StoreError> {
        let conn = open_in_memory().expect("open store");

        let mut history = RankHistory::new("st-001", EntityClass::Store);
        history.record_position(1);
        history.record_position(12);
        upsert_rank_history(&conn, &history)?;

        let loaded = get_rank_history(&conn, "st-001")?.expect("history exists");
        assert_eq!(loaded, history);
        assert_eq!(get_rank_history(&conn, "st-404")?, None);

        Ok(())
    }

    #[test]
    fn progress_and_xp_round_trip() -> Result<(), StoreError> {
        let conn = open_in_memory().expect("open store");

        let mut progress = AchievementProgress::locked("u-1", "first-update", 1.0);
        progress.current = 1.0;
        progress.percentage = 100.0;
        progress.unlocked = true;
        progress.unlocked_at_us = Some(42);
        upsert_progress(&conn, &progress)?;

        let loaded = load_progress(&conn, "u-1")?;
        assert_eq!(loaded, vec![progress]);

        let state = XpLevelState {
            entity_id: "u-1".to_string(),
            xp_from_activities: 7,
            xp_from_achievements: 50,
            total_xp: 57,
            level: 1,
            title: "Rookie".to_string(),
        };
        upsert_xp_state(&conn, &state)?;
        assert_eq!(get_xp_state(&conn, "u-1")?, Some(state));

        Ok(())
    }

    #[test]
    fn users_for_store_day_is_distinct_and_sorted() -> Result<(), StoreError> {
        let conn = open_in_memory().expect("open store");
        let records = vec![
            record("u-2", AuditKind::Label, CanonicalStatus::Updated),
            record("u-1", AuditKind::Label, CanonicalStatus::Updated),
            record("u-2", AuditKind::Label, CanonicalStatus::Outdated),
        ];
        replace_batch(&conn, &scope(AuditKind::Label), "batch-a", &records, 10)?;

        let users = users_for_store_day(&conn, "st-001", day())?;
        assert_eq!(users, vec!["u-1".to_string(), "u-2".to_string()]);

        Ok(())
    }
}
