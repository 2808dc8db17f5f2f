//! Daily leaderboards.
//!
//! Ranking is recomputed from the full set of snapshots for a day, never
//! incrementally: every recompute of any scope on that day re-sorts the
//! whole board, so positions are always consistent with the stored scores.

use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::debug;

use shelf_core::db::query::{
    self, StoreError, snapshot_version, snapshots_for_day, upsert_snapshot,
};
use shelf_core::model::record::EntityClass;
use shelf_core::model::snapshot::{RankHistory, RankingRow};

/// Sort `(entity_id, score)` pairs into a 1-based leaderboard.
///
/// Higher score wins; ties break on ascending entity id so two runs over
/// the same data always produce the same board. Ties still occupy distinct
/// positions.
#[must_use]
pub fn rank_scores(mut scores: Vec<(String, i64)>) -> Vec<RankingRow> {
    scores.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    scores
        .into_iter()
        .enumerate()
        .map(|(idx, (entity_id, composite_score))| RankingRow {
            entity_id,
            position: u32::try_from(idx + 1).unwrap_or(u32::MAX),
            composite_score,
        })
        .collect()
}

/// Read one day's leaderboard without touching persisted state.
pub fn ranking_for_day(
    conn: &Connection,
    date: NaiveDate,
    entity_class: EntityClass,
) -> Result<Vec<RankingRow>, StoreError> {
    let snapshots = snapshots_for_day(conn, date, entity_class)?;
    Ok(rank_scores(
        snapshots
            .into_iter()
            .map(|snapshot| (snapshot.entity_id, snapshot.composite_score))
            .collect(),
    ))
}

/// Re-sort one day's leaderboard for an entity class and persist the
/// positions back into each snapshot and its rank history.
///
/// Must run inside the caller's transaction so position updates land
/// atomically with the snapshots they rank.
pub fn rerank_day(
    conn: &Connection,
    date: NaiveDate,
    entity_class: EntityClass,
    now_us: i64,
) -> Result<Vec<RankingRow>, StoreError> {
    let snapshots = snapshots_for_day(conn, date, entity_class)?;
    let rows = rank_scores(
        snapshots
            .iter()
            .map(|snapshot| (snapshot.entity_id.clone(), snapshot.composite_score))
            .collect(),
    );

    for row in &rows {
        let mut snapshot = snapshots
            .iter()
            .find(|candidate| candidate.entity_id == row.entity_id)
            .cloned()
            .ok_or_else(|| StoreError::Corrupt("ranked entity vanished mid-sort".to_string()))?;

        if snapshot.rank_position != Some(row.position) {
            snapshot.rank_position = Some(row.position);
            let expected = snapshot_version(conn, &snapshot.entity_id, date)?;
            upsert_snapshot(conn, &snapshot, expected, now_us)?;
        }

        let mut history = query::get_rank_history(conn, &row.entity_id)?
            .unwrap_or_else(|| RankHistory::new(row.entity_id.clone(), entity_class));
        history.record_position(row.position);
        query::upsert_rank_history(conn, &history)?;
    }

    debug!(
        date = %date,
        entity_class = entity_class.as_str(),
        entries = rows.len(),
        "reranked leaderboard"
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(pairs: &[(&str, i64)]) -> Vec<(String, i64)> {
        pairs
            .iter()
            .map(|(id, score)| ((*id).to_string(), *score))
            .collect()
    }

    #[test]
    fn ranks_descend_by_score() {
        let rows = rank_scores(scores(&[("st-b", 40), ("st-a", 90), ("st-c", 70)]));
        let order: Vec<&str> = rows.iter().map(|row| row.entity_id.as_str()).collect();
        assert_eq!(order, ["st-a", "st-c", "st-b"]);
        assert_eq!(rows[0].position, 1);
        assert_eq!(rows[2].position, 3);
    }

    #[test]
    fn ties_break_on_entity_id() {
        let rows = rank_scores(scores(&[("st-z", 50), ("st-a", 50), ("st-m", 50)]));
        let order: Vec<&str> = rows.iter().map(|row| row.entity_id.as_str()).collect();
        assert_eq!(order, ["st-a", "st-m", "st-z"]);
        // Ties do not share a position.
        let positions: Vec<u32> = rows.iter().map(|row| row.position).collect();
        assert_eq!(positions, [1, 2, 3]);
    }

    #[test]
    fn empty_board_ranks_nothing() {
        assert!(rank_scores(Vec::new()).is_empty());
    }

    #[test]
    fn ranking_is_deterministic_across_input_order() {
        let forward = rank_scores(scores(&[("u-1", 10), ("u-2", 20), ("u-3", 20)]));
        let reversed = rank_scores(scores(&[("u-3", 20), ("u-2", 20), ("u-1", 10)]));
        assert_eq!(forward, reversed);
    }
}
