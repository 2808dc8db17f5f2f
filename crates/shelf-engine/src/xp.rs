//! XP accumulation and level ladder lookup.
//!
//! Activity XP is one point per item read, summed over the snapshot
//! history; achievement XP is the sum of unlocked rule rewards. Both are
//! derived from persisted state on every recompute, so the totals stay
//! correct under re-ingestion.

use rusqlite::Connection;

use shelf_core::config::{LevelTier, XpConfig};
use shelf_core::db::query::{self, StoreError};
use shelf_core::model::achievement::XpLevelState;

/// Resolve the highest ladder tier whose `min_xp` the total reaches.
///
/// The ladder is validated non-empty and strictly increasing at config
/// load, so the first tier always matches.
#[must_use]
pub fn tier_for_xp(levels: &[LevelTier], total_xp: u64) -> &LevelTier {
    levels
        .iter()
        .rev()
        .find(|tier| total_xp >= tier.min_xp)
        .unwrap_or(&levels[0])
}

/// Activity XP for one entity: one XP per item read, summed over the
/// snapshot history.
pub fn activity_xp(conn: &Connection, entity_id: &str) -> Result<u64, StoreError> {
    let history = query::snapshot_history(conn, entity_id)?;
    Ok(history.iter().map(|snapshot| snapshot.items_read).sum())
}

/// Recompute and persist the XP/level state for one entity.
pub fn refresh_xp_state(
    conn: &Connection,
    xp: &XpConfig,
    entity_id: &str,
    achievement_xp: u64,
) -> Result<XpLevelState, StoreError> {
    let from_activities = activity_xp(conn, entity_id)?;

    let mut state = XpLevelState::new(entity_id);
    state.xp_from_activities = from_activities;
    state.xp_from_achievements = achievement_xp;
    state.total_xp = from_activities + achievement_xp;

    let tier = tier_for_xp(&xp.levels, state.total_xp);
    state.level = tier.level;
    state.title.clone_from(&tier.title);

    let previous = query::get_xp_state(conn, entity_id)?;
    if previous.as_ref().is_none_or(|prev| state.level > prev.level) && state.level > 1 {
        tracing::info!(
            entity_id,
            level = state.level,
            title = state.title.as_str(),
            total_xp = state.total_xp,
            "level up"
        );
    }

    query::upsert_xp_state(conn, &state)?;
    Ok(state)
}
