use anyhow::Result;
use clap::Args;
use std::path::Path;

use shelf_core::db::query;
use shelf_core::model::achievement::XpLevelState;

use crate::output::{OutputMode, kv, render, section};

#[derive(Args, Debug)]
pub struct XpArgs {
    /// User entity id.
    pub entity_id: String,
}

/// Execute `shelf xp`: show XP totals and level for one user.
pub fn run_xp(args: &XpArgs, data_dir: &Path, mode: OutputMode) -> Result<()> {
    let conn = super::open_initialized(data_dir)?;
    let state = query::get_xp_state(&conn, &args.entity_id)?
        .unwrap_or_else(|| XpLevelState::new(args.entity_id.clone()));

    render(mode, &state, |state, w| {
        section(w, &format!("XP for {}", state.entity_id))?;
        kv(w, "level", state.level.to_string())?;
        kv(w, "title", &state.title)?;
        kv(w, "total_xp", state.total_xp.to_string())?;
        kv(w, "from_activities", state.xp_from_activities.to_string())?;
        kv(w, "from_achievements", state.xp_from_achievements.to_string())
    })
}
