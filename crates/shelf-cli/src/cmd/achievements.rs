use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::Path;

use shelf_core::config;
use shelf_core::db::query;

use crate::output::{OutputMode, render, section};

#[derive(Args, Debug)]
pub struct AchievementsArgs {
    /// User entity id.
    pub entity_id: String,

    /// Only show unlocked achievements.
    #[arg(long)]
    pub unlocked: bool,
}

#[derive(Debug, Serialize)]
struct AchievementRow {
    id: String,
    category: String,
    difficulty: String,
    points_xp: u64,
    current: f64,
    target: f64,
    percentage: f64,
    unlocked: bool,
}

/// Execute `shelf achievements`: show rule progress for one user.
pub fn run_achievements(args: &AchievementsArgs, data_dir: &Path, mode: OutputMode) -> Result<()> {
    let config = config::load_config(data_dir)?;
    let conn = super::open_initialized(data_dir)?;
    let progress = query::load_progress(&conn, &args.entity_id)?;

    let mut rows = Vec::new();
    for def in &config.achievements {
        let state = progress.iter().find(|p| p.achievement_id == def.id);
        let row = AchievementRow {
            id: def.id.clone(),
            category: def.category.clone(),
            difficulty: def.difficulty.clone(),
            points_xp: def.points_xp,
            current: state.map_or(0.0, |p| p.current),
            target: def.criteria.target,
            percentage: state.map_or(0.0, |p| p.percentage),
            unlocked: state.is_some_and(|p| p.unlocked),
        };
        if !args.unlocked || row.unlocked {
            rows.push(row);
        }
    }

    render(mode, &rows, |rows, w| {
        section(w, &format!("Achievements for {}", args.entity_id))?;
        for row in rows {
            let marker = if row.unlocked { "x" } else { " " };
            writeln!(
                w,
                "  [{marker}] {:<20} {:<12} {:>5.1}%  ({:.0}/{:.0}, {} XP)",
                row.id, row.difficulty, row.percentage, row.current, row.target, row.points_xp
            )?;
        }
        Ok(())
    })
}
