use anyhow::Result;
use clap::{Args, ValueEnum};
use std::path::Path;

use shelf_core::model::record::EntityClass;
use shelf_engine::rank::ranking_for_day;

use crate::output::{OutputMode, render, section};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClassArg {
    Store,
    User,
}

impl From<ClassArg> for EntityClass {
    fn from(value: ClassArg) -> Self {
        match value {
            ClassArg::Store => Self::Store,
            ClassArg::User => Self::User,
        }
    }
}

#[derive(Args, Debug)]
pub struct RankingArgs {
    /// Leaderboard date, `YYYY-MM-DD`.
    #[arg(long)]
    pub date: String,

    /// Which leaderboard to show.
    #[arg(long, value_enum, default_value_t = ClassArg::Store)]
    pub class: ClassArg,
}

/// Execute `shelf ranking`: show one day's leaderboard.
pub fn run_ranking(args: &RankingArgs, data_dir: &Path, mode: OutputMode) -> Result<()> {
    let date = super::parse_date(&args.date)?;
    let conn = super::open_initialized(data_dir)?;
    let rows = ranking_for_day(&conn, date, args.class.into())?;

    render(mode, &rows, |rows, w| {
        section(w, &format!("Leaderboard for {date}"))?;
        if rows.is_empty() {
            writeln!(w, "  (no snapshots for this day)")?;
        }
        for row in rows {
            writeln!(
                w,
                "  #{:<4} {:<24} {}",
                row.position, row.entity_id, row.composite_score
            )?;
        }
        Ok(())
    })
}
