use anyhow::{Result, bail};
use clap::Args;
use std::path::Path;

use shelf_core::db::query;
use shelf_core::error::ErrorCode;
use shelf_core::model::snapshot::DailySnapshot;

use crate::output::{OutputMode, kv, render, rule, section};

#[derive(Args, Debug)]
pub struct SnapshotArgs {
    /// Store or user entity id.
    pub entity_id: String,

    /// Snapshot date, `YYYY-MM-DD`.
    #[arg(long)]
    pub date: String,
}

/// Execute `shelf snapshot`: show one entity-day snapshot.
pub fn run_snapshot(args: &SnapshotArgs, data_dir: &Path, mode: OutputMode) -> Result<()> {
    let date = super::parse_date(&args.date)?;
    let conn = super::open_initialized(data_dir)?;

    let Some(snapshot) = query::get_snapshot(&conn, &args.entity_id, date)? else {
        let code = ErrorCode::SnapshotNotFound;
        bail!(
            "{}: no snapshot for {} on {} ({})",
            code.code(),
            args.entity_id,
            date,
            code.hint().unwrap_or("ingest a batch for this scope first")
        );
    };

    render(mode, &snapshot, print_snapshot)
}

fn print_snapshot(snapshot: &DailySnapshot, w: &mut dyn std::io::Write) -> std::io::Result<()> {
    section(
        w,
        &format!("{} on {}", snapshot.entity_id, snapshot.snapshot_date),
    )?;
    kv(w, "class", snapshot.entity_class.as_str())?;
    kv(w, "composite_score", snapshot.composite_score.to_string())?;
    if let Some(note) = snapshot.quality_note {
        kv(w, "quality_note", note.to_string())?;
    }
    if let Some(position) = snapshot.rank_position {
        kv(w, "rank", format!("#{position}"))?;
    }
    kv(w, "total_items", snapshot.total_items.to_string())?;
    kv(w, "items_read", snapshot.items_read.to_string())?;
    kv(w, "items_updated", snapshot.items_updated.to_string())?;
    kv(
        w,
        "completion",
        format!("{:.2}%", snapshot.overall_completion_pct),
    )?;

    for (kind, metrics) in &snapshot.kinds {
        rule(w)?;
        kv(w, "kind", kind.as_str())?;
        kv(
            w,
            "valid/read/updated",
            format!(
                "{}/{}/{}",
                metrics.valid_items, metrics.read_items, metrics.updated_items
            ),
        )?;
        kv(w, "completion", format!("{:.2}%", metrics.completion_pct))?;
        if let Some(cost) = metrics.total_stockout_cost {
            kv(w, "stockout_cost", format!("{cost:.2}"))?;
        }
        if let Some(confirmed) = metrics.confirmed_presence {
            kv(w, "confirmed_presence", confirmed.to_string())?;
        }
    }

    for alert in &snapshot.alerts {
        writeln!(w, "  alert: {alert}")?;
    }
    Ok(())
}
