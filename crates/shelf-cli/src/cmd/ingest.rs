use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};

use shelf_core::config;
use shelf_core::error::EngineProblem;
use shelf_core::model::record::{AuditKind, BatchScope};
use shelf_core::model::snapshot::RankingRow;
use shelf_engine::recompute::{RawAuditRow, recompute_scope};

use crate::output::{OutputMode, kv, render, section};

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Store the batch belongs to.
    #[arg(long)]
    pub store: String,

    /// Audit date, `YYYY-MM-DD`.
    #[arg(long)]
    pub date: String,

    /// Audit kind: `label`, `stockout`, or `presence`.
    #[arg(long)]
    pub kind: AuditKind,

    /// JSON file holding the batch rows (an array of objects).
    #[arg(long)]
    pub file: PathBuf,
}

#[derive(Debug, Serialize)]
struct IngestReport {
    success: bool,
    scope: String,
    rows: usize,
    composite_score: i64,
    rank_position: Option<u32>,
    overall_completion_pct: f64,
    users: Vec<String>,
    newly_unlocked: Vec<String>,
    ranking: Vec<RankingRow>,
    problems: Vec<EngineProblem>,
}

/// Execute `shelf ingest`: replace one scope's batch and recompute the
/// snapshots, leaderboards, achievements, and XP it touches.
pub fn run_ingest(args: &IngestArgs, data_dir: &Path, mode: OutputMode) -> Result<()> {
    let scope = BatchScope {
        store_id: args.store.clone(),
        audit_date: super::parse_date(&args.date)?,
        audit_kind: args.kind,
    };

    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("read batch file {}", args.file.display()))?;
    let rows: Vec<RawAuditRow> = serde_json::from_str(&raw)
        .with_context(|| format!("parse batch file {}", args.file.display()))?;

    let config = config::load_config(data_dir)?;
    let mut conn = super::open_initialized(data_dir)?;

    let outcome = recompute_scope(
        &mut conn,
        &config,
        data_dir,
        &scope,
        &rows,
        super::now_us(),
    )
    .with_context(|| format!("recompute scope {}", scope.key()))?;

    let report = IngestReport {
        success: outcome.success,
        scope: scope.key(),
        rows: rows.len(),
        composite_score: outcome.snapshot.composite_score,
        rank_position: outcome.snapshot.rank_position,
        overall_completion_pct: outcome.snapshot.overall_completion_pct,
        users: outcome
            .user_snapshots
            .iter()
            .map(|snapshot| snapshot.entity_id.clone())
            .collect(),
        newly_unlocked: outcome.newly_unlocked,
        ranking: outcome.ranking,
        problems: outcome.problems,
    };

    render(mode, &report, |report, w| {
        section(w, &format!("Ingested {}", report.scope))?;
        kv(w, "rows", report.rows.to_string())?;
        kv(w, "composite_score", report.composite_score.to_string())?;
        kv(
            w,
            "completion",
            format!("{:.2}%", report.overall_completion_pct),
        )?;
        if let Some(position) = report.rank_position {
            kv(w, "rank", format!("#{position}"))?;
        }
        if !report.newly_unlocked.is_empty() {
            kv(w, "unlocked", report.newly_unlocked.join(", "))?;
        }
        for problem in &report.problems {
            writeln!(w, "  warning {}: {}", problem.code, problem.detail)?;
        }
        Ok(())
    })
}
