//! Declarative achievement rules.
//!
//! Rules come from the config table and are evaluated against the derived
//! metric catalog after every recompute. Evaluation is fault-isolated per
//! rule: one broken rule surfaces a problem and the rest still run.
//! Unlocks are permanent; re-evaluating an unlocked rule only refreshes its
//! progress numbers.

pub mod source;

pub use source::MetricSource;

use rusqlite::Connection;
use tracing::{info, warn};

use shelf_core::config::EngineConfig;
use shelf_core::db::query::{self, StoreError};
use shelf_core::error::{EngineProblem, ErrorCode};
use shelf_core::model::achievement::{AchievementDefinition, AchievementProgress, CriteriaKind};

/// Result of evaluating all rules for one entity.
#[derive(Debug, Clone, Default)]
pub struct AchievementOutcome {
    pub progress: Vec<AchievementProgress>,
    /// Ids that flipped to unlocked during this evaluation.
    pub newly_unlocked: Vec<String>,
    /// Total XP across every unlocked achievement, not just new ones.
    pub unlocked_xp: u64,
    pub problems: Vec<EngineProblem>,
}

/// Evaluate every configured rule for `entity_id` and persist the updated
/// progress rows.
///
/// # Errors
///
/// Fails only on storage errors; individual rule failures are collected
/// into `problems`.
pub fn evaluate_achievements(
    conn: &Connection,
    config: &EngineConfig,
    entity_id: &str,
    now_us: i64,
) -> Result<AchievementOutcome, StoreError> {
    let metrics = MetricSource::collect(conn, entity_id)?;
    let stored = query::load_progress(conn, entity_id)?;
    let mut outcome = AchievementOutcome::default();

    for def in &config.achievements {
        let previous = stored
            .iter()
            .find(|row| row.achievement_id == def.id)
            .cloned()
            .unwrap_or_else(|| {
                AchievementProgress::locked(entity_id, def.id.clone(), def.criteria.target)
            });

        let mut progress = match evaluate_rule(def, &metrics, previous) {
            Ok(progress) => progress,
            Err(problem) => {
                warn!(
                    achievement = def.id.as_str(),
                    code = %problem.code,
                    detail = problem.detail.as_str(),
                    "skipping unevaluable achievement rule"
                );
                outcome.problems.push(problem);
                continue;
            }
        };

        if progress.unlocked && progress.unlocked_at_us.is_none() {
            progress.unlocked_at_us = Some(now_us);
            outcome.newly_unlocked.push(def.id.clone());
            info!(
                entity_id,
                achievement = def.id.as_str(),
                points_xp = def.points_xp,
                "achievement unlocked"
            );
        }
        if progress.unlocked {
            outcome.unlocked_xp += def.points_xp;
        }

        query::upsert_progress(conn, &progress)?;
        outcome.progress.push(progress);
    }

    Ok(outcome)
}

/// Evaluate a single rule against the metric catalog.
///
/// `previous` carries the monotonicity guarantees forward: `current` never
/// decreases and an unlocked rule stays unlocked.
fn evaluate_rule(
    def: &AchievementDefinition,
    metrics: &MetricSource,
    previous: AchievementProgress,
) -> Result<AchievementProgress, EngineProblem> {
    let mut measured = match def.criteria.kind {
        CriteriaKind::Count | CriteriaKind::Percentage | CriteriaKind::Streak => metrics
            .field(&def.criteria.source_field)
            .ok_or_else(|| {
                EngineProblem::new(
                    ErrorCode::RuleSourceMissing,
                    format!(
                        "achievement {} references unknown metric {:?}",
                        def.id, def.criteria.source_field
                    ),
                )
            })?,
        CriteriaKind::Custom => custom_rule_value(def, metrics)?,
    };

    // Percentage rules cap at their own target, not at 100.
    if matches!(def.criteria.kind, CriteriaKind::Percentage) {
        measured = measured.min(def.criteria.target);
    }

    let mut progress = previous;
    progress.target = def.criteria.target;
    progress.current = progress.current.max(measured);
    progress.percentage = if def.criteria.target > 0.0 {
        (progress.current / def.criteria.target * 100.0).min(100.0)
    } else {
        0.0
    };
    if progress.current >= def.criteria.target {
        progress.unlocked = true;
    }
    Ok(progress)
}

/// Engine predicates for rules the declarative catalog cannot express.
/// Keyed by achievement id; an unknown id is a rule-source problem.
fn custom_rule_value(
    def: &AchievementDefinition,
    metrics: &MetricSource,
) -> Result<f64, EngineProblem> {
    let satisfied = match def.id.as_str() {
        "zero-rupture-day" => metrics.latest_day_zero_shortage(),
        "top-of-the-pile" => metrics.ever_ranked_first(),
        other => {
            return Err(EngineProblem::new(
                ErrorCode::RuleSourceMissing,
                format!("no custom predicate registered for achievement {other}"),
            ));
        }
    };
    Ok(if satisfied { 1.0 } else { 0.0 })
}
