//! Engine configuration.
//!
//! All tunable behavior lives in `shelf.toml` inside the data directory:
//! store composite-score weights, user XP weights and multi-kind bonuses,
//! the XP level ladder, and the achievement definition table. A missing
//! file means full defaults; a malformed file is a hard error.
//!
//! The achievement table is loaded once at process start and injected into
//! the rule engine; rules are identified by their stable string `id`.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::model::achievement::{
    AchievementCriteria, AchievementDefinition, CriteriaKind, CriteriaPeriod,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub score: ScoreConfig,
    #[serde(default)]
    pub xp: XpConfig,
    #[serde(default = "default_achievements")]
    pub achievements: Vec<AchievementDefinition>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            score: ScoreConfig::default(),
            xp: XpConfig::default(),
            achievements: default_achievements(),
        }
    }
}

/// Store composite-score weights: completion, quality, productivity,
/// consistency. The shipped defaults are the contract values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreConfig {
    #[serde(default = "default_completion_weight")]
    pub completion_weight: f64,
    #[serde(default = "default_quality_weight")]
    pub quality_weight: f64,
    #[serde(default = "default_productivity_weight")]
    pub productivity_weight: f64,
    #[serde(default = "default_consistency_weight")]
    pub consistency_weight: f64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            completion_weight: default_completion_weight(),
            quality_weight: default_quality_weight(),
            productivity_weight: default_productivity_weight(),
            consistency_weight: default_consistency_weight(),
        }
    }
}

/// User XP weights, multi-kind bonuses, and the level ladder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XpConfig {
    #[serde(default = "default_label_weight")]
    pub label_weight: f64,
    #[serde(default = "default_stockout_weight")]
    pub stockout_weight: f64,
    #[serde(default = "default_presence_weight")]
    pub presence_weight: f64,
    /// Applied when a user worked exactly two kinds in one day.
    #[serde(default = "default_two_kind_multiplier")]
    pub two_kind_multiplier: f64,
    /// Applied when a user worked all three kinds; mutually exclusive with
    /// the two-kind bonus (the higher one wins).
    #[serde(default = "default_all_kind_multiplier")]
    pub all_kind_multiplier: f64,
    #[serde(default = "default_levels")]
    pub levels: Vec<LevelTier>,
}

impl Default for XpConfig {
    fn default() -> Self {
        Self {
            label_weight: default_label_weight(),
            stockout_weight: default_stockout_weight(),
            presence_weight: default_presence_weight(),
            two_kind_multiplier: default_two_kind_multiplier(),
            all_kind_multiplier: default_all_kind_multiplier(),
            levels: default_levels(),
        }
    }
}

/// One rung of the XP ladder. `min_xp` must be strictly increasing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelTier {
    pub level: u32,
    pub title: String,
    pub min_xp: u64,
}

/// Load `shelf.toml` from the data directory, falling back to defaults when
/// the file does not exist.
///
/// # Errors
///
/// Returns an error when the file exists but cannot be read, parsed, or
/// fails validation.
pub fn load_config(data_dir: &Path) -> Result<EngineConfig> {
    let path = data_dir.join("shelf.toml");
    if !path.exists() {
        return Ok(EngineConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config: EngineConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    validate(&config)?;
    Ok(config)
}

/// Reject configurations the engine cannot evaluate coherently.
///
/// # Errors
///
/// Returns an error on an empty or non-monotonic level ladder, duplicate
/// achievement ids, or non-positive rule targets.
pub fn validate(config: &EngineConfig) -> Result<()> {
    if config.xp.levels.is_empty() {
        bail!("xp.levels must contain at least one tier");
    }
    for window in config.xp.levels.windows(2) {
        if window[1].min_xp <= window[0].min_xp || window[1].level <= window[0].level {
            bail!(
                "xp.levels must be strictly increasing: level {} (min_xp {}) follows level {} (min_xp {})",
                window[1].level,
                window[1].min_xp,
                window[0].level,
                window[0].min_xp
            );
        }
    }

    let mut seen = HashSet::new();
    for def in &config.achievements {
        if !seen.insert(def.id.as_str()) {
            bail!("duplicate achievement id: {}", def.id);
        }
        if def.criteria.target <= 0.0 {
            bail!("achievement {} has non-positive target", def.id);
        }
    }

    Ok(())
}

const fn default_completion_weight() -> f64 {
    0.4
}

const fn default_quality_weight() -> f64 {
    0.3
}

const fn default_productivity_weight() -> f64 {
    0.2
}

const fn default_consistency_weight() -> f64 {
    0.1
}

const fn default_label_weight() -> f64 {
    1.0
}

const fn default_stockout_weight() -> f64 {
    1.5
}

const fn default_presence_weight() -> f64 {
    1.2
}

const fn default_two_kind_multiplier() -> f64 {
    1.1
}

const fn default_all_kind_multiplier() -> f64 {
    1.2
}

fn default_levels() -> Vec<LevelTier> {
    let tiers = [
        (1, "Rookie", 0),
        (2, "Apprentice", 100),
        (3, "Auditor", 250),
        (4, "Specialist", 500),
        (5, "Expert", 1_000),
        (6, "Veteran", 2_000),
        (7, "Elite", 3_500),
        (8, "Master", 5_500),
        (9, "Grandmaster", 8_000),
        (10, "Legend", 12_000),
    ];
    tiers
        .into_iter()
        .map(|(level, title, min_xp)| LevelTier {
            level,
            title: title.to_string(),
            min_xp,
        })
        .collect()
}

fn count_rule(
    id: &str,
    category: &str,
    difficulty: &str,
    points_xp: u64,
    target: f64,
    source_field: &str,
) -> AchievementDefinition {
    AchievementDefinition {
        id: id.to_string(),
        category: category.to_string(),
        difficulty: difficulty.to_string(),
        points_xp,
        criteria: AchievementCriteria {
            kind: CriteriaKind::Count,
            target,
            source_field: source_field.to_string(),
            period: Some(CriteriaPeriod::Lifetime),
        },
    }
}

fn default_achievements() -> Vec<AchievementDefinition> {
    vec![
        count_rule(
            "first-update",
            "starter",
            "bronze",
            50,
            1.0,
            "lifetime_items_updated",
        ),
        count_rule(
            "shelf-centurion",
            "volume",
            "silver",
            250,
            100.0,
            "lifetime_items_read",
        ),
        count_rule(
            "update-machine",
            "volume",
            "gold",
            500,
            500.0,
            "lifetime_items_updated",
        ),
        count_rule(
            "regular",
            "consistency",
            "silver",
            350,
            30.0,
            "active_days",
        ),
        AchievementDefinition {
            id: "week-on-shelf".to_string(),
            category: "consistency".to_string(),
            difficulty: "silver".to_string(),
            points_xp: 300,
            criteria: AchievementCriteria {
                kind: CriteriaKind::Streak,
                target: 7.0,
                source_field: "active_day_streak".to_string(),
                period: Some(CriteriaPeriod::Daily),
            },
        },
        AchievementDefinition {
            id: "completionist".to_string(),
            category: "quality".to_string(),
            difficulty: "gold".to_string(),
            points_xp: 400,
            criteria: AchievementCriteria {
                kind: CriteriaKind::Percentage,
                target: 95.0,
                source_field: "best_daily_completion_pct".to_string(),
                period: Some(CriteriaPeriod::Lifetime),
            },
        },
        AchievementDefinition {
            id: "zero-rupture-day".to_string(),
            category: "quality".to_string(),
            difficulty: "bronze".to_string(),
            points_xp: 150,
            criteria: AchievementCriteria {
                kind: CriteriaKind::Custom,
                target: 1.0,
                source_field: String::new(),
                period: Some(CriteriaPeriod::Daily),
            },
        },
        AchievementDefinition {
            id: "top-of-the-pile".to_string(),
            category: "ranking".to_string(),
            difficulty: "gold".to_string(),
            points_xp: 200,
            criteria: AchievementCriteria {
                kind: CriteriaKind::Custom,
                target: 1.0,
                source_field: String::new(),
                period: Some(CriteriaPeriod::Daily),
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn make_temp_dir(label: &str) -> std::path::PathBuf {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!("shelf-config-test-{label}-{id}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("temp dir must be created");
        dir
    }

    #[test]
    fn missing_config_uses_contract_defaults() {
        let dir = make_temp_dir("defaults");
        let cfg = load_config(&dir).expect("load should succeed");

        assert!((cfg.score.completion_weight - 0.4).abs() < f64::EPSILON);
        assert!((cfg.score.quality_weight - 0.3).abs() < f64::EPSILON);
        assert!((cfg.xp.stockout_weight - 1.5).abs() < f64::EPSILON);
        assert!((cfg.xp.all_kind_multiplier - 1.2).abs() < f64::EPSILON);
        assert_eq!(cfg.xp.levels.len(), 10);
        assert_eq!(cfg.xp.levels[0].title, "Rookie");
        assert!(!cfg.achievements.is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn default_config_passes_validation() {
        validate(&EngineConfig::default()).expect("defaults must validate");
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let dir = make_temp_dir("partial");
        std::fs::write(
            dir.join("shelf.toml"),
            "[xp]\nstockout_weight = 2.0\n",
        )
        .expect("write config");

        let cfg = load_config(&dir).expect("load should succeed");
        assert!((cfg.xp.stockout_weight - 2.0).abs() < f64::EPSILON);
        assert!((cfg.xp.label_weight - 1.0).abs() < f64::EPSILON);
        assert!((cfg.score.completion_weight - 0.4).abs() < f64::EPSILON);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn non_monotonic_ladder_is_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.xp.levels[3].min_xp = cfg.xp.levels[2].min_xp;
        let err = validate(&cfg).expect_err("ladder must be strictly increasing");
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn duplicate_achievement_ids_are_rejected() {
        let mut cfg = EngineConfig::default();
        let dup = cfg.achievements[0].clone();
        cfg.achievements.push(dup);
        let err = validate(&cfg).expect_err("duplicate ids must fail");
        assert!(err.to_string().contains("duplicate achievement id"));
    }

    #[test]
    fn malformed_config_is_a_hard_error() {
        let dir = make_temp_dir("malformed");
        std::fs::write(dir.join("shelf.toml"), "[[xp").expect("write config");
        assert!(load_config(&dir).is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn custom_achievement_table_replaces_defaults() {
        let dir = make_temp_dir("achievements");
        let toml_src = r#"
[[achievements]]
id = "only-one"
category = "custom"
difficulty = "bronze"
points_xp = 10

[achievements.criteria]
kind = "count"
target = 3.0
source_field = "active_days"
"#;
        std::fs::write(dir.join("shelf.toml"), toml_src).expect("write config");

        let cfg = load_config(&dir).expect("load should succeed");
        assert_eq!(cfg.achievements.len(), 1);
        assert_eq!(cfg.achievements[0].id, "only-one");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
