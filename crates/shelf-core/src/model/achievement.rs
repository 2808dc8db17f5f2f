//! Achievement definitions, per-entity progress, and XP/level state.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// How an achievement criterion is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CriteriaKind {
    /// `current` is a plain measured count.
    Count,
    /// `current` is a measured percentage, capped at the rule target.
    Percentage,
    /// `current` tracks consecutive qualifying days.
    Streak,
    /// Engine predicate keyed by the achievement id.
    Custom,
}

impl CriteriaKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Percentage => "percentage",
            Self::Streak => "streak",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for CriteriaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown criteria kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid criteria kind: {0:?}")]
pub struct InvalidCriteriaKind(pub String);

impl FromStr for CriteriaKind {
    type Err = InvalidCriteriaKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "count" => Ok(Self::Count),
            "percentage" => Ok(Self::Percentage),
            "streak" => Ok(Self::Streak),
            "custom" => Ok(Self::Custom),
            other => Err(InvalidCriteriaKind(other.to_string())),
        }
    }
}

/// Measurement window for a criterion. Lifetime when omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CriteriaPeriod {
    Daily,
    Lifetime,
}

/// The measurable part of an achievement definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementCriteria {
    pub kind: CriteriaKind,
    pub target: f64,
    /// Path into the entity's cumulative metric catalog, e.g.
    /// `lifetime_items_updated` or `lifetime_items_read`. Empty for custom
    /// predicates, which are keyed by the achievement id instead.
    #[serde(default)]
    pub source_field: String,
    #[serde(default)]
    pub period: Option<CriteriaPeriod>,
}

/// One declarative achievement rule. Identity is the stable string `id`,
/// never a positional index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementDefinition {
    pub id: String,
    pub category: String,
    pub difficulty: String,
    pub points_xp: u64,
    pub criteria: AchievementCriteria,
}

/// Per-`(entity, achievement)` progress. `current` is monotonically
/// non-decreasing and `unlocked` never reverts to `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementProgress {
    pub entity_id: String,
    pub achievement_id: String,
    pub current: f64,
    pub target: f64,
    pub percentage: f64,
    pub unlocked: bool,
    /// Set exactly once, at the moment of unlock (epoch microseconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocked_at_us: Option<i64>,
}

impl AchievementProgress {
    #[must_use]
    pub fn locked(
        entity_id: impl Into<String>,
        achievement_id: impl Into<String>,
        target: f64,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            achievement_id: achievement_id.into(),
            current: 0.0,
            target,
            percentage: 0.0,
            unlocked: false,
            unlocked_at_us: None,
        }
    }
}

/// Per-entity XP and level state.
///
/// Invariant: `total_xp == xp_from_activities + xp_from_achievements`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpLevelState {
    pub entity_id: String,
    pub xp_from_activities: u64,
    pub xp_from_achievements: u64,
    pub total_xp: u64,
    pub level: u32,
    pub title: String,
}

impl XpLevelState {
    #[must_use]
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            xp_from_activities: 0,
            xp_from_achievements: 0,
            total_xp: 0,
            level: 1,
            title: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criteria_kind_round_trips_through_str() {
        for kind in [
            CriteriaKind::Count,
            CriteriaKind::Percentage,
            CriteriaKind::Streak,
            CriteriaKind::Custom,
        ] {
            assert_eq!(kind.as_str().parse::<CriteriaKind>(), Ok(kind));
        }
    }

    #[test]
    fn locked_progress_starts_at_zero() {
        let progress = AchievementProgress::locked("u-1", "first-update", 1.0);
        assert_eq!(progress.current, 0.0);
        assert!(!progress.unlocked);
        assert!(progress.unlocked_at_us.is_none());
    }

    #[test]
    fn definition_parses_from_toml() {
        let toml_src = r#"
id = "shelf-centurion"
category = "volume"
difficulty = "gold"
points_xp = 250

[criteria]
kind = "count"
target = 100.0
source_field = "lifetime_items_read"
period = "lifetime"
"#;
        let def: AchievementDefinition = toml::from_str(toml_src).expect("parse definition");
        assert_eq!(def.id, "shelf-centurion");
        assert_eq!(def.criteria.kind, CriteriaKind::Count);
        assert_eq!(def.criteria.period, Some(CriteriaPeriod::Lifetime));
    }
}
