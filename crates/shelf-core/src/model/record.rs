use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The three audit kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditKind {
    Label,
    Stockout,
    Presence,
}

impl AuditKind {
    /// All kinds, in canonical order.
    pub const ALL: [Self; 3] = [Self::Label, Self::Stockout, Self::Presence];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Label => "label",
            Self::Stockout => "stockout",
            Self::Presence => "presence",
        }
    }
}

impl fmt::Display for AuditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown audit kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid audit kind: {0:?} (expected label, stockout, or presence)")]
pub struct InvalidAuditKind(pub String);

impl FromStr for AuditKind {
    type Err = InvalidAuditKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "label" => Ok(Self::Label),
            "stockout" => Ok(Self::Stockout),
            "presence" => Ok(Self::Presence),
            other => Err(InvalidAuditKind(other.to_string())),
        }
    }
}

/// Canonical audit-item outcomes after free-text normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalStatus {
    Updated,
    Outdated,
    UnreadWithStock,
    NotBelonging,
    ReadNoStock,
    NoStock,
    WithProblem,
    NotRead,
}

impl CanonicalStatus {
    /// All canonical statuses, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Updated,
        Self::Outdated,
        Self::UnreadWithStock,
        Self::NotBelonging,
        Self::ReadNoStock,
        Self::NoStock,
        Self::WithProblem,
        Self::NotRead,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Updated => "updated",
            Self::Outdated => "outdated",
            Self::UnreadWithStock => "unread_with_stock",
            Self::NotBelonging => "not_belonging",
            Self::ReadNoStock => "read_no_stock",
            Self::NoStock => "no_stock",
            Self::WithProblem => "with_problem",
            Self::NotRead => "not_read",
        }
    }
}

impl fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown canonical status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown canonical status: {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for CanonicalStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "updated" => Ok(Self::Updated),
            "outdated" => Ok(Self::Outdated),
            "unread_with_stock" => Ok(Self::UnreadWithStock),
            "not_belonging" => Ok(Self::NotBelonging),
            "read_no_stock" => Ok(Self::ReadNoStock),
            "no_stock" => Ok(Self::NoStock),
            "with_problem" => Ok(Self::WithProblem),
            "not_read" => Ok(Self::NotRead),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Whether a snapshot belongs to a user or a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityClass {
    User,
    Store,
}

impl EntityClass {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Store => "store",
        }
    }
}

impl fmt::Display for EntityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown entity class.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid entity class: {0:?} (expected user or store)")]
pub struct InvalidEntityClass(pub String);

impl FromStr for EntityClass {
    type Err = InvalidEntityClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "store" => Ok(Self::Store),
            other => Err(InvalidEntityClass(other.to_string())),
        }
    }
}

/// One normalized audit row as handed over by the ingestion layer.
///
/// Immutable once stored; the whole batch for a `(store, date, kind)` scope
/// is replaced atomically on re-upload, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub entity_user_id: String,
    pub store_id: String,
    pub audit_kind: AuditKind,
    pub canonical_status: CanonicalStatus,
    pub product_class: String,
    pub location: String,
    pub stock_qty: i64,
    /// Unit cost, only meaningful for stockout shortage accounting.
    pub cost: Option<f64>,
    /// Capture time in microseconds since the Unix epoch.
    pub recorded_at_us: i64,
}

/// The scope key a batch replaces: one store, one day, one audit kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchScope {
    pub store_id: String,
    pub audit_date: chrono::NaiveDate,
    pub audit_kind: AuditKind,
}

impl BatchScope {
    /// Stable key used for lock files and log correlation.
    #[must_use]
    pub fn key(&self) -> String {
        format!(
            "{}_{}_{}",
            self.store_id,
            self.audit_date.format("%Y-%m-%d"),
            self.audit_kind
        )
    }
}

impl fmt::Display for BatchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.store_id, self.audit_date, self.audit_kind
        )
    }
}
