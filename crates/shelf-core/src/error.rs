use std::fmt;

/// Machine-readable error codes for operator and script decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    InvalidAuditKind,
    UnknownStatus,
    RowValidationFailed,
    PercentageOverflow,
    SnapshotNotFound,
    SnapshotVersionConflict,
    ScopeLockContention,
    RuleSourceMissing,
    StoreWriteFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::InvalidAuditKind => "E2001",
            Self::UnknownStatus => "E2002",
            Self::RowValidationFailed => "E2003",
            Self::PercentageOverflow => "E3001",
            Self::SnapshotNotFound => "E4001",
            Self::SnapshotVersionConflict => "E5001",
            Self::ScopeLockContention => "E5002",
            Self::RuleSourceMissing => "E6001",
            Self::StoreWriteFailed => "E7001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Data directory not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidAuditKind => "Invalid audit kind",
            Self::UnknownStatus => "Unrecognized audit status",
            Self::RowValidationFailed => "Audit row validation failed",
            Self::PercentageOverflow => "Computed percentage above 100",
            Self::SnapshotNotFound => "Snapshot not found",
            Self::SnapshotVersionConflict => "Snapshot version conflict",
            Self::ScopeLockContention => "Scope lock contention",
            Self::RuleSourceMissing => "Achievement rule source missing",
            Self::StoreWriteFailed => "Store write failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `shelf init` to initialize the data directory."),
            Self::ConfigParseError => Some("Fix syntax in shelf.toml and retry."),
            Self::InvalidAuditKind => Some("Use one of: label, stockout, presence."),
            Self::UnknownStatus => {
                Some("Map the raw status to a canonical value or fix the source sheet.")
            }
            Self::RowValidationFailed => None,
            Self::PercentageOverflow => {
                Some("Inspect the batch for duplicated rows; the value was clamped to 100.")
            }
            Self::SnapshotNotFound => Some("Ingest a batch for this entity and date first."),
            Self::SnapshotVersionConflict => {
                Some("Another recompute finished first. Retry the ingest.")
            }
            Self::ScopeLockContention => {
                Some("Retry after the other recompute for this scope releases its lock.")
            }
            Self::RuleSourceMissing => {
                Some("Check the achievement definition's source_field against the metric catalog.")
            }
            Self::StoreWriteFailed => Some("Check disk space and write permissions."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One non-fatal problem recorded while processing a batch or rule pass.
///
/// Recompute never aborts on these; they are collected and returned to the
/// caller alongside the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct EngineProblem {
    /// Stable machine code, see [`ErrorCode::code`].
    pub code: String,
    /// Human-readable detail (row index, raw status, rule id, ...).
    pub detail: String,
}

impl EngineProblem {
    #[must_use]
    pub fn new(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            code: code.code().to_string(),
            detail: detail.into(),
        }
    }
}
