//! Free-text audit status normalization.
//!
//! Field teams capture statuses as locale-specific free text ("Atualizado",
//! "no stock", "não pertence"...). [`normalize_status`] folds case, accents,
//! and whitespace, then maps the result onto the canonical vocabulary.
//! Unrecognized input is passed through unchanged and flagged so callers can
//! log it; an unknown status is never fatal.

use crate::model::record::CanonicalStatus;

/// Result of normalizing one raw status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMatch {
    /// Mapped onto the canonical vocabulary.
    Known(CanonicalStatus),
    /// No mapping; the raw input is carried unchanged for the caller to log.
    Unknown(String),
}

impl StatusMatch {
    #[must_use]
    pub const fn as_known(&self) -> Option<CanonicalStatus> {
        match self {
            Self::Known(status) => Some(*status),
            Self::Unknown(_) => None,
        }
    }
}

/// Alias table: folded free-text spelling → canonical status.
///
/// English and Portuguese spellings as they appear in real audit sheets.
const STATUS_ALIASES: &[(&str, CanonicalStatus)] = &[
    ("updated", CanonicalStatus::Updated),
    ("atualizado", CanonicalStatus::Updated),
    ("atualizada", CanonicalStatus::Updated),
    ("ok", CanonicalStatus::Updated),
    ("outdated", CanonicalStatus::Outdated),
    ("desatualizado", CanonicalStatus::Outdated),
    ("desatualizada", CanonicalStatus::Outdated),
    ("unread with stock", CanonicalStatus::UnreadWithStock),
    ("nao lido com estoque", CanonicalStatus::UnreadWithStock),
    ("nao lida com estoque", CanonicalStatus::UnreadWithStock),
    ("not belonging", CanonicalStatus::NotBelonging),
    ("nao pertence", CanonicalStatus::NotBelonging),
    ("fora de mix", CanonicalStatus::NotBelonging),
    ("read no stock", CanonicalStatus::ReadNoStock),
    ("lido sem estoque", CanonicalStatus::ReadNoStock),
    ("lida sem estoque", CanonicalStatus::ReadNoStock),
    ("no stock", CanonicalStatus::NoStock),
    ("sem estoque", CanonicalStatus::NoStock),
    ("ruptura", CanonicalStatus::NoStock),
    ("with problem", CanonicalStatus::WithProblem),
    ("com problema", CanonicalStatus::WithProblem),
    ("problema", CanonicalStatus::WithProblem),
    ("not read", CanonicalStatus::NotRead),
    ("nao lido", CanonicalStatus::NotRead),
    ("nao lida", CanonicalStatus::NotRead),
];

/// Map one raw status string onto the canonical vocabulary.
#[must_use]
pub fn normalize_status(raw: &str) -> StatusMatch {
    let folded = fold(raw);

    // Canonical snake_case identifiers pass straight through, so already
    // normalized input (re-ingested exports) costs nothing.
    if let Ok(status) = folded.replace(' ', "_").parse::<CanonicalStatus>() {
        return StatusMatch::Known(status);
    }

    for (alias, status) in STATUS_ALIASES {
        if folded == *alias {
            return StatusMatch::Known(*status);
        }
    }

    StatusMatch::Unknown(raw.to_string())
}

/// Lowercase, trim, collapse internal whitespace, and fold the Latin accents
/// that occur in the source locales.
fn fold(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;

    for ch in raw.trim().chars() {
        if ch.is_whitespace() || ch == '_' || ch == '-' {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        for lowered in ch.to_lowercase() {
            out.push(fold_accent(lowered));
        }
    }

    out
}

const fn fold_accent(ch: char) -> char {
    match ch {
        'á' | 'à' | 'â' | 'ã' => 'a',
        'é' | 'ê' => 'e',
        'í' => 'i',
        'ó' | 'ô' | 'õ' => 'o',
        'ú' | 'ü' => 'u',
        'ç' => 'c',
        other => other,
    }
}
