//! Kind-specific status inclusion sets.
//!
//! This table is the business-rule contract for all completion math. Each
//! audit kind counts a different subset of canonical statuses as "valid"
//! (in scope for completion) and "read" (acted on by the auditor):
//!
//! | Kind | Valid | Read |
//! |---|---|---|
//! | label | Updated, Outdated, UnreadWithStock, NotBelonging | Updated, Outdated, NotBelonging |
//! | stockout | Updated, WithProblem | Updated |
//! | presence | Updated, WithProblem, NotBelonging, UnreadWithStock | Updated, ReadNoStock, NotBelonging |
//!
//! Stockout additionally totals `cost` over WithProblem rows; presence
//! additionally counts confirmed-presence rows (Updated, NotBelonging,
//! ReadNoStock).

use shelf_core::model::record::{AuditKind, CanonicalStatus};

use CanonicalStatus::{
    NotBelonging, Outdated, ReadNoStock, UnreadWithStock, Updated, WithProblem,
};

const LABEL_VALID: &[CanonicalStatus] = &[Updated, Outdated, UnreadWithStock, NotBelonging];
const LABEL_READ: &[CanonicalStatus] = &[Updated, Outdated, NotBelonging];

const STOCKOUT_VALID: &[CanonicalStatus] = &[Updated, WithProblem];
const STOCKOUT_READ: &[CanonicalStatus] = &[Updated];

const PRESENCE_VALID: &[CanonicalStatus] = &[Updated, WithProblem, NotBelonging, UnreadWithStock];
const PRESENCE_READ: &[CanonicalStatus] = &[Updated, ReadNoStock, NotBelonging];

const PRESENCE_CONFIRMED: &[CanonicalStatus] = &[Updated, NotBelonging, ReadNoStock];

/// Statuses counted as valid (in scope for completion) for `kind`.
#[must_use]
pub const fn valid_statuses(kind: AuditKind) -> &'static [CanonicalStatus] {
    match kind {
        AuditKind::Label => LABEL_VALID,
        AuditKind::Stockout => STOCKOUT_VALID,
        AuditKind::Presence => PRESENCE_VALID,
    }
}

/// Statuses counted as read for `kind`.
#[must_use]
pub const fn read_statuses(kind: AuditKind) -> &'static [CanonicalStatus] {
    match kind {
        AuditKind::Label => LABEL_READ,
        AuditKind::Stockout => STOCKOUT_READ,
        AuditKind::Presence => PRESENCE_READ,
    }
}

/// Statuses counted toward confirmed presence (presence kind only).
#[must_use]
pub const fn confirmed_presence_statuses() -> &'static [CanonicalStatus] {
    PRESENCE_CONFIRMED
}

/// Whether `status` is valid under `kind`'s inclusion rules.
#[must_use]
pub fn is_valid(kind: AuditKind, status: CanonicalStatus) -> bool {
    valid_statuses(kind).contains(&status)
}

/// Whether `status` is read under `kind`'s inclusion rules.
#[must_use]
pub fn is_read(kind: AuditKind, status: CanonicalStatus) -> bool {
    read_statuses(kind).contains(&status)
}
