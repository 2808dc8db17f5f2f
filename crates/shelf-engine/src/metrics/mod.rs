//! Kind-specific validity/read arithmetic and category breakdowns.

pub mod aggregate;
pub mod breakdown;
pub mod rules;

pub use aggregate::{AggregateOutcome, aggregate_kind};
pub use breakdown::breakdown_kind;
pub use rules::{confirmed_presence_statuses, read_statuses, valid_statuses};
