//! shelf-engine library.
//!
//! Turns normalized audit batches into daily snapshots, leaderboards, and
//! achievement/XP progression. Pure computation lives in `metrics`,
//! `snapshot`, `rank`, `achievement`, and `xp`; `recompute` orchestrates
//! them against the store with per-scope serialization.

pub mod achievement;
pub mod metrics;
pub mod rank;
pub mod recompute;
pub mod snapshot;
pub mod xp;
