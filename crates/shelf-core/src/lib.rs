//! shelf-core library.
//!
//! Data model, canonical status normalization, engine configuration, the
//! SQLite store, and per-scope advisory locking for shelfscore.

pub mod config;
pub mod db;
pub mod error;
pub mod lock;
pub mod model;
pub mod status;
