//! Command handlers, one module per subcommand.

pub mod achievements;
pub mod ingest;
pub mod init;
pub mod ranking;
pub mod snapshot;
pub mod xp;

use anyhow::{Context as _, Result, bail};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

use shelf_core::error::ErrorCode;

/// Database file inside the data directory.
pub const STORE_FILE: &str = "shelf.sqlite3";

pub fn store_path(data_dir: &Path) -> PathBuf {
    data_dir.join(STORE_FILE)
}

/// Open the store, failing with a remediation hint when the data directory
/// was never initialized.
pub fn open_initialized(data_dir: &Path) -> Result<Connection> {
    let path = store_path(data_dir);
    if !path.exists() {
        let code = ErrorCode::NotInitialized;
        bail!(
            "{}: no store at {} ({})",
            code.code(),
            path.display(),
            code.hint().unwrap_or("run `shelf init` first")
        );
    }
    shelf_core::db::open_store(&path)
}

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid date {raw:?}, expected YYYY-MM-DD"))
}

/// Wall-clock now in epoch microseconds.
pub fn now_us() -> i64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    i64::try_from(now.as_micros()).unwrap_or(i64::MAX)
}
