use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;
use std::path::Path;

use crate::output::{OutputMode, kv, render, section};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Force re-initialization even if the data directory already exists.
    #[arg(long)]
    pub force: bool,
}

const CONFIG_TEMPLATE: &str = "\
# shelfscore engine configuration. Every key is optional; omitted keys use
# the shipped defaults shown here.

#[score]
#completion_weight = 0.4
#quality_weight = 0.3
#productivity_weight = 0.2
#consistency_weight = 0.1

#[xp]
#label_weight = 1.0
#stockout_weight = 1.5
#presence_weight = 1.2
#two_kind_multiplier = 1.1
#all_kind_multiplier = 1.2
";

#[derive(Debug, Serialize)]
struct InitReport {
    data_dir: String,
    store: String,
    created_config: bool,
}

/// Execute `shelf init`. Creates the data directory skeleton:
///
/// ```text
/// <data_dir>/
///   shelf.sqlite3   (migrated store database)
///   shelf.toml      (commented default config template)
///   locks/          (per-scope advisory lock files)
/// ```
///
/// # Errors
///
/// Returns an error if the store already exists and `--force` is not set,
/// or if any filesystem or migration step fails.
pub fn run_init(args: &InitArgs, data_dir: &Path, mode: OutputMode) -> Result<()> {
    let store = super::store_path(data_dir);
    if store.exists() && !args.force {
        anyhow::bail!(
            "{} already exists. Use `shelf init --force` to reinitialize.",
            store.display()
        );
    }

    std::fs::create_dir_all(data_dir.join("locks"))
        .with_context(|| format!("create data directory {}", data_dir.display()))?;

    let config_path = data_dir.join("shelf.toml");
    let created_config = !config_path.exists();
    if created_config {
        std::fs::write(&config_path, CONFIG_TEMPLATE)
            .with_context(|| format!("write config template {}", config_path.display()))?;
    }

    let conn = shelf_core::db::open_store(&store)?;
    drop(conn);

    let report = InitReport {
        data_dir: data_dir.display().to_string(),
        store: store.display().to_string(),
        created_config,
    };

    render(mode, &report, |report, w| {
        section(w, "Initialized shelfscore data directory")?;
        kv(w, "data_dir", &report.data_dir)?;
        kv(w, "store", &report.store)?;
        kv(w, "config", if report.created_config { "created" } else { "kept" })
    })
}
