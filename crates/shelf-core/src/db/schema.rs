//! Canonical SQLite schema for the shelfscore store.
//!
//! The schema is normalized around replace semantics and enforced key
//! uniqueness:
//! - `audit_batches` + `audit_records` hold the single authoritative batch
//!   per `(store, date, kind)` scope; re-ingest replaces, never merges
//! - `daily_snapshots` keeps one derived row per `(entity, date)` with an
//!   optimistic `version` column for compare-and-swap updates
//! - `achievement_progress`, `xp_state`, and `rank_history` are per-entity
//!   accumulators that only ever advance
//! - `store_meta` tracks the applied schema version

/// Migration v1: core tables plus store metadata.
pub const MIGRATION_V1_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS audit_batches (
    store_id TEXT NOT NULL,
    audit_date TEXT NOT NULL,
    audit_kind TEXT NOT NULL CHECK (audit_kind IN ('label', 'stockout', 'presence')),
    batch_id TEXT NOT NULL,
    ingested_at_us INTEGER NOT NULL,
    PRIMARY KEY (store_id, audit_date, audit_kind)
);

CREATE TABLE IF NOT EXISTS audit_records (
    record_id INTEGER PRIMARY KEY AUTOINCREMENT,
    store_id TEXT NOT NULL,
    audit_date TEXT NOT NULL,
    audit_kind TEXT NOT NULL CHECK (audit_kind IN ('label', 'stockout', 'presence')),
    entity_user_id TEXT NOT NULL,
    canonical_status TEXT NOT NULL,
    product_class TEXT NOT NULL DEFAULT '',
    location TEXT NOT NULL DEFAULT '',
    stock_qty INTEGER NOT NULL DEFAULT 0,
    cost REAL,
    recorded_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS daily_snapshots (
    entity_id TEXT NOT NULL,
    entity_class TEXT NOT NULL CHECK (entity_class IN ('user', 'store')),
    snapshot_date TEXT NOT NULL,
    payload_json TEXT NOT NULL,
    composite_score INTEGER NOT NULL DEFAULT 0,
    rank_position INTEGER,
    version INTEGER NOT NULL DEFAULT 1 CHECK (version >= 1),
    updated_at_us INTEGER NOT NULL,
    PRIMARY KEY (entity_id, snapshot_date)
);

CREATE TABLE IF NOT EXISTS achievement_progress (
    entity_id TEXT NOT NULL,
    achievement_id TEXT NOT NULL CHECK (length(trim(achievement_id)) > 0),
    current REAL NOT NULL DEFAULT 0,
    target REAL NOT NULL,
    percentage REAL NOT NULL DEFAULT 0,
    unlocked INTEGER NOT NULL DEFAULT 0 CHECK (unlocked IN (0, 1)),
    unlocked_at_us INTEGER,
    PRIMARY KEY (entity_id, achievement_id)
);

CREATE TABLE IF NOT EXISTS xp_state (
    entity_id TEXT PRIMARY KEY,
    xp_from_activities INTEGER NOT NULL DEFAULT 0,
    xp_from_achievements INTEGER NOT NULL DEFAULT 0,
    total_xp INTEGER NOT NULL DEFAULT 0,
    level INTEGER NOT NULL DEFAULT 1,
    title TEXT NOT NULL DEFAULT '',
    CHECK (total_xp = xp_from_activities + xp_from_achievements)
);

CREATE TABLE IF NOT EXISTS rank_history (
    entity_id TEXT PRIMARY KEY,
    entity_class TEXT NOT NULL CHECK (entity_class IN ('user', 'store')),
    position_counts_json TEXT NOT NULL DEFAULT '[0,0,0,0,0,0,0,0,0,0]',
    above_ten_count INTEGER NOT NULL DEFAULT 0,
    best_position_ever INTEGER
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL
);

INSERT OR IGNORE INTO store_meta (id, schema_version) VALUES (1, 1);
"#;

/// Migration v2: read-path indexes for recompute, ranking, and history scans.
pub const MIGRATION_V2_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_audit_records_scope
    ON audit_records(store_id, audit_date, audit_kind);

CREATE INDEX IF NOT EXISTS idx_audit_records_user_date
    ON audit_records(entity_user_id, audit_date);

CREATE INDEX IF NOT EXISTS idx_daily_snapshots_day_class_score
    ON daily_snapshots(snapshot_date, entity_class, composite_score DESC);

CREATE INDEX IF NOT EXISTS idx_daily_snapshots_entity_date
    ON daily_snapshots(entity_id, snapshot_date);

CREATE INDEX IF NOT EXISTS idx_achievement_progress_entity
    ON achievement_progress(entity_id);

UPDATE store_meta SET schema_version = 2 WHERE id = 1;
"#;

/// Indexes expected by the recompute/ranking/history query paths.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_audit_records_scope",
    "idx_audit_records_user_date",
    "idx_daily_snapshots_day_class_score",
    "idx_daily_snapshots_entity_date",
    "idx_achievement_progress_entity",
];
