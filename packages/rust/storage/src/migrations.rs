//! SQL migration definitions for the CampaignScope database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a set of SQL statements executed within a transaction.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: sessions, progress_entries",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One row per orchestration run
CREATE TABLE IF NOT EXISTS sessions (
    id           TEXT PRIMARY KEY,
    url          TEXT NOT NULL,
    status       TEXT NOT NULL,
    error        TEXT,
    created_at   TEXT NOT NULL,
    completed_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_sessions_created ON sessions(created_at);

-- Progress ledger: one row per (session, section)
CREATE TABLE IF NOT EXISTS progress_entries (
    id           TEXT PRIMARY KEY,
    session_id   TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
    section      TEXT NOT NULL,
    status       TEXT NOT NULL,
    progress     INTEGER NOT NULL DEFAULT 0,
    data_json    TEXT,
    started_at   TEXT NOT NULL,
    completed_at TEXT,
    UNIQUE(session_id, section)
);

CREATE INDEX IF NOT EXISTS idx_progress_session ON progress_entries(session_id);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
