//! libSQL storage layer for analysis sessions and the progress ledger.
//!
//! The [`Storage`] struct wraps a libSQL database holding one row per
//! session and one ledger row per `(session, section)` pair.
//!
//! **Write rules:**
//! - Seeding is idempotent: re-seeding an existing `(session, section)` pair
//!   is a no-op backed by a UNIQUE constraint.
//! - [`Storage::update_section`] is a partial merge — only the fields present
//!   in the [`ProgressUpdate`] enter the SET clause, so the enhancement path
//!   can re-open a row without clobbering fields it does not own.
//! - A session's terminal transition happens exactly once; a second
//!   [`Storage::finalize_session`] call is rejected.

mod migrations;

use std::path::Path;

use chrono::{DateTime, Utc};
use libsql::{Connection, Database, Value, params};
use uuid::Uuid;

use campaignscope_shared::{
    CampaignScopeError, ProgressEntry, Result, SectionName, SectionStatus, Session, SessionId,
    SessionStatus,
};

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

/// Partial update for one ledger row. Fields left `None` are retained.
#[derive(Debug, Clone, Default)]
pub struct ProgressUpdate {
    pub status: Option<SectionStatus>,
    pub progress: Option<u8>,
    pub data: Option<serde_json::Value>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Storage {
    /// Open or create a database at `path` and run pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CampaignScopeError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| CampaignScopeError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| CampaignScopeError::Storage(e.to_string()))?;

        let storage = Self { db, conn };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    CampaignScopeError::Storage(format!(
                        "migration v{} failed: {e}",
                        migration.version
                    ))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // Session operations
    // -----------------------------------------------------------------------

    /// Insert a new session row.
    pub async fn insert_session(&self, session: &Session) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO sessions (id, url, status, error, created_at, completed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    session.id.to_string(),
                    session.url.as_str(),
                    session.status.as_str(),
                    session.error.as_deref(),
                    session.created_at.to_rfc3339(),
                    session.completed_at.map(|t| t.to_rfc3339()),
                ],
            )
            .await
            .map_err(|e| CampaignScopeError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Get a session by ID.
    pub async fn get_session(&self, id: &SessionId) -> Result<Option<Session>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, url, status, error, created_at, completed_at
                 FROM sessions WHERE id = ?1",
                params![id.to_string()],
            )
            .await
            .map_err(|e| CampaignScopeError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_session(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(CampaignScopeError::Storage(e.to_string())),
        }
    }

    /// Record a session's terminal transition, exactly once.
    ///
    /// The `completed_at IS NULL` guard makes a second call fail rather than
    /// overwrite the recorded terminal state.
    pub async fn finalize_session(
        &self,
        id: &SessionId,
        status: SessionStatus,
        error: Option<&str>,
    ) -> Result<()> {
        if status == SessionStatus::InProgress {
            return Err(CampaignScopeError::validation(
                "in_progress is not a terminal session status",
            ));
        }

        let now = Utc::now().to_rfc3339();
        let changed = self
            .conn
            .execute(
                "UPDATE sessions SET status = ?1, error = ?2, completed_at = ?3
                 WHERE id = ?4 AND completed_at IS NULL",
                params![status.as_str(), error, now.as_str(), id.to_string()],
            )
            .await
            .map_err(|e| CampaignScopeError::Storage(e.to_string()))?;

        if changed == 0 {
            return Err(CampaignScopeError::Storage(format!(
                "session {id} is unknown or already finalized"
            )));
        }
        Ok(())
    }

    /// List sessions, newest first.
    pub async fn list_sessions(&self) -> Result<Vec<Session>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, url, status, error, created_at, completed_at
                 FROM sessions ORDER BY created_at DESC, id DESC",
                params![],
            )
            .await
            .map_err(|e| CampaignScopeError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(row_to_session(&row)?);
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // Progress ledger operations
    // -----------------------------------------------------------------------

    /// Seed one ledger row as `pending/0`. Idempotent: a retried seed for an
    /// already-seeded `(session, section)` pair is a no-op.
    pub async fn seed_section(&self, session_id: &SessionId, section: SectionName) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO progress_entries (id, session_id, section, status, progress, started_at)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5)
                 ON CONFLICT(session_id, section) DO NOTHING",
                params![
                    Uuid::now_v7().to_string(),
                    session_id.to_string(),
                    section.as_str(),
                    SectionStatus::Pending.as_str(),
                    now.as_str(),
                ],
            )
            .await
            .map_err(|e| CampaignScopeError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Apply a partial update to one ledger row. Unset fields are retained.
    pub async fn update_section(
        &self,
        session_id: &SessionId,
        section: SectionName,
        update: &ProgressUpdate,
    ) -> Result<()> {
        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(status) = update.status {
            sets.push("status = ?");
            values.push(Value::Text(status.as_str().into()));
        }
        if let Some(progress) = update.progress {
            sets.push("progress = ?");
            values.push(Value::Integer(i64::from(progress.min(100))));
        }
        if let Some(data) = &update.data {
            sets.push("data_json = ?");
            values.push(Value::Text(data.to_string()));
        }
        if let Some(completed_at) = update.completed_at {
            sets.push("completed_at = ?");
            values.push(Value::Text(completed_at.to_rfc3339()));
        }

        if sets.is_empty() {
            return Ok(());
        }

        let sql = format!(
            "UPDATE progress_entries SET {} WHERE session_id = ? AND section = ?",
            sets.join(", ")
        );
        values.push(Value::Text(session_id.to_string()));
        values.push(Value::Text(section.as_str().into()));

        let changed = self
            .conn
            .execute(&sql, values)
            .await
            .map_err(|e| CampaignScopeError::Storage(e.to_string()))?;

        if changed == 0 {
            return Err(CampaignScopeError::Storage(format!(
                "no ledger row for session {session_id}, section {section}"
            )));
        }
        Ok(())
    }

    /// Get one ledger row.
    pub async fn get_section(
        &self,
        session_id: &SessionId,
        section: SectionName,
    ) -> Result<Option<ProgressEntry>> {
        let mut rows = self
            .conn
            .query(
                "SELECT session_id, section, status, progress, data_json, started_at, completed_at
                 FROM progress_entries WHERE session_id = ?1 AND section = ?2",
                params![session_id.to_string(), section.as_str()],
            )
            .await
            .map_err(|e| CampaignScopeError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_progress_entry(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(CampaignScopeError::Storage(e.to_string())),
        }
    }

    /// List all ledger rows for a session, in seeding order.
    pub async fn list_sections(&self, session_id: &SessionId) -> Result<Vec<ProgressEntry>> {
        let mut rows = self
            .conn
            .query(
                "SELECT session_id, section, status, progress, data_json, started_at, completed_at
                 FROM progress_entries WHERE session_id = ?1 ORDER BY started_at, section",
                params![session_id.to_string()],
            )
            .await
            .map_err(|e| CampaignScopeError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(row_to_progress_entry(&row)?);
        }
        Ok(results)
    }
}

/// Convert a database row to a [`Session`].
fn row_to_session(row: &libsql::Row) -> Result<Session> {
    Ok(Session {
        id: get_text(row, 0)?
            .parse()
            .map_err(|e| CampaignScopeError::Storage(format!("invalid session id: {e}")))?,
        url: get_text(row, 1)?,
        status: get_text(row, 2)?.parse()?,
        error: row.get::<String>(3).ok(),
        created_at: parse_timestamp(&get_text(row, 4)?)?,
        completed_at: match row.get::<String>(5).ok() {
            Some(s) => Some(parse_timestamp(&s)?),
            None => None,
        },
    })
}

/// Convert a database row to a [`ProgressEntry`].
fn row_to_progress_entry(row: &libsql::Row) -> Result<ProgressEntry> {
    let data = match row.get::<String>(4).ok() {
        Some(s) => Some(
            serde_json::from_str(&s)
                .map_err(|e| CampaignScopeError::Storage(format!("invalid data_json: {e}")))?,
        ),
        None => None,
    };

    Ok(ProgressEntry {
        session_id: get_text(row, 0)?
            .parse()
            .map_err(|e| CampaignScopeError::Storage(format!("invalid session id: {e}")))?,
        section: get_text(row, 1)?.parse()?,
        status: get_text(row, 2)?.parse()?,
        progress_percentage: row
            .get::<i64>(3)
            .map_err(|e| CampaignScopeError::Storage(e.to_string()))?
            .clamp(0, 100) as u8,
        data,
        started_at: parse_timestamp(&get_text(row, 5)?)?,
        completed_at: match row.get::<String>(6).ok() {
            Some(s) => Some(parse_timestamp(&s)?),
            None => None,
        },
    })
}

fn get_text(row: &libsql::Row, idx: i32) -> Result<String> {
    row.get::<String>(idx)
        .map_err(|e| CampaignScopeError::Storage(e.to_string()))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CampaignScopeError::Storage(format!("invalid date: {e}")))
}
