//! SQLite access to the scouter's run history.
//!
//! The scouter owns the file and appends one `runs` row plus one
//! `healthchecks` row per model on every scan. This side only reads.

use chrono::NaiveDateTime;
use rusqlite::{params, types::Type, Connection, OptionalExtension, Result as SqlResult, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use super::models::*;

/// Leading part shared by every accepted run datetime layout.
const RUN_DATE_FORMAT: &str = "%Y-%m-%d";

mod embedded {
    refinery::embed_migrations!("migrations");
}

/// Database error types.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("connection lock poisoned")]
    Poisoned,
}

/// Thread-safe probe history store.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open the store at the given path, creating the schema if it is missing.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let mut conn = Connection::open(path)?;

        embedded::migrations::runner()
            .run(&mut conn)
            .map_err(|e| DbError::Migration(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DbError> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    // --- Runs ---

    /// Get the most recent run, if any scan has been recorded.
    pub fn latest_run(&self) -> Result<Option<Run>, DbError> {
        let conn = self.conn()?;
        let run = conn
            .query_row(
                "SELECT id, run_datetime FROM runs ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok(Run {
                        id: row.get(0)?,
                        run_datetime: run_time_column(row, 1)?,
                    })
                },
            )
            .optional()?;
        Ok(run)
    }

    /// Get the last `limit` runs, oldest first.
    pub fn recent_runs(&self, limit: u32) -> Result<Vec<Run>, DbError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, run_datetime FROM runs ORDER BY id DESC LIMIT ?1")?;

        let mut runs = stmt
            .query_map(params![limit], |row| {
                Ok(Run {
                    id: row.get(0)?,
                    run_datetime: run_time_column(row, 1)?,
                })
            })?
            .collect::<SqlResult<Vec<_>>>()?;

        runs.reverse();
        Ok(runs)
    }

    // --- Health checks ---

    /// Get every check recorded in one run.
    pub fn checks_for_run(&self, run_id: i64) -> Result<Vec<HealthCheck>, DbError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT run_id, model_id, ok, http_status, error_category, latency_ms
             FROM healthchecks WHERE run_id = ?1 ORDER BY model_id ASC",
        )?;

        let checks = stmt
            .query_map(params![run_id], health_check_row)?
            .collect::<SqlResult<Vec<_>>>()?;

        Ok(checks)
    }

    /// Get all checks from runs at or after `cutoff`, ordered by run time.
    ///
    /// Run datetimes are stored as text in more than one layout, so SQLite only
    /// narrows by calendar date and the exact cutoff is applied to parsed times.
    pub fn checks_since(
        &self,
        cutoff: NaiveDateTime,
    ) -> Result<Vec<(NaiveDateTime, HealthCheck)>, DbError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT h.run_id, h.model_id, h.ok, h.http_status, h.error_category, h.latency_ms, r.run_datetime
             FROM healthchecks h JOIN runs r ON r.id = h.run_id
             WHERE r.run_datetime >= ?1
             ORDER BY r.id ASC",
        )?;

        let mut checks = stmt
            .query_map(params![cutoff.format(RUN_DATE_FORMAT).to_string()], |row| {
                Ok((run_time_column(row, 6)?, health_check_row(row)?))
            })?
            .collect::<SqlResult<Vec<_>>>()?;

        checks.retain(|(timestamp, _)| *timestamp >= cutoff);
        checks.sort_by_key(|(timestamp, _)| *timestamp);
        Ok(checks)
    }

    /// Get the probes from a model's last `limit` runs, ordered by run time.
    pub fn model_history(&self, model_id: &str, limit: u32) -> Result<Vec<ProbeRecord>, DbError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT h.run_id, h.model_id, h.ok, h.http_status, h.error_category, h.latency_ms, r.run_datetime
             FROM healthchecks h JOIN runs r ON r.id = h.run_id
             WHERE h.model_id = ?1
             ORDER BY r.id DESC LIMIT ?2",
        )?;

        let mut history = stmt
            .query_map(params![model_id, limit], |row| {
                let timestamp = run_time_column(row, 6)?;
                Ok(health_check_row(row)?.into_probe(timestamp))
            })?
            .collect::<SqlResult<Vec<_>>>()?;

        history.sort_by_key(|probe| probe.timestamp);
        Ok(history)
    }

    /// Check whether the model has ever been probed.
    pub fn has_model(&self, model_id: &str) -> Result<bool, DbError> {
        let conn = self.conn()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM healthchecks WHERE model_id = ?1 LIMIT 1",
                params![model_id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

#[cfg(test)]
impl Store {
    /// Record a run the way the scouter does.
    pub fn insert_run(&self, run_datetime: &str) -> Result<i64, DbError> {
        let conn = self.conn()?;
        conn.execute("INSERT INTO runs (run_datetime) VALUES (?1)", params![run_datetime])?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_check(&self, check: &HealthCheck) -> Result<(), DbError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO healthchecks (run_id, model_id, ok, http_status, error_category, latency_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                check.run_id,
                check.model_id,
                check.ok,
                check.http_status,
                check.error_category,
                check.latency_ms,
            ],
        )?;
        Ok(())
    }
}

fn health_check_row(row: &Row<'_>) -> SqlResult<HealthCheck> {
    Ok(HealthCheck {
        run_id: row.get(0)?,
        model_id: row.get(1)?,
        ok: row.get(2)?,
        http_status: row.get(3)?,
        error_category: row.get(4)?,
        latency_ms: row.get(5)?,
    })
}

fn run_time_column(row: &Row<'_>, idx: usize) -> SqlResult<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    parse_run_time(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("invalid run datetime: {}", raw).into(),
        )
    })
}
