use crate::enrichment::UserAgentClass;
use crate::report::{ErrorRow, HourCount, IpCount, OsCount, StatusShare, UrlCount};
use crate::store::{EventStore, ResolvedEvent, StoreError};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS user_agents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_agent_string TEXT NOT NULL UNIQUE,
        os TEXT NOT NULL,
        browser TEXT NOT NULL,
        device_type TEXT NOT NULL,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS log_entries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        ip_address TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        method TEXT NOT NULL,
        path TEXT NOT NULL,
        status_code INTEGER NOT NULL,
        bytes_sent INTEGER NOT NULL,
        referrer TEXT,
        user_agent_id INTEGER REFERENCES user_agents(id),
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    );
";

/// SQLite-backed event store. One connection, synchronous writes; the
/// `UNIQUE` constraint on `user_agent_string` is the backstop against
/// duplicate identities when two ingestion runs race.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(StoreError::Query)?;
        Ok(Self { conn })
    }

    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(SCHEMA).map_err(StoreError::Schema)
    }

    //-------------------------------------------------------------------------
    // Report queries
    //-------------------------------------------------------------------------

    pub fn top_ips(&self, n: u32) -> Result<Vec<IpCount>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT ip_address, COUNT(*) AS request_count
             FROM log_entries
             GROUP BY ip_address
             ORDER BY request_count DESC
             LIMIT ?1",
        )?;
        let rows = stmt
            .query_map([n], |row| {
                Ok(IpCount {
                    ip_address: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<_, _>>()?;
        Ok(rows)
    }

    pub fn top_urls(&self, n: u32) -> Result<Vec<UrlCount>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT path, COUNT(*) AS request_count
             FROM log_entries
             GROUP BY path
             ORDER BY request_count DESC
             LIMIT ?1",
        )?;
        let rows = stmt
            .query_map([n], |row| {
                Ok(UrlCount {
                    path: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<_, _>>()?;
        Ok(rows)
    }

    pub fn status_code_distribution(&self) -> Result<Vec<StatusShare>, StoreError> {
        let total: u64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM log_entries", [], |row| row.get(0))?;
        if total == 0 {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(
            "SELECT status_code, COUNT(*) AS count
             FROM log_entries
             GROUP BY status_code
             ORDER BY count DESC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                let count: u64 = row.get(1)?;
                Ok(StatusShare {
                    status_code: row.get(0)?,
                    count,
                    percent: count as f64 * 100.0 / total as f64,
                })
            })?
            .collect::<Result<_, _>>()?;
        Ok(rows)
    }

    pub fn hourly_traffic(&self) -> Result<Vec<HourCount>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT CAST(strftime('%H', timestamp) AS INTEGER) AS hour, COUNT(*) AS request_count
             FROM log_entries
             GROUP BY hour
             ORDER BY hour",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(HourCount {
                    hour: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<_, _>>()?;
        Ok(rows)
    }

    pub fn os_distribution(&self) -> Result<Vec<OsCount>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT ua.os, COUNT(*) AS requests
             FROM log_entries le
             JOIN user_agents ua ON le.user_agent_id = ua.id
             GROUP BY ua.os
             ORDER BY requests DESC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(OsCount {
                    os: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<_, _>>()?;
        Ok(rows)
    }

    pub fn error_logs(&self, status_code: u16) -> Result<Vec<ErrorRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT ip_address, path, status_code, timestamp
             FROM log_entries
             WHERE status_code = ?1
             ORDER BY timestamp DESC
             LIMIT 100",
        )?;
        let rows = stmt
            .query_map([status_code], map_error_row)?
            .collect::<Result<_, _>>()?;
        Ok(rows)
    }

    pub fn error_logs_by_date(&self, date: NaiveDate) -> Result<Vec<ErrorRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT ip_address, path, status_code, timestamp
             FROM log_entries
             WHERE status_code >= 400 AND date(timestamp) = ?1
             ORDER BY timestamp DESC",
        )?;
        let rows = stmt
            .query_map([date], map_error_row)?
            .collect::<Result<_, _>>()?;
        Ok(rows)
    }
}

fn map_error_row(row: &rusqlite::Row) -> rusqlite::Result<ErrorRow> {
    Ok(ErrorRow {
        ip_address: row.get(0)?,
        path: row.get(1)?,
        status_code: row.get(2)?,
        timestamp: row.get(3)?,
    })
}

impl EventStore for SqliteStore {
    fn find_user_agent(&self, raw: &str) -> Result<Option<i64>, StoreError> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM user_agents WHERE user_agent_string = ?1",
                [raw],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn insert_user_agent(
        &mut self,
        raw: &str,
        class: &UserAgentClass,
    ) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO user_agents (user_agent_string, os, browser, device_type)
             VALUES (?1, ?2, ?3, ?4)",
            params![raw, class.os, class.browser, class.device_type.as_str()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_event_batch(&mut self, batch: &[ResolvedEvent]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO log_entries (
                    ip_address, timestamp, method, path, status_code,
                    bytes_sent, referrer, user_agent_id
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for resolved in batch {
                let event = &resolved.event;
                stmt.execute(params![
                    event.ip_address,
                    event.timestamp,
                    event.method,
                    event.path,
                    event.status_code,
                    event.bytes_sent as i64,
                    event.referrer,
                    resolved.user_agent_id,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
