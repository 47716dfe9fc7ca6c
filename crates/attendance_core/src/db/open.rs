//! SQLite-backed `ConnectionProvider`.
//!
//! # Invariants
//! - Returned sessions have `foreign_keys=ON` and a configured busy timeout.
//! - Returned sessions have the schema installed.

use super::schema::install_schema;
use super::{ConnectionError, ConnectionProvider, ConnectionResult, Session};
use crate::config::{DbConfig, DbLocation};
use log::{error, info};
use rusqlite::Connection;
use std::time::Instant;

/// Opens a fresh connection per `get_session` call.
#[derive(Debug, Clone)]
pub struct SqliteConnectionProvider {
    config: DbConfig,
}

impl SqliteConnectionProvider {
    pub fn new(config: DbConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }
}

impl ConnectionProvider for SqliteConnectionProvider {
    /// # Side effects
    /// - Emits `session_open` events with duration and status.
    fn get_session(&self) -> ConnectionResult<Session> {
        let started_at = Instant::now();
        let mode = self.config.mode();
        info!("event=session_open module=db status=start mode={mode}");

        let opened = match &self.config.location {
            DbLocation::File(path) => Connection::open(path),
            DbLocation::Memory => Connection::open_in_memory(),
        };
        let mut conn = match opened {
            Ok(conn) => conn,
            Err(err) => {
                error!(
                    "event=session_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={err}",
                    started_at.elapsed().as_millis()
                );
                return Err(ConnectionError::Open(err));
            }
        };

        match bootstrap_connection(&mut conn, &self.config) {
            Ok(()) => {
                info!(
                    "event=session_open module=db status=ok mode={mode} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(Session::from_connection(conn))
            }
            Err(err) => {
                error!(
                    "event=session_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={err}",
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }
}

fn bootstrap_connection(conn: &mut Connection, config: &DbConfig) -> ConnectionResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(ConnectionError::Configure)?;
    conn.busy_timeout(config.busy_timeout)
        .map_err(ConnectionError::Configure)?;
    install_schema(conn).map_err(ConnectionError::Schema)?;
    Ok(())
}
