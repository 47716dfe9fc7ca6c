//! Session ownership and SQLite connection bootstrap.
//!
//! # Responsibility
//! - Wrap one SQLite connection as a caller-owned `Session`.
//! - Define the `ConnectionProvider` seam the core consumes.
//! - Install the fixed student/attendance schema.
//!
//! # Invariants
//! - No process-wide connection state; every session is created by a provider
//!   and owned by exactly one caller.
//! - Provider-issued sessions have `foreign_keys=ON` and the schema installed.
//! - A poisoned session refuses all further work.

use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
pub mod schema;

pub use open::SqliteConnectionProvider;

pub type ConnectionResult<T> = Result<T, ConnectionError>;

/// A session could not be obtained or can no longer be used.
#[derive(Debug)]
pub enum ConnectionError {
    /// Opening the database failed.
    Open(rusqlite::Error),
    /// Connection pragmas could not be applied.
    Configure(rusqlite::Error),
    /// Schema install failed.
    Schema(rusqlite::Error),
    /// The store became unreachable mid-operation (I/O, lock, corrupt file).
    Unavailable(rusqlite::Error),
    /// A failed rollback left the session in an unknown state.
    SessionPoisoned,
}

impl Display for ConnectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open(err) => write!(f, "failed to open database: {err}"),
            Self::Configure(err) => write!(f, "failed to configure connection: {err}"),
            Self::Schema(err) => write!(f, "failed to install schema: {err}"),
            Self::Unavailable(err) => write!(f, "database unavailable: {err}"),
            Self::SessionPoisoned => write!(
                f,
                "session is poisoned after a failed rollback; open a new session"
            ),
        }
    }
}

impl Error for ConnectionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open(err) | Self::Configure(err) | Self::Schema(err) | Self::Unavailable(err) => {
                Some(err)
            }
            Self::SessionPoisoned => None,
        }
    }
}

/// Hands out sessions. Pooling, retries and credentials live behind it.
pub trait ConnectionProvider {
    fn get_session(&self) -> ConnectionResult<Session>;
}

/// One logical database session used sequentially by a single owner.
///
/// Outside a `TransactionCoordinator` the connection is in SQLite auto-commit
/// mode and every repository call commits on its own.
#[derive(Debug)]
pub struct Session {
    conn: Connection,
    poisoned: bool,
}

impl Session {
    /// Wraps an already configured connection.
    ///
    /// The caller is responsible for pragmas and schema; repositories still
    /// verify the tables they need when constructed.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            poisoned: false,
        }
    }

    /// Raw connection access for statements outside the repositories.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Whether statements currently commit individually.
    pub fn is_auto_commit(&self) -> bool {
        self.conn.is_autocommit()
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Fails with `SessionPoisoned` once a rollback has failed on this session.
    pub fn ensure_usable(&self) -> ConnectionResult<()> {
        if self.poisoned {
            return Err(ConnectionError::SessionPoisoned);
        }
        Ok(())
    }

    pub(crate) fn poison(&mut self) {
        self.poisoned = true;
    }

    /// Releases the session, surfacing close errors instead of dropping them.
    pub fn close(self) -> ConnectionResult<()> {
        self.conn
            .close()
            .map_err(|(_, err)| ConnectionError::Unavailable(err))
    }
}
