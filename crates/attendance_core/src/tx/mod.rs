//! Transaction coordination over one session.
//!
//! # Responsibility
//! - Group repository calls into one atomic unit.
//! - Roll back on any failure and hand the original error back to the caller.
//!
//! # Invariants
//! - The coordinator borrows its session exclusively; one unit at a time.
//! - No nesting: `begin` while `InTransaction` is rejected.
//! - The session is back in auto-commit mode on every exit path, including
//!   early returns and panics (`Drop` rolls back an open unit).
//! - A failed rollback poisons the session.
//! - Isolation is SQLite's default `BEGIN` (deferred); it is not configured here.

use crate::db::Session;
use crate::repo::{RepoError, RepoResult};
use log::{debug, error, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type TxResult<T> = Result<T, TxError>;

/// Coordinator lifecycle.
///
/// `Committed` and `RolledBack` record the outcome of the last unit; in both
/// the session is in auto-commit mode again and `begin` is allowed, exactly as
/// from `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Idle,
    InTransaction,
    Committed,
    RolledBack,
}

impl TxState {
    pub fn is_auto_commit(self) -> bool {
        self != Self::InTransaction
    }
}

impl Display for TxState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::InTransaction => "in_transaction",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        };
        f.write_str(name)
    }
}

/// Operation attempted in the wrong coordinator or session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStateError {
    InvalidState {
        operation: &'static str,
        state: TxState,
    },
    /// The connection is already inside a transaction nobody here started.
    ExternalTransaction,
    SessionPoisoned,
}

impl Display for TransactionStateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidState { operation, state } => {
                write!(f, "cannot {operation} while {state}")
            }
            Self::ExternalTransaction => {
                write!(f, "session already has an open transaction")
            }
            Self::SessionPoisoned => write!(f, "session is poisoned after a failed rollback"),
        }
    }
}

impl Error for TransactionStateError {}

/// Failure of a coordinated unit.
#[derive(Debug)]
pub enum TxError {
    State(TransactionStateError),
    /// `BEGIN` itself failed; nothing was written.
    Begin(RepoError),
    /// The body failed and the unit was rolled back.
    Aborted(RepoError),
    /// `COMMIT` failed and the unit was rolled back.
    CommitFailed(RepoError),
    /// Rollback failed. `original` is the failure that triggered it, if any.
    /// The session is poisoned.
    RollbackFailed {
        original: Option<Box<TxError>>,
        rollback: rusqlite::Error,
    },
}

impl TxError {
    /// The repository error that caused the unit to fail, following rollback
    /// chains.
    pub fn repo_error(&self) -> Option<&RepoError> {
        match self {
            Self::Begin(err) | Self::Aborted(err) | Self::CommitFailed(err) => Some(err),
            Self::RollbackFailed {
                original: Some(original),
                ..
            } => original.repo_error(),
            Self::State(_) | Self::RollbackFailed { original: None, .. } => None,
        }
    }

    /// Whether the session can no longer be trusted.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::RollbackFailed { .. })
    }
}

impl Display for TxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::State(err) => write!(f, "{err}"),
            Self::Begin(err) => write!(f, "failed to begin transaction: {err}"),
            Self::Aborted(err) => write!(f, "transaction rolled back: {err}"),
            Self::CommitFailed(err) => write!(f, "commit failed, transaction rolled back: {err}"),
            Self::RollbackFailed {
                original: Some(original),
                rollback,
            } => write!(f, "rollback failed ({rollback}) after: {original}"),
            Self::RollbackFailed {
                original: None,
                rollback,
            } => write!(f, "rollback failed: {rollback}"),
        }
    }
}

impl Error for TxError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::State(err) => Some(err),
            Self::Begin(err) | Self::Aborted(err) | Self::CommitFailed(err) => Some(err),
            Self::RollbackFailed {
                original: Some(original),
                ..
            } => Some(original.as_ref()),
            Self::RollbackFailed {
                original: None,
                rollback,
            } => Some(rollback),
        }
    }
}

impl From<TransactionStateError> for TxError {
    fn from(value: TransactionStateError) -> Self {
        Self::State(value)
    }
}

/// Runs `body` as one atomic unit on `session`.
pub fn with_transaction<T, F>(session: &mut Session, body: F) -> TxResult<T>
where
    F: FnOnce(&Session) -> RepoResult<T>,
{
    TransactionCoordinator::new(session).run(body)
}

/// Explicit begin/commit/rollback over one exclusively borrowed session.
pub struct TransactionCoordinator<'s> {
    session: &'s mut Session,
    state: TxState,
}

impl<'s> TransactionCoordinator<'s> {
    pub fn new(session: &'s mut Session) -> Self {
        Self {
            session,
            state: TxState::Idle,
        }
    }

    pub fn state(&self) -> TxState {
        self.state
    }

    /// Session for repository calls inside the unit.
    pub fn session(&self) -> &Session {
        &*self.session
    }

    /// Suspends auto-commit.
    ///
    /// # Errors
    /// - `State` when already in a transaction, when the connection has an
    ///   open transaction of its own, or when the session is poisoned.
    /// - `Begin` when the store rejects `BEGIN`.
    pub fn begin(&mut self) -> TxResult<()> {
        if self.session.is_poisoned() {
            return Err(TransactionStateError::SessionPoisoned.into());
        }
        if self.state == TxState::InTransaction {
            return Err(TransactionStateError::InvalidState {
                operation: "begin",
                state: self.state,
            }
            .into());
        }
        if !self.session.is_auto_commit() {
            return Err(TransactionStateError::ExternalTransaction.into());
        }

        self.session
            .connection()
            .execute_batch("BEGIN;")
            .map_err(|err| TxError::Begin(err.into()))?;
        self.state = TxState::InTransaction;
        debug!("event=tx_begin module=tx status=ok");
        Ok(())
    }

    /// Makes the unit durable. A failed `COMMIT` is followed by a rollback.
    pub fn commit(&mut self) -> TxResult<()> {
        self.require_in_transaction("commit")?;

        match self.session.connection().execute_batch("COMMIT;") {
            Ok(()) => {
                self.state = TxState::Committed;
                debug!("event=tx_commit module=tx status=ok");
                Ok(())
            }
            Err(err) => {
                warn!("event=tx_commit module=tx status=error error={err}");
                Err(self.roll_back_after(TxError::CommitFailed(err.into())))
            }
        }
    }

    /// Undoes every write since `begin`.
    pub fn rollback(&mut self) -> TxResult<()> {
        self.require_in_transaction("rollback")?;
        self.rollback_inner()
            .map_err(|rollback| TxError::RollbackFailed {
                original: None,
                rollback,
            })
    }

    /// `begin`, run `body`, then `commit`; any body error rolls the unit back
    /// and is returned as `Aborted`.
    pub fn run<T, F>(&mut self, body: F) -> TxResult<T>
    where
        F: FnOnce(&Session) -> RepoResult<T>,
    {
        self.begin()?;
        match body(&*self.session) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(err) => {
                warn!(
                    "event=tx_abort module=tx status=error error_code={} error={err}",
                    err.code()
                );
                Err(self.roll_back_after(TxError::Aborted(err)))
            }
        }
    }

    fn require_in_transaction(&self, operation: &'static str) -> TxResult<()> {
        if self.state != TxState::InTransaction {
            return Err(TransactionStateError::InvalidState {
                operation,
                state: self.state,
            }
            .into());
        }
        Ok(())
    }

    fn roll_back_after(&mut self, original: TxError) -> TxError {
        match self.rollback_inner() {
            Ok(()) => original,
            Err(rollback) => TxError::RollbackFailed {
                original: Some(Box::new(original)),
                rollback,
            },
        }
    }

    fn rollback_inner(&mut self) -> Result<(), rusqlite::Error> {
        match self.session.connection().execute_batch("ROLLBACK;") {
            Ok(()) => {
                self.state = TxState::RolledBack;
                debug!("event=tx_rollback module=tx status=ok");
                Ok(())
            }
            Err(err) => {
                self.session.poison();
                if self.session.is_auto_commit() {
                    self.state = TxState::RolledBack;
                }
                error!(
                    "event=tx_rollback module=tx status=error auto_commit={} error={err}",
                    self.session.is_auto_commit()
                );
                Err(err)
            }
        }
    }
}

impl Drop for TransactionCoordinator<'_> {
    fn drop(&mut self) {
        if self.state != TxState::InTransaction {
            return;
        }
        warn!("event=tx_drop module=tx status=rollback");
        // Failure is already logged and the session poisoned.
        let _ = self.rollback_inner();
    }
}

#[cfg(test)]
mod tests {
    use super::{TransactionStateError, TxError, TxState};
    use crate::model::ValidationError;
    use crate::repo::RepoError;

    #[test]
    fn only_in_transaction_suspends_auto_commit() {
        assert!(TxState::Idle.is_auto_commit());
        assert!(TxState::Committed.is_auto_commit());
        assert!(TxState::RolledBack.is_auto_commit());
        assert!(!TxState::InTransaction.is_auto_commit());
    }

    #[test]
    fn repo_error_follows_rollback_chain() {
        let err = TxError::RollbackFailed {
            original: Some(Box::new(TxError::Aborted(RepoError::Validation(
                ValidationError::EmptyName,
            )))),
            rollback: rusqlite::Error::QueryReturnedNoRows,
        };
        assert!(err.is_fatal());
        assert!(matches!(
            err.repo_error(),
            Some(RepoError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn state_error_message_names_operation_and_state() {
        let err = TransactionStateError::InvalidState {
            operation: "commit",
            state: TxState::Idle,
        };
        assert_eq!(err.to_string(), "cannot commit while idle");
    }
}
