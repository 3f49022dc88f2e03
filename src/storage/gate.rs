//! Bounded writes that never commit behind a caller's back.
//!
//! redb write transactions run on the blocking pool and cannot be cancelled
//! once started. A [`CommitGate`] is shared between the waiting caller and the
//! writer: whichever side claims it first decides whether the transaction
//! commits or is abandoned.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinError;

use super::db::{Database, DatabaseError};

const OPEN: u8 = 0;
const COMMITTING: u8 = 1;
const ABANDONED: u8 = 2;

#[derive(Debug, Clone, Default)]
pub struct CommitGate(Arc<AtomicU8>);

impl CommitGate {
    /// Claimed by the writer just before commit. `false` once abandoned.
    pub fn try_commit(&self) -> bool {
        self.0
            .compare_exchange(OPEN, COMMITTING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Claimed by the caller on timeout. `false` if the writer is already
    /// committing, in which case its outcome must be awaited.
    pub fn abandon(&self) -> bool {
        self.0
            .compare_exchange(OPEN, ABANDONED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error(transparent)]
    Store(#[from] DatabaseError),
    #[error("metadata store did not respond within {}ms", .0.as_millis())]
    TimedOut(Duration),
    #[error("metadata store task failed: {0}")]
    Task(#[from] JoinError),
}

impl Database {
    /// Run a gated write on the blocking pool, waiting at most `limit`.
    ///
    /// `TimedOut` guarantees nothing was or will be committed. A write that
    /// had already begun committing when the limit passed is awaited and its
    /// real outcome returned.
    pub async fn write_within<T, F>(&self, limit: Duration, op: F) -> Result<T, WriteError>
    where
        F: FnOnce(&Database, &CommitGate) -> Result<T, DatabaseError> + Send + 'static,
        T: Send + 'static,
    {
        let gate = CommitGate::default();
        let db = self.clone();
        let writer_gate = gate.clone();
        let mut task = tokio::task::spawn_blocking(move || op(&db, &writer_gate));

        match tokio::time::timeout(limit, &mut task).await {
            Ok(joined) => Ok(joined??),
            Err(_) if gate.abandon() => Err(WriteError::TimedOut(limit)),
            Err(_) => {
                tracing::debug!("Write was committing at the deadline, awaiting outcome");
                Ok(task.await??)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_first_claim_wins() {
        let gate = CommitGate::default();
        assert!(gate.abandon());
        assert!(!gate.try_commit());

        let gate = CommitGate::default();
        assert!(gate.try_commit());
        assert!(!gate.abandon());
    }
}
