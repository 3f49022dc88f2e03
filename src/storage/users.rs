use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::gate::CommitGate;
use super::models::UserRecord;
use super::tables::*;

impl Database {
    // ========================================================================
    // User operations
    // ========================================================================

    /// Insert a user unless the email is already registered.
    ///
    /// Returns `false` when the email is taken. The check and the insert share
    /// one write transaction.
    pub fn create_user(&self, user: &UserRecord) -> Result<bool, DatabaseError> {
        self.create_user_with(user, &CommitGate::default())
    }

    /// Gated form of [`Database::create_user`].
    pub fn create_user_with(
        &self,
        user: &UserRecord,
        gate: &CommitGate,
    ) -> Result<bool, DatabaseError> {
        let email_key = user.email.to_lowercase();

        let write_txn = self.begin_write()?;
        let taken = {
            let email_table = write_txn.open_table(USER_EMAILS)?;
            let exists = email_table.get(email_key.as_str())?.is_some();
            exists
        };

        if taken {
            write_txn.abort()?;
            return Ok(false);
        }

        {
            let mut table = write_txn.open_table(USERS)?;
            let data = rmp_serde::to_vec_named(user)?;
            table.insert(user.id.as_str(), data.as_slice())?;

            let mut email_table = write_txn.open_table(USER_EMAILS)?;
            email_table.insert(email_key.as_str(), user.id.as_str())?;
        }

        if !gate.try_commit() {
            write_txn.abort()?;
            return Err(DatabaseError::Abandoned);
        }
        write_txn.commit()?;
        Ok(true)
    }

    /// Get a user by email (case-insensitive)
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let email_table = read_txn.open_table(USER_EMAILS)?;

        let id = match email_table.get(email.to_lowercase().as_str())? {
            Some(data) => data.value().to_string(),
            None => return Ok(None),
        };

        let users_table = read_txn.open_table(USERS)?;
        match users_table.get(id.as_str())? {
            Some(data) => {
                let user: UserRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }
}
