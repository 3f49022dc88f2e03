use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::gate::CommitGate;
use super::models::NoteRecord;
use super::query::NoteQuery;
use super::tables::*;

impl Database {
    // ========================================================================
    // Note operations
    // ========================================================================

    /// Store a note record
    pub fn put_note(&self, note: &NoteRecord) -> Result<(), DatabaseError> {
        self.put_note_with(note, &CommitGate::default())
    }

    /// Store a note record unless `gate` has been abandoned by the time the
    /// write is ready to commit.
    pub fn put_note_with(
        &self,
        note: &NoteRecord,
        gate: &CommitGate,
    ) -> Result<(), DatabaseError> {
        debug_assert!(!note.id.is_empty(), "note id must not be empty");
        debug_assert!(
            !note.storage_name.is_empty(),
            "note storage name must not be empty"
        );

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(NOTES)?;
            let data = rmp_serde::to_vec_named(note)?;
            table.insert(note.id.as_str(), data.as_slice())?;
        }

        if !gate.try_commit() {
            write_txn.abort()?;
            return Err(DatabaseError::Abandoned);
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a note by its UUID
    pub fn get_note(&self, id: &str) -> Result<Option<NoteRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(NOTES)?;

        match table.get(id)? {
            Some(data) => {
                let note: NoteRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(note))
            }
            None => Ok(None),
        }
    }

    /// Get all notes in key order, which is insertion order for UUIDv7 ids
    pub fn get_all_notes(&self) -> Result<Vec<NoteRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(NOTES)?;

        let mut notes = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let note: NoteRecord = rmp_serde::from_slice(value.value())?;
            notes.push(note);
        }

        Ok(notes)
    }

    /// List notes matching the query, in the order it asks for
    pub fn list_notes(&self, query: &NoteQuery) -> Result<Vec<NoteRecord>, DatabaseError> {
        let all = self.get_all_notes()?;
        Ok(query.apply(all))
    }

    /// Increment a note's download counter and return the updated record.
    ///
    /// Read, increment and write happen inside one write transaction, so
    /// concurrent callers are serialized and no increment is lost. Returns
    /// `None` without writing anything when the id is unknown.
    pub fn increment_downloads(&self, id: &str) -> Result<Option<NoteRecord>, DatabaseError> {
        self.increment_downloads_with(id, &CommitGate::default())
    }

    /// Gated form of [`Database::increment_downloads`].
    pub fn increment_downloads_with(
        &self,
        id: &str,
        gate: &CommitGate,
    ) -> Result<Option<NoteRecord>, DatabaseError> {
        let write_txn = self.begin_write()?;

        let existing = {
            let table = write_txn.open_table(NOTES)?;
            let result = match table.get(id)? {
                Some(data) => {
                    let note: NoteRecord = rmp_serde::from_slice(data.value())?;
                    Some(note)
                }
                None => None,
            };
            result
        };

        let updated = match existing {
            Some(mut note) => {
                note.downloads = note.downloads.saturating_add(1);
                let serialized = rmp_serde::to_vec_named(&note)?;
                let mut table = write_txn.open_table(NOTES)?;
                table.insert(id, serialized.as_slice())?;
                Some(note)
            }
            None => None,
        };

        if updated.is_none() {
            write_txn.abort()?;
            return Ok(None);
        }
        if !gate.try_commit() {
            write_txn.abort()?;
            return Err(DatabaseError::Abandoned);
        }
        write_txn.commit()?;
        Ok(updated)
    }
}
