use super::{NoteService, ServiceError};
use crate::storage::models::NoteRecord;
use crate::storage::NoteQuery;

impl NoteService {
    /// List notes matching `query`. Read-only; an empty result is not an error.
    pub async fn list(&self, query: NoteQuery) -> Result<Vec<NoteRecord>, ServiceError> {
        let notes = self.run_db(move |db| db.list_notes(&query)).await?;
        tracing::debug!(count = notes.len(), "Listed notes");
        Ok(notes)
    }
}
