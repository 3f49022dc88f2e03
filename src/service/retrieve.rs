use super::{NoteService, ServiceError};
use crate::blob_store::{validate_key, BlobReader, BlobStoreError};

/// A counted download, ready to stream as an attachment.
#[derive(Debug)]
pub struct Download {
    pub blob: BlobReader,
    pub content_type: String,
    pub filename: String,
    pub downloads: u64,
}

/// A raw blob fetched by storage name.
#[derive(Debug)]
pub struct BlobFile {
    pub blob: BlobReader,
    pub content_type: String,
}

impl NoteService {
    /// Count a download of note `id` and open its bytes.
    ///
    /// The counter is incremented and the updated record fetched in a single
    /// store transaction, and only once the note's blob is known to exist.
    /// Unknown ids are reported as `NotFound` and nothing is written.
    pub async fn retrieve_by_id(&self, id: &str) -> Result<Download, ServiceError> {
        if uuid::Uuid::parse_str(id).is_err() {
            return Err(ServiceError::NotFound("File"));
        }

        let note_id = id.to_string();
        let note = self
            .run_db(move |db| db.get_note(&note_id))
            .await?
            .ok_or(ServiceError::NotFound("File"))?;

        let present = self
            .with_timeout(self.blobs.exists(&note.storage_name))
            .await?
            .map_err(|e| ServiceError::StorageUnavailable(e.to_string()))?;
        if !present {
            tracing::error!(
                note_id = %note.id,
                storage_name = %note.storage_name,
                "Note references a missing blob"
            );
            return Err(ServiceError::NotFound("File content"));
        }

        let note_id = note.id;
        let note = self
            .run_write(move |db, gate| db.increment_downloads_with(&note_id, gate))
            .await?
            .ok_or(ServiceError::NotFound("File"))?;

        let blob = self
            .with_timeout(self.blobs.open(&note.storage_name))
            .await?
            .map_err(|e| match e {
                BlobStoreError::NotFound(_) => {
                    tracing::error!(
                        note_id = %note.id,
                        storage_name = %note.storage_name,
                        downloads = note.downloads,
                        "Blob vanished after the download was counted"
                    );
                    ServiceError::NotFound("File content")
                }
                other => ServiceError::StorageUnavailable(other.to_string()),
            })?;

        tracing::debug!(note_id = %note.id, downloads = note.downloads, "Serving download");

        Ok(Download {
            blob,
            content_type: note.content_type,
            filename: note.original_filename,
            downloads: note.downloads,
        })
    }

    /// Open a blob by its storage name. Does not touch any download counter.
    pub async fn retrieve_by_filename(&self, name: &str) -> Result<BlobFile, ServiceError> {
        if validate_key(name).is_err() {
            return Err(ServiceError::NotFound("File"));
        }

        let exists = self
            .with_timeout(self.blobs.exists(name))
            .await?
            .map_err(|e| ServiceError::StorageUnavailable(e.to_string()))?;
        if !exists {
            return Err(ServiceError::NotFound("File"));
        }

        let blob = self
            .with_timeout(self.blobs.open(name))
            .await?
            .map_err(|e| match e {
                BlobStoreError::NotFound(_) => ServiceError::NotFound("File"),
                other => ServiceError::StorageUnavailable(other.to_string()),
            })?;

        let content_type = mime_guess::from_path(name)
            .first_or_octet_stream()
            .to_string();

        Ok(BlobFile { blob, content_type })
    }
}
