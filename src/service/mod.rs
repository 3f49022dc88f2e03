//! Ingestion, query and retrieval of notes over explicit store handles.
//!
//! `NoteService` owns no global state: it is built from a `Database` and a
//! `BlobStore`, so tests can hand it temporary stores or doubles.

mod ingest;
mod query;
mod retrieve;

pub use ingest::{NoteFields, Upload};
pub use retrieve::{BlobFile, Download};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::blob_store::BlobStore;
use crate::config::UploadConfig;
use crate::storage::{CommitGate, Database, DatabaseError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid file type: {0}")]
    InvalidFileType(String),
    #[error("File exceeds maximum upload size of {limit} bytes")]
    FileTooLarge { limit: u64 },
    #[error("No file uploaded")]
    NoFileProvided,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Failed to persist upload: {0}")]
    PersistenceFailure(String),
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl ServiceError {
    /// Reclassify a store failure that happened on the write path.
    fn into_persistence(self) -> Self {
        match self {
            ServiceError::StorageUnavailable(cause) => ServiceError::PersistenceFailure(cause),
            other => other,
        }
    }
}

#[derive(Clone)]
pub struct NoteService {
    db: Database,
    blobs: Arc<dyn BlobStore>,
    upload: UploadConfig,
    store_timeout: Duration,
}

impl NoteService {
    pub fn new(
        db: Database,
        blobs: Arc<dyn BlobStore>,
        upload: UploadConfig,
        store_timeout: Duration,
    ) -> Self {
        Self {
            db,
            blobs,
            upload,
            store_timeout,
        }
    }

    pub fn max_upload_size(&self) -> u64 {
        self.upload.max_upload_size
    }

    /// Run a blocking metadata store read off the async runtime, bounded by
    /// the store timeout.
    async fn run_db<T, F>(&self, op: F) -> Result<T, ServiceError>
    where
        F: FnOnce(Database) -> Result<T, DatabaseError> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        let task = tokio::task::spawn_blocking(move || op(db));

        match tokio::time::timeout(self.store_timeout, task).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(e))) => Err(ServiceError::StorageUnavailable(e.to_string())),
            Ok(Err(e)) => Err(ServiceError::StorageUnavailable(format!(
                "metadata store task failed: {e}"
            ))),
            Err(_) => Err(ServiceError::StorageUnavailable(format!(
                "metadata store did not respond within {}ms",
                self.store_timeout.as_millis()
            ))),
        }
    }

    /// Run a metadata write bounded by the store timeout. An error means the
    /// write did not commit and never will.
    async fn run_write<T, F>(&self, op: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&Database, &CommitGate) -> Result<T, DatabaseError> + Send + 'static,
        T: Send + 'static,
    {
        self.db
            .write_within(self.store_timeout, op)
            .await
            .map_err(|e| ServiceError::StorageUnavailable(e.to_string()))
    }

    /// Bound a blob store call by the store timeout.
    async fn with_timeout<T, Fut>(&self, fut: Fut) -> Result<T, ServiceError>
    where
        Fut: Future<Output = T>,
    {
        tokio::time::timeout(self.store_timeout, fut)
            .await
            .map_err(|_| {
                ServiceError::StorageUnavailable(format!(
                    "blob store did not respond within {}ms",
                    self.store_timeout.as_millis()
                ))
            })
    }
}
