//! Shared test helpers for in-crate unit tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::blob_store::{BlobReader, BlobStore, BlobStoreError, LocalStore};
use crate::config::{AuthConfig, Config, NodeConfig, StorageConfig, UploadConfig};
use crate::service::NoteService;
use crate::storage::Database;
use crate::AppState;

pub fn test_config(temp_dir: &tempfile::TempDir) -> Config {
    Config {
        auth: AuthConfig {
            jwt_secret: "test-secret".to_string(),
            token_ttl_days: 7,
        },
        node: NodeConfig {
            bind_address: "127.0.0.1:0".to_string(),
            data_dir: temp_dir.path().join("data").to_string_lossy().to_string(),
        },
        storage: StorageConfig {
            upload_dir: temp_dir
                .path()
                .join("uploads")
                .to_string_lossy()
                .to_string(),
            ..Default::default()
        },
        upload: UploadConfig {
            max_upload_size: 1024 * 1024, // 1MB for tests
            ..Default::default()
        },
    }
}

/// Create a test AppState with a temporary database and local blob store.
pub fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    let config = test_config(temp_dir);
    let db = Database::open(&config.node.data_dir).expect("Failed to open test database");
    let blobs =
        LocalStore::new(&config.storage.upload_dir).expect("Failed to create test blob store");

    Arc::new(AppState::new(config, db, Arc::new(blobs)))
}

pub fn test_service(temp_dir: &tempfile::TempDir) -> NoteService {
    test_state(temp_dir).notes.clone()
}

/// A service over fresh stores with a short store timeout. The database
/// handle is returned so tests can hold its writer.
pub fn test_service_with_timeout(
    temp_dir: &tempfile::TempDir,
    store_timeout: Duration,
) -> (NoteService, Database) {
    let config = test_config(temp_dir);
    let db = Database::open(&config.node.data_dir).expect("Failed to open test database");
    let blobs =
        LocalStore::new(&config.storage.upload_dir).expect("Failed to create test blob store");
    let service = NoteService::new(db.clone(), Arc::new(blobs), config.upload, store_timeout);
    (service, db)
}

/// A service whose blob store fails every call.
pub fn test_service_with_offline_blobs(temp_dir: &tempfile::TempDir) -> NoteService {
    let config = test_config(temp_dir);
    let db = Database::open(&config.node.data_dir).expect("Failed to open test database");
    NoteService::new(
        db,
        Arc::new(OfflineStore),
        config.upload,
        config.storage.store_timeout,
    )
}

/// Blob store double standing in for an unreachable disk.
pub struct OfflineStore;

fn offline() -> BlobStoreError {
    BlobStoreError::Io(std::io::Error::other("blob store offline"))
}

#[async_trait]
impl BlobStore for OfflineStore {
    async fn put(&self, _key: &str, _data: Bytes) -> Result<(), BlobStoreError> {
        Err(offline())
    }

    async fn open(&self, _key: &str) -> Result<BlobReader, BlobStoreError> {
        Err(offline())
    }

    async fn delete(&self, _key: &str) -> Result<(), BlobStoreError> {
        Err(offline())
    }

    async fn exists(&self, _key: &str) -> Result<bool, BlobStoreError> {
        Err(offline())
    }
}

/// Hold the database writer on another thread until the returned sender is
/// dropped or signalled. Returns once the writer is held.
pub fn hold_writer(db: &Database) -> (std::sync::mpsc::Sender<()>, std::thread::JoinHandle<()>) {
    let (held_tx, held_rx) = std::sync::mpsc::channel();
    let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
    let db = db.clone();

    let handle = std::thread::spawn(move || {
        let txn = db.begin_write().expect("Failed to begin holding write");
        held_tx.send(()).expect("Test dropped the writer guard");
        let _ = release_rx.recv();
        txn.abort().expect("Failed to release writer");
    });

    held_rx.recv().expect("Writer thread died");
    (release_tx, handle)
}
