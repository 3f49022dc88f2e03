use std::path::Path;

use bytes::Bytes;
use chrono::Utc;

use super::{NoteService, ServiceError};
use crate::storage::models::NoteRecord;

/// The binary part of an upload.
#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Bytes,
    pub content_type: Option<String>,
    pub original_filename: Option<String>,
}

/// Descriptive fields submitted alongside an upload.
#[derive(Debug, Clone, Default)]
pub struct NoteFields {
    pub title: Option<String>,
    pub subject_code: Option<String>,
    pub subject_title: Option<String>,
    pub semester: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub uploader_id: Option<String>,
}

impl NoteService {
    /// Validate an upload, store its bytes, then record its metadata.
    ///
    /// Nothing is written unless validation passes. The metadata record is
    /// written only after the blob is durable; if that write fails the blob
    /// is removed on a best-effort basis.
    pub async fn ingest(
        &self,
        upload: Option<Upload>,
        fields: NoteFields,
    ) -> Result<NoteRecord, ServiceError> {
        let upload = upload
            .filter(|u| !u.bytes.is_empty())
            .ok_or(ServiceError::NoFileProvided)?;

        let byte_size = upload.bytes.len() as u64;
        if byte_size > self.upload.max_upload_size {
            return Err(ServiceError::FileTooLarge {
                limit: self.upload.max_upload_size,
            });
        }

        let original_filename = upload
            .original_filename
            .as_deref()
            .map(display_name)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ServiceError::InvalidFileType("file has no name".to_string()))?;

        let extension = file_extension(&original_filename)
            .filter(|ext| self.upload.allowed_extensions.contains(ext))
            .ok_or_else(|| {
                ServiceError::InvalidFileType(format!(
                    "'{original_filename}' is not one of: {}",
                    self.upload.allowed_extensions.join(", ")
                ))
            })?;

        let content_type = upload
            .content_type
            .filter(|ct| !ct.is_empty() && ct != "application/octet-stream")
            .or_else(|| {
                mime_guess::from_path(&original_filename)
                    .first()
                    .map(|m| m.to_string())
            })
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let now = Utc::now();
        let storage_name = storage_name(now.timestamp_millis(), &extension);

        // Phase 1: blob
        self.with_timeout(self.blobs.put(&storage_name, upload.bytes))
            .await
            .map_err(ServiceError::into_persistence)?
            .map_err(|e| ServiceError::PersistenceFailure(format!("Failed to store file: {e}")))?;

        // Phase 2: metadata referencing the stored blob
        let note = NoteRecord {
            id: uuid::Uuid::now_v7().to_string(),
            storage_name: storage_name.clone(),
            original_filename,
            content_type,
            byte_size,
            downloads: 0,
            created_at: now,
            title: fields.title,
            subject_code: fields.subject_code,
            subject_title: fields.subject_title,
            semester: fields.semester,
            description: fields.description,
            tags: fields.tags,
            uploader_id: fields.uploader_id,
        };

        let record = note.clone();
        if let Err(e) = self
            .run_write(move |db, gate| db.put_note_with(&record, gate))
            .await
        {
            if let Err(cleanup) = self.blobs.delete(&storage_name).await {
                tracing::warn!(
                    storage_name = %storage_name,
                    error = %cleanup,
                    "Failed to remove orphaned blob"
                );
            }
            return Err(e.into_persistence());
        }

        tracing::info!(
            note_id = %note.id,
            storage_name = %note.storage_name,
            byte_size = note.byte_size,
            "Ingested note"
        );

        Ok(note)
    }
}

/// Strip any client-supplied directory components from a filename.
fn display_name(raw: &str) -> String {
    raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim().to_string()
}

/// Lowercased extension of `name`, without the dot.
fn file_extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// `<millis>-<9 hex chars>.<ext>`, unrelated to the uploader's filename.
fn storage_name(millis: i64, extension: &str) -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("{millis}-{}.{extension}", &random[..9])
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testutil::{
        hold_writer, test_service, test_service_with_offline_blobs, test_service_with_timeout,
    };

    fn upload(name: &str, bytes: &'static [u8]) -> Option<Upload> {
        Some(Upload {
            bytes: Bytes::from_static(bytes),
            content_type: None,
            original_filename: Some(name.to_string()),
        })
    }

    fn blob_count(dir: &tempfile::TempDir) -> usize {
        std::fs::read_dir(dir.path().join("uploads"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("notes.PDF"), Some("pdf".to_string()));
        assert_eq!(file_extension("archive.tar.gz"), Some("gz".to_string()));
        assert_eq!(file_extension("README"), None);
        assert_eq!(file_extension(".pdf"), None);
    }

    #[test]
    fn test_display_name_strips_directories() {
        assert_eq!(display_name("C:\\Users\\me\\notes.pdf"), "notes.pdf");
        assert_eq!(display_name("../../etc/notes.pdf"), "notes.pdf");
        assert_eq!(display_name("notes.pdf"), "notes.pdf");
    }

    #[test]
    fn test_storage_name_shape() {
        let name = storage_name(1_700_000_000_000, "pdf");
        assert!(name.starts_with("1700000000000-"));
        assert!(name.ends_with(".pdf"));
        assert_eq!(name.len(), "1700000000000-".len() + 9 + ".pdf".len());
        assert_ne!(name, storage_name(1_700_000_000_000, "pdf"));
    }

    #[tokio::test]
    async fn test_ingest_sets_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let service = test_service(&dir);

        let fields = NoteFields {
            subject_code: Some("CS101".to_string()),
            tags: vec!["exam".to_string()],
            ..Default::default()
        };
        let note = service
            .ingest(upload("notes.pdf", b"%PDF-1.4"), fields)
            .await
            .unwrap();

        assert_eq!(note.downloads, 0);
        assert_eq!(note.byte_size, 8);
        assert_eq!(note.original_filename, "notes.pdf");
        assert_eq!(note.content_type, "application/pdf");
        assert_ne!(note.storage_name, "notes.pdf");
        assert!(note.created_at <= Utc::now());
        assert_eq!(blob_count(&dir), 1);
    }

    #[tokio::test]
    async fn test_ingest_accepts_uppercase_extension() {
        let dir = tempfile::tempdir().unwrap();
        let service = test_service(&dir);

        let note = service
            .ingest(upload("SCAN.JPG", b"\xff\xd8\xff"), NoteFields::default())
            .await
            .unwrap();
        assert!(note.storage_name.ends_with(".jpg"));
        assert_eq!(note.content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_ingest_rejects_disallowed_extension_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let service = test_service(&dir);

        let result = service
            .ingest(upload("virus.exe", b"MZ"), NoteFields::default())
            .await;
        assert!(matches!(result, Err(ServiceError::InvalidFileType(_))));
        assert_eq!(blob_count(&dir), 0);
        assert!(service
            .list(Default::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_ingest_rejects_missing_or_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let service = test_service(&dir);

        let missing = service.ingest(None, NoteFields::default()).await;
        assert!(matches!(missing, Err(ServiceError::NoFileProvided)));

        let empty = service
            .ingest(upload("empty.pdf", b""), NoteFields::default())
            .await;
        assert!(matches!(empty, Err(ServiceError::NoFileProvided)));
        assert_eq!(blob_count(&dir), 0);
    }

    #[tokio::test]
    async fn test_ingest_rejects_oversized_file() {
        let dir = tempfile::tempdir().unwrap();
        let service = test_service(&dir);

        let too_big = vec![0u8; service.max_upload_size() as usize + 1];
        let result = service
            .ingest(
                Some(Upload {
                    bytes: Bytes::from(too_big),
                    content_type: Some("application/pdf".to_string()),
                    original_filename: Some("big.pdf".to_string()),
                }),
                NoteFields::default(),
            )
            .await;
        assert!(matches!(result, Err(ServiceError::FileTooLarge { .. })));
        assert_eq!(blob_count(&dir), 0);
    }

    #[tokio::test]
    async fn test_ingest_rejects_nameless_file() {
        let dir = tempfile::tempdir().unwrap();
        let service = test_service(&dir);

        let result = service
            .ingest(
                Some(Upload {
                    bytes: Bytes::from_static(b"data"),
                    content_type: None,
                    original_filename: None,
                }),
                NoteFields::default(),
            )
            .await;
        assert!(matches!(result, Err(ServiceError::InvalidFileType(_))));
    }

    #[tokio::test]
    async fn test_ingest_metadata_timeout_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let (service, db) = test_service_with_timeout(&dir, Duration::from_millis(200));
        let (release, writer) = hold_writer(&db);

        let result = service
            .ingest(upload("n.pdf", b"%PDF-1.4"), NoteFields::default())
            .await;
        assert!(matches!(result, Err(ServiceError::PersistenceFailure(_))));
        assert_eq!(blob_count(&dir), 0);

        release.send(()).unwrap();
        writer.join().unwrap();

        // The abandoned write now gets the writer and must not commit.
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(db.get_all_notes().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ingest_blob_failure_records_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let service = test_service_with_offline_blobs(&dir);

        let result = service
            .ingest(upload("notes.pdf", b"%PDF-1.4"), NoteFields::default())
            .await;
        assert!(matches!(result, Err(ServiceError::PersistenceFailure(_))));
        assert!(service
            .list(Default::default())
            .await
            .unwrap()
            .is_empty());
    }
}
