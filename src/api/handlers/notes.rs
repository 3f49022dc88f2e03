use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::response::{ApiError, AppQuery, JSend, MaybeClaims};
use crate::service::{NoteFields, ServiceError, Upload};
use crate::storage::models::{parse_tags, NoteRecord};
use crate::storage::NoteQuery;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

/// Public view of a note. Never carries the file bytes.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    pub id: String,
    pub title: Option<String>,
    pub subject_code: Option<String>,
    pub subject_title: Option<String>,
    pub semester: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub uploader_id: Option<String>,
    pub file_name: String,
    pub storage_name: String,
    pub content_type: String,
    pub byte_size: u64,
    pub downloads: u64,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub note: NoteResponse,
}

#[derive(Debug, Deserialize)]
pub struct ListNotesParams {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub semester: Option<String>,
    /// Comma-delimited
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn upload_note(
    State(state): State<Arc<AppState>>,
    MaybeClaims(claims): MaybeClaims,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<JSend<UploadResponse>>), ApiError> {
    let max_upload_size = state.notes.max_upload_size();
    let mut upload: Option<Upload> = None;
    let mut fields = NoteFields::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_upload_size))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let original_filename = field.file_name().map(|s| s.to_string());
                let content_type = field.content_type().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, max_upload_size))?;

                upload = Some(Upload {
                    bytes,
                    content_type,
                    original_filename,
                });
            }
            "title" => fields.title = text_field(field).await?,
            "subjectCode" | "subject_code" | "subject" => {
                fields.subject_code = text_field(field).await?
            }
            "subjectTitle" | "subject_title" => fields.subject_title = text_field(field).await?,
            "semester" => fields.semester = text_field(field).await?,
            "description" => fields.description = text_field(field).await?,
            "tags" => {
                fields.tags = text_field(field)
                    .await?
                    .map(|raw| parse_tags(&raw))
                    .unwrap_or_default()
            }
            "uploaderId" | "uploader_id" | "userID" | "uploader" => {
                fields.uploader_id = text_field(field).await?
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    if fields.uploader_id.is_none() {
        fields.uploader_id = claims.map(|c| c.sub);
    }

    let note = state.notes.ingest(upload, fields).await?;

    Ok(JSend::created(UploadResponse {
        message: "File uploaded & metadata saved".to_string(),
        note: note_to_response(&note),
    }))
}

pub async fn list_notes(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<ListNotesParams>,
) -> Result<Json<JSend<Vec<NoteResponse>>>, ApiError> {
    let query = NoteQuery::from_params(
        params.subject.as_deref(),
        params.semester.as_deref(),
        params.tags.as_deref(),
        params.sort.as_deref(),
    );

    let notes = state.notes.list(query).await?;
    Ok(JSend::success(notes.iter().map(note_to_response).collect()))
}

// ============================================================================
// Helpers
// ============================================================================

/// Read a text part; blank values count as absent.
async fn text_field(field: Field<'_>) -> Result<Option<String>, ApiError> {
    let name = field.name().unwrap_or("field").to_string();
    let text = field
        .text()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid {name}: {e}")))?;

    let trimmed = text.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

fn multipart_error(e: MultipartError, max_upload_size: u64) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ServiceError::FileTooLarge {
            limit: max_upload_size,
        }
        .into();
    }
    ApiError::bad_request(format!("Invalid multipart data: {}", e.body_text()))
}

fn note_to_response(note: &NoteRecord) -> NoteResponse {
    NoteResponse {
        id: note.id.clone(),
        title: note.title.clone(),
        subject_code: note.subject_code.clone(),
        subject_title: note.subject_title.clone(),
        semester: note.semester.clone(),
        description: note.description.clone(),
        tags: note.tags.clone(),
        uploader_id: note.uploader_id.clone(),
        file_name: note.original_filename.clone(),
        storage_name: note.storage_name.clone(),
        content_type: note.content_type.clone(),
        byte_size: note.byte_size,
        downloads: note.downloads,
        created_at: note.created_at.to_rfc3339(),
    }
}
