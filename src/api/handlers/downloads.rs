use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::api::response::ApiError;
use crate::blob_store::BlobReader;
use crate::AppState;

/// Count a download and stream the note as an attachment.
/// Route: GET /download/:id
pub async fn download_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let download = state.notes.retrieve_by_id(&id).await?;

    let mut response = stream_response(download.blob, &download.content_type);
    response.headers_mut().insert(
        header::CONTENT_DISPOSITION,
        attachment_disposition(&download.filename),
    );

    Ok(response)
}

/// Stream a stored file by its storage name without counting a download.
/// Route: GET /files/file/:filename
pub async fn serve_file(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let file = state.notes.retrieve_by_filename(&filename).await?;
    Ok(stream_response(file.blob, &file.content_type))
}

fn stream_response(blob: BlobReader, content_type: &str) -> Response {
    // Dropping the body (client hung up) stops reading the file
    let body = Body::from_stream(ReaderStream::new(blob.reader));
    let mut response = (StatusCode::OK, body).into_response();
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_TYPE,
        content_type
            .parse()
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(blob.size));

    response
}

/// `attachment; filename="..."`, adding an RFC 5987 `filename*` when the
/// name is not plain ASCII.
fn attachment_disposition(filename: &str) -> HeaderValue {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            ' '..='~' if c != '"' && c != '\\' => c,
            _ => '_',
        })
        .collect();

    let mut value = format!("attachment; filename=\"{fallback}\"");
    if fallback != filename {
        value.push_str("; filename*=UTF-8''");
        for byte in filename.bytes() {
            match byte {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'-' | b'_' | b'~' => {
                    value.push(byte as char)
                }
                _ => value.push_str(&format!("%{byte:02X}")),
            }
        }
    }

    HeaderValue::from_str(&value).unwrap_or(HeaderValue::from_static("attachment"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_disposition_ascii() {
        assert_eq!(
            attachment_disposition("notes.pdf"),
            "attachment; filename=\"notes.pdf\""
        );
    }

    #[test]
    fn test_attachment_disposition_escapes_quotes() {
        assert_eq!(
            attachment_disposition("a\"b.pdf"),
            "attachment; filename=\"a_b.pdf\"; filename*=UTF-8''a%22b.pdf"
        );
    }

    #[test]
    fn test_attachment_disposition_unicode() {
        assert_eq!(
            attachment_disposition("é.pdf"),
            "attachment; filename=\"_.pdf\"; filename*=UTF-8''%C3%A9.pdf"
        );
    }
}
