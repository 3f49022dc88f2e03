mod auth;
mod downloads;
mod health;
mod notes;

use crate::api::response::ApiError;
use crate::auth::AuthError;
use crate::service::ServiceError;

pub use auth::{login, register};
pub use downloads::{download_note, serve_file};
pub use health::health;
pub use notes::{list_notes, upload_note, NoteResponse};

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::InvalidFileType(_)
            | ServiceError::FileTooLarge { .. }
            | ServiceError::NoFileProvided => ApiError::bad_request(e.to_string()),
            ServiceError::NotFound(_) => ApiError::not_found(e.to_string()),
            ServiceError::PersistenceFailure(_) => {
                tracing::error!(error = %e, "Upload failed");
                ApiError::internal(e.to_string())
            }
            ServiceError::StorageUnavailable(_) => {
                tracing::error!(error = %e, "Store unavailable");
                ApiError::internal(e.to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingField(_) => ApiError::bad_request(e.to_string()),
            AuthError::EmailTaken => ApiError::conflict(e.to_string()),
            AuthError::InvalidCredentials | AuthError::InvalidToken => {
                ApiError::unauthorized(e.to_string())
            }
            AuthError::StorageUnavailable(_) | AuthError::Internal(_) => {
                tracing::error!(error = %e, "Auth request failed");
                ApiError::internal(e.to_string())
            }
        }
    }
}
