//! note-share - A note and file sharing backend for academic uploads
//!
//! This crate provides note upload, metadata querying and downloads with:
//! - A swappable blob store for file bytes (local filesystem)
//! - redb embedded database for note metadata and accounts (ACID, crash-safe)
//! - Atomic download counting
//! - REST API with multipart upload support and bearer-token login

pub mod api;
pub mod auth;
pub mod blob_store;
pub mod config;
pub mod service;
pub mod storage;
#[cfg(test)]
pub mod testutil;

use std::sync::Arc;

use auth::{AuthService, TokenIssuer};
use blob_store::BlobStore;
use config::Config;
use service::NoteService;
use storage::Database;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub auth: AuthService,
    pub notes: NoteService,
}

impl AppState {
    /// Wire services to the given store handles.
    pub fn new(config: Config, db: Database, blobs: Arc<dyn BlobStore>) -> Self {
        let notes = NoteService::new(
            db.clone(),
            blobs,
            config.upload.clone(),
            config.storage.store_timeout,
        );
        let auth = AuthService::new(
            db,
            TokenIssuer::new(&config.auth),
            config.storage.store_timeout,
        );

        Self {
            config,
            auth,
            notes,
        }
    }
}
