//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use trivia_core::model::CategoryId;

/// Errors emitted by `ContentApiClient`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentApiError {
    #[error("content api request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("could not encode content api query parameters: {0}")]
    EncodeParams(#[source] serde_json::Error),
    #[error("content api returned a malformed body: {0}")]
    Decode(#[source] serde_json::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl From<ContentApiError> for StorageError {
    fn from(err: ContentApiError) -> Self {
        match err {
            ContentApiError::Decode(err) | ContentApiError::EncodeParams(err) => {
                StorageError::Serialization(err.to_string())
            }
            other => StorageError::Connection(other.to_string()),
        }
    }
}

/// Errors emitted by `CatalogService` and quiz lookups.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error("unknown category: {0}")]
    UnknownCategory(CategoryId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SettingsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
