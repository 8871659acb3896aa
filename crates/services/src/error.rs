//! Shared error types for the services crate.

use thiserror::Error;

use flashset_core::CodecError;
use flashset_core::model::CardSetError;
use flashset_core::modes::{StudyError, StudyMode};
use storage::repository::StoreError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by a `Generator`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GeneratorError {
    #[error("card generation is not configured")]
    Disabled,
    #[error("card generation request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("card generation timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("card generation returned no cards")]
    EmptyResult,
    #[error("card generation returned an unreadable response: {0}")]
    MalformedResponse(String),
}

/// Errors emitted by the study loop.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StudyServiceError {
    #[error("session is in {actual} mode, not {expected}")]
    WrongMode {
        expected: StudyMode,
        actual: StudyMode,
    },
    #[error(transparent)]
    Study(#[from] StudyError),
    #[error(transparent)]
    CardSet(#[from] CardSetError),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Errors emitted by `CardSetService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CardSetServiceError {
    #[error(transparent)]
    CardSet(#[from] CardSetError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Generator(#[from] GeneratorError),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
