//! Repositories over the record store.
//!
//! Every mutation is a read-modify-write of the whole collection.

mod digitizers;
mod patients;
mod session;

pub use digitizers::*;
pub use patients::*;
pub use session::*;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::store::{Collection, RecordStore, RemoteSync, StoreError};
use crate::validation::ValidationError;

/// Repository errors.
#[derive(Error, Debug)]
pub enum RepoError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Result of a write: the resulting record plus what happened remotely.
#[derive(Debug, Clone, PartialEq)]
pub struct Persisted<T> {
    pub record: T,
    pub remote: RemoteSync,
}

pub(crate) fn load_records<T: DeserializeOwned>(
    store: &dyn RecordStore,
    collection: Collection,
) -> RepoResult<Vec<T>> {
    store
        .load(collection)?
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

pub(crate) fn save_records<T: Serialize>(
    store: &dyn RecordStore,
    collection: Collection,
    records: &[T],
) -> RepoResult<RemoteSync> {
    let documents = records
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(store.save(collection, &documents)?)
}
