//! Record store adapter.
//!
//! Repositories see a [`RecordStore`]: load a whole collection, replace a whole
//! collection. [`Database`] is the local implementation; [`MirroredStore`] tries the
//! remote document store first and keeps the local copy in step.

mod mirrored;
mod remote;

pub use mirrored::*;
pub use remote::*;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::db::{Database, DbError};
use crate::models::{Digitizer, Patient};

/// Store errors. Remote failures never show up here; they degrade to local storage.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Local storage error: {0}")]
    Db(#[from] DbError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Logical collections kept by the ward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Patients,
    Digitizers,
    /// Pointer to the digitizer using this terminal
    Session,
}

impl Collection {
    /// Key under which the collection is kept locally.
    pub fn local_key(&self) -> &'static str {
        match self {
            Collection::Patients => "upa_patients",
            Collection::Digitizers => "upa_digitizers",
            Collection::Session => "upa_session",
        }
    }

    /// Remote collection name. The session pointer never leaves the terminal.
    pub fn remote_name(&self) -> Option<&'static str> {
        match self {
            Collection::Patients => Some("patients"),
            Collection::Digitizers => Some("digitizers"),
            Collection::Session => None,
        }
    }

    /// Local key of the changes still owed to the remote store.
    pub fn pending_key(&self) -> &'static str {
        match self {
            Collection::Patients => "upa_pending_patients",
            Collection::Digitizers => "upa_pending_digitizers",
            Collection::Session => "upa_pending_session",
        }
    }

    /// Local marker set once the local copy has been reconciled with a remote store.
    pub fn linked_key(&self) -> &'static str {
        match self {
            Collection::Patients => "upa_linked_patients",
            Collection::Digitizers => "upa_linked_digitizers",
            Collection::Session => "upa_linked_session",
        }
    }

    /// Check that documents written by another client parse as this collection's records.
    pub fn check_documents(&self, documents: &[Value]) -> Result<(), serde_json::Error> {
        match self {
            Collection::Patients => parse_all::<Patient>(documents),
            Collection::Digitizers => parse_all::<Digitizer>(documents),
            Collection::Session => Ok(()),
        }
    }
}

fn parse_all<T: DeserializeOwned>(documents: &[Value]) -> Result<(), serde_json::Error> {
    for document in documents {
        serde_json::from_value::<T>(document.clone())?;
    }
    Ok(())
}

/// What happened to the remote copy during a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteSync {
    /// Nothing needed writing
    Unchanged,
    /// No remote store configured
    LocalOnly,
    /// Local and remote copies both updated
    Synced,
    /// Local copy updated, remote copy not
    Failed { reason: String },
}

impl RemoteSync {
    /// True when the shared store may be missing this write.
    pub fn is_degraded(&self) -> bool {
        matches!(self, RemoteSync::Failed { .. })
    }

    /// Warning text for the caller, if any.
    pub fn warning(&self) -> Option<&str> {
        match self {
            RemoteSync::Failed { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Whole-collection persistence.
pub trait RecordStore {
    /// Load every record in a collection.
    fn load(&self, collection: Collection) -> StoreResult<Vec<Value>>;

    /// Replace every record in a collection.
    fn save(&self, collection: Collection, records: &[Value]) -> StoreResult<RemoteSync>;
}

impl RecordStore for Database {
    fn load(&self, collection: Collection) -> StoreResult<Vec<Value>> {
        Ok(self.load_documents(collection.local_key())?)
    }

    fn save(&self, collection: Collection, records: &[Value]) -> StoreResult<RemoteSync> {
        self.store_documents(collection.local_key(), records)?;
        Ok(RemoteSync::LocalOnly)
    }
}
