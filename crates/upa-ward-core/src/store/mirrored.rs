//! Remote-first store with a local mirror.
//!
//! Every remote write goes through a per-collection outbox kept in local storage.
//! An entry leaves the outbox only once the remote store has accepted it, and
//! entries still queued are laid over whatever the remote store returns.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::{
    Collection, DataApiClient, RecordStore, RemoteError, RemoteResult, RemoteStore, RemoteSync,
    StoreResult,
};
use crate::config::StoreConfig;
use crate::db::Database;

/// A single document-level change between two snapshots.
#[derive(Debug, PartialEq)]
pub(crate) enum RemoteChange<'a> {
    Insert(&'a Value),
    Update { id: &'a str, document: &'a Value },
    Delete { id: &'a str },
}

/// A change the remote store has not yet accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub(crate) enum PendingChange {
    Insert { document: Value },
    Update { id: String, document: Value },
    Delete { id: String },
}

impl PendingChange {
    fn id(&self) -> Option<&str> {
        match self {
            PendingChange::Insert { document } => document_id(document),
            PendingChange::Update { id, .. } | PendingChange::Delete { id } => Some(id.as_str()),
        }
    }

    fn push(&self, remote: &dyn RemoteStore, collection: &str) -> RemoteResult<()> {
        match self {
            PendingChange::Insert { document } => remote.insert_one(collection, document),
            PendingChange::Update { id, document } => remote.update_one(
                collection,
                &json!({ "id": id }),
                &json!({ "$set": document }),
            ),
            PendingChange::Delete { id } => remote.delete_one(collection, &json!({ "id": id })),
        }
    }
}

impl From<RemoteChange<'_>> for PendingChange {
    fn from(change: RemoteChange<'_>) -> Self {
        match change {
            RemoteChange::Insert(document) => PendingChange::Insert {
                document: document.clone(),
            },
            RemoteChange::Update { id, document } => PendingChange::Update {
                id: id.to_string(),
                document: document.clone(),
            },
            RemoteChange::Delete { id } => PendingChange::Delete { id: id.to_string() },
        }
    }
}

/// Record store that reads from the remote store when it can and always writes
/// through to the local database.
pub struct MirroredStore {
    local: Database,
    remote: Option<Box<dyn RemoteStore>>,
}

impl MirroredStore {
    /// Wrap a local database and an optional remote store.
    pub fn new(local: Database, remote: Option<Box<dyn RemoteStore>>) -> Self {
        Self { local, remote }
    }

    /// Local-only store.
    pub fn local_only(local: Database) -> Self {
        Self::new(local, None)
    }

    /// Build from configuration. A remote client that cannot be built is logged and
    /// the store runs local-only.
    pub fn from_config(local: Database, config: &StoreConfig) -> Self {
        let Some(settings) = &config.remote else {
            info!("no remote store configured, using local storage only");
            return Self::local_only(local);
        };

        match DataApiClient::new(settings) {
            Ok(client) => {
                info!(endpoint = %settings.endpoint, "remote store enabled");
                Self::new(local, Some(Box::new(client)))
            }
            Err(err) => {
                warn!(error = %err, "could not build remote client, using local storage only");
                Self::local_only(local)
            }
        }
    }

    /// The local database.
    pub fn local(&self) -> &Database {
        &self.local
    }

    /// Whether a remote store is attached.
    pub fn is_remote_enabled(&self) -> bool {
        self.remote.is_some()
    }

    /// Number of changes in `collection` not yet accepted by the remote store.
    pub fn pending_count(&self, collection: Collection) -> StoreResult<usize> {
        Ok(self.pending_changes(collection)?.len())
    }

    fn remote_target(&self, collection: Collection) -> Option<(&dyn RemoteStore, &'static str)> {
        match (self.remote.as_deref(), collection.remote_name()) {
            (Some(remote), Some(name)) => Some((remote, name)),
            _ => None,
        }
    }

    pub(crate) fn pending_changes(&self, collection: Collection) -> StoreResult<Vec<PendingChange>> {
        self.local
            .load_documents(collection.pending_key())?
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    fn store_pending(&self, collection: Collection, pending: &[PendingChange]) -> StoreResult<()> {
        let documents = pending
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        self.local
            .store_documents(collection.pending_key(), &documents)?;
        Ok(())
    }

    fn queue(&self, collection: Collection, changes: Vec<PendingChange>) -> StoreResult<()> {
        if changes.is_empty() {
            return Ok(());
        }
        let mut pending = self.pending_changes(collection)?;
        for change in changes {
            merge_pending(&mut pending, change);
        }
        self.store_pending(collection, &pending)
    }

    /// Push queued changes in order. Accepted entries leave the outbox; the first
    /// rejection stops the flush and is returned.
    fn flush_pending(
        &self,
        remote: &dyn RemoteStore,
        collection: Collection,
        name: &str,
    ) -> StoreResult<Option<RemoteError>> {
        let mut pending = self.pending_changes(collection)?;
        if pending.is_empty() {
            return Ok(None);
        }

        let mut failure = None;
        let mut pushed = 0;
        for change in &pending {
            if let Err(err) = change.push(remote, name) {
                failure = Some(err);
                break;
            }
            pushed += 1;
        }

        pending.drain(..pushed);
        self.store_pending(collection, &pending)?;
        debug!(collection = name, pushed, remaining = pending.len(), "flushed pending changes");
        Ok(failure)
    }

    /// On first contact with a remote store, queue local records it does not have
    /// so switching a terminal to shared storage keeps its history.
    fn adopt_local_records(&self, collection: Collection, remote_documents: &[Value]) -> StoreResult<()> {
        let linked_key = collection.linked_key();
        if self.local.get_entry(linked_key)?.is_some() {
            return Ok(());
        }

        let local_only: Vec<PendingChange> = self
            .local
            .load_documents(collection.local_key())?
            .into_iter()
            .filter(|document| match document_id(document) {
                Some(id) => !remote_documents.iter().any(|r| document_id(r) == Some(id)),
                None => false,
            })
            .map(|document| PendingChange::Insert { document })
            .collect();

        if !local_only.is_empty() {
            info!(
                collection = collection.remote_name().unwrap_or_default(),
                records = local_only.len(),
                "queueing local records for the remote store"
            );
        }
        self.queue(collection, local_only)?;
        self.local.set_entry(linked_key, "true")?;
        Ok(())
    }

    /// Remote documents with queued local changes laid over them, or `None` when the
    /// remote store cannot be read.
    fn load_remote(
        &self,
        remote: &dyn RemoteStore,
        collection: Collection,
        name: &str,
    ) -> StoreResult<Option<Vec<Value>>> {
        let documents: Vec<Value> = match remote.find(name, &json!({})) {
            Ok(documents) => documents.into_iter().map(strip_remote_id).collect(),
            Err(err) => {
                warn!(collection = name, error = %err, "remote read failed, using local copy");
                return Ok(None);
            }
        };

        if let Err(err) = collection.check_documents(&documents) {
            warn!(collection = name, error = %err, "remote documents unreadable, using local copy");
            return Ok(None);
        }

        self.adopt_local_records(collection, &documents)?;

        let pending = self.pending_changes(collection)?;
        if let Some(err) = self.flush_pending(remote, collection, name)? {
            warn!(collection = name, error = %err, "could not push pending changes");
        }

        Ok(Some(apply_pending(documents, &pending)))
    }
}

impl RecordStore for MirroredStore {
    fn load(&self, collection: Collection) -> StoreResult<Vec<Value>> {
        let key = collection.local_key();

        if let Some((remote, name)) = self.remote_target(collection) {
            if let Some(documents) = self.load_remote(remote, collection, name)? {
                if let Err(err) = self.local.store_documents(key, &documents) {
                    warn!(collection = name, error = %err, "could not mirror remote documents locally");
                }
                return Ok(documents);
            }
        }

        Ok(self.local.load_documents(key)?)
    }

    fn save(&self, collection: Collection, records: &[Value]) -> StoreResult<RemoteSync> {
        let key = collection.local_key();

        let Some((remote, name)) = self.remote_target(collection) else {
            self.local.store_documents(key, records)?;
            return Ok(RemoteSync::LocalOnly);
        };

        let previous = self.local.load_documents(key)?;
        self.local.store_documents(key, records)?;

        let changes = plan_changes(&previous, records)
            .into_iter()
            .map(PendingChange::from)
            .collect();
        self.queue(collection, changes)?;

        match self.flush_pending(remote, collection, name)? {
            None => Ok(RemoteSync::Synced),
            Some(err) => {
                warn!(collection = name, error = %err, "remote write failed, kept local copy");
                Ok(RemoteSync::Failed {
                    reason: err.to_string(),
                })
            }
        }
    }
}

/// Fold a new change into the outbox, keeping one entry per document id.
pub(crate) fn merge_pending(pending: &mut Vec<PendingChange>, change: PendingChange) {
    let Some(id) = change.id().map(str::to_owned) else {
        pending.push(change);
        return;
    };
    let Some(index) = pending.iter().position(|p| p.id() == Some(id.as_str())) else {
        pending.push(change);
        return;
    };

    let merged = match (&pending[index], change) {
        // never reached the remote store
        (PendingChange::Insert { .. }, PendingChange::Delete { .. }) => None,
        (
            PendingChange::Insert { .. },
            PendingChange::Insert { document } | PendingChange::Update { document, .. },
        ) => Some(PendingChange::Insert { document }),
        // still present remotely
        (PendingChange::Delete { .. }, PendingChange::Insert { document }) => {
            Some(PendingChange::Update { id, document })
        }
        (_, change) => Some(change),
    };

    match merged {
        Some(change) => pending[index] = change,
        None => {
            pending.remove(index);
        }
    }
}

/// Lay queued changes over a remote snapshot.
fn apply_pending(mut documents: Vec<Value>, pending: &[PendingChange]) -> Vec<Value> {
    for change in pending {
        match change {
            PendingChange::Insert { document } | PendingChange::Update { document, .. } => {
                let existing = document_id(document)
                    .and_then(|id| documents.iter().position(|d| document_id(d) == Some(id)));
                match existing {
                    Some(index) => documents[index] = document.clone(),
                    None => documents.push(document.clone()),
                }
            }
            PendingChange::Delete { id } => {
                documents.retain(|d| document_id(d) != Some(id.as_str()));
            }
        }
    }
    documents
}

/// Drop the remote store's own `_id` so local documents keep the ward's shape.
fn strip_remote_id(mut document: Value) -> Value {
    if let Value::Object(map) = &mut document {
        map.remove("_id");
    }
    document
}

fn document_id(document: &Value) -> Option<&str> {
    document.get("id").and_then(Value::as_str)
}

/// Diff two snapshots of a collection by `id`.
pub(crate) fn plan_changes<'a>(previous: &'a [Value], current: &'a [Value]) -> Vec<RemoteChange<'a>> {
    let mut changes = Vec::new();

    for document in current {
        let Some(id) = document_id(document) else {
            changes.push(RemoteChange::Insert(document));
            continue;
        };
        match previous.iter().find(|p| document_id(p) == Some(id)) {
            None => changes.push(RemoteChange::Insert(document)),
            Some(old) if old != document => changes.push(RemoteChange::Update { id, document }),
            Some(_) => {}
        }
    }

    for old in previous {
        if let Some(id) = document_id(old) {
            if !current.iter().any(|d| document_id(d) == Some(id)) {
                changes.push(RemoteChange::Delete { id });
            }
        }
    }

    changes
}
