//! Remote fallback integration tests against an unreachable Data API endpoint.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use serde_json::{json, Value};
use upa_ward_core::config::RemoteSettings;
use upa_ward_core::db::Database;
use upa_ward_core::models::{Bed, Gender, PatientInput};
use upa_ward_core::repo::{DigitizerRepository, PatientRepository};
use upa_ward_core::store::{
    Collection, DataApiClient, MirroredStore, RecordStore, RemoteError, RemoteResult, RemoteStore,
    RemoteSync,
};

/// Shared in-memory collection that can be taken offline.
#[derive(Clone, Default)]
struct SharedRemote {
    down: Arc<AtomicBool>,
    documents: Arc<Mutex<Vec<Value>>>,
}

impl SharedRemote {
    fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> RemoteResult<()> {
        if self.down.load(Ordering::SeqCst) {
            return Err(RemoteError::Status {
                status: 503,
                body: "down".to_string(),
            });
        }
        Ok(())
    }
}

impl RemoteStore for SharedRemote {
    fn find(&self, _: &str, _: &Value) -> RemoteResult<Vec<Value>> {
        self.check()?;
        Ok(self.documents.lock().unwrap().clone())
    }

    fn insert_one(&self, _: &str, document: &Value) -> RemoteResult<()> {
        self.check()?;
        self.documents.lock().unwrap().push(document.clone());
        Ok(())
    }

    fn update_one(&self, _: &str, filter: &Value, update: &Value) -> RemoteResult<()> {
        self.check()?;
        let mut documents = self.documents.lock().unwrap();
        if let Some(doc) = documents.iter_mut().find(|d| d["id"] == filter["id"]) {
            *doc = update["$set"].clone();
        }
        Ok(())
    }

    fn delete_one(&self, _: &str, filter: &Value) -> RemoteResult<()> {
        self.check()?;
        self.documents
            .lock()
            .unwrap()
            .retain(|d| d["id"] != filter["id"]);
        Ok(())
    }
}

fn shared_store(remote: &SharedRemote) -> MirroredStore {
    MirroredStore::new(
        Database::open_in_memory().unwrap(),
        Some(Box::new(remote.clone())),
    )
}

/// A patient as written by the browser client: no `updatedAt`.
fn browser_patient() -> Value {
    json!({
        "id": "k3x9a1",
        "name": "Valentina",
        "birthDate": "2018-09-14",
        "gender": "F",
        "motherName": "Renata",
        "bed": "Nebolização",
        "diagnosis": "Pneumonia",
        "antibiotics": ["Ceftriaxona"],
        "entryDate": "2024-04-02",
        "dischargeDate": null,
        "digitizerId": "1",
        "createdAt": "2024-04-02T09:30:00.000Z"
    })
}

fn unreachable_store() -> MirroredStore {
    let mut settings = RemoteSettings::new("http://127.0.0.1:9/app/data-api/v1", "test-key");
    settings.timeout = Duration::from_secs(2);
    let client = DataApiClient::new(&settings).unwrap();
    MirroredStore::new(Database::open_in_memory().unwrap(), Some(Box::new(client)))
}

fn make_input() -> PatientInput {
    PatientInput {
        name: Some("Theo".to_string()),
        birth_date: Some(NaiveDate::from_ymd_opt(2021, 11, 2).unwrap()),
        gender: Some(Gender::Male),
        mother_name: Some("Lívia".to_string()),
        bed: Some(Bed::Nebulization),
        diagnosis: Some("Laringite".to_string()),
        entry_date: Some(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()),
        digitizer_id: Some("1".to_string()),
        ..Default::default()
    }
}

#[test]
fn test_write_kept_locally_when_remote_down() {
    let store = unreachable_store();
    let repo = PatientRepository::new(&store);

    let saved = repo.save(make_input()).unwrap();
    assert!(saved.remote.is_degraded());
    assert!(saved.remote.warning().is_some());

    // Read falls back to the local copy
    let found = repo.find_one(&saved.record.id).unwrap().unwrap();
    assert_eq!(found, saved.record);

    let raw = store.local().load_documents(Collection::Patients.local_key()).unwrap();
    assert_eq!(raw.len(), 1);
}

#[test]
fn test_seed_works_offline() {
    let store = unreachable_store();
    let digitizers = DigitizerRepository::new(&store).find().unwrap();
    assert_eq!(digitizers.len(), 1);
    assert_eq!(digitizers[0].name, "Admin Central");
}

#[test]
fn test_session_never_touches_remote() {
    let store = unreachable_store();
    let remote = store
        .save(Collection::Session, &[serde_json::json!({"id": "1"})])
        .unwrap();
    assert_eq!(remote, RemoteSync::LocalOnly);
}

#[test]
fn test_degraded_write_survives_remote_recovery() {
    let remote = SharedRemote::default();
    let store = shared_store(&remote);
    let repo = PatientRepository::new(&store);

    remote.set_down(true);
    let saved = repo.save(make_input()).unwrap();
    assert!(saved.remote.is_degraded());
    assert!(repo.find_one(&saved.record.id).unwrap().is_some());

    remote.set_down(false);
    let found = repo.find_one(&saved.record.id).unwrap();
    assert_eq!(found, Some(saved.record.clone()));

    // now on the shared store as well
    let shared = remote.documents.lock().unwrap().clone();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0]["id"], json!(saved.record.id));
    assert_eq!(store.pending_count(Collection::Patients).unwrap(), 0);
}

#[test]
fn test_switching_to_shared_store_keeps_local_history() {
    let db = Database::open_in_memory().unwrap();
    let id = PatientRepository::new(&db)
        .save(make_input())
        .unwrap()
        .record
        .id;

    let remote = SharedRemote::default();
    let store = MirroredStore::new(db, Some(Box::new(remote.clone())));
    let patients = PatientRepository::new(&store).all().unwrap();

    assert_eq!(patients.len(), 1);
    assert_eq!(patients[0].id, id);
    assert_eq!(remote.documents.lock().unwrap().len(), 1);
}

#[test]
fn test_browser_written_patients_readable_online_and_offline() {
    let remote = SharedRemote::default();
    remote.documents.lock().unwrap().push(browser_patient());
    let store = shared_store(&remote);
    let repo = PatientRepository::new(&store);

    let online = repo.all().unwrap();
    assert_eq!(online.len(), 1);
    assert_eq!(online[0].updated_at, online[0].created_at);
    assert_eq!(online[0].bed, Bed::Nebulization);

    remote.set_down(true);
    let offline = repo.all().unwrap();
    assert_eq!(offline, online);
}

#[test]
fn test_unreadable_remote_patients_keep_local_copy() {
    let remote = SharedRemote::default();
    let store = shared_store(&remote);
    let repo = PatientRepository::new(&store);
    let saved = repo.save(make_input()).unwrap().record;

    remote
        .documents
        .lock()
        .unwrap()
        .push(json!({"id": "broken", "name": "sem campos"}));

    let patients = repo.all().unwrap();
    assert_eq!(patients, vec![saved]);

    remote.set_down(true);
    assert_eq!(repo.all().unwrap().len(), 1);
}
