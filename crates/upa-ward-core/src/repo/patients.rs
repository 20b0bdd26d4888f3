//! Patient repository.

use chrono::{Local, NaiveDate, Utc};
use tracing::debug;

use super::{load_records, save_records, Persisted, RepoResult};
use crate::models::{next_timestamp, normalize_antibiotics, Patient, PatientInput, PatientQuery};
use crate::report::{filter_patients, search_name_or_diagnosis, ReportFilter};
use crate::store::{Collection, RecordStore, RemoteSync};
use crate::validation::{validate_patient, ValidationError};

/// CRUD and queries over patient records.
pub struct PatientRepository<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> PatientRepository<'a> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    fn load_all(&self) -> RepoResult<Vec<Patient>> {
        load_records(self.store, Collection::Patients)
    }

    /// Patients matching every field set in `query`, newest first.
    pub fn find(&self, query: &PatientQuery) -> RepoResult<Vec<Patient>> {
        let mut patients: Vec<Patient> = self
            .load_all()?
            .into_iter()
            .filter(|p| query.matches(p))
            .collect();
        patients.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(patients)
    }

    /// Every patient, newest first.
    pub fn all(&self) -> RepoResult<Vec<Patient>> {
        self.find(&PatientQuery::default())
    }

    /// Patients still on the ward, newest first.
    pub fn admitted(&self) -> RepoResult<Vec<Patient>> {
        self.find(&PatientQuery::default().with_discharge_date(None))
    }

    /// Get a patient by id.
    pub fn find_one(&self, id: &str) -> RepoResult<Option<Patient>> {
        Ok(self.load_all()?.into_iter().find(|p| p.id == id))
    }

    /// Report search over every patient (newest first), see [`ReportFilter`].
    pub fn search(&self, filter: &ReportFilter) -> RepoResult<Vec<Patient>> {
        let patients = self.all()?;
        Ok(filter_patients(&patients, filter)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Patient-list lookup by name or diagnosis, newest first.
    pub fn lookup(&self, term: &str) -> RepoResult<Vec<Patient>> {
        let patients = self.all()?;
        Ok(search_name_or_diagnosis(&patients, term)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Insert or update a patient.
    ///
    /// An `id` naming an existing record merges the supplied fields onto it and
    /// refreshes `updated_at`; anything else creates a record with a fresh id.
    pub fn save(&self, input: PatientInput) -> RepoResult<Persisted<Patient>> {
        let mut patients = self.load_all()?;
        let now = Utc::now();

        let existing = input
            .id
            .as_deref()
            .and_then(|id| patients.iter().position(|p| p.id == id));

        let record = match existing {
            Some(index) => {
                let mut patient = patients[index].clone();
                input.apply_to(&mut patient);
                patient.antibiotics = normalize_antibiotics(&patient.antibiotics);
                validate_patient(&patient)?;
                patient.updated_at = next_timestamp(patient.updated_at, now);

                debug!(id = %patient.id, "updating patient");
                patients[index] = patient.clone();
                patient
            }
            None => {
                let patient = new_patient(input, now, Local::now().date_naive())?;
                validate_patient(&patient)?;

                debug!(id = %patient.id, "admitting patient");
                patients.push(patient.clone());
                patient
            }
        };

        let remote = save_records(self.store, Collection::Patients, &patients)?;
        Ok(Persisted { record, remote })
    }

    /// Record a discharge. Returns `None` when no such patient exists.
    pub fn discharge(
        &self,
        id: &str,
        discharge_date: NaiveDate,
    ) -> RepoResult<Option<Persisted<Patient>>> {
        if self.find_one(id)?.is_none() {
            return Ok(None);
        }

        let input = PatientInput {
            discharge_date: Some(Some(discharge_date)),
            ..PatientInput::update(id)
        };
        self.save(input).map(Some)
    }

    /// Delete a patient. Deleting an unknown id changes nothing.
    pub fn delete_one(&self, id: &str) -> RepoResult<Persisted<bool>> {
        let mut patients = self.load_all()?;
        let before = patients.len();
        patients.retain(|p| p.id != id);

        if patients.len() == before {
            return Ok(Persisted {
                record: false,
                remote: RemoteSync::Unchanged,
            });
        }

        debug!(id, "deleting patient");
        let remote = save_records(self.store, Collection::Patients, &patients)?;
        Ok(Persisted {
            record: true,
            remote,
        })
    }
}

/// Build a new record from input, stamping id and timestamps.
fn new_patient(
    input: PatientInput,
    now: chrono::DateTime<Utc>,
    today: NaiveDate,
) -> RepoResult<Patient> {
    fn required<T>(value: Option<T>, field: &'static str) -> Result<T, ValidationError> {
        value.ok_or(ValidationError::MissingField(field))
    }

    Ok(Patient {
        id: uuid::Uuid::new_v4().to_string(),
        name: required(input.name, "name")?,
        birth_date: required(input.birth_date, "birthDate")?,
        gender: required(input.gender, "gender")?,
        mother_name: required(input.mother_name, "motherName")?,
        bed: required(input.bed, "bed")?,
        diagnosis: required(input.diagnosis, "diagnosis")?,
        antibiotics: normalize_antibiotics(input.antibiotics.unwrap_or_default()),
        entry_date: input.entry_date.unwrap_or(today),
        discharge_date: input.discharge_date.flatten(),
        digitizer_id: required(input.digitizer_id, "digitizerId")?,
        created_at: now,
        updated_at: now,
    })
}
