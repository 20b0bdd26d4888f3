//! UPA Ward Core Library
//!
//! Patient records for a pediatric emergency ward (UPA Pediátrica), shared by every
//! terminal through a remote document store and cached in local SQLite.
//!
//! # Architecture
//!
//! ```text
//!        UI (via FFI)
//!            │
//!   PatientRepository / DigitizerRepository / SessionState
//!            │            defaulting, timestamps, validation
//!            ▼
//!      MirroredStore ──── remote Data API (find / insertOne / updateOne / deleteOne)
//!            │
//!            ▼  fallback + mirror
//!     Database (local_storage)
//!
//!   Report filter ──► WardReport (JSON / CSV / table rows for the PDF)
//! ```
//!
//! # Core Principle
//!
//! **The remote store is preferred, never required.** A failed remote read or write
//! degrades to the local copy and is reported, not raised.
//!
//! # Modules
//!
//! - [`config`]: Remote store settings from the environment
//! - [`db`]: SQLite key/value storage
//! - [`store`]: Record store adapter (local, remote, mirrored)
//! - [`models`]: Domain types (Patient, Digitizer, Bed, etc.)
//! - [`validation`]: Record invariants
//! - [`repo`]: Patient and digitizer repositories, session pointer
//! - [`report`]: Report filter and ward census
//! - [`export`]: Report projection and renderings

pub mod config;
pub mod db;
pub mod export;
pub mod models;
pub mod repo;
pub mod report;
pub mod store;
pub mod validation;

// Re-export commonly used types
pub use config::StoreConfig;
pub use db::Database;
pub use export::{ReportRow, WardReport};
pub use models::{
    AdmissionStatus, Bed, Digitizer, Gender, Patient, PatientInput, PatientQuery,
};
pub use repo::{DigitizerRepository, PatientRepository, Persisted, SessionState};
pub use report::{ReportFilter, StatusFilter, WardCensus};
pub use store::{MirroredStore, RecordStore, RemoteSync};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum WardError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<db::DbError> for WardError {
    fn from(e: db::DbError) -> Self {
        WardError::DatabaseError(e.to_string())
    }
}

impl From<store::StoreError> for WardError {
    fn from(e: store::StoreError) -> Self {
        WardError::DatabaseError(e.to_string())
    }
}

impl From<repo::RepoError> for WardError {
    fn from(e: repo::RepoError) -> Self {
        use repo::RepoError;
        match e {
            RepoError::Store(e) => e.into(),
            RepoError::Json(e) => e.into(),
            RepoError::Validation(e) => WardError::ValidationError(e.to_string()),
            RepoError::Conflict(msg) => WardError::Conflict(msg),
            RepoError::NotFound(msg) => WardError::NotFound(msg),
        }
    }
}

impl From<serde_json::Error> for WardError {
    fn from(e: serde_json::Error) -> Self {
        WardError::SerializationError(e.to_string())
    }
}

impl From<config::ConfigError> for WardError {
    fn from(e: config::ConfigError) -> Self {
        WardError::ConfigError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for WardError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        WardError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create the ward store at the given path.
///
/// Remote settings come from the environment (and `.env`); without them the
/// ward runs on local storage alone.
#[uniffi::export]
pub fn open_ward(path: String) -> Result<Arc<WardCore>, WardError> {
    let config = StoreConfig::load_dotenv()?;
    let db = Database::open(&path)?;
    Ok(WardCore::new(MirroredStore::from_config(db, &config)))
}

/// Create an in-memory, local-only ward (for testing).
#[uniffi::export]
pub fn open_ward_in_memory() -> Result<Arc<WardCore>, WardError> {
    let db = Database::open_in_memory()?;
    Ok(WardCore::new(MirroredStore::local_only(db)))
}

/// Install the log subscriber. Filter via `RUST_LOG`, default `info`.
/// Calling it again is a no-op.
#[uniffi::export]
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Antibiotic vocabulary entries close to `input`, best match first.
#[uniffi::export]
pub fn suggest_antibiotics(input: String, limit: u32) -> Vec<String> {
    models::suggest_antibiotics(&input, limit as usize)
        .into_iter()
        .map(String::from)
        .collect()
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe ward wrapper for FFI.
#[derive(uniffi::Object)]
pub struct WardCore {
    store: Arc<Mutex<MirroredStore>>,
}

impl WardCore {
    fn new(store: MirroredStore) -> Arc<Self> {
        Arc::new(Self {
            store: Arc::new(Mutex::new(store)),
        })
    }
}

#[uniffi::export]
impl WardCore {
    /// Whether a remote store is configured.
    pub fn remote_enabled(&self) -> Result<bool, WardError> {
        let store = self.store.lock()?;
        Ok(store.is_remote_enabled())
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Every patient, newest first.
    pub fn list_patients(&self) -> Result<Vec<FfiPatient>, WardError> {
        let store = self.store.lock()?;
        let patients = PatientRepository::new(&*store).all()?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    /// Patients still on the ward, newest first.
    pub fn list_admitted(&self) -> Result<Vec<FfiPatient>, WardError> {
        let store = self.store.lock()?;
        let patients = PatientRepository::new(&*store).admitted()?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    /// Patients matching every field set in the query.
    pub fn find_patients(&self, query: FfiPatientQuery) -> Result<Vec<FfiPatient>, WardError> {
        let query = PatientQuery::try_from(query)?;
        let store = self.store.lock()?;
        let patients = PatientRepository::new(&*store).find(&query)?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    /// Patient-list lookup by name or diagnosis, newest first.
    pub fn lookup_patients(&self, term: String) -> Result<Vec<FfiPatient>, WardError> {
        let store = self.store.lock()?;
        let patients = PatientRepository::new(&*store).lookup(&term)?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    /// Get a patient by id.
    pub fn get_patient(&self, id: String) -> Result<Option<FfiPatient>, WardError> {
        let store = self.store.lock()?;
        let patient = PatientRepository::new(&*store).find_one(&id)?;
        Ok(patient.map(|p| p.into()))
    }

    /// Admit a new patient or update an existing one.
    pub fn save_patient(&self, input: FfiPatientInput) -> Result<FfiSavedPatient, WardError> {
        let input = PatientInput::try_from(input)?;
        let store = self.store.lock()?;
        let saved = PatientRepository::new(&*store).save(input)?;
        Ok(saved.into())
    }

    /// Record a discharge (`yyyy-mm-dd`).
    pub fn discharge_patient(
        &self,
        id: String,
        discharge_date: String,
    ) -> Result<FfiSavedPatient, WardError> {
        let date = parse_date("dischargeDate", &discharge_date)?;
        let store = self.store.lock()?;
        let saved = PatientRepository::new(&*store)
            .discharge(&id, date)?
            .ok_or_else(|| WardError::NotFound(format!("patient {}", id)))?;
        Ok(saved.into())
    }

    /// Delete a patient. Unknown ids report `changed: false`.
    pub fn delete_patient(&self, id: String) -> Result<FfiWriteOutcome, WardError> {
        let store = self.store.lock()?;
        let deleted = PatientRepository::new(&*store).delete_one(&id)?;
        Ok(FfiWriteOutcome {
            changed: deleted.record,
            remote_warning: deleted.remote.warning().map(String::from),
        })
    }

    // =========================================================================
    // Report Operations
    // =========================================================================

    /// Filtered report rows, newest first.
    pub fn search_patients(&self, filter: FfiReportFilter) -> Result<Vec<FfiReportRow>, WardError> {
        let filter = ReportFilter::try_from(filter)?;
        let store = self.store.lock()?;
        let patients = PatientRepository::new(&*store).search(&filter)?;
        Ok(patients.iter().map(FfiReportRow::from).collect())
    }

    /// Filtered report as JSON.
    pub fn export_report_json(&self, filter: FfiReportFilter) -> Result<String, WardError> {
        let report = self.build_report(filter)?;
        Ok(report.to_json()?)
    }

    /// Filtered report as CSV.
    pub fn export_report_csv(&self, filter: FfiReportFilter) -> Result<String, WardError> {
        let report = self.build_report(filter)?;
        Ok(report.to_csv())
    }

    /// Dashboard counts.
    pub fn census(&self) -> Result<FfiCensus, WardError> {
        let store = self.store.lock()?;
        let patients = PatientRepository::new(&*store).all()?;
        Ok(WardCensus::from_patients(&patients).into())
    }

    // =========================================================================
    // Digitizer Operations
    // =========================================================================

    /// Every digitizer (seeds the default administrator on first use).
    pub fn list_digitizers(&self) -> Result<Vec<FfiDigitizer>, WardError> {
        let store = self.store.lock()?;
        let digitizers = DigitizerRepository::new(&*store).find()?;
        Ok(digitizers.into_iter().map(|d| d.into()).collect())
    }

    /// Get a digitizer by id.
    pub fn get_digitizer(&self, id: String) -> Result<Option<FfiDigitizer>, WardError> {
        let store = self.store.lock()?;
        let digitizer = DigitizerRepository::new(&*store).get_by_id(&id)?;
        Ok(digitizer.map(|d| d.into()))
    }

    /// Add or replace a digitizer by id.
    pub fn save_digitizer(&self, digitizer: FfiDigitizer) -> Result<FfiWriteOutcome, WardError> {
        let store = self.store.lock()?;
        let remote = DigitizerRepository::new(&*store).save(digitizer.into())?;
        Ok(FfiWriteOutcome {
            changed: true,
            remote_warning: remote.warning().map(String::from),
        })
    }

    /// Register a new digitizer with a fresh id.
    pub fn register_digitizer(
        &self,
        name: String,
        email: String,
    ) -> Result<FfiDigitizer, WardError> {
        let store = self.store.lock()?;
        let registered = DigitizerRepository::new(&*store).register(name, email)?;
        Ok(registered.record.into())
    }

    // =========================================================================
    // Session Operations
    // =========================================================================

    /// Sign in by email.
    pub fn sign_in(&self, email: String) -> Result<FfiDigitizer, WardError> {
        let store = self.store.lock()?;
        let digitizers = DigitizerRepository::new(&*store);
        let user = SessionState::new(store.local()).sign_in(&digitizers, &email)?;
        Ok(user.into())
    }

    pub fn sign_out(&self) -> Result<(), WardError> {
        let store = self.store.lock()?;
        SessionState::new(store.local()).sign_out()?;
        Ok(())
    }

    /// The signed-in digitizer, if any.
    pub fn current_user(&self) -> Result<Option<FfiDigitizer>, WardError> {
        let store = self.store.lock()?;
        let user = SessionState::new(store.local()).current_user()?;
        Ok(user.map(|u| u.into()))
    }
}

impl WardCore {
    fn build_report(&self, filter: FfiReportFilter) -> Result<WardReport, WardError> {
        let filter = ReportFilter::try_from(filter)?;
        let store = self.store.lock()?;
        let patients = PatientRepository::new(&*store).all()?;
        Ok(WardReport::build(
            report::filter_patients(&patients, &filter),
            Utc::now(),
        ))
    }
}

// =========================================================================
// Boundary parsing
// =========================================================================

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, WardError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| WardError::InvalidInput(format!("{}: expected yyyy-mm-dd, got {:?}", field, value)))
}

fn parse_optional_date(field: &str, value: Option<String>) -> Result<Option<NaiveDate>, WardError> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse_date(field, &v))
        .transpose()
}

fn parse_gender(value: &str) -> Result<Gender, WardError> {
    value.parse().map_err(WardError::InvalidInput)
}

fn parse_bed(value: &str) -> Result<Bed, WardError> {
    value
        .parse()
        .map_err(|e: models::UnknownBed| WardError::InvalidInput(e.to_string()))
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient. Dates are `yyyy-mm-dd`, timestamps RFC 3339.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub name: String,
    pub birth_date: String,
    pub age: i32,
    pub gender: String,
    pub mother_name: String,
    pub bed: String,
    pub diagnosis: String,
    pub antibiotics: Vec<String>,
    pub entry_date: String,
    pub discharge_date: Option<String>,
    pub status: String,
    pub digitizer_id: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            age: patient.age_today(),
            status: patient.status().label().to_string(),
            id: patient.id,
            name: patient.name,
            birth_date: patient.birth_date.to_string(),
            gender: patient.gender.code().to_string(),
            mother_name: patient.mother_name,
            bed: patient.bed.label().to_string(),
            diagnosis: patient.diagnosis,
            antibiotics: patient.antibiotics,
            entry_date: patient.entry_date.to_string(),
            discharge_date: patient.discharge_date.map(|d| d.to_string()),
            digitizer_id: patient.digitizer_id,
            created_at: format_timestamp(patient.created_at),
            updated_at: format_timestamp(patient.updated_at),
        }
    }
}

/// FFI-safe patient input. Unset fields are left untouched on update.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiPatientInput {
    pub id: Option<String>,
    pub name: Option<String>,
    pub birth_date: Option<String>,
    pub gender: Option<String>,
    pub mother_name: Option<String>,
    pub bed: Option<String>,
    pub diagnosis: Option<String>,
    pub antibiotics: Option<Vec<String>>,
    pub entry_date: Option<String>,
    pub discharge_date: Option<String>,
    /// Readmit: clear any recorded discharge
    pub clear_discharge_date: bool,
    pub digitizer_id: Option<String>,
}

impl TryFrom<FfiPatientInput> for PatientInput {
    type Error = WardError;

    fn try_from(input: FfiPatientInput) -> Result<Self, Self::Error> {
        let discharge_date = if input.clear_discharge_date {
            Some(None)
        } else {
            parse_optional_date("dischargeDate", input.discharge_date)?.map(Some)
        };

        Ok(PatientInput {
            id: input.id,
            name: input.name,
            birth_date: parse_optional_date("birthDate", input.birth_date)?,
            gender: input.gender.as_deref().map(parse_gender).transpose()?,
            mother_name: input.mother_name,
            bed: input.bed.as_deref().map(parse_bed).transpose()?,
            diagnosis: input.diagnosis,
            antibiotics: input.antibiotics,
            entry_date: parse_optional_date("entryDate", input.entry_date)?,
            discharge_date,
            digitizer_id: input.digitizer_id,
        })
    }
}

/// FFI-safe exact-match query.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiPatientQuery {
    pub name: Option<String>,
    pub mother_name: Option<String>,
    pub gender: Option<String>,
    pub bed: Option<String>,
    pub entry_date: Option<String>,
    pub digitizer_id: Option<String>,
    /// Only patients with no discharge date
    pub admitted_only: bool,
}

impl TryFrom<FfiPatientQuery> for PatientQuery {
    type Error = WardError;

    fn try_from(query: FfiPatientQuery) -> Result<Self, Self::Error> {
        Ok(PatientQuery {
            name: query.name,
            mother_name: query.mother_name,
            gender: query.gender.as_deref().map(parse_gender).transpose()?,
            bed: query.bed.as_deref().map(parse_bed).transpose()?,
            entry_date: parse_optional_date("entryDate", query.entry_date)?,
            digitizer_id: query.digitizer_id,
            discharge_date: query.admitted_only.then_some(None),
            ..Default::default()
        })
    }
}

/// Result of a patient write.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSavedPatient {
    pub patient: FfiPatient,
    /// Set when the remote copy could not be updated
    pub remote_warning: Option<String>,
}

impl From<Persisted<Patient>> for FfiSavedPatient {
    fn from(saved: Persisted<Patient>) -> Self {
        Self {
            remote_warning: saved.remote.warning().map(String::from),
            patient: saved.record.into(),
        }
    }
}

/// Result of a write with no record to return.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiWriteOutcome {
    pub changed: bool,
    pub remote_warning: Option<String>,
}

/// FFI-safe digitizer.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDigitizer {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<Digitizer> for FfiDigitizer {
    fn from(digitizer: Digitizer) -> Self {
        Self {
            id: digitizer.id,
            name: digitizer.name,
            email: digitizer.email,
        }
    }
}

impl From<FfiDigitizer> for Digitizer {
    fn from(digitizer: FfiDigitizer) -> Self {
        Digitizer {
            id: digitizer.id,
            name: digitizer.name,
            email: digitizer.email,
        }
    }
}

/// FFI-safe report filter. Empty strings count as unset.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiReportFilter {
    pub search: Option<String>,
    pub bed: Option<String>,
    pub antibiotic: Option<String>,
    /// `all`, `admitted` or `discharged`
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl TryFrom<FfiReportFilter> for ReportFilter {
    type Error = WardError;

    fn try_from(filter: FfiReportFilter) -> Result<Self, Self::Error> {
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        Ok(ReportFilter {
            search: non_blank(filter.search),
            bed: non_blank(filter.bed)
                .as_deref()
                .map(parse_bed)
                .transpose()?,
            antibiotic: non_blank(filter.antibiotic),
            status: match non_blank(filter.status) {
                Some(status) => status.parse().map_err(WardError::InvalidInput)?,
                None => StatusFilter::All,
            },
            start_date: parse_optional_date("startDate", filter.start_date)?,
            end_date: parse_optional_date("endDate", filter.end_date)?,
        })
    }
}

/// FFI-safe report row. `id` lets the caller open the patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReportRow {
    pub id: String,
    pub patient: String,
    pub entry_date: String,
    pub status: String,
    pub bed: String,
    pub diagnosis: String,
}

impl From<&Patient> for FfiReportRow {
    fn from(patient: &Patient) -> Self {
        let row = ReportRow::from_patient(patient);
        Self {
            id: patient.id.clone(),
            patient: row.patient,
            entry_date: row.entry_date,
            status: row.status,
            bed: row.bed,
            diagnosis: row.diagnosis,
        }
    }
}

/// FFI-safe ward census.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCensus {
    pub total: u32,
    pub admitted: u32,
    pub discharged: u32,
    pub female: u32,
    pub male: u32,
    pub occupancy_percent: u32,
    pub beds: Vec<FfiBedOccupancy>,
}

impl From<WardCensus> for FfiCensus {
    fn from(census: WardCensus) -> Self {
        Self {
            total: census.total as u32,
            admitted: census.admitted as u32,
            discharged: census.discharged as u32,
            female: census.female as u32,
            male: census.male as u32,
            occupancy_percent: census.occupancy_percent,
            beds: census
                .beds
                .into_iter()
                .map(|b| FfiBedOccupancy {
                    bed: b.bed.label().to_string(),
                    patients: b.patients as u32,
                })
                .collect(),
        }
    }
}

/// Admitted patients in one bed.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBedOccupancy {
    pub bed: String,
    pub patients: u32,
}
