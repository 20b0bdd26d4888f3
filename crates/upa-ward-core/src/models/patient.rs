//! Patient models.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Bed;

/// Patient gender as recorded on admission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    pub fn code(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "M" | "m" => Ok(Gender::Male),
            "F" | "f" => Ok(Gender::Female),
            other => Err(format!("Unknown gender: {}", other)),
        }
    }
}

/// Admission status, derived solely from the discharge date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionStatus {
    Admitted,
    Discharged,
}

impl AdmissionStatus {
    /// Label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            AdmissionStatus::Admitted => "Internado",
            AdmissionStatus::Discharged => "Alta",
        }
    }
}

impl fmt::Display for AdmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A pediatric patient record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", from = "StoredPatient")]
pub struct Patient {
    /// Assigned by the repository, never changes
    pub id: String,
    pub name: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub mother_name: String,
    pub bed: Bed,
    /// Free text, at most 250 characters
    pub diagnosis: String,
    pub antibiotics: Vec<String>,
    pub entry_date: NaiveDate,
    /// `None` while the patient is admitted
    pub discharge_date: Option<NaiveDate>,
    /// Digitizer who created the record
    pub digitizer_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Patient document as other clients may have written it: `updatedAt` missing on
/// records never edited, `dischargeDate` empty instead of null.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredPatient {
    id: String,
    name: String,
    birth_date: NaiveDate,
    gender: Gender,
    mother_name: String,
    bed: Bed,
    diagnosis: String,
    #[serde(default)]
    antibiotics: Vec<String>,
    entry_date: NaiveDate,
    #[serde(default, deserialize_with = "blank_date_as_none")]
    discharge_date: Option<NaiveDate>,
    digitizer_id: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl From<StoredPatient> for Patient {
    fn from(stored: StoredPatient) -> Self {
        Self {
            updated_at: stored.updated_at.unwrap_or(stored.created_at),
            id: stored.id,
            name: stored.name,
            birth_date: stored.birth_date,
            gender: stored.gender,
            mother_name: stored.mother_name,
            bed: stored.bed,
            diagnosis: stored.diagnosis,
            antibiotics: stored.antibiotics,
            entry_date: stored.entry_date,
            discharge_date: stored.discharge_date,
            digitizer_id: stored.digitizer_id,
            created_at: stored.created_at,
        }
    }
}

fn blank_date_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

impl Patient {
    pub fn status(&self) -> AdmissionStatus {
        match self.discharge_date {
            Some(_) => AdmissionStatus::Discharged,
            None => AdmissionStatus::Admitted,
        }
    }

    pub fn is_admitted(&self) -> bool {
        self.discharge_date.is_none()
    }

    /// Age in whole years on the given date.
    pub fn age_on(&self, date: NaiveDate) -> i32 {
        age_in_years(self.birth_date, date)
    }

    /// Age in whole years today (local calendar).
    pub fn age_today(&self) -> i32 {
        self.age_on(chrono::Local::now().date_naive())
    }

    /// Whether the record carries the antibiotic (exact entry match).
    pub fn has_antibiotic(&self, antibiotic: &str) -> bool {
        self.antibiotics.iter().any(|a| a == antibiotic)
    }
}

/// Whole years from `birth` to `on`; negative when `on` precedes `birth`.
pub fn age_in_years(birth: NaiveDate, on: NaiveDate) -> i32 {
    let mut years = on.year() - birth.year();
    if (on.month(), on.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    years
}

/// Fields supplied to `PatientRepository::save`.
///
/// With an `id` naming an existing record, only the `Some` fields are merged onto it.
/// Otherwise a new record is created and the required fields must be present.
/// `discharge_date: Some(None)` clears a discharge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientInput {
    pub id: Option<String>,
    pub name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub mother_name: Option<String>,
    pub bed: Option<Bed>,
    pub diagnosis: Option<String>,
    pub antibiotics: Option<Vec<String>>,
    pub entry_date: Option<NaiveDate>,
    pub discharge_date: Option<Option<NaiveDate>>,
    pub digitizer_id: Option<String>,
}

impl PatientInput {
    /// Input for an edit of an existing record.
    pub fn update(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    /// Merge the supplied fields onto an existing record.
    pub(crate) fn apply_to(self, patient: &mut Patient) {
        if let Some(name) = self.name {
            patient.name = name;
        }
        if let Some(birth_date) = self.birth_date {
            patient.birth_date = birth_date;
        }
        if let Some(gender) = self.gender {
            patient.gender = gender;
        }
        if let Some(mother_name) = self.mother_name {
            patient.mother_name = mother_name;
        }
        if let Some(bed) = self.bed {
            patient.bed = bed;
        }
        if let Some(diagnosis) = self.diagnosis {
            patient.diagnosis = diagnosis;
        }
        if let Some(antibiotics) = self.antibiotics {
            patient.antibiotics = antibiotics;
        }
        if let Some(entry_date) = self.entry_date {
            patient.entry_date = entry_date;
        }
        if let Some(discharge_date) = self.discharge_date {
            patient.discharge_date = discharge_date;
        }
        if let Some(digitizer_id) = self.digitizer_id {
            patient.digitizer_id = digitizer_id;
        }
    }
}

impl From<&Patient> for PatientInput {
    fn from(patient: &Patient) -> Self {
        Self {
            id: Some(patient.id.clone()),
            name: Some(patient.name.clone()),
            birth_date: Some(patient.birth_date),
            gender: Some(patient.gender),
            mother_name: Some(patient.mother_name.clone()),
            bed: Some(patient.bed),
            diagnosis: Some(patient.diagnosis.clone()),
            antibiotics: Some(patient.antibiotics.clone()),
            entry_date: Some(patient.entry_date),
            discharge_date: Some(patient.discharge_date),
            digitizer_id: Some(patient.digitizer_id.clone()),
        }
    }
}

/// Timestamp for an update that is strictly later than `previous`.
pub(crate) fn next_timestamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + chrono::Duration::milliseconds(1)
    }
}
