//! Record validation applied before anything is persisted.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{age_in_years, Digitizer, Patient};

/// Oldest age (in whole years, on the entry date) the ward admits.
pub const MAX_AGE_YEARS: i32 = 12;

/// Longest diagnosis text, in characters.
pub const MAX_DIAGNOSIS_CHARS: usize = 250;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field must not be blank: {0}")]
    BlankField(&'static str),

    #[error("Patient is {age} years old on admission; the ward admits ages 0 to 12")]
    AgeOutOfRange { age: i32 },

    #[error("Birth date {birth} is after entry date {entry}")]
    BirthAfterEntry { birth: NaiveDate, entry: NaiveDate },

    #[error("Discharge date {discharge} is before entry date {entry}")]
    DischargeBeforeEntry {
        entry: NaiveDate,
        discharge: NaiveDate,
    },

    #[error("Diagnosis has {chars} characters; at most 250 allowed")]
    DiagnosisTooLong { chars: usize },
}

pub type ValidationResult<T> = Result<T, ValidationError>;

fn require_text(field: &'static str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        Err(ValidationError::BlankField(field))
    } else {
        Ok(())
    }
}

/// Check a complete patient record.
pub fn validate_patient(patient: &Patient) -> ValidationResult<()> {
    require_text("name", &patient.name)?;
    require_text("motherName", &patient.mother_name)?;
    require_text("diagnosis", &patient.diagnosis)?;
    require_text("digitizerId", &patient.digitizer_id)?;

    let chars = patient.diagnosis.chars().count();
    if chars > MAX_DIAGNOSIS_CHARS {
        return Err(ValidationError::DiagnosisTooLong { chars });
    }

    if patient.birth_date > patient.entry_date {
        return Err(ValidationError::BirthAfterEntry {
            birth: patient.birth_date,
            entry: patient.entry_date,
        });
    }

    let age = age_in_years(patient.birth_date, patient.entry_date);
    if !(0..=MAX_AGE_YEARS).contains(&age) {
        return Err(ValidationError::AgeOutOfRange { age });
    }

    if let Some(discharge) = patient.discharge_date {
        if discharge < patient.entry_date {
            return Err(ValidationError::DischargeBeforeEntry {
                entry: patient.entry_date,
                discharge,
            });
        }
    }

    Ok(())
}

/// Check a digitizer record.
pub fn validate_digitizer(digitizer: &Digitizer) -> ValidationResult<()> {
    require_text("id", &digitizer.id)?;
    require_text("name", &digitizer.name)?;
    require_text("email", &digitizer.email)?;
    Ok(())
}
