//! Exact-match patient queries.

use chrono::NaiveDate;

use super::{Bed, Gender, Patient};

/// Equality predicate over a subset of patient fields. An empty query matches
/// every patient. Substring search lives in [`crate::report::ReportFilter`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientQuery {
    pub name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub mother_name: Option<String>,
    pub bed: Option<Bed>,
    pub diagnosis: Option<String>,
    pub entry_date: Option<NaiveDate>,
    /// `Some(None)` matches admitted patients
    pub discharge_date: Option<Option<NaiveDate>>,
    pub digitizer_id: Option<String>,
}

impl PatientQuery {
    pub fn with_bed(mut self, bed: Bed) -> Self {
        self.bed = Some(bed);
        self
    }

    pub fn with_digitizer(mut self, digitizer_id: impl Into<String>) -> Self {
        self.digitizer_id = Some(digitizer_id.into());
        self
    }

    pub fn with_discharge_date(mut self, discharge_date: Option<NaiveDate>) -> Self {
        self.discharge_date = Some(discharge_date);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, patient: &Patient) -> bool {
        fn eq<T: PartialEq>(wanted: &Option<T>, actual: &T) -> bool {
            wanted.as_ref().map_or(true, |w| w == actual)
        }

        eq(&self.name, &patient.name)
            && eq(&self.birth_date, &patient.birth_date)
            && eq(&self.gender, &patient.gender)
            && eq(&self.mother_name, &patient.mother_name)
            && eq(&self.bed, &patient.bed)
            && eq(&self.diagnosis, &patient.diagnosis)
            && eq(&self.entry_date, &patient.entry_date)
            && eq(&self.discharge_date, &patient.discharge_date)
            && eq(&self.digitizer_id, &patient.digitizer_id)
    }
}
