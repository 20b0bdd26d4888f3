//! Multi-predicate report filter.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::{canonical_antibiotic, Bed, Patient};

/// Admission status filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Admitted,
    Discharged,
}

impl StatusFilter {
    pub fn matches(&self, patient: &Patient) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Admitted => patient.discharge_date.is_none(),
            StatusFilter::Discharged => patient.discharge_date.is_some(),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(StatusFilter::All),
            "admitted" => Ok(StatusFilter::Admitted),
            "discharged" => Ok(StatusFilter::Discharged),
            other => Err(format!("Unknown status filter: {}", other)),
        }
    }
}

/// Report filter. Every predicate that is set must hold; an empty filter keeps
/// every patient.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFilter {
    /// Case-insensitive substring of the patient's or the mother's name
    pub search: Option<String>,
    pub bed: Option<Bed>,
    /// Patient must carry this antibiotic
    pub antibiotic: Option<String>,
    pub status: StatusFilter,
    /// Inclusive entry-date range, applied only when both ends are set
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ReportFilter {
    pub fn matches(&self, patient: &Patient) -> bool {
        self.matches_search(patient)
            && self.bed.map_or(true, |bed| patient.bed == bed)
            && self.matches_antibiotic(patient)
            && self.status.matches(patient)
            && self.matches_dates(patient)
    }

    fn matches_search(&self, patient: &Patient) -> bool {
        let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            return true;
        };
        let term = term.to_lowercase();
        patient.name.to_lowercase().contains(&term)
            || patient.mother_name.to_lowercase().contains(&term)
    }

    fn matches_antibiotic(&self, patient: &Patient) -> bool {
        match self.antibiotic.as_deref().map(canonical_antibiotic) {
            Some(antibiotic) if !antibiotic.is_empty() => patient.has_antibiotic(&antibiotic),
            _ => true,
        }
    }

    fn matches_dates(&self, patient: &Patient) -> bool {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => start <= patient.entry_date && patient.entry_date <= end,
            _ => true,
        }
    }
}

/// Patients passing `filter`, in their original order.
pub fn filter_patients<'p>(patients: &'p [Patient], filter: &ReportFilter) -> Vec<&'p Patient> {
    patients.iter().filter(|p| filter.matches(p)).collect()
}

/// Patient-list lookup: case-insensitive substring of the name or the diagnosis.
/// A blank term keeps every patient.
pub fn search_name_or_diagnosis<'p>(patients: &'p [Patient], term: &str) -> Vec<&'p Patient> {
    let term = term.trim().to_lowercase();
    patients
        .iter()
        .filter(|p| {
            term.is_empty()
                || p.name.to_lowercase().contains(&term)
                || p.diagnosis.to_lowercase().contains(&term)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn patient(id: &str, name: &str, mother: &str, entry: NaiveDate) -> Patient {
        let now = Utc::now();
        Patient {
            id: id.into(),
            name: name.into(),
            birth_date: date(2018, 1, 1),
            gender: Gender::Female,
            mother_name: mother.into(),
            bed: Bed::One,
            diagnosis: "Asma".into(),
            antibiotics: vec![],
            entry_date: entry,
            discharge_date: None,
            digitizer_id: "1".into(),
            created_at: now,
            updated_at: now,
        }
    }

    fn ids(patients: Vec<&Patient>) -> Vec<&str> {
        patients.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_search_name_or_mother() {
        let patients = vec![
            patient("a", "Alice Rocha", "Beatriz Rocha", date(2024, 1, 1)),
            patient("b", "Bruno Dias", "Alícia Dias", date(2024, 1, 1)),
            patient("c", "Caio Reis", "Dora Reis", date(2024, 1, 1)),
        ];

        let filter = ReportFilter {
            search: Some("ROCHA".into()),
            ..Default::default()
        };
        assert_eq!(ids(filter_patients(&patients, &filter)), vec!["a"]);

        let filter = ReportFilter {
            search: Some("dias".into()),
            ..Default::default()
        };
        assert_eq!(ids(filter_patients(&patients, &filter)), vec!["b"]);
    }

    #[test]
    fn test_name_or_diagnosis_lookup() {
        let mut bronchiolitis = patient("b", "Bruno Dias", "Alícia Dias", date(2024, 1, 1));
        bronchiolitis.diagnosis = "Bronquiolite viral".into();
        let patients = vec![
            patient("a", "Alice Rocha", "Beatriz Rocha", date(2024, 1, 1)),
            bronchiolitis,
        ];

        assert_eq!(ids(search_name_or_diagnosis(&patients, " VIRAL ")), vec!["b"]);
        assert_eq!(ids(search_name_or_diagnosis(&patients, "alice")), vec!["a"]);
        assert_eq!(ids(search_name_or_diagnosis(&patients, "asma")), vec!["a"]);
        // mother's name is a report-only predicate
        assert!(search_name_or_diagnosis(&patients, "beatriz").is_empty());
        assert_eq!(search_name_or_diagnosis(&patients, "").len(), 2);
    }

    #[test]
    fn test_blank_search_is_identity() {
        let patients = vec![patient("a", "Alice", "Bia", date(2024, 1, 1))];
        let filter = ReportFilter {
            search: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(filter_patients(&patients, &filter).len(), 1);
    }

    #[test]
    fn test_date_range_inclusive() {
        let patients = vec![
            patient("before", "A", "M", date(2024, 2, 29)),
            patient("start", "B", "M", date(2024, 3, 1)),
            patient("end", "C", "M", date(2024, 3, 31)),
            patient("after", "D", "M", date(2024, 4, 1)),
        ];

        let filter = ReportFilter {
            start_date: Some(date(2024, 3, 1)),
            end_date: Some(date(2024, 3, 31)),
            ..Default::default()
        };
        assert_eq!(ids(filter_patients(&patients, &filter)), vec!["start", "end"]);
    }

    #[test]
    fn test_single_date_bound_ignored() {
        let patients = vec![patient("a", "A", "M", date(2020, 1, 1))];
        let filter = ReportFilter {
            start_date: Some(date(2024, 3, 1)),
            ..Default::default()
        };
        assert_eq!(filter_patients(&patients, &filter).len(), 1);
    }

    #[test]
    fn test_antibiotic_filter_canonicalized() {
        let mut with = patient("with", "A", "M", date(2024, 1, 1));
        with.antibiotics = vec!["Amoxicilina".into()];
        let patients = vec![with, patient("without", "B", "M", date(2024, 1, 1))];

        let filter = ReportFilter {
            antibiotic: Some("amoxicilina".into()),
            ..Default::default()
        };
        assert_eq!(ids(filter_patients(&patients, &filter)), vec!["with"]);
    }

    #[test]
    fn test_status_filter_parse() {
        assert_eq!("all".parse::<StatusFilter>(), Ok(StatusFilter::All));
        assert_eq!("Discharged".parse::<StatusFilter>(), Ok(StatusFilter::Discharged));
        assert!("gone".parse::<StatusFilter>().is_err());
    }
}
