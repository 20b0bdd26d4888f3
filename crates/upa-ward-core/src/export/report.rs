//! Tabular report projection for the PDF/CSV export.
//!
//! Drawing the PDF belongs to the caller; this module produces the title,
//! header and row cells in display order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Patient;

pub const REPORT_TITLE: &str = "Relatório UPA Pediátrica";

pub const REPORT_COLUMNS: [&str; 5] = ["Paciente", "Entrada", "Status", "Leito", "Diagnóstico"];

/// One exported row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    /// Patient name
    pub patient: String,
    /// Entry date as `dd/mm/yyyy`
    pub entry_date: String,
    /// `Internado` or `Alta`
    pub status: String,
    pub bed: String,
    pub diagnosis: String,
}

impl ReportRow {
    pub fn from_patient(patient: &Patient) -> Self {
        Self {
            patient: patient.name.clone(),
            entry_date: patient.entry_date.format("%d/%m/%Y").to_string(),
            status: patient.status().label().to_string(),
            bed: patient.bed.label().to_string(),
            diagnosis: patient.diagnosis.clone(),
        }
    }

    fn cells(&self) -> [&str; 5] {
        [
            self.patient.as_str(),
            self.entry_date.as_str(),
            self.status.as_str(),
            self.bed.as_str(),
            self.diagnosis.as_str(),
        ]
    }
}

/// A generated report: title block plus rows in filter order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardReport {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<ReportRow>,
}

impl WardReport {
    pub fn build<'p, I>(patients: I, generated_at: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'p Patient>,
    {
        Self {
            title: REPORT_TITLE.to_string(),
            generated_at,
            rows: patients.into_iter().map(ReportRow::from_patient).collect(),
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format.
    pub fn to_csv(&self) -> String {
        let mut csv = REPORT_COLUMNS.join(",");
        csv.push('\n');

        for row in &self.rows {
            let line: Vec<String> = row.cells().iter().map(|c| escape_csv(c)).collect();
            csv.push_str(&line.join(","));
            csv.push('\n');
        }

        csv
    }

    /// Header row followed by one row of cells per patient.
    pub fn table(&self) -> Vec<Vec<String>> {
        std::iter::once(REPORT_COLUMNS.iter().map(|c| c.to_string()).collect())
            .chain(
                self.rows
                    .iter()
                    .map(|row| row.cells().iter().map(|c| c.to_string()).collect()),
            )
            .collect()
    }

    /// Timestamped file name, e.g. `relatorio_1709251200000.pdf`.
    pub fn file_name(&self, extension: &str) -> String {
        format!(
            "relatorio_{}.{}",
            self.generated_at.timestamp_millis(),
            extension
        )
    }
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
