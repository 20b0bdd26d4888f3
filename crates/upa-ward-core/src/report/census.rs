//! Ward census figures for the dashboard.

use serde::{Deserialize, Serialize};

use crate::models::{Bed, Gender, Patient};

/// Capacity used for the occupancy percentage.
pub const WARD_CAPACITY: usize = 12;

/// Admitted patients per bed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BedOccupancy {
    pub bed: Bed,
    pub patients: usize,
}

/// Summary counts over every patient record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WardCensus {
    pub total: usize,
    pub admitted: usize,
    pub discharged: usize,
    pub female: usize,
    pub male: usize,
    /// Admitted patients against [`WARD_CAPACITY`], rounded
    pub occupancy_percent: u32,
    /// Beds holding at least one admitted patient, in ward order
    pub beds: Vec<BedOccupancy>,
}

impl WardCensus {
    pub fn from_patients(patients: &[Patient]) -> Self {
        let admitted: Vec<&Patient> = patients.iter().filter(|p| p.is_admitted()).collect();

        let beds = Bed::ALL
            .iter()
            .map(|bed| BedOccupancy {
                bed: *bed,
                patients: admitted.iter().filter(|p| p.bed == *bed).count(),
            })
            .filter(|occupancy| occupancy.patients > 0)
            .collect();

        let occupancy_percent =
            ((admitted.len() as f64 / WARD_CAPACITY as f64) * 100.0).round() as u32;

        Self {
            total: patients.len(),
            admitted: admitted.len(),
            discharged: patients.len() - admitted.len(),
            female: patients.iter().filter(|p| p.gender == Gender::Female).count(),
            male: patients.iter().filter(|p| p.gender == Gender::Male).count(),
            occupancy_percent,
            beds,
        }
    }
}
