//! Ward locations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
#[error("Unknown bed: {0}")]
pub struct UnknownBed(pub String);

/// A ward location: a numbered bed or a procedure station used as one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bed {
    #[serde(rename = "01")]
    One,
    #[serde(rename = "02")]
    Two,
    #[serde(rename = "03")]
    Three,
    #[serde(rename = "04")]
    Four,
    #[serde(rename = "05")]
    Five,
    #[serde(rename = "06")]
    Six,
    #[serde(rename = "02.1")]
    TwoA,
    #[serde(rename = "02.2")]
    TwoB,
    #[serde(rename = "ECG")]
    Ecg,
    #[serde(rename = "Sutura")]
    Suture,
    #[serde(rename = "Nebolização", alias = "Nebulização")]
    Nebulization,
}

impl Bed {
    /// Every location, in the order the ward lists them.
    pub const ALL: [Bed; 11] = [
        Bed::One,
        Bed::Two,
        Bed::Three,
        Bed::Four,
        Bed::Five,
        Bed::Six,
        Bed::TwoA,
        Bed::TwoB,
        Bed::Ecg,
        Bed::Suture,
        Bed::Nebulization,
    ];

    /// Spelling written to stored documents. Records shared with other clients
    /// carry `Nebolização`, so that spelling stays on the wire.
    pub fn stored_label(&self) -> &'static str {
        match self {
            Bed::Nebulization => "Nebolização",
            other => other.label(),
        }
    }

    /// Label as displayed.
    pub fn label(&self) -> &'static str {
        match self {
            Bed::One => "01",
            Bed::Two => "02",
            Bed::Three => "03",
            Bed::Four => "04",
            Bed::Five => "05",
            Bed::Six => "06",
            Bed::TwoA => "02.1",
            Bed::TwoB => "02.2",
            Bed::Ecg => "ECG",
            Bed::Suture => "Sutura",
            Bed::Nebulization => "Nebulização",
        }
    }

    /// Procedure stations (not sleeping beds).
    pub fn is_station(&self) -> bool {
        matches!(self, Bed::Ecg | Bed::Suture | Bed::Nebulization)
    }
}

impl fmt::Display for Bed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Bed {
    type Err = UnknownBed;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed == "Nebolização" {
            return Ok(Bed::Nebulization);
        }
        Bed::ALL
            .iter()
            .copied()
            .find(|bed| bed.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownBed(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_roundtrip() {
        for bed in Bed::ALL {
            assert_eq!(bed.label().parse::<Bed>().unwrap(), bed);
            assert_eq!(bed.stored_label().parse::<Bed>().unwrap(), bed);
            let json = serde_json::to_string(&bed).unwrap();
            assert_eq!(json, format!("\"{}\"", bed.stored_label()));
        }
    }

    #[test]
    fn test_legacy_nebulization_spelling() {
        let bed: Bed = serde_json::from_str("\"Nebolização\"").unwrap();
        assert_eq!(bed, Bed::Nebulization);
        assert_eq!("Nebolização".parse::<Bed>().unwrap(), Bed::Nebulization);
    }

    #[test]
    fn test_nebulization_written_with_stored_spelling() {
        assert_eq!(serde_json::to_string(&Bed::Nebulization).unwrap(), "\"Nebolização\"");
        let bed: Bed = serde_json::from_str("\"Nebulização\"").unwrap();
        assert_eq!(bed, Bed::Nebulization);
        assert_eq!(Bed::Nebulization.label(), "Nebulização");
    }

    #[test]
    fn test_unknown_bed() {
        assert_eq!("07".parse::<Bed>(), Err(UnknownBed("07".into())));
        assert!(serde_json::from_str::<Bed>("\"07\"").is_err());
    }

    #[test]
    fn test_stations() {
        assert!(Bed::Ecg.is_station());
        assert!(!Bed::TwoA.is_station());
        assert_eq!(Bed::ALL.iter().filter(|b| b.is_station()).count(), 3);
    }
}
