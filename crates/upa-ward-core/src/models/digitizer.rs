//! Digitizer (operator) models.

use serde::{Deserialize, Serialize};

/// A data-entry operator. The email is the login key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Digitizer {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl Digitizer {
    /// Create a digitizer with a fresh id.
    pub fn new(name: String, email: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            email,
        }
    }

    /// Administrator created when the collection is first found empty.
    pub fn default_admin() -> Self {
        Self {
            id: "1".to_string(),
            name: "Admin Central".to_string(),
            email: "admin@upa.gov.br".to_string(),
        }
    }
}
