//! Collection descriptors and filter combination modes.

use crate::StoreError;
use std::fmt;
use std::str::FromStr;

/// One persisted entity collection.
///
/// Each collection owns exactly one file and declares the field that identifies its
/// records together with the prefix used when allocating new identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Patients,
    Appointments,
    Medicines,
    Income,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Users,
        Collection::Patients,
        Collection::Appointments,
        Collection::Medicines,
        Collection::Income,
    ];

    /// File name of the collection inside the data directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Collection::Users => "user.txt",
            Collection::Patients => "patient.txt",
            Collection::Appointments => "appointment.txt",
            Collection::Medicines => "medicine.txt",
            Collection::Income => "income.txt",
        }
    }

    /// Declared identifier field of every record in this collection.
    pub fn id_field(&self) -> &'static str {
        match self {
            Collection::Users => "userID",
            Collection::Patients => "patientID",
            Collection::Appointments => "aptID",
            Collection::Medicines => "medID",
            Collection::Income => "billID",
        }
    }

    /// Prefix used for identifiers allocated in this collection.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Collection::Users => "U",
            Collection::Patients => "P",
            Collection::Appointments => "A",
            Collection::Medicines => "M",
            Collection::Income => "B",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collection::Users => "users",
            Collection::Patients => "patients",
            Collection::Appointments => "appointments",
            Collection::Medicines => "medicines",
            Collection::Income => "income",
        };
        f.write_str(name)
    }
}

/// How the per-field filters of [`RecordStore::find`](crate::RecordStore::find) combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Every filter must match.
    And,
    /// At least one filter must match.
    Or,
}

impl FromStr for MatchMode {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "and" => Ok(MatchMode::And),
            "or" => Ok(MatchMode::Or),
            other => Err(StoreError::InvalidMode(other.to_string())),
        }
    }
}
