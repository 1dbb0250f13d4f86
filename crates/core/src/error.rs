use crate::lifecycle::LifecycleAction;
use crate::models::{Appointment, AppointmentStatus, Patient};
use std::fmt;

/// Kind of record an operation looked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Doctor,
    Patient,
    Appointment,
    Medicine,
    Bill,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::User => "user",
            EntityKind::Doctor => "doctor",
            EntityKind::Patient => "patient",
            EntityKind::Appointment => "appointment",
            EntityKind::Medicine => "medicine",
            EntityKind::Bill => "bill",
        };
        f.write_str(name)
    }
}

/// Which availability rule a scheduling attempt broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictRule {
    /// The doctor has another appointment less than two hours away.
    DoctorWindow,
    /// The patient already has an appointment at exactly this date and time.
    PatientSlot,
}

impl fmt::Display for ConflictRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictRule::DoctorWindow => {
                f.write_str("doctor is not available within 2 hours of that time")
            }
            ConflictRule::PatientSlot => {
                f.write_str("patient already has an appointment at this date and time")
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("{rule} (conflicting appointment {})", .appointment.apt_id)]
    Conflict {
        rule: ConflictRule,
        appointment: Box<Appointment>,
    },
    #[error("cannot {action} appointment {apt_id} while its status is '{status}'")]
    InvalidTransition {
        apt_id: String,
        action: LifecycleAction,
        status: AppointmentStatus,
    },
    #[error("patient already exists (same name + DOB): {}", .existing.patient_id)]
    DuplicatePatient { existing: Box<Patient> },
    #[error("appointment {apt_id} is already billed ({bill_id})")]
    AlreadyBilled { apt_id: String, bill_id: String },
    #[error("invalid username or password")]
    Authentication,
    #[error("role '{0}' has no access to the console")]
    AccessDenied(String),

    #[error("storage error: {0}")]
    Store(#[from] clinic_store::StoreError),
    #[error("identifier error: {0}")]
    Id(#[from] clinic_ids::IdError),
    #[error("invalid text: {0}")]
    Text(#[from] clinic_types::TextError),
}

pub(crate) fn not_found(kind: EntityKind, id: impl Into<String>) -> ClinicError {
    ClinicError::NotFound {
        kind,
        id: id.into(),
    }
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;
