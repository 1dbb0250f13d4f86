//! Appointment status state machine.
//!
//! ```text
//! booked ──consult──▶ consulted ──settle──▶ paid ──dispense──▶ completed
//!   │  ▲                  │
//!   │  └─reschedule       │
//!   └──────cancel─────────┴──▶ cancelled
//! ```
//!
//! Billing a `booked` appointment in deferred mode records an unpaid bill and leaves the
//! status untouched, so it is not a transition here.

use crate::models::{Appointment, AppointmentStatus};
use crate::{ClinicError, ClinicResult};
use std::fmt;

/// Status-changing actions on an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Reschedule,
    Cancel,
    Consult,
    /// Billing a consulted appointment.
    Settle,
    Dispense,
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            LifecycleAction::Reschedule => "reschedule",
            LifecycleAction::Cancel => "cancel",
            LifecycleAction::Consult => "consult",
            LifecycleAction::Settle => "bill",
            LifecycleAction::Dispense => "dispense",
        };
        f.write_str(verb)
    }
}

/// Status reached by applying `action` in `status`, or `None` if not allowed.
pub fn next_status(
    status: &AppointmentStatus,
    action: LifecycleAction,
) -> Option<AppointmentStatus> {
    use AppointmentStatus::*;
    use LifecycleAction::*;

    match (status, action) {
        (Booked, Reschedule) => Some(Booked),
        (Booked | Consulted, Cancel) => Some(Cancelled),
        (Booked, Consult) => Some(Consulted),
        (Consulted, Settle) => Some(Paid),
        (Paid, Dispense) => Some(Completed),
        _ => None,
    }
}

/// Checks that `action` is allowed on `appointment` without changing it.
///
/// # Errors
///
/// Returns `ClinicError::InvalidTransition` carrying the current status.
pub fn ensure_allowed(appointment: &Appointment, action: LifecycleAction) -> ClinicResult<AppointmentStatus> {
    next_status(&appointment.status, action).ok_or_else(|| ClinicError::InvalidTransition {
        apt_id: appointment.apt_id.clone(),
        action,
        status: appointment.status.clone(),
    })
}

/// Moves `appointment` to the status `action` leads to.
///
/// # Errors
///
/// Returns `ClinicError::InvalidTransition` and leaves the appointment unchanged if the
/// action is not allowed in the current status.
pub fn apply(appointment: &mut Appointment, action: LifecycleAction) -> ClinicResult<()> {
    appointment.status = ensure_allowed(appointment, action)?;
    Ok(())
}
