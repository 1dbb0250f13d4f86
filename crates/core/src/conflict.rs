//! Appointment conflict checks.
//!
//! Pure predicates over an appointment snapshot. Cancelled appointments never block, and
//! existing appointments whose stored time cannot be parsed are ignored.

use crate::constants::{CONFLICT_WINDOW_MINUTES, TIME_FORMAT};
use crate::error::ConflictRule;
use crate::models::Appointment;
use crate::{ClinicError, ClinicResult};
use chrono::NaiveTime;

/// Outcome of an availability check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Availability<'a> {
    Available,
    /// Blocked by the given appointment.
    Conflict(&'a Appointment),
}

impl<'a> Availability<'a> {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }

    /// Converts a conflict into `ClinicError::Conflict` for `rule`.
    pub fn into_result(self, rule: ConflictRule) -> ClinicResult<()> {
        match self {
            Availability::Available => Ok(()),
            Availability::Conflict(existing) => Err(ClinicError::Conflict {
                rule,
                appointment: Box::new(existing.clone()),
            }),
        }
    }
}

/// Checks candidate slots against a snapshot of appointments.
pub struct ConflictChecker<'a> {
    appointments: &'a [Appointment],
}

impl<'a> ConflictChecker<'a> {
    pub fn new(appointments: &'a [Appointment]) -> Self {
        Self { appointments }
    }

    fn candidates<'b>(
        &self,
        exclude_apt_id: Option<&'b str>,
    ) -> impl Iterator<Item = &'a Appointment> + 'b
    where
        'a: 'b,
    {
        let appointments: &'a [Appointment] = self.appointments;
        appointments
            .iter()
            .filter(move |a| exclude_apt_id != Some(a.apt_id.as_str()))
            .filter(|a| !a.status.is_cancelled())
    }

    /// A doctor is unavailable when another of their appointments on `date` starts less
    /// than two hours before or after `time`. Exactly two hours apart is allowed.
    pub fn doctor_available(
        &self,
        doctor_id: &str,
        date: &str,
        time: NaiveTime,
        exclude_apt_id: Option<&str>,
    ) -> Availability<'a> {
        let blocking = self
            .candidates(exclude_apt_id)
            .filter(|a| a.doctor_id == doctor_id && a.date == date)
            .find(|a| {
                NaiveTime::parse_from_str(a.time.trim(), TIME_FORMAT)
                    .map(|existing| {
                        (time - existing).num_minutes().abs() < CONFLICT_WINDOW_MINUTES
                    })
                    .unwrap_or(false)
            });

        blocking.map_or(Availability::Available, Availability::Conflict)
    }

    /// A patient is unavailable when they already hold an appointment at exactly `date`
    /// and `time`.
    pub fn patient_available(
        &self,
        patient_id: &str,
        date: &str,
        time: &str,
        exclude_apt_id: Option<&str>,
    ) -> Availability<'a> {
        let blocking = self
            .candidates(exclude_apt_id)
            .find(|a| a.patient_id == patient_id && a.date == date && a.time == time);

        blocking.map_or(Availability::Available, Availability::Conflict)
    }

    /// Runs both checks, doctor first.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::Conflict` naming the broken rule and the blocking appointment.
    pub fn ensure_slot_free(
        &self,
        doctor_id: &str,
        patient_id: &str,
        date: &str,
        time: NaiveTime,
        exclude_apt_id: Option<&str>,
    ) -> ClinicResult<()> {
        self.doctor_available(doctor_id, date, time, exclude_apt_id)
            .into_result(ConflictRule::DoctorWindow)?;
        let stored_time = time.format(TIME_FORMAT).to_string();
        self.patient_available(patient_id, date, &stored_time, exclude_apt_id)
            .into_result(ConflictRule::PatientSlot)
    }
}
