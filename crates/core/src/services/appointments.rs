//! Appointment scheduling and the receptionist and doctor views of appointments.

use super::users::{find_doctor, list_doctors};
use crate::conflict::ConflictChecker;
use crate::constants::TIME_FORMAT;
use crate::error::{not_found, EntityKind};
use crate::lifecycle::{self, LifecycleAction};
use crate::models::{Appointment, AppointmentStatus, Patient};
use crate::{validation, ClinicError, ClinicResult, CoreConfig};
use chrono::{NaiveDate, NaiveTime};
use clinic_store::RecordStore;
use std::sync::Arc;

/// Shown in place of a doctor name when the appointment has no known doctor.
pub const UNASSIGNED: &str = "(unassigned)";

/// An appointment with the names an operator needs to read it.
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentView {
    pub appointment: Appointment,
    pub patient_name: String,
    pub patient_phone: String,
    pub doctor_name: String,
}

/// Prescription and note recorded at consultation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsultationSummary {
    pub apt_id: String,
    pub patient_id: String,
    pub medicine: String,
    pub note: String,
}

/// Appointment operations for receptionists and doctors.
#[derive(Clone)]
pub struct AppointmentService {
    cfg: Arc<CoreConfig>,
}

impl AppointmentService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    fn load(store: &RecordStore, apt_id: &str) -> ClinicResult<Appointment> {
        store
            .get(apt_id.trim())
            .ok_or_else(|| not_found(EntityKind::Appointment, apt_id.trim()))
    }

    pub fn get(&self, apt_id: &str) -> ClinicResult<Appointment> {
        Self::load(&self.cfg.store()?, apt_id)
    }

    // ========================================================================
    // RECEPTIONIST
    // ========================================================================

    /// Books a new appointment.
    ///
    /// The patient and the doctor must exist, the date must lie after `today`, and the
    /// slot must pass both conflict checks.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Validation` or `Conflict`; nothing is written on failure.
    pub fn schedule(
        &self,
        patient_id: &str,
        doctor_id: &str,
        date: &str,
        time: &str,
        today: NaiveDate,
    ) -> ClinicResult<Appointment> {
        let store = self.cfg.store()?;
        let patient: Patient = store
            .get(patient_id.trim())
            .ok_or_else(|| not_found(EntityKind::Patient, patient_id.trim()))?;
        let doctor = find_doctor(&store, doctor_id)
            .ok_or_else(|| not_found(EntityKind::Doctor, doctor_id.trim()))?;
        let date = validation::format_date(validation::appointment_date(date, today)?);
        let time = validation::parse_time(time)?;

        let existing: Vec<Appointment> = store.load();
        ConflictChecker::new(&existing).ensure_slot_free(
            &doctor.doctor_id,
            &patient.patient_id,
            &date,
            time,
            None,
        )?;

        let appointment = store.insert(Appointment {
            patient_id: patient.patient_id,
            doctor_id: doctor.doctor_id,
            date,
            time: validation::format_time(time),
            status: AppointmentStatus::Booked,
            ..Default::default()
        })?;

        tracing::info!(
            "appointment {} booked with {} on {} {}",
            appointment.apt_id,
            appointment.doctor_id,
            appointment.date,
            appointment.time
        );
        Ok(appointment)
    }

    /// Moves a booked appointment to a new date and time.
    ///
    /// If the appointment's doctor no longer exists, `replacement_doctor` must name one
    /// that does. A replacement is also applied when the current doctor is valid.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the appointment is booked, plus the errors of
    /// [`AppointmentService::schedule`].
    pub fn reschedule(
        &self,
        apt_id: &str,
        date: &str,
        time: &str,
        replacement_doctor: Option<&str>,
        today: NaiveDate,
    ) -> ClinicResult<Appointment> {
        let store = self.cfg.store()?;
        let mut appointment = Self::load(&store, apt_id)?;
        lifecycle::ensure_allowed(&appointment, LifecycleAction::Reschedule)?;

        let doctor = match replacement_doctor {
            Some(id) => {
                find_doctor(&store, id).ok_or_else(|| not_found(EntityKind::Doctor, id.trim()))?
            }
            None => find_doctor(&store, &appointment.doctor_id).ok_or_else(|| {
                ClinicError::Validation(format!(
                    "appointment {} has no valid doctor; a replacement doctor is required",
                    appointment.apt_id
                ))
            })?,
        };
        let date = validation::format_date(validation::appointment_date(date, today)?);
        let time = validation::parse_time(time)?;

        let existing: Vec<Appointment> = store.load();
        ConflictChecker::new(&existing).ensure_slot_free(
            &doctor.doctor_id,
            &appointment.patient_id,
            &date,
            time,
            Some(appointment.apt_id.as_str()),
        )?;

        appointment.doctor_id = doctor.doctor_id;
        appointment.date = date;
        appointment.time = validation::format_time(time);
        lifecycle::apply(&mut appointment, LifecycleAction::Reschedule)?;
        store.save(&appointment)?;

        tracing::info!("appointment {} rescheduled", appointment.apt_id);
        Ok(appointment)
    }

    /// Cancels a booked or consulted appointment.
    pub fn cancel(&self, apt_id: &str) -> ClinicResult<Appointment> {
        let store = self.cfg.store()?;
        let mut appointment = Self::load(&store, apt_id)?;
        lifecycle::apply(&mut appointment, LifecycleAction::Cancel)?;
        store.save(&appointment)?;

        tracing::info!("appointment {} cancelled", appointment.apt_id);
        Ok(appointment)
    }

    /// Assigns a doctor to each of today's open appointments that has none.
    ///
    /// Doctors are tried in ID order and the first one free under the two-hour rule
    /// wins. Assignments made earlier in the same pass count towards later checks.
    ///
    /// # Returns
    ///
    /// The appointments that received a doctor.
    pub fn auto_assign_doctors(&self, today: NaiveDate) -> ClinicResult<Vec<Appointment>> {
        let store = self.cfg.store()?;
        let doctors = list_doctors(&store);
        if doctors.is_empty() {
            return Ok(Vec::new());
        }

        let today = validation::format_date(today);
        let mut appointments: Vec<Appointment> = store.load();
        let mut assigned = Vec::new();

        for index in 0..appointments.len() {
            let candidate = &appointments[index];
            if candidate.date != today
                || candidate.status.is_cancelled()
                || !candidate.doctor_id.trim().is_empty()
            {
                continue;
            }
            let Ok(time) = NaiveTime::parse_from_str(candidate.time.trim(), TIME_FORMAT) else {
                tracing::warn!(
                    "appointment {} has an unreadable time '{}', not assigning",
                    candidate.apt_id,
                    candidate.time
                );
                continue;
            };

            let checker = ConflictChecker::new(&appointments);
            let Some(doctor) = doctors.iter().find(|d| {
                checker
                    .doctor_available(&d.doctor_id, &today, time, None)
                    .is_available()
            }) else {
                continue;
            };

            let appointment = &mut appointments[index];
            appointment.doctor_id = doctor.doctor_id.clone();
            appointment.status = AppointmentStatus::Booked;
            assigned.push(appointment.clone());
        }

        for appointment in &assigned {
            store.save(appointment)?;
            tracing::info!(
                "appointment {} assigned to {}",
                appointment.apt_id,
                appointment.doctor_id
            );
        }
        Ok(assigned)
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    fn views(store: &RecordStore, appointments: Vec<Appointment>) -> Vec<AppointmentView> {
        let patients: Vec<Patient> = store.load();
        let doctors = list_doctors(store);

        appointments
            .into_iter()
            .map(|appointment| {
                let patient = patients.iter().find(|p| p.patient_id == appointment.patient_id);
                let doctor = doctors.iter().find(|d| d.doctor_id == appointment.doctor_id);
                AppointmentView {
                    patient_name: patient.map(|p| p.name.clone()).unwrap_or_default(),
                    patient_phone: patient.map(|p| p.phone.clone()).unwrap_or_default(),
                    doctor_name: doctor
                        .map(|d| d.name.clone())
                        .unwrap_or_else(|| UNASSIGNED.to_string()),
                    appointment,
                }
            })
            .collect()
    }

    fn query(&self, keep: impl Fn(&Appointment) -> bool) -> ClinicResult<Vec<AppointmentView>> {
        let store = self.cfg.store()?;
        let selected = store.load::<Appointment>().into_iter().filter(|a| keep(a)).collect();
        Ok(Self::views(&store, selected))
    }

    pub fn all(&self) -> ClinicResult<Vec<AppointmentView>> {
        self.query(|_| true)
    }

    pub fn for_date(&self, date: NaiveDate) -> ClinicResult<Vec<AppointmentView>> {
        let date = validation::format_date(date);
        self.query(|a| a.date == date)
    }

    pub fn for_patient(&self, patient_id: &str) -> ClinicResult<Vec<AppointmentView>> {
        let patient_id = patient_id.trim();
        self.query(|a| a.patient_id == patient_id)
    }

    /// A doctor's appointments, optionally restricted to one date.
    pub fn for_doctor(
        &self,
        doctor_id: &str,
        date: Option<NaiveDate>,
    ) -> ClinicResult<Vec<AppointmentView>> {
        let date = date.map(validation::format_date);
        self.query(|a| {
            !doctor_id.is_empty()
                && a.doctor_id == doctor_id
                && date.as_ref().is_none_or(|d| &a.date == d)
        })
    }

    // ========================================================================
    // DOCTOR
    // ========================================================================

    /// Records a consultation on a booked appointment.
    ///
    /// `medicine` is a comma-separated list of `M<digits>` identifiers; it is stored
    /// trimmed, upper-cased and comma-joined.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Validation` for malformed medicine IDs, or
    /// `InvalidTransition` unless the appointment is booked.
    pub fn consult(&self, apt_id: &str, medicine: &str, note: &str) -> ClinicResult<Appointment> {
        let store = self.cfg.store()?;
        let mut appointment = Self::load(&store, apt_id)?;
        lifecycle::ensure_allowed(&appointment, LifecycleAction::Consult)?;
        let medicine = validation::medicine_ids(medicine)?;

        appointment.medicine = Some(medicine.join(","));
        appointment.note = Some(note.trim().to_string());
        lifecycle::apply(&mut appointment, LifecycleAction::Consult)?;
        store.save(&appointment)?;

        tracing::info!("appointment {} consulted", appointment.apt_id);
        Ok(appointment)
    }

    /// The prescription and note of a consulted, paid or completed appointment.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::Validation` if no consultation has been recorded yet.
    pub fn consultation_summary(&self, apt_id: &str) -> ClinicResult<ConsultationSummary> {
        let appointment = self.get(apt_id)?;
        match appointment.status {
            AppointmentStatus::Consulted
            | AppointmentStatus::Paid
            | AppointmentStatus::Completed => Ok(ConsultationSummary {
                apt_id: appointment.apt_id,
                patient_id: appointment.patient_id,
                medicine: appointment.medicine.unwrap_or_default(),
                note: appointment.note.unwrap_or_default(),
            }),
            status => Err(ClinicError::Validation(format!(
                "appointment {} is '{}'; record a consultation first",
                appointment.apt_id, status
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConflictRule;
    use crate::models::Role;
    use crate::services::patients::PatientService;
    use crate::services::test_support::{seed_user, setup, store, today, tomorrow};
    use clinic_store::Collection;
    use serde_json::json;

    fn seeded() -> (tempfile::TempDir, Arc<CoreConfig>, AppointmentService) {
        let (temp_dir, cfg) = setup();
        seed_user(&cfg, "house", Role::Doctor);
        seed_user(&cfg, "wilson", Role::Doctor);
        let patients = PatientService::new(cfg.clone());
        patients
            .register("Jane Doe", "1990-01-01", "0123456789", today())
            .unwrap();
        patients
            .register("John Roe", "1985-05-05", "0198765432", today())
            .unwrap();
        let service = AppointmentService::new(cfg.clone());
        (temp_dir, cfg, service)
    }

    #[test]
    fn test_schedule_books_first_appointment() {
        let (_temp_dir, _cfg, service) = seeded();
        let apt = service
            .schedule("P1", "U1", tomorrow(), "9:30", today())
            .unwrap();

        assert_eq!(apt.apt_id, "A1");
        assert_eq!(apt.status, AppointmentStatus::Booked);
        assert_eq!(apt.time, "09:30");
        assert_eq!(apt.date, "2030-01-10");
    }

    #[test]
    fn test_schedule_rejects_unknown_parties_and_same_day() {
        let (_temp_dir, _cfg, service) = seeded();
        assert!(matches!(
            service.schedule("P9", "U1", tomorrow(), "10:00", today()),
            Err(ClinicError::NotFound { kind: EntityKind::Patient, .. })
        ));
        assert!(matches!(
            service.schedule("P1", "U9", tomorrow(), "10:00", today()),
            Err(ClinicError::NotFound { kind: EntityKind::Doctor, .. })
        ));
        assert!(matches!(
            service.schedule("P1", "U1", "2030-01-09", "10:00", today()),
            Err(ClinicError::Validation(_))
        ));
    }

    #[test]
    fn test_schedule_rejects_doctor_double_booking() {
        let (_temp_dir, _cfg, service) = seeded();
        service.schedule("P1", "U1", tomorrow(), "10:00", today()).unwrap();

        match service.schedule("P2", "U1", tomorrow(), "11:30", today()) {
            Err(ClinicError::Conflict { rule, appointment }) => {
                assert_eq!(rule, ConflictRule::DoctorWindow);
                assert_eq!(appointment.apt_id, "A1");
            }
            other => panic!("expected conflict, got {:?}", other),
        }
        assert!(service.schedule("P2", "U1", tomorrow(), "12:00", today()).is_ok());
    }

    #[test]
    fn test_schedule_rejects_patient_double_booking() {
        let (_temp_dir, _cfg, service) = seeded();
        service.schedule("P1", "U1", tomorrow(), "10:00", today()).unwrap();

        assert!(matches!(
            service.schedule("P1", "U2", tomorrow(), "10:00", today()),
            Err(ClinicError::Conflict { rule: ConflictRule::PatientSlot, .. })
        ));
    }

    #[test]
    fn test_cancelled_appointment_frees_the_slot() {
        let (_temp_dir, _cfg, service) = seeded();
        service.schedule("P1", "U1", tomorrow(), "10:00", today()).unwrap();
        service.cancel("A1").unwrap();

        let again = service.schedule("P2", "U1", tomorrow(), "10:30", today()).unwrap();
        assert_eq!(again.apt_id, "A2");
        assert!(matches!(
            service.cancel("A1"),
            Err(ClinicError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_reschedule_excludes_itself_and_resets_status() {
        let (_temp_dir, _cfg, service) = seeded();
        service.schedule("P1", "U1", tomorrow(), "10:00", today()).unwrap();

        let moved = service
            .reschedule("A1", tomorrow(), "10:30", None, today())
            .unwrap();
        assert_eq!(moved.time, "10:30");
        assert_eq!(service.get("A1").unwrap().time, "10:30");
    }

    #[test]
    fn test_reschedule_requires_replacement_for_missing_doctor() {
        let (_temp_dir, cfg, service) = seeded();
        store(&cfg)
            .add(
                Collection::Appointments,
                json!({"patientID": "P1", "doctorID": "D9", "date": "2030-01-10", "time": "10:00", "status": "booked"})
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .unwrap();

        assert!(matches!(
            service.reschedule("A1", "2030-01-11", "10:00", None, today()),
            Err(ClinicError::Validation(_))
        ));
        let moved = service
            .reschedule("A1", "2030-01-11", "10:00", Some("U2"), today())
            .unwrap();
        assert_eq!(moved.doctor_id, "U2");
    }

    #[test]
    fn test_reschedule_rejected_after_consultation() {
        let (_temp_dir, _cfg, service) = seeded();
        service.schedule("P1", "U1", tomorrow(), "10:00", today()).unwrap();
        service.consult("A1", "M1", "flu").unwrap();

        assert!(matches!(
            service.reschedule("A1", tomorrow(), "14:00", None, today()),
            Err(ClinicError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_consult_stores_normalised_prescription() {
        let (_temp_dir, _cfg, service) = seeded();
        service.schedule("P1", "U1", tomorrow(), "10:00", today()).unwrap();

        assert!(service.consult("A1", "M1, X", "flu").is_err());
        assert_eq!(service.get("A1").unwrap().status, AppointmentStatus::Booked);

        let apt = service.consult("A1", " m1 , m2", " flu ").unwrap();
        assert_eq!(apt.status, AppointmentStatus::Consulted);
        assert_eq!(apt.medicine.as_deref(), Some("M1,M2"));
        assert_eq!(apt.note.as_deref(), Some("flu"));

        assert!(matches!(
            service.consult("A1", "M1", "again"),
            Err(ClinicError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_consultation_summary_requires_consultation() {
        let (_temp_dir, _cfg, service) = seeded();
        service.schedule("P1", "U1", tomorrow(), "10:00", today()).unwrap();
        assert!(service.consultation_summary("A1").is_err());

        service.consult("A1", "M3", "rest").unwrap();
        let summary = service.consultation_summary("A1").unwrap();
        assert_eq!(summary.medicine, "M3");
        assert_eq!(summary.note, "rest");
    }

    #[test]
    fn test_auto_assign_spreads_same_time_appointments() {
        let (_temp_dir, cfg, service) = seeded();
        let store = store(&cfg);
        for patient in ["P1", "P2"] {
            store
                .add(
                    Collection::Appointments,
                    json!({"patientID": patient, "doctorID": "", "date": "2030-01-09", "time": "10:00", "status": "Pending"})
                        .as_object()
                        .cloned()
                        .unwrap(),
                )
                .unwrap();
        }

        let assigned = service.auto_assign_doctors(today()).unwrap();
        let doctors: Vec<&str> = assigned.iter().map(|a| a.doctor_id.as_str()).collect();
        assert_eq!(doctors, vec!["U1", "U2"]);
        assert_eq!(service.get("A2").unwrap().doctor_id, "U2");
        assert!(service.auto_assign_doctors(today()).unwrap().is_empty());
    }

    #[test]
    fn test_views_include_names() {
        let (_temp_dir, _cfg, service) = seeded();
        service.schedule("P1", "U1", tomorrow(), "10:00", today()).unwrap();
        service.schedule("P2", "U2", "2030-01-11", "10:00", today()).unwrap();

        let day = NaiveDate::from_ymd_opt(2030, 1, 10).unwrap();
        let views = service.for_date(day).unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].patient_name, "Jane Doe");
        assert_eq!(views[0].doctor_name, "house");

        assert_eq!(service.for_patient("P2").unwrap().len(), 1);
        assert_eq!(service.for_doctor("U2", None).unwrap().len(), 1);
        assert!(service.for_doctor("U2", Some(day)).unwrap().is_empty());
        assert!(service.for_doctor("", None).unwrap().is_empty());
        assert_eq!(service.all().unwrap().len(), 2);
    }
}
