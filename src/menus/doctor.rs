use clinic_core::{validation, AppointmentService, InventoryService, Session};

use super::admin::{medicine_rows, MEDICINE_HEADERS};
use crate::console::{appointment_box, Console};
use crate::table;
use crate::terminal::Terminal;

const MENU: [&str; 5] = [
    "View my appointments",
    "View my appointments by date",
    "Record consultation",
    "Consultation summary",
    "View medicine list",
];

impl<T: Terminal> Console<T> {
    pub(crate) fn doctor_menu(&mut self, session: &Session) {
        while let Some(choice) = self.choose("Doctor Menu", &MENU) {
            match choice {
                1 => self.my_appointments(session, false),
                2 => self.my_appointments(session, true),
                3 => self.record_consultation(session),
                4 => self.consultation_summary(),
                _ => self.medicine_list(),
            }
        }
    }

    fn my_appointments(&mut self, session: &Session, by_date: bool) {
        let date = if by_date {
            let Some(date) = self.ask_valid("Date: ", validation::parse_date) else {
                return;
            };
            Some(date)
        } else {
            None
        };
        let result = AppointmentService::new(self.cfg.clone()).for_doctor(session.doctor_id(), date);
        if let Some(views) = self.report(result) {
            self.show_appointments(&views);
        }
    }

    fn record_consultation(&mut self, session: &Session) {
        let Some(apt_id) = self.ask_required("Appointment ID: ") else {
            return;
        };
        let appointments = AppointmentService::new(self.cfg.clone());
        let found = appointments.get(&apt_id);
        let Some(appointment) = self.report(found) else {
            return;
        };
        if session.doctor_id().is_empty() || appointment.doctor_id != session.doctor_id() {
            self.say(format!("Appointment {} is not assigned to you.", appointment.apt_id));
            return;
        }
        self.say(appointment_box(&appointment));

        let Some(medicine) = self.ask_valid("Medicine IDs (e.g. M1,M2): ", |input| {
            validation::medicine_ids(input).map(|ids| ids.join(","))
        }) else {
            return;
        };
        let Some(note) = self.ask("Note: ") else {
            return;
        };

        let result = appointments.consult(&appointment.apt_id, &medicine, &note);
        if let Some(consulted) = self.report(result) {
            self.say(format!(
                "Consultation recorded for {} (medicine: {}).",
                consulted.apt_id,
                consulted.medicine.unwrap_or_default()
            ));
        }
    }

    fn consultation_summary(&mut self) {
        let Some(apt_id) = self.ask_required("Appointment ID: ") else {
            return;
        };
        let result = AppointmentService::new(self.cfg.clone()).consultation_summary(&apt_id);
        if let Some(summary) = self.report(result) {
            self.say(table::boxed(&[
                ("aptID", summary.apt_id),
                ("patientID", summary.patient_id),
                ("medicine", summary.medicine),
                ("note", summary.note),
            ]));
        }
    }

    pub(crate) fn medicine_list(&mut self) {
        let result = InventoryService::new(self.cfg.clone()).list();
        if let Some(medicines) = self.report(result) {
            self.say(table::render(&MEDICINE_HEADERS, &medicine_rows(&medicines)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::test_support::{run_session, seed_user, setup, today};
    use clinic_core::{Appointment, AppointmentStatus, Collection, PatientService, Role};

    fn booked(doctor: &str) -> (tempfile::TempDir, std::sync::Arc<clinic_core::CoreConfig>) {
        let (tmp, cfg) = setup();
        let doctor_id = seed_user(&cfg, doctor, Role::Doctor);
        let patient = PatientService::new(cfg.clone())
            .register("Jane Doe", "1990-01-01", "0123456789", today())
            .expect("register");
        AppointmentService::new(cfg.clone())
            .schedule(&patient.patient_id, &doctor_id, "2030-01-10", "10:00", today())
            .expect("booking");
        (tmp, cfg)
    }

    #[test]
    fn test_consultation_normalises_medicine_ids() {
        let (_tmp, cfg) = booked("house");

        let output = run_session(
            &cfg,
            &["house", "pw123", "3", "A1", "m1, X2", " m1 , m2 ", "flu", "0"],
        );

        assert!(output.contains("invalid format for: X2"));
        assert!(output.contains("Consultation recorded for A1 (medicine: M1,M2)."));
        let appointment = AppointmentService::new(cfg.clone()).get("A1").expect("get");
        assert_eq!(appointment.status, AppointmentStatus::Consulted);
        assert_eq!(appointment.note.as_deref(), Some("flu"));
    }

    #[test]
    fn test_consultation_refused_for_other_doctor() {
        let (_tmp, cfg) = booked("house");
        seed_user(&cfg, "wilson", Role::Doctor);

        let output = run_session(&cfg, &["wilson", "pw123", "3", "A1", "0"]);

        assert!(output.contains("Appointment A1 is not assigned to you."));
        let appointment = AppointmentService::new(cfg.clone()).get("A1").expect("get");
        assert_eq!(appointment.status, AppointmentStatus::Booked);
    }

    #[test]
    fn test_legacy_doctor_sees_only_own_appointments() {
        let (_tmp, cfg) = setup();
        let store = cfg.store().expect("store");
        let legacy = serde_json::json!({
            "doctorID": "D1",
            "username": "house",
            "password": "pw123",
            "role": "doctor"
        });
        store
            .write_all(Collection::Users, &[legacy.as_object().cloned().expect("object")])
            .expect("write users");
        for doctor_id in ["D1", ""] {
            store
                .insert(Appointment {
                    patient_id: "P1".into(),
                    doctor_id: doctor_id.into(),
                    date: "2030-01-10".into(),
                    time: "10:00".into(),
                    ..Default::default()
                })
                .expect("insert appointment");
        }

        let listing = run_session(&cfg, &["house", "pw123", "1", "0"]);
        assert!(listing.contains("A1"));
        assert!(!listing.contains("A2"));

        let output = run_session(&cfg, &["house", "pw123", "3", "A2", "0"]);
        assert!(output.contains("Appointment A2 is not assigned to you."));
        let appointment = AppointmentService::new(cfg.clone()).get("A2").expect("get");
        assert_eq!(appointment.status, AppointmentStatus::Booked);
    }

    #[test]
    fn test_summary_before_consultation_is_refused() {
        let (_tmp, cfg) = booked("house");

        let output = run_session(&cfg, &["house", "pw123", "4", "A1", "0"]);

        assert!(output.contains("record a consultation first"));
    }
}
