use chrono::NaiveDate;
use clinic_core::{
    validation, AppointmentService, ClinicResult, Patient, PatientSearch, PatientService,
    Session, UserService,
};

use super::admin::{patient_rows, PATIENT_HEADERS};
use crate::console::{appointment_box, Console};
use crate::table;
use crate::terminal::Terminal;

const MENU: [&str; 8] = [
    "Register patient",
    "Update patient information",
    "Schedule appointment",
    "Reschedule appointment",
    "Cancel appointment",
    "View appointments by date",
    "View all appointments",
    "Search patient",
];

/// Parses a birth date, returning it in stored form.
fn birth_date_parser(today: NaiveDate) -> impl Fn(&str) -> ClinicResult<String> {
    move |input| validation::birth_date(input, today).map(validation::format_date)
}

impl<T: Terminal> Console<T> {
    pub(crate) fn receptionist_menu(&mut self, _session: &Session) {
        self.assign_open_appointments();
        while let Some(choice) = self.choose("Receptionist Menu", &MENU) {
            match choice {
                1 => self.register_patient(),
                2 => self.update_patient(),
                3 => self.schedule_appointment(),
                4 => self.reschedule_appointment(),
                5 => self.cancel_appointment(),
                6 => self.appointments_by_date(),
                7 => self.all_appointments(),
                _ => self.search_patient(),
            }
        }
    }

    fn appointments(&self) -> AppointmentService {
        AppointmentService::new(self.cfg.clone())
    }

    fn patients(&self) -> PatientService {
        PatientService::new(self.cfg.clone())
    }

    fn assign_open_appointments(&mut self) {
        let result = self.appointments().auto_assign_doctors(self.today);
        if let Some(assigned) = self.report(result) {
            for appointment in assigned {
                self.say(format!(
                    "Doctor {} assigned to appointment {} at {}.",
                    appointment.doctor_id, appointment.apt_id, appointment.time
                ));
            }
        }
    }

    fn register_patient(&mut self) {
        let Some(name) = self.ask_valid("Full name: ", validation::patient_name) else {
            return;
        };
        let parse_dob = birth_date_parser(self.today);
        let Some(dob) = self.ask_valid("Date of birth (e.g. 15/01/1990): ", parse_dob) else {
            return;
        };
        let Some(phone) = self.ask_valid("Phone: ", validation::patient_phone) else {
            return;
        };

        let result = self.patients().register(&name, &dob, &phone, self.today);
        if let Some(patient) = self.report(result) {
            self.say(format!(
                "Patient {} registered (age {}).",
                patient.patient_id, patient.age
            ));
        }
    }

    fn update_patient(&mut self) {
        let Some(patient_id) = self.ask_required("Patient ID: ") else {
            return;
        };
        let found = self.patients().get(&patient_id);
        let Some(patient) = self.report(found) else {
            return;
        };
        self.say(table::render(&PATIENT_HEADERS, &patient_rows(&[&patient])));
        self.say("Leave a field blank to keep its current value.");

        let Some(name) = self.ask_optional("New name: ", validation::patient_name) else {
            return;
        };
        let parse_dob = birth_date_parser(self.today);
        let Some(dob) = self.ask_optional("New date of birth: ", parse_dob) else {
            return;
        };
        let Some(phone) = self.ask_optional("New phone: ", validation::patient_phone) else {
            return;
        };

        let result = self.patients().update_info(
            &patient.patient_id,
            name.as_deref().unwrap_or(&patient.name),
            dob.as_deref().unwrap_or(&patient.dob),
            phone.as_deref().unwrap_or(&patient.phone),
            self.today,
        );
        if let Some(updated) = self.report(result) {
            self.say(format!("Patient {} updated.", updated.patient_id));
        }
    }

    fn show_doctors(&mut self) {
        let result = UserService::new(self.cfg.clone()).doctors();
        if let Some(doctors) = self.report(result) {
            let rows: Vec<Vec<String>> = doctors
                .iter()
                .map(|d| vec![d.doctor_id.clone(), d.name.clone(), d.phone.clone()])
                .collect();
            self.say(table::render(&["Doctor ID", "Name", "Phone"], &rows));
        }
    }

    /// Reads a future appointment date and a time, both as the store writes them.
    fn ask_slot(&mut self) -> Option<(String, String)> {
        let today = self.today;
        let date = self.ask_valid("Date (after today): ", |input| {
            validation::appointment_date(input, today).map(validation::format_date)
        })?;
        let time = self.ask_valid("Time (HH:MM, 24-hour): ", |input| {
            validation::parse_time(input).map(validation::format_time)
        })?;
        Some((date, time))
    }

    fn schedule_appointment(&mut self) {
        let Some(patient_id) = self.ask_required("Patient ID: ") else {
            return;
        };
        let found = self.patients().get(&patient_id);
        let Some(patient) = self.report(found) else {
            return;
        };
        self.show_doctors();
        let Some(doctor_id) = self.ask_required("Doctor ID: ") else {
            return;
        };
        let Some((date, time)) = self.ask_slot() else {
            return;
        };

        let result =
            self.appointments()
                .schedule(&patient.patient_id, &doctor_id, &date, &time, self.today);
        if let Some(appointment) = self.report(result) {
            self.say(format!(
                "Appointment {} booked for {} on {} at {}.",
                appointment.apt_id, patient.name, appointment.date, appointment.time
            ));
        }
    }

    fn reschedule_appointment(&mut self) {
        let Some(apt_id) = self.ask_required("Appointment ID: ") else {
            return;
        };
        let found = self.appointments().get(&apt_id);
        let Some(appointment) = self.report(found) else {
            return;
        };
        self.say(appointment_box(&appointment));

        let doctor_known = UserService::new(self.cfg.clone())
            .doctor(&appointment.doctor_id)
            .is_ok();
        let replacement = if doctor_known {
            let Some(replacement) = self.ask_optional("New doctor ID (blank to keep): ", |id| {
                Ok(id.to_string())
            }) else {
                return;
            };
            replacement
        } else {
            self.say(format!(
                "Doctor '{}' is no longer available; choose a replacement.",
                appointment.doctor_id
            ));
            self.show_doctors();
            let Some(replacement) = self.ask_required("Doctor ID: ") else {
                return;
            };
            Some(replacement)
        };
        let Some((date, time)) = self.ask_slot() else {
            return;
        };

        let result = self.appointments().reschedule(
            &appointment.apt_id,
            &date,
            &time,
            replacement.as_deref(),
            self.today,
        );
        if let Some(updated) = self.report(result) {
            self.say(format!(
                "Appointment {} moved to {} at {}.",
                updated.apt_id, updated.date, updated.time
            ));
        }
    }

    fn cancel_appointment(&mut self) {
        let Some(apt_id) = self.ask_required("Appointment ID: ") else {
            return;
        };
        let found = self.appointments().get(&apt_id);
        let Some(appointment) = self.report(found) else {
            return;
        };
        self.say(appointment_box(&appointment));
        if !self.confirm("Cancel this appointment?") {
            self.say("Appointment kept.");
            return;
        }
        let result = self.appointments().cancel(&appointment.apt_id);
        if let Some(cancelled) = self.report(result) {
            self.say(format!("Appointment {} cancelled.", cancelled.apt_id));
        }
    }

    fn appointments_by_date(&mut self) {
        let Some(date) = self.ask_valid("Date: ", validation::parse_date) else {
            return;
        };
        let result = self.appointments().for_date(date);
        if let Some(views) = self.report(result) {
            self.show_appointments(&views);
        }
    }

    fn all_appointments(&mut self) {
        let result = self.appointments().all();
        if let Some(views) = self.report(result) {
            self.show_appointments(&views);
        }
    }

    fn search_patient(&mut self) {
        let Some(query) = self.ask_required("Patient name: ") else {
            return;
        };
        let result = self.patients().search_by_name(&query);
        let Some(search) = self.report(result) else {
            return;
        };
        match &search {
            PatientSearch::Exact(_) => {}
            PatientSearch::Partial(_) => self.say("Patients whose name contains the query:"),
            PatientSearch::Fuzzy(_) => self.say("No exact match. Closest names:"),
            PatientSearch::NoMatch => {
                self.say(format!("No patient matches '{}'.", query));
                return;
            }
        }
        let patients: Vec<&Patient> = search.patients();
        self.say(table::render(&PATIENT_HEADERS, &patient_rows(&patients)));

        if let PatientSearch::Exact(patient) = &search {
            let result = self.appointments().for_patient(&patient.patient_id);
            if let Some(views) = self.report(result) {
                self.show_appointments(&views);
            }
        }
    }
}
