use clinic_core::{
    validation, ClinicError, ClinicResult, Medicine, NewUser, Patient, ReportService, Session,
    StatusFilter, User, UserService, UserUpdate,
};

use crate::console::Console;
use crate::table;
use crate::terminal::Terminal;

const MENU: [&str; 9] = [
    "Add user",
    "Update user",
    "Remove user",
    "View patients",
    "Appointment overview (next 7 days)",
    "Appointment history",
    "Income report",
    "Staff summary",
    "Medicine summary",
];

fn status_filter(input: &str) -> ClinicResult<StatusFilter> {
    match input.to_lowercase().as_str() {
        "b" | "booked" => Ok(StatusFilter::Booked),
        "c" | "cancelled" | "canceled" => Ok(StatusFilter::Cancelled),
        "a" | "all" => Ok(StatusFilter::All),
        _ => Err(ClinicError::Validation(format!(
            "unknown filter '{}', expected b, c or a",
            input
        ))),
    }
}

pub(crate) fn user_rows(users: &[User]) -> Vec<Vec<String>> {
    users
        .iter()
        .map(|u| {
            vec![
                u.user_id.clone(),
                u.username.clone(),
                u.role.to_string(),
                u.age.to_string(),
                u.phone.clone(),
                u.status.clone(),
            ]
        })
        .collect()
}

pub(crate) fn patient_rows(patients: &[&Patient]) -> Vec<Vec<String>> {
    patients
        .iter()
        .map(|p| {
            vec![
                p.patient_id.clone(),
                p.name.clone(),
                p.dob.clone(),
                p.age.to_string(),
                p.phone.clone(),
                p.status.clone(),
            ]
        })
        .collect()
}

pub(crate) fn medicine_rows(medicines: &[Medicine]) -> Vec<Vec<String>> {
    medicines
        .iter()
        .map(|m| {
            vec![
                m.med_id.clone(),
                m.name.clone(),
                m.stock.to_string(),
                format!("RM {:.2}", m.price),
            ]
        })
        .collect()
}

pub(crate) const USER_HEADERS: [&str; 6] = ["User ID", "Username", "Role", "Age", "Phone", "Status"];
pub(crate) const PATIENT_HEADERS: [&str; 6] = ["Patient ID", "Name", "DOB", "Age", "Phone", "Status"];
pub(crate) const MEDICINE_HEADERS: [&str; 4] = ["Med ID", "Name", "Stock", "Price"];

impl<T: Terminal> Console<T> {
    pub(crate) fn admin_menu(&mut self, _session: &Session) {
        while let Some(choice) = self.choose("Administrator Menu", &MENU) {
            match choice {
                1 => self.add_user(),
                2 => self.update_user(),
                3 => self.remove_user(),
                4 => self.view_patients(),
                5 => self.appointment_overview(),
                6 => self.appointment_history(),
                7 => self.income_report(),
                8 => self.staff_summary(),
                _ => self.medicine_summary(),
            }
        }
    }

    fn users(&self) -> UserService {
        UserService::new(self.cfg.clone())
    }

    fn reports(&self) -> ReportService {
        ReportService::new(self.cfg.clone())
    }

    fn add_user(&mut self) {
        let Some(username) = self.ask_valid("Username: ", validation::username) else {
            return;
        };
        let Some(password) = self.ask_valid("Password: ", validation::password) else {
            return;
        };
        let Some(age) = self.ask_valid("Age: ", validation::user_age) else {
            return;
        };
        let Some(phone) = self.ask_valid("Phone: ", validation::staff_phone) else {
            return;
        };
        let Some(role) = self.ask_valid(
            "Role (d=doctor, r=receptionist, ph=pharmacist, a=accountant, ad=admin, p=patient): ",
            validation::role,
        ) else {
            return;
        };

        let result = self.users().add(NewUser {
            username,
            password,
            age,
            role,
            phone,
        });
        if let Some(user) = self.report(result) {
            self.say(format!("User {} ({}) added as {}.", user.user_id, user.username, user.role));
        }
    }

    /// Finds a user by username or ID, listing close usernames when nothing matches.
    fn lookup_user(&mut self) -> Option<User> {
        let key = self.ask_required("Username or user ID: ")?;
        let found = self.users().find(&key);
        match self.report(found)? {
            Some(user) => Some(user),
            None => {
                self.say(format!("User '{}' not found.", key));
                let suggestions = self.users().suggestions(&key);
                if let Some(suggestions) = self.report(suggestions) {
                    if !suggestions.is_empty() {
                        self.say("Did you mean:");
                        for user in &suggestions {
                            self.say(format!("  {} (phone: {})", user.username, user.phone));
                        }
                    }
                }
                None
            }
        }
    }

    fn update_user(&mut self) {
        let Some(user) = self.lookup_user() else {
            return;
        };
        self.say(table::render(&USER_HEADERS, &user_rows(std::slice::from_ref(&user))));
        self.say("Leave a field blank to keep its current value.");

        let Some(username) = self.ask_optional("New username: ", validation::username) else {
            return;
        };
        let Some(password) = self.ask_optional("New password: ", validation::password) else {
            return;
        };
        let Some(age) = self.ask_optional("New age: ", validation::user_age) else {
            return;
        };
        let Some(phone) = self.ask_optional("New phone: ", validation::staff_phone) else {
            return;
        };
        let Some(role) = self.ask_optional("New role: ", validation::role) else {
            return;
        };

        let changes = UserUpdate {
            username,
            password,
            age,
            phone,
            role,
        };
        if changes.is_empty() {
            self.say("Nothing to update.");
            return;
        }
        let result = self.users().update(&user.user_id, changes);
        if let Some(updated) = self.report(result) {
            self.say(format!("User {} updated.", updated.user_id));
        }
    }

    fn remove_user(&mut self) {
        let Some(user) = self.lookup_user() else {
            return;
        };
        if !self.confirm(&format!("Remove user {} ({})?", user.user_id, user.username)) {
            self.say("Removal cancelled.");
            return;
        }
        let result = self.users().remove(&user.user_id);
        if let Some(removed) = self.report(result) {
            self.say(format!("User {} removed.", removed.username));
        }
    }

    fn view_patients(&mut self) {
        let result = self.reports().patients();
        if let Some(patients) = self.report(result) {
            let patients: Vec<&Patient> = patients.iter().collect();
            self.say(table::render(&PATIENT_HEADERS, &patient_rows(&patients)));
        }
    }

    fn appointment_overview(&mut self) {
        let result = self.reports().upcoming_overview(self.today);
        let Some(days) = self.report(result) else {
            return;
        };
        let rows: Vec<Vec<String>> = days
            .iter()
            .map(|d| {
                vec![
                    validation::format_date(d.date),
                    d.booked.to_string(),
                    d.cancelled.to_string(),
                    d.total.to_string(),
                ]
            })
            .collect();
        self.say(table::render(&["Date", "Booked", "Cancelled", "Total"], &rows));

        let Some(Some(date)) =
            self.ask_optional("Date to inspect (blank to return): ", validation::parse_date)
        else {
            return;
        };
        let Some(filter) = self.ask_valid("Show (b)ooked, (c)ancelled or (a)ll: ", status_filter)
        else {
            return;
        };
        let result = self.reports().appointments_on(date, filter);
        if let Some(views) = self.report(result) {
            self.show_appointments(&views);
        }
    }

    fn appointment_history(&mut self) {
        let result = self.reports().appointment_history();
        if let Some(views) = self.report(result) {
            self.show_appointments(&views);
        }
    }

    fn income_report(&mut self) {
        let result = self.reports().income_details();
        let Some(lines) = self.report(result) else {
            return;
        };
        let rows: Vec<Vec<String>> = lines
            .iter()
            .map(|l| {
                vec![
                    l.bill_id.clone(),
                    l.patient_id.clone(),
                    l.patient_name.clone(),
                    format!("RM {:.2}", l.amount),
                    l.date.clone(),
                ]
            })
            .collect();
        self.say(table::render(
            &["Bill ID", "Patient ID", "Patient", "Amount", "Date"],
            &rows,
        ));
        let total: f64 = lines.iter().map(|l| l.amount).sum();
        self.say(format!("Total income: RM {:.2}", total));
    }

    fn staff_summary(&mut self) {
        let result = self.reports().staff_summary();
        if let Some(staff) = self.report(result) {
            self.say(table::render(&USER_HEADERS, &user_rows(&staff)));
        }
    }

    fn medicine_summary(&mut self) {
        let result = self.reports().medicine_summary();
        let Some(summary) = self.report(result) else {
            return;
        };
        self.say(table::render(&MEDICINE_HEADERS, &medicine_rows(&summary.medicines)));
        if summary.low_stock.is_empty() {
            self.say(format!("No medicines below {} units.", summary.limit));
        } else {
            self.say(format!("Low stock (below {} units):", summary.limit));
            self.say(table::render(&MEDICINE_HEADERS, &medicine_rows(&summary.low_stock)));
        }
    }
}
