//! Login and the prompt helpers shared by every role menu.

use chrono::NaiveDate;
use clinic_core::{
    Appointment, AppointmentView, AuthService, ClinicError, ClinicResult, CoreConfig, LoginGate,
    LoginOutcome, Role, Session,
};
use std::sync::Arc;

use crate::table;
use crate::terminal::Terminal;

/// An appointment record laid out as a box.
pub(crate) fn appointment_box(appointment: &Appointment) -> String {
    let mut fields = vec![
        ("aptID", appointment.apt_id.clone()),
        ("patientID", appointment.patient_id.clone()),
        ("doctorID", appointment.doctor_id.clone()),
        ("date", appointment.date.clone()),
        ("time", appointment.time.clone()),
        ("status", appointment.status.to_string()),
    ];
    if let Some(medicine) = &appointment.medicine {
        fields.push(("medicine", medicine.clone()));
    }
    if let Some(note) = &appointment.note {
        fields.push(("note", note.clone()));
    }
    table::boxed(&fields)
}

/// One operator session over a terminal.
pub struct Console<T: Terminal> {
    pub(crate) term: T,
    pub(crate) cfg: Arc<CoreConfig>,
    pub(crate) today: NaiveDate,
}

impl<T: Terminal> Console<T> {
    pub fn new(term: T, cfg: Arc<CoreConfig>, today: NaiveDate) -> Self {
        Self { term, cfg, today }
    }

    #[cfg(test)]
    pub fn into_terminal(self) -> T {
        self.term
    }

    /// Logs an operator in and runs their role menu until they log out.
    pub fn run(&mut self) {
        self.say("=== Clinic Management System ===");
        let Some(session) = self.login() else {
            self.say("Goodbye.");
            return;
        };

        self.say(format!(
            "Welcome, {} ({}).",
            session.username(),
            session.role()
        ));
        match session.role() {
            Role::Administrator => self.admin_menu(&session),
            Role::Receptionist => self.receptionist_menu(&session),
            Role::Doctor => self.doctor_menu(&session),
            Role::Pharmacist => self.pharmacist_menu(&session),
            Role::AccountsPersonnel => self.accountant_menu(&session),
            other => self.say(format!("Role '{}' has no menu.", other)),
        }
        tracing::info!("user {} logged out", session.user_id());
        self.say("Logged out.");
    }

    /// Prompts for credentials until they are accepted or attempts run out.
    pub fn login(&mut self) -> Option<Session> {
        let mut gate = LoginGate::new(AuthService::new(self.cfg.clone()));
        loop {
            let username = self.ask("Username: ")?;
            let password = self.term.read_line("Password: ")?;
            match gate.attempt(&username, password.trim_end_matches(['\r', '\n'])) {
                Ok(LoginOutcome::Granted(session)) => return Some(session),
                Ok(LoginOutcome::Retry { attempts_left }) => self.say(format!(
                    "Invalid username or password. {} attempt(s) left.",
                    attempts_left
                )),
                Ok(LoginOutcome::LockedOut) => {
                    self.say("Too many failed attempts.");
                    return None;
                }
                Err(e) => {
                    self.fail(&e);
                    return None;
                }
            }
        }
    }

    // ========================================================================
    // PROMPTS
    // ========================================================================

    pub(crate) fn say(&mut self, text: impl AsRef<str>) {
        self.term.print(text.as_ref());
    }

    /// Reads one trimmed line; `None` once input is closed.
    pub(crate) fn ask(&mut self, prompt: &str) -> Option<String> {
        self.term
            .read_line(prompt)
            .map(|line| line.trim().to_string())
    }

    /// Re-prompts until `parse` accepts the input.
    pub(crate) fn ask_valid<V>(
        &mut self,
        prompt: &str,
        parse: impl Fn(&str) -> ClinicResult<V>,
    ) -> Option<V> {
        loop {
            let line = self.ask(prompt)?;
            match parse(&line) {
                Ok(value) => return Some(value),
                Err(e) => self.say(format!("{}. Please try again.", e)),
            }
        }
    }

    /// Reads a line, re-prompting while it is empty.
    pub(crate) fn ask_required(&mut self, prompt: &str) -> Option<String> {
        self.ask_valid(prompt, |line| {
            if line.is_empty() {
                Err(ClinicError::Validation("a value is required".into()))
            } else {
                Ok(line.to_string())
            }
        })
    }

    pub(crate) fn confirm(&mut self, prompt: &str) -> bool {
        self.ask(&format!("{} (y/n): ", prompt))
            .is_some_and(|answer| matches!(answer.to_lowercase().as_str(), "y" | "yes"))
    }

    /// Shows a numbered menu and returns the chosen option, starting at 1.
    ///
    /// `None` means the operator chose `0` or closed input.
    pub(crate) fn choose(&mut self, title: &str, options: &[&str]) -> Option<usize> {
        self.say("");
        self.say(format!("=== {} ===", title));
        for (i, option) in options.iter().enumerate() {
            self.say(format!("{}. {}", i + 1, option));
        }
        self.say("0. Logout");
        loop {
            let choice = self.ask("Select an option: ")?;
            match choice.parse::<usize>() {
                Ok(0) => return None,
                Ok(n) if n <= options.len() => return Some(n),
                _ => self.say("Invalid choice."),
            }
        }
    }

    /// Prints the error of a failed action and drops it.
    pub(crate) fn report<V>(&mut self, result: ClinicResult<V>) -> Option<V> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.fail(&e);
                None
            }
        }
    }

    pub(crate) fn fail(&mut self, error: &ClinicError) {
        self.say(format!("Error: {}", error));
        match error {
            ClinicError::Conflict { appointment, .. } => {
                self.say("Conflicting appointment:");
                self.say(appointment_box(appointment));
            }
            ClinicError::DuplicatePatient { existing } => {
                self.say(table::boxed(&[
                    ("patientID", existing.patient_id.clone()),
                    ("name", existing.name.clone()),
                    ("dob", existing.dob.clone()),
                    ("phone", existing.phone.clone()),
                ]));
            }
            _ => {}
        }
    }

    // ========================================================================
    // SHARED VIEWS
    // ========================================================================

    pub(crate) fn show_appointments(&mut self, views: &[AppointmentView]) {
        let rows: Vec<Vec<String>> = views
            .iter()
            .map(|v| {
                vec![
                    v.appointment.apt_id.clone(),
                    v.appointment.date.clone(),
                    v.appointment.time.clone(),
                    v.appointment.patient_id.clone(),
                    v.patient_name.clone(),
                    v.patient_phone.clone(),
                    v.doctor_name.clone(),
                    v.appointment.status.to_string(),
                ]
            })
            .collect();
        self.say(table::render(
            &[
                "Apt ID", "Date", "Time", "Patient ID", "Patient", "Phone", "Doctor", "Status",
            ],
            &rows,
        ));
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::terminal::ScriptedTerminal;
    use clinic_core::{BillingMode, NewUser, UserService};
    use tempfile::TempDir;

    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 1, 9).expect("valid date")
    }

    pub fn setup() -> (TempDir, Arc<CoreConfig>) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = CoreConfig::new(temp_dir.path().join("data"), BillingMode::Deferred)
            .expect("config should build");
        (temp_dir, Arc::new(cfg))
    }

    pub fn seed_user(cfg: &Arc<CoreConfig>, username: &str, role: Role) -> String {
        UserService::new(cfg.clone())
            .add(NewUser {
                username: username.to_string(),
                password: "pw123".to_string(),
                age: 40,
                role,
                phone: "012-3456789".to_string(),
            })
            .expect("user should be added")
            .user_id
    }

    /// Runs a full console session over `inputs` and returns everything printed.
    pub fn run_session(cfg: &Arc<CoreConfig>, inputs: &[&str]) -> String {
        let mut console = Console::new(ScriptedTerminal::new(inputs), cfg.clone(), today());
        console.run();
        console.into_terminal().output
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_login_three_failures_locks_out() {
        let (_tmp, cfg) = setup();
        seed_user(&cfg, "alice", Role::Receptionist);

        let output = run_session(&cfg, &["alice", "x", "alice", "y", "alice", "z", "alice", "pw123"]);

        assert!(output.contains("2 attempt(s) left"));
        assert!(output.contains("1 attempt(s) left"));
        assert!(output.contains("Too many failed attempts."));
        assert!(!output.contains("Welcome"));
    }

    #[test]
    fn test_login_matches_username_ignoring_case() {
        let (_tmp, cfg) = setup();
        seed_user(&cfg, "alice", Role::Pharmacist);

        let output = run_session(&cfg, &["ALICE", "pw123", "0"]);

        assert!(output.contains("Welcome, alice (pharmacist)."));
        assert!(output.contains("=== Pharmacist Menu ==="));
        assert!(output.contains("Logged out."));
    }

    #[test]
    fn test_patient_role_refused() {
        let (_tmp, cfg) = setup();
        seed_user(&cfg, "pat", Role::Patient);

        let output = run_session(&cfg, &["pat", "pw123"]);

        assert!(output.contains("Error: role 'patient' has no access to the console"));
        assert!(!output.contains("Welcome"));
    }

    #[test]
    fn test_menu_rejects_unknown_choice() {
        let (_tmp, cfg) = setup();
        seed_user(&cfg, "acc", Role::AccountsPersonnel);

        let output = run_session(&cfg, &["acc", "pw123", "9", "abc", "0"]);

        assert_eq!(output.matches("Invalid choice.").count(), 2);
        assert!(output.contains("Logged out."));
    }

    #[test]
    fn test_closed_input_ends_session() {
        let (_tmp, cfg) = setup();
        let output = run_session(&cfg, &[]);
        assert!(output.contains("Goodbye."));
    }
}
