//! Numbered menus, one module per staff role.
//!
//! Each menu loops until the operator logs out. A failed action prints its error and
//! returns to the menu; nothing here lets a `ClinicError` end the session.

mod accountant;
mod admin;
mod doctor;
mod pharmacist;
mod receptionist;

use clinic_core::ClinicResult;

use crate::console::Console;
use crate::terminal::Terminal;

impl<T: Terminal> Console<T> {
    /// Prompts for an optional new value; a blank line keeps the current one.
    ///
    /// Returns `None` once input is closed and `Some(None)` for a blank line.
    pub(crate) fn ask_optional<V>(
        &mut self,
        prompt: &str,
        parse: impl Fn(&str) -> ClinicResult<V>,
    ) -> Option<Option<V>> {
        loop {
            let line = self.ask(prompt)?;
            if line.is_empty() {
                return Some(None);
            }
            match parse(&line) {
                Ok(value) => return Some(Some(value)),
                Err(e) => self.say(format!("{}. Please try again.", e)),
            }
        }
    }
}
