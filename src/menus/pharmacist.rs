use clinic_core::{validation, InventoryService, Medicine, Session};

use super::admin::{medicine_rows, MEDICINE_HEADERS};
use crate::console::Console;
use crate::table;
use crate::terminal::Terminal;

const MENU: [&str; 7] = [
    "Add medicine",
    "Update stock",
    "Update price",
    "Remove medicine",
    "View medicine list",
    "Dispense medication",
    "Low stock alert",
];

impl<T: Terminal> Console<T> {
    pub(crate) fn pharmacist_menu(&mut self, _session: &Session) {
        while let Some(choice) = self.choose("Pharmacist Menu", &MENU) {
            match choice {
                1 => self.add_medicine(),
                2 => self.update_stock(),
                3 => self.update_price(),
                4 => self.remove_medicine(),
                5 => self.medicine_list(),
                6 => self.dispense(),
                _ => self.low_stock_alert(),
            }
        }
    }

    fn inventory(&self) -> InventoryService {
        InventoryService::new(self.cfg.clone())
    }

    /// Asks for a medicine ID and shows the medicine it names.
    fn lookup_medicine(&mut self) -> Option<Medicine> {
        let med_id = self.ask_required("Medicine ID: ")?;
        let found = self.inventory().get(&med_id);
        let medicine = self.report(found)?;
        self.say(table::render(
            &MEDICINE_HEADERS,
            &medicine_rows(std::slice::from_ref(&medicine)),
        ));
        Some(medicine)
    }

    fn add_medicine(&mut self) {
        let Some(name) = self.ask_required("Medicine name: ") else {
            return;
        };
        let Some(stock) = self.ask_valid("Stock: ", validation::stock) else {
            return;
        };
        let Some(price) = self.ask_valid("Price (RM): ", validation::amount) else {
            return;
        };
        let result = self.inventory().add(&name, stock, price);
        if let Some(medicine) = self.report(result) {
            self.say(format!("Medicine {} ({}) added.", medicine.med_id, medicine.name));
        }
    }

    fn update_stock(&mut self) {
        let Some(medicine) = self.lookup_medicine() else {
            return;
        };
        let Some(stock) = self.ask_valid("New stock: ", validation::stock) else {
            return;
        };
        let result = self.inventory().update_stock(&medicine.med_id, stock);
        if let Some(updated) = self.report(result) {
            self.say(format!("Stock of {} is now {}.", updated.name, updated.stock));
        }
    }

    fn update_price(&mut self) {
        let Some(medicine) = self.lookup_medicine() else {
            return;
        };
        let Some(price) = self.ask_valid("New price (RM): ", validation::amount) else {
            return;
        };
        let result = self.inventory().update_price(&medicine.med_id, price);
        if let Some(updated) = self.report(result) {
            self.say(format!("Price of {} is now RM {:.2}.", updated.name, updated.price));
        }
    }

    fn remove_medicine(&mut self) {
        let Some(medicine) = self.lookup_medicine() else {
            return;
        };
        if !self.confirm(&format!("Remove {}?", medicine.name)) {
            self.say("Removal cancelled.");
            return;
        }
        let result = self.inventory().remove(&medicine.med_id);
        if let Some(removed) = self.report(result) {
            self.say(format!("Medicine {} removed.", removed.med_id));
        }
    }

    fn dispense(&mut self) {
        let Some(apt_id) = self.ask_required("Appointment ID: ") else {
            return;
        };
        let listed = self.inventory().medication_list(&apt_id);
        let Some(prescribed) = self.report(listed) else {
            return;
        };
        let rows: Vec<Vec<String>> = prescribed
            .iter()
            .map(|p| match &p.medicine {
                Some(m) => vec![
                    p.med_id.clone(),
                    m.name.clone(),
                    m.stock.to_string(),
                    format!("RM {:.2}", m.price),
                ],
                None => vec![
                    p.med_id.clone(),
                    "not found in inventory".to_string(),
                    String::new(),
                    String::new(),
                ],
            })
            .collect();
        self.say(table::render(&MEDICINE_HEADERS, &rows));

        if !self.confirm("Dispense and complete this appointment?") {
            self.say("Dispensing cancelled.");
            return;
        }
        let result = self.inventory().dispense(&apt_id);
        let Some(report) = self.report(result) else {
            return;
        };
        for change in &report.changes {
            if change.shortfall {
                self.say(format!(
                    "Warning: {} ({}) is out of stock.",
                    change.name, change.med_id
                ));
            } else {
                self.say(format!(
                    "{} ({}): {} -> {}",
                    change.name, change.med_id, change.previous, change.remaining
                ));
            }
        }
        for med_id in &report.missing {
            self.say(format!("Warning: {} not found in inventory.", med_id));
        }
        self.say(format!(
            "Appointment {} is now {}.",
            report.appointment.apt_id, report.appointment.status
        ));
    }

    fn low_stock_alert(&mut self) {
        let result = self.inventory().low_stock();
        let Some(low) = self.report(result) else {
            return;
        };
        let limit = self.cfg.low_stock_limit();
        if low.is_empty() {
            self.say(format!("No medicines at or below {} units.", limit));
        } else {
            self.say(format!("Medicines at or below {} units:", limit));
            self.say(table::render(&MEDICINE_HEADERS, &medicine_rows(&low)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::test_support::{run_session, seed_user, setup};
    use clinic_core::Role;

    #[test]
    fn test_add_and_restock_medicine() {
        let (_tmp, cfg) = setup();
        seed_user(&cfg, "phil", Role::Pharmacist);

        let output = run_session(
            &cfg,
            &[
                "phil", "pw123",
                "1", "Paracetamol", "-3", "10", "abc", "2.5",
                "2", "M1", "3",
                "7",
                "0",
            ],
        );

        assert!(output.contains("Medicine M1 (Paracetamol) added."));
        assert!(output.contains("Stock of Paracetamol is now 3."));
        assert!(output.contains("Medicines at or below 5 units:"));
        let medicine = InventoryService::new(cfg.clone()).get("M1").expect("get");
        assert_eq!(medicine.stock, 3);
        assert_eq!(medicine.price, 2.5);
    }

    #[test]
    fn test_dispense_before_payment_changes_nothing() {
        let (_tmp, cfg) = setup();
        seed_user(&cfg, "phil", Role::Pharmacist);
        let inventory = InventoryService::new(cfg.clone());
        inventory.add("Paracetamol", 10, 2.5).expect("add");
        let store = cfg.store().expect("store");
        store
            .insert(clinic_core::Appointment {
                patient_id: "P1".into(),
                doctor_id: "U9".into(),
                date: "2030-01-10".into(),
                time: "10:00".into(),
                status: clinic_core::AppointmentStatus::Consulted,
                medicine: Some("M1".into()),
                ..Default::default()
            })
            .expect("insert");

        let output = run_session(&cfg, &["phil", "pw123", "6", "A1", "y", "0"]);

        assert!(output.contains("Paracetamol"));
        assert!(output.contains("Error: cannot dispense appointment A1"));
        assert_eq!(inventory.get("M1").expect("get").stock, 10);
    }
}
