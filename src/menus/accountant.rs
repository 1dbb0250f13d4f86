use chrono::Local;
use clinic_core::{validation, BillingService, Session};

use crate::console::Console;
use crate::table;
use crate::terminal::Terminal;

const MENU: [&str; 3] = ["Bill appointment", "View unpaid bills", "Income summary"];

impl<T: Terminal> Console<T> {
    pub(crate) fn accountant_menu(&mut self, _session: &Session) {
        while let Some(choice) = self.choose("Accountant Menu", &MENU) {
            match choice {
                1 => self.bill_appointment(),
                2 => self.unpaid_bills(),
                _ => self.income_summary(),
            }
        }
    }

    fn billing(&self) -> BillingService {
        BillingService::new(self.cfg.clone())
    }

    fn bill_appointment(&mut self) {
        let Some(apt_id) = self.ask_required("Appointment ID: ") else {
            return;
        };
        let Some(fee) = self.ask_valid("Consultation fee (RM): ", validation::amount) else {
            return;
        };
        let quoted = self.billing().quote(&apt_id, fee);
        let Some(quote) = self.report(quoted) else {
            return;
        };

        let mut fields = vec![
            ("Appointment", quote.appointment.apt_id.clone()),
            ("Patient", quote.appointment.patient_id.clone()),
            ("Consultation", format!("RM {:.2}", quote.consultation_fee)),
        ];
        for line in &quote.lines {
            let label = match &line.name {
                Some(name) => format!("{} ({}): RM {:.2}", name, line.med_id, line.price),
                None => format!("{}: not found in inventory", line.med_id),
            };
            fields.push(("Medicine", label));
        }
        fields.push(("Medicine fee", format!("RM {:.2}", quote.medicine_fee)));
        fields.push(("Total", format!("RM {:.2}", quote.total)));
        self.say(table::boxed(&fields));

        if !self.confirm("Record this bill?") {
            self.say("Billing cancelled.");
            return;
        }
        let recorded = self
            .billing()
            .record(&apt_id, fee, Local::now().naive_local());
        if let Some(outcome) = self.report(recorded) {
            if outcome.settled_existing {
                self.say(format!("Unpaid bill {} settled.", outcome.bill.bill_id));
            }
            self.say(format!(
                "Bill {} recorded as {}; appointment {} is {}.",
                outcome.bill.bill_id,
                outcome.bill.status,
                outcome.appointment.apt_id,
                outcome.appointment.status
            ));
            self.say(outcome.receipt);
        }
    }

    fn unpaid_bills(&mut self) {
        let result = self.billing().unpaid();
        if let Some(bills) = self.report(result) {
            let rows: Vec<Vec<String>> = bills
                .iter()
                .map(|b| {
                    vec![
                        b.bill_id.clone(),
                        b.patient.clone(),
                        b.appointment_id.clone(),
                        format!("RM {:.2}", b.amount),
                        b.status.to_string(),
                    ]
                })
                .collect();
            self.say(table::render(
                &["Bill ID", "Patient ID", "Appointment", "Amount", "Status"],
                &rows,
            ));
        }
    }

    fn income_summary(&mut self) {
        let result = self.billing().income_summary();
        if let Some(summary) = self.report(result) {
            self.say(table::boxed(&[
                (
                    "Paid",
                    format!("RM {:.2} ({} bills)", summary.paid_total, summary.paid_count),
                ),
                (
                    "Outstanding",
                    format!("RM {:.2} ({} bills)", summary.outstanding, summary.unpaid_count),
                ),
                ("Total revenue", format!("RM {:.2}", summary.total_revenue)),
            ]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::test_support::{run_session, seed_user, setup, today};
    use clinic_core::{
        AppointmentService, AppointmentStatus, BillStatus, InventoryService, PatientService, Role,
    };

    fn consulted(cfg: &std::sync::Arc<clinic_core::CoreConfig>) {
        let doctor = seed_user(cfg, "house", Role::Doctor);
        InventoryService::new(cfg.clone())
            .add("Paracetamol", 10, 10.0)
            .expect("add medicine");
        let patient = PatientService::new(cfg.clone())
            .register("Jane Doe", "1990-01-01", "0123456789", today())
            .expect("register");
        let appointments = AppointmentService::new(cfg.clone());
        appointments
            .schedule(&patient.patient_id, &doctor, "2030-01-10", "10:00", today())
            .expect("booking");
        appointments.consult("A1", "M1", "flu").expect("consult");
    }

    #[test]
    fn test_bill_consulted_appointment() {
        let (_tmp, cfg) = setup();
        seed_user(&cfg, "acc", Role::AccountsPersonnel);
        consulted(&cfg);

        let output = run_session(&cfg, &["acc", "pw123", "1", "A1", "fifty", "50", "y", "3", "0"]);

        assert!(output.contains("Paracetamol (M1): RM 10.00"));
        assert!(output.contains("RM 60.00"));
        assert!(output.contains("Bill B1 recorded as paid; appointment A1 is paid."));
        assert!(output.contains("=== BILL RECEIPT ==="));
        assert!(output.contains("RM 60.00 (1 bills)"));

        let bills = BillingService::new(cfg.clone()).list().expect("list");
        assert_eq!(bills.len(), 1);
        assert_eq!(bills[0].status, BillStatus::Paid);
        let appointment = AppointmentService::new(cfg.clone()).get("A1").expect("get");
        assert_eq!(appointment.status, AppointmentStatus::Paid);
    }

    #[test]
    fn test_declined_quote_records_nothing() {
        let (_tmp, cfg) = setup();
        seed_user(&cfg, "acc", Role::AccountsPersonnel);
        consulted(&cfg);

        let output = run_session(&cfg, &["acc", "pw123", "1", "A1", "50", "n", "0"]);

        assert!(output.contains("Billing cancelled."));
        assert!(BillingService::new(cfg.clone()).list().expect("list").is_empty());
    }
}
