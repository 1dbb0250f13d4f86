//! Accountant billing, receipts and income figures.
//!
//! A bill charges the consultation fee plus the price of every distinct medicine
//! prescribed on the appointment. Prescribed IDs missing from the inventory add nothing
//! and are flagged on the receipt.

use crate::config::BillingMode;
use crate::constants::CURRENCY;
use crate::error::{not_found, EntityKind};
use crate::lifecycle::{self, LifecycleAction};
use crate::models::{round_currency, Appointment, AppointmentStatus, Bill, BillStatus, Medicine};
use crate::{ClinicError, ClinicResult, CoreConfig};
use chrono::NaiveDateTime;
use clinic_store::{field_text, Collection, Entity, RecordStore};
use std::fmt::Write as _;
use std::sync::Arc;

/// Field names older income records used for the bill, patient and appointment IDs.
const LEGACY_BILL_FIELDS: [&str; 3] = ["inID", "userID", "aptID"];

/// One medicine line of a bill.
#[derive(Debug, Clone, PartialEq)]
pub struct BillLine {
    pub med_id: String,
    /// `None` when the inventory has no such medicine.
    pub name: Option<String>,
    pub price: f64,
}

/// A computed but not yet recorded bill.
#[derive(Debug, Clone, PartialEq)]
pub struct BillQuote {
    pub appointment: Appointment,
    pub consultation_fee: f64,
    pub lines: Vec<BillLine>,
    pub medicine_fee: f64,
    pub total: f64,
}

/// Result of recording a bill.
#[derive(Debug, Clone, PartialEq)]
pub struct BillingOutcome {
    pub bill: Bill,
    pub appointment: Appointment,
    /// An earlier unpaid bill for the appointment was settled instead of adding a new one.
    pub settled_existing: bool,
    /// Receipt text appended to the receipt log.
    pub receipt: String,
}

/// Totals over the income collection.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IncomeSummary {
    pub paid_total: f64,
    pub outstanding: f64,
    pub total_revenue: f64,
    pub paid_count: usize,
    pub unpaid_count: usize,
}

/// Billing operations for accounts personnel.
#[derive(Clone)]
pub struct BillingService {
    cfg: Arc<CoreConfig>,
}

impl BillingService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    pub fn list(&self) -> ClinicResult<Vec<Bill>> {
        Ok(self.cfg.store()?.load())
    }

    pub fn unpaid(&self) -> ClinicResult<Vec<Bill>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|b| b.status == BillStatus::Unpaid)
            .collect())
    }

    pub fn income_summary(&self) -> ClinicResult<IncomeSummary> {
        let mut summary = IncomeSummary::default();
        for bill in self.list()? {
            match bill.status {
                BillStatus::Paid => {
                    summary.paid_total += bill.amount;
                    summary.paid_count += 1;
                }
                BillStatus::Unpaid => {
                    summary.outstanding += bill.amount;
                    summary.unpaid_count += 1;
                }
            }
            summary.total_revenue += bill.amount;
        }
        summary.paid_total = round_currency(summary.paid_total);
        summary.outstanding = round_currency(summary.outstanding);
        summary.total_revenue = round_currency(summary.total_revenue);
        Ok(summary)
    }

    fn price(store: &RecordStore, appointment: Appointment, consultation_fee: f64) -> ClinicResult<BillQuote> {
        if !consultation_fee.is_finite() || consultation_fee < 0.0 {
            return Err(ClinicError::Validation(
                "consultation fee cannot be negative".into(),
            ));
        }
        let consultation_fee = round_currency(consultation_fee);
        let medicines: Vec<Medicine> = store.load();

        let lines: Vec<BillLine> = appointment
            .billed_ids()
            .into_iter()
            .map(|med_id| {
                let medicine = medicines
                    .iter()
                    .find(|m| m.med_id.trim().eq_ignore_ascii_case(&med_id));
                BillLine {
                    name: medicine.map(|m| m.name.clone()),
                    price: medicine.map_or(0.0, |m| m.price),
                    med_id,
                }
            })
            .collect();
        let medicine_fee = round_currency(lines.iter().map(|l| l.price).sum());

        Ok(BillQuote {
            appointment,
            consultation_fee,
            lines,
            medicine_fee,
            total: round_currency(consultation_fee + medicine_fee),
        })
    }

    fn billable(&self, appointment: &Appointment) -> ClinicResult<BillStatus> {
        match (&appointment.status, self.cfg.billing_mode()) {
            (AppointmentStatus::Consulted, _) => Ok(BillStatus::Paid),
            (AppointmentStatus::Booked, BillingMode::Deferred) => Ok(BillStatus::Unpaid),
            (status, _) => Err(ClinicError::InvalidTransition {
                apt_id: appointment.apt_id.clone(),
                action: LifecycleAction::Settle,
                status: status.clone(),
            }),
        }
    }

    /// Writes a settled bill over its stored record.
    ///
    /// Legacy records keyed by `inID` (or by nothing) are found by appointment and rekeyed
    /// to `billID`, dropping their legacy field names.
    fn store_settled(store: &RecordStore, mut bill: Bill) -> ClinicResult<Bill> {
        if !bill.bill_id.is_empty() && store.save(&bill)? {
            return Ok(bill);
        }

        let mut records = store.read_all(Collection::Income);
        let Some(index) = records.iter().position(|r| {
            field_text(r, "billID").is_empty()
                && ["appointmentID", "aptID"]
                    .iter()
                    .any(|field| field_text(r, field) == bill.appointment_id)
        }) else {
            return Err(not_found(EntityKind::Bill, bill.bill_id.clone()));
        };

        if bill.bill_id.is_empty() {
            bill.bill_id = store.next_id(Collection::Income)?.to_string();
        }
        let record = &mut records[index];
        for legacy in LEGACY_BILL_FIELDS {
            record.remove(legacy);
        }
        record.extend(bill.to_record()?);
        store.write_all(Collection::Income, &records)?;

        tracing::warn!("legacy bill {} rekeyed to billID while settling", bill.bill_id);
        Ok(bill)
    }

    /// Computes the bill for an appointment without recording anything.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Validation` for a negative fee, or `InvalidTransition` if the
    /// appointment cannot be billed under the configured billing mode.
    pub fn quote(&self, apt_id: &str, consultation_fee: f64) -> ClinicResult<BillQuote> {
        let store = self.cfg.store()?;
        let appointment: Appointment = store
            .get(apt_id.trim())
            .ok_or_else(|| not_found(EntityKind::Appointment, apt_id.trim()))?;
        self.billable(&appointment)?;
        Self::price(&store, appointment, consultation_fee)
    }

    /// Records the bill for an appointment and appends its receipt.
    ///
    /// A consulted appointment is billed as paid and moves to `paid`. In deferred mode a
    /// booked appointment is billed as unpaid and stays booked. Each appointment carries
    /// at most one bill: an unpaid bill is settled in place once the appointment has been
    /// consulted, and any other repeat is rejected.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`BillingService::quote`], or `ClinicError::AlreadyBilled`.
    pub fn record(
        &self,
        apt_id: &str,
        consultation_fee: f64,
        recorded_at: NaiveDateTime,
    ) -> ClinicResult<BillingOutcome> {
        let quote = self.quote(apt_id, consultation_fee)?;
        let status = self.billable(&quote.appointment)?;
        let store = self.cfg.store()?;

        let existing = store
            .load::<Bill>()
            .into_iter()
            .find(|b| b.appointment_id == quote.appointment.apt_id);

        let (bill, settled_existing) = match existing {
            Some(previous)
                if previous.status == BillStatus::Unpaid && status == BillStatus::Paid =>
            {
                let bill = Bill {
                    consultation_fee: quote.consultation_fee,
                    medicine_fee: quote.medicine_fee,
                    amount: quote.total,
                    status,
                    ..previous
                };
                (Self::store_settled(&store, bill)?, true)
            }
            Some(previous) => {
                return Err(ClinicError::AlreadyBilled {
                    apt_id: quote.appointment.apt_id,
                    bill_id: previous.bill_id,
                });
            }
            None => {
                let bill = store.insert(Bill {
                    patient: quote.appointment.patient_id.clone(),
                    appointment_id: quote.appointment.apt_id.clone(),
                    consultation_fee: quote.consultation_fee,
                    medicine_fee: quote.medicine_fee,
                    amount: quote.total,
                    status,
                    ..Default::default()
                })?;
                (bill, false)
            }
        };

        let mut appointment = quote.appointment.clone();
        if status == BillStatus::Paid {
            lifecycle::apply(&mut appointment, LifecycleAction::Settle)?;
            store.save(&appointment)?;
        }

        let receipt = render_receipt(&bill, &appointment, &quote.lines, recorded_at);
        if let Err(e) = self.cfg.receipts().append(&receipt) {
            tracing::warn!("bill {} recorded but its receipt was not logged: {}", bill.bill_id, e);
        }

        tracing::info!(
            "bill {} recorded for {} as {} ({} {:.2})",
            bill.bill_id,
            appointment.apt_id,
            bill.status,
            CURRENCY,
            bill.amount
        );
        Ok(BillingOutcome {
            bill,
            appointment,
            settled_existing,
            receipt,
        })
    }
}

fn capitalised(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Human-readable receipt block for the receipt log.
pub fn render_receipt(
    bill: &Bill,
    appointment: &Appointment,
    lines: &[BillLine],
    recorded_at: NaiveDateTime,
) -> String {
    let rule = "=".repeat(60);
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "=== BILL RECEIPT ===");
    let _ = writeln!(out, "Bill ID        : {}", bill.bill_id);
    let _ = writeln!(out, "Patient ID     : {}", bill.patient);
    let _ = writeln!(out, "Appointment ID : {}", bill.appointment_id);
    let _ = writeln!(out, "Doctor ID      : {}", appointment.doctor_id);
    let _ = writeln!(out, "Date           : {}", appointment.date);
    let _ = writeln!(out);
    let _ = writeln!(out, "--- Bill Breakdown ---");
    let _ = writeln!(out, "Consultation Fee : {} {:.2}", CURRENCY, bill.consultation_fee);
    let _ = writeln!(out);
    let _ = writeln!(out, "--- Prescribed Medicines ---");
    if lines.is_empty() {
        let _ = writeln!(out, "  No medicines prescribed");
    }
    for line in lines {
        match &line.name {
            Some(name) => {
                let _ = writeln!(out, "  {} (ID: {}) : {} {:.2}", name, line.med_id, CURRENCY, line.price);
            }
            None => {
                let _ = writeln!(out, "  {} : not found in inventory", line.med_id);
            }
        }
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Medicine Fee (Total) : {} {:.2}", CURRENCY, bill.medicine_fee);
    let _ = writeln!(out, "Total Amount         : {} {:.2}", CURRENCY, bill.amount);
    let _ = writeln!(out);
    let _ = writeln!(out, "Status : {}", capitalised(&bill.status.to_string()));
    let _ = writeln!(out, "Recorded On : {}", recorded_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "{}", rule);
    out
}
