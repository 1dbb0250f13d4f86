//! Administrator reports.

use super::appointments::{AppointmentService, AppointmentView};
use crate::models::{Appointment, AppointmentStatus, Bill, BillStatus, Medicine, Patient, User};
use crate::{validation, ClinicResult, CoreConfig};
use chrono::{Days, NaiveDate};
use std::sync::Arc;

/// Number of days covered by the upcoming-appointments overview.
pub const OVERVIEW_DAYS: u64 = 7;

/// Appointment counts for one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayOverview {
    pub date: NaiveDate,
    pub booked: usize,
    pub cancelled: usize,
    pub total: usize,
}

/// Which appointments of a day to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Booked,
    Cancelled,
    All,
}

impl StatusFilter {
    fn keeps(self, status: &AppointmentStatus) -> bool {
        match self {
            StatusFilter::Booked => *status == AppointmentStatus::Booked,
            StatusFilter::Cancelled => status.is_cancelled(),
            StatusFilter::All => *status == AppointmentStatus::Booked || status.is_cancelled(),
        }
    }
}

/// One paid bill with the details an administrator reads.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomeLine {
    pub bill_id: String,
    pub patient_id: String,
    /// Patient name, or the username of a user with that ID, or empty.
    pub patient_name: String,
    pub amount: f64,
    /// Date of the billed appointment, empty if unknown.
    pub date: String,
}

/// Inventory overview with the medicines running low.
#[derive(Debug, Clone, PartialEq)]
pub struct MedicineSummary {
    pub medicines: Vec<Medicine>,
    pub low_stock: Vec<Medicine>,
    pub limit: u32,
}

/// Read-only reports over every collection.
#[derive(Clone)]
pub struct ReportService {
    cfg: Arc<CoreConfig>,
}

impl ReportService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    pub fn patients(&self) -> ClinicResult<Vec<Patient>> {
        Ok(self.cfg.store()?.load())
    }

    /// Booked and cancelled counts for each of the seven days after `today`.
    pub fn upcoming_overview(&self, today: NaiveDate) -> ClinicResult<Vec<DayOverview>> {
        let appointments: Vec<Appointment> = self.cfg.store()?.load();

        Ok((1..=OVERVIEW_DAYS)
            .filter_map(|offset| today.checked_add_days(Days::new(offset)))
            .map(|date| {
                let day = validation::format_date(date);
                let on_day = appointments.iter().filter(|a| a.date == day);
                let booked = on_day
                    .clone()
                    .filter(|a| a.status == AppointmentStatus::Booked)
                    .count();
                let cancelled = on_day.filter(|a| a.status.is_cancelled()).count();
                DayOverview {
                    date,
                    booked,
                    cancelled,
                    total: booked + cancelled,
                }
            })
            .collect())
    }

    /// Appointments on `date` whose status passes `filter`, with names attached.
    pub fn appointments_on(
        &self,
        date: NaiveDate,
        filter: StatusFilter,
    ) -> ClinicResult<Vec<AppointmentView>> {
        Ok(AppointmentService::new(self.cfg.clone())
            .for_date(date)?
            .into_iter()
            .filter(|v| filter.keeps(&v.appointment.status))
            .collect())
    }

    pub fn appointment_history(&self) -> ClinicResult<Vec<AppointmentView>> {
        AppointmentService::new(self.cfg.clone()).all()
    }

    /// Every paid bill with patient name and appointment date.
    pub fn income_details(&self) -> ClinicResult<Vec<IncomeLine>> {
        let store = self.cfg.store()?;
        let patients: Vec<Patient> = store.load();
        let users: Vec<User> = store.load();
        let appointments: Vec<Appointment> = store.load();

        Ok(store
            .load::<Bill>()
            .into_iter()
            .filter(|b| b.status == BillStatus::Paid)
            .map(|bill| {
                let patient_name = patients
                    .iter()
                    .find(|p| p.patient_id == bill.patient)
                    .map(|p| p.name.clone())
                    .filter(|name| !name.is_empty())
                    .or_else(|| {
                        users
                            .iter()
                            .find(|u| u.user_id == bill.patient)
                            .map(|u| u.username.clone())
                    })
                    .unwrap_or_default();
                let date = appointments
                    .iter()
                    .find(|a| !bill.appointment_id.is_empty() && a.apt_id == bill.appointment_id)
                    .map(|a| a.date.clone())
                    .unwrap_or_default();
                IncomeLine {
                    bill_id: bill.bill_id,
                    patient_id: bill.patient,
                    patient_name,
                    amount: bill.amount,
                    date,
                }
            })
            .collect())
    }

    /// Every account with a staff role.
    pub fn staff_summary(&self) -> ClinicResult<Vec<User>> {
        Ok(self
            .cfg
            .store()?
            .load::<User>()
            .into_iter()
            .filter(|u| u.role.is_staff())
            .collect())
    }

    /// All medicines plus those below the configured summary limit.
    pub fn medicine_summary(&self) -> ClinicResult<MedicineSummary> {
        let limit = self.cfg.summary_low_stock_limit();
        let medicines: Vec<Medicine> = self.cfg.store()?.load();
        let low_stock = medicines
            .iter()
            .filter(|m| m.stock < limit)
            .cloned()
            .collect();
        Ok(MedicineSummary {
            medicines,
            low_stock,
            limit,
        })
    }
}
