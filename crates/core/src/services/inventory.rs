//! Pharmacist inventory and dispensing.

use crate::error::{not_found, EntityKind};
use crate::lifecycle::{self, LifecycleAction};
use crate::models::{round_currency, Appointment, Medicine};
use crate::{ClinicError, ClinicResult, CoreConfig};
use clinic_store::{Entity, RecordStore};
use clinic_types::NonEmptyText;
use std::sync::Arc;

/// One prescribed medicine and its inventory entry, if the inventory has it.
#[derive(Debug, Clone, PartialEq)]
pub struct PrescribedMedicine {
    pub med_id: String,
    pub medicine: Option<Medicine>,
}

/// Stock movement of one medicine during a dispense.
#[derive(Debug, Clone, PartialEq)]
pub struct StockChange {
    pub med_id: String,
    pub name: String,
    pub previous: u32,
    pub remaining: u32,
    /// The medicine was already out of stock; the count stayed at zero.
    pub shortfall: bool,
}

/// Outcome of dispensing a paid appointment.
#[derive(Debug, Clone, PartialEq)]
pub struct DispenseReport {
    pub appointment: Appointment,
    pub changes: Vec<StockChange>,
    /// Prescribed IDs with no inventory entry.
    pub missing: Vec<String>,
}

fn same_id(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Inventory and dispensing operations.
#[derive(Clone)]
pub struct InventoryService {
    cfg: Arc<CoreConfig>,
}

impl InventoryService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    pub fn list(&self) -> ClinicResult<Vec<Medicine>> {
        Ok(self.cfg.store()?.load())
    }

    fn find(store: &RecordStore, med_id: &str) -> ClinicResult<Medicine> {
        store
            .load::<Medicine>()
            .into_iter()
            .find(|m| same_id(&m.med_id, med_id))
            .ok_or_else(|| not_found(EntityKind::Medicine, med_id.trim()))
    }

    pub fn get(&self, med_id: &str) -> ClinicResult<Medicine> {
        Self::find(&self.cfg.store()?, med_id)
    }

    /// Adds a medicine with the next free `M` identifier. The price is rounded to cents.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::Text` for a blank name or `Validation` for a negative price.
    pub fn add(&self, name: &str, stock: u32, price: f64) -> ClinicResult<Medicine> {
        let name = NonEmptyText::new(name)?;
        let price = Self::checked_price(price)?;

        let medicine = self.cfg.store()?.insert(Medicine {
            name: name.into_inner(),
            stock,
            price,
            ..Default::default()
        })?;
        tracing::info!("medicine {} added", medicine.med_id);
        Ok(medicine)
    }

    fn checked_price(price: f64) -> ClinicResult<f64> {
        if !price.is_finite() || price < 0.0 {
            return Err(ClinicError::Validation("price cannot be negative".into()));
        }
        Ok(round_currency(price))
    }

    pub fn update_stock(&self, med_id: &str, stock: u32) -> ClinicResult<Medicine> {
        let store = self.cfg.store()?;
        let mut medicine = Self::find(&store, med_id)?;
        medicine.stock = stock;
        store.save(&medicine)?;
        tracing::info!("medicine {} stock set to {}", medicine.med_id, stock);
        Ok(medicine)
    }

    pub fn update_price(&self, med_id: &str, price: f64) -> ClinicResult<Medicine> {
        let price = Self::checked_price(price)?;
        let store = self.cfg.store()?;
        let mut medicine = Self::find(&store, med_id)?;
        medicine.price = price;
        store.save(&medicine)?;
        tracing::info!("medicine {} price set to {:.2}", medicine.med_id, price);
        Ok(medicine)
    }

    /// Removes a medicine and returns what was removed.
    pub fn remove(&self, med_id: &str) -> ClinicResult<Medicine> {
        let store = self.cfg.store()?;
        let medicine = Self::find(&store, med_id)?;
        store.delete(Medicine::COLLECTION, &medicine.med_id)?;
        tracing::info!("medicine {} removed", medicine.med_id);
        Ok(medicine)
    }

    /// Medicines at or below the configured alert limit.
    pub fn low_stock(&self) -> ClinicResult<Vec<Medicine>> {
        let limit = self.cfg.low_stock_limit();
        Ok(self
            .list()?
            .into_iter()
            .filter(|m| m.stock <= limit)
            .collect())
    }

    fn appointment(store: &RecordStore, apt_id: &str) -> ClinicResult<Appointment> {
        store
            .load::<Appointment>()
            .into_iter()
            .find(|a| same_id(&a.apt_id, apt_id))
            .ok_or_else(|| not_found(EntityKind::Appointment, apt_id.trim()))
    }

    /// The medicines prescribed on an appointment, matched against the inventory.
    pub fn medication_list(&self, apt_id: &str) -> ClinicResult<Vec<PrescribedMedicine>> {
        let store = self.cfg.store()?;
        let appointment = Self::appointment(&store, apt_id)?;
        let medicines: Vec<Medicine> = store.load();

        Ok(appointment
            .prescribed_ids()
            .into_iter()
            .map(|med_id| PrescribedMedicine {
                medicine: medicines.iter().find(|m| same_id(&m.med_id, &med_id)).cloned(),
                med_id,
            })
            .collect())
    }

    /// Dispenses a paid appointment and marks it completed.
    ///
    /// Each distinct prescribed medicine loses one unit of stock. Stock never drops below
    /// zero; a medicine already at zero is reported as a shortfall. Prescribed IDs missing
    /// from the inventory are reported and skipped.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::InvalidTransition` before touching any stock if the
    /// appointment is not `paid`.
    pub fn dispense(&self, apt_id: &str) -> ClinicResult<DispenseReport> {
        let store = self.cfg.store()?;
        let mut appointment = Self::appointment(&store, apt_id)?;
        lifecycle::ensure_allowed(&appointment, LifecycleAction::Dispense)?;

        let medicines: Vec<Medicine> = store.load();
        let mut changes = Vec::new();
        let mut missing = Vec::new();

        for med_id in appointment.prescribed_ids() {
            let Some(medicine) = medicines.iter().find(|m| same_id(&m.med_id, &med_id)) else {
                tracing::warn!("medicine {} prescribed on {} is not in inventory", med_id, appointment.apt_id);
                missing.push(med_id);
                continue;
            };

            let mut updated = medicine.clone();
            let shortfall = medicine.stock == 0;
            if shortfall {
                tracing::warn!("stock for {} is insufficient, keeping it at 0", medicine.name);
            }
            updated.stock = medicine.stock.saturating_sub(1);
            store.save(&updated)?;

            changes.push(StockChange {
                med_id: updated.med_id.clone(),
                name: updated.name.clone(),
                previous: medicine.stock,
                remaining: updated.stock,
                shortfall,
            });
        }

        lifecycle::apply(&mut appointment, LifecycleAction::Dispense)?;
        store.save(&appointment)?;
        tracing::info!("appointment {} dispensed and completed", appointment.apt_id);

        Ok(DispenseReport {
            appointment,
            changes,
            missing,
        })
    }
}
