//! Patient registration, updates and name search.

use super::closest;
use crate::constants::ACTIVE_STATUS;
use crate::error::{not_found, EntityKind};
use crate::models::Patient;
use crate::{validation, ClinicError, ClinicResult, CoreConfig};
use chrono::NaiveDate;
use std::sync::Arc;

const SEARCH_LIMIT: usize = 5;
const FUZZY_CUTOFF: f64 = 0.35;

/// Result of a name search, from the most to the least precise tier that matched.
#[derive(Debug, Clone, PartialEq)]
pub enum PatientSearch {
    /// Exactly one patient carries the name.
    Exact(Patient),
    /// Names containing the query, sorted by patient ID.
    Partial(Vec<Patient>),
    /// Similar names, best first.
    Fuzzy(Vec<Patient>),
    NoMatch,
}

impl PatientSearch {
    /// Every patient the search produced.
    pub fn patients(&self) -> Vec<&Patient> {
        match self {
            PatientSearch::Exact(patient) => vec![patient],
            PatientSearch::Partial(patients) | PatientSearch::Fuzzy(patients) => {
                patients.iter().collect()
            }
            PatientSearch::NoMatch => Vec::new(),
        }
    }
}

/// Receptionist patient operations.
#[derive(Clone)]
pub struct PatientService {
    cfg: Arc<CoreConfig>,
}

impl PatientService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    pub fn list(&self) -> ClinicResult<Vec<Patient>> {
        Ok(self.cfg.store()?.load())
    }

    pub fn get(&self, patient_id: &str) -> ClinicResult<Patient> {
        self.cfg
            .store()?
            .get(patient_id.trim())
            .ok_or_else(|| not_found(EntityKind::Patient, patient_id.trim()))
    }

    /// Registers a new active patient.
    ///
    /// `dob` may use any accepted date layout; it is stored as `YYYY-MM-DD` and the age is
    /// computed from it as of `today`.
    ///
    /// # Errors
    ///
    /// - `ClinicError::Text`/`Validation` for a malformed name, date or phone,
    /// - `ClinicError::DuplicatePatient` if a patient with the same name (ignoring case)
    ///   and date of birth exists.
    pub fn register(
        &self,
        name: &str,
        dob: &str,
        phone: &str,
        today: NaiveDate,
    ) -> ClinicResult<Patient> {
        let name = validation::patient_name(name)?;
        let dob = validation::birth_date(dob, today)?;
        let phone = validation::patient_phone(phone)?;
        let dob_text = validation::format_date(dob);

        let store = self.cfg.store()?;
        if let Some(existing) = store
            .load::<Patient>()
            .into_iter()
            .find(|p| p.name.trim().eq_ignore_ascii_case(&name) && p.dob == dob_text)
        {
            return Err(ClinicError::DuplicatePatient {
                existing: Box::new(existing),
            });
        }

        let patient = store.insert(Patient {
            name,
            dob: dob_text,
            age: validation::age_on(dob, today),
            phone,
            status: ACTIVE_STATUS.to_string(),
            ..Default::default()
        })?;

        tracing::info!("patient {} registered", patient.patient_id);
        Ok(patient)
    }

    /// Replaces a patient's name, date of birth and phone, recomputing the age.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::NotFound` for an unknown patient or a validation error for
    /// malformed input; nothing is written in either case.
    pub fn update_info(
        &self,
        patient_id: &str,
        name: &str,
        dob: &str,
        phone: &str,
        today: NaiveDate,
    ) -> ClinicResult<Patient> {
        let mut patient = self.get(patient_id)?;
        let dob = validation::birth_date(dob, today)?;

        patient.name = validation::patient_name(name)?;
        patient.phone = validation::patient_phone(phone)?;
        patient.dob = validation::format_date(dob);
        patient.age = validation::age_on(dob, today);

        self.cfg.store()?.save(&patient)?;
        tracing::info!("patient {} updated", patient.patient_id);
        Ok(patient)
    }

    /// Searches patients by name.
    ///
    /// A single case-insensitive exact match wins. Otherwise names containing the query
    /// are returned sorted by ID, and failing that the closest names. Each tier returns
    /// at most five patients.
    pub fn search_by_name(&self, query: &str) -> ClinicResult<PatientSearch> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Ok(PatientSearch::NoMatch);
        }
        let patients = self.list()?;

        let mut exact = patients
            .iter()
            .filter(|p| p.name.trim().to_lowercase() == query);
        if let (Some(only), None) = (exact.next(), exact.next()) {
            return Ok(PatientSearch::Exact(only.clone()));
        }

        let mut partial: Vec<Patient> = patients
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&query))
            .cloned()
            .collect();
        if !partial.is_empty() {
            partial.sort_by(|a, b| a.patient_id.cmp(&b.patient_id));
            partial.truncate(SEARCH_LIMIT);
            return Ok(PatientSearch::Partial(partial));
        }

        let fuzzy: Vec<Patient> =
            closest(&query, &patients, |p| p.name.as_str(), SEARCH_LIMIT, FUZZY_CUTOFF)
                .into_iter()
                .cloned()
                .collect();
        if fuzzy.is_empty() {
            Ok(PatientSearch::NoMatch)
        } else {
            Ok(PatientSearch::Fuzzy(fuzzy))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{setup, today};

    #[test]
    fn test_register_normalises_dob_and_computes_age() {
        let (_temp_dir, cfg) = setup();
        let service = PatientService::new(cfg);

        let patient = service
            .register("Jane Doe", "01/01/1990", "012 345 6789", today())
            .unwrap();

        assert_eq!(patient.patient_id, "P1");
        assert_eq!(patient.dob, "1990-01-01");
        assert_eq!(patient.age, 40);
        assert_eq!(patient.status, "active");
    }

    #[test]
    fn test_register_rejects_duplicate_name_and_dob() {
        let (_temp_dir, cfg) = setup();
        let service = PatientService::new(cfg);
        service
            .register("Jane Doe", "1990-01-01", "0123456789", today())
            .unwrap();

        match service.register("jane doe", "1 Jan 1990", "0199999999", today()) {
            Err(ClinicError::DuplicatePatient { existing }) => {
                assert_eq!(existing.patient_id, "P1")
            }
            other => panic!("expected duplicate, got {:?}", other),
        }

        assert!(service
            .register("Jane Doe", "1991-01-01", "0123456789", today())
            .is_ok());
    }

    #[test]
    fn test_register_validates_input() {
        let (_temp_dir, cfg) = setup();
        let service = PatientService::new(cfg);

        assert!(matches!(
            service.register("J@ne", "1990-01-01", "0123456789", today()),
            Err(ClinicError::Text(_))
        ));
        assert!(matches!(
            service.register("Jane", "2031-01-01", "0123456789", today()),
            Err(ClinicError::Validation(_))
        ));
        assert!(service.list().unwrap().is_empty());
    }

    #[test]
    fn test_update_info_recomputes_age() {
        let (_temp_dir, cfg) = setup();
        let service = PatientService::new(cfg);
        service
            .register("Jane Doe", "1990-01-01", "0123456789", today())
            .unwrap();

        let updated = service
            .update_info("P1", "Jane Smith", "2000-06-30", "0111111111", today())
            .unwrap();
        assert_eq!(updated.age, 29);
        assert_eq!(service.get("P1").unwrap(), updated);
        assert!(service
            .update_info("P9", "Jane", "2000-06-30", "0111111111", today())
            .is_err());
    }

    #[test]
    fn test_search_tiers() {
        let (_temp_dir, cfg) = setup();
        let service = PatientService::new(cfg);
        for name in ["Jane Doe", "John Doe", "Janet Lee"] {
            service
                .register(name, "1990-01-01", "0123456789", today())
                .unwrap();
        }

        assert!(matches!(
            service.search_by_name("jane doe").unwrap(),
            PatientSearch::Exact(p) if p.patient_id == "P1"
        ));

        match service.search_by_name("doe").unwrap() {
            PatientSearch::Partial(found) => {
                let ids: Vec<&str> = found.iter().map(|p| p.patient_id.as_str()).collect();
                assert_eq!(ids, vec!["P1", "P2"]);
            }
            other => panic!("expected partial matches, got {:?}", other),
        }

        match service.search_by_name("Janette Lee").unwrap() {
            PatientSearch::Fuzzy(found) => assert_eq!(found[0].patient_id, "P3"),
            other => panic!("expected fuzzy matches, got {:?}", other),
        }

        assert_eq!(
            service.search_by_name("zzzzzzzzzzzz").unwrap(),
            PatientSearch::NoMatch
        );
    }
}
