//! User administration and the doctor directory.

use super::closest;
use crate::constants::ACTIVE_STATUS;
use crate::error::{not_found, EntityKind};
use crate::models::{Role, User};
use crate::{validation, ClinicError, ClinicResult, CoreConfig};
use clinic_store::{Collection, Entity, MatchMode, Record, RecordStore};
use serde_json::Value;
use std::sync::Arc;

const SUGGESTION_LIMIT: usize = 3;
const SUGGESTION_CUTOFF: f64 = 0.4;

/// A user with the doctor role, as shown when picking a doctor.
#[derive(Debug, Clone, PartialEq)]
pub struct Doctor {
    pub doctor_id: String,
    pub name: String,
    pub phone: String,
}

/// Every doctor in `store`, sorted by identifier.
///
/// Accounts without an identifier or a username are skipped.
pub(crate) fn list_doctors(store: &RecordStore) -> Vec<Doctor> {
    let mut doctors: Vec<Doctor> = store
        .load::<User>()
        .into_iter()
        .filter(|u| u.role == Role::Doctor)
        .filter(|u| !u.doctor_id().is_empty() && !u.username.is_empty())
        .map(|u| Doctor {
            doctor_id: u.doctor_id().to_string(),
            name: u.username.clone(),
            phone: u.phone.clone(),
        })
        .collect();
    doctors.sort_by(|a, b| a.doctor_id.cmp(&b.doctor_id));
    doctors
}

/// The doctor with identifier `doctor_id`, if one exists.
pub(crate) fn find_doctor(store: &RecordStore, doctor_id: &str) -> Option<Doctor> {
    let doctor_id = doctor_id.trim();
    list_doctors(store)
        .into_iter()
        .find(|d| d.doctor_id == doctor_id)
}

/// Fields of a user account being created.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub age: u32,
    pub role: Role,
    pub phone: String,
}

/// Changes to an existing account. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub password: Option<String>,
    pub age: Option<u32>,
    pub phone: Option<String>,
    pub role: Option<Role>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.password.is_none()
            && self.age.is_none()
            && self.phone.is_none()
            && self.role.is_none()
    }
}

/// Manages user accounts.
#[derive(Clone)]
pub struct UserService {
    cfg: Arc<CoreConfig>,
}

impl UserService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    pub fn list(&self) -> ClinicResult<Vec<User>> {
        Ok(self.cfg.store()?.load())
    }

    /// Every doctor, sorted by identifier.
    pub fn doctors(&self) -> ClinicResult<Vec<Doctor>> {
        Ok(list_doctors(&self.cfg.store()?))
    }

    /// Looks up a doctor by identifier.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::NotFound` if no user with role `doctor` has that identifier.
    pub fn doctor(&self, doctor_id: &str) -> ClinicResult<Doctor> {
        find_doctor(&self.cfg.store()?, doctor_id)
            .ok_or_else(|| not_found(EntityKind::Doctor, doctor_id.trim()))
    }

    /// Finds the first user whose username or identifier equals `key`, ignoring case.
    pub fn find(&self, key: &str) -> ClinicResult<Option<User>> {
        let key = key.trim();
        let store = self.cfg.store()?;
        let found = store.find(
            Collection::Users,
            MatchMode::Or,
            &[("username", key), ("userID", key)],
        );
        match found.into_iter().next() {
            Some(record) => Ok(Some(User::from_record(record)?)),
            None => Ok(None),
        }
    }

    /// Usernames closest to `key`, for "did you mean" hints.
    pub fn suggestions(&self, key: &str) -> ClinicResult<Vec<User>> {
        let users = self.list()?;
        Ok(
            closest(key, &users, |u| u.username.as_str(), SUGGESTION_LIMIT, SUGGESTION_CUTOFF)
                .into_iter()
                .cloned()
                .collect(),
        )
    }

    fn username_taken(store: &RecordStore, username: &str, except_id: Option<&str>) -> bool {
        store
            .find(Collection::Users, MatchMode::And, &[("username", username)])
            .iter()
            .any(|r| except_id != Some(clinic_store::field_text(r, "userID").as_str()))
    }

    /// Creates an active user account.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::Validation` if a field breaks the account rules or the
    /// username is already taken (ignoring case).
    pub fn add(&self, new_user: NewUser) -> ClinicResult<User> {
        let username = validation::username(&new_user.username)?;
        let password = validation::password(&new_user.password)?;
        let age = validation::user_age(&new_user.age.to_string())?;
        let phone = validation::staff_phone(&new_user.phone)?;

        let store = self.cfg.store()?;
        if Self::username_taken(&store, &username, None) {
            return Err(ClinicError::Validation(format!(
                "username '{}' already exists",
                username
            )));
        }

        let user = store.insert(User {
            username,
            password,
            age,
            role: new_user.role,
            status: ACTIVE_STATUS.to_string(),
            phone,
            ..Default::default()
        })?;

        tracing::info!("user {} created with role {}", user.user_id, user.role);
        Ok(user)
    }

    /// Applies `changes` to the user found by username or identifier.
    ///
    /// Only the changed fields are written; any other fields on the stored record stay.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::NotFound` if no user matches `key`, or
    /// `ClinicError::Validation` if a new value breaks the account rules.
    pub fn update(&self, key: &str, changes: UserUpdate) -> ClinicResult<User> {
        let user = self
            .find(key)?
            .ok_or_else(|| not_found(EntityKind::User, key.trim()))?;
        let store = self.cfg.store()?;

        let mut patch = Record::new();
        if let Some(username) = &changes.username {
            let username = validation::username(username)?;
            if Self::username_taken(&store, &username, Some(&user.user_id)) {
                return Err(ClinicError::Validation(format!(
                    "username '{}' already exists",
                    username
                )));
            }
            patch.insert("username".into(), Value::from(username));
        }
        if let Some(password) = &changes.password {
            patch.insert("password".into(), Value::from(validation::password(password)?));
        }
        if let Some(age) = changes.age {
            patch.insert("age".into(), Value::from(validation::user_age(&age.to_string())?));
        }
        if let Some(phone) = &changes.phone {
            patch.insert("phone".into(), Value::from(validation::staff_phone(phone)?));
        }
        if let Some(role) = &changes.role {
            patch.insert("role".into(), Value::from(role.as_str()));
        }

        if !patch.is_empty() {
            store.update(Collection::Users, &user.user_id, patch)?;
        }

        store
            .get::<User>(&user.user_id)
            .ok_or_else(|| not_found(EntityKind::User, user.user_id.clone()))
    }

    /// Removes the user found by username or identifier and returns it.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::NotFound` if no user matches `key`.
    pub fn remove(&self, key: &str) -> ClinicResult<User> {
        let user = self
            .find(key)?
            .ok_or_else(|| not_found(EntityKind::User, key.trim()))?;
        self.cfg.store()?.delete(Collection::Users, &user.user_id)?;
        tracing::info!("user {} removed", user.user_id);
        Ok(user)
    }
}
