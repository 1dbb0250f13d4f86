//! Console login.
//!
//! A successful login yields a [`Session`] that the console passes to the menu of the
//! user's role. There is no process-wide current user.

use crate::constants::MAX_LOGIN_ATTEMPTS;
use crate::models::{Role, User};
use crate::{ClinicError, ClinicResult, CoreConfig};
use std::sync::Arc;

/// The authenticated operator.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    user_id: String,
    /// ID appointments carry for this user as a doctor; legacy accounts only have this.
    doctor_id: String,
    username: String,
    role: Role,
}

impl Session {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn doctor_id(&self) -> &str {
        &self.doctor_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> &Role {
        &self.role
    }
}

/// Outcome of one login attempt made through a [`LoginGate`].
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Granted(Session),
    /// Wrong credentials; the operator may try again.
    Retry { attempts_left: usize },
    /// Wrong credentials and no attempts remain.
    LockedOut,
}

/// Checks credentials against the user collection.
#[derive(Clone)]
pub struct AuthService {
    cfg: Arc<CoreConfig>,
}

impl AuthService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Authenticates one attempt.
    ///
    /// `identifier` matches a username or email ignoring case; the password must match
    /// exactly.
    ///
    /// # Errors
    ///
    /// - `ClinicError::Authentication` for unknown users or a wrong password,
    /// - `ClinicError::AccessDenied` if the account's role has no console menu.
    pub fn authenticate(&self, identifier: &str, password: &str) -> ClinicResult<Session> {
        let identifier = identifier.trim().to_lowercase();
        let user = self
            .cfg
            .store()?
            .load::<User>()
            .into_iter()
            .find(|u| {
                u.username.to_lowercase() == identifier
                    || u.email
                        .as_deref()
                        .is_some_and(|email| email.to_lowercase() == identifier)
            })
            .filter(|u| u.password == password)
            .ok_or(ClinicError::Authentication)?;

        if !user.role.is_staff() {
            tracing::warn!("user {} with role '{}' refused console access", user.user_id, user.role);
            return Err(ClinicError::AccessDenied(user.role.to_string()));
        }

        tracing::info!("user {} logged in as {}", user.username, user.role);
        Ok(Session {
            doctor_id: user.doctor_id().to_string(),
            user_id: user.user_id,
            username: user.username,
            role: user.role,
        })
    }
}

/// Limits a login to a fixed number of attempts.
pub struct LoginGate {
    auth: AuthService,
    attempts_left: usize,
}

impl LoginGate {
    pub fn new(auth: AuthService) -> Self {
        Self {
            auth,
            attempts_left: MAX_LOGIN_ATTEMPTS,
        }
    }

    pub fn attempts_left(&self) -> usize {
        self.attempts_left
    }

    /// Makes one attempt.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::AccessDenied` for accounts without console access, or a store
    /// error. Wrong credentials are reported through [`LoginOutcome`] instead.
    pub fn attempt(&mut self, identifier: &str, password: &str) -> ClinicResult<LoginOutcome> {
        if self.attempts_left == 0 {
            return Ok(LoginOutcome::LockedOut);
        }
        match self.auth.authenticate(identifier, password) {
            Ok(session) => Ok(LoginOutcome::Granted(session)),
            Err(ClinicError::Authentication) => {
                self.attempts_left -= 1;
                if self.attempts_left == 0 {
                    Ok(LoginOutcome::LockedOut)
                } else {
                    Ok(LoginOutcome::Retry {
                        attempts_left: self.attempts_left,
                    })
                }
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{seed_user, setup, store};
    use clinic_store::Collection;
    use serde_json::json;

    #[test]
    fn test_authenticate_matches_username_ignoring_case() {
        let (_temp_dir, cfg) = setup();
        seed_user(&cfg, "Alice", Role::Pharmacist);
        let auth = AuthService::new(cfg);

        let session = auth.authenticate(" alice ", "pw123").unwrap();
        assert_eq!(session.user_id(), "U1");
        assert_eq!(session.role(), &Role::Pharmacist);
        assert!(matches!(
            auth.authenticate("alice", "PW123"),
            Err(ClinicError::Authentication)
        ));
    }

    #[test]
    fn test_authenticate_accepts_email() {
        let (_temp_dir, cfg) = setup();
        store(&cfg)
            .add(
                Collection::Users,
                json!({"username": "bob", "password": "x1y", "role": "administrator", "email": "Bob@Clinic.test"})
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .unwrap();
        let auth = AuthService::new(cfg);
        assert_eq!(auth.authenticate("bob@clinic.test", "x1y").unwrap().username(), "bob");
    }

    #[test]
    fn test_legacy_doctor_session_carries_doctor_id() {
        let (_temp_dir, cfg) = setup();
        let legacy = json!({"doctorID": "D1", "username": "house", "password": "pw123", "role": "doctor"});
        store(&cfg)
            .write_all(Collection::Users, &[legacy.as_object().cloned().unwrap()])
            .unwrap();
        seed_user(&cfg, "grey", Role::Doctor);
        let auth = AuthService::new(cfg);

        let legacy_session = auth.authenticate("house", "pw123").unwrap();
        assert_eq!(legacy_session.user_id(), "");
        assert_eq!(legacy_session.doctor_id(), "D1");

        let session = auth.authenticate("grey", "pw123").unwrap();
        assert_eq!(session.doctor_id(), session.user_id());
    }

    #[test]
    fn test_patient_role_is_refused() {
        let (_temp_dir, cfg) = setup();
        seed_user(&cfg, "pat", Role::Patient);
        let auth = AuthService::new(cfg);
        assert!(matches!(
            auth.authenticate("pat", "pw123"),
            Err(ClinicError::AccessDenied(role)) if role == "patient"
        ));
    }

    #[test]
    fn test_gate_locks_out_after_three_failures() {
        let (_temp_dir, cfg) = setup();
        seed_user(&cfg, "alice", Role::Doctor);
        let mut gate = LoginGate::new(AuthService::new(cfg));

        assert_eq!(
            gate.attempt("alice", "bad").unwrap(),
            LoginOutcome::Retry { attempts_left: 2 }
        );
        assert_eq!(
            gate.attempt("nobody", "pw123").unwrap(),
            LoginOutcome::Retry { attempts_left: 1 }
        );
        assert_eq!(gate.attempt("alice", "bad").unwrap(), LoginOutcome::LockedOut);
        assert_eq!(gate.attempt("alice", "pw123").unwrap(), LoginOutcome::LockedOut);
    }

    #[test]
    fn test_gate_grants_on_later_attempt() {
        let (_temp_dir, cfg) = setup();
        seed_user(&cfg, "alice", Role::Doctor);
        let mut gate = LoginGate::new(AuthService::new(cfg));

        gate.attempt("alice", "bad").unwrap();
        assert!(matches!(
            gate.attempt("ALICE", "pw123").unwrap(),
            LoginOutcome::Granted(session) if session.username() == "alice"
        ));
    }
}
