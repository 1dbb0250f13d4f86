//! Typed clinic entities.
//!
//! Each struct mirrors one flat record shape. Field names on disk keep the established
//! camel-case keys (`patientID`, `aptID`, ...). Absent fields decode as empty values and
//! numeric fields accept numbers or numeric strings, so hand-edited files still load.

use clinic_store::{lenient, Collection, Entity};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// ROLES
// ============================================================================

/// Role of a user account.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Doctor,
    Receptionist,
    Pharmacist,
    AccountsPersonnel,
    Administrator,
    Patient,
    /// A role string not known to this version, kept verbatim.
    Unknown(String),
}

impl Role {
    /// Maps a role name or short code (case-insensitive) to a role.
    ///
    /// Accepted codes: `d`, `r`, `ph`, `a`/`acc`/`accounts`/`accountant`/`account`,
    /// `ad`/`admin`, `p`, plus every full role name.
    pub fn from_alias(input: &str) -> Option<Role> {
        let role = match input.trim().to_lowercase().as_str() {
            "d" | "doctor" => Role::Doctor,
            "r" | "receptionist" => Role::Receptionist,
            "ph" | "pharmacist" => Role::Pharmacist,
            "a" | "acc" | "accounts" | "accountant" | "account" | "accounts personnel" => {
                Role::AccountsPersonnel
            }
            "ad" | "admin" | "administrator" => Role::Administrator,
            "p" | "patient" => Role::Patient,
            _ => return None,
        };
        Some(role)
    }

    /// Stored (lower-case) form of the role.
    pub fn as_str(&self) -> &str {
        match self {
            Role::Doctor => "doctor",
            Role::Receptionist => "receptionist",
            Role::Pharmacist => "pharmacist",
            Role::AccountsPersonnel => "accounts personnel",
            Role::Administrator => "administrator",
            Role::Patient => "patient",
            Role::Unknown(raw) => raw,
        }
    }

    /// True for every clinic staff role.
    pub fn is_staff(&self) -> bool {
        !matches!(self, Role::Patient | Role::Unknown(_))
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Unknown(String::new())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = lenient::string(deserializer)?;
        Ok(Role::from_alias(&raw).unwrap_or(Role::Unknown(raw)))
    }
}

// ============================================================================
// APPOINTMENT STATUS
// ============================================================================

/// Lifecycle status of an appointment.
///
/// Parsing is case-insensitive; `canceled` is accepted for `cancelled` and the legacy
/// `pending` status reads as `booked`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AppointmentStatus {
    #[default]
    Booked,
    Consulted,
    Paid,
    Completed,
    Cancelled,
    Other(String),
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AppointmentStatus::Booked => "booked",
            AppointmentStatus::Consulted => "consulted",
            AppointmentStatus::Paid => "paid",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Other(raw) => raw,
        }
    }

    /// Cancelled appointments never block scheduling.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppointmentStatus::Cancelled)
    }
}

impl FromStr for AppointmentStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "booked" | "pending" => AppointmentStatus::Booked,
            "consulted" => AppointmentStatus::Consulted,
            "paid" => AppointmentStatus::Paid,
            "completed" => AppointmentStatus::Completed,
            "cancelled" | "canceled" => AppointmentStatus::Cancelled,
            _ => AppointmentStatus::Other(s.trim().to_string()),
        })
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AppointmentStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AppointmentStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = lenient::string(deserializer)?;
        Ok(raw.parse().unwrap_or_default())
    }
}

/// Payment status of a bill. Anything other than `paid` (ignoring case) reads as unpaid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    #[default]
    Unpaid,
    Paid,
}

impl<'de> Deserialize<'de> for BillStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = lenient::string(deserializer)?;
        if raw.trim().eq_ignore_ascii_case("paid") {
            Ok(BillStatus::Paid)
        } else {
            Ok(BillStatus::Unpaid)
        }
    }
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BillStatus::Unpaid => f.write_str("unpaid"),
            BillStatus::Paid => f.write_str("paid"),
        }
    }
}

// ============================================================================
// ENTITIES
// ============================================================================

/// A clinic user account. Passwords are stored in plain text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct User {
    #[serde(rename = "userID", default, deserialize_with = "lenient::string")]
    pub user_id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub username: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub password: String,
    #[serde(default, deserialize_with = "lenient::count")]
    pub age: u32,
    #[serde(default)]
    pub role: Role,
    #[serde(default, deserialize_with = "lenient::string")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub phone: String,
    /// Optional login alias.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Identifier written by older versions for doctor accounts.
    #[serde(
        rename = "doctorID",
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "String::is_empty"
    )]
    pub legacy_doctor_id: String,
}

impl User {
    /// Identifier used on appointments when this user acts as a doctor.
    pub fn doctor_id(&self) -> &str {
        if self.user_id.is_empty() {
            &self.legacy_doctor_id
        } else {
            &self.user_id
        }
    }
}

impl Entity for User {
    const COLLECTION: Collection = Collection::Users;

    fn id(&self) -> &str {
        &self.user_id
    }
}

/// A registered patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Patient {
    #[serde(rename = "patientID", default, deserialize_with = "lenient::string")]
    pub patient_id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub dob: String,
    #[serde(default, deserialize_with = "lenient::count")]
    pub age: u32,
    #[serde(default, deserialize_with = "lenient::string")]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub status: String,
}

impl Entity for Patient {
    const COLLECTION: Collection = Collection::Patients;

    fn id(&self) -> &str {
        &self.patient_id
    }
}

/// One appointment between a patient and a doctor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Appointment {
    #[serde(rename = "aptID", default, deserialize_with = "lenient::string")]
    pub apt_id: String,
    #[serde(rename = "patientID", default, deserialize_with = "lenient::string")]
    pub patient_id: String,
    #[serde(rename = "doctorID", default, deserialize_with = "lenient::string")]
    pub doctor_id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub time: String,
    #[serde(default)]
    pub status: AppointmentStatus,
    /// Comma-joined medicine IDs, set at consultation.
    #[serde(
        default,
        deserialize_with = "lenient::joined",
        skip_serializing_if = "Option::is_none"
    )]
    pub medicine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Appointment {
    /// Every prescribed medicine ID, trimmed and upper-cased, repeats included.
    pub fn billed_ids(&self) -> Vec<String> {
        self.medicine
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|m| m.trim().to_uppercase())
            .filter(|m| !m.is_empty())
            .collect()
    }

    /// Distinct prescribed medicine IDs, trimmed and upper-cased, in prescription order.
    pub fn prescribed_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for id in self.billed_ids() {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}

impl Entity for Appointment {
    const COLLECTION: Collection = Collection::Appointments;

    fn id(&self) -> &str {
        &self.apt_id
    }
}

/// A stocked medicine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Medicine {
    #[serde(rename = "medID", default, deserialize_with = "lenient::string")]
    pub med_id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::count")]
    pub stock: u32,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub price: f64,
}

impl Entity for Medicine {
    const COLLECTION: Collection = Collection::Medicines;

    fn id(&self) -> &str {
        &self.med_id
    }
}

/// A bill recorded in the income collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Bill {
    #[serde(
        rename = "billID",
        alias = "inID",
        default,
        deserialize_with = "lenient::string"
    )]
    pub bill_id: String,
    /// Patient ID the bill is charged to.
    #[serde(alias = "userID", default, deserialize_with = "lenient::string")]
    pub patient: String,
    #[serde(
        rename = "appointmentID",
        alias = "aptID",
        default,
        deserialize_with = "lenient::string"
    )]
    pub appointment_id: String,
    #[serde(rename = "consultationFee", default, deserialize_with = "lenient::amount")]
    pub consultation_fee: f64,
    #[serde(rename = "medicineFee", default, deserialize_with = "lenient::amount")]
    pub medicine_fee: f64,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub amount: f64,
    #[serde(default)]
    pub status: BillStatus,
}

impl Entity for Bill {
    const COLLECTION: Collection = Collection::Income;

    fn id(&self) -> &str {
        &self.bill_id
    }
}

/// Rounds a currency amount to two decimal places.
pub fn round_currency(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_aliases_map_to_stored_names() {
        assert_eq!(Role::from_alias("PH"), Some(Role::Pharmacist));
        assert_eq!(Role::from_alias("acc"), Some(Role::AccountsPersonnel));
        assert_eq!(Role::from_alias("Admin"), Some(Role::Administrator));
        assert_eq!(Role::from_alias("janitor"), None);
        assert_eq!(Role::AccountsPersonnel.as_str(), "accounts personnel");
    }

    #[test]
    fn test_unknown_role_survives_round_trip() {
        let user: User = serde_json::from_str(r#"{"userID": "U1", "role": "Janitor"}"#).unwrap();
        assert_eq!(user.role, Role::Unknown("Janitor".into()));
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["role"], "Janitor");
    }

    #[test]
    fn test_status_parsing_accepts_legacy_spellings() {
        assert_eq!("Cancelled".parse(), Ok(AppointmentStatus::Cancelled));
        assert_eq!("canceled".parse(), Ok(AppointmentStatus::Cancelled));
        assert_eq!("Pending".parse(), Ok(AppointmentStatus::Booked));
        assert_eq!(
            "on hold".parse(),
            Ok(AppointmentStatus::Other("on hold".into()))
        );
    }

    #[test]
    fn test_user_decodes_string_age_and_missing_fields() {
        let user: User = serde_json::from_str(r#"{"userID": "U3", "age": "41"}"#).unwrap();
        assert_eq!(user.age, 41);
        assert_eq!(user.username, "");
        assert_eq!(user.email, None);
    }

    #[test]
    fn test_doctor_id_falls_back_to_legacy_field() {
        let user: User =
            serde_json::from_str(r#"{"doctorID": "D1", "username": "house", "role": "doctor"}"#)
                .unwrap();
        assert_eq!(user.doctor_id(), "D1");
    }

    #[test]
    fn test_prescribed_ids_are_normalised_and_distinct() {
        let apt = Appointment {
            medicine: Some(" m1, M2 ,m1,, ".into()),
            ..Default::default()
        };
        assert_eq!(apt.prescribed_ids(), vec!["M1", "M2"]);
        assert_eq!(apt.billed_ids(), vec!["M1", "M2", "M1"]);
        assert!(Appointment::default().prescribed_ids().is_empty());
    }

    #[test]
    fn test_appointment_omits_absent_optional_fields() {
        let apt = Appointment {
            apt_id: "A1".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&apt).unwrap();
        assert!(json.get("medicine").is_none());
        assert!(json.get("note").is_none());
        assert_eq!(json["status"], "booked");
    }

    #[test]
    fn test_bill_reads_legacy_income_keys() {
        let bill: Bill = serde_json::from_str(
            r#"{"inID": "B2", "userID": "P4", "amount": "60.5", "status": "Paid"}"#,
        )
        .unwrap();
        assert_eq!(bill.bill_id, "B2");
        assert_eq!(bill.patient, "P4");
        assert_eq!(bill.amount, 60.5);
        assert_eq!(bill.status, BillStatus::Paid);
    }

    #[test]
    fn test_round_currency() {
        assert_eq!(round_currency(10.005_1), 10.01);
        assert_eq!(round_currency(59.999), 60.0);
    }
}
