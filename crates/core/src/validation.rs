//! Input validation utilities.
//!
//! Every operator-entered value passes through one of these functions before it reaches
//! a service. Failures are `ClinicError::Validation` carrying a message fit to show the
//! operator, who is then asked again.

use crate::constants::{DATE_FORMAT, TIME_FORMAT};
use crate::models::Role;
use crate::{ClinicError, ClinicResult};
use chrono::{Datelike, NaiveDate, NaiveTime};
use clinic_types::{PersonName, PhoneNumber};

/// Date layouts accepted from operators, tried in order.
const DATE_INPUT_FORMATS: [&str; 7] = [
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%Y-%m-%d",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d %Y",
    "%b %d %Y",
];

fn invalid(message: impl Into<String>) -> ClinicError {
    ClinicError::Validation(message.into())
}

/// Parses a date in any of the accepted layouts.
///
/// Commas are ignored and runs of whitespace collapse, so `"Jan 15, 2024"` is accepted.
///
/// # Errors
///
/// Returns `ClinicError::Validation` if no layout matches.
pub fn parse_date(input: &str) -> ClinicResult<NaiveDate> {
    let normalised = input
        .replace(',', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    DATE_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&normalised, fmt).ok())
        .ok_or_else(|| invalid(format!("invalid date format: '{}'", input.trim())))
}

/// Parses a date of birth, which may not lie after `today`.
pub fn birth_date(input: &str, today: NaiveDate) -> ClinicResult<NaiveDate> {
    let date = parse_date(input)?;
    if date > today {
        return Err(invalid("birth date cannot be in the future"));
    }
    Ok(date)
}

/// Parses an appointment date, which must lie strictly after `today`.
pub fn appointment_date(input: &str, today: NaiveDate) -> ClinicResult<NaiveDate> {
    let date = parse_date(input)?;
    if date <= today {
        return Err(invalid(
            "appointment date must be after today (no same-day booking)",
        ));
    }
    Ok(date)
}

/// Parses a 24-hour `HH:MM` time.
pub fn parse_time(input: &str) -> ClinicResult<NaiveTime> {
    NaiveTime::parse_from_str(input.trim(), TIME_FORMAT)
        .map_err(|_| invalid("invalid time format, use HH:MM (example: 14:30)"))
}

/// Stored form of a date.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Stored form of a time, always zero-padded.
pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Whole years between `dob` and `today`, never negative.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> u32 {
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    u32::try_from(age).unwrap_or(0)
}

/// Validates a patient name (letters, spaces and `.'-`).
pub fn patient_name(input: &str) -> ClinicResult<String> {
    Ok(PersonName::new(input)?.as_str().to_string())
}

/// Validates a patient phone number.
pub fn patient_phone(input: &str) -> ClinicResult<String> {
    Ok(PhoneNumber::new(input)?.as_str().to_string())
}

/// Validates a staff username: 3 to 20 characters, no whitespace.
pub fn username(input: &str) -> ClinicResult<String> {
    let name = input.trim();
    if name.chars().any(char::is_whitespace) {
        return Err(invalid("username cannot contain spaces"));
    }
    let len = name.chars().count();
    if !(3..=20).contains(&len) {
        return Err(invalid("username must be between 3 and 20 characters"));
    }
    Ok(name.to_string())
}

/// Validates a password of at least 3 characters.
pub fn password(input: &str) -> ClinicResult<String> {
    if input.chars().count() < 3 {
        return Err(invalid("password must be at least 3 characters"));
    }
    Ok(input.to_string())
}

/// Parses a user age between 1 and 120.
pub fn user_age(input: &str) -> ClinicResult<u32> {
    let age: u32 = input
        .trim()
        .parse()
        .map_err(|_| invalid("age must be a whole number"))?;
    if !(1..=120).contains(&age) {
        return Err(invalid("age must be between 1 and 120"));
    }
    Ok(age)
}

/// Validates a staff phone number: 10 or 11 digits, optionally separated by hyphens.
pub fn staff_phone(input: &str) -> ClinicResult<String> {
    let phone = input.trim();
    if phone.is_empty() || !phone.chars().all(|c| c.is_ascii_digit() || c == '-') {
        return Err(invalid("phone number may only contain digits and hyphens"));
    }
    let digits = PhoneNumber::new(phone)?.digit_count();
    if !(10..=11).contains(&digits) {
        return Err(invalid("phone number must have 10 or 11 digits"));
    }
    Ok(phone.to_string())
}

/// Maps a role code or name to a role.
pub fn role(input: &str) -> ClinicResult<Role> {
    Role::from_alias(input).ok_or_else(|| invalid(format!("invalid role: '{}'", input.trim())))
}

/// Parses a comma-separated prescription into upper-cased `M<digits>` identifiers.
///
/// # Errors
///
/// Returns `ClinicError::Validation` naming every malformed entry.
pub fn medicine_ids(input: &str) -> ClinicResult<Vec<String>> {
    let ids: Vec<String> = input
        .split(',')
        .map(|m| m.trim().to_uppercase())
        .filter(|m| !m.is_empty())
        .collect();
    if ids.is_empty() {
        return Err(invalid("at least one medicine ID is required"));
    }

    let malformed: Vec<&str> = ids
        .iter()
        .filter(|id| !is_medicine_id(id))
        .map(String::as_str)
        .collect();
    if !malformed.is_empty() {
        return Err(invalid(format!(
            "invalid format for: {}",
            malformed.join(", ")
        )));
    }
    Ok(ids)
}

fn is_medicine_id(id: &str) -> bool {
    id.strip_prefix('M')
        .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
}

/// Parses a non-negative stock count.
pub fn stock(input: &str) -> ClinicResult<u32> {
    input
        .trim()
        .parse()
        .map_err(|_| invalid("stock must be a whole number of zero or more"))
}

/// Parses a non-negative currency amount, rounded to two decimals.
pub fn amount(input: &str) -> ClinicResult<f64> {
    let value: f64 = input
        .trim()
        .parse()
        .map_err(|_| invalid(format!("invalid amount: '{}'", input.trim())))?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid("amount cannot be negative"));
    }
    Ok(crate::models::round_currency(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn test_parse_date_accepts_every_layout() {
        let expected = ymd(2024, 1, 15);
        for input in [
            "15/01/2024",
            "15-01-2024",
            "2024-01-15",
            "15 January 2024",
            "15 Jan 2024",
            "January 15 2024",
            "Jan 15, 2024",
        ] {
            assert_eq!(parse_date(input).unwrap(), expected, "input {}", input);
        }
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(matches!(parse_date("tomorrow"), Err(ClinicError::Validation(_))));
        assert!(parse_date("2024-02-30").is_err());
    }

    #[test]
    fn test_birth_date_cannot_be_future() {
        let today = ymd(2025, 6, 1);
        assert!(birth_date("2025-06-01", today).is_ok());
        assert!(birth_date("2025-06-02", today).is_err());
    }

    #[test]
    fn test_appointment_date_must_be_after_today() {
        let today = ymd(2025, 6, 1);
        assert!(appointment_date("2025-06-01", today).is_err());
        assert_eq!(appointment_date("02/06/2025", today).unwrap(), ymd(2025, 6, 2));
    }

    #[test]
    fn test_parse_time_is_24_hour() {
        assert_eq!(format_time(parse_time("9:05").unwrap()), "09:05");
        assert!(parse_time("24:00").is_err());
        assert!(parse_time("2pm").is_err());
    }

    #[test]
    fn test_age_on_counts_completed_years() {
        let dob = ymd(1990, 6, 15);
        assert_eq!(age_on(dob, ymd(2025, 6, 14)), 34);
        assert_eq!(age_on(dob, ymd(2025, 6, 15)), 35);
        assert_eq!(age_on(ymd(2030, 1, 1), ymd(2025, 1, 1)), 0);
    }

    #[test]
    fn test_username_rules() {
        assert_eq!(username("  nurse1 ").unwrap(), "nurse1");
        assert!(username("ab").is_err());
        assert!(username("two words").is_err());
        assert!(username(&"x".repeat(21)).is_err());
    }

    #[test]
    fn test_user_age_bounds() {
        assert_eq!(user_age("42").unwrap(), 42);
        assert!(user_age("0").is_err());
        assert!(user_age("121").is_err());
        assert!(user_age("forty").is_err());
    }

    #[test]
    fn test_staff_phone_digit_count() {
        assert!(staff_phone("012-3456789").is_ok());
        assert!(staff_phone("01234567890").is_ok());
        assert!(staff_phone("123456789").is_err());
        assert!(staff_phone("+60123456789").is_err());
    }

    #[test]
    fn test_medicine_ids_normalise_and_report_bad_entries() {
        assert_eq!(medicine_ids(" m1, M22 ").unwrap(), vec!["M1", "M22"]);
        let err = medicine_ids("M1, X2, M").unwrap_err();
        assert_eq!(err.to_string(), "invalid input: invalid format for: X2, M");
    }

    #[test]
    fn test_amount_rounds_and_rejects_negative() {
        assert_eq!(amount("10.556").unwrap(), 10.56);
        assert!(amount("-1").is_err());
        assert!(amount("NaN").is_err());
    }

    #[test]
    fn test_role_codes() {
        assert_eq!(role("ph").unwrap(), Role::Pharmacist);
        assert!(role("nurse").is_err());
    }
}
