//! Implementation of [`PrefixedId`] and snapshot-based allocation.

use crate::{IdError, IdResult};
use std::{fmt, str::FromStr};

/// An identifier of the form `<letters><digits>`, such as `A17`.
///
/// The prefix keeps the casing it was written with; comparisons between prefixes during
/// allocation are case-insensitive.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PrefixedId {
    prefix: String,
    number: u64,
}

impl PrefixedId {
    /// Builds an identifier from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidInput`] if `prefix` is empty or not purely ASCII letters.
    pub fn new(prefix: &str, number: u64) -> IdResult<Self> {
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(IdError::InvalidInput(format!(
                "prefix must be one or more ASCII letters, got: '{}'",
                prefix
            )));
        }
        Ok(Self {
            prefix: prefix.to_string(),
            number,
        })
    }

    /// Splits `input` into its alphabetic prefix and numeric suffix.
    ///
    /// Surrounding whitespace is ignored. `"A12"` parses to `("A", 12)`.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidInput`] when the prefix is missing, the suffix is missing,
    /// or the suffix contains anything other than ASCII digits.
    pub fn parse(input: &str) -> IdResult<Self> {
        let s = input.trim();
        let split_at = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| IdError::InvalidInput(format!("no numeric suffix in '{}'", s)))?;
        let (prefix, digits) = s.split_at(split_at);

        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(IdError::InvalidInput(format!(
                "numeric suffix must be digits only, got: '{}'",
                s
            )));
        }
        let number = digits
            .parse::<u64>()
            .map_err(|e| IdError::InvalidInput(format!("'{}': {}", s, e)))?;

        Self::new(prefix, number)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    /// Returns true if this identifier carries `prefix`, ignoring ASCII case.
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.prefix.eq_ignore_ascii_case(prefix)
    }
}

impl fmt::Display for PrefixedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.number)
    }
}

impl FromStr for PrefixedId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for PrefixedId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for PrefixedId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PrefixedId::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Derives the next identifier for `prefix` from the identifiers already in use.
///
/// Values that do not parse as a [`PrefixedId`], or that carry a different prefix, are
/// ignored. The returned identifier always uses `prefix` exactly as given.
///
/// # Errors
///
/// Returns [`IdError::InvalidInput`] if `prefix` is not a valid prefix, and
/// [`IdError::Exhausted`] if the largest existing suffix is `u64::MAX`.
pub fn next_id<'a>(existing: impl IntoIterator<Item = &'a str>, prefix: &str) -> IdResult<PrefixedId> {
    let max = existing
        .into_iter()
        .filter_map(|value| PrefixedId::parse(value).ok())
        .filter(|id| id.has_prefix(prefix))
        .map(|id| id.number)
        .max()
        .unwrap_or(0);

    let number = max
        .checked_add(1)
        .ok_or_else(|| IdError::Exhausted(prefix.to_string()))?;
    PrefixedId::new(prefix, number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_prefix_and_number() {
        let id = PrefixedId::parse("A12").expect("should parse");
        assert_eq!(id.prefix(), "A");
        assert_eq!(id.number(), 12);
        assert_eq!(id.to_string(), "A12");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let id: PrefixedId = " M7 ".parse().expect("should parse");
        assert_eq!(id.to_string(), "M7");
    }

    #[test]
    fn test_parse_rejects_missing_prefix() {
        assert!(PrefixedId::parse("123").is_err());
    }

    #[test]
    fn test_parse_rejects_missing_number() {
        assert!(PrefixedId::parse("ABC").is_err());
    }

    #[test]
    fn test_parse_rejects_mixed_suffix() {
        assert!(PrefixedId::parse("A1B2").is_err());
    }

    #[test]
    fn test_next_id_on_empty_snapshot_starts_at_one() {
        let id = next_id(std::iter::empty(), "P").expect("should allocate");
        assert_eq!(id.to_string(), "P1");
    }

    #[test]
    fn test_next_id_exceeds_every_existing_suffix() {
        let existing = ["A1", "A12", "A3"];
        let id = next_id(existing.iter().copied(), "A").expect("should allocate");
        assert_eq!(id.to_string(), "A13");
        for value in existing {
            assert!(id.number() > PrefixedId::parse(value).unwrap().number());
        }
    }

    #[test]
    fn test_next_id_ignores_other_prefixes_and_garbage() {
        let existing = ["D9", "U2", "", "legacy", "u4"];
        let id = next_id(existing.iter().copied(), "U").expect("should allocate");
        assert_eq!(id.to_string(), "U5");
    }

    #[test]
    fn test_next_id_reports_exhaustion() {
        let max = format!("B{}", u64::MAX);
        let err = next_id([max.as_str()], "B").expect_err("should be exhausted");
        assert_eq!(err, IdError::Exhausted("B".into()));
    }

    #[test]
    fn test_serde_round_trip_uses_display_form() {
        let id = PrefixedId::new("B", 4).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"B4\"");
    }
}
