//! Validated text types shared across the clinic crates.
//!
//! Operator input reaches the core through these newtypes so that an empty name or a
//! malformed phone number is rejected once, at the input boundary, and never stored.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,

    /// A person name contained characters other than letters, spaces and `.'-`
    #[error("Only letters, spaces and . ' - are allowed in names, got: '{0}'")]
    InvalidName(String),

    /// A phone number was not 7-20 characters of digits, `+`, `-` or spaces
    #[error("Invalid phone format: '{0}'")]
    InvalidPhone(String),
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper, returning the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A person's display name: letters, spaces, and `.`, `'`, `-` only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName(NonEmptyText);

impl PersonName {
    /// Validates a person name.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` for blank input and `TextError::InvalidName` when any
    /// character falls outside the permitted set.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let text = NonEmptyText::new(input)?;
        let allowed = |c: char| c.is_ascii_alphabetic() || matches!(c, ' ' | '.' | '\'' | '-');
        if !text.as_str().chars().all(allowed) {
            return Err(TextError::InvalidName(text.into_inner()));
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for PersonName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A loosely formatted phone number as typed at the front desk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber(NonEmptyText);

impl PhoneNumber {
    /// Validates a phone number of 7-20 characters drawn from digits, `+`, `-` and spaces.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` for blank input and `TextError::InvalidPhone` otherwise.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let text = NonEmptyText::new(input)?;
        let s = text.as_str();
        let allowed = |c: char| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ');
        if !(7..=20).contains(&s.chars().count()) || !s.chars().all(allowed) {
            return Err(TextError::InvalidPhone(text.into_inner()));
        }
        Ok(Self(text))
    }

    /// Number of digits, ignoring separators.
    pub fn digit_count(&self) -> usize {
        self.0.as_str().chars().filter(|c| c.is_ascii_digit()).count()
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_text_trims_input() {
        let text = NonEmptyText::new("  Jane Doe  ").expect("should accept padded text");
        assert_eq!(text.as_str(), "Jane Doe");
    }

    #[test]
    fn test_non_empty_text_rejects_whitespace() {
        assert_eq!(NonEmptyText::new("   "), Err(TextError::Empty));
    }

    #[test]
    fn test_person_name_accepts_punctuation() {
        let name = PersonName::new("Mary-Jane O'Neil Jr.").expect("valid name");
        assert_eq!(name.as_str(), "Mary-Jane O'Neil Jr.");
    }

    #[test]
    fn test_person_name_rejects_symbols() {
        assert!(matches!(
            PersonName::new("J@ne"),
            Err(TextError::InvalidName(_))
        ));
    }

    #[test]
    fn test_phone_number_validation() {
        let phone = PhoneNumber::new("012-345 6789").expect("valid phone");
        assert_eq!(phone.digit_count(), 10);
        assert!(matches!(
            PhoneNumber::new("12ab"),
            Err(TextError::InvalidPhone(_))
        ));
        assert!(matches!(
            PhoneNumber::new("123"),
            Err(TextError::InvalidPhone(_))
        ));
    }
}
