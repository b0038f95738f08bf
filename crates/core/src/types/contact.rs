//! Customer contact details: email addresses and phone numbers.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input string is empty.
    #[error("email cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input is not `local@domain`.
    #[error("email must look like name@domain")]
    Malformed,
}

/// An email address, trimmed and lowercased.
///
/// ```
/// use sudsy_core::Email;
///
/// assert_eq!(Email::parse(" Ada@Example.com ").unwrap().as_str(), "ada@example.com");
/// assert!(Email::parse("no-at-symbol").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse and normalize an email address.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, or does not have a
    /// non-empty local part and domain around a single `@`.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        match s.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(s.to_lowercase()))
            }
            _ => Err(EmailError::Malformed),
        }
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input contains characters other than digits, spaces, dashes, or a leading `+`.
    #[error("phone number contains invalid characters")]
    InvalidCharacters,
    /// Wrong number of digits.
    #[error("phone number must have between 10 and 15 digits")]
    InvalidLength,
}

/// A phone number normalized to E.164 (`+2348012345678`).
///
/// Local Nigerian numbers with a trunk prefix (`08012345678`) are rewritten
/// with the `+234` country code.
///
/// ```
/// use sudsy_core::PhoneNumber;
///
/// let phone = PhoneNumber::parse("0801 234 5678").unwrap();
/// assert_eq!(phone.as_str(), "+2348012345678");
/// assert_eq!(phone.digits(), "2348012345678");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    const COUNTRY_CODE: &'static str = "234";

    /// Parse and normalize a phone number.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, has invalid characters, or
    /// does not contain 10-15 digits after normalization.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PhoneError::Empty);
        }

        let (has_plus, rest) = s.strip_prefix('+').map_or((false, s), |r| (true, r));
        if !rest
            .chars()
            .all(|c| c.is_ascii_digit() || c == ' ' || c == '-')
        {
            return Err(PhoneError::InvalidCharacters);
        }

        let digits: String = rest.chars().filter(char::is_ascii_digit).collect();
        let digits = match digits.strip_prefix('0') {
            Some(national) if !has_plus && digits.len() == 11 => {
                format!("{}{national}", Self::COUNTRY_CODE)
            }
            _ => digits,
        };

        if !(10..=15).contains(&digits.len()) {
            return Err(PhoneError::InvalidLength);
        }

        Ok(Self(format!("+{digits}")))
    }

    /// The number in E.164 form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The number without the leading `+` (the WhatsApp recipient format).
    #[must_use]
    pub fn digits(&self) -> &str {
        self.0.trim_start_matches('+')
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}

// SQLx support (with postgres feature). Database values are assumed valid.
#[cfg(feature = "postgres")]
mod postgres {
    use super::{Email, PhoneNumber};

    macro_rules! text_column {
        ($ty:ty) => {
            impl sqlx::Type<sqlx::Postgres> for $ty {
                fn type_info() -> sqlx::postgres::PgTypeInfo {
                    <String as sqlx::Type<sqlx::Postgres>>::type_info()
                }

                fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                    <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
                }
            }

            impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $ty {
                fn decode(
                    value: sqlx::postgres::PgValueRef<'r>,
                ) -> Result<Self, sqlx::error::BoxDynError> {
                    let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                    Ok(Self(s))
                }
            }

            impl sqlx::Encode<'_, sqlx::Postgres> for $ty {
                fn encode_by_ref(
                    &self,
                    buf: &mut sqlx::postgres::PgArgumentBuffer,
                ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                    <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
                }
            }
        };
    }

    text_column!(Email);
    text_column!(PhoneNumber);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_email_normalizes_case_and_whitespace() {
        let email = Email::parse("  USER@Example.COM").unwrap();
        assert_eq!(email.as_str(), "user@example.com");
    }

    #[test]
    fn test_email_rejects_malformed() {
        assert_eq!(Email::parse(""), Err(EmailError::Empty));
        assert_eq!(Email::parse("@domain.com"), Err(EmailError::Malformed));
        assert_eq!(Email::parse("user@"), Err(EmailError::Malformed));
        assert_eq!(Email::parse("a@b@c"), Err(EmailError::Malformed));
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(Email::parse(&long), Err(EmailError::TooLong { .. })));
    }

    #[test]
    fn test_email_deserialize_validates() {
        assert!(serde_json::from_str::<Email>("\"ada@example.com\"").is_ok());
        assert!(serde_json::from_str::<Email>("\"nope\"").is_err());
    }

    #[test]
    fn test_phone_international_kept() {
        let phone = PhoneNumber::parse("+2348000000000").unwrap();
        assert_eq!(phone.as_str(), "+2348000000000");
        assert_eq!(phone.digits(), "2348000000000");
    }

    #[test]
    fn test_phone_local_gets_country_code() {
        let phone = PhoneNumber::parse("0803-555-0101").unwrap();
        assert_eq!(phone.as_str(), "+2348035550101");
    }

    #[test]
    fn test_phone_without_plus() {
        assert_eq!(
            PhoneNumber::parse("447911123456").unwrap().as_str(),
            "+447911123456"
        );
    }

    #[test]
    fn test_phone_rejects_garbage() {
        assert_eq!(PhoneNumber::parse(" "), Err(PhoneError::Empty));
        assert_eq!(
            PhoneNumber::parse("call me"),
            Err(PhoneError::InvalidCharacters)
        );
        assert_eq!(PhoneNumber::parse("12345"), Err(PhoneError::InvalidLength));
    }
}
