//! Username and password rules for registration.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use super::ValidationError;

const USERNAME_MIN_LEN: usize = 3;
const USERNAME_MAX_LEN: usize = 100;
const PASSWORD_MIN_LEN: usize = 8;
/// bcrypt ignores input past 72 bytes.
const PASSWORD_MAX_BYTES: usize = 72;

/// Letters, digits and underscore (Unicode-aware).
static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\w+$").expect("invalid username regex"));

/// Validated username.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Username(String);

impl Username {
    /// # Rules
    /// - At least 3 characters, at most 100
    /// - Only letters, digits and `_`
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let len = s.chars().count();
        if len < USERNAME_MIN_LEN {
            return Err(ValidationError::TooShort {
                field: "username",
                min: USERNAME_MIN_LEN,
            });
        }
        if len > USERNAME_MAX_LEN {
            return Err(ValidationError::TooLong {
                field: "username",
                max: USERNAME_MAX_LEN,
            });
        }
        if !USERNAME_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "username",
                reason: "may only contain letters, digits and underscore",
            });
        }
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Username {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

/// Validated plaintext password. `Debug` never prints the value.
#[derive(Clone, Deserialize)]
#[serde(try_from = "String")]
pub struct Password(String);

impl Password {
    /// # Rules
    /// - At least 8 characters, at most 72 bytes
    /// - At least one uppercase letter, one lowercase letter and one digit
    /// - At least one ASCII punctuation character
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.chars().count() < PASSWORD_MIN_LEN {
            return Err(ValidationError::TooShort {
                field: "password",
                min: PASSWORD_MIN_LEN,
            });
        }
        if s.len() > PASSWORD_MAX_BYTES {
            return Err(ValidationError::TooLong {
                field: "password",
                max: PASSWORD_MAX_BYTES,
            });
        }

        let rules: [(fn(char) -> bool, &'static str); 4] = [
            (char::is_uppercase, "must contain an uppercase letter"),
            (char::is_lowercase, "must contain a lowercase letter"),
            (char::is_numeric, "must contain a digit"),
            (
                |c: char| c.is_ascii_punctuation(),
                "must contain a punctuation character",
            ),
        ];
        for (rule, reason) in rules {
            if !s.chars().any(rule) {
                return Err(ValidationError::InvalidFormat {
                    field: "password",
                    reason,
                });
            }
        }

        Ok(Self(s.to_owned()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Password {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert!(Username::new("ivan_42").is_ok());
        assert!(Username::new("Пётр").is_ok());
        assert!(matches!(
            Username::new("ab"),
            Err(ValidationError::TooShort { min: 3, .. })
        ));
        assert!(matches!(
            Username::new("has space"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(Username::new("dash-ed").is_err());
    }

    #[test]
    fn password_accepts_strong_value() {
        assert!(Password::new("Secr3t!pass").is_ok());
    }

    #[test]
    fn password_rejects_each_missing_class() {
        let cases = [
            ("Sh0rt!", "too short"),
            ("secr3t!pass", "no uppercase"),
            ("SECR3T!PASS", "no lowercase"),
            ("Secret!pass", "no digit"),
            ("Secr3tpass", "no punctuation"),
        ];
        for (input, why) in cases {
            assert!(Password::new(input).is_err(), "accepted password with {why}");
        }
    }

    #[test]
    fn password_rejects_over_bcrypt_limit() {
        let long = format!("Aa1!{}", "x".repeat(70));
        assert!(matches!(
            Password::new(&long),
            Err(ValidationError::TooLong { max: 72, .. })
        ));
    }

    #[test]
    fn password_debug_is_redacted() {
        let password = Password::new("Secr3t!pass").unwrap();
        assert_eq!(format!("{password:?}"), "Password(***)");
    }
}
