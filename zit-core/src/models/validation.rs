//! Validation error type

use std::fmt;

/// Rejected user input.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Field is empty (or only whitespace)
    Empty { field: &'static str },

    TooShort { field: &'static str, min: usize },

    TooLong { field: &'static str, max: usize },

    /// String doesn't match the required format
    InvalidFormat {
        field: &'static str,
        reason: &'static str,
    },

    /// Unknown enum code
    InvalidVariant { field: &'static str, value: String },

    /// Number outside its allowed range
    OutOfRange {
        field: &'static str,
        reason: &'static str,
    },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Empty { field }
            | Self::TooShort { field, .. }
            | Self::TooLong { field, .. }
            | Self::InvalidFormat { field, .. }
            | Self::InvalidVariant { field, .. }
            | Self::OutOfRange { field, .. } => field,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::TooShort { field, min } => {
                write!(f, "{} must be at least {} characters", field, min)
            }
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::InvalidFormat { field, reason } | Self::OutOfRange { field, reason } => {
                write!(f, "{}: {}", field, reason)
            }
            Self::InvalidVariant { field, value } => {
                write!(f, "invalid {} value: '{}'", field, value)
            }
        }
    }
}

impl std::error::Error for ValidationError {}
