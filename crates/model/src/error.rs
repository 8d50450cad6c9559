//! Error types for the model crate.
//!
//! Every variant names the form field that rejected the value, so a front
//! end can point the user at the right input.

use thiserror::Error;

/// Errors raised while editing or building a preference snapshot.
///
/// Validation never coerces: a value outside its field's domain is rejected
/// and the previous snapshot stays in place.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A numeric field received something that is not an integer
    #[error("Invalid value for {field}: '{value}' is not a whole number")]
    NotANumber { field: &'static str, value: String },

    /// A numeric field received an integer outside its range
    #[error("Invalid value for {field}: {value} is outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: u8,
        max: u8,
    },

    /// An enumerated field received a value that is not one of its options
    #[error("Invalid value for {field}: '{value}' (expected one of: {expected})")]
    UnknownVariant {
        field: &'static str,
        value: String,
        expected: String,
    },

    /// The field name itself is not part of the form
    #[error("Unknown preference field: '{0}'")]
    UnknownField(String),
}

impl ValidationError {
    /// Name of the offending field, as spelled on the wire.
    pub fn field(&self) -> &str {
        match self {
            Self::NotANumber { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::UnknownVariant { field, .. } => field,
            Self::UnknownField(name) => name,
        }
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, ValidationError>;
