//! Error types for parsing ExRate identifiers.

use thiserror::Error;

/// Errors raised when a free-form code does not map onto one of the closed
/// enumerations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Blank or whitespace-only currency code.
    #[error("Null or empty currency code")]
    EmptyCurrencyCode,

    /// Currency code outside the supported set.
    #[error("Not supported currency code: {0}")]
    UnknownCurrency(String),

    /// Unknown rate source.
    #[error("Unknown rate source: {0}")]
    UnknownSource(String),

    /// Unknown sampling frequency.
    #[error("Unknown frequency: {0}")]
    UnknownFrequency(String),

    /// Unknown quote convention.
    #[error("Unknown quote convention: {0}")]
    UnknownQuoteConvention(String),
}

impl ParseError {
    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            ParseError::EmptyCurrencyCode => "MISSING_INPUT",
            ParseError::UnknownCurrency(_) => "INVALID_CURRENCY",
            ParseError::UnknownSource(_) => "INVALID_SOURCE",
            ParseError::UnknownFrequency(_) => "INVALID_FREQUENCY",
            ParseError::UnknownQuoteConvention(_) => "INVALID_QUOTE_CONVENTION",
        }
    }
}
