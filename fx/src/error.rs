//! Rate resolution error types.

use exrate_common::{Currency, Frequency, ParseError, QuoteConvention, Source};
use thiserror::Error;

/// Errors that can occur while resolving rates.
#[derive(Debug, Error)]
pub enum FxError {
    /// Input currency code is blank or not in the supported set.
    #[error("Invalid currency: {0}")]
    InvalidCurrency(#[from] ParseError),

    /// No provider registered for the source.
    #[error("Source {0} is not supported")]
    UnsupportedSource(Source),

    /// The provider has no historical series at this frequency.
    #[error("Provider {provider} does not support frequency {frequency}")]
    UnsupportedFrequency {
        provider: Source,
        frequency: Frequency,
    },

    /// Two providers registered for the same source.
    #[error("A provider is already registered for source {0}")]
    DuplicateProvider(Source),

    /// Provider returned an error.
    #[error("Rate provider error: {0}")]
    ProviderError(String),

    /// Rate store returned an error.
    #[error("Rate store error: {0}")]
    StoreError(String),

    /// The provider's declared base currency or convention cannot produce a
    /// rate for this pair.
    #[error("Unsupported quote convention {convention} for {from}->{to} with base {base}")]
    QuoteConventionViolation {
        convention: QuoteConvention,
        base: Currency,
        from: Currency,
        to: Currency,
    },

    /// Peg declarations form a cycle through this pair.
    #[error("Peg cycle detected while resolving {from}->{to}")]
    PegCycle { from: Currency, to: Currency },

    /// Recursion went deeper than the configured limit.
    #[error("Resolution exceeded maximum depth of {0}")]
    ResolutionDepthExceeded(usize),

    /// A product of rates or amounts does not fit a `Decimal`.
    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),

    /// Invalid configuration or arguments.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl FxError {
    /// Check if this error is transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FxError::ProviderError(_) | FxError::StoreError(_))
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            FxError::InvalidCurrency(e) => e.error_code(),
            FxError::UnsupportedSource(_) => "UNSUPPORTED_SOURCE",
            FxError::UnsupportedFrequency { .. } => "UNSUPPORTED_FREQUENCY",
            FxError::DuplicateProvider(_) => "DUPLICATE_PROVIDER",
            FxError::ProviderError(_) => "PROVIDER_ERROR",
            FxError::StoreError(_) => "STORE_ERROR",
            FxError::QuoteConventionViolation { .. } => "QUOTE_CONVENTION_VIOLATION",
            FxError::PegCycle { .. } => "PEG_CYCLE",
            FxError::ResolutionDepthExceeded(_) => "RESOLUTION_DEPTH_EXCEEDED",
            FxError::ArithmeticOverflow(_) => "ARITHMETIC_OVERFLOW",
            FxError::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_currency_from_parse_error() {
        let err: FxError = ParseError::UnknownCurrency("ZZZ".to_string()).into();
        assert!(matches!(err, FxError::InvalidCurrency(_)));
        assert_eq!(err.error_code(), "INVALID_CURRENCY");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_retryable() {
        assert!(FxError::ProviderError("timeout".into()).is_retryable());
        assert!(FxError::StoreError("down".into()).is_retryable());
        assert!(!FxError::UnsupportedSource(Source::Ecb).is_retryable());
        assert!(!FxError::ArithmeticOverflow("1e28 * 10".into()).is_retryable());
    }

    #[test]
    fn test_messages() {
        let err = FxError::UnsupportedFrequency {
            provider: Source::Banxico,
            frequency: Frequency::Weekly,
        };
        assert_eq!(
            err.to_string(),
            "Provider BANXICO does not support frequency weekly"
        );
    }
}
