//! Rate sources, sampling frequencies and rate observations.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::currency::Currency;
use crate::error::ParseError;

/// A rate-publishing authority. Each source has exactly one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Source {
    /// European Central Bank.
    Ecb,
    /// Banco de México.
    Banxico,
}

impl Source {
    /// Every known source.
    pub const ALL: &'static [Source] = &[Source::Ecb, Source::Banxico];

    /// Get the source identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Ecb => "ECB",
            Source::Banxico => "BANXICO",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        Source::ALL
            .iter()
            .copied()
            .find(|source| source.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| ParseError::UnknownSource(value.to_string()))
    }
}

/// Sampling cadence of a published series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    BiWeekly,
    Monthly,
}

impl Frequency {
    /// Every known frequency.
    pub const ALL: &'static [Frequency] = &[
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::BiWeekly,
        Frequency::Monthly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::BiWeekly => "bi_weekly",
            Frequency::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "biweekly" | "bi-weekly" | "bi_weekly" => Ok(Frequency::BiWeekly),
            "monthly" => Ok(Frequency::Monthly),
            _ => Err(ParseError::UnknownFrequency(s.trim().to_string())),
        }
    }
}

/// How a provider's published number relates its quoted currency to its base.
///
/// With EUR as base:
/// - Direct: 1 USD = 0.92819 EUR
/// - Indirect: 1 EUR = 1.08238 USD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteConvention {
    /// 1 unit of quoted currency = X units of base currency.
    Direct,
    /// 1 unit of base currency = X units of quoted currency.
    Indirect,
}

impl fmt::Display for QuoteConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteConvention::Direct => f.write_str("direct"),
            QuoteConvention::Indirect => f.write_str("indirect"),
        }
    }
}

impl FromStr for QuoteConvention {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(QuoteConvention::Direct),
            "indirect" => Ok(QuoteConvention::Indirect),
            other => Err(ParseError::UnknownQuoteConvention(other.to_string())),
        }
    }
}

/// Composite key of a rate observation. At most one observation exists per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObservationKey {
    pub currency: Currency,
    pub date: NaiveDate,
    pub source: Source,
    pub frequency: Frequency,
}

impl fmt::Display for ObservationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}/{}/{}",
            self.currency, self.date, self.source, self.frequency
        )
    }
}

/// A published rate between `currency` and the issuing provider's base
/// currency on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateObservation {
    /// Quoted currency.
    pub currency: Currency,
    /// Observation day.
    pub date: NaiveDate,
    /// Issuing authority.
    pub source: Source,
    /// Series cadence.
    pub frequency: Frequency,
    /// Published rate, in the provider's quote convention.
    pub rate: Decimal,
}

impl RateObservation {
    /// Create a new observation.
    pub fn new(
        currency: Currency,
        date: NaiveDate,
        source: Source,
        frequency: Frequency,
        rate: Decimal,
    ) -> Self {
        Self {
            currency,
            date,
            source,
            frequency,
            rate,
        }
    }

    /// Get the composite key.
    pub fn key(&self) -> ObservationKey {
        ObservationKey {
            currency: self.currency,
            date: self.date,
            source: self.source,
            frequency: self.frequency,
        }
    }

    /// A usable observation carries a strictly positive rate.
    pub fn is_valid(&self) -> bool {
        self.rate > Decimal::ZERO
    }
}

/// A fixed, date-independent rate between two currencies.
///
/// `rate` converts one unit of `currency` into `pegged_to`: resolving
/// `currency -> X` yields `rate * (pegged_to -> X)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeggedCurrency {
    pub currency: Currency,
    pub pegged_to: Currency,
    pub rate: Decimal,
}

impl PeggedCurrency {
    pub fn new(currency: Currency, pegged_to: Currency, rate: Decimal) -> Self {
        Self {
            currency,
            pegged_to,
            rate,
        }
    }

    /// A peg must point at another currency with a positive rate.
    pub fn is_valid(&self) -> bool {
        self.currency != self.pegged_to && self.rate > Decimal::ZERO
    }
}
