//! Rate provider trait and the static in-memory provider.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use exrate_common::{
    Currency, Frequency, ObservationKey, QuoteConvention, RateObservation, Source,
};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{FxError, FxResult};

/// An external authority publishing historical rates against one base currency.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Get the source this provider serves.
    fn source(&self) -> Source;

    /// Currency every published rate is quoted against.
    fn base_currency(&self) -> Currency;

    /// How published numbers relate quoted and base currency.
    fn quote_convention(&self) -> QuoteConvention;

    /// Frequencies with a historical series.
    fn supported_frequencies(&self) -> &[Frequency];

    /// Check if this provider publishes a series at `frequency`.
    fn supports_frequency(&self, frequency: Frequency) -> bool {
        self.supported_frequencies().contains(&frequency)
    }

    /// Fetch every observation at `frequency` dated within `[from, to]`.
    ///
    /// Fails with [`FxError::UnsupportedFrequency`] for frequencies outside
    /// [`RateProvider::supported_frequencies`].
    async fn fetch_historical(
        &self,
        frequency: Frequency,
        from: NaiveDate,
        to: NaiveDate,
    ) -> FxResult<Vec<RateObservation>>;
}

/// Provider serving a fixed set of observations held in memory.
///
/// Counts fetches and can be switched into a failing mode, which makes it the
/// stand-in for a remote provider in fixtures and tests.
pub struct StaticRateProvider {
    source: Source,
    base_currency: Currency,
    quote_convention: QuoteConvention,
    frequencies: Vec<Frequency>,
    observations: DashMap<ObservationKey, RateObservation>,
    fetch_calls: AtomicUsize,
    failing: AtomicBool,
}

impl StaticRateProvider {
    /// Create a provider publishing a daily series.
    pub fn new(source: Source, base_currency: Currency, quote_convention: QuoteConvention) -> Self {
        Self {
            source,
            base_currency,
            quote_convention,
            frequencies: vec![Frequency::Daily],
            observations: DashMap::new(),
            fetch_calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    /// Replace the set of published frequencies.
    pub fn with_frequencies(mut self, frequencies: impl Into<Vec<Frequency>>) -> Self {
        self.frequencies = frequencies.into();
        self
    }

    /// Publish a rate for `currency` against the base currency.
    pub fn add_rate(&self, currency: Currency, date: NaiveDate, frequency: Frequency, rate: Decimal) {
        self.add_observation(RateObservation::new(
            currency,
            date,
            self.source,
            frequency,
            rate,
        ));
    }

    /// Publish a prepared observation as-is.
    pub fn add_observation(&self, observation: RateObservation) {
        self.observations.insert(observation.key(), observation);
    }

    /// Number of `fetch_historical` calls served so far, including failed ones.
    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Make subsequent fetches fail as if the transport were down.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl RateProvider for StaticRateProvider {
    fn source(&self) -> Source {
        self.source
    }

    fn base_currency(&self) -> Currency {
        self.base_currency
    }

    fn quote_convention(&self) -> QuoteConvention {
        self.quote_convention
    }

    fn supported_frequencies(&self) -> &[Frequency] {
        &self.frequencies
    }

    async fn fetch_historical(
        &self,
        frequency: Frequency,
        from: NaiveDate,
        to: NaiveDate,
    ) -> FxResult<Vec<RateObservation>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.load(Ordering::SeqCst) {
            return Err(FxError::ProviderError(format!(
                "{} is unavailable",
                self.source
            )));
        }

        if !self.supports_frequency(frequency) {
            return Err(FxError::UnsupportedFrequency {
                provider: self.source,
                frequency,
            });
        }

        let mut observations: Vec<RateObservation> = self
            .observations
            .iter()
            .filter(|entry| {
                let o = entry.value();
                o.frequency == frequency && o.date >= from && o.date <= to
            })
            .map(|entry| entry.value().clone())
            .collect();
        observations.sort_by_key(|o| (o.date, o.currency));

        debug!(
            source = %self.source,
            frequency = %frequency,
            from = %from,
            to = %to,
            count = observations.len(),
            "Served historical rates"
        );

        Ok(observations)
    }
}
