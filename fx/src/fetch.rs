//! Month-window fetches from rate providers.

use std::sync::Arc;

use chrono::NaiveDate;
use exrate_common::{month_bounds, Frequency, RateObservation, Source};
use tracing::{info, instrument, warn};

use crate::error::{FxError, FxResult};
use crate::registry::ProviderRegistry;

/// Fetches one calendar month of observations per call, so that a single
/// provider round-trip serves every later request for that month.
pub struct RateFetchCoordinator {
    registry: Arc<ProviderRegistry>,
}

impl RateFetchCoordinator {
    /// Create a coordinator over a provider registry.
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    /// Fetch the month containing `date`, returning nothing on any failure.
    ///
    /// An empty result means "fall back to what is already known"; callers
    /// never see provider or transport errors from here.
    #[instrument(skip(self))]
    pub async fn fetch(
        &self,
        source: Source,
        frequency: Frequency,
        date: NaiveDate,
    ) -> Vec<RateObservation> {
        match self.try_fetch(source, frequency, date).await {
            Ok(observations) => observations,
            Err(e) => {
                warn!(
                    source = %source,
                    frequency = %frequency,
                    date = %date,
                    error = %e,
                    "Failed to fetch rates"
                );
                Vec::new()
            }
        }
    }

    /// Fetch the month containing `date`, propagating failures.
    pub async fn try_fetch(
        &self,
        source: Source,
        frequency: Frequency,
        date: NaiveDate,
    ) -> FxResult<Vec<RateObservation>> {
        let provider = self.registry.get(source)?;
        if !provider.supports_frequency(frequency) {
            return Err(FxError::UnsupportedFrequency {
                provider: source,
                frequency,
            });
        }

        let (first, last) = month_bounds(date);
        let fetched = provider.fetch_historical(frequency, first, last).await?;
        let total = fetched.len();

        // Observations keyed under another series would poison the cache.
        let observations: Vec<RateObservation> = fetched
            .into_iter()
            .filter(|o| o.source == source && o.frequency == frequency)
            .collect();

        if observations.len() != total {
            warn!(
                source = %source,
                frequency = %frequency,
                dropped = total - observations.len(),
                "Dropped observations for a different series"
            );
        }

        info!(
            source = %source,
            frequency = %frequency,
            from = %first,
            to = %last,
            count = observations.len(),
            "Fetched rates"
        );

        Ok(observations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{RateProvider, StaticRateProvider};
    use exrate_common::{Currency, QuoteConvention};
    use rust_decimal_macros::dec;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn setup() -> (Arc<StaticRateProvider>, RateFetchCoordinator) {
        let provider = Arc::new(StaticRateProvider::new(
            Source::Ecb,
            Currency::Eur,
            QuoteConvention::Indirect,
        ));
        provider.add_rate(Currency::Usd, date(2, 29), Frequency::Daily, dec!(1.0813));
        provider.add_rate(Currency::Usd, date(3, 1), Frequency::Daily, dec!(1.0838));
        provider.add_rate(Currency::Usd, date(3, 29), Frequency::Daily, dec!(1.0811));
        provider.add_rate(Currency::Usd, date(4, 2), Frequency::Daily, dec!(1.0774));

        let registry = ProviderRegistry::from_providers([provider.clone() as Arc<dyn RateProvider>])
            .unwrap();
        (provider, RateFetchCoordinator::new(Arc::new(registry)))
    }

    #[tokio::test]
    async fn test_fetch_covers_whole_month() {
        let (provider, coordinator) = setup();

        let observations = coordinator.fetch(Source::Ecb, Frequency::Daily, date(3, 15)).await;

        let dates: Vec<NaiveDate> = observations.iter().map(|o| o.date).collect();
        assert_eq!(dates, vec![date(3, 1), date(3, 29)]);
        assert_eq!(provider.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_fails_closed() {
        let (provider, coordinator) = setup();
        provider.set_failing(true);

        let observations = coordinator.fetch(Source::Ecb, Frequency::Daily, date(3, 15)).await;
        assert!(observations.is_empty());

        let result = coordinator.try_fetch(Source::Ecb, Frequency::Daily, date(3, 15)).await;
        assert!(matches!(result, Err(FxError::ProviderError(_))));
    }

    #[tokio::test]
    async fn test_unsupported_frequency_is_not_sent_to_provider() {
        let (provider, coordinator) = setup();

        let observations = coordinator.fetch(Source::Ecb, Frequency::Weekly, date(3, 15)).await;
        assert!(observations.is_empty());
        assert_eq!(provider.fetch_count(), 0);

        let result = coordinator.try_fetch(Source::Ecb, Frequency::Weekly, date(3, 15)).await;
        assert!(matches!(result, Err(FxError::UnsupportedFrequency { .. })));
    }

    #[tokio::test]
    async fn test_unknown_source_fails_closed() {
        let (_, coordinator) = setup();

        let observations = coordinator
            .fetch(Source::Banxico, Frequency::Daily, date(3, 15))
            .await;
        assert!(observations.is_empty());
    }

    #[tokio::test]
    async fn test_foreign_series_dropped() {
        let (provider, coordinator) = setup();
        provider.add_observation(RateObservation::new(
            Currency::Usd,
            date(3, 5),
            Source::Banxico,
            Frequency::Daily,
            dec!(16.9),
        ));

        let observations = coordinator.fetch(Source::Ecb, Frequency::Daily, date(3, 15)).await;
        assert_eq!(observations.len(), 2);
        assert!(observations.iter().all(|o| o.source == Source::Ecb));
    }
}
