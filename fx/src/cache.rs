//! In-memory rate cache with per-series backfill watermarks.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use exrate_common::{Currency, Frequency, RateObservation, Source};
use rust_decimal::Decimal;
use tracing::debug;

/// One published series: a currency as quoted by a source at a frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SeriesKey {
    source: Source,
    frequency: Frequency,
    currency: Currency,
}

/// Thread-safe rate cache.
///
/// Rates are layered as series -> date -> rate. Writes are upserts: the last
/// write for a (currency, date, source, frequency) key wins. Each
/// (source, frequency) also carries a watermark recording the earliest date
/// known to be backfilled; it only ever moves earlier.
pub struct RateCache {
    series: DashMap<SeriesKey, BTreeMap<NaiveDate, Decimal>>,
    min_dates: DashMap<(Source, Frequency), NaiveDate>,
}

impl RateCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            series: DashMap::new(),
            min_dates: DashMap::new(),
        }
    }

    /// Exact-date lookup.
    pub fn try_get(
        &self,
        currency: Currency,
        date: NaiveDate,
        source: Source,
        frequency: Frequency,
    ) -> Option<Decimal> {
        let key = SeriesKey {
            source,
            frequency,
            currency,
        };
        self.series
            .get(&key)
            .and_then(|series| series.get(&date).copied())
    }

    /// Upsert one observation. Observations without a positive rate are ignored.
    pub fn set(&self, observation: &RateObservation) -> bool {
        if !observation.is_valid() {
            debug!(key = %observation.key(), rate = %observation.rate, "Ignoring invalid observation");
            return false;
        }

        let key = SeriesKey {
            source: observation.source,
            frequency: observation.frequency,
            currency: observation.currency,
        };
        self.series
            .entry(key)
            .or_default()
            .insert(observation.date, observation.rate);
        true
    }

    /// Upsert many observations, returning how many were accepted.
    pub fn set_many<'a, I>(&self, observations: I) -> usize
    where
        I: IntoIterator<Item = &'a RateObservation>,
    {
        observations
            .into_iter()
            .filter(|observation| self.set(observation))
            .count()
    }

    /// Earliest backfilled date for a series family, if any.
    pub fn get_min_date(&self, source: Source, frequency: Frequency) -> Option<NaiveDate> {
        self.min_dates.get(&(source, frequency)).map(|d| *d)
    }

    /// Record that `(source, frequency)` is backfilled down to `date`.
    /// Keeps the earlier of the existing and new watermark.
    pub fn update_min_date(&self, source: Source, frequency: Frequency, date: NaiveDate) {
        self.min_dates
            .entry((source, frequency))
            .and_modify(|existing| {
                if date < *existing {
                    *existing = date;
                }
            })
            .or_insert(date);
    }

    /// Get the number of cached rates.
    pub fn len(&self) -> usize {
        self.series.iter().map(|series| series.len()).sum()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all cached rates and watermarks.
    pub fn clear(&self) {
        self.series.clear();
        self.min_dates.clear();
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            series: self.series.len(),
            rates: self.len(),
            watermarks: self.min_dates.len(),
        }
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub series: usize,
    pub rates: usize,
    pub watermarks: usize,
}

/// Shared rate cache.
pub type SharedRateCache = Arc<RateCache>;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn obs(currency: Currency, d: NaiveDate, rate: Decimal) -> RateObservation {
        RateObservation::new(currency, d, Source::Ecb, Frequency::Daily, rate)
    }

    #[test]
    fn test_cache_set_and_get() {
        let cache = RateCache::new();
        cache.set(&obs(Currency::Usd, date(2024, 3, 15), dec!(1.0852)));

        assert_eq!(
            cache.try_get(Currency::Usd, date(2024, 3, 15), Source::Ecb, Frequency::Daily),
            Some(dec!(1.0852))
        );
    }

    #[test]
    fn test_cache_miss_is_exact_date_only() {
        let cache = RateCache::new();
        cache.set(&obs(Currency::Usd, date(2024, 3, 15), dec!(1.0852)));

        assert!(cache
            .try_get(Currency::Usd, date(2024, 3, 16), Source::Ecb, Frequency::Daily)
            .is_none());
        assert!(cache
            .try_get(Currency::Usd, date(2024, 3, 15), Source::Ecb, Frequency::Weekly)
            .is_none());
        assert!(cache
            .try_get(Currency::Usd, date(2024, 3, 15), Source::Banxico, Frequency::Daily)
            .is_none());
        assert!(cache
            .try_get(Currency::Gbp, date(2024, 3, 15), Source::Ecb, Frequency::Daily)
            .is_none());
    }

    #[test]
    fn test_cache_last_write_wins() {
        let cache = RateCache::new();
        cache.set(&obs(Currency::Usd, date(2024, 3, 15), dec!(1.0852)));
        cache.set(&obs(Currency::Usd, date(2024, 3, 15), dec!(1.0900)));

        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.try_get(Currency::Usd, date(2024, 3, 15), Source::Ecb, Frequency::Daily),
            Some(dec!(1.0900))
        );
    }

    #[test]
    fn test_cache_ignores_invalid_rates() {
        let cache = RateCache::new();
        let accepted = cache.set_many(&[
            obs(Currency::Usd, date(2024, 3, 15), dec!(0)),
            obs(Currency::Gbp, date(2024, 3, 15), dec!(-0.85)),
            obs(Currency::Jpy, date(2024, 3, 15), dec!(161.2)),
        ]);

        assert_eq!(accepted, 1);
        assert_eq!(cache.len(), 1);
        assert!(cache
            .try_get(Currency::Usd, date(2024, 3, 15), Source::Ecb, Frequency::Daily)
            .is_none());
    }

    #[test]
    fn test_min_date_only_moves_earlier() {
        let cache = RateCache::new();
        assert!(cache.get_min_date(Source::Ecb, Frequency::Daily).is_none());

        cache.update_min_date(Source::Ecb, Frequency::Daily, date(2024, 3, 1));
        cache.update_min_date(Source::Ecb, Frequency::Daily, date(2024, 4, 1));
        assert_eq!(
            cache.get_min_date(Source::Ecb, Frequency::Daily),
            Some(date(2024, 3, 1))
        );

        cache.update_min_date(Source::Ecb, Frequency::Daily, date(2024, 1, 1));
        assert_eq!(
            cache.get_min_date(Source::Ecb, Frequency::Daily),
            Some(date(2024, 1, 1))
        );
        assert!(cache.get_min_date(Source::Ecb, Frequency::Monthly).is_none());
    }

    #[test]
    fn test_cache_clear_and_stats() {
        let cache = RateCache::new();
        cache.set(&obs(Currency::Usd, date(2024, 3, 14), dec!(1.09)));
        cache.set(&obs(Currency::Usd, date(2024, 3, 15), dec!(1.0852)));
        cache.set(&obs(Currency::Gbp, date(2024, 3, 15), dec!(0.85)));
        cache.update_min_date(Source::Ecb, Frequency::Daily, date(2024, 3, 1));

        assert_eq!(
            cache.stats(),
            CacheStats {
                series: 2,
                rates: 3,
                watermarks: 1
            }
        );

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get_min_date(Source::Ecb, Frequency::Daily).is_none());
    }

    #[test]
    fn test_concurrent_writers() {
        let cache = Arc::new(RateCache::new());
        let handles: Vec<_> = (0..8u32)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for day in 1..=28u32 {
                        cache.set(&obs(
                            Currency::Usd,
                            date(2024, 2, day),
                            Decimal::from(i + 1),
                        ));
                        cache.update_min_date(Source::Ecb, Frequency::Daily, date(2024, 2, day));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 28);
        assert_eq!(
            cache.get_min_date(Source::Ecb, Frequency::Daily),
            Some(date(2024, 2, 1))
        );
    }

    proptest! {
        #[test]
        fn prop_min_date_is_minimum_of_updates(offsets in proptest::collection::vec(0i64..4000, 1..32)) {
            let cache = RateCache::new();
            let base = date(2015, 1, 1);

            for offset in &offsets {
                cache.update_min_date(
                    Source::Banxico,
                    Frequency::Weekly,
                    base + chrono::Duration::days(*offset),
                );
            }

            let expected = base + chrono::Duration::days(*offsets.iter().min().unwrap());
            prop_assert_eq!(cache.get_min_date(Source::Banxico, Frequency::Weekly), Some(expected));
        }
    }
}
