//! Durable rate storage interface and the in-memory implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use exrate_common::{Currency, Frequency, ObservationKey, PeggedCurrency, RateObservation, Source};
use parking_lot::RwLock;
use tracing::debug;

use crate::error::FxResult;

/// Persistence for rate observations and pegged-currency declarations.
///
/// Implementations must upsert by the observation's composite key, so that
/// replaying the same batch is harmless.
#[async_trait]
pub trait RateStore: Send + Sync {
    /// Look up the observation for an exact date.
    async fn query(
        &self,
        currency: Currency,
        source: Source,
        frequency: Frequency,
        date: NaiveDate,
    ) -> FxResult<Option<RateObservation>>;

    /// Insert or replace observations.
    async fn upsert(&self, observations: &[RateObservation]) -> FxResult<()>;

    /// All declared pegs.
    async fn pegged_currencies(&self) -> FxResult<Vec<PeggedCurrency>>;
}

/// Store backed by process memory.
pub struct InMemoryRateStore {
    rates: DashMap<ObservationKey, RateObservation>,
    pegs: RwLock<Vec<PeggedCurrency>>,
}

impl InMemoryRateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            rates: DashMap::new(),
            pegs: RwLock::new(Vec::new()),
        }
    }

    /// Declare a pegged currency.
    pub fn add_pegged_currency(&self, peg: PeggedCurrency) {
        self.pegs.write().push(peg);
    }

    /// Number of stored observations.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl Default for InMemoryRateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateStore for InMemoryRateStore {
    async fn query(
        &self,
        currency: Currency,
        source: Source,
        frequency: Frequency,
        date: NaiveDate,
    ) -> FxResult<Option<RateObservation>> {
        let key = ObservationKey {
            currency,
            date,
            source,
            frequency,
        };
        Ok(self.rates.get(&key).map(|entry| entry.value().clone()))
    }

    async fn upsert(&self, observations: &[RateObservation]) -> FxResult<()> {
        let mut written = 0usize;
        for observation in observations.iter().filter(|o| o.is_valid()) {
            self.rates.insert(observation.key(), observation.clone());
            written += 1;
        }
        debug!(written, total = observations.len(), "Upserted observations");
        Ok(())
    }

    async fn pegged_currencies(&self) -> FxResult<Vec<PeggedCurrency>> {
        Ok(self.pegs.read().clone())
    }
}
