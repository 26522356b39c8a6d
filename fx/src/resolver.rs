//! Main rate resolver implementation.

use std::sync::Arc;

use chrono::NaiveDate;
use exrate_common::{
    days_before, months_between, same_month, Clock, Currency, Frequency, QuoteConvention,
    RateObservation, Source, SystemClock,
};
use futures::future::{self, BoxFuture, FutureExt};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use crate::cache::SharedRateCache;
use crate::config::ResolverConfig;
use crate::error::{FxError, FxResult};
use crate::fetch::RateFetchCoordinator;
use crate::pegs::PegTable;
use crate::registry::ProviderRegistry;
use crate::store::RateStore;

/// Date, source and frequency shared by every step of one resolution.
#[derive(Debug, Clone, Copy)]
struct RateQuery {
    date: NaiveDate,
    source: Source,
    frequency: Frequency,
}

/// Pairs currently being resolved, outermost first.
#[derive(Debug, Clone, Default)]
struct ResolutionPath(Vec<(Currency, Currency)>);

impl ResolutionPath {
    fn enter(&self, from: Currency, to: Currency, max_depth: usize) -> FxResult<Self> {
        if self.0.contains(&(from, to)) {
            return Err(FxError::PegCycle { from, to });
        }
        if self.0.len() >= max_depth {
            return Err(FxError::ResolutionDepthExceeded(max_depth));
        }

        let mut pairs = self.0.clone();
        pairs.push((from, to));
        Ok(Self(pairs))
    }
}

/// Resolves conversion rates between any two currencies.
///
/// A request is answered, in order, as the identity, through a peg, as a
/// cross-rate through the provider's base currency, or by a direct lookup of
/// the non-base currency. Direct lookups go cache -> store -> provider (one
/// whole month per fetch) and finally walk backwards day by day to the most
/// recent known observation.
pub struct RateResolver {
    registry: Arc<ProviderRegistry>,
    store: Arc<dyn RateStore>,
    cache: SharedRateCache,
    fetcher: RateFetchCoordinator,
    pegs: RwLock<Arc<PegTable>>,
    clock: Arc<dyn Clock>,
    config: ResolverConfig,
}

impl RateResolver {
    /// Create a resolver. Pegs are empty until [`RateResolver::reload_pegs`].
    pub fn new(
        registry: Arc<ProviderRegistry>,
        store: Arc<dyn RateStore>,
        cache: SharedRateCache,
        config: ResolverConfig,
    ) -> Self {
        Self {
            fetcher: RateFetchCoordinator::new(registry.clone()),
            registry,
            store,
            cache,
            pegs: RwLock::new(Arc::new(PegTable::default())),
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Use a different source of "today".
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Load peg declarations from the store, replacing the current table.
    pub async fn reload_pegs(&self) -> FxResult<usize> {
        let declarations = self.store.pegged_currencies().await?;
        let table = PegTable::from_declarations(declarations);
        let count = table.len();
        *self.pegs.write() = Arc::new(table);

        info!(count, "Loaded pegged currencies");
        Ok(count)
    }

    /// Get the shared cache.
    pub fn cache(&self) -> &SharedRateCache {
        &self.cache
    }

    /// Get the provider registry.
    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Get the configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve the rate converting one unit of `from_code` into `to_code`.
    ///
    /// Codes are case-insensitive ISO codes. `Ok(None)` means no rate could be
    /// determined after every fallback.
    #[instrument(skip(self))]
    pub async fn resolve(
        &self,
        from_code: &str,
        to_code: &str,
        date: NaiveDate,
        source: Source,
        frequency: Frequency,
    ) -> FxResult<Option<Decimal>> {
        let from: Currency = from_code.parse()?;
        let to: Currency = to_code.parse()?;
        self.resolve_pair(from, to, date, source, frequency).await
    }

    /// Resolve a rate between two known currencies.
    pub async fn resolve_pair(
        &self,
        from: Currency,
        to: Currency,
        date: NaiveDate,
        source: Source,
        frequency: Frequency,
    ) -> FxResult<Option<Decimal>> {
        let query = RateQuery {
            date,
            source,
            frequency,
        };
        let rate = self
            .resolve_step(from, to, query, ResolutionPath::default())
            .await?;

        match rate {
            Some(rate) => debug!(from = %from, to = %to, rate = %rate, "Resolved rate"),
            None => info!(from = %from, to = %to, date = %date, "No rate found"),
        }

        Ok(rate)
    }

    /// Convert `amount` of `from_code` into `to_code`.
    pub async fn convert(
        &self,
        amount: Decimal,
        from_code: &str,
        to_code: &str,
        date: NaiveDate,
        source: Source,
        frequency: Frequency,
    ) -> FxResult<Option<Decimal>> {
        let rate = match self
            .resolve(from_code, to_code, date, source, frequency)
            .await?
        {
            Some(rate) => rate,
            None => return Ok(None),
        };

        amount.checked_mul(rate).map(Some).ok_or_else(|| {
            FxError::ArithmeticOverflow(format!(
                "{} {} at rate {} into {}",
                amount, from_code, rate, to_code
            ))
        })
    }

    /// Load every month intersecting `[from, to]` and record `from` as the
    /// backfill watermark for `(source, frequency)`.
    ///
    /// Unlike resolution, failures here propagate and leave the watermark
    /// untouched. Returns the number of observations cached.
    #[instrument(skip(self))]
    pub async fn backfill(
        &self,
        source: Source,
        frequency: Frequency,
        from: NaiveDate,
        to: NaiveDate,
    ) -> FxResult<usize> {
        if from > to {
            return Err(FxError::Configuration(format!(
                "backfill start {} is after end {}",
                from, to
            )));
        }

        let provider = self.registry.get(source)?;
        if !provider.supports_frequency(frequency) {
            return Err(FxError::UnsupportedFrequency {
                provider: source,
                frequency,
            });
        }

        let mut cached = 0;
        for month in months_between(from, to) {
            let observations = self.fetcher.try_fetch(source, frequency, month).await?;
            if observations.is_empty() {
                continue;
            }
            self.store.upsert(&observations).await?;
            cached += self.cache.set_many(&observations);
        }

        self.cache.update_min_date(source, frequency, from);

        info!(
            source = %source,
            frequency = %frequency,
            from = %from,
            to = %to,
            cached,
            "Backfill complete"
        );

        Ok(cached)
    }

    fn resolve_step<'a>(
        &'a self,
        from: Currency,
        to: Currency,
        query: RateQuery,
        path: ResolutionPath,
    ) -> BoxFuture<'a, FxResult<Option<Decimal>>> {
        async move {
            if from == to {
                return Ok(Some(Decimal::ONE));
            }

            let path = path.enter(from, to, self.config.max_resolution_depth)?;
            let provider = self.registry.get(query.source)?;
            let base = provider.base_currency();

            if let Some(rate) = self.resolve_pegged(from, to, query, &path).await? {
                return Ok(Some(rate));
            }

            if from != base && to != base {
                let from_leg = self.resolve_step(from, base, query, path.clone());
                let to_leg = self.resolve_step(base, to, query, path);
                let (from_to_base, base_to_to) = if self.config.concurrent_cross_rates {
                    future::try_join(from_leg, to_leg).await?
                } else {
                    (from_leg.await?, to_leg.await?)
                };

                return Ok(match (from_to_base, base_to_to) {
                    (Some(a), Some(b)) => compose(a, b, from, to),
                    _ => None,
                });
            }

            let lookup = if to == base { from } else { to };
            match self.find_raw_rate(lookup, query).await {
                Some(raw) => apply_quote_convention(provider.quote_convention(), base, from, to, raw),
                None => Ok(None),
            }
        }
        .boxed()
    }

    /// Try `from`'s peg, then `to`'s peg. Either falls through when the
    /// pegged-to leg has no rate.
    async fn resolve_pegged(
        &self,
        from: Currency,
        to: Currency,
        query: RateQuery,
        path: &ResolutionPath,
    ) -> FxResult<Option<Decimal>> {
        let pegs = self.pegs.read().clone();

        if let Some((pegged_to, rate)) = pegs.get(from) {
            if let Some(peg_to_target) = self.resolve_step(pegged_to, to, query, path.clone()).await? {
                return Ok(compose(rate, peg_to_target, from, to));
            }
        }

        if let Some((pegged_to, rate)) = pegs.get(to) {
            if let Some(source_to_peg) = self.resolve_step(from, pegged_to, query, path.clone()).await? {
                return Ok(source_to_peg.checked_div(rate));
            }
        }

        Ok(None)
    }

    /// Published rate of `currency` against the provider's base currency on
    /// `query.date`, or the most recent one before it.
    async fn find_raw_rate(&self, currency: Currency, query: RateQuery) -> Option<Decimal> {
        let RateQuery {
            date,
            source,
            frequency,
        } = query;

        if let Some(rate) = self.cache.try_get(currency, date, source, frequency) {
            debug!(currency = %currency, date = %date, "Cache hit");
            return Some(rate);
        }

        if let Some(rate) = self.probe_store(currency, date, query).await {
            return Some(rate);
        }

        self.fetch_and_cache(source, frequency, date).await;

        // A month wholly in the future fetches nothing; the latest real data
        // is in the current month.
        let today = self.clock.today();
        if self.config.fetch_current_month_for_future_dates
            && date > today
            && !same_month(date, today)
        {
            self.fetch_and_cache(source, frequency, today).await;
        }

        self.look_back(currency, query).await
    }

    async fn look_back(&self, currency: Currency, query: RateQuery) -> Option<Decimal> {
        let floor = self.lookback_floor(query);
        let mut day = query.date;

        while day >= floor {
            if let Some(rate) = self
                .cache
                .try_get(currency, day, query.source, query.frequency)
            {
                debug!(currency = %currency, requested = %query.date, found = %day, "Lookback cache hit");
                return Some(rate);
            }

            // The requested day's row was probed before fetching, and
            // anything fetched since is already cached.
            if day != query.date {
                if let Some(rate) = self.probe_store(currency, day, query).await {
                    debug!(currency = %currency, requested = %query.date, found = %day, "Lookback store hit");
                    return Some(rate);
                }
            }

            match day.pred_opt() {
                Some(previous) => day = previous,
                None => break,
            }
        }

        debug!(currency = %currency, date = %query.date, floor = %floor, "Lookback exhausted");
        None
    }

    fn lookback_floor(&self, query: RateQuery) -> NaiveDate {
        let floor = self
            .cache
            .get_min_date(query.source, query.frequency)
            .unwrap_or_else(|| {
                days_before(query.date, self.config.lookback_days(query.frequency))
            });
        floor.min(query.date)
    }

    /// Store lookup for one day. Hits are copied into the cache; store
    /// failures count as misses.
    async fn probe_store(
        &self,
        currency: Currency,
        day: NaiveDate,
        query: RateQuery,
    ) -> Option<Decimal> {
        match self
            .store
            .query(currency, query.source, query.frequency, day)
            .await
        {
            Ok(Some(observation)) if observation.is_valid() => {
                self.cache.set(&observation);
                Some(observation.rate)
            }
            Ok(_) => None,
            Err(e) => {
                warn!(currency = %currency, date = %day, error = %e, "Rate store lookup failed");
                None
            }
        }
    }

    async fn fetch_and_cache(&self, source: Source, frequency: Frequency, date: NaiveDate) -> usize {
        let observations = self.fetcher.fetch(source, frequency, date).await;
        if observations.is_empty() {
            return 0;
        }

        self.persist(&observations).await;
        self.cache.set_many(&observations)
    }

    async fn persist(&self, observations: &[RateObservation]) {
        if let Err(e) = self.store.upsert(observations).await {
            warn!(count = observations.len(), error = %e, "Failed to persist fetched rates");
        }
    }
}

/// Chain two rates. A product too large for a `Decimal` is no rate.
fn compose(first: Decimal, second: Decimal, from: Currency, to: Currency) -> Option<Decimal> {
    let rate = first.checked_mul(second);
    if rate.is_none() {
        warn!(from = %from, to = %to, first = %first, second = %second, "Composed rate overflowed");
    }
    rate
}

/// Turn a raw published rate of `lookup` against `base` into the `from -> to`
/// rate, where exactly one of `from`/`to` is `base`.
fn apply_quote_convention(
    convention: QuoteConvention,
    base: Currency,
    from: Currency,
    to: Currency,
    raw: Decimal,
) -> FxResult<Option<Decimal>> {
    let rate = match convention {
        QuoteConvention::Direct if to == base => Some(raw),
        QuoteConvention::Direct if from == base => Decimal::ONE.checked_div(raw),
        QuoteConvention::Indirect if from == base => Some(raw),
        QuoteConvention::Indirect if to == base => Decimal::ONE.checked_div(raw),
        _ => {
            return Err(FxError::QuoteConventionViolation {
                convention,
                base,
                from,
                to,
            })
        }
    };
    Ok(rate)
}
