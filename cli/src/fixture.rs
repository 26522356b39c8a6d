//! JSON fixtures describing providers, their published rates and pegs.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use exrate_common::{Currency, Frequency, PeggedCurrency, QuoteConvention, Source};
use exrate_fx::{
    InMemoryRateStore, ProviderRegistry, RateCache, RateProvider, RateResolver, ResolverConfig,
    StaticRateProvider,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Everything needed to stand up a resolver without network access.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub providers: Vec<FixtureProvider>,
    #[serde(default)]
    pub pegs: Vec<PeggedCurrency>,
}

/// One rate source and the observations it publishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureProvider {
    pub source: Source,
    pub base_currency: Currency,
    pub quote_convention: QuoteConvention,
    #[serde(default = "default_frequencies")]
    pub frequencies: Vec<Frequency>,
    #[serde(default)]
    pub observations: Vec<FixtureObservation>,
}

/// A published rate of `currency` against the provider's base currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureObservation {
    pub currency: Currency,
    pub date: NaiveDate,
    pub rate: Decimal,
    #[serde(default = "default_frequency")]
    pub frequency: Frequency,
}

fn default_frequencies() -> Vec<Frequency> {
    vec![Frequency::Daily]
}

fn default_frequency() -> Frequency {
    Frequency::Daily
}

impl Fixture {
    /// Read and parse a fixture file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid fixture {}", path.display()))
    }

    /// Parse fixture JSON.
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Build the provider registry. Observations become the providers'
    /// published series.
    pub fn registry(&self) -> anyhow::Result<ProviderRegistry> {
        let mut registry = ProviderRegistry::new();

        for declared in &self.providers {
            let provider = StaticRateProvider::new(declared.source, declared.base_currency, declared.quote_convention)
                .with_frequencies(declared.frequencies.clone());
            for observation in &declared.observations {
                provider.add_rate(
                    observation.currency,
                    observation.date,
                    observation.frequency,
                    observation.rate,
                );
            }
            registry.register(Arc::new(provider) as Arc<dyn RateProvider>)?;
        }

        Ok(registry)
    }

    /// Build an empty rate store holding the fixture's peg declarations.
    pub fn store(&self) -> InMemoryRateStore {
        let store = InMemoryRateStore::new();
        for peg in &self.pegs {
            store.add_pegged_currency(peg.clone());
        }
        store
    }

    /// Build a resolver over this fixture with pegs loaded.
    pub async fn into_resolver(self, config: ResolverConfig) -> anyhow::Result<RateResolver> {
        let registry = self.registry()?;
        let store = self.store();

        let resolver = RateResolver::new(
            Arc::new(registry),
            Arc::new(store),
            Arc::new(RateCache::new()),
            config,
        );
        let pegs = resolver.reload_pegs().await?;

        info!(
            providers = self.providers.len(),
            pegs,
            "Fixture loaded"
        );

        Ok(resolver)
    }
}
