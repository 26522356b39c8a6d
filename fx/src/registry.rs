//! Source -> provider registry.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use exrate_common::{Currency, Source};
use tracing::info;

use crate::error::{FxError, FxResult};
use crate::provider::RateProvider;

/// Maps each source to its provider, keeping registration order.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn RateProvider>>,
    by_source: HashMap<Source, usize>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from providers, rejecting duplicate sources.
    pub fn from_providers(
        providers: impl IntoIterator<Item = Arc<dyn RateProvider>>,
    ) -> FxResult<Self> {
        let mut registry = Self::new();
        for provider in providers {
            registry.register(provider)?;
        }
        Ok(registry)
    }

    /// Register a provider for its source.
    pub fn register(&mut self, provider: Arc<dyn RateProvider>) -> FxResult<()> {
        let source = provider.source();
        if self.by_source.contains_key(&source) {
            return Err(FxError::DuplicateProvider(source));
        }

        info!(
            source = %source,
            base_currency = %provider.base_currency(),
            quote_convention = %provider.quote_convention(),
            "Registered rate provider"
        );

        self.by_source.insert(source, self.providers.len());
        self.providers.push(provider);
        Ok(())
    }

    /// Get the provider for a source.
    pub fn get(&self, source: Source) -> FxResult<Arc<dyn RateProvider>> {
        self.by_source
            .get(&source)
            .map(|&index| self.providers[index].clone())
            .ok_or(FxError::UnsupportedSource(source))
    }

    /// First registered provider whose base currency is `currency`.
    pub fn find_by_native_currency(&self, currency: Currency) -> Option<Arc<dyn RateProvider>> {
        self.providers
            .iter()
            .find(|provider| provider.base_currency() == currency)
            .cloned()
    }

    /// All registered sources.
    pub fn list_sources(&self) -> BTreeSet<Source> {
        self.by_source.keys().copied().collect()
    }

    /// Providers in registration order.
    pub fn providers(&self) -> &[Arc<dyn RateProvider>] {
        &self.providers
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StaticRateProvider;
    use exrate_common::QuoteConvention;

    fn provider(source: Source, base: Currency) -> Arc<dyn RateProvider> {
        Arc::new(StaticRateProvider::new(source, base, QuoteConvention::Direct))
    }

    #[test]
    fn test_get_registered_source() {
        let registry = ProviderRegistry::from_providers([
            provider(Source::Ecb, Currency::Eur),
            provider(Source::Banxico, Currency::Mxn),
        ])
        .unwrap();

        assert_eq!(registry.get(Source::Ecb).unwrap().base_currency(), Currency::Eur);
        assert_eq!(registry.get(Source::Banxico).unwrap().base_currency(), Currency::Mxn);
        assert_eq!(
            registry.list_sources().into_iter().collect::<Vec<_>>(),
            vec![Source::Ecb, Source::Banxico]
        );
    }

    #[test]
    fn test_unsupported_source() {
        let registry = ProviderRegistry::from_providers([provider(Source::Ecb, Currency::Eur)]).unwrap();

        assert!(matches!(
            registry.get(Source::Banxico),
            Err(FxError::UnsupportedSource(Source::Banxico))
        ));
    }

    #[test]
    fn test_duplicate_source_rejected() {
        let result = ProviderRegistry::from_providers([
            provider(Source::Ecb, Currency::Eur),
            provider(Source::Ecb, Currency::Usd),
        ]);

        assert!(matches!(result, Err(FxError::DuplicateProvider(Source::Ecb))));
    }

    #[test]
    fn test_find_by_native_currency_returns_first_registered() {
        let registry = ProviderRegistry::from_providers([
            provider(Source::Banxico, Currency::Usd),
            provider(Source::Ecb, Currency::Usd),
        ])
        .unwrap();

        let found = registry.find_by_native_currency(Currency::Usd).unwrap();
        assert_eq!(found.source(), Source::Banxico);
        assert!(registry.find_by_native_currency(Currency::Jpy).is_none());
    }
}
