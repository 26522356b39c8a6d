//! ExRate resolution engine
//!
//! Resolves the conversion rate between two currencies on a given date
//! against a chosen rate source.
//!
//! # Features
//!
//! - Pegged currencies resolved through their anchor currency
//! - Cross-rates through the provider's base currency
//! - Cache, store and month-window provider fetches, in that order
//! - Day-by-day lookback bounded by the backfill watermark
//!
//! # Example
//!
//! ```rust,ignore
//! use exrate_fx::{RateResolver, ResolverConfig, ProviderRegistry, RateCache, InMemoryRateStore};
//! use exrate_common::{Frequency, Source};
//!
//! let resolver = RateResolver::new(registry, store, Arc::new(RateCache::new()), ResolverConfig::default());
//! resolver.reload_pegs().await?;
//!
//! let rate = resolver.resolve("USD", "EUR", date, Source::Ecb, Frequency::Daily).await?;
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod pegs;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod store;

pub use cache::{CacheStats, RateCache, SharedRateCache};
pub use config::ResolverConfig;
pub use error::{FxError, FxResult};
pub use fetch::RateFetchCoordinator;
pub use pegs::PegTable;
pub use provider::{RateProvider, StaticRateProvider};
pub use registry::ProviderRegistry;
pub use resolver::RateResolver;
pub use store::{InMemoryRateStore, RateStore};
