//! Subcommand handlers. Each returns a serializable report for stdout.

use chrono::NaiveDate;
use exrate_common::{Currency, Frequency, QuoteConvention, Source};
use exrate_fx::{FxError, RateProvider, RateResolver};
use rust_decimal::Decimal;
use serde::Serialize;

/// Result of a `resolve` request.
#[derive(Debug, Clone, Serialize)]
pub struct ResolveReport {
    pub from: String,
    pub to: String,
    pub date: NaiveDate,
    pub source: Source,
    pub frequency: Frequency,
    pub rate: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converted: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
}

impl ResolveReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a `backfill` request.
#[derive(Debug, Clone, Serialize)]
pub struct BackfillReport {
    pub source: Source,
    pub frequency: Frequency,
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    /// Whether running the same backfill again may succeed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

impl BackfillReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// One registered provider.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderReport {
    pub source: Source,
    pub base_currency: Currency,
    pub quote_convention: QuoteConvention,
    pub frequencies: Vec<Frequency>,
}

impl ProviderReport {
    fn describe(provider: &dyn RateProvider) -> Self {
        Self {
            source: provider.source(),
            base_currency: provider.base_currency(),
            quote_convention: provider.quote_convention(),
            frequencies: provider.supported_frequencies().to_vec(),
        }
    }
}

/// Arguments of a `resolve` request.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub from: String,
    pub to: String,
    pub date: NaiveDate,
    pub source: Source,
    pub frequency: Frequency,
    pub amount: Option<Decimal>,
}

/// Resolve a rate. Resolution errors and missing rates are reported in the
/// body rather than returned.
pub async fn resolve(resolver: &RateResolver, request: ResolveRequest) -> ResolveReport {
    let outcome = resolver
        .resolve(
            &request.from,
            &request.to,
            request.date,
            request.source,
            request.frequency,
        )
        .await;

    let (rate, mut error, mut error_code) = match outcome {
        Ok(Some(rate)) => (Some(rate), None, None),
        Ok(None) => (
            None,
            Some(format!(
                "No {} rate for {}->{} on {} from {}",
                request.frequency, request.from, request.to, request.date, request.source
            )),
            Some("RATE_NOT_FOUND"),
        ),
        Err(e) => (None, Some(e.to_string()), Some(e.error_code())),
    };

    let mut converted = None;
    if let (Some(amount), Some(rate)) = (request.amount, rate) {
        match amount.checked_mul(rate) {
            Some(value) => converted = Some(value),
            None => {
                let e = FxError::ArithmeticOverflow(format!("{} at rate {}", amount, rate));
                error = Some(e.to_string());
                error_code = Some(e.error_code());
            }
        }
    }

    ResolveReport {
        from: request.from.trim().to_uppercase(),
        to: request.to.trim().to_uppercase(),
        date: request.date,
        source: request.source,
        frequency: request.frequency,
        converted,
        amount: request.amount,
        rate,
        error,
        error_code,
    }
}

/// Backfill `[from, to]` and report how many observations were cached.
/// Failures are reported in the body.
pub async fn backfill(
    resolver: &RateResolver,
    source: Source,
    frequency: Frequency,
    from: NaiveDate,
    to: NaiveDate,
) -> BackfillReport {
    let mut report = BackfillReport {
        source,
        frequency,
        from,
        to,
        cached: None,
        error: None,
        error_code: None,
        retryable: None,
    };

    match resolver.backfill(source, frequency, from, to).await {
        Ok(cached) => report.cached = Some(cached),
        Err(e) => {
            report.error_code = Some(e.error_code());
            report.retryable = Some(e.is_retryable());
            report.error = Some(e.to_string());
        }
    }

    report
}

/// Describe registered providers, or only the first one quoting natively in
/// `currency`.
pub fn providers(resolver: &RateResolver, currency: Option<Currency>) -> Vec<ProviderReport> {
    let registry = resolver.registry();
    match currency {
        Some(currency) => registry
            .find_by_native_currency(currency)
            .map(|provider| ProviderReport::describe(provider.as_ref()))
            .into_iter()
            .collect(),
        None => registry
            .providers()
            .iter()
            .map(|provider| ProviderReport::describe(provider.as_ref()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use exrate_common::FixedClock;
    use exrate_fx::ResolverConfig;
    use rust_decimal_macros::dec;

    use crate::fixture::Fixture;

    const SAMPLE: &str = include_str!("../fixtures/sample.json");

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    async fn resolver() -> RateResolver {
        Fixture::parse(SAMPLE)
            .unwrap()
            .into_resolver(ResolverConfig::default())
            .await
            .unwrap()
            .with_clock(Arc::new(FixedClock(date(6, 1))))
    }

    fn request(from: &str, to: &str, source: Source) -> ResolveRequest {
        ResolveRequest {
            from: from.to_string(),
            to: to.to_string(),
            date: date(3, 15),
            source,
            frequency: Frequency::Daily,
            amount: None,
        }
    }

    #[tokio::test]
    async fn test_resolve_reports_rate() {
        let resolver = resolver().await;

        let report = resolve(&resolver, request("eur", "usd", Source::Ecb)).await;

        assert!(report.is_success());
        assert_eq!(report.from, "EUR");
        assert_eq!(report.rate, Some(dec!(1.0887)));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["source"], "ECB");
        assert_eq!(json["frequency"], "daily");
        assert_eq!(json["date"], "2024-03-15");
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn test_resolve_through_peg_and_other_source() {
        let resolver = resolver().await;

        let report = resolve(&resolver, request("USD", "MXN", Source::Banxico)).await;
        assert_eq!(report.rate, Some(dec!(16.7473)));

        // AED is pegged to USD.
        let report = resolve(&resolver, request("AED", "MXN", Source::Banxico)).await;
        assert_eq!(report.rate, Some(dec!(0.272294) * dec!(16.7473)));
    }

    #[tokio::test]
    async fn test_resolve_with_amount() {
        let resolver = resolver().await;
        let mut req = request("USD", "MXN", Source::Banxico);
        req.amount = Some(dec!(100));

        let report = resolve(&resolver, req).await;

        assert_eq!(report.converted, Some(dec!(1674.73)));
    }

    #[tokio::test]
    async fn test_resolve_reports_conversion_overflow() {
        let resolver = resolver().await;
        let mut req = request("USD", "MXN", Source::Banxico);
        req.amount = Some(Decimal::MAX);

        let report = resolve(&resolver, req).await;

        assert!(!report.is_success());
        assert_eq!(report.rate, Some(dec!(16.7473)));
        assert!(report.converted.is_none());
        assert_eq!(report.error_code, Some("ARITHMETIC_OVERFLOW"));
    }

    #[tokio::test]
    async fn test_resolve_reports_missing_rate() {
        let resolver = resolver().await;
        let mut req = request("USD", "EUR", Source::Ecb);
        req.date = date(1, 10);

        let report = resolve(&resolver, req).await;

        assert!(!report.is_success());
        assert_eq!(report.error_code, Some("RATE_NOT_FOUND"));
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["rate"].is_null());
    }

    #[tokio::test]
    async fn test_resolve_reports_invalid_currency() {
        let resolver = resolver().await;

        let report = resolve(&resolver, request("ZZZ", "EUR", Source::Ecb)).await;

        assert_eq!(report.error_code, Some("INVALID_CURRENCY"));
    }

    #[tokio::test]
    async fn test_backfill_report() {
        let resolver = resolver().await;

        let report = backfill(&resolver, Source::Ecb, Frequency::Daily, date(3, 1), date(3, 31)).await;

        assert!(report.is_success());
        assert_eq!(report.cached, Some(6));
        assert_eq!(
            resolver.cache().get_min_date(Source::Ecb, Frequency::Daily),
            Some(date(3, 1))
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["cached"], 6);
        assert!(json.get("retryable").is_none());
    }

    #[tokio::test]
    async fn test_backfill_reports_failure() {
        let resolver = resolver().await;

        let reversed = backfill(&resolver, Source::Ecb, Frequency::Daily, date(3, 31), date(3, 1)).await;
        assert!(!reversed.is_success());
        assert_eq!(reversed.error_code, Some("CONFIGURATION_ERROR"));
        assert_eq!(reversed.retryable, Some(false));
        assert!(reversed.cached.is_none());

        let weekly = backfill(&resolver, Source::Banxico, Frequency::Weekly, date(3, 1), date(3, 31)).await;
        assert_eq!(weekly.error_code, Some("UNSUPPORTED_FREQUENCY"));
        assert_eq!(weekly.retryable, Some(false));
        assert!(resolver
            .cache()
            .get_min_date(Source::Banxico, Frequency::Weekly)
            .is_none());
    }

    #[tokio::test]
    async fn test_providers_listing() {
        let resolver = resolver().await;

        let all = providers(&resolver, None);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].frequencies, vec![Frequency::Daily, Frequency::Monthly]);

        let mxn = providers(&resolver, Some(Currency::Mxn));
        assert_eq!(mxn.len(), 1);
        assert_eq!(mxn[0].source, Source::Banxico);

        assert!(providers(&resolver, Some(Currency::Jpy)).is_empty());
    }
}
