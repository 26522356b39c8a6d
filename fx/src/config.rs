//! Resolver configuration.

use exrate_common::time::constants::{DEFAULT_LOOKBACK_DAYS, MONTHLY_LOOKBACK_DAYS};
use exrate_common::Frequency;
use serde::{Deserialize, Serialize};

/// Upper bound accepted for the lookback windows (roughly ten years).
const MAX_LOOKBACK_DAYS: i64 = 3660;

/// Configuration for the rate resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Days to look back when no backfill watermark exists (non-monthly series).
    pub default_lookback_days: i64,
    /// Days to look back when no backfill watermark exists (monthly series).
    pub monthly_lookback_days: i64,
    /// Maximum recursion depth across peg chains and cross-rates.
    pub max_resolution_depth: usize,
    /// Evaluate both legs of a cross-rate concurrently.
    pub concurrent_cross_rates: bool,
    /// Also fetch the current month when the requested date is in a later month.
    pub fetch_current_month_for_future_dates: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_lookback_days: DEFAULT_LOOKBACK_DAYS,
            monthly_lookback_days: MONTHLY_LOOKBACK_DAYS,
            max_resolution_depth: 16,
            concurrent_cross_rates: true,
            fetch_current_month_for_future_dates: true,
        }
    }
}

impl ResolverConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(days) = std::env::var("EXRATE_DEFAULT_LOOKBACK_DAYS") {
            if let Ok(days) = days.parse() {
                config.default_lookback_days = days;
            }
        }

        if let Ok(days) = std::env::var("EXRATE_MONTHLY_LOOKBACK_DAYS") {
            if let Ok(days) = days.parse() {
                config.monthly_lookback_days = days;
            }
        }

        if let Ok(depth) = std::env::var("EXRATE_MAX_RESOLUTION_DEPTH") {
            if let Ok(depth) = depth.parse() {
                config.max_resolution_depth = depth;
            }
        }

        if let Ok(flag) = std::env::var("EXRATE_CONCURRENT_CROSS_RATES") {
            config.concurrent_cross_rates = parse_flag(&flag);
        }

        if let Ok(flag) = std::env::var("EXRATE_FETCH_CURRENT_MONTH") {
            config.fetch_current_month_for_future_dates = parse_flag(&flag);
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        for (name, days) in [
            ("default_lookback_days", self.default_lookback_days),
            ("monthly_lookback_days", self.monthly_lookback_days),
        ] {
            if !(0..=MAX_LOOKBACK_DAYS).contains(&days) {
                return Err(format!(
                    "{} must be between 0 and {}, got {}",
                    name, MAX_LOOKBACK_DAYS, days
                ));
            }
        }

        if self.max_resolution_depth == 0 {
            return Err("max_resolution_depth must be at least 1".to_string());
        }

        Ok(())
    }

    /// Lookback window used when no backfill watermark is recorded.
    pub fn lookback_days(&self, frequency: Frequency) -> i64 {
        match frequency {
            Frequency::Monthly => self.monthly_lookback_days,
            _ => self.default_lookback_days,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
