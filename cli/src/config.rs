//! CLI configuration.

use std::path::PathBuf;

use exrate_fx::ResolverConfig;

/// Configuration for the `exrate` binary.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Emit logs as JSON lines.
    pub log_json: bool,
    /// Fixture file to load providers and pegs from.
    pub fixture_path: Option<PathBuf>,
    /// Resolver settings.
    pub resolver: ResolverConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_json: false,
            fixture_path: None,
            resolver: ResolverConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.log_level = level;
        }

        if let Ok(flag) = std::env::var("EXRATE_LOG_JSON") {
            config.log_json = parse_flag(&flag);
        }

        if let Ok(path) = std::env::var("EXRATE_FIXTURE") {
            config.fixture_path = Some(PathBuf::from(path));
        }

        config.resolver = ResolverConfig::from_env();
        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.log_level.trim().is_empty() {
            return Err("log_level must not be empty".to_string());
        }

        if self.fixture_path.is_none() {
            return Err("a fixture is required (--fixture or EXRATE_FIXTURE)".to_string());
        }

        self.resolver.validate()
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
