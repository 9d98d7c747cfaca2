// qbtc-core/src/config.rs
// QBTC - Configuration Engine
// Defaults < optional config.{toml,json,..} < QBTC_* environment

use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use config::builder::DefaultState;
use qbtc_common::{DurationWindow, Position};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::bigbang::BigBangConfig;
use crate::leverage::{LeverageConfig, TierProfile, TierRegistry};

#[derive(Debug, Deserialize, Clone)]
pub struct BigBang {
    pub coherence_threshold: f64,
    pub quantum_threshold: f64,
    pub leverage_multiplier: f64,
    pub risk_multiplier: f64,
    pub max_leverage: f64,
    pub base_duration_secs: u64,
    pub min_duration_secs: u64,
    pub max_duration_secs: u64,
    pub history_capacity: usize,
    pub poll_interval_ms: u64,
    pub execution_timeout_ms: u64,
    pub execution_retries: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Leverage {
    pub max_leverage: f64,
    pub base_risk_per_trade: f64,
    pub max_risk_per_trade: f64,
    pub max_scale_factor: f64,
    #[serde(default)]
    pub tiers: HashMap<String, TierProfile>,
    /// symbol -> tier name
    #[serde(default)]
    pub symbols: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Server {
    pub enabled: bool,
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Paper,
    Http,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Execution {
    pub mode: ExecutionMode,
    pub endpoint: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Archive {
    pub enabled: bool,
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub bigbang: BigBang,
    pub leverage: Leverage,
    pub server: Server,
    pub execution: Execution,
    pub archive: Archive,
    /// Seed positions for the paper book
    #[serde(default)]
    pub positions: Vec<Position>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let builder = Self::defaults()?
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("QBTC")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        Self::finish(builder)
    }

    /// Defaults overlaid with an in-memory TOML document.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let builder = Self::defaults()?.add_source(File::from_str(toml, FileFormat::Toml));
        Self::finish(builder)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("bigbang.coherence_threshold", 0.92)?
            .set_default("bigbang.quantum_threshold", 0.97)?
            .set_default("bigbang.leverage_multiplier", 1.5)?
            .set_default("bigbang.risk_multiplier", 2.0)?
            .set_default("bigbang.max_leverage", 20.0)?
            .set_default("bigbang.base_duration_secs", 510)?
            .set_default("bigbang.min_duration_secs", 300)?
            .set_default("bigbang.max_duration_secs", 900)?
            .set_default("bigbang.history_capacity", 1000)?
            .set_default("bigbang.poll_interval_ms", 1000)?
            .set_default("bigbang.execution_timeout_ms", 5000)?
            .set_default("bigbang.execution_retries", 1)?
            .set_default("leverage.max_leverage", 20.0)?
            .set_default("leverage.base_risk_per_trade", 0.01)?
            .set_default("leverage.max_risk_per_trade", 0.05)?
            .set_default("leverage.max_scale_factor", 2.0)?
            .set_default("server.enabled", true)?
            .set_default("server.bind", "127.0.0.1:8099")?
            .set_default("execution.mode", "paper")?
            .set_default("execution.endpoint", "http://localhost:14503")?
            .set_default("archive.enabled", false)?
            .set_default("archive.url", "sqlite:data/bigbang.db?mode=rwc")
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.bigbang;
        let unit = |v: f64| v > 0.0 && v < 1.0;

        if !unit(b.coherence_threshold) || !unit(b.quantum_threshold) {
            return Err(invalid("bigbang thresholds must lie in (0, 1)"));
        }
        if !(b.min_duration_secs <= b.base_duration_secs && b.base_duration_secs <= b.max_duration_secs) {
            return Err(invalid(
                "bigbang durations must satisfy min <= base <= max",
            ));
        }
        if b.leverage_multiplier < 1.0 || b.risk_multiplier < 1.0 {
            return Err(invalid("bigbang multipliers must be >= 1"));
        }
        if b.max_leverage < 1.0 || self.leverage.max_leverage < 1.0 {
            return Err(invalid("max_leverage must be >= 1"));
        }
        if b.history_capacity == 0 {
            return Err(invalid("bigbang.history_capacity must be > 0"));
        }

        let l = &self.leverage;
        if !(l.max_risk_per_trade > 0.0 && l.max_risk_per_trade <= 1.0) {
            return Err(invalid("leverage.max_risk_per_trade must lie in (0, 1]"));
        }
        if l.base_risk_per_trade <= 0.0 || l.base_risk_per_trade > l.max_risk_per_trade {
            return Err(invalid(
                "leverage.base_risk_per_trade must lie in (0, max_risk_per_trade]",
            ));
        }
        if l.max_scale_factor < 1.0 {
            return Err(invalid("leverage.max_scale_factor must be >= 1"));
        }
        for (name, tier) in &l.tiers {
            if tier.entropy_sensitivity <= 0.0 || tier.base_leverage < 1.0 {
                return Err(invalid(&format!(
                    "tier '{}' needs entropy_sensitivity > 0 and base_leverage >= 1",
                    name
                )));
            }
        }
        Ok(())
    }

    pub fn bigbang_config(&self) -> BigBangConfig {
        let b = &self.bigbang;
        BigBangConfig {
            coherence_threshold: b.coherence_threshold,
            quantum_threshold: b.quantum_threshold,
            leverage_multiplier: b.leverage_multiplier,
            risk_multiplier: b.risk_multiplier,
            max_leverage: b.max_leverage,
            duration: DurationWindow {
                base_ms: b.base_duration_secs * 1000,
                min_ms: b.min_duration_secs * 1000,
                max_ms: b.max_duration_secs * 1000,
                coherence_pivot: b.coherence_threshold,
            },
            history_capacity: b.history_capacity,
            execution_timeout: Duration::from_millis(b.execution_timeout_ms),
            execution_retries: b.execution_retries,
        }
    }

    pub fn leverage_config(&self) -> LeverageConfig {
        LeverageConfig {
            max_leverage: self.leverage.max_leverage,
            base_risk_per_trade: self.leverage.base_risk_per_trade,
            max_risk_per_trade: self.leverage.max_risk_per_trade,
            max_scale_factor: self.leverage.max_scale_factor,
        }
    }

    pub fn tier_registry(&self) -> TierRegistry {
        TierRegistry::with_overrides(self.leverage.tiers.clone(), self.leverage.symbols.clone())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.bigbang.poll_interval_ms)
    }

    pub fn execution_timeout(&self) -> Duration {
        Duration::from_millis(self.bigbang.execution_timeout_ms)
    }
}

fn invalid(msg: &str) -> ConfigError {
    ConfigError::Message(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_match_engine_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings.bigbang_config(), BigBangConfig::default());
        assert_eq!(settings.leverage_config(), LeverageConfig::default());
        assert_eq!(settings.execution.mode, ExecutionMode::Paper);
        assert!(!settings.archive.enabled);
        assert!(settings.positions.is_empty());
    }

    #[test]
    fn test_file_overrides_and_positions() {
        let settings = Settings::from_toml(
            r#"
            [bigbang]
            coherence_threshold = 0.9
            history_capacity = 50

            [execution]
            mode = "http"
            endpoint = "http://orders.internal:9000"

            [leverage.tiers.meme]
            base_leverage = 2.0
            leverage_multiplier = 1.05
            risk_multiplier = 0.5
            min_coherence = 0.9
            entropy_sensitivity = 0.4

            [leverage.symbols]
            WIFUSDT = "meme"

            [[positions]]
            symbol = "BTCUSDT"
            leverage = 10.0
            size = 0.25
            "#,
        )
        .unwrap();

        let bb = settings.bigbang_config();
        assert_eq!(bb.coherence_threshold, 0.9);
        assert_eq!(bb.duration.coherence_pivot, 0.9);
        assert_eq!(bb.history_capacity, 50);
        assert_eq!(settings.execution.mode, ExecutionMode::Http);

        let registry = settings.tier_registry();
        let (name, profile) = registry.resolve("WIFUSDT");
        assert_eq!(name, "meme");
        assert_eq!(profile.min_coherence, 0.9);

        assert_eq!(settings.positions.len(), 1);
        assert_eq!(settings.positions[0].size, dec!(0.25));
    }

    #[test]
    fn test_invalid_window_is_rejected() {
        let err = Settings::from_toml(
            r#"
            [bigbang]
            min_duration_secs = 600
            base_duration_secs = 510
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("min <= base <= max"));
    }

    #[test]
    fn test_environment_overrides_defaults() {
        std::env::set_var("QBTC_BIGBANG__HISTORY_CAPACITY", "77");
        std::env::set_var("QBTC_SERVER__BIND", "0.0.0.0:9100");
        let settings = Settings::new();
        std::env::remove_var("QBTC_BIGBANG__HISTORY_CAPACITY");
        std::env::remove_var("QBTC_SERVER__BIND");

        let settings = settings.unwrap();
        assert_eq!(settings.bigbang.history_capacity, 77);
        assert_eq!(settings.bigbang_config().history_capacity, 77);
        assert_eq!(settings.server.bind, "0.0.0.0:9100");
        // untouched keys keep their defaults
        assert_eq!(settings.bigbang.coherence_threshold, 0.92);
    }

    #[test]
    fn test_threshold_out_of_range_is_rejected() {
        assert!(Settings::from_toml("[bigbang]\nquantum_threshold = 1.2").is_err());
    }
}
