use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::error::ConfigError;

/// Configuration for the trajectory engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryConfig {
    /// Valuation policy constants
    pub valuation: ValuationParameters,

    /// Batch execution settings
    pub batch: BatchConfig,

    /// Event emission configuration
    pub events: EventConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationParameters {
    /// Currency units of market value per point of rolling form (e.g., 5000)
    pub magic_number: f64,

    /// Weight of the previous price when smoothing
    pub smoothing_weight_old: f64,

    /// Weight of the new market value when smoothing
    pub smoothing_weight_new: f64,

    /// Qualifying games needed before a player is valued at all
    pub min_qualifying_games: usize,

    /// Trailing games in the rolling form average
    pub window_size: usize,

    /// Where rounding to whole currency units happens
    pub rounding: RoundingPolicy,
}

/// Rounding strategy for each position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingPolicy {
    /// Round once, on the smoothed price
    AtPrice,
    /// Round the market value too, before blending
    AtMarketValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Value players in parallel
    pub parallel: bool,

    /// Worker threads for parallel batches (0 = one per CPU)
    pub worker_threads: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Enable event emission
    pub enabled: bool,

    /// Minimum price change to emit a PriceUpdated event
    pub min_change: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (pretty, json, compact)
    pub format: String,
}

impl Default for ValuationParameters {
    fn default() -> Self {
        Self {
            magic_number: 5000.0,
            smoothing_weight_old: 0.75,
            smoothing_weight_new: 0.25,
            min_qualifying_games: 3,
            window_size: 3,
            rounding: RoundingPolicy::AtPrice,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { parallel: true, worker_threads: 0 }
    }
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_change: 1, // Emit on any change
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "compact".to_string() }
    }
}

impl ValuationParameters {
    /// First position at which the trailing window is full and smoothing applies
    pub fn smoothing_start(&self) -> usize {
        self.window_size.saturating_sub(1)
    }
}

impl TrajectoryConfig {
    /// Load defaults, then the optional TOML file, then `TRAJECTORY__*` environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::new(
                &path.to_string_lossy(),
                config::FileFormat::Toml,
            ));
        }

        let config: Self = builder
            .add_source(
                config::Environment::with_prefix("TRAJECTORY").separator("__").try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject parameter sets the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let v = &self.valuation;

        if v.window_size == 0 {
            return Err(ConfigError::Invalid("window_size must be at least 1".to_string()));
        }
        if v.min_qualifying_games < v.window_size {
            return Err(ConfigError::Invalid(format!(
                "min_qualifying_games ({}) must be at least window_size ({})",
                v.min_qualifying_games, v.window_size
            )));
        }
        for (name, value) in [
            ("magic_number", v.magic_number),
            ("smoothing_weight_old", v.smoothing_weight_old),
            ("smoothing_weight_new", v.smoothing_weight_new),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }

        let weight_sum = v.smoothing_weight_old + v.smoothing_weight_new;
        if (weight_sum - 1.0).abs() > 1e-9 {
            warn!("Smoothing weights sum to {weight_sum}, prices will drift from market value");
        }

        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
