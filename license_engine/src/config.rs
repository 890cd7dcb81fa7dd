//! Engine configuration.

use crate::currency::{ExchangeRate, DEFAULT_USD_TO_JPY};
use crate::error::EngineError;
use std::str::FromStr;

pub const ENV_USD_TO_JPY: &str = "LICENSE_ENGINE_USD_JPY_RATE";
pub const ENV_UNASSIGNED_LABEL: &str = "LICENSE_ENGINE_UNASSIGNED_LABEL";
pub const ENV_UNDERUTILIZED_THRESHOLD: &str = "LICENSE_ENGINE_UNDERUTILIZED_THRESHOLD";

/// Configuration for the cost engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Yen per US dollar (default: 150).
    pub usd_to_jpy_rate: f64,
    /// Group name for costs whose holder has no directory entry
    /// (default: "Unassigned").
    pub unassigned_label: String,
    /// Active subscriptions with a usage rate strictly below this
    /// percentage are optimisation candidates (default: 50).
    pub underutilized_threshold: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            usd_to_jpy_rate: DEFAULT_USD_TO_JPY,
            unassigned_label: "Unassigned".into(),
            underutilized_threshold: 50,
        }
    }
}

impl EngineConfig {
    /// Build a configuration from `LICENSE_ENGINE_*` environment
    /// variables, keeping defaults for the ones that are unset.
    pub fn from_env() -> Result<Self, EngineError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with an arbitrary source of
    /// values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EngineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup(ENV_USD_TO_JPY) {
            config.usd_to_jpy_rate = parse(ENV_USD_TO_JPY, &raw)?;
        }
        if let Some(label) = lookup(ENV_UNASSIGNED_LABEL) {
            config.unassigned_label = label;
        }
        if let Some(raw) = lookup(ENV_UNDERUTILIZED_THRESHOLD) {
            let threshold: u8 = parse(ENV_UNDERUTILIZED_THRESHOLD, &raw)?;
            if threshold > 100 {
                return Err(EngineError::Config {
                    key: ENV_UNDERUTILIZED_THRESHOLD.into(),
                    reason: format!("{threshold} is not a percentage"),
                });
            }
            config.underutilized_threshold = threshold;
        }
        config.exchange_rate()?;
        Ok(config)
    }

    pub fn exchange_rate(&self) -> Result<ExchangeRate, EngineError> {
        ExchangeRate::new(self.usd_to_jpy_rate)
    }
}

fn parse<T>(key: &str, raw: &str) -> Result<T, EngineError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|err: T::Err| EngineError::Config {
        key: key.into(),
        reason: err.to_string(),
    })
}
