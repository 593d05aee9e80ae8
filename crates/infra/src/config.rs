//! Process configuration read from environment variables.
//!
//! Every setting has a default; a variable that is present but malformed is an
//! error rather than silently falling back.

use std::str::FromStr;

use thiserror::Error;

use restock_ai::{AdditiveModelConfig, SeasonalityMode};
use restock_replenishment::ReorderPolicy;

use crate::engine::{FailurePolicy, ForecastSettings};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set when USE_PERSISTENT_STORES=true")]
    Missing(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestockConfig {
    pub bind_addr: String,
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
    pub max_db_connections: u32,
    pub reorder: ReorderPolicy,
    pub forecast: ForecastSettings,
    pub model: AdditiveModelConfig,
}

impl Default for RestockConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            use_persistent_stores: false,
            database_url: None,
            max_db_connections: 5,
            reorder: ReorderPolicy::default(),
            forecast: ForecastSettings::default(),
            model: AdditiveModelConfig::default(),
        }
    }
}

impl RestockConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(lookup);
        let d = Self::default();

        let use_persistent_stores =
            env.parse_with("USE_PERSISTENT_STORES", d.use_persistent_stores, parse_bool)?;
        let database_url = env.get("DATABASE_URL");
        if use_persistent_stores && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let reorder = ReorderPolicy {
            safety_stock_pct: env.parse("SAFETY_STOCK_PCT", d.reorder.safety_stock_pct)?,
            reference_window_days: env
                .parse("REFERENCE_WINDOW_DAYS", d.reorder.reference_window_days)?,
            default_validity_days: env
                .parse("RECOMMENDATION_VALIDITY_DAYS", d.reorder.default_validity_days)?,
        };
        reorder
            .validate()
            .map_err(|e| invalid("SAFETY_STOCK_PCT/REFERENCE_WINDOW_DAYS", "", e))?;

        let forecast = ForecastSettings {
            default_horizon_days: env
                .parse("FORECAST_DEFAULT_HORIZON_DAYS", d.forecast.default_horizon_days)?,
            max_horizon_days: env.parse("FORECAST_MAX_HORIZON_DAYS", d.forecast.max_horizon_days)?,
            min_history: env.parse("FORECAST_MIN_HISTORY", d.forecast.min_history)?,
            failure_policy: env
                .parse::<FailurePolicy>("FORECAST_FAILURE_POLICY", d.forecast.failure_policy)?,
        };
        forecast
            .validate()
            .map_err(|e| invalid("FORECAST_*", "", e))?;

        let model = AdditiveModelConfig::default()
            .with_interval_width(env.parse("FORECAST_INTERVAL_WIDTH", d.model.interval_width)?)
            .with_daily_seasonality(env.parse_with(
                "FORECAST_DAILY_SEASONALITY",
                d.model.daily_seasonality,
                parse_seasonality,
            )?)
            .with_weekly_seasonality(env.parse_with(
                "FORECAST_WEEKLY_SEASONALITY",
                d.model.weekly_seasonality,
                parse_seasonality,
            )?)
            .with_yearly_seasonality(env.parse_with(
                "FORECAST_YEARLY_SEASONALITY",
                d.model.yearly_seasonality,
                parse_seasonality,
            )?);
        model
            .validate()
            .map_err(|e| invalid("FORECAST_INTERVAL_WIDTH", "", e))?;

        Ok(Self {
            bind_addr: env.get("BIND_ADDR").unwrap_or(d.bind_addr),
            use_persistent_stores,
            database_url,
            max_db_connections: env.parse("DATABASE_MAX_CONNECTIONS", d.max_db_connections)?,
            reorder,
            forecast,
            model,
        })
    }
}

struct Lookup<F>(F);

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn parse<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.parse_with(key, default, |raw| raw.trim().parse::<T>().map_err(|e| e.to_string()))
    }

    fn parse_with<T>(
        &self,
        key: &'static str,
        default: T,
        parse: impl Fn(&str) -> Result<T, String>,
    ) -> Result<T, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => parse(&raw).map_err(|reason| ConfigError::Invalid {
                key,
                value: raw,
                reason,
            }),
        }
    }
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("expected a boolean, got '{other}'")),
    }
}

/// `auto` or a boolean.
fn parse_seasonality(raw: &str) -> Result<SeasonalityMode, String> {
    if raw.trim().eq_ignore_ascii_case("auto") {
        return Ok(SeasonalityMode::Auto);
    }
    parse_bool(raw)
        .map(|on| {
            if on {
                SeasonalityMode::Enabled
            } else {
                SeasonalityMode::Disabled
            }
        })
        .map_err(|_| format!("expected auto or a boolean, got '{}'", raw.trim()))
}

fn invalid(key: &'static str, value: &str, err: impl std::fmt::Display) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: err.to_string(),
    }
}
