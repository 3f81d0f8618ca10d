use crate::engine::{AnomalyThresholds, DecisionRules, MatchOptions, DEFAULT_CONSERVATIVE_FACTOR};
use crate::normalize::ExchangeRates;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub table_cache_capacity: usize,
    pub engine: EngineConfig,
}

/// Knobs for the pure reconciliation engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub conservative_factor: f64,
    pub decision: DecisionRules,
    pub anomaly: AnomalyThresholds,
    pub exchange_rates: ExchangeRates,
    pub matching: MatchOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            conservative_factor: DEFAULT_CONSERVATIVE_FACTOR,
            decision: DecisionRules::default(),
            anomaly: AnomalyThresholds::default(),
            exchange_rates: ExchangeRates::default(),
            matching: MatchOptions::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let table_cache_capacity = env_map
            .get("TABLE_CACHE_CAPACITY")
            .map(|s| s.as_str())
            .unwrap_or("32")
            .parse::<usize>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "TABLE_CACHE_CAPACITY".to_string(),
                    "must be a valid usize".to_string(),
                )
            })?;

        let conservative_factor =
            parse_f64(&env_map, "CONSERVATIVE_FACTOR", DEFAULT_CONSERVATIVE_FACTOR)?;
        if !(conservative_factor > 0.0 && conservative_factor <= 1.0) {
            return Err(ConfigError::InvalidValue(
                "CONSERVATIVE_FACTOR".to_string(),
                "must be in (0, 1]".to_string(),
            ));
        }

        let defaults = DecisionRules::default();
        let decision = DecisionRules {
            cpc_down_step: parse_non_negative(&env_map, "CPC_DOWN_STEP", defaults.cpc_down_step)?,
            cpc_up_step: parse_non_negative(&env_map, "CPC_UP_STEP", defaults.cpc_up_step)?,
            cpc_floor: parse_non_negative(&env_map, "CPC_FLOOR", defaults.cpc_floor)?,
            budget_multiplier: parse_non_negative(
                &env_map,
                "BUDGET_MULTIPLIER",
                defaults.budget_multiplier,
            )?,
            ..defaults
        };

        let exchange_rates = match env_map.get("EXCHANGE_RATES") {
            Some(raw) => ExchangeRates::parse(raw)
                .map_err(|e| ConfigError::InvalidValue("EXCHANGE_RATES".to_string(), e))?,
            None => ExchangeRates::default(),
        };

        let allow_positional_fallback = match env_map
            .get("ALLOW_POSITIONAL_FALLBACK")
            .map(|s| s.trim().to_ascii_lowercase())
            .as_deref()
            .unwrap_or("true")
        {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            other => {
                return Err(ConfigError::InvalidValue(
                    "ALLOW_POSITIONAL_FALLBACK".to_string(),
                    format!("must be true or false, got {}", other),
                ))
            }
        };

        Ok(Config {
            port,
            database_path,
            table_cache_capacity,
            engine: EngineConfig {
                conservative_factor,
                decision,
                anomaly: AnomalyThresholds::default(),
                exchange_rates,
                matching: MatchOptions {
                    allow_positional_fallback,
                },
            },
        })
    }
}

fn parse_f64(env_map: &HashMap<String, String>, key: &str, default: f64) -> Result<f64, ConfigError> {
    let Some(raw) = env_map.get(key) else {
        return Ok(default);
    };
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ConfigError::InvalidValue(key.to_string(), "must be a number".to_string()))
}

fn parse_non_negative(
    env_map: &HashMap<String, String>,
    key: &str,
    default: f64,
) -> Result<f64, ConfigError> {
    let v = parse_f64(env_map, key, default)?;
    if v < 0.0 {
        return Err(ConfigError::InvalidValue(
            key.to_string(),
            "must not be negative".to_string(),
        ));
    }
    Ok(v)
}
