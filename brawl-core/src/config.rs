//! Engine configuration.

use crate::dice::Dice;
use crate::effects::ApplyPolicy;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Errors from reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Deployment environment the process runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Local,
    Development,
    Qa,
    #[default]
    Production,
}

impl Environment {
    pub fn name(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Development => "development",
            Environment::Qa => "qa",
            Environment::Production => "production",
        }
    }

    /// Parse an environment name. Anything unrecognized is treated as
    /// production.
    pub fn parse_lenient(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "local" => Environment::Local,
            "development" | "dev" => Environment::Development,
            "qa" => Environment::Qa,
            "production" | "prod" => Environment::Production,
            other => {
                tracing::warn!(environment = other, "unknown environment, assuming production");
                Environment::Production
            }
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Runtime settings for the game service.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub environment: Environment,
    /// Root directory of the JSON file store.
    pub data_dir: PathBuf,
    /// Fixed dice seed; entropy when unset.
    pub dice_seed: Option<u64>,
    /// How repeated status effects combine.
    pub apply_policy: ApplyPolicy,
    /// Health of a newly created player.
    pub starting_health: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            data_dir: PathBuf::from("./data"),
            dice_seed: None,
            apply_policy: ApplyPolicy::default(),
            starting_health: 100,
        }
    }
}

impl EngineConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `BRAWL_ENV` - local, development, qa or production (default: production)
    /// - `BRAWL_DATA_DIR` - Root of the JSON file store (default: ./data)
    /// - `BRAWL_DICE_SEED` - Fixed dice seed (default: OS entropy)
    /// - `BRAWL_APPLY_POLICY` - independent, refresh or stack (default: independent)
    /// - `BRAWL_STARTING_HEALTH` - Health of new players (default: 100)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with a custom variable source.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        match lookup("BRAWL_ENV") {
            Some(name) => config.environment = Environment::parse_lenient(&name),
            None => tracing::warn!("BRAWL_ENV not set, assuming production"),
        }

        if let Some(dir) = lookup("BRAWL_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        config.dice_seed = parse_var(&lookup, "BRAWL_DICE_SEED")?;

        if let Some(raw) = lookup("BRAWL_APPLY_POLICY") {
            config.apply_policy = raw.parse().map_err(|e: crate::error::CombatError| ConfigError::Invalid {
                key: "BRAWL_APPLY_POLICY",
                value: raw.clone(),
                reason: e.to_string(),
            })?;
        }

        if let Some(health) = parse_var::<i64>(&lookup, "BRAWL_STARTING_HEALTH")? {
            if health <= 0 {
                return Err(ConfigError::Invalid {
                    key: "BRAWL_STARTING_HEALTH",
                    value: health.to_string(),
                    reason: "must be positive".to_string(),
                });
            }
            config.starting_health = health;
        }

        Ok(config)
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_dice_seed(mut self, seed: u64) -> Self {
        self.dice_seed = Some(seed);
        self
    }

    pub fn with_apply_policy(mut self, policy: ApplyPolicy) -> Self {
        self.apply_policy = policy;
        self
    }

    pub fn with_starting_health(mut self, health: i64) -> Self {
        self.starting_health = health;
        self
    }

    /// Build the process-wide dice.
    pub fn dice(&self) -> Dice {
        match self.dice_seed {
            Some(seed) => Dice::seeded(seed),
            None => Dice::from_entropy(),
        }
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.dice_seed, None);
        assert_eq!(config.apply_policy, ApplyPolicy::Independent);
        assert_eq!(config.starting_health, 100);
    }

    #[test]
    fn test_reads_all_variables() {
        let config = EngineConfig::from_vars(vars(&[
            ("BRAWL_ENV", "QA"),
            ("BRAWL_DATA_DIR", "/srv/brawl"),
            ("BRAWL_DICE_SEED", "42"),
            ("BRAWL_APPLY_POLICY", "stack"),
            ("BRAWL_STARTING_HEALTH", "150"),
        ]))
        .unwrap();

        assert_eq!(config.environment, Environment::Qa);
        assert_eq!(config.data_dir, PathBuf::from("/srv/brawl"));
        assert_eq!(config.dice_seed, Some(42));
        assert_eq!(config.apply_policy, ApplyPolicy::Stack);
        assert_eq!(config.starting_health, 150);
    }

    #[test]
    fn test_unknown_environment_is_production() {
        let config = EngineConfig::from_vars(vars(&[("BRAWL_ENV", "staging")])).unwrap();
        assert_eq!(config.environment, Environment::Production);
    }

    #[test]
    fn test_invalid_values() {
        for (key, value) in [
            ("BRAWL_DICE_SEED", "abc"),
            ("BRAWL_APPLY_POLICY", "merge"),
            ("BRAWL_STARTING_HEALTH", "0"),
            ("BRAWL_STARTING_HEALTH", "lots"),
        ] {
            let err = EngineConfig::from_vars(vars(&[(key, value)])).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { key: k, .. } if k == key));
        }
    }

    #[test]
    fn test_seeded_dice_from_config() {
        use crate::dice::DiceRoller;

        let a = EngineConfig::default().with_dice_seed(9).dice();
        let b = EngineConfig::default().with_dice_seed(9).dice();
        assert_eq!(a.inclusive_roll(0, 1000), b.inclusive_roll(0, 1000));
    }
}
