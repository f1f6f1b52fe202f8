//! Runtime configuration.
//!
//! Loaded from environment variables (and a `.env` file when present) with
//! defaults matching the attendance policy.

use std::env;
use std::str::FromStr;

use anyhow::{bail, Context};

use crate::roster::{RosterSizePolicy, DEFAULT_ROSTER_MAX, DEFAULT_ROSTER_MIN};
use crate::stats::MINIMUM_ATTENDANCE_THRESHOLD;

pub const DEFAULT_RECENT_LIMIT: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Smallest generated roster
    pub roster_min: usize,
    /// Largest generated roster
    pub roster_max: usize,
    /// Overall percentage below which a student is at risk
    pub minimum_threshold: f64,
    /// Number of recent sessions shown on the dashboard
    pub recent_limit: usize,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            roster_min: DEFAULT_ROSTER_MIN,
            roster_max: DEFAULT_ROSTER_MAX,
            minimum_threshold: MINIMUM_ATTENDANCE_THRESHOLD,
            recent_limit: DEFAULT_RECENT_LIMIT,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            roster_min: parse_or(&lookup, "ATTENDANCE_ROSTER_MIN", defaults.roster_min)?,
            roster_max: parse_or(&lookup, "ATTENDANCE_ROSTER_MAX", defaults.roster_max)?,
            minimum_threshold: parse_or(
                &lookup,
                "ATTENDANCE_MIN_THRESHOLD",
                defaults.minimum_threshold,
            )?,
            recent_limit: parse_or(&lookup, "ATTENDANCE_RECENT_LIMIT", defaults.recent_limit)?,
            log_level: lookup("ATTENDANCE_LOG_LEVEL").unwrap_or(defaults.log_level),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.roster_policy()
            .validate()
            .context("ATTENDANCE_ROSTER_MIN/ATTENDANCE_ROSTER_MAX")?;
        if !(0.0..=100.0).contains(&self.minimum_threshold) {
            bail!(
                "minimum threshold must be between 0 and 100, got {}",
                self.minimum_threshold
            );
        }
        Ok(())
    }

    /// Apply a command-line threshold override, checked like the env value.
    pub fn with_threshold(mut self, threshold: Option<f64>) -> anyhow::Result<Self> {
        if let Some(threshold) = threshold {
            self.minimum_threshold = threshold;
            self.validate().context("--threshold")?;
        }
        Ok(self)
    }

    pub fn roster_policy(&self) -> RosterSizePolicy {
        RosterSizePolicy::Random {
            min: self.roster_min,
            max: self.roster_max,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid {key} value '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.roster_policy(), RosterSizePolicy::Random { min: 30, max: 40 });
        assert_eq!(config.minimum_threshold, 75.0);
        assert_eq!(config.recent_limit, 8);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("ATTENDANCE_ROSTER_MIN", "10"),
            ("ATTENDANCE_ROSTER_MAX", " 12 "),
            ("ATTENDANCE_MIN_THRESHOLD", "80.5"),
            ("ATTENDANCE_LOG_LEVEL", "debug"),
        ]))
        .unwrap();
        assert_eq!(config.roster_policy(), RosterSizePolicy::Random { min: 10, max: 12 });
        assert_eq!(config.minimum_threshold, 80.5);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_invalid_values() {
        assert!(Config::from_lookup(lookup_from(&[("ATTENDANCE_ROSTER_MIN", "many")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("ATTENDANCE_ROSTER_MIN", "50")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("ATTENDANCE_MIN_THRESHOLD", "120")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("ATTENDANCE_MIN_THRESHOLD", "NaN")])).is_err());
    }

    #[test]
    fn test_threshold_override() {
        let config = Config::default().with_threshold(Some(82.5)).unwrap();
        assert_eq!(config.minimum_threshold, 82.5);

        let config = Config::default().with_threshold(None).unwrap();
        assert_eq!(config.minimum_threshold, 75.0);

        for bad in [150.0, -5.0, f64::NAN, f64::INFINITY] {
            let err = Config::default().with_threshold(Some(bad)).unwrap_err();
            let message = format!("{err:#}");
            assert!(message.starts_with("--threshold"), "{message}");
            assert!(message.contains("minimum threshold must be between 0 and 100"));
        }
    }
}
