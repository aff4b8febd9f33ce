//! Engine tuning loaded from RON.

use crate::errors::ConfigError;
use schema::RewardOffer;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_IMPACT_TIMEOUT_SECS: f32 = 3.0;
pub const DEFAULT_BLEED_DAMAGE_PER_STACK: u32 = 1;
pub const DEFAULT_MAX_PARTY_SIZE: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Simulated seconds to wait for an "impact" signal before applying damage anyway.
    pub impact_timeout_secs: f32,
    pub bleed_damage_per_stack: u32,
    /// Fixed seed for intent planning; `None` seeds from the OS.
    pub rng_seed: Option<u64>,
    /// Offered once, before the first player phase of a run.
    pub starting_reward: Option<RewardOffer>,
    pub max_party_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            impact_timeout_secs: DEFAULT_IMPACT_TIMEOUT_SECS,
            bleed_damage_per_stack: DEFAULT_BLEED_DAMAGE_PER_STACK,
            rng_seed: None,
            starting_reward: None,
            max_party_size: DEFAULT_MAX_PARTY_SIZE,
        }
    }
}

impl EngineConfig {
    /// Load a config from a RON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&content, &path.display().to_string())
    }

    pub fn from_ron_str(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = ron::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        checked_timeout(self.impact_timeout_secs)
            .map(|_| ())
            .ok_or(ConfigError::InvalidTimeout(self.impact_timeout_secs))
    }

    /// The impact timeout, or the default when the field was set in code to
    /// something a file would have been rejected for.
    pub fn impact_timeout(&self) -> Duration {
        checked_timeout(self.impact_timeout_secs)
            .unwrap_or_else(|| Duration::from_secs_f32(DEFAULT_IMPACT_TIMEOUT_SECS))
    }
}

fn checked_timeout(secs: f32) -> Option<Duration> {
    Duration::try_from_secs_f32(secs)
        .ok()
        .filter(|timeout| !timeout.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.impact_timeout(), Duration::from_secs(3));
        assert_eq!(config.bleed_damage_per_stack, 1);
        assert_eq!(config.rng_seed, None);
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config = EngineConfig::from_ron_str("(rng_seed: Some(7), bleed_damage_per_stack: 2)", "inline")
            .expect("config should parse");
        assert_eq!(config.rng_seed, Some(7));
        assert_eq!(config.bleed_damage_per_stack, 2);
        assert_eq!(config.impact_timeout_secs, DEFAULT_IMPACT_TIMEOUT_SECS);
        assert_eq!(config.max_party_size, DEFAULT_MAX_PARTY_SIZE);
    }

    #[test]
    fn test_rejects_non_positive_timeout() {
        let result = EngineConfig::from_ron_str("(impact_timeout_secs: 0.0)", "inline");
        assert!(matches!(result, Err(ConfigError::InvalidTimeout(_))));
    }

    #[rstest]
    #[case("(impact_timeout_secs: -1.0)")]
    #[case("(impact_timeout_secs: 1e30)")]
    fn test_rejects_unrepresentable_timeout(#[case] content: &str) {
        let result = EngineConfig::from_ron_str(content, "inline");
        assert!(matches!(result, Err(ConfigError::InvalidTimeout(_))), "{}: {:?}", content, result);
    }

    #[test]
    fn test_timeout_set_in_code_falls_back_to_default() {
        for secs in [0.0, -2.0, 1e30, f32::INFINITY, f32::NAN] {
            let config = EngineConfig {
                impact_timeout_secs: secs,
                ..EngineConfig::default()
            };
            assert_eq!(config.impact_timeout(), Duration::from_secs(3), "{}", secs);
        }
    }

    #[test]
    fn test_parse_error_names_origin() {
        let result = EngineConfig::from_ron_str("(impact_timeout_secs: \"soon\")", "engine.ron");
        match result {
            Err(ConfigError::Parse { path, .. }) => assert_eq!(path, "engine.ron"),
            other => panic!("Expected parse error, got {:?}", other),
        }
    }
}
