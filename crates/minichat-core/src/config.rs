//! Adapter configuration.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::TransportVariant;

/// Prompt seeded at the head of every conversation unless overridden.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Adapter tuning knobs.
///
/// Deserializes from a partial object; missing fields take their defaults.
/// Durations are expressed in milliseconds on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdapterConfig {
    /// First message of every conversation, hidden from the view.
    pub system_prompt: String,

    /// Gap between capability probes.
    #[serde(rename = "probeIntervalMs", with = "millis")]
    pub probe_interval: Duration,

    /// Probes attempted before giving up on the host.
    pub max_probe_attempts: u32,

    /// Grace delay between detection and the init handshake.
    #[serde(rename = "handshakeDelayMs", with = "millis")]
    pub handshake_delay: Duration,

    /// Enabled transport variants, most preferred first.
    pub variants: Vec<TransportVariant>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            probe_interval: Duration::from_millis(100),
            max_probe_attempts: 50,
            handshake_delay: Duration::from_millis(300),
            variants: TransportVariant::RANKED.to_vec(),
        }
    }
}

impl AdapterConfig {
    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NoProbeAttempts`] if `max_probe_attempts` is zero
    /// - [`ConfigError::NoVariants`] if no transport variant is enabled
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_probe_attempts == 0 {
            return Err(ConfigError::NoProbeAttempts);
        }
        if self.variants.is_empty() {
            return Err(ConfigError::NoVariants);
        }
        Ok(())
    }
}

/// Invalid adapter configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Detection would never probe.
    #[error("max_probe_attempts must be at least 1")]
    NoProbeAttempts,

    /// Nothing to negotiate.
    #[error("at least one transport variant must be enabled")]
    NoVariants,
}

mod millis {
    use super::{Deserialize, Deserializer, Duration, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn defaults_validate() {
        let config = AdapterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.variants.len(), 3);
    }

    #[test]
    fn partial_object_fills_defaults() {
        let config: AdapterConfig = serde_json::from_value(json!({
            "systemPrompt": "Be brief",
            "probeIntervalMs": 25,
            "variants": ["single-turn"],
        }))
        .unwrap();

        assert_eq!(config.system_prompt, "Be brief");
        assert_eq!(config.probe_interval, Duration::from_millis(25));
        assert_eq!(config.handshake_delay, Duration::from_millis(300));
        assert_eq!(config.variants, vec![TransportVariant::SingleTurn]);
    }

    #[test]
    fn rejects_empty_variants() {
        let config = AdapterConfig { variants: Vec::new(), ..AdapterConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::NoVariants));
    }

    #[test]
    fn rejects_zero_attempts() {
        let config = AdapterConfig { max_probe_attempts: 0, ..AdapterConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::NoProbeAttempts));
    }
}
