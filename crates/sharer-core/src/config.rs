use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{SharerError, SharerResult};

/// Recommended floor for the PBKDF2 work factor.
pub const MIN_RECOMMENDED_ITERATIONS: u32 = 100_000;

/// Top-level configuration (loaded from sharer.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SharerConfig {
    pub log: LogConfig,
    pub crypto: CryptoConfig,
    pub relay: RelayConfig,
    pub carrier: CarrierConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

/// Envelope encryption configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// PBKDF2-HMAC-SHA256 rounds for deriving the final key (default: 100000)
    pub pbkdf2_iterations: u32,
}

/// Ephemeral relay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Seconds after the last write before the slot reads as empty (default: 300)
    pub max_age_secs: u64,
    /// Bounded request queue depth of the relay actor
    pub queue_depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CarrierConfig {
    /// Decrypt page that carrier URLs point at
    pub base_url: String,
    /// Also produce bare payloads for scanners that cannot open URLs
    pub data_only_variants: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            pbkdf2_iterations: MIN_RECOMMENDED_ITERATIONS,
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_age_secs: 5 * 60,
            queue_depth: 32,
        }
    }
}

impl Default for CarrierConfig {
    fn default() -> Self {
        Self {
            base_url: "https://robinweitzel.de/secret_sharer".into(),
            data_only_variants: true,
        }
    }
}

impl RelayConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }
}

impl SharerConfig {
    /// Parse a TOML document; missing sections fall back to defaults.
    pub fn from_toml(content: &str) -> SharerResult<Self> {
        let config: SharerConfig =
            toml::from_str(content).map_err(|e| SharerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the system unusable.
    pub fn validate(&self) -> SharerResult<()> {
        if self.crypto.pbkdf2_iterations == 0 {
            return Err(SharerError::Config(
                "crypto.pbkdf2_iterations must be at least 1".into(),
            ));
        }
        if self.relay.max_age_secs == 0 {
            return Err(SharerError::Config(
                "relay.max_age_secs must be at least 1".into(),
            ));
        }
        if self.relay.queue_depth == 0 {
            return Err(SharerError::Config(
                "relay.queue_depth must be at least 1".into(),
            ));
        }
        url::Url::parse(&self.carrier.base_url)
            .map_err(|e| SharerError::Config(format!("carrier.base_url: {e}")))?;
        Ok(())
    }

    /// True when the configured KDF work factor is below the recommended floor.
    pub fn weak_kdf(&self) -> bool {
        self.crypto.pbkdf2_iterations < MIN_RECOMMENDED_ITERATIONS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[log]
level = "debug"
format = "json"

[crypto]
pbkdf2_iterations = 250000

[relay]
max_age_secs = 120
queue_depth = 8

[carrier]
base_url = "https://example.com/decrypt"
data_only_variants = false
"#;
        let config = SharerConfig::from_toml(toml_str).unwrap();

        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.format, "json");
        assert_eq!(config.crypto.pbkdf2_iterations, 250_000);
        assert_eq!(config.relay.max_age(), Duration::from_secs(120));
        assert_eq!(config.relay.queue_depth, 8);
        assert_eq!(config.carrier.base_url, "https://example.com/decrypt");
        assert!(!config.carrier.data_only_variants);
        assert!(!config.weak_kdf());
    }

    #[test]
    fn test_parse_defaults() {
        let config = SharerConfig::from_toml("").unwrap();

        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.format, "text");
        assert_eq!(config.crypto.pbkdf2_iterations, 100_000);
        assert_eq!(config.relay.max_age(), Duration::from_secs(300));
        assert_eq!(config.relay.queue_depth, 32);
        assert_eq!(
            config.carrier.base_url,
            "https://robinweitzel.de/secret_sharer"
        );
        assert!(config.carrier.data_only_variants);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
[relay]
max_age_secs = 60
"#;
        let config = SharerConfig::from_toml(toml_str).unwrap();

        // Overridden
        assert_eq!(config.relay.max_age_secs, 60);
        // Defaults
        assert_eq!(config.relay.queue_depth, 32);
        assert_eq!(config.crypto.pbkdf2_iterations, 100_000);
    }

    #[test]
    fn test_rejects_unusable_values() {
        assert!(SharerConfig::from_toml("[crypto]\npbkdf2_iterations = 0\n").is_err());
        assert!(SharerConfig::from_toml("[relay]\nmax_age_secs = 0\n").is_err());
        assert!(SharerConfig::from_toml("[relay]\nqueue_depth = 0\n").is_err());
        assert!(SharerConfig::from_toml("[carrier]\nbase_url = \"not a url\"\n").is_err());
    }

    #[test]
    fn test_weak_kdf_flag() {
        let mut config = SharerConfig::default();
        assert!(!config.weak_kdf());
        config.crypto.pbkdf2_iterations = 1_000;
        assert!(config.weak_kdf());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = SharerConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed = SharerConfig::from_toml(&toml_str).unwrap();

        assert_eq!(config.carrier.base_url, parsed.carrier.base_url);
        assert_eq!(config.relay.max_age_secs, parsed.relay.max_age_secs);
        assert_eq!(
            config.crypto.pbkdf2_iterations,
            parsed.crypto.pbkdf2_iterations
        );
    }
}
