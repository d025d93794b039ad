//! # Checkout Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     KAHERA_DEVICE_ID=register-01                                       │
//! │     KAHERA_LOW_STOCK_THRESHOLD=5                                       │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/kahera-pos/checkout.toml (Linux)                         │
//! │     ~/Library/Application Support/com.kahera.pos/checkout.toml (macOS) │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     auto-generated device_id, 3 persist attempts                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # checkout.toml
//! [device]
//! id = "550e8400-e29b-41d4-a716-446655440000"
//! name = "Register 1"
//!
//! [checkout]
//! low_stock_threshold = 5
//! persist_attempts = 3
//! persist_backoff_ms = 100
//! compensation_attempts = 3
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{CheckoutError, CheckoutResult};

// =============================================================================
// Device Configuration
// =============================================================================

/// Identity of this register.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Unique device identifier. Its last two characters appear in every
    /// sale number printed by this register.
    pub id: String,

    /// Human-readable device name (e.g., "Register 1").
    #[serde(default = "default_device_name")]
    pub name: String,
}

fn default_device_name() -> String {
    "POS Terminal".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            id: Uuid::new_v4().to_string(),
            name: default_device_name(),
        }
    }
}

// =============================================================================
// Checkout Settings
// =============================================================================

/// Stock warnings and retry behaviour of the checkout transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSettings {
    /// Remaining stock at or below this (but above zero) raises a
    /// low-stock warning on the committed sale.
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i64,

    /// Total attempts at writing the sale record.
    #[serde(default = "default_persist_attempts")]
    pub persist_attempts: u32,

    /// Pause between sale-write attempts after a transient failure (milliseconds).
    #[serde(default = "default_persist_backoff")]
    pub persist_backoff_ms: u64,

    /// Total attempts at returning one product's reserved stock.
    #[serde(default = "default_compensation_attempts")]
    pub compensation_attempts: u32,
}

fn default_low_stock_threshold() -> i64 {
    5
}
fn default_persist_attempts() -> u32 {
    3
}
fn default_persist_backoff() -> u64 {
    100
}
fn default_compensation_attempts() -> u32 {
    3
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        CheckoutSettings {
            low_stock_threshold: default_low_stock_threshold(),
            persist_attempts: default_persist_attempts(),
            persist_backoff_ms: default_persist_backoff(),
            compensation_attempts: default_compensation_attempts(),
        }
    }
}

// =============================================================================
// Main Checkout Configuration
// =============================================================================

/// Complete checkout configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutConfig {
    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub checkout: CheckoutSettings,
}

impl CheckoutConfig {
    /// Creates a new config with defaults and a generated device ID.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (checkout.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> CheckoutResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading checkout config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load checkout config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> CheckoutResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| CheckoutError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Checkout config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> CheckoutResult<()> {
        if self.device.id.trim().is_empty() {
            return Err(CheckoutError::InvalidConfig("device id must not be empty".into()));
        }

        if self.checkout.low_stock_threshold < 0 {
            return Err(CheckoutError::InvalidConfig(
                "low_stock_threshold must not be negative".into(),
            ));
        }

        if self.checkout.persist_attempts == 0 {
            return Err(CheckoutError::InvalidConfig(
                "persist_attempts must be greater than 0".into(),
            ));
        }

        if self.checkout.compensation_attempts == 0 {
            return Err(CheckoutError::InvalidConfig(
                "compensation_attempts must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies `KAHERA_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from `lookup`. Unparseable values are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(id) = lookup("KAHERA_DEVICE_ID") {
            debug!(device_id = %id, "Overriding device ID from environment");
            self.device.id = id;
        }

        if let Some(name) = lookup("KAHERA_DEVICE_NAME") {
            self.device.name = name;
        }

        if let Some(value) = lookup("KAHERA_LOW_STOCK_THRESHOLD") {
            match value.parse::<i64>() {
                Ok(v) => self.checkout.low_stock_threshold = v,
                Err(_) => warn!(value = %value, "Invalid KAHERA_LOW_STOCK_THRESHOLD"),
            }
        }

        if let Some(value) = lookup("KAHERA_PERSIST_ATTEMPTS") {
            match value.parse::<u32>() {
                Ok(v) => self.checkout.persist_attempts = v,
                Err(_) => warn!(value = %value, "Invalid KAHERA_PERSIST_ATTEMPTS"),
            }
        }

        if let Some(value) = lookup("KAHERA_PERSIST_BACKOFF_MS") {
            match value.parse::<u64>() {
                Ok(v) => self.checkout.persist_backoff_ms = v,
                Err(_) => warn!(value = %value, "Invalid KAHERA_PERSIST_BACKOFF_MS"),
            }
        }

        if let Some(value) = lookup("KAHERA_COMPENSATION_ATTEMPTS") {
            match value.parse::<u32>() {
                Ok(v) => self.checkout.compensation_attempts = v,
                Err(_) => warn!(value = %value, "Invalid KAHERA_COMPENSATION_ATTEMPTS"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "kahera", "pos")
            .map(|dirs| dirs.config_dir().join("checkout.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn device_id(&self) -> &str {
        &self.device.id
    }

    pub fn persist_backoff(&self) -> Duration {
        Duration::from_millis(self.checkout.persist_backoff_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = CheckoutConfig::default();
        assert!(!config.device.id.is_empty());
        assert_eq!(config.checkout.persist_attempts, 3);
        assert_eq!(config.checkout.low_stock_threshold, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = CheckoutConfig::default();

        config.device.id = "  ".to_string();
        assert!(config.validate().is_err());

        config.device.id = "register-01".to_string();
        config.checkout.persist_attempts = 0;
        assert!(config.validate().is_err());

        config.checkout.persist_attempts = 1;
        config.checkout.compensation_attempts = 0;
        assert!(config.validate().is_err());

        config.checkout.compensation_attempts = 1;
        config.checkout.low_stock_threshold = -1;
        assert!(config.validate().is_err());

        config.checkout.low_stock_threshold = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("KAHERA_DEVICE_ID", "register-07"),
            ("KAHERA_PERSIST_ATTEMPTS", "5"),
            ("KAHERA_LOW_STOCK_THRESHOLD", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = CheckoutConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.device_id(), "register-07");
        assert_eq!(config.checkout.persist_attempts, 5);
        assert_eq!(config.checkout.low_stock_threshold, 5);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: CheckoutConfig = toml::from_str(
            r#"
            [device]
            id = "register-02"

            [checkout]
            persist_backoff_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.device.name, "POS Terminal");
        assert_eq!(config.persist_backoff(), Duration::from_millis(250));
        assert_eq!(config.checkout.compensation_attempts, 3);
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("kahera-checkout-{}.toml", Uuid::new_v4()));

        let mut config = CheckoutConfig::default();
        config.device.id = "register-09".to_string();
        config.checkout.low_stock_threshold = 2;
        config.save(Some(path.clone())).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("[device]"));
        assert!(text.contains("[checkout]"));

        let loaded: CheckoutConfig = toml::from_str(&text).unwrap();
        assert_eq!(loaded.device.id, "register-09");
        assert_eq!(loaded.checkout.low_stock_threshold, 2);

        std::fs::remove_file(&path).unwrap();
    }
}
