//! TOML-based application configuration.
//!
//! Stores:
//! - Freemium gate parameters (daily limit, trial length, storage key)
//! - Hosted checkout settings (origin, checkout endpoint, price ids)
//!
//! Configuration is stored at `~/.config/bigtimer/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::entitlement::Plan;
use crate::error::ConfigError;

/// Freemium gate configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default = "default_free_daily_limit")]
    pub free_daily_limit: u32,
    #[serde(default = "default_trial_days")]
    pub trial_days: u32,
    /// Key the entitlement record is stored under.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
}

/// Price identifiers per plan, as known to the checkout provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceIds {
    #[serde(default = "default_monthly_price")]
    pub monthly: String,
    #[serde(default = "default_yearly_price")]
    pub yearly: String,
    #[serde(default = "default_lifetime_price")]
    pub lifetime: String,
}

/// Hosted checkout configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// Where the checkout provider sends the user back to.
    #[serde(default = "default_origin")]
    pub origin: String,
    #[serde(default = "default_checkout_url")]
    pub checkout_url: String,
    #[serde(default = "default_publishable_key")]
    pub publishable_key: String,
    #[serde(default)]
    pub prices: PriceIds,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/bigtimer/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub checkout: CheckoutConfig,
}

// Default functions
fn default_free_daily_limit() -> u32 {
    5
}
fn default_trial_days() -> u32 {
    7
}
fn default_storage_key() -> String {
    "bigTimerUser".into()
}
fn default_monthly_price() -> String {
    "price_monthly_id".into()
}
fn default_yearly_price() -> String {
    "price_yearly_id".into()
}
fn default_lifetime_price() -> String {
    "price_lifetime_id".into()
}
fn default_origin() -> String {
    "http://localhost:8080".into()
}
fn default_checkout_url() -> String {
    "https://checkout.stripe.com/pay".into()
}
fn default_publishable_key() -> String {
    "pk_test_YOUR_PUBLISHABLE_KEY_HERE".into()
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            free_daily_limit: default_free_daily_limit(),
            trial_days: default_trial_days(),
            storage_key: default_storage_key(),
        }
    }
}

impl Default for PriceIds {
    fn default() -> Self {
        Self {
            monthly: default_monthly_price(),
            yearly: default_yearly_price(),
            lifetime: default_lifetime_price(),
        }
    }
}

impl PriceIds {
    pub fn for_plan(&self, plan: Plan) -> &str {
        match plan {
            Plan::Monthly => &self.monthly,
            Plan::Yearly => &self.yearly,
            Plan::Lifetime => &self.lifetime,
        }
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            checkout_url: default_checkout_url(),
            publishable_key: default_publishable_key(),
            prices: PriceIds::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                    serde_json::Value::Object(_) => {
                        return Err(invalid("cannot replace a whole section".to_string()))
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default, writing the default file when
    /// none exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key, in memory. Call [`save`](Self::save) to persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// as the key's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(error = %e, "using default configuration");
                Self::default()
            }
        }
    }
}
