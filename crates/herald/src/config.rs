// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Provider and consumer configuration.
//!
//! Supports both programmatic and file-based configuration.
//!
//! ```toml
//! name = "kitchen-display"
//! policy = "consumer_decides"
//! topic_filter = "strict_selection"
//! rendezvous_timeout_ms = 2000
//! ```

use crate::logging::{self, LogLevel};
use crate::types::{SubscriptionPolicy, TopicFilterMode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider name (for identification in logs and worker thread names).
    #[serde(default = "default_provider_name")]
    pub name: String,

    /// Who approves subscription requests.
    #[serde(default)]
    pub policy: SubscriptionPolicy,

    /// Free-form description advertised alongside the provider.
    #[serde(default)]
    pub user_info: Option<String>,

    /// Require secured resources on the wire layer.
    #[serde(default)]
    pub resource_security: bool,

    /// Topic filtering for consumers that never posted a selection.
    #[serde(default)]
    pub topic_filter: TopicFilterMode,

    /// How long blocking API calls wait for a worker (milliseconds).
    #[serde(default = "default_rendezvous_timeout")]
    pub rendezvous_timeout_ms: u64,

    /// Console log level, applied by [`ProviderConfig::init_logging`].
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_provider_name() -> String {
    "herald-provider".to_string()
}

fn default_consumer_name() -> String {
    "herald-consumer".to_string()
}

fn default_rendezvous_timeout() -> u64 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            policy: SubscriptionPolicy::default(),
            user_info: None,
            resource_security: false,
            topic_filter: TopicFilterMode::default(),
            rendezvous_timeout_ms: default_rendezvous_timeout(),
            log_level: default_log_level(),
        }
    }
}

impl ProviderConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_common(&self.name, self.rendezvous_timeout_ms, &self.log_level)?;
        if let Some(info) = &self.user_info {
            if info.trim().is_empty() {
                return Err(ConfigError::Invalid("user_info is empty".into()));
            }
        }
        Ok(())
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn policy(mut self, policy: SubscriptionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn user_info(mut self, info: impl Into<String>) -> Self {
        self.user_info = Some(info.into());
        self
    }

    pub fn resource_security(mut self, enabled: bool) -> Self {
        self.resource_security = enabled;
        self
    }

    pub fn topic_filter(mut self, mode: TopicFilterMode) -> Self {
        self.topic_filter = mode;
        self
    }

    pub fn rendezvous_timeout(mut self, timeout: Duration) -> Self {
        self.rendezvous_timeout_ms = duration_to_ms(timeout);
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level.as_str().to_string();
        self
    }

    /// Rendezvous timeout as a `Duration`.
    pub fn rendezvous_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.rendezvous_timeout_ms)
    }

    /// Configured log level, parsed.
    pub fn level(&self) -> Result<LogLevel, ConfigError> {
        parse_level(&self.log_level)
    }

    /// Install the console logger at the configured level.
    pub fn init_logging(&self) -> crate::Result<()> {
        logging::init_logging(self.level()?)
    }
}

/// Consumer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumerConfig {
    #[serde(default = "default_consumer_name")]
    pub name: String,

    /// How long blocking API calls wait for a worker (milliseconds).
    #[serde(default = "default_rendezvous_timeout")]
    pub rendezvous_timeout_ms: u64,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            name: default_consumer_name(),
            rendezvous_timeout_ms: default_rendezvous_timeout(),
            log_level: default_log_level(),
        }
    }
}

impl ConsumerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_common(&self.name, self.rendezvous_timeout_ms, &self.log_level)
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn rendezvous_timeout(mut self, timeout: Duration) -> Self {
        self.rendezvous_timeout_ms = duration_to_ms(timeout);
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level.as_str().to_string();
        self
    }

    pub fn rendezvous_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.rendezvous_timeout_ms)
    }

    pub fn level(&self) -> Result<LogLevel, ConfigError> {
        parse_level(&self.log_level)
    }

    /// Install the console logger at the configured level.
    pub fn init_logging(&self) -> crate::Result<()> {
        logging::init_logging(self.level()?)
    }
}

fn parse_level(level: &str) -> Result<LogLevel, ConfigError> {
    level
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("unknown log level '{}'", level)))
}

fn duration_to_ms(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

fn validate_common(name: &str, timeout_ms: u64, log_level: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::Invalid("name is empty".into()));
    }
    if timeout_ms == 0 {
        return Err(ConfigError::Invalid(
            "rendezvous_timeout_ms must be greater than zero".into(),
        ));
    }
    parse_level(log_level).map(|_| ())
}
