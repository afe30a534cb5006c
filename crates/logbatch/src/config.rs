// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Consumer and service configuration.
//!
//! [`ConsumerConfig`] drives the batching loop. [`ServiceConfig`] is the
//! file-based configuration of the `logbatch` binary (TOML):
//!
//! ```toml
//! [consumer]
//! batch_size = 10
//! idle_timeout_ms = 3000
//! idle_policy = "terminate"   # or "flush_and_continue"
//!
//! [store]
//! path = "logbatch.db"
//! collection = "logs"
//! ```

use crate::store::validate_collection_name;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default flush threshold.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Default idle timeout.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(3);

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

/// What the consumer does when the idle timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdlePolicy {
    /// Flush what is buffered and end the run.
    #[default]
    Terminate,
    /// Flush what is buffered, rearm the timer and keep consuming until the
    /// inbound stream closes.
    FlushAndContinue,
}

/// Batching loop configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerConfig {
    /// Buffer size that triggers an immediate flush
    pub batch_size: usize,

    /// Quiet period, measured from the last flush or run start
    pub idle_timeout: Duration,

    /// Behaviour on idle expiry
    pub idle_policy: IdlePolicy,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            idle_policy: IdlePolicy::Terminate,
        }
    }
}

impl ConsumerConfig {
    /// Create a new config builder
    pub fn builder() -> ConsumerConfigBuilder {
        ConsumerConfigBuilder::default()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be positive".into()));
        }
        if self.idle_timeout.is_zero() {
            return Err(ConfigError::Invalid("idle_timeout must be positive".into()));
        }
        Ok(())
    }
}

/// Config builder for fluent API
#[derive(Debug, Default)]
pub struct ConsumerConfigBuilder {
    batch_size: Option<usize>,
    idle_timeout: Option<Duration>,
    idle_policy: Option<IdlePolicy>,
}

impl ConsumerConfigBuilder {
    /// Set the flush threshold
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }

    /// Set the idle timeout
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Set the idle policy (default: terminate)
    pub fn idle_policy(mut self, policy: IdlePolicy) -> Self {
        self.idle_policy = Some(policy);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<ConsumerConfig, ConfigError> {
        let defaults = ConsumerConfig::default();

        let config = ConsumerConfig {
            batch_size: self.batch_size.unwrap_or(defaults.batch_size),
            idle_timeout: self.idle_timeout.unwrap_or(defaults.idle_timeout),
            idle_policy: self.idle_policy.unwrap_or(defaults.idle_policy),
        };
        config.validate()?;
        Ok(config)
    }
}

/// `[consumer]` section of the service file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerSection {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    #[serde(default)]
    pub idle_policy: IdlePolicy,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_idle_timeout_ms() -> u64 {
    DEFAULT_IDLE_TIMEOUT.as_millis() as u64
}

impl Default for ConsumerSection {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            idle_timeout_ms: default_idle_timeout_ms(),
            idle_policy: IdlePolicy::default(),
        }
    }
}

/// `[store]` section of the service file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSection {
    /// SQLite database path
    #[serde(default = "default_store_path")]
    pub path: String,

    /// Collection (table) receiving the documents
    #[serde(default = "default_collection")]
    pub collection: String,
}

fn default_store_path() -> String {
    "logbatch.db".to_string()
}

fn default_collection() -> String {
    "logs".to_string()
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            collection: default_collection(),
        }
    }
}

/// Service configuration of the `logbatch` binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub consumer: ConsumerSection,

    #[serde(default)]
    pub store: StoreSection,
}

impl ServiceConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.consumer_config().validate()?;

        if self.store.path.is_empty() {
            return Err(ConfigError::Invalid("store.path is empty".into()));
        }
        validate_collection_name(&self.store.collection)
            .map_err(|e| ConfigError::Invalid(format!("store.collection: {}", e)))?;

        Ok(())
    }

    /// Consumer loop settings derived from the `[consumer]` section
    pub fn consumer_config(&self) -> ConsumerConfig {
        ConsumerConfig {
            batch_size: self.consumer.batch_size,
            idle_timeout: Duration::from_millis(self.consumer.idle_timeout_ms),
            idle_policy: self.consumer.idle_policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consumer_config_defaults() {
        let config = ConsumerConfig::default();

        assert_eq!(config.batch_size, 10);
        assert_eq!(config.idle_timeout, Duration::from_secs(3));
        assert_eq!(config.idle_policy, IdlePolicy::Terminate);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_consumer_config_builder() {
        let config = ConsumerConfig::builder()
            .batch_size(500)
            .idle_timeout(Duration::from_millis(250))
            .idle_policy(IdlePolicy::FlushAndContinue)
            .build()
            .unwrap();

        assert_eq!(config.batch_size, 500);
        assert_eq!(config.idle_timeout, Duration::from_millis(250));
        assert_eq!(config.idle_policy, IdlePolicy::FlushAndContinue);
    }

    #[test]
    fn test_consumer_config_rejects_zero_values() {
        assert!(matches!(
            ConsumerConfig::builder().batch_size(0).build(),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ConsumerConfig::builder().idle_timeout(Duration::ZERO).build(),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_service_config_parse_full() {
        let config = ServiceConfig::from_toml(
            r#"
[consumer]
batch_size = 50
idle_timeout_ms = 1500
idle_policy = "flush_and_continue"

[store]
path = "/var/lib/logbatch/logs.db"
collection = "member_logs"
"#,
        )
        .unwrap();

        assert_eq!(config.consumer.batch_size, 50);
        assert_eq!(config.store.path, "/var/lib/logbatch/logs.db");
        assert_eq!(config.store.collection, "member_logs");

        let consumer = config.consumer_config();
        assert_eq!(consumer.idle_timeout, Duration::from_millis(1500));
        assert_eq!(consumer.idle_policy, IdlePolicy::FlushAndContinue);
    }

    #[test]
    fn test_service_config_defaults_when_empty() {
        let config = ServiceConfig::from_toml("").unwrap();

        assert_eq!(config.consumer.batch_size, 10);
        assert_eq!(config.consumer.idle_timeout_ms, 3000);
        assert_eq!(config.store.path, "logbatch.db");
        assert_eq!(config.store.collection, "logs");
    }

    #[test]
    fn test_service_config_rejects_invalid_collection() {
        let result = ServiceConfig::from_toml(
            r#"
[store]
collection = ""
"#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_service_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logbatch.toml");
        std::fs::write(&path, "[consumer]\nbatch_size = 3\n").unwrap();

        let config = ServiceConfig::from_file(&path).unwrap();
        assert_eq!(config.consumer.batch_size, 3);

        assert!(matches!(
            ServiceConfig::from_file(dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
