//! Registry configuration
//!
//! Loaded from a TOML file where every section is optional:
//! ```toml
//! [factory]
//! tld_max_length = 40
//!
//! [forbidden]
//! seed = [".eth", ".com", ".org", ".net"]
//!
//! [resolver]
//! max_page_size = 50
//! ```
//! `DOMAINS_*` environment variables override file values.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::types::MAX_ROYALTY_BPS;

/// Names forbidden from day one
pub const DEFAULT_FORBIDDEN_TLDS: &[&str] = &[".eth", ".com", ".org", ".net"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("Configuration parsing error: {0}")]
    Parsing(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidOverride { key: String, value: String },

    #[error("Invalid configuration: {reason}")]
    Invalid { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    /// Minimum TLD length in characters, dot included
    pub tld_min_length: usize,
    /// Maximum TLD length in bytes, dot included
    pub tld_max_length: usize,
    /// Royalty (basis points) handed to newly created TLD registries
    pub default_royalty_bps: u16,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            tld_min_length: 2,
            tld_max_length: 40,
            default_royalty_bps: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TldConfig {
    /// Domain names must be strictly shorter than this many bytes
    pub name_max_length: usize,
    /// Id assigned to the first minted domain
    pub first_token_id: u64,
}

impl Default for TldConfig {
    fn default() -> Self {
        Self {
            name_max_length: 140,
            first_token_id: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForbiddenConfig {
    pub seed: Vec<String>,
}

impl Default for ForbiddenConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_FORBIDDEN_TLDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Upper bound on entries returned by one paginated aggregation call
    pub max_page_size: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { max_page_size: 100 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub genesis_timestamp: u64,
    pub block_time_secs: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            genesis_timestamp: 1_700_000_000,
            block_time_secs: 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub factory: FactoryConfig,
    pub tld: TldConfig,
    pub forbidden: ForbiddenConfig,
    pub resolver: ResolverConfig,
    pub chain: ChainConfig,
}

impl RegistryConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RegistryConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file and apply `DOMAINS_*` environment overrides
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: RegistryConfig = toml::from_str(&content)?;
        config.apply_env_overrides()?;
        config.validate()?;
        tracing::debug!("Loaded registry configuration from {}", path.display());
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup (the process environment
    /// in production, a map in tests)
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("DOMAINS_TLD_MIN_LENGTH") {
            self.factory.tld_min_length = parse_override("DOMAINS_TLD_MIN_LENGTH", &v)?;
        }
        if let Some(v) = lookup("DOMAINS_TLD_MAX_LENGTH") {
            self.factory.tld_max_length = parse_override("DOMAINS_TLD_MAX_LENGTH", &v)?;
        }
        if let Some(v) = lookup("DOMAINS_DEFAULT_ROYALTY_BPS") {
            self.factory.default_royalty_bps = parse_override("DOMAINS_DEFAULT_ROYALTY_BPS", &v)?;
        }
        if let Some(v) = lookup("DOMAINS_NAME_MAX_LENGTH") {
            self.tld.name_max_length = parse_override("DOMAINS_NAME_MAX_LENGTH", &v)?;
        }
        if let Some(v) = lookup("DOMAINS_FORBIDDEN_TLDS") {
            self.forbidden.seed = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(v) = lookup("DOMAINS_MAX_PAGE_SIZE") {
            self.resolver.max_page_size = parse_override("DOMAINS_MAX_PAGE_SIZE", &v)?;
        }
        if let Some(v) = lookup("DOMAINS_BLOCK_TIME_SECS") {
            self.chain.block_time_secs = parse_override("DOMAINS_BLOCK_TIME_SECS", &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.factory.tld_min_length < 2 {
            return Err(ConfigError::Invalid {
                reason: "tld_min_length must leave room for the dot and one character".to_string(),
            });
        }
        if self.factory.tld_min_length > self.factory.tld_max_length {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "tld_min_length {} exceeds tld_max_length {}",
                    self.factory.tld_min_length, self.factory.tld_max_length
                ),
            });
        }
        if self.factory.default_royalty_bps > MAX_ROYALTY_BPS {
            return Err(ConfigError::Invalid {
                reason: format!("default_royalty_bps cannot exceed {}", MAX_ROYALTY_BPS),
            });
        }
        if self.tld.name_max_length < 2 {
            return Err(ConfigError::Invalid {
                reason: "name_max_length must be at least 2".to_string(),
            });
        }
        if self.resolver.max_page_size == 0 {
            return Err(ConfigError::Invalid {
                reason: "max_page_size must be positive".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_override<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}
