//! Configuration module for the row cache.
//!
//! Loads settings from environment variables (and a `.env` file if present).

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::cache::MemoryConfig;
use crate::error::ConfigError;
use crate::key::DEFAULT_NAMESPACE;

pub const NAMESPACE_VAR: &str = "ROWCACHE_NAMESPACE";
pub const ENABLED_VAR: &str = "ROWCACHE_ENABLED";
pub const MEMORY_CAPACITY_VAR: &str = "ROWCACHE_MEMORY_CAPACITY";
pub const MEMORY_TTL_VAR: &str = "ROWCACHE_MEMORY_TTL_SECS";

/// Row cache settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// First segment of every cache key.
    pub namespace: String,

    /// When false, every method resolves as uncached.
    /// Invalidation hooks still run.
    pub enabled: bool,

    /// Sizing for the in-process backend.
    pub memory: MemoryConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            enabled: true,
            memory: MemoryConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from the environment.
    ///
    /// Invalid values are logged and replaced by their default.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load settings from the environment, failing on the first invalid value.
    pub fn try_from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::try_from_lookup(|var| env::var(var).ok())
    }

    /// Lenient load from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let enabled = read_bool(&lookup, ENABLED_VAR, defaults.enabled).unwrap_or_else(|e| {
            warn!("{}, using default", e);
            defaults.enabled
        });

        let max_capacity = read_parsed(&lookup, MEMORY_CAPACITY_VAR, defaults.memory.max_capacity)
            .unwrap_or_else(|e| {
                warn!("{}, using default", e);
                defaults.memory.max_capacity
            });

        let ttl = read_ttl(&lookup, defaults.memory.ttl).unwrap_or_else(|e| {
            warn!("{}, using default", e);
            defaults.memory.ttl
        });

        Self {
            namespace: read_namespace(&lookup),
            enabled,
            memory: MemoryConfig {
                max_capacity,
                ttl,
                ..defaults.memory
            },
        }
    }

    /// Strict load from an arbitrary variable source.
    pub fn try_from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            namespace: read_namespace(&lookup),
            enabled: read_bool(&lookup, ENABLED_VAR, defaults.enabled)?,
            memory: MemoryConfig {
                max_capacity: read_parsed(&lookup, MEMORY_CAPACITY_VAR, defaults.memory.max_capacity)?,
                ttl: read_ttl(&lookup, defaults.memory.ttl)?,
                ..defaults.memory
            },
        })
    }
}

fn read_namespace<F>(lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(NAMESPACE_VAR)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string())
}

fn read_parsed<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

fn read_bool<F>(lookup: &F, var: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(default);
    };

    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: raw,
            reason: "expected true or false".to_string(),
        }),
    }
}

// 0 turns expiry off.
fn read_ttl<F>(lookup: &F, default: Option<Duration>) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let default_secs = default.map(|d| d.as_secs()).unwrap_or(0);
    let secs: u64 = read_parsed(lookup, MEMORY_TTL_VAR, default_secs)?;
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}
