//! Configuration loading and typed config structures.
//!
//! The canonical configuration lives in `skilling-config.yaml` next to the
//! server binary. This module defines strongly-typed structs that mirror the
//! YAML structure and a loader that reads it. Every field has a default, so
//! an empty file (or no file) yields a runnable configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use skilling_types::{ActivityFamily, TargetId, ToolTierId};

use crate::clock::DEFAULT_TICK_INTERVAL_MS;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override held a value of the wrong shape.
    #[error("invalid value for {variable}: {value}")]
    InvalidOverride {
        /// The environment variable name.
        variable: &'static str,
        /// The rejected value.
        value: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SkillingConfig {
    /// Tick timing and randomness.
    #[serde(default)]
    pub server: ServerConfig,

    /// Where the activity catalogs come from.
    #[serde(default)]
    pub catalogs: CatalogSourceConfig,

    /// Defaults for newly connected players.
    #[serde(default)]
    pub players: PlayerDefaultsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Scripted sessions started at boot.
    #[serde(default)]
    pub bots: Vec<BotConfig>,
}

impl SkillingConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `SKILLING_TICK_MS` overrides `server.tick_interval_ms`
    /// - `SKILLING_SEED` overrides `server.seed`
    /// - `SKILLING_CATALOG_DIR` overrides `catalogs.dir`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::InvalidOverride`] if an override does not parse.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to a map.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production, a map in tests).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] if a numeric override does
    /// not parse.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup("SKILLING_TICK_MS") {
            self.server.tick_interval_ms =
                value.parse().map_err(|_err| ConfigError::InvalidOverride {
                    variable: "SKILLING_TICK_MS",
                    value: value.clone(),
                })?;
        }
        if let Some(value) = lookup("SKILLING_SEED") {
            self.server.seed = value.parse().map_err(|_err| ConfigError::InvalidOverride {
                variable: "SKILLING_SEED",
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup("SKILLING_CATALOG_DIR") {
            self.catalogs.dir = Some(PathBuf::from(value));
        }
        Ok(())
    }
}

/// Tick timing and randomness.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Delay between the end of one tick and the start of the next.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Root seed; each engine derives its own stream from it.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// How often dirty players are flushed to persistence.
    #[serde(default = "default_persist_interval_ms")]
    pub persist_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            seed: default_seed(),
            persist_interval_ms: default_persist_interval_ms(),
        }
    }
}

/// Catalog source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CatalogSourceConfig {
    /// Directory holding `woodcutting.yaml`, `mining.yaml`, `fishing.yaml`
    /// and `harvesting.yaml`. The built-in tables are used when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Defaults applied to players the server creates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlayerDefaultsConfig {
    /// Total units an inventory can carry.
    #[serde(default = "default_inventory_capacity")]
    pub inventory_capacity: u32,

    /// Level every gathering skill starts at.
    #[serde(default = "default_starting_level")]
    pub starting_level: u32,
}

impl Default for PlayerDefaultsConfig {
    fn default() -> Self {
        Self {
            inventory_capacity: default_inventory_capacity(),
            starting_level: default_starting_level(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Pretty,
        }
    }
}

/// A scripted gathering session started when the server boots.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BotConfig {
    /// Activity family to gather in.
    pub family: ActivityFamily,
    /// Tool tier key from that family's catalog.
    pub tool: ToolTierId,
    /// Target key from that family's catalog.
    pub target: TargetId,
    /// Skill level the bot starts with.
    #[serde(default = "default_starting_level")]
    pub level: u32,
    /// How many identical bots to spawn.
    #[serde(default = "default_bot_count")]
    pub count: u32,
}

const fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

const fn default_seed() -> u64 {
    0x5eed
}

const fn default_persist_interval_ms() -> u64 {
    30_000
}

const fn default_inventory_capacity() -> u32 {
    28
}

const fn default_starting_level() -> u32 {
    1
}

const fn default_bot_count() -> u32 {
    1
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn parse_without_env(yaml: &str) -> SkillingConfig {
        let mut config: SkillingConfig = serde_yml::from_str(yaml).unwrap();
        config.apply_overrides(|_| None).unwrap();
        config
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = SkillingConfig::default();
        assert_eq!(config.server.tick_interval_ms, 600);
        assert_eq!(config.players.inventory_capacity, 28);
        assert_eq!(config.players.starting_level, 1);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.catalogs.dir.is_none());
        assert!(config.bots.is_empty());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = parse_without_env("server:\n  seed: 42\n");
        assert_eq!(config.server.seed, 42);
        assert_eq!(config.server.tick_interval_ms, 600);
    }

    #[test]
    fn bots_parse() {
        let yaml = "
bots:
  - family: woodcutting
    tool: bronze
    target: normal
    count: 3
  - family: fishing
    tool: master
    target: turtle
    level: 65
";
        let config = parse_without_env(yaml);
        assert_eq!(config.bots.len(), 2);
        assert_eq!(config.bots[0].family, ActivityFamily::Woodcutting);
        assert_eq!(config.bots[0].count, 3);
        assert_eq!(config.bots[0].level, 1);
        assert_eq!(config.bots[1].level, 65);
        assert_eq!(config.bots[1].target, TargetId::new("turtle"));
    }

    #[test]
    fn env_overrides_apply() {
        let env: BTreeMap<&str, &str> = [
            ("SKILLING_TICK_MS", "50"),
            ("SKILLING_SEED", "7"),
            ("SKILLING_CATALOG_DIR", "/srv/catalogs"),
        ]
        .into_iter()
        .collect();

        let mut config = SkillingConfig::default();
        config
            .apply_overrides(|name| env.get(name).map(|v| (*v).to_owned()))
            .unwrap();

        assert_eq!(config.server.tick_interval_ms, 50);
        assert_eq!(config.server.seed, 7);
        assert_eq!(config.catalogs.dir, Some(PathBuf::from("/srv/catalogs")));
    }

    #[test]
    fn bad_numeric_override_is_an_error() {
        let mut config = SkillingConfig::default();
        let result = config.apply_overrides(|name| {
            (name == "SKILLING_TICK_MS").then(|| "fast".to_owned())
        });
        assert!(matches!(
            result,
            Err(ConfigError::InvalidOverride {
                variable: "SKILLING_TICK_MS",
                ..
            })
        ));
    }

    #[test]
    fn json_log_format_parses() {
        let config = parse_without_env("logging:\n  format: json\n  level: debug\n");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "debug");
    }
}
