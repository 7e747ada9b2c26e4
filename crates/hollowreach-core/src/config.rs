//! Configuration loading and typed config structures for the Hollowreach
//! simulation.
//!
//! The canonical configuration lives in `hollowreach-config.yaml` at the
//! project root. Every field has a default, so an empty file (or no file
//! at all) yields a runnable world.

use std::path::Path;

use hollowreach_types::{Climate, TerrainType};
use serde::Deserialize;

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
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `hollowreach-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HollowreachConfig {
    /// World layout and seed.
    #[serde(default)]
    pub world: WorldConfig,

    /// Tick pacing and run limits.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Combat and aggro tuning.
    #[serde(default)]
    pub combat: CombatConfig,

    /// Weather settings.
    #[serde(default)]
    pub environment: EnvironmentConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Snapshot persistence.
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Initial population.
    #[serde(default)]
    pub spawner: SpawnerConfig,
}

impl HollowreachConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Seed for weather, loot rolls and spawn names.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Load the built-in two-spot starting world.
    #[serde(default = "default_true")]
    pub use_starting_world: bool,

    /// Additional blank spots.
    #[serde(default)]
    pub extra_spots: Vec<SpotConfig>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            use_starting_world: true,
            extra_spots: Vec::new(),
        }
    }
}

/// A blank rectangular spot filled with one terrain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpotConfig {
    /// Display name.
    pub name: String,
    /// Width in cells.
    pub width: i32,
    /// Height in cells.
    pub height: i32,
    /// Terrain every cell starts as.
    #[serde(default = "default_terrain")]
    pub terrain: TerrainType,
    /// Climate driving the weather table.
    #[serde(default)]
    pub climate: Climate,
}

/// Tick pacing and run limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Real-time milliseconds between ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Stop after this many ticks. Zero means unlimited.
    #[serde(default)]
    pub max_ticks: u64,

    /// Stop after this many wall-clock seconds. Zero means unlimited.
    #[serde(default)]
    pub max_real_time_seconds: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: 0,
            max_real_time_seconds: 0,
        }
    }
}

/// Combat and aggro tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CombatConfig {
    /// Ticks after which an attacker's threat is forgotten.
    #[serde(default = "default_aggro_forget_after_ticks")]
    pub aggro_forget_after_ticks: u64,

    /// Ticks between physical cleanups of forgotten threat entries.
    #[serde(default = "default_aggro_cleanup_interval_ticks")]
    pub aggro_cleanup_interval_ticks: u64,

    /// Upper bound on events drained by one tick or command.
    #[serde(default = "default_max_events_per_tick")]
    pub max_events_per_tick: usize,

    /// Auto-aim monster skills at their target.
    #[serde(default = "default_true")]
    pub default_auto_aim: bool,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            aggro_forget_after_ticks: default_aggro_forget_after_ticks(),
            aggro_cleanup_interval_ticks: default_aggro_cleanup_interval_ticks(),
            max_events_per_tick: default_max_events_per_tick(),
            default_auto_aim: true,
        }
    }
}

/// Weather settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnvironmentConfig {
    /// Ticks between weather rolls. Zero freezes the weather.
    #[serde(default = "default_weather_change_interval_ticks")]
    pub weather_change_interval_ticks: u64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            weather_change_interval_ticks: default_weather_change_interval_ticks(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of the human-readable format.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Snapshot persistence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersistenceConfig {
    /// Where snapshots are written. `None` disables persistence.
    #[serde(default)]
    pub snapshot_path: Option<String>,

    /// Ticks between snapshots.
    #[serde(default = "default_snapshot_interval_ticks")]
    pub snapshot_interval_ticks: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            snapshot_interval_ticks: default_snapshot_interval_ticks(),
        }
    }
}

/// Initial population.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpawnerConfig {
    /// Player characters created at the entry point.
    #[serde(default = "default_player_count")]
    pub player_count: u32,

    /// Monster templates cycled over the monster sites.
    #[serde(default = "default_monster_templates")]
    pub monster_templates: Vec<String>,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            player_count: default_player_count(),
            monster_templates: default_monster_templates(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_seed() -> u64 {
    42
}

const fn default_true() -> bool {
    true
}

const fn default_terrain() -> TerrainType {
    TerrainType::Grass
}

const fn default_tick_interval_ms() -> u64 {
    500
}

const fn default_aggro_forget_after_ticks() -> u64 {
    100
}

const fn default_aggro_cleanup_interval_ticks() -> u64 {
    50
}

const fn default_max_events_per_tick() -> usize {
    10_000
}

const fn default_weather_change_interval_ticks() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_snapshot_interval_ticks() -> u64 {
    100
}

const fn default_player_count() -> u32 {
    2
}

fn default_monster_templates() -> Vec<String> {
    vec!["wolf".to_owned(), "slime".to_owned()]
}
