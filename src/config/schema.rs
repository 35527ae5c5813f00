use crate::error::ConfigError;
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub bridge: BridgeConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub archive: ArchiveConfig,

    #[serde(default)]
    pub reliability: ReliabilityConfig,
}

// ── Chat-client bridge ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Command spawned as the chat-client sidecar
    #[serde(default = "default_bridge_command")]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_bridge_command() -> String {
    "chatkeeper-bridge".into()
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            command: default_bridge_command(),
            args: Vec::new(),
        }
    }
}

// ── Night window schedule ─────────────────────────────────────────

/// Anchors and jitter ranges for the nightly offline window, plus the
/// daytime sweep cadence. Start minute is drawn from
/// `night_jitter_min..=night_jitter_max` past `night_hour`, end minute
/// likewise past `morning_hour`, freshly per scheduler cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_night_hour")]
    pub night_hour: u32,
    #[serde(default = "default_night_jitter_min")]
    pub night_jitter_min: u32,
    #[serde(default = "default_night_jitter_max")]
    pub night_jitter_max: u32,
    #[serde(default = "default_morning_hour")]
    pub morning_hour: u32,
    #[serde(default = "default_morning_jitter_min")]
    pub morning_jitter_min: u32,
    #[serde(default = "default_morning_jitter_max")]
    pub morning_jitter_max: u32,
    /// Minutes between periodic group sweeps while connected
    #[serde(default = "default_sweep_interval_mins")]
    pub sweep_interval_mins: u64,
}

fn default_night_hour() -> u32 {
    1
}

fn default_night_jitter_min() -> u32 {
    1
}

fn default_night_jitter_max() -> u32 {
    15
}

fn default_morning_hour() -> u32 {
    9
}

fn default_morning_jitter_min() -> u32 {
    30
}

fn default_morning_jitter_max() -> u32 {
    45
}

fn default_sweep_interval_mins() -> u64 {
    60
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            night_hour: default_night_hour(),
            night_jitter_min: default_night_jitter_min(),
            night_jitter_max: default_night_jitter_max(),
            morning_hour: default_morning_hour(),
            morning_jitter_min: default_morning_jitter_min(),
            morning_jitter_max: default_morning_jitter_max(),
            sweep_interval_mins: default_sweep_interval_mins(),
        }
    }
}

// ── Archival policy ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Delay between a self-sent message and its archival check
    #[serde(default = "default_check_delay_secs")]
    pub check_delay_secs: u64,
    /// How many recent messages to inspect for a reply
    #[serde(default = "default_recent_messages")]
    pub recent_messages: usize,
    /// Pause between successive archive operations during a sweep
    #[serde(default = "default_sweep_pause_ms")]
    pub sweep_pause_ms: u64,
}

fn default_check_delay_secs() -> u64 {
    5
}

fn default_recent_messages() -> usize {
    5
}

fn default_sweep_pause_ms() -> u64 {
    1000
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            check_delay_secs: default_check_delay_secs(),
            recent_messages: default_recent_messages(),
            sweep_pause_ms: default_sweep_pause_ms(),
        }
    }
}

// ── Connection reliability ────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityConfig {
    /// Poll interval while waiting for the connection to become ready
    #[serde(default = "default_connect_poll_secs")]
    pub connect_poll_secs: u64,
    /// Ceiling on a single connect attempt
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Backoff after a failed connect attempt
    #[serde(default = "default_connect_backoff_secs")]
    pub connect_backoff_secs: u64,
    /// Settle time between "ready" and the startup sweep
    #[serde(default = "default_stabilize_secs")]
    pub stabilize_secs: u64,
    /// How long an issued pairing code stays valid before we force-disconnect
    #[serde(default = "default_pairing_timeout_secs")]
    pub pairing_timeout_secs: u64,
}

fn default_connect_poll_secs() -> u64 {
    5
}

fn default_connect_timeout_secs() -> u64 {
    180
}

fn default_connect_backoff_secs() -> u64 {
    300
}

fn default_stabilize_secs() -> u64 {
    5
}

fn default_pairing_timeout_secs() -> u64 {
    120
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            connect_poll_secs: default_connect_poll_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            connect_backoff_secs: default_connect_backoff_secs(),
            stabilize_secs: default_stabilize_secs(),
            pairing_timeout_secs: default_pairing_timeout_secs(),
        }
    }
}

// ── Loading / persistence ─────────────────────────────────────────

impl Config {
    /// Load `~/.chatkeeper/config.toml`, creating it with defaults on
    /// first run.
    pub fn load_or_init() -> Result<Self, ConfigError> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .ok_or_else(|| ConfigError::Load("could not find home directory".into()))?;
        let keeper_dir = home.join(".chatkeeper");
        let config_path = keeper_dir.join("config.toml");

        if !keeper_dir.exists() {
            fs::create_dir_all(&keeper_dir)?;
        }

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self {
                config_path: config_path.clone(),
                ..Self::default()
            };
            config.validate()?;
            config.save()?;
            Ok(config)
        }
    }

    /// Load an explicit config file (the `--config` path).
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
        let mut config: Config =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.config_path = path.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let toml_str =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        fs::write(&self.config_path, toml_str)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.schedule;
        if s.night_hour > 23 || s.morning_hour > 23 {
            return Err(ConfigError::Validation(
                "window anchor hours must be 0-23".into(),
            ));
        }
        if s.night_jitter_max > 59 || s.morning_jitter_max > 59 {
            return Err(ConfigError::Validation(
                "jitter minutes must be 0-59".into(),
            ));
        }
        if s.night_jitter_min > s.night_jitter_max || s.morning_jitter_min > s.morning_jitter_max {
            return Err(ConfigError::Validation(
                "jitter ranges must have min <= max".into(),
            ));
        }
        if self.archive.recent_messages == 0 {
            return Err(ConfigError::Validation(
                "archive.recent_messages must be at least 1".into(),
            ));
        }
        if self.reliability.connect_poll_secs == 0 {
            return Err(ConfigError::Validation(
                "reliability.connect_poll_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
