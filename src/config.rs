//! Application-level configuration loading: room lifecycle windows, the
//! scoring policy, and quiz catalogue seeding.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::scoring::{ScoringPolicy, TimeLimitRule};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZ_BATTLE_BACK_CONFIG_PATH";

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Room lifecycle and scoring knobs.
    pub rooms: RoomConfig,
    /// Optional JSON file the quiz catalogue is seeded from at startup.
    pub quiz_file: Option<PathBuf>,
}

/// Per-room behavior: code shape, expiry windows, and scoring.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Length of generated room codes.
    pub code_length: usize,
    /// How long a room may sit in `waiting` before it is reclaimed.
    pub waiting_ttl: Duration,
    /// Upper bound on a running game's total duration.
    pub active_ttl: Duration,
    /// How long a completed room is retained for result viewing.
    pub completed_retention: Duration,
    /// Grace window before a transport disconnect becomes a leave.
    pub disconnect_grace: Duration,
    /// Speed-reward formula applied to correct answers.
    pub scoring_policy: ScoringPolicy,
    /// How the per-question answer window is derived.
    pub time_limit: TimeLimitRule,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rooms: RoomConfig::default(),
            quiz_file: None,
        }
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            code_length: 6,
            waiting_ttl: Duration::from_secs(10 * 60),
            active_ttl: Duration::from_secs(60 * 60),
            completed_retention: Duration::from_secs(5 * 60),
            disconnect_grace: Duration::from_secs(10),
            scoring_policy: ScoringPolicy::FloorHalf,
            time_limit: TimeLimitRule::PerQuestion { seconds: 20 },
        }
    }
}

fn resolve_config_path() -> PathBuf {
    env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// JSON representation of the configuration file. Every field is optional;
/// omitted ones keep their defaults.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    rooms: RawRoomConfig,
    quiz_file: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRoomConfig {
    code_length: Option<usize>,
    waiting_ttl_secs: Option<u64>,
    active_ttl_secs: Option<u64>,
    completed_retention_secs: Option<u64>,
    disconnect_grace_secs: Option<u64>,
    scoring_policy: Option<ScoringPolicy>,
    time_limit: Option<TimeLimitRule>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = RoomConfig::default();
        let raw = value.rooms;
        Self {
            rooms: RoomConfig {
                code_length: raw.code_length.unwrap_or(defaults.code_length),
                waiting_ttl: raw
                    .waiting_ttl_secs
                    .map_or(defaults.waiting_ttl, Duration::from_secs),
                active_ttl: raw
                    .active_ttl_secs
                    .map_or(defaults.active_ttl, Duration::from_secs),
                completed_retention: raw
                    .completed_retention_secs
                    .map_or(defaults.completed_retention, Duration::from_secs),
                disconnect_grace: raw
                    .disconnect_grace_secs
                    .map_or(defaults.disconnect_grace, Duration::from_secs),
                scoring_policy: raw.scoring_policy.unwrap_or(defaults.scoring_policy),
                time_limit: raw.time_limit.unwrap_or(defaults.time_limit),
            },
            quiz_file: value.quiz_file,
        }
    }
}
