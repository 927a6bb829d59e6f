//! Engine configuration.
//!
//! Clock cadence, sky, footstep and run settings, loaded from and saved to
//! `aether.toml`.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use aether_common::ConfigError;
use aether_sim::{ClockSettings, FootstepSettings, SkySettings, TickRate, WorldDateTime};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "aether.toml";

/// World clock cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Simulated seconds added per time tick.
    pub tick_rate_seconds: i64,
    /// Real seconds between time ticks.
    pub time_tick_frequency: f32,
    /// Real seconds between weather evaluations.
    pub weather_tick_frequency: f32,
    /// Starting date-time (None = 0001-01-01 12:00).
    pub start: Option<WorldDateTime>,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            tick_rate_seconds: 60,
            time_tick_frequency: 1.0,
            weather_tick_frequency: 10.0,
            start: None,
        }
    }
}

impl ClockConfig {
    /// Builds clock settings. Frequencies are taken by magnitude.
    pub fn settings(&self) -> Result<ClockSettings, ConfigError> {
        ClockSettings::new(
            TickRate::from_seconds(self.tick_rate_seconds)?,
            self.time_tick_frequency.abs(),
            self.weather_tick_frequency.abs(),
        )
    }

    /// Starting date-time.
    #[must_use]
    pub fn start(&self) -> WorldDateTime {
        self.start.unwrap_or_default()
    }
}

/// Headless run loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Target frames per second
    pub target_fps: u32,
    /// Frames to run before exiting
    pub frames: u32,
    /// Feed a fixed 1/target_fps delta instead of wall-clock time
    pub headless: bool,
    /// Directory holding preset and season RON files
    pub presets_dir: String,
    /// Preset applied at startup
    pub initial_preset: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            frames: 600,
            headless: true,
            presets_dir: crate::assets::DEFAULT_WEATHER_PATH.to_string(),
            initial_preset: None,
        }
    }
}

/// Engine configuration parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Run loop.
    pub run: RunConfig,
    /// World clock.
    pub clock: ClockConfig,
    /// Dynamic sky.
    pub sky: SkySettings,
    /// Footstep effects.
    pub footsteps: FootstepSettings,
}

impl EngineConfig {
    /// Load configuration from `aether.toml` in the working directory.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match fs::File::open(path) {
            Ok(mut file) => {
                let mut contents = String::new();
                if let Err(e) = file.read_to_string(&mut contents) {
                    warn!("Failed to read config file: {e}");
                    return Self::default();
                }

                match toml::from_str(&contents) {
                    Ok(config) => {
                        info!("Loaded config from {}", path.display());
                        config
                    },
                    Err(e) => {
                        warn!("Failed to parse config file: {e}");
                        Self::default()
                    },
                }
            },
            Err(e) => {
                warn!("Failed to open config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to `aether.toml` in the working directory.
    pub fn save(&self) -> io::Result<()> {
        self.save_to(CONFIG_FILE)
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Clamp run values to sensible ranges.
    pub fn validate(&mut self) {
        self.run.target_fps = self.run.target_fps.clamp(1, 240);
        self.footsteps.threshold = self.footsteps.threshold.clamp(0.0, 1.0);
        self.sky.time_of_day = self.sky.time_of_day.clamp(0.0, 24.0);
    }
}
