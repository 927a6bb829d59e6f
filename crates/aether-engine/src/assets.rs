//! Weather asset loading.
//!
//! This module provides:
//! - Loading weather presets from assets/weather/*.ron
//! - Loading the season cycle from assets/weather/seasons.ron
//! - Preset validation on load, skipping bad files with a warning

use std::fs;
use std::path::{Path, PathBuf};

use aether_common::PresetError;
use aether_sim::{PresetLibrary, SeasonCycle};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default asset path for weather data.
pub const DEFAULT_WEATHER_PATH: &str = "assets/weather";

/// File holding the season cycle, inside the weather directory.
pub const SEASONS_FILE: &str = "seasons.ron";

/// Errors that can occur during weather asset loading.
#[derive(Debug, Error)]
pub enum WeatherAssetError {
    /// Failed to read a file or directory.
    #[error("Failed to read weather asset: {0}")]
    ReadError(#[from] std::io::Error),

    /// Presets or seasons failed to parse or validate.
    #[error("Invalid weather asset: {0}")]
    Invalid(#[from] PresetError),
}

/// Result type for weather asset loading.
pub type WeatherAssetResult<T> = Result<T, WeatherAssetError>;

/// Statistics for the weather asset loader.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WeatherLoaderStats {
    /// Number of preset files loaded.
    pub files_loaded: u32,
    /// Number of presets loaded.
    pub presets_loaded: u32,
    /// Number of seasons loaded.
    pub seasons_loaded: u32,
    /// Number of files rejected.
    pub errors: u32,
}

/// Loads presets and seasons from a directory of RON files.
#[derive(Debug)]
pub struct WeatherAssetLoader {
    base_path: PathBuf,
    library: PresetLibrary,
    seasons: SeasonCycle,
    stats: WeatherLoaderStats,
}

impl WeatherAssetLoader {
    /// Creates a new loader.
    #[must_use]
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        let base_path = base_path.into();
        info!("Initializing weather asset loader at: {:?}", base_path);

        Self {
            base_path,
            library: PresetLibrary::new(),
            seasons: SeasonCycle::default(),
            stats: WeatherLoaderStats::default(),
        }
    }

    /// Creates a loader with default path.
    #[must_use]
    pub fn with_default_path() -> Self {
        Self::new(DEFAULT_WEATHER_PATH)
    }

    /// Returns the base path.
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Returns the loaded presets.
    #[must_use]
    pub fn library(&self) -> &PresetLibrary {
        &self.library
    }

    /// Returns the loaded seasons.
    #[must_use]
    pub fn seasons(&self) -> &SeasonCycle {
        &self.seasons
    }

    /// Returns loader statistics.
    #[must_use]
    pub fn stats(&self) -> &WeatherLoaderStats {
        &self.stats
    }

    /// Consumes the loader, returning presets and seasons.
    #[must_use]
    pub fn into_parts(self) -> (PresetLibrary, SeasonCycle) {
        (self.library, self.seasons)
    }

    /// Loads every preset file, then the season cycle.
    ///
    /// A missing directory yields an empty library. Files that fail to parse
    /// or validate are skipped with a warning.
    pub fn load_all(&mut self) -> WeatherAssetResult<()> {
        if !self.base_path.exists() {
            warn!(
                "Weather asset directory does not exist: {:?}",
                self.base_path
            );
            return Ok(());
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&self.base_path)?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "ron"))
            .collect();
        paths.sort();

        for path in &paths {
            if path.file_name().is_some_and(|name| name == SEASONS_FILE) {
                continue;
            }
            if let Err(e) = self.load_file(path) {
                warn!("Failed to load weather file {:?}: {}", path, e);
                self.stats.errors += 1;
            }
        }

        let seasons_path = self.base_path.join(SEASONS_FILE);
        if seasons_path.exists() {
            if let Err(e) = self.load_seasons(&seasons_path) {
                warn!("Failed to load seasons {:?}: {}", seasons_path, e);
                self.stats.errors += 1;
            }
        }

        info!(
            "Loaded {} weather presets from {} files, {} seasons",
            self.stats.presets_loaded, self.stats.files_loaded, self.stats.seasons_loaded
        );

        Ok(())
    }

    /// Loads presets from a single file. The file is all-or-nothing.
    pub fn load_file(&mut self, path: &Path) -> WeatherAssetResult<()> {
        debug!("Loading weather file: {:?}", path);

        let content = fs::read_to_string(path)?;
        let count = self.library.load_ron_str(&content)?;

        self.stats.files_loaded += 1;
        self.stats.presets_loaded += count as u32;
        debug!("Loaded {} presets from {:?}", count, path);

        Ok(())
    }

    /// Loads the season cycle, checking every referenced preset is loaded.
    pub fn load_seasons(&mut self, path: &Path) -> WeatherAssetResult<()> {
        let content = fs::read_to_string(path)?;
        let seasons = SeasonCycle::from_ron_str(&content)?;
        seasons.validate(Some(&self.library))?;

        self.stats.seasons_loaded = seasons.seasons.len() as u32;
        self.seasons = seasons;
        Ok(())
    }
}
