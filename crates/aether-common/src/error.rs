//! Error types for the Aether environment system.

use thiserror::Error;

/// Top-level error type for environment operations.
///
/// None of these are fatal to the simulation: the caller skips the step and
/// the next frame retries naturally.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Weather preset and season data errors
    #[error("Preset error: {0}")]
    Preset(#[from] PresetError),

    /// An argument outside its valid domain (e.g. a negative delta time)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A required collaborator (e.g. the sky presenter) is not registered
    #[error("Missing collaborator: {0}")]
    MissingCollaborator(String),

    /// Required data (e.g. a weather preset) is not configured
    #[error("Missing data: {0}")]
    MissingData(String),
}

/// Cadence and settings errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A tick frequency was zero, negative or not finite
    #[error("{name} must be positive, got {value}")]
    NonPositiveFrequency {
        /// Setting name
        name: &'static str,
        /// Rejected value
        value: f32,
    },

    /// The simulated time quantum was zero or negative
    #[error("Tick rate must be positive, got {seconds}s")]
    NonPositiveTickRate {
        /// Rejected quantum in seconds
        seconds: i64,
    },

    /// A value outside its allowed range
    #[error("{name} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        /// Setting name
        name: &'static str,
        /// Rejected value
        value: f32,
        /// Lower bound
        min: f32,
        /// Upper bound
        max: f32,
    },

    /// Dawn must come before dusk
    #[error("Dawn ({dawn}) must be earlier than dusk ({dusk})")]
    DawnAfterDusk {
        /// Dawn hour
        dawn: f32,
        /// Dusk hour
        dusk: f32,
    },

    /// Settings could not be parsed
    #[error("Failed to parse settings: {0}")]
    Parse(String),
}

/// Weather preset and season errors.
#[derive(Debug, Error)]
pub enum PresetError {
    /// No preset registered under this name
    #[error("Unknown weather preset '{0}'")]
    UnknownPreset(String),

    /// Two presets share a name
    #[error("Duplicate weather preset '{0}'")]
    DuplicatePreset(String),

    /// A season pool entry has a probability outside [0, 1]
    #[error("Weather '{name}' has probability {probability}, expected [0, 1]")]
    InvalidProbability {
        /// Pool entry name
        name: String,
        /// Rejected probability
        probability: f32,
    },

    /// A preset parameter outside its allowed range
    #[error("Preset '{preset}': {field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        /// Preset name
        preset: String,
        /// Field name
        field: &'static str,
        /// Rejected value
        value: f32,
        /// Lower bound
        min: f32,
        /// Upper bound
        max: f32,
    },

    /// Preset data could not be parsed
    #[error("Failed to parse preset data: {0}")]
    Parse(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for environment operations.
pub type EnvironmentResult<T> = Result<T, EnvironmentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_converts() {
        let err: EnvironmentError = ConfigError::NonPositiveFrequency {
            name: "time_tick_frequency",
            value: 0.0,
        }
        .into();
        assert!(matches!(err, EnvironmentError::Config(_)));
        assert_eq!(
            err.to_string(),
            "Configuration error: time_tick_frequency must be positive, got 0"
        );
    }

    #[test]
    fn test_preset_error_message() {
        let err = PresetError::UnknownPreset("Blizzard".to_string());
        assert_eq!(err.to_string(), "Unknown weather preset 'Blizzard'");
    }
}
