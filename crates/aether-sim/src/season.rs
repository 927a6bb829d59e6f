//! Seasons and their weather pools.

use aether_common::PresetError;
use serde::{Deserialize, Serialize};

use crate::preset::PresetLibrary;

/// A weather that can occur during a season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherInfo {
    /// Display name, e.g. for a forecast.
    pub name: String,
    /// Preset name.
    pub weather: String,
    /// Likelihood, [0, 1].
    pub probability: f32,
}

/// A season: a default weather plus the pool it may draw from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    /// Season name.
    pub name: String,
    /// Preset used when nothing else is chosen.
    pub default_weather: String,
    /// Candidate weathers.
    #[serde(default)]
    pub weather_pool: Vec<WeatherInfo>,
}

impl Season {
    /// Checks probabilities and, if a library is given, preset references.
    pub fn validate(&self, library: Option<&PresetLibrary>) -> Result<(), PresetError> {
        for info in &self.weather_pool {
            if !(0.0..=1.0).contains(&info.probability) {
                return Err(PresetError::InvalidProbability {
                    name: info.name.clone(),
                    probability: info.probability,
                });
            }
        }

        if let Some(library) = library {
            let referenced = std::iter::once(&self.default_weather)
                .chain(self.weather_pool.iter().map(|info| &info.weather));
            for name in referenced {
                if !library.contains(name) {
                    return Err(PresetError::UnknownPreset(name.clone()));
                }
            }
        }
        Ok(())
    }

    /// The weather pool, most likely first. Ties keep their declared order.
    #[must_use]
    pub fn forecast(&self) -> Vec<&WeatherInfo> {
        let mut forecast: Vec<&WeatherInfo> = self.weather_pool.iter().collect();
        forecast.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        forecast
    }
}

/// The ordered list of seasons in a year.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeasonCycle {
    /// Seasons in order.
    pub seasons: Vec<Season>,
}

impl SeasonCycle {
    /// Parses a RON season file.
    pub fn from_ron_str(source: &str) -> Result<Self, PresetError> {
        ron::from_str(source).map_err(|e| PresetError::Parse(e.to_string()))
    }

    /// Validates every season.
    pub fn validate(&self, library: Option<&PresetLibrary>) -> Result<(), PresetError> {
        self.seasons
            .iter()
            .try_for_each(|season| season.validate(library))
    }

    /// Finds a season by name.
    #[must_use]
    pub fn season(&self, name: &str) -> Option<&Season> {
        self.seasons.iter().find(|season| season.name == name)
    }

    /// The season after `name`, wrapping around.
    #[must_use]
    pub fn next_after(&self, name: &str) -> Option<&Season> {
        let index = self.seasons.iter().position(|season| season.name == name)?;
        self.seasons.get((index + 1) % self.seasons.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::{WeatherPreset, WeatherType};

    const SEASONS: &str = r#"(
        seasons: [
            (
                name: "Winter",
                default_weather: "Overcast",
                weather_pool: [
                    (name: "Light snow", weather: "Snow", probability: 0.3),
                    (name: "Blizzard", weather: "Snow", probability: 0.6),
                    (name: "Grey", weather: "Overcast", probability: 0.3),
                ],
            ),
            (name: "Summer", default_weather: "Overcast"),
        ],
    )"#;

    fn library() -> PresetLibrary {
        let mut library = PresetLibrary::new();
        library
            .insert(WeatherPreset::new("Overcast", WeatherType::Sunny))
            .expect("insert");
        library
            .insert(WeatherPreset::new("Snow", WeatherType::Snowy))
            .expect("insert");
        library
    }

    #[test]
    fn test_forecast_orders_by_probability() {
        let cycle = SeasonCycle::from_ron_str(SEASONS).expect("parse");
        let winter = cycle.season("Winter").expect("winter");
        let names: Vec<_> = winter.forecast().iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["Blizzard", "Light snow", "Grey"]);
    }

    #[test]
    fn test_validate_against_library() {
        let cycle = SeasonCycle::from_ron_str(SEASONS).expect("parse");
        assert!(cycle.validate(Some(&library())).is_ok());

        let empty = PresetLibrary::new();
        assert!(matches!(
            cycle.validate(Some(&empty)),
            Err(PresetError::UnknownPreset(_))
        ));
    }

    #[test]
    fn test_invalid_probability() {
        let season = Season {
            name: "Odd".to_string(),
            default_weather: "Overcast".to_string(),
            weather_pool: vec![WeatherInfo {
                name: "Certain".to_string(),
                weather: "Overcast".to_string(),
                probability: 1.5,
            }],
        };
        assert!(matches!(
            season.validate(None),
            Err(PresetError::InvalidProbability { .. })
        ));
    }

    #[test]
    fn test_next_season_wraps() {
        let cycle = SeasonCycle::from_ron_str(SEASONS).expect("parse");
        assert_eq!(cycle.next_after("Winter").map(|s| s.name.as_str()), Some("Summer"));
        assert_eq!(cycle.next_after("Summer").map(|s| s.name.as_str()), Some("Winter"));
        assert!(cycle.next_after("Autumn").is_none());
    }
}
